//! The `pinexam update` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use pinexam_core::results::ResultSet;

use super::{open_service, parse_pin};

pub async fn execute(config_path: Option<PathBuf>, pin: String) -> Result<()> {
    let pin = parse_pin(&pin)?;
    let (_, service) = open_service(config_path.as_deref(), None)?;

    let sets = service.update(pin).await?;
    print_results(&sets);
    println!(
        "Total: {}/{}",
        sets.iter().map(ResultSet::score).sum::<u32>(),
        sets.iter().map(ResultSet::max_score).sum::<u32>()
    );

    Ok(())
}

fn print_results(sets: &[ResultSet]) {
    let mut table = Table::new();
    table.set_header(vec!["Set", "Test", "Score", "Correct", "Wrong", "Skipped"]);

    let list = |indices: &[usize]| {
        indices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };

    for set in sets {
        for t in &set.tests {
            table.add_row(vec![
                Cell::new(&set.id),
                Cell::new(&t.id),
                Cell::new(format!("{}/{}", t.score, t.max_score)),
                Cell::new(list(&t.correct)),
                Cell::new(list(&t.wrong)),
                Cell::new(list(&t.skipped)),
            ]);
        }
    }

    println!("{table}");
}
