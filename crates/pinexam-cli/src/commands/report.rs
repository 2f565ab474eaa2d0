//! The `pinexam report` command.

use std::path::PathBuf;

use anyhow::Result;

use pinexam_report::write_html_sheet;

use super::{open_service, parse_pin};

pub async fn execute(
    config_path: Option<PathBuf>,
    pin: String,
    output: PathBuf,
    format: String,
) -> Result<()> {
    let pin = parse_pin(&pin)?;
    let (_, service) = open_service(config_path.as_deref(), None)?;

    let sheet = service.result_sheet(pin).await?;

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("sheet-{pin}-{timestamp}.json"));
                sheet.save_json(&path)?;
                eprintln!("Result sheet saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("sheet-{pin}-{timestamp}.html"));
                write_html_sheet(&sheet, &path)?;
                eprintln!("HTML sheet: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("sheet-{pin}-{timestamp}.md"));
                std::fs::write(&path, sheet.to_markdown())?;
                eprintln!("Markdown sheet: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}
