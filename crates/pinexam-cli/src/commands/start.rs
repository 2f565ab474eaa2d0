//! The `pinexam start` command.

use std::path::PathBuf;

use anyhow::Result;

use pinexam_core::structure::StructureElement;

use super::open_service;

pub async fn execute(
    config_path: Option<PathBuf>,
    course: String,
    language: Option<String>,
    seed: Option<u64>,
) -> Result<()> {
    let (config, service) = open_service(config_path.as_deref(), seed)?;
    let language = language.unwrap_or(config.default_language);

    let started = service.start(&course, &language).await?;

    println!("Started journal for pin {}", started.pin);
    println!("Course: {} ({})", started.config.title, started.record.course);
    for set in &started.journal.structure.sets {
        println!("Set {}:", set.id);
        for element in &set.elements {
            match element {
                StructureElement::Info(page) => println!("  info  {}", page.id),
                StructureElement::Test(test) => {
                    println!("  test  {} [{}] {}", test.id, test.category, test.task)
                }
            }
        }
    }

    Ok(())
}
