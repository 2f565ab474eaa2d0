//! The `pinexam lock` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{open_service, parse_pin};

pub async fn execute(config_path: Option<PathBuf>, pin: String, seed: Option<u64>) -> Result<()> {
    let pin = parse_pin(&pin)?;
    let (_, service) = open_service(config_path.as_deref(), seed)?;

    let code = service.lock(pin).await?;
    println!("Validation code: {code}");

    Ok(())
}
