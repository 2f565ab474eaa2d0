//! The `pinexam show` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{open_service, parse_pin};

pub async fn execute(config_path: Option<PathBuf>, pin: String) -> Result<()> {
    let pin = parse_pin(&pin)?;
    let (_, service) = open_service(config_path.as_deref(), None)?;

    let loaded = service.resume(pin).await?;
    println!("{}", serde_json::to_string_pretty(&loaded.journal)?);

    Ok(())
}
