//! The `pinexam answer` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use pinexam_core::journal::Answer;

use super::{open_service, parse_pin};

pub async fn execute(
    config_path: Option<PathBuf>,
    pin: String,
    set: String,
    test: String,
    value: String,
) -> Result<()> {
    let pin = parse_pin(&pin)?;
    let value: Value =
        serde_json::from_str(&value).with_context(|| format!("answer is not valid JSON: {value}"))?;
    let (_, service) = open_service(config_path.as_deref(), None)?;

    service
        .record_answer(pin, &set, &test, Answer(value))
        .await?;
    println!("Recorded answer for {set}/{test}");

    Ok(())
}
