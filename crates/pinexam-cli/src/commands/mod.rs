pub mod answer;
pub mod courses;
pub mod init;
pub mod lock;
pub mod report;
pub mod show;
pub mod start;
pub mod update;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use pinexam_core::journal::Pin;
use pinexam_core::service::AssessmentService;
use pinexam_store::config::load_config_from;
use pinexam_store::{create_stores, PinexamConfig};

/// Load the configuration and build a service over the configured stores.
pub fn open_service(
    config_path: Option<&Path>,
    seed: Option<u64>,
) -> Result<(PinexamConfig, AssessmentService)> {
    let config = load_config_from(config_path)?;
    let service = create_stores(&config)
        .context("failed to open stores")?
        .into_service();
    tracing::debug!(store = ?config.store, data_dir = %config.data_dir.display(), "opened stores");
    let service = match seed {
        Some(seed) => service.with_seed(seed),
        None => service,
    };
    Ok((config, service))
}

pub fn parse_pin(pin: &str) -> Result<Pin> {
    pin.parse().map_err(anyhow::Error::msg)
}
