pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;

use clap::ValueEnum;
use utilbill_core::models::config::UtilbillConfig;
use utilbill_core::MeterType;

/// Provider a document set belongs to.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Provider {
    /// Aguas Andinas water bills
    Water,
    /// Enel electricity bills
    Electricity,
}

impl From<Provider> for MeterType {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Water => MeterType::Water,
            Provider::Electricity => MeterType::Electricity,
        }
    }
}

/// Load the config given with `--config`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<UtilbillConfig> {
    match config_path {
        Some(path) => UtilbillConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e)),
        None => Ok(UtilbillConfig::default()),
    }
}
