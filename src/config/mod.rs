// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{PicksyError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, `PICKSY__SECTION__KEY`)
    /// 2. Config file (`--config` path, else `~/.picksy/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(str::to_string)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // An explicit path must exist; the default one is optional
            .add_source(File::with_name(&path).required(config_path.is_some()))
            .add_source(
                Environment::with_prefix("PICKSY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PicksyError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PicksyError::Config(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".picksy")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
