//! Configuration loading from layered files and environment variables

use crate::config::ReconConfig;
use crate::error::ConfigLoadError;
use config::{Config, Environment, File};
use std::path::Path;
use validator::Validate;

/// Loads configuration the same way `auth-config::loader::ConfigLoader` does:
/// `default` -> `{environment}` -> `local` files, then `RECON__`-prefixed
/// environment variables take final precedence. The engine runs once per
/// invocation, so unlike the teacher's `ConfigManager` there is no
/// hot-reload/watch channel here — just a one-shot `load()`.
pub struct ConfigLoader {
    config_dir: String,
    environment: String,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
            environment: environment.into(),
        }
    }

    pub fn load(&self) -> Result<ReconConfig, ConfigLoadError> {
        let config = Config::builder()
            .add_source(File::with_name(&format!("{}/default", self.config_dir)).required(false))
            .add_source(
                File::with_name(&format!("{}/{}", self.config_dir, self.environment))
                    .required(false),
            )
            .add_source(File::with_name(&format!("{}/local", self.config_dir)).required(false))
            .add_source(
                Environment::with_prefix("RECON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(ConfigLoadError::from)?;

        let recon_config: ReconConfig = config.try_deserialize().map_err(ConfigLoadError::from)?;
        recon_config.validate()?;
        Ok(recon_config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ReconConfig, ConfigLoadError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(ConfigLoadError::from)?;

        let recon_config: ReconConfig = config.try_deserialize().map_err(ConfigLoadError::from)?;
        recon_config.validate()?;
        Ok(recon_config)
    }
}
