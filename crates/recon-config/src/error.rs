//! Configuration loading/validation error, mirroring the
//! `auth_config::validation::ConfigValidationError` split between "the
//! layered sources couldn't be assembled" and "the assembled config
//! violates a constraint."

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration failed validation: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
