use thiserror::Error;

use super::config::ConfigError;

/// Failure to build a character controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("a controller needs at least one movement mode")]
    NoModes,

    #[error("invalid controller configuration: {0}")]
    Config(#[from] ConfigError),
}
