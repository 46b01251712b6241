use thiserror::Error;

use crate::filters::defaults::DefaultsError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from loading the factory default filters
    #[error("Factory defaults error: {0}")]
    DefaultsError(#[from] DefaultsError),

    /// Invalid command line configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
