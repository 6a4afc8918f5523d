use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time of day {entry:?}: {reason}")]
    InvalidTime { entry: String, reason: String },
}

impl CoreError {
    /// Short error code string, stable across releases (used in CLI output).
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::InvalidTime { .. } => "INVALID_TIME",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
