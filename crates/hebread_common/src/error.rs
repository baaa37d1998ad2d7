//! Error types for Hebrew Read.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HebreadError {
    #[error("Storage medium error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded for key '{0}'")]
    QuotaExceeded(String),

    #[error("Invalid progress delta: {0}")]
    InvalidDelta(String),

    #[error("Exercise '{0}' is not mounted")]
    NotMounted(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Round already checked; start a new round")]
    RoundLocked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HebreadError {
    /// Short machine-readable tag, used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            HebreadError::Storage(_) => "storage",
            HebreadError::QuotaExceeded(_) => "quota",
            HebreadError::InvalidDelta(_) => "invalid_delta",
            HebreadError::NotMounted(_) => "not_mounted",
            HebreadError::InvalidInput(_) => "invalid_input",
            HebreadError::RoundLocked => "round_locked",
            HebreadError::Io(_) => "io",
            HebreadError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, HebreadError>;
