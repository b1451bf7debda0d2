use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Completion service error: {0}")]
    Service(String),

    #[error("Could not parse completion reply: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session is busy with another request")]
    SessionBusy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdvisorError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Service(_) => "service_error",
            Self::Parse(_) => "parse_error",
            Self::Config(_) => "config_error",
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionBusy => "session_busy",
            Self::Io(_) | Self::Other(_) => "internal_error",
        }
    }

    /// True for failures of the external completion call itself.
    pub fn is_request_failure(&self) -> bool {
        matches!(self, Self::Service(_) | Self::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
