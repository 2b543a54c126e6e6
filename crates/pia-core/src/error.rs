//! Error types for the PiaAGI console

use thiserror::Error;

/// Result type alias for console operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Everything a console action can fail with.
///
/// Errors are `Clone` because each component keeps the last failure of every
/// action in its [`TaskBoard`](crate::TaskBoard) for inline display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Client-side validation or JSON parse failure. Never reaches the network.
    #[error("{0}")]
    Input(String),

    /// Non-2xx response. `message` comes from the body's `error` field when present.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// 2xx response whose body is not the JSON shape the caller expected.
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Failed to load {id}: {message}")]
    Load { id: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse bucket of a [`ConsoleError`], handy for matching in front-ends and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Http,
    Network,
    Decode,
    Load,
    Config,
}

impl ConsoleError {
    pub fn input(message: impl Into<String>) -> Self {
        ConsoleError::Input(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::Input(_) => ErrorKind::Input,
            ConsoleError::Http { .. } => ErrorKind::Http,
            ConsoleError::Network(_) => ErrorKind::Network,
            ConsoleError::Decode(_) => ErrorKind::Decode,
            ConsoleError::Load { .. } => ErrorKind::Load,
            ConsoleError::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status for [`ConsoleError::Http`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConsoleError {
    fn from(err: config::ConfigError) -> Self {
        ConsoleError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::Decode(err.to_string())
        } else {
            ConsoleError::Network(err.to_string())
        }
    }
}
