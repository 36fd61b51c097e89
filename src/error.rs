//! The crate-wide error type.

use std::fmt::{self, Debug, Display};

#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum IxaError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A configuration value was rejected. `name` is the parameter key as it appears in the
    /// configuration (`A`, `beta_hat`, ...).
    InvalidParameter { name: &'static str, reason: String },
    NetworkError(String),
    ThreadPoolError(String),
    IxaError(String),
}

impl IxaError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        IxaError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for IxaError {
    fn from(error: std::io::Error) -> Self {
        IxaError::IoError(error)
    }
}

impl From<serde_json::Error> for IxaError {
    fn from(error: serde_json::Error) -> Self {
        IxaError::JsonError(error)
    }
}

impl From<csv::Error> for IxaError {
    fn from(error: csv::Error) -> Self {
        IxaError::CsvError(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for IxaError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        IxaError::ThreadPoolError(error.to_string())
    }
}

impl From<String> for IxaError {
    fn from(error: String) -> Self {
        IxaError::IxaError(error)
    }
}

impl From<&str> for IxaError {
    fn from(error: &str) -> Self {
        IxaError::IxaError(error.to_string())
    }
}

impl std::error::Error for IxaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IxaError::IoError(error) => Some(error),
            IxaError::JsonError(error) => Some(error),
            IxaError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for IxaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IxaError::IoError(error) => write!(f, "I/O error: {error}"),
            IxaError::JsonError(error) => write!(f, "invalid JSON configuration: {error}"),
            IxaError::CsvError(error) => write!(f, "CSV error: {error}"),
            IxaError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            IxaError::NetworkError(message) => write!(f, "network error: {message}"),
            IxaError::ThreadPoolError(message) => write!(f, "worker pool error: {message}"),
            IxaError::IxaError(message) => write!(f, "{message}"),
        }
    }
}
