use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::models::Severity;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("'{operation}' request could not be sent: {source}")]
    Transport {
        operation: String,
        #[source]
        source: Box<Error>,
    },

    #[error("API error in '{operation}': {status} - {message}")]
    ApiError {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("failed to decode '{operation}' response (HTTP {status}): {source}")]
    Decode {
        operation: String,
        status: u16,
        headers: HeaderMap,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to fetch the number of '{severity}' issues: {source}")]
    SeverityCount {
        severity: Severity,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// HTTP status of the response that caused the error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiError { status, .. } | Error::Decode { status, .. } => Some(*status),
            Error::Transport { source, .. } | Error::SeverityCount { source, .. } => {
                source.status()
            }
            Error::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
