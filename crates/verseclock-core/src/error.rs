use std::io;

use thiserror::Error;

/// Fatal errors that abort a schedule run.
#[derive(Debug, Error)]
pub enum VerseClockError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl VerseClockError {
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        VerseClockError::Configuration(message.into())
    }

    pub fn parse<T: Into<String>>(message: T) -> Self {
        VerseClockError::Parse(message.into())
    }
}

/// Failures talking to the text-generation service.
///
/// These never abort a run; callers recover with a fallback.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no API key found in environment variable {0}")]
    MissingCredential(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service returned no content")]
    EmptyResponse,
    #[error("{0}")]
    Message(String),
}

impl From<&str> for ServiceError {
    fn from(msg: &str) -> Self {
        ServiceError::Message(msg.to_string())
    }
}

impl From<String> for ServiceError {
    fn from(msg: String) -> Self {
        ServiceError::Message(msg)
    }
}
