// ================================================================
// File: tornwatch-common/src/error.rs
// ================================================================

use thiserror::Error;

/// Application error code the remote API uses for an incorrect or revoked key.
pub const INVALID_CREDENTIAL_CODE: i64 = 2;

/// Classified result of a single failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {0}")]
    Http(u16),

    #[error("API Error {0}")]
    Api(i64),

    // 2xx response whose body is not JSON or not shaped like the expected record.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Fatal errors stop the poll cycle and discard the credential.
    /// Everything else waits for the next scheduled cycle.
    pub fn is_credential_invalid(&self) -> bool {
        matches!(self, FetchError::Api(code) if *code == INVALID_CREDENTIAL_CODE)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid credential format: {0}")]
    InvalidCredentialFormat(String),

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Engine is no longer running")]
    EngineClosed,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<keyring::Error> for Error {
    fn from(err: keyring::Error) -> Self {
        Error::Keyring(err.to_string())
    }
}
