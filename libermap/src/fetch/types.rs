//! Fetch error type

use std::fmt;

/// Errors that can occur while talking to remote content services.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Request could not be sent or the body could not be read
    HttpError(String),
    /// Server answered with a non-success status
    Status { status: u16, url: String },
    /// Response body was not what the endpoint promises
    InvalidResponse(String),
    /// Local file could not be read or written
    Io(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            FetchError::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            FetchError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            FetchError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::InvalidResponse(e.to_string())
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Io(e.to_string())
    }
}

/// Decode a response body as UTF-8 text.
pub fn body_to_string(body: Vec<u8>) -> Result<String, FetchError> {
    String::from_utf8(body).map_err(|e| FetchError::InvalidResponse(format!("not UTF-8: {}", e)))
}
