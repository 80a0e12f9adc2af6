use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Failed to read response: {0}")]
    Read(#[source] reqwest::Error),
    #[error("Invalid JSON response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl HttpError {
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout(err)
        } else if err.is_connect() {
            HttpError::Connect(err)
        } else {
            HttpError::Request(err)
        }
    }
}
