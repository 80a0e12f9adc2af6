use serde_json::Value;

use super::error::HttpError;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub duration_ms: u128,
    pub size_bytes: usize,
    pub body: String,
}

impl HttpResponse {
    /// Every check treats exactly `200 OK` as success; other 2xx codes fail.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json(&self) -> Result<Value, HttpError> {
        serde_json::from_str(&self.body).map_err(HttpError::Decode)
    }
}
