use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use tracing::debug;

use super::error::HttpError;
use super::method::HttpMethod;
use super::response::HttpResponse;

/// Per-request timeout applied to every call the harness makes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper over a shared `reqwest::Client` rooted at the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Client)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path, &[], query)?;
        self.send(HttpMethod::Get, url).await
    }

    /// GET a single resource below `path`; each segment is percent-encoded.
    pub async fn get_resource(&self, path: &str, segments: &[&str]) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path, segments, &[])?;
        self.send(HttpMethod::Get, url).await
    }

    pub async fn post(&self, path: &str, segments: &[&str]) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path, segments, &[])?;
        self.send(HttpMethod::Post, url).await
    }

    async fn send(&self, method: HttpMethod, url: Url) -> Result<HttpResponse, HttpError> {
        debug!(%method, %url, "sending request");

        let started = Instant::now();
        let response = self
            .client
            .request(method.into(), url.clone())
            .send()
            .await
            .map_err(HttpError::from_send)?;
        let elapsed = started.elapsed().as_millis();

        let status = response.status();
        let bytes = response.bytes().await.map_err(HttpError::Read)?;
        let size_bytes = bytes.len();
        let body = String::from_utf8_lossy(&bytes).into_owned();

        debug!(%method, %url, status = status.as_u16(), elapsed_ms = (elapsed as u64), "received response");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            duration_ms: elapsed,
            size_bytes,
            body,
        })
    }

    fn endpoint(
        &self,
        path: &str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, HttpError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| HttpError::InvalidUrl(format!("{path}: {e}")))?;

        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| HttpError::InvalidUrl(format!("{path}: cannot append path segments")))?
                .extend(segments);
        }

        if !query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in query {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, HttpError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(HttpError::InvalidUrl("base URL cannot be empty".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| HttpError::InvalidUrl(format!("`{trimmed}`: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(HttpError::InvalidUrl(format!(
            "`{trimmed}`: unsupported scheme `{}`",
            url.scheme()
        )));
    }

    Ok(trimmed.to_string())
}
