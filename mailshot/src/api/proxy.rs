//! Fetch-through for external images referenced by campaign templates, so
//! the editor can preview them without tripping over CORS.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use reqwest::Url;
use serde::Deserialize;

use super::ApiError;

/// Image hosts the proxy will fetch from, subdomains included.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "googleusercontent.com",
    "googleapis.com",
    "google.com",
    "gstatic.com",
    "github.com",
    "githubusercontent.com",
    "gravatar.com",
    "linkedin.com",
    "licdn.com",
];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const CACHE_FOR_A_DAY: &str = "public, max-age=86400";

#[derive(Clone)]
pub struct ImageProxy {
    client: reqwest::Client,
    allowed_hosts: Arc<[String]>,
    timeout: Duration,
}

impl Default for ImageProxy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS.iter().copied())
    }
}

impl ImageProxy {
    pub fn new<I, H>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<String>,
    {
        Self {
            client: reqwest::Client::new(),
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host` is an allowed domain or one of its subdomains.
    pub fn is_allowed(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.allowed_hosts.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|sub| sub.ends_with('.'))
        })
    }

    /// Fetch `raw` and relay it as an image response.
    pub async fn fetch(&self, raw: &str) -> Result<Response, ApiError> {
        let url = Url::parse(raw)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ApiError::BadRequest("Invalid URL provided".to_string()))?;

        if !url.host_str().is_some_and(|host| self.is_allowed(host)) {
            return Err(ApiError::Forbidden("Domain not allowed for proxying".to_string()));
        }

        tracing::info!(%url, "proxying image");
        let upstream = self
            .client
            .get(url.clone())
            .header("user-agent", USER_AGENT)
            .header("accept", "image/*,*/*;q=0.8")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Upstream {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        message: err.to_string(),
                    }
                }
            })?;

        let status = upstream.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(%url, status = status.as_u16(), "image fetch failed");
            return Err(ApiError::Upstream {
                status: StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: format!(
                    "Failed to fetch image: {}",
                    status.canonical_reason().unwrap_or("unknown error")
                ),
            });
        }

        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .and_then(|value| HeaderValue::from_str(value).ok())
            .ok_or_else(|| {
                ApiError::BadRequest("URL does not point to a valid image".to_string())
            })?;

        Ok((
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_FOR_A_DAY)),
            ],
            Body::from_stream(upstream.bytes_stream()),
        )
            .into_response())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProxyQuery {
    url: Option<String>,
}

pub(super) async fn image_proxy(
    Extension(proxy): Extension<ImageProxy>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL parameter is required".to_string()))?;
    proxy.fetch(&url).await
}
