use async_trait::async_trait;
use crux_http::client::Client;
use crux_http::middleware::{Middleware, Next};
use crux_http::{Request, ResponseAsync};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use crux_http::protocol::{HttpHeader, HttpRequest, HttpResponse, HttpResult};
pub use crux_http::Http;

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("invalid URL '{url}': {reason}")]
pub struct UrlError {
    pub url: String,
    pub reason: String,
}

impl UrlError {
    fn new(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: ValidatedUrl::truncate_url(url),
            reason: reason.into(),
        }
    }
}

/// An absolute `http`/`https` URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, UrlError> {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(UrlError::new("", "URL cannot be empty"));
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(UrlError::new(
                trimmed,
                format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            ));
        }

        let parsed = Url::parse(trimmed).map_err(|e| UrlError::new(trimmed, e.to_string()))?;
        Self::from_parsed(&parsed)
    }

    fn from_parsed(parsed: &Url) -> Result<Self, UrlError> {
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::new(
                parsed.as_str(),
                format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            ));
        }

        let Some(host) = parsed.host_str() else {
            return Err(UrlError::new(parsed.as_str(), "URL must have a host"));
        };

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(UrlError::new(
                parsed.as_str(),
                "credentials in URL are not allowed",
            ));
        }

        Ok(Self {
            url: parsed.to_string(),
            host: host.to_lowercase(),
        })
    }

    /// Appends path segments, percent-encoding each one.
    pub fn join_segments<S: AsRef<str>>(&self, segments: &[S]) -> Result<Self, UrlError> {
        let mut parsed = Url::parse(&self.url).map_err(|e| UrlError::new(&self.url, e.to_string()))?;

        {
            let mut path = parsed
                .path_segments_mut()
                .map_err(|()| UrlError::new(&self.url, "URL cannot be a base"))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }

        let joined = Self::from_parsed(&parsed)?;
        if joined.url.len() > MAX_URL_LENGTH {
            return Err(UrlError::new(
                &joined.url,
                format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            ));
        }
        Ok(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

/// Fails a request before it is handed to the shell. Used for requests
/// that could not be put together, so the caller still hears back through
/// its usual event.
pub struct Reject(pub crux_http::Error);

#[async_trait]
impl Middleware for Reject {
    async fn handle(
        &self,
        _req: Request,
        _client: Client,
        _next: Next<'_>,
    ) -> crux_http::Result<ResponseAsync> {
        Err(self.0.clone())
    }
}
