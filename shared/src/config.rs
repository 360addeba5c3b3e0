use thiserror::Error;
use tracing::warn;

use crate::capabilities::{UrlError, ValidatedUrl};

pub const DEFAULT_API_URL: &str = "https://octopus-app-5lcnt.ondigitalocean.app/";
pub const API_URL_ENV: &str = "DRIVER_API_URL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] UrlError),
}

/// Where the core talks to the backend. Request timeouts are applied by
/// the shell that performs the HTTP effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: ValidatedUrl,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: ValidatedUrl::new(base_url)?,
        })
    }

    /// Uses `override_url` when it is present and valid, the default otherwise.
    pub fn with_override(override_url: Option<&str>) -> Self {
        match override_url.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => Self::new(url).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring API base URL override");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Reads the override from `DRIVER_API_URL`.
    pub fn from_env() -> Self {
        Self::with_override(std::env::var(API_URL_ENV).ok().as_deref())
    }

    pub fn base_url(&self) -> &ValidatedUrl {
        &self.base_url
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: ValidatedUrl::new(DEFAULT_API_URL)
                .unwrap_or_else(|_| unreachable!("default API URL is valid")),
        }
    }
}
