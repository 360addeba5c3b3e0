use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    Server,
    Deserialization,
    Storage,
    Location,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Server => "SERVER_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::Conflict
            | Self::Server
            | Self::Storage
            | Self::Location => ErrorSeverity::Transient,

            Self::Deserialization | Self::Internal | Self::InvalidState => ErrorSeverity::Fatal,

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }
}

/// Error surfaced to the view layer as a banner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.severity == ErrorSeverity::Transient
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => "You don't have permission to perform this action.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Conflict => {
                "This action conflicts with a recent change. Please refresh and try again.".into()
            }
            ErrorKind::Server => "The server could not complete the request. Please try again.".into(),
            ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::Storage => "Unable to save data on this device.".into(),
            ErrorKind::Location => crate::LOCATION_REQUIRED_MESSAGE.into(),
            ErrorKind::InvalidState => self.message.clone(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, message: Option<&str>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_kinds() {
        assert_eq!(AppError::from_http_status(401, None).kind, ErrorKind::Authentication);
        assert_eq!(AppError::from_http_status(403, None).kind, ErrorKind::Authorization);
        assert_eq!(AppError::from_http_status(404, None).kind, ErrorKind::NotFound);
        assert_eq!(AppError::from_http_status(422, None).kind, ErrorKind::Validation);
        assert_eq!(AppError::from_http_status(503, None).kind, ErrorKind::Server);
        assert_eq!(AppError::from_http_status(418, None).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_from_http_status_keeps_message_and_status() {
        let err = AppError::from_http_status(400, Some("bad email"));
        assert_eq!(err.message, "bad email");
        assert_eq!(err.context.get("http_status").map(String::as_str), Some("400"));
        assert_eq!(err.user_facing_message(), "bad email");
    }

    #[test]
    fn test_default_message_when_body_missing() {
        let err = AppError::from_http_status(500, None);
        assert_eq!(err.message, "HTTP error: 500");
        assert_eq!(err.severity, ErrorSeverity::Transient);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::new(ErrorKind::NotFound, "order missing");
        assert_eq!(err.to_string(), "[NOT_FOUND] order missing");
    }
}
