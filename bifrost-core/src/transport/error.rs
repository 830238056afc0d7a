//! Transport status codes and error classification
//!
//! Errors surfaced by the RPC transport carry a status code from a fixed
//! enumeration, an optional description, an optional rate-limit-reset hint
//! (whole seconds) and an optional application sub-code. Retryability is
//! derived from these fields, never stored.

use std::fmt;
use thiserror::Error;

/// Application sub-code the platform attaches to internal errors that are
/// known to be transient and safe to retry.
pub const RETRYABLE_INTERNAL_APP_CODE: u32 = 70_001;

/// Transport-level status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Unavailable,
    ResourceExhausted,
    Internal,
    Unauthenticated,
    NotFound,
    InvalidArgument,
    PermissionDenied,
    FailedPrecondition,
    Unimplemented,
    Unknown,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unauthenticated => "UNAUTHENTICATED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
            StatusCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by the RPC transport for one call or stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {}", .message.as_deref().unwrap_or("no description"))]
pub struct TransportError {
    /// Status code from the transport
    pub code: StatusCode,
    /// Optional human-readable description
    pub message: Option<String>,
    /// Server hint: seconds until it will accept more traffic
    pub ratelimit_reset: Option<u64>,
    /// Optional application-specific sub-code carried in error metadata
    pub app_code: Option<u32>,
}

impl TransportError {
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
            ratelimit_reset: None,
            app_code: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_ratelimit_reset(mut self, seconds: u64) -> Self {
        self.ratelimit_reset = Some(seconds);
        self
    }

    pub fn with_app_code(mut self, app_code: u32) -> Self {
        self.app_code = Some(app_code);
        self
    }

    /// Whether this error is worth another attempt.
    ///
    /// Retryable set: RESOURCE_EXHAUSTED, UNAVAILABLE, and INTERNAL carrying
    /// the transient application sub-code. Everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self.code {
            StatusCode::ResourceExhausted | StatusCode::Unavailable => true,
            StatusCode::Internal => self.app_code == Some(RETRYABLE_INTERNAL_APP_CODE),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_retryable() {
        assert!(TransportError::new(StatusCode::Unavailable).is_retryable());
        assert!(TransportError::new(StatusCode::ResourceExhausted).is_retryable());
    }

    #[test]
    fn test_internal_retryable_only_with_subcode() {
        let plain = TransportError::new(StatusCode::Internal);
        assert!(!plain.is_retryable());

        let transient =
            TransportError::new(StatusCode::Internal).with_app_code(RETRYABLE_INTERNAL_APP_CODE);
        assert!(transient.is_retryable());

        let other = TransportError::new(StatusCode::Internal).with_app_code(12345);
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_terminal_codes_not_retryable() {
        for code in [
            StatusCode::Unauthenticated,
            StatusCode::NotFound,
            StatusCode::InvalidArgument,
            StatusCode::PermissionDenied,
            StatusCode::FailedPrecondition,
            StatusCode::Unimplemented,
            StatusCode::Unknown,
        ] {
            assert!(!TransportError::new(code).is_retryable(), "{:?}", code);
        }
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = TransportError::new(StatusCode::Unavailable).with_message("connection reset");
        let msg = format!("{}", err);
        assert!(msg.contains("UNAVAILABLE"));
        assert!(msg.contains("connection reset"));

        let bare = TransportError::new(StatusCode::Unknown);
        assert!(format!("{}", bare).contains("no description"));
    }
}
