/// Core error types for Walkup
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `WalkupError`
pub type Result<T> = std::result::Result<T, WalkupError>;

/// Provider reason code for accounts that cannot control playback
pub const REASON_PREMIUM_REQUIRED: &str = "PREMIUM_REQUIRED";

/// Provider reason code when no playback device is available
pub const REASON_NO_ACTIVE_DEVICE: &str = "NO_ACTIVE_DEVICE";

/// Core error type for Walkup
///
/// The variants mirror how a failure should be handled rather than where it
/// came from: `Auth`, `NotFound`, `Permission`, `Client` and `Validation`
/// are terminal, `RateLimited` and `Transient` may succeed on retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkupError {
    /// No access token, or the provider rejected it
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Provider answered 429
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Value of the `Retry-After` header, when present
        retry_after: Option<Duration>,
    },

    /// 5xx response or network failure
    #[error("Service unavailable: {message}")]
    Transient {
        /// HTTP status, `None` for network failures
        status: Option<u16>,
        message: String,
    },

    /// Resource (or playback device) does not exist
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        /// Provider reason code, e.g. `NO_ACTIVE_DEVICE`
        reason: Option<String>,
    },

    /// Caller is authenticated but not allowed
    #[error("Permission denied: {message}")]
    Permission {
        message: String,
        /// Provider reason code, e.g. `PREMIUM_REQUIRED`
        reason: Option<String>,
    },

    /// Any other 4xx response
    #[error("Request rejected ({status}): {message}")]
    Client { status: u16, message: String },

    /// Caller input malformed, raised before any I/O
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A guarded subsystem failed to initialize
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Playback transport failure that is not an HTTP error
    #[error("Playback error: {0}")]
    Playback(String),

    /// Provider response could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl WalkupError {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a transient error for a network failure (no status)
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Transient {
            status: None,
            message: msg.into(),
        }
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient { .. })
    }

    /// Provider reason code, if the provider sent one
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::NotFound { reason, .. } | Self::Permission { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Short message suitable for showing inline next to a play button
    ///
    /// Derived from the error kind, never from raw transport text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Permission { reason, .. }
                if reason.as_deref() == Some(REASON_PREMIUM_REQUIRED) =>
            {
                "Premium account required".to_string()
            }
            Self::NotFound { reason, .. } if reason.as_deref() == Some(REASON_NO_ACTIVE_DEVICE) => {
                "No active playback device".to_string()
            }
            Self::Auth(_) => "Please sign in again".to_string(),
            Self::RateLimited { .. } => "Too many requests, try again shortly".to_string(),
            Self::Transient { .. } => "Streaming service unavailable".to_string(),
            Self::NotFound { .. } => "Track not found".to_string(),
            Self::Permission { .. } => "Playback not allowed".to_string(),
            Self::Initialization(_) => "Player is not ready".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Client { .. } | Self::Playback(_) | Self::Parse(_) => {
                "Playback failed".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for WalkupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
