//! Mapping of provider responses and transport failures onto `WalkupError`.

use crate::types::ApiResponse;
use serde::Deserialize;
use std::time::Duration;
use walkup_core::WalkupError;

/// Provider error envelope: `{"error": {"status", "message", "reason"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Classify a non-success response.
///
/// 429 and 5xx are retryable; everything else is terminal.
pub fn classify(response: &ApiResponse) -> WalkupError {
    let status = response.status;
    let (message, reason) = match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(envelope) => (
            envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {}", status)),
            envelope.error.reason,
        ),
        Err(_) if response.body.trim().is_empty() => (format!("HTTP {}", status), None),
        Err(_) => (response.body.trim().to_string(), None),
    };

    match status {
        429 => WalkupError::RateLimited {
            retry_after: retry_after(response),
        },
        401 => WalkupError::Auth(message),
        403 => WalkupError::Permission { message, reason },
        404 => WalkupError::NotFound { message, reason },
        500..=599 => WalkupError::Transient {
            status: Some(status),
            message,
        },
        _ => WalkupError::Client { status, message },
    }
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored.
pub fn retry_after(response: &ApiResponse) -> Option<Duration> {
    response
        .header("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map a reqwest failure that produced no response.
pub fn from_reqwest(err: &reqwest::Error) -> WalkupError {
    if err.is_decode() {
        WalkupError::parse(err.to_string())
    } else if err.is_builder() {
        WalkupError::validation(format!("Invalid request: {}", err))
    } else {
        // Timeouts, refused connections and resets are all worth retrying
        WalkupError::network(err.to_string())
    }
}
