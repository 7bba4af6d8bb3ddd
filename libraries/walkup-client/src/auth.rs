//! Fixed-token auth provider.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use walkup_core::AuthProvider;

/// Hands out one pre-acquired access token until it expires.
///
/// Acquiring and refreshing tokens happens elsewhere; this is what the CLI
/// uses with a token pasted into the config or environment.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl StaticTokenProvider {
    /// A token with no known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// A token valid for `expires_in` from now.
    pub fn expiring_in(token: impl Into<String>, expires_in: Duration) -> Self {
        Self::expiring_at(token, Utc::now() + expires_in)
    }

    pub fn expiring_at(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.is_token_valid().then(|| self.token.clone())
    }

    fn is_token_valid(&self) -> bool {
        !self.token.is_empty() && self.expires_at.map_or(true, |at| at > Utc::now())
    }
}
