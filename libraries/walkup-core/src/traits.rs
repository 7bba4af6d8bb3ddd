/// Collaborator traits for Walkup
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of provider access tokens
///
/// Token acquisition (OAuth flows, refresh) lives outside this workspace;
/// implementers only hand out whatever token they currently hold.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current access token, `None` when signed out
    async fn access_token(&self) -> Option<String>;

    /// Whether the held token is still usable without a refresh
    fn is_token_valid(&self) -> bool;
}

#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    async fn access_token(&self) -> Option<String> {
        (**self).access_token().await
    }

    fn is_token_valid(&self) -> bool {
        (**self).is_token_valid()
    }
}

/// Start/stop primitives of the streaming provider's player
///
/// Owned exclusively by the segment controller; nothing else should call
/// these directly.
#[async_trait]
pub trait PlaybackTransport: Send + Sync {
    /// Start playing `uri` at `start_position_ms`
    ///
    /// # Errors
    /// Returns the provider failure (no device, premium required, ...)
    async fn play(&self, uri: &str, start_position_ms: u64) -> Result<()>;

    /// Pause whatever is playing
    async fn pause(&self) -> Result<()>;

    /// Whether the device handshake has completed
    fn is_ready(&self) -> bool;
}

#[async_trait]
impl<T: PlaybackTransport + ?Sized> PlaybackTransport for Arc<T> {
    async fn play(&self, uri: &str, start_position_ms: u64) -> Result<()> {
        (**self).play(uri, start_position_ms).await
    }

    async fn pause(&self) -> Result<()> {
        (**self).pause().await
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}
