//! `PlaybackTransport` over the provider's Web API player endpoints.

use crate::client::RateLimitedClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkup_core::error::REASON_NO_ACTIVE_DEVICE;
use walkup_core::{InitGuard, PlaybackTransport, Result, WalkupError};

/// Guard name of the device handshake
pub const PLAYBACK_DEVICE: &str = "playback-device";

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    /// Null for restricted devices
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

/// Pick the device to play on: the preferred name, else the active device,
/// else the first one that accepts commands.
fn select_device<'a>(devices: &'a [Device], preferred: Option<&str>) -> Option<&'a Device> {
    let usable = || devices.iter().filter(|d| d.id.is_some() && !d.is_restricted);

    preferred
        .and_then(|name| usable().find(|d| d.name.eq_ignore_ascii_case(name)))
        .or_else(|| usable().find(|d| d.is_active))
        .or_else(|| usable().next())
}

/// Plays tracks on a provider device through the rate-limited client.
///
/// The first `play()` runs the device handshake (pick a device, transfer
/// playback to it) through the shared [`InitGuard`], so concurrent first
/// plays share one handshake.
#[derive(Clone)]
pub struct WebPlaybackTransport {
    client: RateLimitedClient,
    guard: Arc<InitGuard<String>>,
    preferred_device: Option<String>,
}

impl WebPlaybackTransport {
    pub fn new(client: RateLimitedClient, guard: Arc<InitGuard<String>>) -> Self {
        Self {
            client,
            guard,
            preferred_device: None,
        }
    }

    /// Prefer the device with this name during the handshake.
    #[must_use]
    pub fn with_preferred_device(mut self, name: impl Into<String>) -> Self {
        self.preferred_device = Some(name.into());
        self
    }

    /// Run the device handshake if it has not succeeded yet.
    ///
    /// Returns the device id.
    pub async fn connect(&self) -> Result<String> {
        let client = self.client.clone();
        let preferred = self.preferred_device.clone();

        let outcome = self
            .guard
            .ensure_initialized(PLAYBACK_DEVICE, || async move {
                let response: DevicesResponse =
                    client.get_json("me/player/devices", &[]).await?;

                let device = select_device(&response.devices, preferred.as_deref())
                    .and_then(|d| d.id.clone().map(|id| (id, d.name.clone())))
                    .ok_or_else(|| WalkupError::NotFound {
                        message: "No playback device available".to_string(),
                        reason: Some(REASON_NO_ACTIVE_DEVICE.to_string()),
                    })?;
                let (id, name) = device;

                client
                    .put_json(
                        "me/player",
                        &[],
                        &json!({ "device_ids": [id.as_str()], "play": false }),
                    )
                    .await?;

                info!(device = %name, "Playback transferred to device");
                Ok::<_, WalkupError>(id)
            })
            .await?;

        Ok(outcome.into_value())
    }

    /// Forget the device; the next `play()` repeats the handshake.
    pub fn disconnect(&self) {
        info!("Disconnecting playback device");
        self.guard.reset(PLAYBACK_DEVICE);
    }

    pub fn device_id(&self) -> Option<String> {
        self.guard.value(PLAYBACK_DEVICE)
    }
}

#[async_trait]
impl PlaybackTransport for WebPlaybackTransport {
    async fn play(&self, uri: &str, start_position_ms: u64) -> Result<()> {
        let device_id = self.connect().await?;
        debug!(uri, start_position_ms, device = %device_id, "Starting playback");

        let result = self
            .client
            .put_json(
                "me/player/play",
                &[("device_id", device_id.as_str())],
                &json!({ "uris": [uri], "position_ms": start_position_ms }),
            )
            .await;

        if let Err(WalkupError::NotFound { .. }) = &result {
            warn!(device = %device_id, "Playback device disappeared");
            self.guard.reset(PLAYBACK_DEVICE);
        }
        result
    }

    async fn pause(&self) -> Result<()> {
        match self.device_id() {
            Some(device_id) => {
                self.client
                    .put("me/player/pause", &[("device_id", device_id.as_str())])
                    .await
            }
            None => self.client.put("me/player/pause", &[]).await,
        }
    }

    fn is_ready(&self) -> bool {
        self.guard.is_initialized(PLAYBACK_DEVICE)
    }
}
