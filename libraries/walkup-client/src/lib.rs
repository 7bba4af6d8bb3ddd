//! Walkup Provider Client
//!
//! Rate-limited HTTP client for the streaming provider's Web API.
//!
//! # Features
//!
//! - **Request queue**: FIFO dispatch under a requests-per-second budget
//! - **Retries**: exponential backoff with jitter, `Retry-After` honored on 429
//! - **Catalog**: track search and lookup normalized into `walkup_core::Track`
//! - **Playback**: a `PlaybackTransport` driving a provider device
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use walkup_client::{CatalogClient, ClientConfig, RateLimitedClient, ReqwestTransport, StaticTokenProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let auth = Arc::new(StaticTokenProvider::new("access-token"));
//!     let client = RateLimitedClient::new(ReqwestTransport::new(&config)?, &config, Some(auth))?;
//!
//!     let catalog = CatalogClient::new(client);
//!     for track in catalog.search_tracks("thunderstruck", 5).await? {
//!         println!("{}", track.display_name());
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod catalog;
mod client;
pub mod error;
mod player;
mod retry;
mod transport;
mod types;

// Re-export main types
pub use auth::StaticTokenProvider;
pub use catalog::{CatalogClient, MAX_SEARCH_LIMIT};
pub use client::RateLimitedClient;
pub use player::{Device, WebPlaybackTransport, PLAYBACK_DEVICE};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{ApiRequest, ApiResponse, ClientConfig, Method, DEFAULT_BASE_URL};
