//! Walkup Core
//!
//! Platform-agnostic core types, coordination primitives and error handling
//! for Walkup, the walk-up song manager for recreational teams.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Player`, `Track`, `SongSegment`, `BattingOrder`, `GameSession`
//! - **Rotation**: pure current / on-deck / in-the-hole computation
//! - **InitGuard**: single-flight initialization for expensive subsystems
//! - **Collaborator Traits**: `AuthProvider`, `PlaybackTransport`
//! - **Error Handling**: Unified `WalkupError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use walkup_core::{rotation, BattingOrder, Player, PlayerId};
//!
//! let roster = vec![
//!     Player::with_id(PlayerId::new("p1"), "Avery"),
//!     Player::with_id(PlayerId::new("p2"), "Blake"),
//!     Player::with_id(PlayerId::new("p3"), "Casey"),
//! ];
//! let order = BattingOrder::with_position(
//!     roster.iter().map(|p| p.id.clone()).collect(),
//!     2,
//! )
//! .unwrap();
//!
//! assert_eq!(rotation::current_batter(&order, &roster).unwrap().name, "Casey");
//! assert_eq!(rotation::on_deck(&order, &roster).unwrap().name, "Avery");
//!
//! let order = rotation::advance(&order);
//! assert_eq!(order.current_position(), 0);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod init_guard;
pub mod rotation;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, WalkupError};
pub use init_guard::{InitError, InitGuard, InitOutcome, InitStatus};
pub use traits::{AuthProvider, PlaybackTransport};
pub use types::{
    BattingOrder, GameSession, Player, PlayerId, SegmentPolicy, SongSegment, Track, TrackId,
};
