//! Walkup - Segment Playback
//!
//! Platform-agnostic walk-up segment playback for Walkup.
//!
//! This crate provides:
//! - Bounded segment playback (start offset + duration)
//! - Automatic stop with exactly one armed timer at a time
//! - Token-based cancellation, so quick scrubbing between candidate segments
//!   never stops the wrong track
//! - Snapshot and watch-channel views of the playback state
//!
//! # Architecture
//!
//! `walkup-playback` does not talk to the streaming provider itself. The
//! provider's start/pause primitives come in through the
//! [`walkup_core::PlaybackTransport`] trait, which the controller owns
//! exclusively.

mod controller;
pub mod types;

// Public exports
pub use controller::SegmentPlayer;
pub use types::{PlaybackSnapshot, PlaybackStatus};
