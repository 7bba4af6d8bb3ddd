/// Walk-up song segment
use super::Track;
use crate::error::{Result, WalkupError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds on how long a walk-up segment may be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPolicy {
    /// Shortest allowed segment in milliseconds (default: 5s)
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,

    /// Longest allowed segment in milliseconds (default: 60s)
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
}

fn default_min_duration_ms() -> u64 {
    5_000
}

fn default_max_duration_ms() -> u64 {
    60_000
}

impl Default for SegmentPolicy {
    fn default() -> Self {
        Self {
            min_duration_ms: default_min_duration_ms(),
            max_duration_ms: default_max_duration_ms(),
        }
    }
}

impl SegmentPolicy {
    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    /// Reject inverted or empty bounds
    pub fn validate(&self) -> Result<()> {
        if self.min_duration_ms == 0 || self.min_duration_ms > self.max_duration_ms {
            return Err(WalkupError::validation(format!(
                "segment policy bounds invalid: min {}ms, max {}ms",
                self.min_duration_ms, self.max_duration_ms
            )));
        }
        Ok(())
    }
}

/// Bounded window of a track played when a player walks up
///
/// Immutable once built: editing a player's song replaces the whole segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSegment {
    track: Track,
    start_ms: u64,
    duration_ms: u64,
}

impl SongSegment {
    /// Build a segment, checking it fits in the track and in the policy
    pub fn new(
        track: Track,
        start: Duration,
        duration: Duration,
        policy: &SegmentPolicy,
    ) -> Result<Self> {
        if duration < policy.min_duration() || duration > policy.max_duration() {
            return Err(WalkupError::validation(format!(
                "segment duration {:?} outside {:?}..={:?}",
                duration,
                policy.min_duration(),
                policy.max_duration()
            )));
        }

        let end = start + duration;
        if start >= track.duration() || end > track.duration() {
            return Err(WalkupError::validation(format!(
                "segment {:?}..{:?} does not fit in track of {:?}",
                start,
                end,
                track.duration()
            )));
        }

        Ok(Self {
            track,
            start_ms: start.as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
        })
    }

    /// Build a segment from a start and end position
    pub fn from_range(
        track: Track,
        start: Duration,
        end: Duration,
        policy: &SegmentPolicy,
    ) -> Result<Self> {
        if end <= start {
            return Err(WalkupError::validation(format!(
                "segment end {:?} must be after start {:?}",
                end, start
            )));
        }
        Self::new(track, start, end - start, policy)
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn start(&self) -> Duration {
        Duration::from_millis(self.start_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn end(&self) -> Duration {
        self.start() + self.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(secs: u64) -> Track {
        Track::new("t1", "prov:track:t1", "Song", Duration::from_secs(secs))
    }

    #[test]
    fn default_policy() {
        let policy = SegmentPolicy::default();
        assert_eq!(policy.min_duration(), Duration::from_secs(5));
        assert_eq!(policy.max_duration(), Duration::from_secs(60));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn valid_segment() {
        let segment = SongSegment::new(
            track(200),
            Duration::from_secs(30),
            Duration::from_secs(8),
            &SegmentPolicy::default(),
        )
        .unwrap();

        assert_eq!(segment.start(), Duration::from_secs(30));
        assert_eq!(segment.end(), Duration::from_secs(38));
        assert_eq!(segment.track().id.as_str(), "t1");
    }

    #[test]
    fn segment_may_end_exactly_at_track_end() {
        let result = SongSegment::new(
            track(40),
            Duration::from_secs(30),
            Duration::from_secs(10),
            &SegmentPolicy::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn segment_past_track_end_rejected() {
        let result = SongSegment::new(
            track(35),
            Duration::from_secs(30),
            Duration::from_secs(10),
            &SegmentPolicy::default(),
        );
        assert!(matches!(result, Err(WalkupError::Validation(_))));
    }

    #[test]
    fn duration_outside_policy_rejected() {
        let policy = SegmentPolicy::default();
        assert!(SongSegment::new(track(200), Duration::ZERO, Duration::from_secs(4), &policy)
            .is_err());
        assert!(SongSegment::new(track(200), Duration::ZERO, Duration::from_secs(61), &policy)
            .is_err());
    }

    #[test]
    fn from_range_rejects_inverted_range() {
        let policy = SegmentPolicy::default();
        let result = SongSegment::from_range(
            track(200),
            Duration::from_secs(20),
            Duration::from_secs(10),
            &policy,
        );
        assert!(matches!(result, Err(WalkupError::Validation(_))));

        let segment = SongSegment::from_range(
            track(200),
            Duration::from_secs(10),
            Duration::from_secs(25),
            &policy,
        )
        .unwrap();
        assert_eq!(segment.duration(), Duration::from_secs(15));
    }

    #[test]
    fn inverted_policy_rejected() {
        let policy = SegmentPolicy {
            min_duration_ms: 10_000,
            max_duration_ms: 5_000,
        };
        assert!(policy.validate().is_err());
    }
}
