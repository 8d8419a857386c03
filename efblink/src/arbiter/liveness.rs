//! Per-feed liveness timestamps.
//!
//! Each listener owns one slot and is its only writer; the arbiter only
//! reads. Timestamps are stored as microseconds since a shared epoch so
//! they fit an `AtomicU64`, with 0 reserved for "never".

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::feed::FeedSource;

/// Last-packet timestamps for the three feeds.
#[derive(Debug)]
pub struct FeedLiveness {
    epoch: Instant,
    slots: [AtomicU64; 3],
}

impl Default for FeedLiveness {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedLiveness {
    /// Create liveness tracking with every feed marked as never seen.
    pub fn new() -> Self {
        Self::with_epoch(Instant::now())
    }

    /// Create liveness tracking relative to a specific epoch.
    ///
    /// Timestamps earlier than the epoch are clamped to it.
    pub fn with_epoch(epoch: Instant) -> Self {
        Self {
            epoch,
            slots: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    fn slot(&self, source: FeedSource) -> Option<&AtomicU64> {
        match source {
            FeedSource::None => None,
            FeedSource::LegacyUdp => Some(&self.slots[0]),
            FeedSource::Gdl90 => Some(&self.slots[1]),
            FeedSource::Plugin => Some(&self.slots[2]),
        }
    }

    /// Record a successfully decoded packet for `source`.
    pub fn record(&self, source: FeedSource, at: Instant) {
        if let Some(slot) = self.slot(source) {
            let micros = at.saturating_duration_since(self.epoch).as_micros();
            // Offset by one so that a packet at the epoch is not "never".
            let stored = u64::try_from(micros).unwrap_or(u64::MAX - 1) + 1;
            slot.store(stored, Ordering::Release);
        }
    }

    /// Time of the last packet from `source`, if any.
    pub fn last_packet(&self, source: FeedSource) -> Option<Instant> {
        let stored = self.slot(source)?.load(Ordering::Acquire);
        if stored == 0 {
            return None;
        }
        Some(self.epoch + Duration::from_micros(stored - 1))
    }

    /// Age of the last packet from `source` at `now`.
    ///
    /// `None` if the feed has never delivered a packet.
    pub fn age(&self, source: FeedSource, now: Instant) -> Option<Duration> {
        self.last_packet(source)
            .map(|last| now.saturating_duration_since(last))
    }

    /// Most recent packet across all feeds.
    pub fn most_recent(&self) -> Option<Instant> {
        FeedSource::BY_PRIORITY
            .iter()
            .filter_map(|source| self.last_packet(*source))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_seen() {
        let liveness = FeedLiveness::new();
        for source in FeedSource::BY_PRIORITY {
            assert!(liveness.last_packet(source).is_none());
            assert!(liveness.age(source, Instant::now()).is_none());
        }
        assert!(liveness.most_recent().is_none());
    }

    #[test]
    fn test_record_and_age() {
        let epoch = Instant::now();
        let liveness = FeedLiveness::with_epoch(epoch);
        let at = epoch + Duration::from_millis(250);

        liveness.record(FeedSource::Gdl90, at);

        assert_eq!(liveness.last_packet(FeedSource::Gdl90), Some(at));
        assert_eq!(
            liveness.age(FeedSource::Gdl90, at + Duration::from_millis(100)),
            Some(Duration::from_millis(100))
        );
        assert!(liveness.last_packet(FeedSource::Plugin).is_none());
    }

    #[test]
    fn test_record_at_epoch_is_not_never() {
        let epoch = Instant::now();
        let liveness = FeedLiveness::with_epoch(epoch);
        liveness.record(FeedSource::Plugin, epoch);
        assert_eq!(liveness.last_packet(FeedSource::Plugin), Some(epoch));
    }

    #[test]
    fn test_none_source_ignored() {
        let liveness = FeedLiveness::new();
        liveness.record(FeedSource::None, Instant::now());
        assert!(liveness.last_packet(FeedSource::None).is_none());
        assert!(liveness.most_recent().is_none());
    }

    #[test]
    fn test_most_recent() {
        let epoch = Instant::now();
        let liveness = FeedLiveness::with_epoch(epoch);
        liveness.record(FeedSource::Plugin, epoch + Duration::from_millis(10));
        liveness.record(FeedSource::LegacyUdp, epoch + Duration::from_millis(30));
        assert_eq!(
            liveness.most_recent(),
            Some(epoch + Duration::from_millis(30))
        );
    }

    #[test]
    fn test_age_never_negative() {
        let epoch = Instant::now();
        let liveness = FeedLiveness::with_epoch(epoch);
        liveness.record(FeedSource::Plugin, epoch + Duration::from_secs(1));
        assert_eq!(liveness.age(FeedSource::Plugin, epoch), Some(Duration::ZERO));
    }
}
