//! Feed identity and priority.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::snapshot::AircraftSnapshot;

/// Identity of a telemetry feed.
///
/// Variants are declared in ascending priority, so the derived `Ord` is the
/// failover priority: `Plugin > Gdl90 > LegacyUdp > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// No feed is active.
    #[default]
    None,
    /// Simulator-native `DATA` broadcast.
    #[serde(rename = "legacy")]
    LegacyUdp,
    /// GDL-90 multicast.
    Gdl90,
    /// Primary plugin feed.
    Plugin,
}

impl FeedSource {
    /// Real feeds, highest priority first.
    pub const BY_PRIORITY: [FeedSource; 3] =
        [FeedSource::Plugin, FeedSource::Gdl90, FeedSource::LegacyUdp];

    /// Short lowercase name used in logs and config.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSource::None => "none",
            FeedSource::LegacyUdp => "legacy",
            FeedSource::Gdl90 => "gdl90",
            FeedSource::Plugin => "plugin",
        }
    }

    /// Returns true for every variant except [`FeedSource::None`].
    pub fn is_feed(&self) -> bool {
        *self != FeedSource::None
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly decoded snapshot, sent from a listener to the arbiter.
#[derive(Debug, Clone)]
pub struct FeedReport {
    pub source: FeedSource,
    pub snapshot: AircraftSnapshot,
    /// When the datagram was received.
    pub received_at: Instant,
}
