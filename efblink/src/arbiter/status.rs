//! Connection status published by the arbiter.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::feed::FeedSource;

/// Link state derived on every health tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// A feed is active.
    Connected,
    /// No feed is active, but a packet was accepted recently.
    Reconnecting,
    /// Nothing accepted within the reconnect window.
    #[default]
    Disconnected,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Connected => "connected",
            LinkState::Reconnecting => "reconnecting",
            LinkState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived view of the feed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionStatus {
    pub state: LinkState,
    /// Feed currently supplying snapshots.
    pub source: FeedSource,
    /// Age of the active feed's last packet; 0 when no feed is active.
    pub latency_ms: u32,
    /// Age of the last accepted packet, if any was ever accepted.
    pub last_packet_age_ms: Option<u32>,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Returns true when state or source differ from `other`.
    ///
    /// Latency changes on every tick and is ignored here.
    pub fn is_transition_from(&self, other: &ConnectionStatus) -> bool {
        self.state != other.state || self.source != other.source
    }
}

/// Whole milliseconds in `duration`, saturated into `u32`.
pub fn saturating_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
