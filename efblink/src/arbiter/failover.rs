//! Failover state machine.
//!
//! Two inputs drive the active feed:
//!
//! - **Reports** ([`FailoverState::on_report`]): a freshly decoded packet
//!   promotes its feed immediately if its priority is at least that of the
//!   active feed. Lower-priority reports are dropped.
//! - **Ticks** ([`FailoverState::evaluate`]): every health interval, the
//!   highest-priority feed whose age is strictly below the stale threshold
//!   becomes active, or `None` if no feed qualifies. The tick is
//!   authoritative and corrects any promotion within one interval.

use std::time::{Duration, Instant};

use tracing::info;

use super::liveness::FeedLiveness;
use super::status::{saturating_millis, ConnectionStatus, LinkState};
use crate::feed::FeedSource;

/// Pick the highest-priority feed whose age is below `threshold`.
///
/// `age_of` returns `None` for feeds that have never delivered a packet.
pub fn select_active<F>(threshold: Duration, age_of: F) -> FeedSource
where
    F: Fn(FeedSource) -> Option<Duration>,
{
    FeedSource::BY_PRIORITY
        .into_iter()
        .find(|source| age_of(*source).is_some_and(|age| age < threshold))
        .unwrap_or(FeedSource::None)
}

/// Arbiter-owned failover state.
#[derive(Debug)]
pub struct FailoverState {
    stale_threshold: Duration,
    reconnect_window: Duration,
    active: FeedSource,
    /// Packet time of the last report accepted from the active feed.
    last_accepted: Option<Instant>,
}

impl FailoverState {
    pub fn new(stale_threshold: Duration, reconnect_window: Duration) -> Self {
        Self {
            stale_threshold,
            reconnect_window,
            active: FeedSource::None,
            last_accepted: None,
        }
    }

    /// Currently active feed.
    pub fn active(&self) -> FeedSource {
        self.active
    }

    /// Time of the most recently accepted packet.
    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    /// Handle a freshly decoded report.
    ///
    /// Returns true if the report's snapshot should be published.
    pub fn on_report(&mut self, source: FeedSource, at: Instant) -> bool {
        if !source.is_feed() || source < self.active {
            return false;
        }

        if source != self.active {
            info!(from = %self.active, to = %source, "Feed promoted");
            self.active = source;
        }
        self.accept(at);
        true
    }

    /// Re-select the active feed from liveness and derive the status.
    pub fn evaluate(&mut self, liveness: &FeedLiveness, now: Instant) -> ConnectionStatus {
        let selected = select_active(self.stale_threshold, |source| liveness.age(source, now));

        if selected != self.active {
            match selected {
                FeedSource::None => info!(from = %self.active, "All feeds stale"),
                to => info!(from = %self.active, to = %to, "Feed failover"),
            }
            self.active = selected;
        }

        if let Some(last) = liveness.last_packet(self.active) {
            self.accept(last);
        }

        self.status(liveness, now)
    }

    /// Derive the status for the current active feed without re-selecting.
    pub fn status(&self, liveness: &FeedLiveness, now: Instant) -> ConnectionStatus {
        let last_packet_age = self
            .last_accepted
            .map(|last| now.saturating_duration_since(last));

        let state = if self.active.is_feed() {
            LinkState::Connected
        } else if last_packet_age.is_some_and(|age| age < self.reconnect_window) {
            LinkState::Reconnecting
        } else {
            LinkState::Disconnected
        };

        let latency = liveness.age(self.active, now).unwrap_or(Duration::ZERO);

        ConnectionStatus {
            state,
            source: self.active,
            latency_ms: saturating_millis(latency),
            last_packet_age_ms: last_packet_age.map(saturating_millis),
        }
    }

    fn accept(&mut self, at: Instant) {
        if self.last_accepted.is_none_or(|last| at > last) {
            self.last_accepted = Some(at);
        }
    }
}
