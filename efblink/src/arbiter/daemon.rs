//! Source arbiter task.
//!
//! The arbiter is the single owner of failover state and the only writer
//! of the published snapshot and status. Listeners reach it through an
//! mpsc channel of [`FeedReport`]s and through their liveness slots.
//!
//! # Design Notes
//!
//! The run loop uses `tokio::select!` with biased polling:
//! 1. Cancellation (highest priority)
//! 2. Incoming reports (opportunistic promotion)
//! 3. Health interval (authoritative re-selection)

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::failover::FailoverState;
use super::liveness::FeedLiveness;
use super::provider::SharedTelemetry;
use super::status::ConnectionStatus;
use crate::feed::{FeedReport, FeedSource};
use crate::snapshot::AircraftSnapshot;

/// Default health evaluation period.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_millis(100);

/// Default age beyond which a feed is stale.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_millis(500);

/// Default window during which a lost link reports `Reconnecting`.
pub const DEFAULT_RECONNECT_WINDOW: Duration = Duration::from_millis(5000);

/// Default capacity of the report channel.
pub const DEFAULT_REPORT_CAPACITY: usize = 64;

/// Arbiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbiterConfig {
    /// Period of the health evaluation loop.
    pub health_interval: Duration,

    /// A feed whose last packet is at least this old is stale.
    pub stale_threshold: Duration,

    /// How long after the last accepted packet the status stays `Reconnecting`.
    pub reconnect_window: Duration,

    /// Capacity of the listener → arbiter report channel.
    pub report_capacity: usize,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            health_interval: DEFAULT_HEALTH_INTERVAL,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            reconnect_window: DEFAULT_RECONNECT_WINDOW,
            report_capacity: DEFAULT_REPORT_CAPACITY,
        }
    }
}

/// A snapshot as published to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedSnapshot {
    /// Feed the snapshot came from.
    pub source: FeedSource,
    /// When the underlying datagram was received.
    pub received_at: Instant,
    pub snapshot: AircraftSnapshot,
}

/// Selects the active feed and publishes the unified snapshot stream.
pub struct SourceArbiter {
    config: ArbiterConfig,
    liveness: Arc<FeedLiveness>,
    state: FailoverState,
    report_rx: mpsc::Receiver<FeedReport>,
    snapshot_tx: watch::Sender<Option<Arc<PublishedSnapshot>>>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl SourceArbiter {
    /// Create an arbiter and the sender listeners report through.
    pub fn new(
        config: ArbiterConfig,
        liveness: Arc<FeedLiveness>,
    ) -> (Self, mpsc::Sender<FeedReport>) {
        let (report_tx, report_rx) = mpsc::channel(config.report_capacity.max(1));
        let (snapshot_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        let state = FailoverState::new(config.stale_threshold, config.reconnect_window);

        let arbiter = Self {
            config,
            liveness,
            state,
            report_rx,
            snapshot_tx,
            status_tx,
        };
        (arbiter, report_tx)
    }

    /// Read-only handle for consumers.
    ///
    /// Handles stay valid after the arbiter stops; they keep returning the
    /// last published values.
    pub fn telemetry(&self) -> SharedTelemetry {
        SharedTelemetry::new(self.snapshot_tx.subscribe(), self.status_tx.subscribe())
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            health_interval_ms = self.config.health_interval.as_millis() as u64,
            stale_threshold_ms = self.config.stale_threshold.as_millis() as u64,
            "Source arbiter started"
        );

        let mut interval = tokio::time::interval(self.config.health_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reports_open = true;
        let mut reports_accepted: u64 = 0;
        let mut reports_dropped: u64 = 0;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                // Ahead of reports so a busy feed cannot delay staleness checks.
                _ = interval.tick() => self.evaluate(Instant::now()),

                report = self.report_rx.recv(), if reports_open => {
                    let Some(report) = report else {
                        debug!("All feed listeners gone; arbiter keeps evaluating");
                        reports_open = false;
                        continue;
                    };
                    if self.handle_report(report) {
                        reports_accepted += 1;
                    } else {
                        reports_dropped += 1;
                    }
                }
            }
        }

        info!(reports_accepted, reports_dropped, "Source arbiter stopped");
    }

    /// Apply one report. Returns true if its snapshot was published.
    fn handle_report(&mut self, report: FeedReport) -> bool {
        let previous = self.state.active();
        if !self.state.on_report(report.source, report.received_at) {
            trace!(source = %report.source, active = %previous, "Dropping non-active feed snapshot");
            return false;
        }

        self.snapshot_tx.send_replace(Some(Arc::new(PublishedSnapshot {
            source: report.source,
            received_at: report.received_at,
            snapshot: report.snapshot,
        })));

        if self.state.active() != previous {
            let status = self.state.status(&self.liveness, Instant::now());
            self.status_tx.send_replace(status);
        }
        true
    }

    fn evaluate(&mut self, now: Instant) {
        let status = self.state.evaluate(&self.liveness, now);
        self.status_tx.send_replace(status);
    }
}
