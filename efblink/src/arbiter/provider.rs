//! Consumer-facing telemetry traits and shared handle.
//!
//! - [`TelemetryProvider`] - Query API (pull)
//! - [`TelemetryBroadcaster`] - Subscription API (push)
//! - [`SharedTelemetry`] - Cloneable read-only handle implementing both
//!
//! Consumers never write; the arbiter is the only publisher.

use std::sync::Arc;

use tokio::sync::watch;

use super::daemon::PublishedSnapshot;
use super::status::ConnectionStatus;
use crate::feed::FeedSource;

/// Trait for querying the unified telemetry (pull API).
pub trait TelemetryProvider: Send + Sync {
    /// Latest published snapshot, if any feed has delivered one.
    fn snapshot(&self) -> Option<Arc<PublishedSnapshot>>;

    /// Latest connection status.
    fn status(&self) -> ConnectionStatus;

    /// Feed currently supplying snapshots.
    fn active_source(&self) -> FeedSource;

    /// Check if any feed is active.
    fn is_connected(&self) -> bool;
}

/// Trait for subscribing to telemetry changes (push API).
///
/// Receivers always observe the latest value; intermediate values may be
/// skipped by slow consumers.
pub trait TelemetryBroadcaster: Send + Sync {
    /// Subscribe to published snapshots.
    fn subscribe_snapshots(&self) -> watch::Receiver<Option<Arc<PublishedSnapshot>>>;

    /// Subscribe to connection status updates.
    fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus>;
}

/// Shared telemetry handle.
///
/// # Usage
///
/// ```ignore
/// let telemetry = runtime.telemetry();
///
/// if let Some(published) = telemetry.snapshot() {
///     println!("IAS {:.0} kt from {}", published.snapshot.ias_kts, published.source);
/// }
///
/// let mut status_rx = telemetry.subscribe_status();
/// while status_rx.changed().await.is_ok() {
///     println!("{:?}", *status_rx.borrow());
/// }
/// ```
#[derive(Clone)]
pub struct SharedTelemetry {
    snapshot_rx: watch::Receiver<Option<Arc<PublishedSnapshot>>>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl SharedTelemetry {
    pub(crate) fn new(
        snapshot_rx: watch::Receiver<Option<Arc<PublishedSnapshot>>>,
        status_rx: watch::Receiver<ConnectionStatus>,
    ) -> Self {
        Self {
            snapshot_rx,
            status_rx,
        }
    }
}

impl TelemetryProvider for SharedTelemetry {
    fn snapshot(&self) -> Option<Arc<PublishedSnapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    fn active_source(&self) -> FeedSource {
        self.status_rx.borrow().source
    }

    fn is_connected(&self) -> bool {
        self.status_rx.borrow().is_connected()
    }
}

impl TelemetryBroadcaster for SharedTelemetry {
    fn subscribe_snapshots(&self) -> watch::Receiver<Option<Arc<PublishedSnapshot>>> {
        self.snapshot_rx.clone()
    }

    fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }
}

// Allow Arc<SharedTelemetry> to be used as provider
impl TelemetryProvider for Arc<SharedTelemetry> {
    fn snapshot(&self) -> Option<Arc<PublishedSnapshot>> {
        (**self).snapshot()
    }

    fn status(&self) -> ConnectionStatus {
        (**self).status()
    }

    fn active_source(&self) -> FeedSource {
        (**self).active_source()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

impl TelemetryBroadcaster for Arc<SharedTelemetry> {
    fn subscribe_snapshots(&self) -> watch::Receiver<Option<Arc<PublishedSnapshot>>> {
        (**self).subscribe_snapshots()
    }

    fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        (**self).subscribe_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::status::LinkState;
    use crate::snapshot::AircraftSnapshot;
    use std::time::Instant;

    type Channels = (
        watch::Sender<Option<Arc<PublishedSnapshot>>>,
        watch::Sender<ConnectionStatus>,
        SharedTelemetry,
    );

    fn create_shared() -> Channels {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        (snapshot_tx, status_tx, SharedTelemetry::new(snapshot_rx, status_rx))
    }

    #[test]
    fn test_shared_empty() {
        let (_s, _t, shared) = create_shared();

        assert!(shared.snapshot().is_none());
        assert!(!shared.is_connected());
        assert_eq!(shared.active_source(), FeedSource::None);
        assert_eq!(shared.status().state, LinkState::Disconnected);
    }

    #[test]
    fn test_shared_sees_published_values() {
        let (snapshot_tx, status_tx, shared) = create_shared();

        snapshot_tx.send_replace(Some(Arc::new(PublishedSnapshot {
            source: FeedSource::Plugin,
            received_at: Instant::now(),
            snapshot: AircraftSnapshot {
                latitude: 47.5,
                ..Default::default()
            },
        })));
        status_tx.send_replace(ConnectionStatus {
            state: LinkState::Connected,
            source: FeedSource::Plugin,
            latency_ms: 12,
            last_packet_age_ms: Some(12),
        });

        assert_eq!(shared.snapshot().unwrap().snapshot.latitude, 47.5);
        assert!(shared.is_connected());
        assert_eq!(shared.active_source(), FeedSource::Plugin);
    }

    #[tokio::test]
    async fn test_subscribe_status_notifies() {
        let (_s, status_tx, shared) = create_shared();
        let mut rx = shared.subscribe_status();

        status_tx.send_replace(ConnectionStatus {
            state: LinkState::Reconnecting,
            ..Default::default()
        });

        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().state, LinkState::Reconnecting);
    }

    #[test]
    fn test_arc_wrapped() {
        let (_s, status_tx, shared) = create_shared();
        let shared = Arc::new(shared);

        status_tx.send_replace(ConnectionStatus {
            state: LinkState::Connected,
            source: FeedSource::Gdl90,
            latency_ms: 1,
            last_packet_age_ms: Some(1),
        });

        assert!(TelemetryProvider::is_connected(&shared));
        assert_eq!(
            TelemetryProvider::active_source(&shared),
            FeedSource::Gdl90
        );
        let rx = TelemetryBroadcaster::subscribe_snapshots(&shared);
        assert!(rx.borrow().is_none());
    }
}
