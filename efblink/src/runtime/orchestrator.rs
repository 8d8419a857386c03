//! Telemetry runtime orchestrator.
//!
//! Owns the arbiter task, one listener task per enabled feed and, when the
//! plugin's address is not configured, a discovery task. All of them share a
//! single cancellation token.
//!
//! # Usage
//!
//! ```ignore
//! use efblink::runtime::{TelemetryRuntime, TelemetryRuntimeConfig};
//!
//! let runtime = TelemetryRuntime::start(TelemetryRuntimeConfig::default()).await;
//!
//! // Hand the read-only handle to consumers
//! let telemetry = runtime.telemetry();
//!
//! // When shutting down
//! runtime.shutdown().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::TelemetryRuntimeConfig;
use crate::arbiter::{FeedLiveness, SharedTelemetry, SourceArbiter};
use crate::feed::{
    discover, DiscoveryConfig, FeedDecoder, FeedError, FeedListener, FeedReport, FeedSource,
    LegacyDecoder, ListenerConfig, PluginDecoder,
};
use crate::protocol::Gdl90Decoder;

type ListenerHandle = JoinHandle<Result<(), FeedError>>;

/// A listener that bound successfully and is running.
struct RunningFeed {
    source: FeedSource,
    local_addr: SocketAddr,
    handle: ListenerHandle,
}

/// The telemetry subsystem: listeners plus arbiter.
///
/// # Lifecycle
///
/// 1. **Start**: `start()` spawns the arbiter, then binds and spawns each
///    enabled listener. A feed that fails to bind is logged and skipped.
///    If the plugin listener has no peer, discovery runs in the background
///    and hands the plugin's address to the listener's keep-alives.
/// 2. **Operation**: consumers read through [`telemetry()`](Self::telemetry)
/// 3. **Shutdown**: `shutdown()` cancels every task and waits for them.
///    Dropping the runtime without calling it still cancels the tasks.
pub struct TelemetryRuntime {
    telemetry: SharedTelemetry,
    liveness: Arc<FeedLiveness>,
    arbiter_handle: Option<JoinHandle<()>>,
    discovery_handle: Option<JoinHandle<()>>,
    feeds: Vec<RunningFeed>,
    plugin_peer: watch::Receiver<Option<SocketAddr>>,
    shutdown_token: CancellationToken,
}

impl TelemetryRuntime {
    /// Start the arbiter and all enabled listeners.
    pub async fn start(config: TelemetryRuntimeConfig) -> Self {
        info!("Starting telemetry runtime");

        let liveness = Arc::new(FeedLiveness::new());
        let (arbiter, report_tx) = SourceArbiter::new(config.arbiter, Arc::clone(&liveness));
        let telemetry = arbiter.telemetry();
        let shutdown_token = CancellationToken::new();

        let arbiter_shutdown = shutdown_token.clone();
        let arbiter_handle = Some(tokio::spawn(arbiter.run(arbiter_shutdown)));

        let mut feeds = Vec::with_capacity(3);
        let spawner = FeedSpawner {
            liveness: &liveness,
            report_tx: &report_tx,
            shutdown: &shutdown_token,
        };
        let (peer_tx, plugin_peer) = watch::channel(None);
        let mut discovery_handle = None;
        if let Some(listener) = config.plugin {
            peer_tx.send_replace(listener.peer);
            let discovery = config.discovery.filter(|_| listener.peer.is_none());
            let plugin = spawner
                .spawn(listener, PluginDecoder, Some(plugin_peer.clone()))
                .await;
            if let (Some(_), Some(discovery)) = (&plugin, discovery) {
                discovery_handle = Some(tokio::spawn(locate_plugin(
                    discovery,
                    peer_tx,
                    shutdown_token.clone(),
                )));
            }
            feeds.extend(plugin);
        }
        if let Some(listener) = config.gdl90 {
            feeds.extend(spawner.spawn(listener, Gdl90Decoder::new(), None).await);
        }
        if let Some(listener) = config.legacy {
            feeds.extend(spawner.spawn(listener, LegacyDecoder, None).await);
        }

        if feeds.is_empty() {
            warn!("No feed listeners running; telemetry will stay disconnected");
        }
        info!(feeds = feeds.len(), "Telemetry runtime started");

        Self {
            telemetry,
            liveness,
            arbiter_handle,
            discovery_handle,
            feeds,
            plugin_peer,
            shutdown_token,
        }
    }

    /// Read-only telemetry handle for consumers.
    pub fn telemetry(&self) -> SharedTelemetry {
        self.telemetry.clone()
    }

    /// Per-feed liveness timestamps.
    pub fn liveness(&self) -> Arc<FeedLiveness> {
        Arc::clone(&self.liveness)
    }

    /// Feeds whose listener is running, highest priority first.
    pub fn active_feeds(&self) -> Vec<FeedSource> {
        let mut feeds: Vec<_> = self
            .feeds
            .iter()
            .filter(|feed| !feed.handle.is_finished())
            .map(|feed| feed.source)
            .collect();
        feeds.sort_by(|a, b| b.cmp(a));
        feeds
    }

    /// Local address a feed's socket is bound to.
    pub fn local_addr(&self, source: FeedSource) -> Option<SocketAddr> {
        self.feeds
            .iter()
            .find(|feed| feed.source == source)
            .map(|feed| feed.local_addr)
    }

    /// Plugin address the primary feed is bootstrapping, configured or
    /// discovered. `None` until discovery finds a beacon.
    pub fn plugin_peer(&self) -> Option<SocketAddr> {
        *self.plugin_peer.borrow()
    }

    /// Check if the arbiter is still running.
    pub fn is_running(&self) -> bool {
        self.arbiter_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get the shutdown token for external coordination.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Shutdown the runtime gracefully.
    ///
    /// Cancels all tasks and waits for them. Listener errors are logged,
    /// never returned.
    pub async fn shutdown(mut self) {
        info!("Shutting down telemetry runtime");
        self.shutdown_token.cancel();

        if let Some(handle) = self.discovery_handle.take() {
            if let Err(e) = handle.await {
                error!("Discovery task panicked: {}", e);
            }
        }

        for feed in std::mem::take(&mut self.feeds) {
            match feed.handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(feed = %feed.source, error = %e, "Feed listener had failed"),
                Err(e) => error!(feed = %feed.source, "Feed listener task panicked: {}", e),
            }
        }

        if let Some(handle) = self.arbiter_handle.take() {
            if let Err(e) = handle.await {
                error!("Source arbiter task panicked: {}", e);
            }
        }

        info!("Telemetry runtime stopped");
    }
}

impl Drop for TelemetryRuntime {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

/// Binds and spawns listeners that share the runtime's plumbing.
struct FeedSpawner<'a> {
    liveness: &'a Arc<FeedLiveness>,
    report_tx: &'a mpsc::Sender<FeedReport>,
    shutdown: &'a CancellationToken,
}

impl FeedSpawner<'_> {
    async fn spawn<D: FeedDecoder>(
        &self,
        config: ListenerConfig,
        decoder: D,
        peer: Option<watch::Receiver<Option<SocketAddr>>>,
    ) -> Option<RunningFeed> {
        let source = decoder.source();
        let listener = match FeedListener::bind(
            config,
            decoder,
            Arc::clone(self.liveness),
            self.report_tx.clone(),
        )
        .await
        {
            Ok(listener) => listener,
            Err(e) => {
                warn!(feed = %source, error = %e, "Feed disabled: listener could not start");
                return None;
            }
        };

        let listener = match peer {
            Some(peer) => listener.with_peer(peer),
            None => listener,
        };

        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(feed = %source, error = %e, "Feed disabled: no local address");
                return None;
            }
        };

        Some(RunningFeed {
            source,
            local_addr,
            handle: listener.start(self.shutdown.clone()),
        })
    }
}

/// Wait for the simulator beacon, then point the plugin listener at it.
///
/// Timeouts retry; a socket error gives up and leaves the plugin feed
/// waiting for traffic.
async fn locate_plugin(
    config: DiscoveryConfig,
    peer_tx: watch::Sender<Option<SocketAddr>>,
    shutdown: CancellationToken,
) {
    loop {
        match discover(&config, &shutdown).await {
            Ok(Some(beacon)) => {
                info!(
                    name = %beacon.name,
                    plugin = %beacon.plugin_addr,
                    "Plugin located, bootstrapping primary feed"
                );
                peer_tx.send_replace(Some(beacon.plugin_addr));
                return;
            }
            Ok(None) if shutdown.is_cancelled() => return,
            Ok(None) => debug!("No beacon yet, listening again"),
            Err(e) => {
                warn!(error = %e, "Plugin discovery failed; primary feed needs plugin.target");
                return;
            }
        }
    }
}
