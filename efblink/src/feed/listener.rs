//! Feed listener - one UDP socket, one decoder, one receive loop.
//!
//! The listener is generic over [`FeedDecoder`], so the plugin, GDL-90 and
//! legacy feeds share the same loop:
//!
//! 1. Receive a datagram (or stop on cancellation)
//! 2. Decode it; undecodable datagrams are dropped
//! 3. Record the feed's liveness timestamp
//! 4. Forward a [`FeedReport`] to the arbiter
//! 5. Send the decoder's reply (the plugin ack) back to the sender
//!
//! Decoders with a keep-alive also get a timer branch: while nothing has
//! been decoded for one keep-alive interval, the keep-alive is sent to the
//! known peer. The peer comes from the listener config or, for a discovered
//! plugin, from a `watch` channel filled in later.
//!
//! A socket receive error ends the loop. The feed then simply goes stale and
//! the arbiter fails over; nothing else is affected.
//!
//! # Example
//!
//! ```ignore
//! let listener = FeedListener::bind(
//!     ListenerConfig::legacy(),
//!     LegacyDecoder,
//!     liveness,
//!     report_tx,
//! )
//! .await?;
//! let handle = listener.start(shutdown.clone());
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::{ListenerConfig, KEEPALIVE_INTERVAL, MAX_DATAGRAM_SIZE};
use super::decoder::FeedDecoder;
use super::error::FeedError;
use super::socket::FeedSocket;
use super::source::{FeedReport, FeedSource};
use crate::arbiter::FeedLiveness;

/// Number of failed report sends logged before going quiet.
const REPORT_FAILURE_LOG_LIMIT: u64 = 3;

/// Number of undecodable datagrams logged at debug level.
const DROP_LOG_LIMIT: u64 = 5;

/// Shortest keep-alive period; a zero tokio interval panics.
const MIN_KEEPALIVE_INTERVAL: Duration = Duration::from_millis(10);

/// Counters kept by a running listener.
#[derive(Debug, Default, Clone, Copy)]
struct ListenerStats {
    datagrams: u64,
    decoded: u64,
    dropped: u64,
    report_failures: u64,
    keepalives: u64,
}

/// What woke the receive loop.
enum Wakeup {
    Datagram(usize, SocketAddr),
    KeepaliveDue,
}

/// UDP listener for one telemetry feed.
pub struct FeedListener<D: FeedDecoder, S: FeedSocket = UdpSocket> {
    socket: S,
    decoder: D,
    liveness: Arc<FeedLiveness>,
    report_tx: mpsc::Sender<FeedReport>,
    peer: watch::Receiver<Option<SocketAddr>>,
    keepalive_interval: Duration,
}

impl<D: FeedDecoder> FeedListener<D, UdpSocket> {
    /// Bind the socket described by `config`.
    ///
    /// Joins the multicast group and enables broadcast as configured.
    pub async fn bind(
        config: ListenerConfig,
        decoder: D,
        liveness: Arc<FeedLiveness>,
        report_tx: mpsc::Sender<FeedReport>,
    ) -> Result<Self, FeedError> {
        let feed = decoder.source().as_str();

        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| FeedError::Bind {
                feed,
                addr: config.bind_addr,
                source,
            })?;

        if config.broadcast {
            socket
                .set_broadcast(true)
                .map_err(|source| FeedError::Bind {
                    feed,
                    addr: config.bind_addr,
                    source,
                })?;
        }

        if let Some(group) = config.multicast_group {
            socket
                .join_multicast_v4(group, config.multicast_interface)
                .map_err(|source| FeedError::JoinMulticast {
                    feed,
                    group,
                    source,
                })?;
        }

        info!(
            feed,
            local_addr = ?socket.local_addr().ok(),
            multicast = ?config.multicast_group,
            broadcast = config.broadcast,
            peer = ?config.peer,
            "Feed listener bound"
        );

        let (_, peer) = watch::channel(config.peer);
        Ok(Self::from_socket(socket, decoder, liveness, report_tx)
            .with_peer(peer)
            .with_keepalive_interval(config.keepalive_interval))
    }
}

impl<D: FeedDecoder, S: FeedSocket> FeedListener<D, S> {
    /// Wrap an already bound socket.
    ///
    /// No peer is known and the default keep-alive interval applies.
    pub fn from_socket(
        socket: S,
        decoder: D,
        liveness: Arc<FeedLiveness>,
        report_tx: mpsc::Sender<FeedReport>,
    ) -> Self {
        let (_, peer) = watch::channel(None);
        Self {
            socket,
            decoder,
            liveness,
            report_tx,
            peer,
            keepalive_interval: KEEPALIVE_INTERVAL,
        }
    }

    /// Take the keep-alive target from `peer`, which may be filled in after
    /// the loop has started.
    pub fn with_peer(mut self, peer: watch::Receiver<Option<SocketAddr>>) -> Self {
        self.peer = peer;
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval.max(MIN_KEEPALIVE_INTERVAL);
        self
    }

    /// Feed this listener serves.
    pub fn source(&self) -> FeedSource {
        self.decoder.source()
    }

    /// Local address of the bound socket.
    pub fn local_addr(&self) -> Result<SocketAddr, FeedError> {
        self.socket.local_addr().map_err(|source| FeedError::Receive {
            feed: self.source().as_str(),
            source,
        })
    }

    /// Start the receive loop.
    ///
    /// The socket is closed when the returned task finishes.
    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<Result<(), FeedError>> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(mut self, shutdown: CancellationToken) -> Result<(), FeedError> {
        let source = self.source();
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut stats = ListenerStats::default();

        let keepalive = self.decoder.keepalive();
        let mut keepalive_timer = tokio::time::interval(self.keepalive_interval);
        keepalive_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_decoded: Option<Instant> = None;

        let result = loop {
            let wakeup = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break Ok(()),

                _ = keepalive_timer.tick(), if keepalive.is_some() => Wakeup::KeepaliveDue,

                received = self.socket.recv_from(&mut buffer) => match received {
                    Ok((len, peer)) => Wakeup::Datagram(len, peer),
                    Err(e) => {
                        warn!(feed = %source, error = %e, "Feed socket receive failed");
                        break Err(FeedError::Receive { feed: source.as_str(), source: e });
                    }
                },
            };

            let (len, peer) = match wakeup {
                Wakeup::Datagram(len, peer) => (len, peer),
                Wakeup::KeepaliveDue => {
                    let quiet = last_decoded.map_or(true, |at| at.elapsed() >= self.keepalive_interval);
                    if let (true, Some(bytes)) = (quiet, keepalive.as_deref()) {
                        self.send_keepalive(bytes, &mut stats).await;
                    }
                    continue;
                }
            };

            stats.datagrams += 1;
            let Some(decoded) = self.decoder.decode(&buffer[..len]) else {
                stats.dropped += 1;
                self.log_dropped(&buffer[..len], peer, stats.dropped);
                continue;
            };

            stats.decoded += 1;
            if stats.decoded == 1 {
                info!(feed = %source, peer = %peer, "Received first valid datagram");
            }

            let received_at = Instant::now();
            last_decoded = Some(received_at);
            self.liveness.record(source, received_at);

            let report = FeedReport {
                source,
                snapshot: decoded.snapshot,
                received_at,
            };
            match self.report_tx.try_send(report) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    stats.report_failures += 1;
                    if stats.report_failures <= REPORT_FAILURE_LOG_LIMIT {
                        warn!(feed = %source, "Arbiter channel full, dropping report");
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(feed = %source, "Arbiter gone, stopping listener");
                    break Ok(());
                }
            }

            if let Some(reply) = decoded.reply {
                if let Err(e) = self.socket.send_to(&reply, peer).await {
                    debug!(feed = %source, peer = %peer, error = %e, "Failed to send reply");
                }
            }
        };

        info!(
            feed = %source,
            datagrams = stats.datagrams,
            decoded = stats.decoded,
            dropped = stats.dropped,
            keepalives = stats.keepalives,
            "Feed listener stopped"
        );
        result
    }

    /// Send one keep-alive to the current peer, if any is known yet.
    async fn send_keepalive(&self, bytes: &[u8], stats: &mut ListenerStats) {
        let Some(peer) = *self.peer.borrow() else {
            return;
        };

        match self.socket.send_to(bytes, peer).await {
            Ok(_) => {
                stats.keepalives += 1;
                if stats.keepalives == 1 {
                    info!(feed = %self.source(), peer = %peer, "Sending keep-alives");
                }
            }
            Err(e) => debug!(feed = %self.source(), peer = %peer, error = %e, "Keep-alive send failed"),
        }
    }

    fn log_dropped(&self, data: &[u8], peer: SocketAddr, dropped: u64) {
        if dropped <= DROP_LOG_LIMIT {
            let preview_len = data.len().min(8);
            debug!(
                feed = %self.source(),
                peer = %peer,
                len = data.len(),
                head = ?&data[..preview_len],
                "Dropping undecodable datagram"
            );
        } else {
            trace!(feed = %self.source(), len = data.len(), "Dropping undecodable datagram");
        }
    }
}
