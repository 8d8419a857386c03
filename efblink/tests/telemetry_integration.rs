//! Integration tests for the telemetry runtime.
//!
//! These tests drive real UDP sockets on the loopback interface:
//! - Each feed decodes and publishes through the arbiter
//! - The plugin feed acknowledges every accepted packet
//! - Failover to a lower-priority feed when the active feed goes stale
//! - Promotion back when a higher-priority feed returns
//! - Connected → Reconnecting → Disconnected when every feed stops
//! - The plugin feed is bootstrapped with keep-alive acks, to a configured
//!   or discovered address, against a fake plugin that streams only to
//!   whoever acked it last
//! - A listener whose socket fails stops alone; the arbiter fails over
//!
//! Run with: `cargo test --test telemetry_integration`

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use efblink::arbiter::{
    ArbiterConfig, ConnectionStatus, FeedLiveness, LinkState, PublishedSnapshot, SourceArbiter,
    TelemetryBroadcaster, TelemetryProvider,
};
use efblink::feed::{
    DiscoveryConfig, FeedError, FeedListener, FeedSocket, FeedSource, LegacyDecoder,
    ListenerConfig, PluginDecoder,
};
use efblink::protocol::efb::{self, PacketType, HEADER_LEN};
use efblink::protocol::gdl90::{ESCAPE_BYTE, ESCAPE_XOR, FLAG_BYTE, MSG_AHRS, MSG_OWNSHIP_REPORT};
use efblink::protocol::legacy::DATA_HEADER;
use efblink::runtime::{TelemetryRuntime, TelemetryRuntimeConfig};
use efblink::snapshot::AircraftSnapshot;

/// Upper bound for anything a test waits on.
const WAIT: Duration = Duration::from_secs(3);

/// Interval between datagrams of a simulated feed.
const SEND_INTERVAL: Duration = Duration::from_millis(20);

/// The plugin stops streaming when its last ack is this old.
const PLUGIN_WATCHDOG: Duration = Duration::from_secs(5);

/// Keep-alive period used by the bootstrap tests.
const FAST_KEEPALIVE: Duration = Duration::from_millis(50);

// ============================================================================
// Test Helpers
// ============================================================================

fn loopback() -> ListenerConfig {
    ListenerConfig::unicast(0).with_bind_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
}

/// Arbiter tuned for fast tests: 150 ms staleness, 400 ms reconnect window.
fn fast_arbiter() -> ArbiterConfig {
    ArbiterConfig {
        health_interval: Duration::from_millis(20),
        stale_threshold: Duration::from_millis(150),
        reconnect_window: Duration::from_millis(400),
        ..ArbiterConfig::default()
    }
}

async fn sender_socket() -> UdpSocket {
    UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind sender socket")
}

/// Repeatedly send `datagram` to `target` until `stop` is cancelled.
fn spawn_sender(target: SocketAddr, datagram: Vec<u8>, stop: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let socket = sender_socket().await;
        let mut interval = tokio::time::interval(SEND_INTERVAL);
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = interval.tick() => {
                    let _ = socket.send_to(&datagram, target).await;
                }
            }
        }
    })
}

async fn wait_for_status<F>(
    rx: &mut watch::Receiver<ConnectionStatus>,
    predicate: F,
) -> ConnectionStatus
where
    F: FnMut(&ConnectionStatus) -> bool,
{
    let status = timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for status")
        .expect("arbiter dropped");
    *status
}

async fn wait_for_snapshot<F>(
    rx: &mut watch::Receiver<Option<Arc<PublishedSnapshot>>>,
    mut predicate: F,
) -> Arc<PublishedSnapshot>
where
    F: FnMut(&PublishedSnapshot) -> bool,
{
    let published = timeout(
        WAIT,
        rx.wait_for(|published| matches!(published, Some(p) if predicate(p.as_ref()))),
    )
    .await
    .expect("timed out waiting for snapshot")
    .expect("arbiter dropped");
    published.clone().expect("predicate matched a published snapshot")
}

fn plugin_datagram(ias_kts: f32, sequence: u32) -> Vec<u8> {
    let snapshot = AircraftSnapshot {
        latitude: 47.4502,
        longitude: -122.3088,
        ias_kts,
        ..Default::default()
    };
    efb::encode(&snapshot, sequence)
}

/// Legacy `DATA` datagram with speed and position groups.
fn legacy_datagram(ias_kts: f32, lat: f32, lon: f32) -> Vec<u8> {
    let mut buf = DATA_HEADER.to_vec();
    for (index, values) in [
        (3u32, [ias_kts, 0.0, ias_kts, ias_kts, 0.0, 0.0, 0.0, 0.0]),
        (17u32, [lat, lon, 1500.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ] {
        buf.extend_from_slice(&index.to_le_bytes());
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

fn stuff_frame(message: &[u8]) -> Vec<u8> {
    let mut out = vec![FLAG_BYTE];
    for &byte in message {
        if byte == FLAG_BYTE || byte == ESCAPE_BYTE {
            out.push(ESCAPE_BYTE);
            out.push(byte ^ ESCAPE_XOR);
        } else {
            out.push(byte);
        }
    }
    // Frame check sequence is carried but not verified.
    out.extend_from_slice(&[0x00, 0x00]);
    out.push(FLAG_BYTE);
    out
}

/// GDL-90 datagram with an AHRS message followed by an Ownship Report.
fn gdl90_datagram(lat: f64, lon: f64, altitude_ft: f64, pitch_tenths: i16) -> Vec<u8> {
    let mut ahrs = vec![MSG_AHRS];
    ahrs.extend_from_slice(&pitch_tenths.to_be_bytes());
    ahrs.extend_from_slice(&0i16.to_be_bytes());
    ahrs.extend_from_slice(&900u16.to_be_bytes());
    ahrs.extend_from_slice(&[0u8; 3]);

    let mut ownship = vec![0u8; 28];
    ownship[0] = MSG_OWNSHIP_REPORT;
    let lat_raw = (lat * 8_388_608.0 / 180.0).round() as i32;
    let lon_raw = (lon * 16_777_216.0 / 360.0).round() as i32;
    ownship[5..8].copy_from_slice(&lat_raw.to_be_bytes()[1..]);
    ownship[8..11].copy_from_slice(&lon_raw.to_be_bytes()[1..]);
    let altitude_code = ((altitude_ft + 1000.0) / 25.0).round() as u16;
    ownship[11] = (altitude_code >> 4) as u8;
    ownship[12] = ((altitude_code & 0x0F) << 4) as u8;
    // 120 kt horizontal, vertical velocity unavailable
    ownship[14] = (120u16 >> 4) as u8;
    ownship[15] = (((120u16 & 0x0F) << 4) as u8) | 0x08;
    ownship[16] = 0x00;
    ownship[17] = 64; // 90 degrees

    let mut datagram = stuff_frame(&ahrs);
    datagram.extend(stuff_frame(&ownship));
    datagram
}

/// Stand-in for the simulator plugin.
///
/// Streams a snapshot every [`SEND_INTERVAL`], but only to the address the
/// last ack came from and only while that ack is younger than the watchdog.
struct FakePlugin {
    addr: SocketAddr,
    stop: CancellationToken,
    /// Resolves to the number of snapshots streamed.
    handle: JoinHandle<u32>,
}

impl FakePlugin {
    async fn spawn() -> Self {
        let socket = sender_socket().await;
        let addr = socket.local_addr().unwrap();
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            let mut tablet: Option<(SocketAddr, Instant)> = None;
            let mut interval = tokio::time::interval(SEND_INTERVAL);
            let mut buf = [0u8; 64];
            let mut streamed = 0u32;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    received = socket.recv_from(&mut buf) => {
                        let Ok((len, from)) = received else { continue };
                        let is_ack = matches!(
                            efb::parse_header(&buf[..len]),
                            Ok(header) if header.packet_type == PacketType::Ack
                        );
                        if is_ack {
                            tablet = Some((from, Instant::now()));
                        }
                    }
                    _ = interval.tick() => {
                        let Some((to, acked_at)) = tablet else { continue };
                        if acked_at.elapsed() < PLUGIN_WATCHDOG {
                            streamed += 1;
                            let _ = socket.send_to(&plugin_datagram(118.0, streamed), to).await;
                        }
                    }
                }
            }
            streamed
        });

        Self { addr, stop, handle }
    }

    async fn finish(self) -> u32 {
        self.stop.cancel();
        self.handle.await.unwrap()
    }
}

/// A UDP port nobody is bound to right now.
fn free_udp_port() -> u16 {
    std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| socket.local_addr())
        .expect("free port")
        .port()
}

/// Beacon discovery over loopback on a private port.
fn loopback_discovery(port: u16, plugin_port: u16, timeout: Duration) -> DiscoveryConfig {
    DiscoveryConfig {
        group: Ipv4Addr::LOCALHOST,
        port,
        interface: Ipv4Addr::UNSPECIFIED,
        timeout,
        plugin_port,
    }
}

/// Socket whose receives fail once `fail` is cancelled.
struct FailingSocket {
    inner: UdpSocket,
    fail: CancellationToken,
}

impl FeedSocket for FailingSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        tokio::select! {
            _ = self.fail.cancelled() => Err(io::Error::new(io::ErrorKind::ConnectionReset, "link down")),
            received = self.inner.recv_from(buf) => received,
        }
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, target).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

// ============================================================================
// Single-feed tests
// ============================================================================

#[tokio::test]
async fn test_plugin_feed_publishes_and_acks() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter()).with_plugin(loopback()),
    )
    .await;
    let target = runtime.local_addr(FeedSource::Plugin).expect("plugin bound");
    let telemetry = runtime.telemetry();
    let mut snapshot_rx = telemetry.subscribe_snapshots();

    let socket = sender_socket().await;
    socket
        .send_to(&plugin_datagram(112.0, 7), target)
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let (len, from) = timeout(WAIT, socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for ack")
        .unwrap();
    assert_eq!(from, target);
    assert_eq!(len, HEADER_LEN);
    let ack = efb::parse_header(&buf[..len]).unwrap();
    assert_eq!(ack.packet_type, PacketType::Ack);
    assert_eq!(ack.sequence, 7);
    assert_eq!(ack.payload_len, 0);

    let published = wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::Plugin).await;
    assert_eq!(published.snapshot.ias_kts, 112.0);
    assert_eq!(published.snapshot.latitude, 47.4502);

    let mut status_rx = telemetry.subscribe_status();
    let status = wait_for_status(&mut status_rx, |s| s.is_connected()).await;
    assert_eq!(status.source, FeedSource::Plugin);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_corrupt_plugin_packet_is_ignored() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter()).with_plugin(loopback()),
    )
    .await;
    let target = runtime.local_addr(FeedSource::Plugin).expect("plugin bound");
    let telemetry = runtime.telemetry();

    let mut corrupt = plugin_datagram(90.0, 1);
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;

    let socket = sender_socket().await;
    socket.send_to(&corrupt, target).await.unwrap();

    // No ack comes back for a rejected packet.
    let mut buf = [0u8; 64];
    let ack = timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await;
    assert!(ack.is_err(), "corrupt packet must not be acknowledged");
    assert!(telemetry.snapshot().is_none());
    assert!(runtime.liveness().last_packet(FeedSource::Plugin).is_none());

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_legacy_feed_end_to_end() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter()).with_legacy(loopback()),
    )
    .await;
    let target = runtime.local_addr(FeedSource::LegacyUdp).expect("legacy bound");
    let mut snapshot_rx = runtime.telemetry().subscribe_snapshots();

    let socket = sender_socket().await;
    socket
        .send_to(&legacy_datagram(95.0, -33.9461, 151.1772), target)
        .await
        .unwrap();

    let published =
        wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::LegacyUdp).await;
    assert_eq!(published.snapshot.ias_kts, 95.0);
    assert!((published.snapshot.latitude - -33.9461).abs() < 1e-4);
    assert!((published.snapshot.longitude - 151.1772).abs() < 1e-4);
    assert!((published.snapshot.elevation_m - 457.2).abs() < 0.1);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_gdl90_feed_end_to_end() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter()).with_gdl90(loopback()),
    )
    .await;
    let target = runtime.local_addr(FeedSource::Gdl90).expect("gdl90 bound");
    let mut snapshot_rx = runtime.telemetry().subscribe_snapshots();

    let socket = sender_socket().await;
    socket
        .send_to(&gdl90_datagram(51.4700, -0.4543, 3000.0, 25), target)
        .await
        .unwrap();

    let published = wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::Gdl90).await;
    let snapshot = &published.snapshot;
    assert!((snapshot.latitude - 51.47).abs() < 1e-3);
    assert!((snapshot.longitude - -0.4543).abs() < 1e-3);
    assert!((snapshot.elevation_m - 914.4).abs() < 0.5);
    assert!((snapshot.groundspeed_ms - 61.73).abs() < 0.05);
    assert!((snapshot.ground_track_deg - 90.0).abs() < 0.01);
    assert!((snapshot.pitch_deg - 2.5).abs() < 0.01);
    assert!((snapshot.mag_heading_deg - 90.0).abs() < 0.01);

    runtime.shutdown().await;
}

// ============================================================================
// Failover tests
// ============================================================================

#[tokio::test]
async fn test_failover_to_legacy_and_back() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback())
            .with_legacy(loopback()),
    )
    .await;
    let plugin_addr = runtime.local_addr(FeedSource::Plugin).expect("plugin bound");
    let legacy_addr = runtime.local_addr(FeedSource::LegacyUdp).expect("legacy bound");
    let telemetry = runtime.telemetry();
    let mut status_rx = telemetry.subscribe_status();
    let mut snapshot_rx = telemetry.subscribe_snapshots();

    let legacy_stop = CancellationToken::new();
    let legacy = spawn_sender(
        legacy_addr,
        legacy_datagram(80.0, 10.0, 20.0),
        legacy_stop.clone(),
    );
    let plugin_stop = CancellationToken::new();
    let plugin = spawn_sender(plugin_addr, plugin_datagram(120.0, 1), plugin_stop.clone());

    let status = wait_for_status(&mut status_rx, |s| s.source == FeedSource::Plugin).await;
    assert_eq!(status.state, LinkState::Connected);

    // Plugin goes quiet: the legacy feed takes over once it is stale.
    plugin_stop.cancel();
    plugin.await.unwrap();
    let status = wait_for_status(&mut status_rx, |s| s.source == FeedSource::LegacyUdp).await;
    assert_eq!(status.state, LinkState::Connected);

    let published =
        wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::LegacyUdp).await;
    assert_eq!(published.snapshot.ias_kts, 80.0);

    // Plugin returns and is promoted straight away.
    let plugin_stop = CancellationToken::new();
    let plugin = spawn_sender(plugin_addr, plugin_datagram(125.0, 2), plugin_stop.clone());
    wait_for_status(&mut status_rx, |s| s.source == FeedSource::Plugin).await;
    let published = wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::Plugin).await;
    assert_eq!(published.snapshot.ias_kts, 125.0);

    plugin_stop.cancel();
    legacy_stop.cancel();
    plugin.await.unwrap();
    legacy.await.unwrap();
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_lower_priority_snapshots_not_published_while_plugin_fresh() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback())
            .with_legacy(loopback()),
    )
    .await;
    let plugin_addr = runtime.local_addr(FeedSource::Plugin).expect("plugin bound");
    let legacy_addr = runtime.local_addr(FeedSource::LegacyUdp).expect("legacy bound");
    let telemetry = runtime.telemetry();
    let mut status_rx = telemetry.subscribe_status();

    let stop = CancellationToken::new();
    let plugin = spawn_sender(plugin_addr, plugin_datagram(100.0, 1), stop.clone());
    wait_for_status(&mut status_rx, |s| s.source == FeedSource::Plugin).await;

    let legacy = spawn_sender(legacy_addr, legacy_datagram(60.0, 1.0, 2.0), stop.clone());
    // Wait until legacy datagrams are arriving.
    timeout(WAIT, async {
        while runtime.liveness().last_packet(FeedSource::LegacyUdp).is_none() {
            tokio::time::sleep(SEND_INTERVAL).await;
        }
    })
    .await
    .expect("legacy datagrams never arrived");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let published = telemetry.snapshot().expect("plugin snapshot published");
    assert_eq!(published.source, FeedSource::Plugin);
    assert_eq!(published.snapshot.ias_kts, 100.0);
    assert_eq!(telemetry.active_source(), FeedSource::Plugin);

    stop.cancel();
    plugin.await.unwrap();
    legacy.await.unwrap();
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_link_loss_reconnecting_then_disconnected() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter()).with_legacy(loopback()),
    )
    .await;
    let target = runtime.local_addr(FeedSource::LegacyUdp).expect("legacy bound");
    let telemetry = runtime.telemetry();
    let mut status_rx = telemetry.subscribe_status();

    let socket = sender_socket().await;
    socket
        .send_to(&legacy_datagram(70.0, 0.5, 0.5), target)
        .await
        .unwrap();

    wait_for_status(&mut status_rx, |s| s.is_connected()).await;

    let status = wait_for_status(&mut status_rx, |s| s.state == LinkState::Reconnecting).await;
    assert_eq!(status.source, FeedSource::None);
    assert_eq!(status.latency_ms, 0);
    assert!(status.last_packet_age_ms.is_some());

    wait_for_status(&mut status_rx, |s| s.state == LinkState::Disconnected).await;

    // The last snapshot stays readable after the link is lost.
    let published = telemetry.snapshot().expect("snapshot retained");
    assert_eq!(published.snapshot.ias_kts, 70.0);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_failed_listener_socket_fails_over_alone() {
    let liveness = Arc::new(FeedLiveness::new());
    let (arbiter, report_tx) = SourceArbiter::new(fast_arbiter(), Arc::clone(&liveness));
    let telemetry = arbiter.telemetry();
    let mut status_rx = telemetry.subscribe_status();
    let shutdown = CancellationToken::new();
    let arbiter_handle = tokio::spawn(arbiter.run(shutdown.clone()));

    let fail = CancellationToken::new();
    let plugin_socket = FailingSocket {
        inner: sender_socket().await,
        fail: fail.clone(),
    };
    let plugin = FeedListener::from_socket(
        plugin_socket,
        PluginDecoder,
        Arc::clone(&liveness),
        report_tx.clone(),
    );
    let plugin_addr = plugin.local_addr().unwrap();
    let plugin_handle = plugin.start(shutdown.clone());

    let legacy = FeedListener::bind(loopback(), LegacyDecoder, Arc::clone(&liveness), report_tx)
        .await
        .unwrap();
    let legacy_addr = legacy.local_addr().unwrap();
    let legacy_handle = legacy.start(shutdown.clone());

    let stop = CancellationToken::new();
    let plugin_sender = spawn_sender(plugin_addr, plugin_datagram(130.0, 1), stop.clone());
    let legacy_sender = spawn_sender(legacy_addr, legacy_datagram(75.0, 5.0, 6.0), stop.clone());
    wait_for_status(&mut status_rx, |s| s.source == FeedSource::Plugin).await;

    // The plugin socket breaks: only its listener stops, with the error.
    fail.cancel();
    let result = timeout(WAIT, plugin_handle)
        .await
        .expect("failed listener should stop")
        .unwrap();
    assert!(matches!(result, Err(FeedError::Receive { feed: "plugin", .. })));

    let status = wait_for_status(&mut status_rx, |s| s.source == FeedSource::LegacyUdp).await;
    assert_eq!(status.state, LinkState::Connected);

    // Legacy keeps delivering; the plugin's timestamp stays frozen.
    let plugin_last = liveness.last_packet(FeedSource::Plugin);
    let legacy_before = liveness.last_packet(FeedSource::LegacyUdp).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(liveness.last_packet(FeedSource::Plugin), plugin_last);
    assert!(liveness.last_packet(FeedSource::LegacyUdp).unwrap() > legacy_before);
    assert!(!legacy_handle.is_finished());
    assert_eq!(telemetry.active_source(), FeedSource::LegacyUdp);

    stop.cancel();
    plugin_sender.await.unwrap();
    legacy_sender.await.unwrap();
    shutdown.cancel();
    assert!(legacy_handle.await.unwrap().is_ok());
    arbiter_handle.await.unwrap();
}

// ============================================================================
// Plugin bootstrap tests
// ============================================================================

#[tokio::test]
async fn test_plugin_streams_after_keepalive_to_configured_peer() {
    let plugin = FakePlugin::spawn().await;

    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter()).with_plugin(
            loopback()
                .with_peer(plugin.addr)
                .with_keepalive_interval(FAST_KEEPALIVE),
        ),
    )
    .await;
    assert_eq!(runtime.plugin_peer(), Some(plugin.addr));
    let telemetry = runtime.telemetry();
    let mut snapshot_rx = telemetry.subscribe_snapshots();
    let mut status_rx = telemetry.subscribe_status();

    let published = wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::Plugin).await;
    assert_eq!(published.snapshot.ias_kts, 118.0);
    wait_for_status(&mut status_rx, |s| {
        s.source == FeedSource::Plugin && s.state == LinkState::Connected
    })
    .await;

    runtime.shutdown().await;
    assert!(plugin.finish().await > 0);
}

#[tokio::test]
async fn test_plugin_without_peer_stays_silent() {
    let plugin = FakePlugin::spawn().await;

    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback().with_keepalive_interval(FAST_KEEPALIVE)),
    )
    .await;
    assert!(runtime.plugin_peer().is_none());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(runtime.telemetry().snapshot().is_none());

    runtime.shutdown().await;
    assert_eq!(plugin.finish().await, 0);
}

#[tokio::test]
async fn test_plugin_located_by_beacon_then_streams() {
    let plugin = FakePlugin::spawn().await;
    let beacon_port = free_udp_port();

    // Short timeout so discovery goes round at least once before the beacon.
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback().with_keepalive_interval(FAST_KEEPALIVE))
            .with_discovery(loopback_discovery(
                beacon_port,
                plugin.addr.port(),
                Duration::from_millis(100),
            )),
    )
    .await;
    let mut snapshot_rx = runtime.telemetry().subscribe_snapshots();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(runtime.plugin_peer().is_none());

    let stop = CancellationToken::new();
    let beacon = spawn_sender(
        SocketAddr::from((Ipv4Addr::LOCALHOST, beacon_port)),
        b"BECN\0Test Sim\0".to_vec(),
        stop.clone(),
    );

    let published = wait_for_snapshot(&mut snapshot_rx, |p| p.source == FeedSource::Plugin).await;
    assert_eq!(published.snapshot.ias_kts, 118.0);
    assert_eq!(runtime.plugin_peer(), Some(plugin.addr));

    stop.cancel();
    beacon.await.unwrap();
    runtime.shutdown().await;
    assert!(plugin.finish().await > 0);
}

// ============================================================================
// Lifecycle tests
// ============================================================================

#[tokio::test]
async fn test_shutdown_cancels_pending_discovery() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback())
            .with_discovery(loopback_discovery(
                free_udp_port(),
                49100,
                Duration::from_secs(60),
            )),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(runtime.plugin_peer().is_none());

    timeout(Duration::from_secs(1), runtime.shutdown())
        .await
        .expect("shutdown must not wait for the discovery timeout");
}

#[tokio::test]
async fn test_port_conflict_skips_feed() {
    let occupied = sender_socket().await;
    let taken = occupied.local_addr().unwrap();

    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback().with_bind_addr(taken))
            .with_legacy(loopback()),
    )
    .await;

    assert_eq!(runtime.active_feeds(), vec![FeedSource::LegacyUdp]);
    assert!(runtime.local_addr(FeedSource::Plugin).is_none());
    assert!(runtime.is_running());

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_is_prompt_with_traffic() {
    let runtime = TelemetryRuntime::start(
        TelemetryRuntimeConfig::without_feeds(fast_arbiter())
            .with_plugin(loopback())
            .with_gdl90(loopback())
            .with_legacy(loopback()),
    )
    .await;
    assert_eq!(
        runtime.active_feeds(),
        vec![FeedSource::Plugin, FeedSource::Gdl90, FeedSource::LegacyUdp]
    );

    let stop = CancellationToken::new();
    let sender = spawn_sender(
        runtime.local_addr(FeedSource::Gdl90).expect("gdl90 bound"),
        gdl90_datagram(40.0, -75.0, 1000.0, 0),
        stop.clone(),
    );
    tokio::time::sleep(Duration::from_millis(60)).await;

    let telemetry = runtime.telemetry();
    let token = runtime.shutdown_token();
    timeout(Duration::from_secs(1), runtime.shutdown())
        .await
        .expect("shutdown should finish promptly");
    assert!(token.is_cancelled());

    // Handles outlive the runtime and keep the last values.
    assert_eq!(
        telemetry.snapshot().map(|p| p.source),
        Some(FeedSource::Gdl90)
    );

    stop.cancel();
    sender.await.unwrap();
}
