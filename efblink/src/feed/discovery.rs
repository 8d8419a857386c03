//! Simulator discovery via multicast beacon.
//!
//! The plugin announces itself on 239.255.1.1:49707 with `BECN\0` followed
//! by a NUL-terminated device name. The sender's IP, combined with the
//! plugin port, is where the primary feed and commands go.
//!
//! Discovery is independent of the feed listeners: it has its own socket,
//! a bounded wait, and returns early when the shutdown token fires.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::Serialize;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::MAX_DATAGRAM_SIZE;
use super::error::FeedError;
use crate::protocol::efb::PLUGIN_PORT;

/// Beacon header.
pub const BEACON_HEADER: &[u8; 5] = b"BECN\0";

/// Default multicast group for beacons.
pub const DEFAULT_BEACON_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 1, 1);

/// Default beacon port.
pub const DEFAULT_BEACON_PORT: u16 = 49707;

/// Default discovery timeout.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub group: Ipv4Addr,
    pub port: u16,
    pub interface: Ipv4Addr,
    pub timeout: Duration,
    /// Port the discovered plugin listens on for commands.
    pub plugin_port: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_BEACON_GROUP,
            port: DEFAULT_BEACON_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            plugin_port: PLUGIN_PORT,
        }
    }
}

/// A simulator instance found by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatorBeacon {
    /// Device name from the beacon.
    pub name: String,
    /// Address the beacon came from.
    pub address: SocketAddr,
    /// Plugin endpoint derived from the beacon's IP.
    pub plugin_addr: SocketAddr,
}

/// Extract the device name from a beacon datagram.
///
/// Requires the header and a NUL terminator; the name must be non-empty.
pub fn parse_beacon(data: &[u8]) -> Option<String> {
    let body = data.strip_prefix(BEACON_HEADER.as_slice())?;
    let end = body.iter().position(|&b| b == 0)?;
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&body[..end]).into_owned())
}

/// Wait for one beacon.
///
/// Returns `Ok(None)` on timeout or cancellation.
pub async fn discover(
    config: &DiscoveryConfig,
    shutdown: &CancellationToken,
) -> Result<Option<SimulatorBeacon>, FeedError> {
    let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port));
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|source| FeedError::Bind {
            feed: "discovery",
            addr: bind_addr,
            source,
        })?;
    if config.group.is_multicast() {
        socket
            .join_multicast_v4(config.group, config.interface)
            .map_err(|source| FeedError::JoinMulticast {
                feed: "discovery",
                group: config.group,
                source,
            })?;
    }

    info!(
        group = %config.group,
        port = config.port,
        timeout_secs = config.timeout.as_secs_f32(),
        "Listening for simulator beacon"
    );

    let deadline = tokio::time::sleep(config.timeout);
    tokio::pin!(deadline);
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("Discovery cancelled");
                return Ok(None);
            }

            _ = &mut deadline => {
                info!("No simulator beacon received");
                return Ok(None);
            }

            received = socket.recv_from(&mut buffer) => {
                let (len, address) = received.map_err(|source| FeedError::Receive {
                    feed: "discovery",
                    source,
                })?;
                let Some(name) = parse_beacon(&buffer[..len]) else {
                    debug!(peer = %address, len, "Ignoring non-beacon datagram");
                    continue;
                };
                let plugin_addr = SocketAddr::new(address.ip(), config.plugin_port);
                info!(name = %name, address = %address, "Simulator discovered");
                return Ok(Some(SimulatorBeacon {
                    name,
                    address,
                    plugin_addr,
                }));
            }
        }
    }
}
