//! Listener socket configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::protocol::efb::PLUGIN_PORT;
use crate::protocol::gdl90::{GDL90_MULTICAST_GROUP, GDL90_PORT};
use crate::protocol::legacy::LEGACY_PORT;

/// Largest datagram a listener accepts. Anything longer is truncated by the
/// socket and will fail to decode.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// How often a quiet listener re-sends its keep-alive to the peer.
///
/// The plugin stops streaming when it hears nothing for 5 s.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Socket configuration for one feed listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Local address to bind.
    pub bind_addr: SocketAddr,

    /// Multicast group to join after binding, if any.
    pub multicast_group: Option<Ipv4Addr>,

    /// Local interface used for the multicast membership.
    pub multicast_interface: Ipv4Addr,

    /// Enable `SO_BROADCAST` on the socket.
    pub broadcast: bool,

    /// Known sender to bootstrap with keep-alives (plugin feed only).
    pub peer: Option<SocketAddr>,

    /// Keep-alive period while no datagram is arriving.
    pub keepalive_interval: Duration,
}

impl ListenerConfig {
    /// Plain unicast listener on `port`.
    pub fn unicast(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)),
            multicast_group: None,
            multicast_interface: Ipv4Addr::UNSPECIFIED,
            broadcast: false,
            peer: None,
            keepalive_interval: KEEPALIVE_INTERVAL,
        }
    }

    /// Primary plugin feed (unicast, port 49100).
    pub fn plugin() -> Self {
        Self::unicast(PLUGIN_PORT)
    }

    /// GDL-90 feed (multicast 239.253.1.1, port 4000).
    pub fn gdl90() -> Self {
        Self {
            multicast_group: Some(Ipv4Addr::from(GDL90_MULTICAST_GROUP)),
            ..Self::unicast(GDL90_PORT)
        }
    }

    /// Legacy feed (broadcast, port 49000).
    pub fn legacy() -> Self {
        Self {
            broadcast: true,
            ..Self::unicast(LEGACY_PORT)
        }
    }

    /// Override the bound port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Override the bound address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Send keep-alives to `peer` until it starts streaming.
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }
}
