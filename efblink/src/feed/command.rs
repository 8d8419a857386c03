//! Outbound command channel to the simulator plugin.
//!
//! Command content is opaque here; this module only frames payloads with
//! the primary-feed header and hands them to a [`CommandSink`]. Sends are
//! fire-and-forget: a failed send is reported to the caller and never
//! retried.

use std::future::Future;
use std::net::{Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::net::UdpSocket;
use tracing::debug;

use super::error::FeedError;
use crate::protocol::efb::{encode_packet, PacketType};

/// Capability to transmit an opaque datagram to a fixed peer.
pub trait CommandSink: Send + Sync {
    fn send(&self, datagram: &[u8]) -> impl Future<Output = Result<(), FeedError>> + Send;
}

/// UDP sink bound to an ephemeral local port.
pub struct UdpCommandSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpCommandSink {
    /// Bind an ephemeral socket that sends to `target`.
    pub async fn bind(target: SocketAddr) -> Result<Self, FeedError> {
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| FeedError::Bind {
                feed: "command",
                addr: local,
                source,
            })?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl CommandSink for UdpCommandSink {
    async fn send(&self, datagram: &[u8]) -> Result<(), FeedError> {
        self.socket
            .send_to(datagram, self.target)
            .await
            .map(|_| ())
            .map_err(|source| FeedError::Send {
                addr: self.target,
                source,
            })
    }
}

/// Frames command and reload requests for the plugin.
pub struct CommandChannel<S: CommandSink> {
    sink: S,
    next_sequence: AtomicU32,
}

impl<S: CommandSink> CommandChannel<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            next_sequence: AtomicU32::new(0),
        }
    }

    /// Send an opaque command payload. Returns the sequence number used.
    pub async fn send_command(&self, payload: &[u8]) -> Result<u32, FeedError> {
        self.send_packet(PacketType::Command, payload).await
    }

    /// Ask the plugin to reload its configuration.
    pub async fn send_reload(&self) -> Result<u32, FeedError> {
        self.send_packet(PacketType::Reload, &[]).await
    }

    async fn send_packet(&self, packet_type: PacketType, payload: &[u8]) -> Result<u32, FeedError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let datagram = encode_packet(packet_type, sequence, payload)?;
        self.sink.send(&datagram).await?;
        debug!(?packet_type, sequence, len = payload.len(), "Command sent");
        Ok(sequence)
    }
}
