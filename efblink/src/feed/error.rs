//! Feed error types.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

use crate::protocol::CodecError;

/// Errors raised by feed sockets.
///
/// Decode failures are not errors; they are dropped inside the listener.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Failed to bind the UDP socket.
    #[error("Failed to bind {feed} socket on {addr}: {source}")]
    Bind {
        feed: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Failed to join the multicast group.
    #[error("Failed to join multicast group {group} for {feed}: {source}")]
    JoinMulticast {
        feed: &'static str,
        group: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },

    /// The socket failed while receiving; the listener stops.
    #[error("{feed} receive failed: {source}")]
    Receive {
        feed: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Sending a datagram failed.
    #[error("Failed to send to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A command payload could not be framed.
    #[error("Failed to encode command: {0}")]
    Encode(#[from] CodecError),
}
