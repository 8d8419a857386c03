//! Datagram socket seam for feed listeners.
//!
//! Listeners run against [`FeedSocket`] rather than a concrete socket type.
//! Production code uses `tokio::net::UdpSocket`; tests can wrap it to inject
//! receive failures.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// Async datagram socket used by a [`FeedListener`](super::FeedListener).
pub trait FeedSocket: Send + Sync + 'static {
    /// Receive one datagram.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Send one datagram to `target`.
    fn send_to(&self, buf: &[u8], target: SocketAddr)
        -> impl Future<Output = io::Result<usize>> + Send;

    /// Locally bound address.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl FeedSocket for UdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}
