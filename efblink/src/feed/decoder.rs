//! Per-feed decoder adapters.
//!
//! A [`FeedDecoder`] turns one datagram into at most one snapshot and an
//! optional reply for the sender. The listener loop is generic over this
//! trait, so all three feeds share the same socket handling.

use super::source::FeedSource;
use crate::protocol::{efb, gdl90, legacy};
use crate::snapshot::AircraftSnapshot;

/// Result of decoding one datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub snapshot: AircraftSnapshot,
    /// Bytes to send back to the datagram's sender.
    pub reply: Option<Vec<u8>>,
}

impl Decoded {
    fn snapshot_only(snapshot: AircraftSnapshot) -> Self {
        Self {
            snapshot,
            reply: None,
        }
    }
}

/// Decoder for one feed's wire format.
pub trait FeedDecoder: Send + Sync + 'static {
    /// Feed this decoder serves.
    fn source(&self) -> FeedSource;

    /// Decode a datagram. `None` means the datagram is dropped.
    fn decode(&mut self, datagram: &[u8]) -> Option<Decoded>;

    /// Datagram sent to a known peer while the feed is quiet.
    ///
    /// Feeds that stream unprompted have none.
    fn keepalive(&self) -> Option<Vec<u8>> {
        None
    }
}

/// Primary plugin feed. Every accepted packet is acknowledged.
///
/// The plugin only streams to the address its last ack came from, so a
/// quiet listener keeps sending sequence-0 acks to bootstrap the stream.
#[derive(Debug, Default)]
pub struct PluginDecoder;

impl FeedDecoder for PluginDecoder {
    fn source(&self) -> FeedSource {
        FeedSource::Plugin
    }

    fn decode(&mut self, datagram: &[u8]) -> Option<Decoded> {
        let packet = efb::decode(datagram)?;
        Some(Decoded {
            snapshot: packet.snapshot,
            reply: Some(efb::build_ack(packet.sequence).to_vec()),
        })
    }

    fn keepalive(&self) -> Option<Vec<u8>> {
        Some(efb::build_ack(0).to_vec())
    }
}

impl FeedDecoder for gdl90::Gdl90Decoder {
    fn source(&self) -> FeedSource {
        FeedSource::Gdl90
    }

    fn decode(&mut self, datagram: &[u8]) -> Option<Decoded> {
        self.decode_datagram(datagram).map(Decoded::snapshot_only)
    }
}

/// Legacy `DATA` feed.
#[derive(Debug, Default)]
pub struct LegacyDecoder;

impl FeedDecoder for LegacyDecoder {
    fn source(&self) -> FeedSource {
        FeedSource::LegacyUdp
    }

    fn decode(&mut self, datagram: &[u8]) -> Option<Decoded> {
        legacy::decode(datagram).map(Decoded::snapshot_only)
    }
}
