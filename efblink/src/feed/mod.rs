//! Telemetry feeds.
//!
//! Each feed is a UDP socket plus a decoder. Listeners decode datagrams and
//! forward [`FeedReport`]s to the arbiter; they never talk to each other.
//!
//! | Feed    | Transport                  | Decoder            |
//! |---------|----------------------------|--------------------|
//! | plugin  | unicast :49100             | [`PluginDecoder`]  |
//! | gdl90   | multicast 239.253.1.1:4000 | `Gdl90Decoder`     |
//! | legacy  | broadcast :49000           | [`LegacyDecoder`]  |
//!
//! Discovery and the outbound command channel live here too since they
//! share the plugin's addressing and framing.

mod command;
mod config;
mod decoder;
mod discovery;
mod error;
mod listener;
mod socket;
mod source;

pub use command::{CommandChannel, CommandSink, UdpCommandSink};
pub use config::{ListenerConfig, KEEPALIVE_INTERVAL, MAX_DATAGRAM_SIZE};
pub use decoder::{Decoded, FeedDecoder, LegacyDecoder, PluginDecoder};
pub use discovery::{
    discover, parse_beacon, DiscoveryConfig, SimulatorBeacon, BEACON_HEADER,
    DEFAULT_BEACON_GROUP, DEFAULT_BEACON_PORT, DEFAULT_DISCOVERY_TIMEOUT,
};
pub use error::FeedError;
pub use listener::FeedListener;
pub use socket::FeedSocket;
pub use source::{FeedReport, FeedSource};
