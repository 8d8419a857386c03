//! Wire-format codecs for the three telemetry feeds.
//!
//! - [`efb`] - Framed, checksummed primary feed from the simulator plugin
//! - [`gdl90`] - HDLC-framed GDL-90 ownship/AHRS broadcast
//! - [`legacy`] - Simulator-native `DATA` group broadcast
//!
//! All decoders are pure functions of their input (the GDL-90 decoder keeps
//! the last attitude between datagrams). Malformed input is never an error
//! the caller has to handle: it simply yields `None`.

pub mod crc;
pub mod efb;
pub mod gdl90;
pub mod legacy;

pub use crc::crc32;
pub use efb::{build_ack, CodecError, PacketHeader, PacketType, SimDataPacket};
pub use gdl90::{AhrsExtension, Gdl90Decoder, Gdl90Message, OwnshipReport};

/// Conversion factor: knots to metres per second.
pub const KNOTS_TO_MS: f32 = 0.514444;

/// Conversion factor: feet to metres.
pub const FEET_TO_METERS: f64 = 0.3048;
