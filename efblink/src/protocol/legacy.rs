//! Legacy simulator `DATA` broadcast decoder.
//!
//! Format: the 5-byte header `DATA\0` followed by 36-byte groups, each a
//! little-endian `u32` group index and eight little-endian `f32` values.
//! Only three groups are interpreted; every other group is skipped whole so
//! that offsets stay aligned.

use tracing::trace;

use super::{FEET_TO_METERS, KNOTS_TO_MS};
use crate::snapshot::AircraftSnapshot;

/// Literal datagram header.
pub const DATA_HEADER: &[u8; 5] = b"DATA\0";

/// Size of each group (4-byte index + 8 floats).
pub const GROUP_SIZE: usize = 36;

/// Default UDP port of the legacy broadcast.
pub const LEGACY_PORT: u16 = 49000;

/// Group index for speeds: [IAS kt, _, TAS kt, GS kt, ...].
const GROUP_SPEEDS: u32 = 3;

/// Group index for attitude: [pitch, roll, true heading, magnetic heading, ...].
const GROUP_ATTITUDE: u32 = 6;

/// Group index for position: [lat, lon, alt MSL ft, ...].
const GROUP_POSITION: u32 = 17;

/// Decode a legacy `DATA` datagram.
///
/// Groups that are absent leave their fields at zero. Returns `None` for a
/// bad header or when the datagram carries no complete group.
pub fn decode(data: &[u8]) -> Option<AircraftSnapshot> {
    let body = data.strip_prefix(DATA_HEADER.as_slice())?;
    if body.len() < GROUP_SIZE {
        trace!(len = data.len(), "Legacy datagram carries no complete group");
        return None;
    }

    let mut snapshot = AircraftSnapshot::default();

    for chunk in body.chunks_exact(GROUP_SIZE) {
        let index = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let values: [f32; 8] = std::array::from_fn(|i| {
            let offset = 4 + i * 4;
            f32::from_le_bytes([
                chunk[offset],
                chunk[offset + 1],
                chunk[offset + 2],
                chunk[offset + 3],
            ])
        });

        match index {
            GROUP_SPEEDS => {
                snapshot.ias_kts = values[0];
                snapshot.tas_kts = values[2];
                snapshot.groundspeed_ms = values[3] * KNOTS_TO_MS;
            }
            GROUP_ATTITUDE => {
                snapshot.pitch_deg = values[0];
                snapshot.roll_deg = values[1];
                snapshot.mag_heading_deg = values[3];
            }
            GROUP_POSITION => {
                snapshot.latitude = values[0] as f64;
                snapshot.longitude = values[1] as f64;
                snapshot.elevation_m = values[2] as f64 * FEET_TO_METERS;
            }
            _ => {}
        }
    }

    Some(snapshot)
}
