//! GDL-90 broadcast decoder.
//!
//! A datagram holds one or more HDLC-style frames delimited by `0x7E`.
//! Inside a frame, `0x7D` escapes the next byte, which is XORed with `0x20`.
//! Two messages are interpreted:
//!
//! - `0x0A` Ownship Report: position, pressure altitude, velocity, track
//! - `0x65` AHRS extension: pitch, roll, heading
//!
//! Anything else, and any frame too short for its message ID, is skipped
//! without affecting the other frames in the datagram. The trailing frame
//! check sequence is not verified.

use tracing::trace;

use super::{FEET_TO_METERS, KNOTS_TO_MS};
use crate::snapshot::AircraftSnapshot;

/// Frame delimiter.
pub const FLAG_BYTE: u8 = 0x7E;

/// Escape byte.
pub const ESCAPE_BYTE: u8 = 0x7D;

/// XOR mask applied to escaped bytes.
pub const ESCAPE_XOR: u8 = 0x20;

/// Default multicast group of the GDL-90 feed.
pub const GDL90_MULTICAST_GROUP: [u8; 4] = [239, 253, 1, 1];

/// Default UDP port of the GDL-90 feed.
pub const GDL90_PORT: u16 = 4000;

/// Ownship Report message ID.
pub const MSG_OWNSHIP_REPORT: u8 = 0x0A;

/// AHRS extension message ID.
pub const MSG_AHRS: u8 = 0x65;

/// Minimum unstuffed length of an Ownship Report.
const OWNSHIP_MIN_LEN: usize = 29;

/// Minimum unstuffed length of an AHRS message.
const AHRS_MIN_LEN: usize = 8;

/// Latitude resolution in degrees per LSB (180 / 2^23).
const LAT_LSB_DEG: f64 = 180.0 / 8_388_608.0;

/// Longitude resolution in degrees per LSB (360 / 2^24).
const LON_LSB_DEG: f64 = 360.0 / 16_777_216.0;

/// Pressure altitude resolution and offset.
const ALTITUDE_LSB_FT: f64 = 25.0;
const ALTITUDE_OFFSET_FT: f64 = -1000.0;

/// Altitude code meaning "unavailable".
const ALTITUDE_UNAVAILABLE: u16 = 0xFFF;

/// Horizontal velocity code meaning "unavailable".
const HORIZONTAL_VELOCITY_UNAVAILABLE: u16 = 0xFFF;

/// Vertical velocity code meaning "unavailable".
const VERTICAL_VELOCITY_UNAVAILABLE: u16 = 0x800;

/// Vertical velocity resolution.
const VERTICAL_VELOCITY_LSB_FPM: f32 = 64.0;

/// Track resolution in degrees per LSB (360 / 256).
const TRACK_LSB_DEG: f32 = 360.0 / 256.0;

/// Attitude resolution in degrees per LSB.
const AHRS_LSB_DEG: f32 = 0.1;

/// Decoded Ownship Report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnshipReport {
    pub latitude: f64,
    pub longitude: f64,
    /// Pressure altitude in feet; 0 when the report marks it unavailable.
    pub altitude_ft: f64,
    /// Horizontal velocity in knots; 0 when unavailable.
    pub horizontal_velocity_kt: f32,
    /// Vertical velocity in feet per minute; 0 when unavailable.
    pub vertical_velocity_fpm: f32,
    /// Track or heading in degrees.
    pub track_deg: f32,
}

/// Decoded AHRS extension message.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AhrsExtension {
    pub pitch_deg: f32,
    pub roll_deg: f32,
    pub heading_deg: f32,
}

/// A GDL-90 message this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gdl90Message {
    OwnshipReport(OwnshipReport),
    AhrsExtension(AhrsExtension),
}

/// Split a datagram into unstuffed frames.
///
/// Only content enclosed by two flag bytes counts as a frame. Frames shorter
/// than two bytes, or ending in a dangling escape, are dropped.
pub fn extract_frames(data: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &byte) in data.iter().enumerate() {
        if byte != FLAG_BYTE {
            continue;
        }
        if let Some(begin) = start {
            let content = &data[begin..i];
            if content.len() >= 2 {
                match unstuff(content) {
                    Some(frame) if frame.len() >= 2 => frames.push(frame),
                    Some(_) => {}
                    None => trace!(len = content.len(), "Dropping frame with dangling escape"),
                }
            }
        }
        start = Some(i + 1);
    }

    frames
}

/// Remove HDLC byte stuffing.
///
/// Returns `None` if the content ends with an escape byte.
pub fn unstuff(content: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(content.len());
    let mut bytes = content.iter();

    while let Some(&byte) = bytes.next() {
        if byte == ESCAPE_BYTE {
            let &escaped = bytes.next()?;
            out.push(escaped ^ ESCAPE_XOR);
        } else {
            out.push(byte);
        }
    }

    Some(out)
}

/// Parse a single unstuffed frame.
pub fn parse_message(frame: &[u8]) -> Option<Gdl90Message> {
    match *frame.first()? {
        MSG_OWNSHIP_REPORT if frame.len() >= OWNSHIP_MIN_LEN => {
            Some(Gdl90Message::OwnshipReport(parse_ownship(frame)))
        }
        MSG_AHRS if frame.len() >= AHRS_MIN_LEN => {
            Some(Gdl90Message::AhrsExtension(parse_ahrs(frame)))
        }
        id => {
            trace!(id, len = frame.len(), "Ignoring GDL-90 frame");
            None
        }
    }
}

fn parse_ownship(frame: &[u8]) -> OwnshipReport {
    let lat_raw = signed_24(frame[5], frame[6], frame[7]);
    let lon_raw = signed_24(frame[8], frame[9], frame[10]);

    let altitude_code = ((frame[11] as u16) << 4) | ((frame[12] as u16) >> 4);
    let altitude_ft = if altitude_code == ALTITUDE_UNAVAILABLE {
        0.0
    } else {
        altitude_code as f64 * ALTITUDE_LSB_FT + ALTITUDE_OFFSET_FT
    };

    let horizontal_code = ((frame[14] as u16) << 4) | ((frame[15] as u16) >> 4);
    let horizontal_velocity_kt = if horizontal_code == HORIZONTAL_VELOCITY_UNAVAILABLE {
        0.0
    } else {
        horizontal_code as f32
    };

    let vertical_code = (((frame[15] & 0x0F) as u16) << 8) | frame[16] as u16;
    let vertical_velocity_fpm = if vertical_code == VERTICAL_VELOCITY_UNAVAILABLE {
        0.0
    } else {
        // Sign-extend the 12-bit value.
        let signed = ((vertical_code << 4) as i16) >> 4;
        signed as f32 * VERTICAL_VELOCITY_LSB_FPM
    };

    OwnshipReport {
        latitude: lat_raw as f64 * LAT_LSB_DEG,
        longitude: lon_raw as f64 * LON_LSB_DEG,
        altitude_ft,
        horizontal_velocity_kt,
        vertical_velocity_fpm,
        track_deg: frame[17] as f32 * TRACK_LSB_DEG,
    }
}

fn parse_ahrs(frame: &[u8]) -> AhrsExtension {
    let pitch = i16::from_be_bytes([frame[1], frame[2]]);
    let roll = i16::from_be_bytes([frame[3], frame[4]]);
    let heading = u16::from_be_bytes([frame[5], frame[6]]);

    AhrsExtension {
        pitch_deg: pitch as f32 * AHRS_LSB_DEG,
        roll_deg: roll as f32 * AHRS_LSB_DEG,
        heading_deg: heading as f32 * AHRS_LSB_DEG,
    }
}

fn signed_24(b0: u8, b1: u8, b2: u8) -> i32 {
    i32::from_be_bytes([b0, b1, b2, 0]) >> 8
}

/// Stateful GDL-90 decoder for one listener.
///
/// Remembers the most recent AHRS attitude so that an Ownship Report that
/// arrives without one still carries the last known pitch, roll and heading.
#[derive(Debug, Default)]
pub struct Gdl90Decoder {
    attitude: AhrsExtension,
}

impl Gdl90Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last attitude seen by this decoder.
    pub fn attitude(&self) -> AhrsExtension {
        self.attitude
    }

    /// Decode every frame in a datagram.
    ///
    /// Returns a snapshot only if the datagram contained an Ownship Report.
    /// When several reports are present, the last one wins.
    pub fn decode_datagram(&mut self, data: &[u8]) -> Option<AircraftSnapshot> {
        let mut ownship = None;

        for frame in extract_frames(data) {
            match parse_message(&frame) {
                Some(Gdl90Message::OwnshipReport(report)) => ownship = Some(report),
                Some(Gdl90Message::AhrsExtension(ahrs)) => self.attitude = ahrs,
                None => {}
            }
        }

        ownship.map(|report| self.to_snapshot(&report))
    }

    fn to_snapshot(&self, report: &OwnshipReport) -> AircraftSnapshot {
        AircraftSnapshot {
            latitude: report.latitude,
            longitude: report.longitude,
            elevation_m: report.altitude_ft * FEET_TO_METERS,
            groundspeed_ms: report.horizontal_velocity_kt * KNOTS_TO_MS,
            ground_track_deg: report.track_deg,
            vvi_fpm: report.vertical_velocity_fpm,
            pitch_deg: self.attitude.pitch_deg,
            roll_deg: self.attitude.roll_deg,
            mag_heading_deg: self.attitude.heading_deg,
            ..Default::default()
        }
    }
}
