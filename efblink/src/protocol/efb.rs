//! Primary feed codec (simulator plugin protocol).
//!
//! Every datagram starts with a 17-byte little-endian header:
//!
//! ```text
//! [0..4]   magic        : u32 = 0xEFB12345
//! [4..6]   version      : u16 = 1
//! [6]      packet type  : u8  (SimData = 0x01, Command = 0x02, Ack = 0x03, Reload = 0x04)
//! [7..9]   payload len  : u16
//! [9..13]  sequence     : u32
//! [13..17] crc32        : u32 (CRC-32 of the payload only)
//! ```
//!
//! SimData payloads are the 464-byte [`AircraftSnapshot`] layout. Acks are
//! header-only and keep the plugin's watchdog from tearing the link down.

use thiserror::Error;
use tracing::trace;

use super::crc::crc32;
use crate::snapshot::{AircraftSnapshot, EGT_CHANNELS, FUEL_TANKS, MAX_TRAFFIC};

/// Frame magic.
pub const MAGIC: u32 = 0xEFB1_2345;

/// Protocol version understood by this codec.
pub const VERSION: u16 = 1;

/// Size of the fixed header.
pub const HEADER_LEN: usize = 17;

/// Size of the SimData payload.
pub const SNAPSHOT_PAYLOAD_LEN: usize = 464;

/// Default UDP port the plugin sends SimData to.
pub const PLUGIN_PORT: u16 = 49100;

/// Packet types carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Full aircraft snapshot.
    SimData = 0x01,
    /// Opaque command payload for the simulator.
    Command = 0x02,
    /// Header-only keep-alive reply.
    Ack = 0x03,
    /// Request the plugin to reload its configuration.
    Reload = 0x04,
}

impl PacketType {
    /// Decode a packet type byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(PacketType::SimData),
            0x02 => Some(PacketType::Command),
            0x03 => Some(PacketType::Ack),
            0x04 => Some(PacketType::Reload),
            _ => None,
        }
    }
}

/// Reasons a datagram is rejected.
///
/// These never reach feed consumers; the listener logs them at trace level
/// and drops the datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("datagram too short: {len} bytes")]
    TooShort { len: usize },

    #[error("bad magic 0x{0:08X}")]
    BadMagic(u32),

    #[error("unsupported version {0}")]
    BadVersion(u16),

    #[error("unknown packet type 0x{0:02X}")]
    UnknownPacketType(u8),

    #[error("unexpected packet type {0:?}")]
    UnexpectedPacketType(PacketType),

    #[error("payload length {declared} exceeds {available} available bytes")]
    Truncated { declared: usize, available: usize },

    #[error("checksum mismatch: header 0x{expected:08X}, computed 0x{actual:08X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("payload of {len} bytes is shorter than the snapshot layout")]
    PayloadTooShort { len: usize },

    #[error("payload of {len} bytes does not fit in a frame")]
    PayloadTooLarge { len: usize },
}

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub packet_type: PacketType,
    pub payload_len: u16,
    pub sequence: u32,
    pub checksum: u32,
}

/// A decoded SimData packet.
#[derive(Debug, Clone, PartialEq)]
pub struct SimDataPacket {
    /// Sender's sequence number, echoed back in the ack.
    pub sequence: u32,
    pub snapshot: AircraftSnapshot,
}

/// Parse and validate the fixed header.
pub fn parse_header(data: &[u8]) -> Result<PacketHeader, CodecError> {
    let mut reader = Reader::new(data);
    let too_short = CodecError::TooShort { len: data.len() };
    if data.len() < HEADER_LEN {
        return Err(too_short);
    }

    let magic = reader.u32().ok_or_else(|| too_short.clone())?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }
    let version = reader.u16().ok_or_else(|| too_short.clone())?;
    if version != VERSION {
        return Err(CodecError::BadVersion(version));
    }
    let type_byte = reader.u8().ok_or_else(|| too_short.clone())?;
    let packet_type =
        PacketType::from_byte(type_byte).ok_or(CodecError::UnknownPacketType(type_byte))?;
    let payload_len = reader.u16().ok_or_else(|| too_short.clone())?;
    let sequence = reader.u32().ok_or_else(|| too_short.clone())?;
    let checksum = reader.u32().ok_or(too_short)?;

    Ok(PacketHeader {
        packet_type,
        payload_len,
        sequence,
        checksum,
    })
}

/// Decode a SimData datagram.
///
/// Returns `None` on any failure. No partial snapshot is ever returned.
pub fn decode(data: &[u8]) -> Option<SimDataPacket> {
    match decode_sim_data(data) {
        Ok(packet) => Some(packet),
        Err(e) => {
            trace!(error = %e, len = data.len(), "Dropping plugin datagram");
            None
        }
    }
}

/// Decode a SimData datagram, reporting why it was rejected.
pub fn decode_sim_data(data: &[u8]) -> Result<SimDataPacket, CodecError> {
    let header = parse_header(data)?;
    if header.packet_type != PacketType::SimData {
        return Err(CodecError::UnexpectedPacketType(header.packet_type));
    }

    let declared = header.payload_len as usize;
    let available = data.len() - HEADER_LEN;
    if declared > available {
        return Err(CodecError::Truncated {
            declared,
            available,
        });
    }

    let payload = &data[HEADER_LEN..HEADER_LEN + declared];
    let actual = crc32(payload);
    if actual != header.checksum {
        return Err(CodecError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let snapshot = read_snapshot(payload).ok_or(CodecError::PayloadTooShort { len: declared })?;
    Ok(SimDataPacket {
        sequence: header.sequence,
        snapshot,
    })
}

/// Encode a snapshot as a complete SimData datagram.
pub fn encode(snapshot: &AircraftSnapshot, sequence: u32) -> Vec<u8> {
    let payload = write_snapshot(snapshot);
    frame(PacketType::SimData, sequence, &payload)
}

/// Frame an arbitrary payload with a header of the given type.
pub fn encode_packet(
    packet_type: PacketType,
    sequence: u32,
    payload: &[u8],
) -> Result<Vec<u8>, CodecError> {
    if payload.len() > u16::MAX as usize {
        return Err(CodecError::PayloadTooLarge { len: payload.len() });
    }
    Ok(frame(packet_type, sequence, payload))
}

/// Build the header-only ack for a received SimData sequence number.
pub fn build_ack(sequence: u32) -> [u8; HEADER_LEN] {
    let mut ack = [0u8; HEADER_LEN];
    write_header(&mut ack, PacketType::Ack, 0, sequence, crc32(&[]));
    ack
}

fn frame(packet_type: PacketType, sequence: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_LEN + payload.len()];
    write_header(
        &mut buf[..HEADER_LEN],
        packet_type,
        payload.len() as u16,
        sequence,
        crc32(payload),
    );
    buf[HEADER_LEN..].copy_from_slice(payload);
    buf
}

fn write_header(
    buf: &mut [u8],
    packet_type: PacketType,
    payload_len: u16,
    sequence: u32,
    checksum: u32,
) {
    buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    buf[4..6].copy_from_slice(&VERSION.to_le_bytes());
    buf[6] = packet_type as u8;
    buf[7..9].copy_from_slice(&payload_len.to_le_bytes());
    buf[9..13].copy_from_slice(&sequence.to_le_bytes());
    buf[13..17].copy_from_slice(&checksum.to_le_bytes());
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot payload layout
// ─────────────────────────────────────────────────────────────────────────────

fn write_snapshot(s: &AircraftSnapshot) -> Vec<u8> {
    let mut w = Writer(Vec::with_capacity(SNAPSHOT_PAYLOAD_LEN));

    w.f64(s.latitude);
    w.f64(s.longitude);
    w.f64(s.elevation_m);
    w.f32(s.groundspeed_ms);

    w.f32(s.pitch_deg);
    w.f32(s.roll_deg);
    w.f32(s.mag_heading_deg);
    w.f32(s.ground_track_deg);

    w.f32(s.ias_kts);
    w.f32(s.tas_kts);
    w.f32(s.vvi_fpm);
    w.f32(s.turn_rate_deg_sec);
    w.f32(s.slip_deg);
    w.f32(s.oat_degc);
    w.f32(s.barometer_inhg);

    w.f32(s.rpm);
    w.f32(s.map_inhg);
    w.f32(s.fuel_flow_kg_sec);
    w.f32(s.oil_press_psi);
    w.f32(s.oil_temp_degc);
    w.f32_slice(&s.egt_degc);
    w.f32_slice(&s.fuel_qty_kg);
    w.f32(s.bus_volts);
    w.f32(s.battery_amps);
    w.f32(s.suction_inhg);

    w.f32(s.nav1_hdef_dot);
    w.f32(s.nav1_vdef_dot);
    w.f32(s.nav1_obs_deg);
    w.f32(s.gps_dist_nm);
    w.f32(s.gps_bearing_deg);

    w.i32(s.ap_state_flags);
    w.f32(s.fd_pitch_deg);
    w.f32(s.fd_roll_deg);
    w.f32(s.ap_heading_bug_deg);
    w.f32(s.ap_altitude_ft);
    w.f32(s.ap_vs_fpm);

    w.i32(s.com1_active_hz);
    w.i32(s.com1_standby_hz);
    w.i32(s.com2_active_hz);
    w.i32(s.nav1_active_hz);
    w.i32(s.nav1_standby_hz);
    w.i32(s.transponder_code);
    w.i32(s.transponder_mode);

    w.bool(s.outer_marker);
    w.bool(s.middle_marker);
    w.bool(s.inner_marker);

    w.f32(s.wind_dir_deg);
    w.f32(s.wind_speed_kt);

    let count = s.traffic_len();
    w.f32_slice(&s.traffic_lat);
    w.f32_slice(&s.traffic_lon);
    w.f32_slice(&s.traffic_ele_m);
    w.0.push(count as u8);

    w.i32(s.hsi_source);

    debug_assert_eq!(w.0.len(), SNAPSHOT_PAYLOAD_LEN);
    w.0
}

fn read_snapshot(payload: &[u8]) -> Option<AircraftSnapshot> {
    if payload.len() < SNAPSHOT_PAYLOAD_LEN {
        return None;
    }
    let mut r = Reader::new(payload);

    let mut s = AircraftSnapshot {
        latitude: r.f64()?,
        longitude: r.f64()?,
        elevation_m: r.f64()?,
        groundspeed_ms: r.f32()?,

        pitch_deg: r.f32()?,
        roll_deg: r.f32()?,
        mag_heading_deg: r.f32()?,
        ground_track_deg: r.f32()?,

        ias_kts: r.f32()?,
        tas_kts: r.f32()?,
        vvi_fpm: r.f32()?,
        turn_rate_deg_sec: r.f32()?,
        slip_deg: r.f32()?,
        oat_degc: r.f32()?,
        barometer_inhg: r.f32()?,

        rpm: r.f32()?,
        map_inhg: r.f32()?,
        fuel_flow_kg_sec: r.f32()?,
        oil_press_psi: r.f32()?,
        oil_temp_degc: r.f32()?,
        egt_degc: r.f32_array::<EGT_CHANNELS>()?,
        fuel_qty_kg: r.f32_array::<FUEL_TANKS>()?,
        bus_volts: r.f32()?,
        battery_amps: r.f32()?,
        suction_inhg: r.f32()?,

        nav1_hdef_dot: r.f32()?,
        nav1_vdef_dot: r.f32()?,
        nav1_obs_deg: r.f32()?,
        gps_dist_nm: r.f32()?,
        gps_bearing_deg: r.f32()?,

        ap_state_flags: r.i32()?,
        fd_pitch_deg: r.f32()?,
        fd_roll_deg: r.f32()?,
        ap_heading_bug_deg: r.f32()?,
        ap_altitude_ft: r.f32()?,
        ap_vs_fpm: r.f32()?,

        com1_active_hz: r.i32()?,
        com1_standby_hz: r.i32()?,
        com2_active_hz: r.i32()?,
        nav1_active_hz: r.i32()?,
        nav1_standby_hz: r.i32()?,
        transponder_code: r.i32()?,
        transponder_mode: r.i32()?,

        outer_marker: r.u8()? != 0,
        middle_marker: r.u8()? != 0,
        inner_marker: r.u8()? != 0,

        wind_dir_deg: r.f32()?,
        wind_speed_kt: r.f32()?,

        traffic_lat: r.f32_array::<MAX_TRAFFIC>()?,
        traffic_lon: r.f32_array::<MAX_TRAFFIC>()?,
        traffic_ele_m: r.f32_array::<MAX_TRAFFIC>()?,
        traffic_count: r.u8()?,

        hsi_source: r.i32()?,
    };

    s.normalize_traffic();
    Some(s)
}

struct Writer(Vec<u8>);

impl Writer {
    fn f64(&mut self, v: f64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn bool(&mut self, v: bool) {
        self.0.push(u8::from(v));
    }

    fn f32_slice(&mut self, values: &[f32]) {
        for v in values {
            self.f32(*v);
        }
    }
}

/// Little-endian cursor. Every read returns `None` past the end.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes: [u8; N] = self.buf.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn f32(&mut self) -> Option<f32> {
        self.take().map(f32::from_le_bytes)
    }

    fn f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn f32_array<const N: usize>(&mut self) -> Option<[f32; N]> {
        let mut out = [0.0f32; N];
        for v in out.iter_mut() {
            *v = self.f32()?;
        }
        Some(out)
    }
}
