//! Unified aircraft snapshot.
//!
//! [`AircraftSnapshot`] is the single value produced by every feed decoder
//! and published by the arbiter. It is a flat record grouped by subsystem;
//! the field order matches the primary feed's 464-byte wire payload.
//!
//! A snapshot is never patched in place. Each successful decode produces a
//! fresh value that replaces the previous one wholesale.

use serde::Serialize;

/// Number of exhaust gas temperature channels (one per cylinder).
pub const EGT_CHANNELS: usize = 6;

/// Number of fuel quantity channels (left/right tank).
pub const FUEL_TANKS: usize = 2;

/// Maximum number of traffic targets carried in a snapshot.
pub const MAX_TRAFFIC: usize = 20;

/// Complete aircraft state as seen by downstream instruments.
///
/// Units are encoded in the field names. Angles are degrees, speeds are
/// knots unless suffixed `_ms` (metres per second), and elevations are
/// metres above mean sea level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AircraftSnapshot {
    // Position
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Elevation MSL in metres.
    pub elevation_m: f64,
    /// Ground speed in metres per second.
    pub groundspeed_ms: f32,

    // Attitude
    pub pitch_deg: f32,
    pub roll_deg: f32,
    /// Magnetic heading.
    pub mag_heading_deg: f32,
    /// True ground track.
    pub ground_track_deg: f32,

    // Air data
    pub ias_kts: f32,
    pub tas_kts: f32,
    pub vvi_fpm: f32,
    pub turn_rate_deg_sec: f32,
    pub slip_deg: f32,
    pub oat_degc: f32,
    pub barometer_inhg: f32,

    // Engine
    pub rpm: f32,
    pub map_inhg: f32,
    pub fuel_flow_kg_sec: f32,
    pub oil_press_psi: f32,
    pub oil_temp_degc: f32,
    pub egt_degc: [f32; EGT_CHANNELS],
    pub fuel_qty_kg: [f32; FUEL_TANKS],
    pub bus_volts: f32,
    pub battery_amps: f32,
    pub suction_inhg: f32,

    // Navigation
    /// NAV1 lateral deflection in dots.
    pub nav1_hdef_dot: f32,
    /// NAV1 vertical deflection in dots.
    pub nav1_vdef_dot: f32,
    pub nav1_obs_deg: f32,
    pub gps_dist_nm: f32,
    pub gps_bearing_deg: f32,

    // Autopilot
    /// Raw autopilot state bitfield as reported by the simulator.
    pub ap_state_flags: i32,
    pub fd_pitch_deg: f32,
    pub fd_roll_deg: f32,
    pub ap_heading_bug_deg: f32,
    pub ap_altitude_ft: f32,
    pub ap_vs_fpm: f32,

    // Radios
    pub com1_active_hz: i32,
    pub com1_standby_hz: i32,
    pub com2_active_hz: i32,
    pub nav1_active_hz: i32,
    pub nav1_standby_hz: i32,
    pub transponder_code: i32,
    pub transponder_mode: i32,

    // Marker beacons
    pub outer_marker: bool,
    pub middle_marker: bool,
    pub inner_marker: bool,

    // Wind
    pub wind_dir_deg: f32,
    pub wind_speed_kt: f32,

    // Traffic
    pub traffic_lat: [f32; MAX_TRAFFIC],
    pub traffic_lon: [f32; MAX_TRAFFIC],
    /// Traffic elevations in metres.
    pub traffic_ele_m: [f32; MAX_TRAFFIC],
    /// Number of valid traffic slots. Slots past this index are zero.
    pub traffic_count: u8,

    /// Selected HSI source (simulator enumeration).
    pub hsi_source: i32,
}

/// A single traffic target extracted from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficTarget {
    pub latitude: f32,
    pub longitude: f32,
    pub elevation_m: f32,
}

impl AircraftSnapshot {
    /// Number of valid traffic targets, clamped to [`MAX_TRAFFIC`].
    pub fn traffic_len(&self) -> usize {
        (self.traffic_count as usize).min(MAX_TRAFFIC)
    }

    /// Iterate over the valid traffic targets only.
    pub fn traffic(&self) -> impl Iterator<Item = TrafficTarget> + '_ {
        (0..self.traffic_len()).map(move |i| TrafficTarget {
            latitude: self.traffic_lat[i],
            longitude: self.traffic_lon[i],
            elevation_m: self.traffic_ele_m[i],
        })
    }

    /// Clamp the traffic count and zero every slot past it.
    ///
    /// Decoders call this before handing a snapshot out so that unused
    /// slots are always defined as zero.
    pub fn normalize_traffic(&mut self) {
        let len = self.traffic_len();
        self.traffic_count = len as u8;
        for slot in len..MAX_TRAFFIC {
            self.traffic_lat[slot] = 0.0;
            self.traffic_lon[slot] = 0.0;
            self.traffic_ele_m[slot] = 0.0;
        }
    }

    /// Returns true if the snapshot carries a position fix.
    pub fn has_position(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}
