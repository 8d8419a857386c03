//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Primary plugin feed
    pub plugin: PluginSettings,
    /// GDL-90 feed
    pub gdl90: Gdl90Settings,
    /// Legacy DATA feed
    pub legacy: LegacySettings,
    /// Failover timing
    pub arbiter: ArbiterSettings,
    /// Simulator beacon discovery
    pub discovery: DiscoverySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Primary plugin feed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSettings {
    pub enabled: bool,
    /// Local UDP port the plugin sends to.
    pub port: u16,
    /// Fixed plugin address; `None` locates it by beacon.
    pub target: Option<SocketAddr>,
}

/// GDL-90 feed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gdl90Settings {
    pub enabled: bool,
    pub port: u16,
    /// Multicast group to join.
    pub multicast_group: Ipv4Addr,
}

/// Legacy DATA feed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySettings {
    pub enabled: bool,
    pub port: u16,
}

/// Failover timing, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbiterSettings {
    /// Period of the health evaluation loop.
    pub health_interval_ms: u64,
    /// A feed silent for this long is stale.
    pub stale_threshold_ms: u64,
    /// How long a lost link reports "reconnecting" before "disconnected".
    pub reconnect_window_ms: u64,
}

/// Beacon discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub port: u16,
    pub multicast_group: Ipv4Addr,
    /// How long `discover` waits for a beacon, in seconds.
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
