//! Default values and constants for all configuration settings.
//!
//! Feed ports and timing defaults are taken from the modules that own them
//! so the config file and the library never disagree.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use super::settings::*;
use crate::arbiter::{DEFAULT_HEALTH_INTERVAL, DEFAULT_RECONNECT_WINDOW, DEFAULT_STALE_THRESHOLD};
use crate::feed::{DEFAULT_BEACON_GROUP, DEFAULT_BEACON_PORT, DEFAULT_DISCOVERY_TIMEOUT};
use crate::protocol::efb::PLUGIN_PORT;
use crate::protocol::gdl90::{GDL90_MULTICAST_GROUP, GDL90_PORT};
use crate::protocol::legacy::LEGACY_PORT;

// =============================================================================
// Feed defaults
// =============================================================================

/// Default UDP port for the primary plugin feed.
pub const DEFAULT_PLUGIN_PORT: u16 = PLUGIN_PORT;

/// Default UDP port for the GDL-90 feed.
pub const DEFAULT_GDL90_PORT: u16 = GDL90_PORT;

/// Default multicast group for the GDL-90 feed.
pub const DEFAULT_GDL90_GROUP: Ipv4Addr = Ipv4Addr::new(
    GDL90_MULTICAST_GROUP[0],
    GDL90_MULTICAST_GROUP[1],
    GDL90_MULTICAST_GROUP[2],
    GDL90_MULTICAST_GROUP[3],
);

/// Default UDP port for the legacy DATA feed.
pub const DEFAULT_LEGACY_PORT: u16 = LEGACY_PORT;

// =============================================================================
// Arbiter defaults
// =============================================================================

/// Default health evaluation period in milliseconds.
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = duration_ms(DEFAULT_HEALTH_INTERVAL);

/// Default staleness threshold in milliseconds.
pub const DEFAULT_STALE_THRESHOLD_MS: u64 = duration_ms(DEFAULT_STALE_THRESHOLD);

/// Default reconnect window in milliseconds.
pub const DEFAULT_RECONNECT_WINDOW_MS: u64 = duration_ms(DEFAULT_RECONNECT_WINDOW);

// =============================================================================
// Discovery defaults
// =============================================================================

/// Default beacon port.
pub const DEFAULT_DISCOVERY_PORT: u16 = DEFAULT_BEACON_PORT;

/// Default beacon timeout in seconds.
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = DEFAULT_DISCOVERY_TIMEOUT.as_secs();

// =============================================================================
// Locations
// =============================================================================

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "efblink.log";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// `~/.efblink`, or `./.efblink` without a home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".efblink")
}

/// `~/.efblink/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

const fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            plugin: PluginSettings {
                enabled: true,
                port: DEFAULT_PLUGIN_PORT,
                target: None,
            },
            gdl90: Gdl90Settings {
                enabled: true,
                port: DEFAULT_GDL90_PORT,
                multicast_group: DEFAULT_GDL90_GROUP,
            },
            legacy: LegacySettings {
                enabled: true,
                port: DEFAULT_LEGACY_PORT,
            },
            arbiter: ArbiterSettings {
                health_interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
                stale_threshold_ms: DEFAULT_STALE_THRESHOLD_MS,
                reconnect_window_ms: DEFAULT_RECONNECT_WINDOW_MS,
            },
            discovery: DiscoverySettings {
                port: DEFAULT_DISCOVERY_PORT,
                multicast_group: DEFAULT_BEACON_GROUP,
                timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_constants() {
        let config = ConfigFile::default();

        assert!(config.plugin.enabled);
        assert_eq!(config.plugin.port, 49100);
        assert!(config.plugin.target.is_none());
        assert_eq!(config.gdl90.multicast_group.octets(), [239, 253, 1, 1]);
        assert_eq!(config.legacy.port, 49000);
        assert_eq!(config.arbiter.health_interval_ms, 100);
        assert_eq!(config.arbiter.stale_threshold_ms, 500);
        assert_eq!(config.arbiter.reconnect_window_ms, 5000);
        assert_eq!(config.discovery.timeout_secs, 5);
    }

    #[test]
    fn test_locations_share_one_directory() {
        let dir = config_directory();
        assert!(dir.ends_with(".efblink"));
        assert_eq!(config_file_path(), dir.join("config.ini"));
        assert_eq!(
            ConfigFile::default().logging.file,
            dir.join(DEFAULT_LOG_FILE_NAME)
        );
    }
}
