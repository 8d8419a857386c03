//! Saving a [`ConfigFile`] as commented INI.
//!
//! The output is generated from [`ConfigKey::all`], so every key that can be
//! read or set is also written, in the same order `config list` shows.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::defaults::config_file_path;
use super::error::ConfigFileError;
use super::keys::ConfigKey;
use super::settings::ConfigFile;

impl ConfigFile {
    /// Save to `~/.efblink/config.ini`.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    ///
    /// The file is written beside the target and renamed over it, so a
    /// failed save leaves the previous file intact.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_error = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let staging = path.with_extension("ini.tmp");
        fs::write(&staging, to_config_string(self)).map_err(write_error)?;
        fs::rename(&staging, path).map_err(write_error)
    }
}

/// Render the whole file.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut section = "";

    for key in ConfigKey::all() {
        if key.section() != section {
            if !section.is_empty() {
                out.push('\n');
            }
            section = key.section();
            let _ = writeln!(out, "[{}]", section);
            for line in section_comment(section).lines() {
                let _ = writeln!(out, "; {}", line);
            }
        }

        let _ = writeln!(out, "; {}", key_comment(*key));
        let _ = writeln!(out, "{} = {}", key.key_name(), key.get(config));
    }

    out
}

fn section_comment(section: &str) -> &'static str {
    match section {
        "plugin" => "Primary feed from the simulator plugin (highest priority)\n\
                     Accepted packets are acked; the plugin streams only to whoever acks",
        "gdl90" => "GDL-90 ADS-B feed (ownship report + AHRS extension)",
        "legacy" => "Legacy simulator DATA broadcast (lowest priority)\n\
                     Requires the simulator to output data groups 3, 6 and 17",
        "arbiter" => "Failover timing",
        "discovery" => "Simulator beacon, also used to locate the plugin when plugin.target is auto",
        "logging" => "Log output",
        _ => "",
    }
}

fn key_comment(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::PluginEnabled | ConfigKey::Gdl90Enabled | ConfigKey::LegacyEnabled => {
            "Listen on this feed (default: true)"
        }
        ConfigKey::PluginPort => "Local UDP port the plugin sends to (default: 49100)",
        ConfigKey::PluginTarget => {
            "Plugin address as ip:port, or auto to locate it by beacon (default: auto)"
        }
        ConfigKey::Gdl90Port => "UDP port (default: 4000)",
        ConfigKey::Gdl90MulticastGroup => "Multicast group to join (default: 239.253.1.1)",
        ConfigKey::LegacyPort => "UDP port (default: 49000)",
        ConfigKey::ArbiterHealthIntervalMs => {
            "How often feed freshness is re-evaluated, in milliseconds (default: 100)"
        }
        ConfigKey::ArbiterStaleThresholdMs => {
            "A feed silent for this long is stale, in milliseconds (default: 500)"
        }
        ConfigKey::ArbiterReconnectWindowMs => {
            "Time spent reconnecting before reporting disconnected, in milliseconds (default: 5000)"
        }
        ConfigKey::DiscoveryPort => "Beacon port (default: 49707)",
        ConfigKey::DiscoveryMulticastGroup => "Beacon multicast group (default: 239.255.1.1)",
        ConfigKey::DiscoveryTimeout => "Seconds to wait for a beacon (default: 5)",
        ConfigKey::LoggingFile => "Log file path (default: ~/.efblink/efblink.log)",
    }
}
