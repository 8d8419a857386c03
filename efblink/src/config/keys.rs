//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use super::settings::ConfigFile;

/// Value of `plugin.target` meaning "locate by beacon".
pub const AUTO_TARGET: &str = "auto";

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Plugin feed
    PluginEnabled,
    PluginPort,
    PluginTarget,

    // GDL-90 feed
    Gdl90Enabled,
    Gdl90Port,
    Gdl90MulticastGroup,

    // Legacy feed
    LegacyEnabled,
    LegacyPort,

    // Arbiter
    ArbiterHealthIntervalMs,
    ArbiterStaleThresholdMs,
    ArbiterReconnectWindowMs,

    // Discovery
    DiscoveryPort,
    DiscoveryMulticastGroup,
    DiscoveryTimeout,

    // Logging
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "arbiter.stale_threshold_ms").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::PluginEnabled => "plugin.enabled",
            ConfigKey::PluginPort => "plugin.port",
            ConfigKey::PluginTarget => "plugin.target",
            ConfigKey::Gdl90Enabled => "gdl90.enabled",
            ConfigKey::Gdl90Port => "gdl90.port",
            ConfigKey::Gdl90MulticastGroup => "gdl90.multicast_group",
            ConfigKey::LegacyEnabled => "legacy.enabled",
            ConfigKey::LegacyPort => "legacy.port",
            ConfigKey::ArbiterHealthIntervalMs => "arbiter.health_interval_ms",
            ConfigKey::ArbiterStaleThresholdMs => "arbiter.stale_threshold_ms",
            ConfigKey::ArbiterReconnectWindowMs => "arbiter.reconnect_window_ms",
            ConfigKey::DiscoveryPort => "discovery.port",
            ConfigKey::DiscoveryMulticastGroup => "discovery.multicast_group",
            ConfigKey::DiscoveryTimeout => "discovery.timeout",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "arbiter").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "stale_threshold_ms").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::PluginEnabled => config.plugin.enabled.to_string(),
            ConfigKey::PluginPort => config.plugin.port.to_string(),
            ConfigKey::PluginTarget => config
                .plugin
                .target
                .map_or_else(|| AUTO_TARGET.to_string(), |addr| addr.to_string()),
            ConfigKey::Gdl90Enabled => config.gdl90.enabled.to_string(),
            ConfigKey::Gdl90Port => config.gdl90.port.to_string(),
            ConfigKey::Gdl90MulticastGroup => config.gdl90.multicast_group.to_string(),
            ConfigKey::LegacyEnabled => config.legacy.enabled.to_string(),
            ConfigKey::LegacyPort => config.legacy.port.to_string(),
            ConfigKey::ArbiterHealthIntervalMs => config.arbiter.health_interval_ms.to_string(),
            ConfigKey::ArbiterStaleThresholdMs => config.arbiter.stale_threshold_ms.to_string(),
            ConfigKey::ArbiterReconnectWindowMs => config.arbiter.reconnect_window_ms.to_string(),
            ConfigKey::DiscoveryPort => config.discovery.port.to_string(),
            ConfigKey::DiscoveryMulticastGroup => config.discovery.multicast_group.to_string(),
            ConfigKey::DiscoveryTimeout => config.discovery.timeout_secs.to_string(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();
        match self {
            ConfigKey::PluginEnabled => config.plugin.enabled = parse_bool(value),
            ConfigKey::PluginPort => config.plugin.port = self.parse(value)?,
            ConfigKey::PluginTarget => {
                config.plugin.target = if is_auto(value) {
                    None
                } else {
                    Some(self.parse(value)?)
                }
            }
            ConfigKey::Gdl90Enabled => config.gdl90.enabled = parse_bool(value),
            ConfigKey::Gdl90Port => config.gdl90.port = self.parse(value)?,
            ConfigKey::Gdl90MulticastGroup => config.gdl90.multicast_group = self.parse(value)?,
            ConfigKey::LegacyEnabled => config.legacy.enabled = parse_bool(value),
            ConfigKey::LegacyPort => config.legacy.port = self.parse(value)?,
            ConfigKey::ArbiterHealthIntervalMs => {
                config.arbiter.health_interval_ms = self.parse(value)?
            }
            ConfigKey::ArbiterStaleThresholdMs => {
                config.arbiter.stale_threshold_ms = self.parse(value)?
            }
            ConfigKey::ArbiterReconnectWindowMs => {
                config.arbiter.reconnect_window_ms = self.parse(value)?
            }
            ConfigKey::DiscoveryPort => config.discovery.port = self.parse(value)?,
            ConfigKey::DiscoveryMulticastGroup => {
                config.discovery.multicast_group = self.parse(value)?
            }
            ConfigKey::DiscoveryTimeout => config.discovery.timeout_secs = self.parse(value)?,
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value),
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: format!("could not parse '{}'", value),
        })
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::PluginEnabled | ConfigKey::Gdl90Enabled | ConfigKey::LegacyEnabled => {
                Box::new(BooleanSpec)
            }
            ConfigKey::PluginPort
            | ConfigKey::Gdl90Port
            | ConfigKey::LegacyPort
            | ConfigKey::DiscoveryPort => Box::new(PortSpec),
            ConfigKey::Gdl90MulticastGroup | ConfigKey::DiscoveryMulticastGroup => {
                Box::new(MulticastGroupSpec)
            }
            ConfigKey::ArbiterHealthIntervalMs
            | ConfigKey::ArbiterStaleThresholdMs
            | ConfigKey::ArbiterReconnectWindowMs
            | ConfigKey::DiscoveryTimeout => Box::new(PositiveIntegerSpec),
            ConfigKey::PluginTarget => Box::new(TargetSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::PluginEnabled,
            ConfigKey::PluginPort,
            ConfigKey::PluginTarget,
            ConfigKey::Gdl90Enabled,
            ConfigKey::Gdl90Port,
            ConfigKey::Gdl90MulticastGroup,
            ConfigKey::LegacyEnabled,
            ConfigKey::LegacyPort,
            ConfigKey::ArbiterHealthIntervalMs,
            ConfigKey::ArbiterStaleThresholdMs,
            ConfigKey::ArbiterReconnectWindowMs,
            ConfigKey::DiscoveryPort,
            ConfigKey::DiscoveryMulticastGroup,
            ConfigKey::DiscoveryTimeout,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Check if the value satisfies this specification.
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification for positive (non-zero) integer values.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

/// Specification for UDP port numbers.
struct PortSpec;

impl ValueSpecification for PortSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u16>() {
            Ok(port) if port > 0 => Ok(()),
            _ => Err("must be a port number between 1 and 65535".to_string()),
        }
    }
}

/// Specification for IPv4 multicast group addresses.
struct MulticastGroupSpec;

impl ValueSpecification for MulticastGroupSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<Ipv4Addr>() {
            Ok(addr) if addr.is_multicast() => Ok(()),
            Ok(_) => Err("must be in the multicast range 224.0.0.0/4".to_string()),
            Err(_) => Err("must be an IPv4 address".to_string()),
        }
    }
}

/// Specification for `ip:port` addresses, or `auto`.
struct TargetSpec;

impl ValueSpecification for TargetSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if is_auto(value) || value.parse::<SocketAddr>().is_ok() {
            Ok(())
        } else {
            Err(format!("must be ip:port or '{}'", AUTO_TARGET))
        }
    }
}

/// Specification for boolean values.
struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_bool(value: &str) -> bool {
    super::parser::parse_bool(value)
}

fn is_auto(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case(AUTO_TARGET)
}

fn expand_tilde(path: &str) -> PathBuf {
    super::parser::expand_tilde(path)
}

/// Convert path to display string, collapsing home dir to ~.
fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
