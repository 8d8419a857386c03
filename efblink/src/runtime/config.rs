//! Runtime configuration derived from the user config file.

use std::time::Duration;

use crate::arbiter::ArbiterConfig;
use crate::config::{ConfigFile, DiscoverySettings};
use crate::feed::{DiscoveryConfig, ListenerConfig};

/// Configuration for [`TelemetryRuntime`](super::TelemetryRuntime).
///
/// A `None` listener disables that feed.
///
/// When the plugin listener has no peer and `discovery` is set, the runtime
/// listens for the simulator beacon and bootstraps the plugin from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRuntimeConfig {
    pub plugin: Option<ListenerConfig>,
    pub gdl90: Option<ListenerConfig>,
    pub legacy: Option<ListenerConfig>,
    pub arbiter: ArbiterConfig,
    pub discovery: Option<DiscoveryConfig>,
}

impl Default for TelemetryRuntimeConfig {
    fn default() -> Self {
        Self {
            plugin: Some(ListenerConfig::plugin()),
            gdl90: Some(ListenerConfig::gdl90()),
            legacy: Some(ListenerConfig::legacy()),
            arbiter: ArbiterConfig::default(),
            discovery: Some(DiscoveryConfig::default()),
        }
    }
}

impl TelemetryRuntimeConfig {
    /// Build a runtime configuration from the config file.
    ///
    /// A fixed `plugin.target` replaces discovery.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let plugin = config.plugin.enabled.then(|| ListenerConfig {
            peer: config.plugin.target,
            ..ListenerConfig::plugin().with_port(config.plugin.port)
        });
        let discovery = (config.plugin.enabled && config.plugin.target.is_none())
            .then(|| DiscoveryConfig::from(&config.discovery));

        let gdl90 = config.gdl90.enabled.then(|| ListenerConfig {
            multicast_group: Some(config.gdl90.multicast_group),
            ..ListenerConfig::gdl90().with_port(config.gdl90.port)
        });

        let legacy = config
            .legacy
            .enabled
            .then(|| ListenerConfig::legacy().with_port(config.legacy.port));

        let arbiter = ArbiterConfig {
            health_interval: Duration::from_millis(config.arbiter.health_interval_ms),
            stale_threshold: Duration::from_millis(config.arbiter.stale_threshold_ms),
            reconnect_window: Duration::from_millis(config.arbiter.reconnect_window_ms),
            ..ArbiterConfig::default()
        };

        Self {
            plugin,
            gdl90,
            legacy,
            arbiter,
            discovery,
        }
    }

    /// Disable every feed and discovery. Useful as a starting point for
    /// builders.
    pub fn without_feeds(arbiter: ArbiterConfig) -> Self {
        Self {
            plugin: None,
            gdl90: None,
            legacy: None,
            arbiter,
            discovery: None,
        }
    }

    pub fn with_plugin(mut self, listener: ListenerConfig) -> Self {
        self.plugin = Some(listener);
        self
    }

    pub fn with_gdl90(mut self, listener: ListenerConfig) -> Self {
        self.gdl90 = Some(listener);
        self
    }

    pub fn with_legacy(mut self, listener: ListenerConfig) -> Self {
        self.legacy = Some(listener);
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = Some(discovery);
        self
    }
}

impl From<&DiscoverySettings> for DiscoveryConfig {
    fn from(settings: &DiscoverySettings) -> Self {
        Self {
            group: settings.multicast_group,
            port: settings.port,
            timeout: Duration::from_secs(settings.timeout_secs),
            ..DiscoveryConfig::default()
        }
    }
}
