//! Reload command - ask the simulator plugin to reload its configuration.

use std::net::SocketAddr;

use tracing::info;

use efblink::feed::{CommandChannel, DiscoveryConfig, UdpCommandSink};

use super::discover::find_simulator;
use crate::error::CliError;
use crate::runner::{CliRunner, LogOptions};

/// Run the reload command.
///
/// The plugin address comes from `--target`, then `plugin.target`, then
/// discovery.
pub async fn run(target: Option<SocketAddr>) -> Result<(), CliError> {
    let runner = CliRunner::start("reload", LogOptions::default())?;

    let target = match target.or(runner.config().plugin.target) {
        Some(addr) => addr,
        None => {
            let config = DiscoveryConfig::from(&runner.config().discovery);
            println!("Looking for simulator...");
            let beacon = find_simulator(&config).await?;
            println!("Found '{}'", beacon.name);
            beacon.plugin_addr
        }
    };

    let channel = CommandChannel::new(UdpCommandSink::bind(target).await?);
    let sequence = channel.send_reload().await?;

    info!(%target, sequence, "Reload requested");
    println!("Reload request sent to {}", target);
    Ok(())
}
