//! Discover command - listen for a simulator beacon.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use efblink::feed::{discover, DiscoveryConfig, SimulatorBeacon};

use crate::error::CliError;
use crate::runner::{CliRunner, LogOptions};

/// Arguments for the discover command.
pub struct DiscoverArgs {
    /// Overrides `discovery.timeout` from the config file.
    pub timeout: Option<u64>,
    pub json: bool,
}

/// Run the discover command.
pub async fn run(args: DiscoverArgs) -> Result<(), CliError> {
    let runner = CliRunner::start("discover", LogOptions::default())?;

    let mut config = DiscoveryConfig::from(&runner.config().discovery);
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs.max(1));
    }

    if !args.json {
        println!(
            "Listening for simulator beacon on {}:{} ({}s)...",
            config.group,
            config.port,
            config.timeout.as_secs()
        );
    }

    let beacon = find_simulator(&config).await?;
    if args.json {
        println!("{}", serde_json::to_string(&beacon)?);
    } else {
        println!("Found '{}' at {}", beacon.name, beacon.address.ip());
        println!("  Plugin endpoint: {}", beacon.plugin_addr);
    }
    Ok(())
}

/// Wait for a beacon, stopping early on Ctrl-C.
pub async fn find_simulator(config: &DiscoveryConfig) -> Result<SimulatorBeacon, CliError> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping discovery");
            on_signal.cancel();
        }
    });

    let result = discover(config, &cancel).await;
    signal_task.abort();

    result?.ok_or(CliError::NoSimulator)
}
