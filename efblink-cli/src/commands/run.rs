//! Run command - start all feeds and print the unified telemetry.
//!
//! Default output is one line per connection change. With `--json`, every
//! published snapshot and every status change is written to stdout as a
//! JSON line, so the stream can be piped into other tools.

use std::io::{self, Write};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use efblink::arbiter::{ConnectionStatus, LinkState, PublishedSnapshot, TelemetryBroadcaster};
use efblink::feed::FeedSource;
use efblink::runtime::{TelemetryRuntime, TelemetryRuntimeConfig};
use efblink::snapshot::AircraftSnapshot;

use crate::error::CliError;
use crate::runner::{CliRunner, LogOptions};

/// Arguments for the run command.
pub struct RunArgs {
    pub json: bool,
    pub debug: bool,
    pub verbose: bool,
}

/// One line of `--json` output.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutputLine<'a> {
    Status(ConnectionStatus),
    Snapshot {
        source: FeedSource,
        age_ms: u64,
        snapshot: &'a AircraftSnapshot,
    },
}

/// Run the telemetry runtime until Ctrl-C.
pub async fn run(args: RunArgs) -> Result<(), CliError> {
    // Console logging would interleave with JSON lines
    let runner = CliRunner::start(
        "run",
        LogOptions {
            debug: args.debug,
            console: args.verbose && !args.json,
        },
    )?;

    let runtime_config = TelemetryRuntimeConfig::from_config_file(runner.config());
    let runtime = TelemetryRuntime::start(runtime_config).await;

    let feeds = runtime.active_feeds();
    if feeds.is_empty() {
        runtime.shutdown().await;
        return Err(CliError::NoFeeds);
    }

    if !args.json {
        println!("EFB Link v{}", efblink::VERSION);
        for feed in &feeds {
            if let Some(addr) = runtime.local_addr(*feed) {
                println!("  {:<7} listening on {}", feed.as_str(), addr);
            }
        }
        if feeds.contains(&FeedSource::Plugin) {
            match runtime.plugin_peer() {
                Some(peer) => println!("  plugin  bootstrapping {}", peer),
                None => println!("  plugin  locating simulator by beacon"),
            }
        }
        println!("Press Ctrl-C to stop.");
        println!();
    }

    let telemetry = runtime.telemetry();
    let result = stream(
        telemetry.subscribe_status(),
        telemetry.subscribe_snapshots(),
        args.json,
    )
    .await;

    runtime.shutdown().await;
    result
}

/// Print status changes (and snapshots in JSON mode) until Ctrl-C.
async fn stream(
    mut status_rx: watch::Receiver<ConnectionStatus>,
    mut snapshot_rx: watch::Receiver<Option<std::sync::Arc<PublishedSnapshot>>>,
    json: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut last_status = *status_rx.borrow_and_update();
    print_status(&mut stdout.lock(), &last_status, json)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;

            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C; stopping");
                }
                info!("Interrupted, stopping");
                break;
            }

            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                if status.is_transition_from(&last_status) {
                    print_status(&mut stdout.lock(), &status, json)?;
                }
                last_status = status;
            }

            changed = snapshot_rx.changed(), if json => {
                if changed.is_err() {
                    break;
                }
                let published = snapshot_rx.borrow_and_update().clone();
                if let Some(published) = published {
                    let line = OutputLine::Snapshot {
                        source: published.source,
                        age_ms: published.received_at.elapsed().as_millis() as u64,
                        snapshot: &published.snapshot,
                    };
                    write_json(&mut stdout.lock(), &line)?;
                }
            }
        }
    }

    if !json {
        println!();
        println!("Stopped.");
    }
    Ok(())
}

fn print_status(out: &mut impl Write, status: &ConnectionStatus, json: bool) -> Result<(), CliError> {
    if json {
        return write_json(out, &OutputLine::Status(*status));
    }
    writeln!(out, "{}", describe_status(status))?;
    Ok(())
}

fn write_json(out: &mut impl Write, line: &OutputLine<'_>) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Human-readable one-line status.
fn describe_status(status: &ConnectionStatus) -> String {
    match status.state {
        LinkState::Connected => format!(
            "connected     via {} (last packet {} ms ago)",
            status.source, status.latency_ms
        ),
        LinkState::Reconnecting => match status.last_packet_age_ms {
            Some(age) => format!("reconnecting  (no fresh feed for {} ms)", age),
            None => "reconnecting".to_string(),
        },
        LinkState::Disconnected => "disconnected  (waiting for a feed)".to_string(),
    }
}
