//! EFB Link - flight-simulator telemetry ingestion with automatic failover
//!
//! This library receives aircraft state from up to three network feeds,
//! keeps track of which ones are alive, and publishes a single snapshot
//! stream from the best feed available:
//!
//! | Priority | Feed           | Module                |
//! |----------|----------------|-----------------------|
//! | 1        | Plugin (EFB)   | [`protocol::efb`]     |
//! | 2        | GDL-90         | [`protocol::gdl90`]   |
//! | 3        | Legacy `DATA`  | [`protocol::legacy`]  |
//!
//! # High-Level API
//!
//! For most use cases, the [`runtime`] module wires everything together:
//!
//! ```ignore
//! use efblink::arbiter::TelemetryProvider;
//! use efblink::runtime::{TelemetryRuntime, TelemetryRuntimeConfig};
//!
//! let runtime = TelemetryRuntime::start(TelemetryRuntimeConfig::default()).await;
//! let telemetry = runtime.telemetry();
//!
//! if let Some(published) = telemetry.snapshot() {
//!     println!("{} via {}", published.snapshot.ias_kts, published.source);
//! }
//!
//! runtime.shutdown().await;
//! ```

pub mod arbiter;
pub mod config;
pub mod feed;
pub mod logging;
pub mod protocol;
pub mod runtime;
pub mod snapshot;

/// Version of the EFB Link library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
