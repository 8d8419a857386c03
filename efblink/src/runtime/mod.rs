//! Runtime for the telemetry subsystem.
//!
//! The runtime wires the feed listeners to the source arbiter and owns all
//! of their tasks. The CLI creates one runtime per session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       TelemetryRuntime                       │
//! │                                                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │ Plugin       │  │ GDL-90       │  │ Legacy       │        │
//! │  │ Listener     │  │ Listener     │  │ Listener     │        │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘        │
//! │         │  FeedReport (mpsc) + liveness     │                │
//! │         ▼                 ▼                 ▼                │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │                  SourceArbiter                     │      │
//! │  │   watch: Option<Arc<PublishedSnapshot>>            │      │
//! │  │   watch: ConnectionStatus                          │      │
//! │  └──────────────────────────┬─────────────────────────┘      │
//! │                             ▼                                │
//! │                      SharedTelemetry                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Shutdown
//!
//! Every task selects on the same `CancellationToken`. Cancelling it
//! unblocks pending receives, the sockets close as their tasks finish, and
//! the arbiter's interval is dropped with its task.

mod config;
mod orchestrator;

pub use config::TelemetryRuntimeConfig;
pub use orchestrator::TelemetryRuntime;
