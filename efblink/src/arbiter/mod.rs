//! Source arbiter - selects the active feed and publishes telemetry.
//!
//! The arbiter tracks per-feed liveness, picks the highest-priority fresh
//! feed, and publishes a single snapshot stream plus a connection status.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  FeedReport   ┌────────────────┐  watch   ┌───────────┐
//! │ FeedListener │──────────────►│ SourceArbiter  │─────────►│ consumers │
//! │   (x3)       │               │ (single task)  │          │           │
//! └──────┬───────┘               └───────▲────────┘          └───────────┘
//!        │ record()                      │ age()
//!        └──────────► FeedLiveness ──────┘
//! ```
//!
//! Priority (highest first): plugin, GDL-90, legacy UDP. A feed is stale
//! once its last packet is 500 ms old.

mod daemon;
mod failover;
mod liveness;
mod provider;
mod status;

pub use daemon::{
    ArbiterConfig, PublishedSnapshot, SourceArbiter, DEFAULT_HEALTH_INTERVAL,
    DEFAULT_RECONNECT_WINDOW, DEFAULT_REPORT_CAPACITY, DEFAULT_STALE_THRESHOLD,
};
pub use failover::{select_active, FailoverState};
pub use liveness::FeedLiveness;
pub use provider::{SharedTelemetry, TelemetryBroadcaster, TelemetryProvider};
pub use status::{ConnectionStatus, LinkState};
