//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`discover`] - Locate a simulator via its beacon
//! - [`reload`] - Ask the plugin to reload its configuration
//! - [`run`] - Main command (listen on all feeds, print telemetry)

pub mod config;
pub mod discover;
pub mod reload;
pub mod run;
