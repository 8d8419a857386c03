//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::process;

use efblink::config::{ConfigFileError, ConfigKeyError};
use efblink::feed::FeedError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Unknown config key or a value it rejects
    ConfigKey(ConfigKeyError),
    /// Failed to load or save the config file
    ConfigFile(ConfigFileError),
    /// Network error from a feed, discovery or the command channel
    Feed(FeedError),
    /// Every feed is disabled or failed to bind
    NoFeeds,
    /// Discovery finished without hearing a beacon
    NoSimulator,
    /// Failed to write output
    Output(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::NoFeeds => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. All feeds disabled: check [plugin], [gdl90] and [legacy] in config.ini");
                eprintln!("  2. Port in use: another EFB app may already be listening");
                eprintln!("  3. Multicast unavailable: GDL-90 needs a multicast-capable interface");
            }
            CliError::ConfigKey(ConfigKeyError::UnknownKey(_)) => {
                eprintln!();
                eprintln!("Run 'efblink config list' to see the available keys.");
            }
            CliError::NoSimulator => {
                eprintln!();
                eprintln!("Make sure:");
                eprintln!("  1. The simulator is running with the EFB plugin loaded");
                eprintln!("  2. Both machines are on the same network segment");
                eprintln!("  3. Your firewall allows UDP multicast on the beacon port");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ConfigKey(e) => write!(f, "{}", e),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Feed(e) => write!(f, "Network error: {}", e),
            CliError::NoFeeds => write!(f, "No telemetry feed could be started"),
            CliError::NoSimulator => write!(f, "No simulator found"),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::ConfigKey(e) => Some(e),
            CliError::Feed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<FeedError> for CliError {
    fn from(e: FeedError) -> Self {
        CliError::Feed(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Output(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
