//! Start-up shared by the network commands.
//!
//! `run`, `discover` and `reload` all need the config file and a log file.
//! `config` does not; it edits the file and must work even when the file no
//! longer loads.

use tracing::info;

use crate::error::CliError;
use efblink::config::{config_file_path, ConfigFile};
use efblink::logging::{init_logging, split_log_path, LoggingGuard};

/// Log level and destinations for one command.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Debug level unless `RUST_LOG` says otherwise.
    pub debug: bool,
    /// Mirror events to stdout as well as the log file.
    pub console: bool,
}

/// Loaded config plus the logging guard, kept for the whole command.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the config, start logging and record the start in the log.
    pub fn start(command: &'static str, options: LogOptions) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let logging = init_logging(&log_dir, &log_file, options.console, options.debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        info!(
            version = efblink::VERSION,
            command,
            config = %config_file_path().display(),
            log_file = %config.logging.file.display(),
            debug = options.debug,
            "EFB Link starting"
        );

        Ok(Self {
            config,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }
}
