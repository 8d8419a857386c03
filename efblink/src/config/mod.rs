//! User configuration for EFB Link.
//!
//! Settings are stored in `~/.efblink/config.ini`, one section per concern:
//!
//! | Section       | Controls                                   |
//! |---------------|--------------------------------------------|
//! | `[plugin]`    | Primary feed enable flag, port, target     |
//! | `[gdl90]`     | GDL-90 feed enable flag, port, group       |
//! | `[legacy]`    | Legacy DATA feed enable flag and port      |
//! | `[arbiter]`   | Health interval, staleness, reconnect time |
//! | `[discovery]` | Beacon port, group and timeout             |
//! | `[logging]`   | Log file location                          |
//!
//! # Example
//!
//! ```ignore
//! use efblink::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::load()?;
//! ConfigKey::LegacyEnabled.set(&mut config, "false")?;
//! config.save()?;
//! ```

mod defaults;
mod error;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use error::ConfigFileError;
pub use keys::{ConfigKey, ConfigKeyError, AUTO_TARGET};
pub use settings::*;
