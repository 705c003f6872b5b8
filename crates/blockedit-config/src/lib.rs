//! Configuration for block edit sessions.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line via clap. Unknown fields are ignored and missing ones take
//! their defaults, so old and new config files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, EditConfig, SyncConfig, WorldConfig, default_config_dir};
pub use error::ConfigError;
