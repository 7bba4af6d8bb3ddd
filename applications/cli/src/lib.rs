//! Walkup command-line application
//!
//! Configuration loading and roster files for the `walkup` binary.

pub mod config;
pub mod error;
pub mod roster;

pub use config::AppConfig;
pub use error::{CliError, Result};
pub use roster::Roster;
