//! Cadenza command-line front end
//!
//! Library management, import/export and session control over a local
//! SQLite database.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod probe;

pub use cli::{Cli, Commands};
pub use commands::App;
pub use config::AppConfig;
pub use error::{CliError, Result};
