//! Registro CLI Library
//!
//! Command-line interface over a Registro context: resolve template strings,
//! write artifacts and check that they exist.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{parse_key_value, AddArgs, CheckArgs, Cli, Commands, ResolveArgs};
pub use config::Verbosity;
pub use error::{CliError, CliResult};
