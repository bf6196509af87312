//! Formprobe CLI library
//!
//! Command definitions, configuration and handlers behind the `formprobe`
//! binary.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    CatalogArgs, Cli, ColorArg, Commands, GenerateArgs, ListArgs, LogFormatArg, ReportFormat,
    RunArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
