//! Formprobe CLI: verify the loan application wizard from the terminal
//!
//! ## Usage
//!
//! ```bash
//! formprobe run                          # Run the standard suite
//! formprobe run --filter dropdown -l nl  # Dutch wizard, dropdown checks only
//! formprobe run --seed 42 --visual       # Replay a seed, check layouts too
//! formprobe generate --seed 42 -n 3      # Print seeded payloads
//! ```

use clap::Parser;
use formprobe_cli::{
    handlers, logging, Cli, CliConfig, CliResult, Commands, LogFormat, LogFormatArg, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    let probe = handlers::load_probe_config(&cli.config)?;
    match cli.command {
        Commands::Run(ref args) => {
            handlers::execute_run(&config, handlers::apply_run_args(probe, args), args)
        }
        Commands::List(ref args) => handlers::execute_list(args),
        Commands::Generate(ref args) => handlers::execute_generate(&probe, args),
        Commands::Catalog(ref args) => handlers::execute_catalog(&probe, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let log_format = match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    };
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(log_format)
}
