//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use formprobe::LanguageTag;
use std::path::PathBuf;

/// Formprobe: verify the state of a multi-step loan application form
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, default_value = "formprobe.yaml", global = true, env = "FORMPROBE_CONFIG")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run verification scenarios against the live wizard
    Run(RunArgs),

    /// List scenarios of the standard suite
    List(ListArgs),

    /// Print seeded requirement payloads as JSON
    Generate(GenerateArgs),

    /// Validate a dropdown catalog and print it
    Catalog(CatalogArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Wizard language (en, nl)
    #[arg(short, long)]
    pub language: Option<LanguageTag>,

    /// Generator seed for replaying a run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Catalog document overriding the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Host the wizard is served from
    #[arg(long)]
    pub base_url: Option<String>,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Also check page layouts against the snapshot baselines
    #[arg(long)]
    pub visual: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Generator seed; drawn from entropy when absent
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of payloads
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Catalog document overriding the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Arguments for the catalog command
#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Catalog document; the built-in catalog when absent
    pub path: Option<PathBuf>,
}

/// Report format of a run
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per scenario
    #[default]
    Text,
    /// The suite report as JSON
    Json,
}

/// Log line format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Color choice argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn test_run_with_options() {
            let cli = Cli::try_parse_from([
                "formprobe", "-v", "run", "--filter", "dropdown", "--language", "nl", "--seed", "42",
                "--headed", "--fail-fast",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 1);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.filter.as_deref(), Some("dropdown"));
            assert_eq!(args.language, Some(LanguageTag::NlNl));
            assert_eq!(args.seed, Some(42));
            assert!(args.headed);
            assert!(args.fail_fast);
            assert_eq!(args.format, ReportFormat::Text);
        }

        #[test]
        fn test_rejects_unknown_language() {
            assert!(Cli::try_parse_from(["formprobe", "run", "--language", "fr"]).is_err());
        }

        #[test]
        fn test_generate_defaults() {
            let cli = Cli::try_parse_from(["formprobe", "generate"]).unwrap();
            let Commands::Generate(args) = cli.command else {
                panic!("expected generate");
            };
            assert_eq!(args.count, 1);
            assert!(args.seed.is_none());
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::try_parse_from([
                "formprobe", "list", "--log-format", "json", "--config", "ci.yaml",
            ])
            .unwrap();
            assert_eq!(cli.log_format, LogFormatArg::Json);
            assert_eq!(cli.config, PathBuf::from("ci.yaml"));
        }
    }
}
