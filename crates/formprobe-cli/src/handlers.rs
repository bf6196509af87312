//! Command handlers

use formprobe::scenarios::reference_payload;
use formprobe::{Catalog, ProbeConfig, RequirementsGenerator, ScenarioSuite};
use std::path::Path;
use tracing::info;

use crate::commands::{CatalogArgs, GenerateArgs, ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Load the configuration file named on the command line
pub fn load_probe_config(path: &Path) -> CliResult<ProbeConfig> {
    ProbeConfig::load(path).map_err(|e| CliError::config(format!("{}: {e}", path.display())))
}

/// Apply `run` flags on top of the file configuration
#[must_use]
pub fn apply_run_args(mut probe: ProbeConfig, args: &RunArgs) -> ProbeConfig {
    if let Some(language) = args.language {
        probe = probe.with_language(language);
    }
    if let Some(seed) = args.seed {
        probe = probe.with_seed(seed);
    }
    if let Some(ref catalog) = args.catalog {
        probe = probe.with_catalog_path(catalog);
    }
    if let Some(ref base_url) = args.base_url {
        probe = probe.with_base_url(base_url);
    }
    if args.headed {
        probe = probe.with_headless(false);
    }
    probe
}

fn generator_for(seed: Option<u64>) -> RequirementsGenerator {
    seed.map_or_else(RequirementsGenerator::new, RequirementsGenerator::with_seed)
}

/// `formprobe list`
pub fn execute_list(args: &ListArgs) -> CliResult<()> {
    let suite = ScenarioSuite::standard(&reference_payload());
    for scenario in suite.filtered(args.filter.as_deref()) {
        println!("{}", scenario.name);
    }
    Ok(())
}

/// `formprobe generate`
pub fn execute_generate(probe: &ProbeConfig, args: &GenerateArgs) -> CliResult<()> {
    let catalog = match args.catalog {
        Some(ref path) => Catalog::from_path(path)?,
        None => probe.catalog()?,
    };
    let mut generator = generator_for(args.seed.or(probe.seed));
    let payloads = (0..args.count)
        .map(|_| generator.generate_requirements(&catalog))
        .collect::<Result<Vec<_>, _>>()?;
    info!(seed = generator.seed(), count = payloads.len(), "payloads generated");

    let document = serde_json::json!({
        "seed": generator.seed(),
        "payloads": payloads,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// `formprobe catalog`
pub fn execute_catalog(probe: &ProbeConfig, args: &CatalogArgs) -> CliResult<()> {
    let catalog = match args.path {
        Some(ref path) => Catalog::from_path(path)?,
        None => probe.catalog()?,
    };
    catalog.validate()?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

/// `formprobe run`
#[cfg(feature = "browser")]
pub fn execute_run(config: &CliConfig, probe: ProbeConfig, args: &RunArgs) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(live::run_suite(config, probe, args))
}

/// `formprobe run`
#[cfg(not(feature = "browser"))]
pub fn execute_run(_config: &CliConfig, _probe: ProbeConfig, _args: &RunArgs) -> CliResult<()> {
    Err(CliError::feature_disabled(
        "`run` drives a browser. Rebuild with --features browser",
    ))
}

#[cfg(feature = "browser")]
mod live {
    use formprobe::{
        BaselineDirectory, ChromiumDriver, FormController, ProbeConfig, ScenarioRunner,
        ScenarioSuite,
    };
    use std::sync::Arc;
    use std::time::Instant;
    use tracing::info;

    use super::generator_for;
    use crate::commands::{ReportFormat, RunArgs};
    use crate::config::CliConfig;
    use crate::error::{CliError, CliResult};
    use crate::output::ProgressReporter;

    pub(super) async fn run_suite(
        config: &CliConfig,
        probe: ProbeConfig,
        args: &RunArgs,
    ) -> CliResult<()> {
        let start = Instant::now();
        let catalog = Arc::new(probe.catalog()?);
        let mut generator = generator_for(probe.seed);
        let seed = generator.seed();
        let payload = generator.generate_requirements(&catalog)?;
        info!(seed, amount = %payload.loan_amount, "payload generated");

        let suite = ScenarioSuite::standard(&payload);
        let mut runner =
            ScenarioRunner::new(probe.base_url.clone(), generator).with_language(probe.language);
        if let Some(ref filter) = args.filter {
            runner = runner.with_filter(filter);
        }
        if args.fail_fast {
            runner = runner.with_fail_fast();
        }

        let driver = ChromiumDriver::launch(probe.driver_config()).await?;
        let mut form = FormController::new(driver, catalog).with_wait_options(probe.wait_options());

        let text = args.format == ReportFormat::Text;
        let mut reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet() || !text);
        reporter.header(&format!("{} ({})", suite.name, probe.language));
        reporter.start_progress(runner.planned(&suite) as u64, &suite.name);

        let mut report = runner
            .run_with_progress(&mut form, &suite, |_| reporter.inc())
            .await;

        if args.visual && !(args.fail_fast && !report.all_passed()) {
            let baselines = BaselineDirectory::new(&probe.snapshot_dir);
            report.results.extend(
                form.verify_layout_matrix(
                    &probe.base_url,
                    probe.language,
                    &baselines,
                    probe.snapshot_threshold,
                )
                .await,
            );
        }
        reporter.finish();
        form.into_driver().close().await?;
        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if text {
            for result in &report.results {
                reporter.scenario(result);
            }
            reporter.summary(&report);
        } else {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        if report.all_passed() {
            Ok(())
        } else {
            Err(CliError::verification(format!(
                "{} scenario(s) failed, replay with --seed {seed}",
                report.failed_count()
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use formprobe::LanguageTag;

    use crate::commands::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_file_values() {
        let file = ProbeConfig::new().with_seed(1).with_base_url("http://localhost:4200");
        let args = run_args(&["formprobe", "run", "--seed", "99", "--language", "nl", "--headed"]);
        let probe = apply_run_args(file, &args);
        assert_eq!(probe.seed, Some(99));
        assert_eq!(probe.language, LanguageTag::NlNl);
        assert!(!probe.headless);
        assert_eq!(probe.base_url, "http://localhost:4200");
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let file = ProbeConfig::new().with_seed(5).with_language(LanguageTag::NlNl);
        let probe = apply_run_args(file.clone(), &run_args(&["formprobe", "run"]));
        assert_eq!(probe, file);
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let probe = load_probe_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(probe, ProbeConfig::default());
    }

    #[test]
    fn test_malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "seed: [").unwrap();
        let err = load_probe_config(&path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
