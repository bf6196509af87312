//! Terminal output: progress and scenario verdicts

use console::{style, StyledObject, Term};
use formprobe::{ScenarioReport, SuiteReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Pass,
    Fail,
}

impl Mark {
    fn plain(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    fn styled(self) -> StyledObject<&'static str> {
        match self {
            Self::Pass => style("✓").green().bold(),
            Self::Fail => style("✗").red().bold(),
        }
    }
}

/// Progress and verdict output of a suite run.
///
/// Verdicts go to stdout; the progress bar draws on stderr next to the
/// logs and is cleared before verdicts are printed.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode: failures and failing summaries only
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }
        let style = ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        let pb = ProgressBar::new(total).with_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        self.progress_bar = Some(pb);
    }

    /// One scenario done
    pub fn inc(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Remove the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Suite title
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let line = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.write(&line);
    }

    /// Verdict line of one scenario
    pub fn scenario(&self, report: &ScenarioReport) {
        if report.passed {
            if !self.quiet {
                self.mark(Mark::Pass, &format!("{} ({}ms)", report.name, report.elapsed_ms));
            }
        } else {
            let reason = report.error.as_deref().unwrap_or("failed");
            self.mark(Mark::Fail, &format!("{}: {reason}", report.name));
        }
    }

    /// Totals of the run, with the seed to replay it
    pub fn summary(&self, report: &SuiteReport) {
        if self.quiet && report.all_passed() {
            return;
        }
        let failed = report.failed_count();
        let status = if failed > 0 { "FAILED" } else { "PASSED" };
        let status = match (self.use_color, failed > 0) {
            (false, _) => status.to_string(),
            (true, true) => style(status).red().bold().to_string(),
            (true, false) => style(status).green().bold().to_string(),
        };
        let seconds = Duration::from_millis(report.elapsed_ms).as_secs_f64();
        self.write("");
        self.write(&format!(
            "{status} {} scenarios in {seconds:.2}s ({} passed, {failed} failed, seed {})",
            report.total(),
            report.passed_count(),
            report.seed
        ));
    }

    fn mark(&self, mark: Mark, message: &str) {
        let prefix = if self.use_color {
            mark.styled().to_string()
        } else {
            mark.plain().to_string()
        };
        self.write(&format!("{prefix} {message}"));
    }

    fn write(&self, line: &str) {
        let _ = self.term.write_line(line);
    }
}
