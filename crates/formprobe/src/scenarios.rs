//! Scenario suite for the loan wizard.
//!
//! A [`Scenario`] is one named check against one wizard step. The
//! [`ScenarioRunner`] gives every scenario a fresh session on its step,
//! records the outcome and moves on to the next one; a failure never stops
//! the suite unless fail-fast is requested.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::contact::{pick_director, PersonalDetails};
use crate::controller::FormController;
use crate::driver::FormDriver;
use crate::generator::RequirementsGenerator;
use crate::interaction::SubmitState;
use crate::locale::LanguageTag;
use crate::locator::Locator;
use crate::page_object::WizardStep;
use crate::payload::{RequirementsPayload, Selection};
use crate::result::{ProbeError, ProbeResult};

/// Amount typed by the manual-entry scenario
pub const MANUAL_AMOUNT: &str = "20000";

/// Search term matching several registered companies
pub const COMPANY_KEYWORD: &str = "Technology";

/// Chamber of commerce number of a company with listed directors
pub const DIRECTOR_COMPANY_COC: &str = "70304580";

/// Chamber of commerce number used for the personal details scenario
pub const APPLICANT_COMPANY_COC: &str = "34095964";

/// Payload the navigation and reload scenarios fill in when none is given
#[must_use]
pub fn reference_payload() -> RequirementsPayload {
    RequirementsPayload::new(
        "12000",
        vec![
            Selection::new("loanPeriods", "Fixed rate loan"),
            Selection::new("companyRevenue", "€150.000 - €500.000"),
            Selection::new("loanDeadline", "Within a week"),
            Selection::new("loanGoal", "Equity"),
        ],
    )
}

/// Applicant typed into the contact step
#[must_use]
pub fn reference_applicant() -> PersonalDetails {
    PersonalDetails::new("John", "Wick", "johnwick@gmail.com", "612198201")
        .with_terms_accepted(true)
}

/// What a scenario does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Type an amount; it must show formatted and leave submit disabled
    EnterAmount { amount: String },
    /// Drag the slider across its range; the amount must change
    DragSlider,
    /// Pick one option; it must show and leave submit disabled
    SelectDropdown { field: String, label: String },
    /// Give every answer; submit must go from disabled to enabled
    CompleteForm { payload: RequirementsPayload },
    /// Complete the step and submit it; the contact step must follow
    NavigateNext { payload: RequirementsPayload },
    /// Complete, submit and come back; the answers must still show
    GoBack { payload: RequirementsPayload },
    /// Complete and reload; the answers must still show
    RetainOnReload { payload: RequirementsPayload },
    /// Search a company; the shown details must match the lookup response
    CompanyDetails { term: String },
    /// Pick a random director; their names must be prefilled
    DirectorPrefill { term: String },
    /// Type personal details; they must show and enable submit
    PersonalDetails { term: String, details: PersonalDetails },
}

impl ScenarioKind {
    /// Step the scenario starts on
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        match self {
            Self::EnterAmount { .. }
            | Self::DragSlider
            | Self::SelectDropdown { .. }
            | Self::CompleteForm { .. }
            | Self::NavigateNext { .. }
            | Self::GoBack { .. }
            | Self::RetainOnReload { .. } => WizardStep::Amount,
            Self::CompanyDetails { .. }
            | Self::DirectorPrefill { .. }
            | Self::PersonalDetails { .. } => WizardStep::Contact,
        }
    }
}

/// A named scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Name, `<step>/<check>`
    pub name: String,
    /// What it does
    pub kind: ScenarioKind,
}

impl Scenario {
    /// Create a scenario named after its step
    #[must_use]
    pub fn new(check: &str, kind: ScenarioKind) -> Self {
        Self {
            name: format!("{}/{check}", kind.step()),
            kind,
        }
    }

    /// Step the scenario starts on
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.kind.step()
    }

    /// Case-insensitive substring match on the name
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        self.name.to_lowercase().contains(&filter.to_lowercase())
    }
}

/// Ordered collection of scenarios
#[derive(Debug, Clone)]
pub struct ScenarioSuite {
    /// Suite name
    pub name: String,
    /// Scenarios in run order
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Add a scenario
    pub fn add(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    /// Every check of the loan wizard. One dropdown scenario per selection
    /// of `payload`; the navigation and reload scenarios fill all of it.
    #[must_use]
    pub fn standard(payload: &RequirementsPayload) -> Self {
        let mut suite = Self::new("loan-wizard");
        suite.add(Scenario::new(
            "enter-amount",
            ScenarioKind::EnterAmount {
                amount: MANUAL_AMOUNT.to_string(),
            },
        ));
        suite.add(Scenario::new("slider", ScenarioKind::DragSlider));
        for selection in &payload.selections {
            suite.add(Scenario::new(
                &format!("dropdown-{}", selection.field),
                ScenarioKind::SelectDropdown {
                    field: selection.field.clone(),
                    label: selection.value.clone(),
                },
            ));
        }
        suite.add(Scenario::new(
            "complete-form",
            ScenarioKind::CompleteForm {
                payload: payload.clone(),
            },
        ));
        suite.add(Scenario::new(
            "navigate-next",
            ScenarioKind::NavigateNext {
                payload: payload.clone(),
            },
        ));
        suite.add(Scenario::new(
            "go-back",
            ScenarioKind::GoBack {
                payload: payload.clone(),
            },
        ));
        suite.add(Scenario::new(
            "retain-on-reload",
            ScenarioKind::RetainOnReload {
                payload: payload.clone(),
            },
        ));
        suite.add(Scenario::new(
            "company-details",
            ScenarioKind::CompanyDetails {
                term: COMPANY_KEYWORD.to_string(),
            },
        ));
        suite.add(Scenario::new(
            "director-prefill",
            ScenarioKind::DirectorPrefill {
                term: DIRECTOR_COMPANY_COC.to_string(),
            },
        ));
        suite.add(Scenario::new(
            "personal-details",
            ScenarioKind::PersonalDetails {
                term: APPLICANT_COMPANY_COC.to_string(),
                details: reference_applicant(),
            },
        ));
        suite
    }

    /// Scenarios whose name matches `filter`, or all of them
    #[must_use]
    pub fn filtered(&self, filter: Option<&str>) -> Vec<&Scenario> {
        self.scenarios
            .iter()
            .filter(|s| filter.map_or(true, |f| s.matches(f)))
            .collect()
    }

    /// Number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Check if the suite has no scenarios
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Step it started on
    pub step: WizardStep,
    /// Whether it passed
    pub passed: bool,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Create a passing report
    #[must_use]
    pub fn pass(name: impl Into<String>, step: WizardStep) -> Self {
        Self {
            name: name.into(),
            step,
            passed: true,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Create a failing report
    #[must_use]
    pub fn fail(name: impl Into<String>, step: WizardStep, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step,
            passed: false,
            error: Some(error.into()),
            elapsed_ms: 0,
        }
    }

    /// Set elapsed time
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Outcome of a suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Language the wizard was opened in
    pub language: LanguageTag,
    /// Seed of the generator used for random picks
    pub seed: u64,
    /// Per-scenario outcomes, in run order
    pub results: Vec<ScenarioReport>,
    /// Wall time of the whole run
    pub elapsed_ms: u64,
}

impl SuiteReport {
    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// Runs scenarios one after another against one controller
#[derive(Debug)]
pub struct ScenarioRunner {
    base_url: String,
    language: LanguageTag,
    filter: Option<String>,
    fail_fast: bool,
    generator: RequirementsGenerator,
}

impl ScenarioRunner {
    /// Runner opening the wizard below `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>, generator: RequirementsGenerator) -> Self {
        Self {
            base_url: base_url.into(),
            language: LanguageTag::EnUs,
            filter: None,
            fail_fast: false,
            generator,
        }
    }

    /// Language the wizard is opened in
    #[must_use]
    pub const fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = language;
        self
    }

    /// Only run scenarios whose name contains `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Stop at the first failing scenario
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Run the suite
    pub async fn run<D: FormDriver>(
        &mut self,
        form: &mut FormController<D>,
        suite: &ScenarioSuite,
    ) -> SuiteReport {
        self.run_with_progress(form, suite, |_| {}).await
    }

    /// Run the suite, calling `on_done` after each scenario
    pub async fn run_with_progress<D, F>(
        &mut self,
        form: &mut FormController<D>,
        suite: &ScenarioSuite,
        mut on_done: F,
    ) -> SuiteReport
    where
        D: FormDriver,
        F: FnMut(&ScenarioReport),
    {
        let start = Instant::now();
        let scenarios = suite.filtered(self.filter.as_deref());
        info!(suite = %suite.name, scenarios = scenarios.len(), language = %self.language, "running suite");

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let report = self.run_one(form, scenario).await;
            on_done(&report);
            let failed = !report.passed;
            results.push(report);
            if failed && self.fail_fast {
                break;
            }
        }

        let report = SuiteReport {
            suite_name: suite.name.clone(),
            language: self.language,
            seed: self.generator.seed(),
            results,
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "suite finished"
        );
        report
    }

    /// Number of scenarios of `suite` this runner would run
    #[must_use]
    pub fn planned(&self, suite: &ScenarioSuite) -> usize {
        suite.filtered(self.filter.as_deref()).len()
    }

    /// Run a single scenario from a fresh session
    async fn run_one<D: FormDriver>(
        &mut self,
        form: &mut FormController<D>,
        scenario: &Scenario,
    ) -> ScenarioReport {
        let start = Instant::now();
        let outcome = match self.prepare(form, scenario.step()).await {
            Ok(()) => self.execute(form, &scenario.kind).await,
            Err(e) => Err(e),
        };
        let report = match outcome {
            Ok(()) => {
                info!(scenario = %scenario.name, "passed");
                ScenarioReport::pass(&scenario.name, scenario.step())
            }
            Err(e) => {
                warn!(scenario = %scenario.name, error = %e, "failed");
                ScenarioReport::fail(&scenario.name, scenario.step(), e.to_string())
            }
        };
        report.with_elapsed(start.elapsed())
    }

    /// Open the step, wipe stored answers and reload so the wizard starts
    /// from its initial state
    async fn prepare<D: FormDriver>(
        &self,
        form: &mut FormController<D>,
        step: WizardStep,
    ) -> ProbeResult<()> {
        form.goto_step(&self.base_url, step, self.language).await?;
        form.driver.clear_session().await?;
        form.driver.reload().await?;
        form.driver.discard_responses().await
    }

    async fn execute<D: FormDriver>(
        &mut self,
        form: &mut FormController<D>,
        kind: &ScenarioKind,
    ) -> ProbeResult<()> {
        match kind {
            ScenarioKind::EnterAmount { amount } => {
                form.fill_amount(amount).await?;
                form.driver.click(&Locator::new("body")).await?;
                let locale = form.locale().await?;
                form.verify_amount(amount, locale).await?;
                expect_submit(form, SubmitState::Incomplete).await
            }
            ScenarioKind::DragSlider => {
                let drag = form.drag_slider_full_range().await?;
                if !drag.changed() {
                    return Err(ProbeError::mismatch(
                        "sliderAmount",
                        format!("a value other than {}", drag.initial),
                        drag.updated,
                    ));
                }
                Ok(())
            }
            ScenarioKind::SelectDropdown { field, label } => {
                form.select_option(field, label).await?;
                form.verify_dropdown(field, label).await?;
                expect_submit(form, SubmitState::Incomplete).await
            }
            ScenarioKind::CompleteForm { payload } => {
                expect_submit(form, SubmitState::Incomplete).await?;
                form.fill_then_assert(payload).await?;
                expect_submit(form, SubmitState::Complete).await
            }
            ScenarioKind::NavigateNext { payload } => {
                expect_submit(form, SubmitState::Incomplete).await?;
                let location = form.fill_then_navigate_forward(payload).await?;
                if WizardStep::from_url(&location) != Some(WizardStep::Contact) {
                    return Err(ProbeError::mismatch(
                        "location",
                        format!("a {} location", WizardStep::Contact),
                        location,
                    ));
                }
                Ok(())
            }
            ScenarioKind::GoBack { payload } => form.fill_then_navigate_back(payload).await.map(drop),
            ScenarioKind::RetainOnReload { payload } => form.fill_then_reload(payload).await,
            ScenarioKind::CompanyDetails { term } => {
                form.quick_company_search(term).await?;
                let info = form.await_company_information().await?;
                form.verify_company_details(&info).await
            }
            ScenarioKind::DirectorPrefill { term } => {
                form.quick_company_search(term).await?;
                let info = form.await_company_information().await?;
                let director = pick_director(&info.people, &mut self.generator)
                    .cloned()
                    .ok_or_else(|| {
                        ProbeError::mismatch("director", format!("a director of {}", info.name), "none listed")
                    })?;
                form.select_director(&director.full_name).await?;
                form.verify_director_prefill(&director).await
            }
            ScenarioKind::PersonalDetails { term, details } => {
                form.quick_company_search(term).await?;
                form.fill_personal_details(details).await?;
                form.verify_personal_details(details).await?;
                if details.accept_terms {
                    expect_submit(form, SubmitState::Complete).await?;
                }
                Ok(())
            }
        }
    }
}

async fn expect_submit<D: FormDriver>(
    form: &FormController<D>,
    expected: SubmitState,
) -> ProbeResult<()> {
    let actual = form.submit_state().await?;
    if actual != expected {
        return Err(ProbeError::mismatch(
            "submitState",
            expected.to_string(),
            actual.to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::mock::MockDriver;
    use crate::wait::WaitOptions;
    use std::sync::Arc;

    const BASE: &str = "https://my.bridgefund.nl";

    fn controller(driver: MockDriver) -> FormController<MockDriver> {
        FormController::new(driver, Arc::new(Catalog::builtin().unwrap()))
            .with_wait_options(WaitOptions::new().with_timeout(50).with_poll_interval(5))
    }

    mod suite_tests {
        use super::*;

        #[test]
        fn test_standard_suite_layout() {
            let suite = ScenarioSuite::standard(&reference_payload());
            assert_eq!(suite.len(), 13);
            assert_eq!(suite.scenarios[0].name, "amount/enter-amount");
            assert_eq!(suite.scenarios[6].name, "amount/complete-form");
            assert_eq!(suite.scenarios[12].name, "contact/personal-details");
            assert_eq!(
                suite.scenarios.iter().filter(|s| s.step() == WizardStep::Contact).count(),
                3
            );
        }

        #[test]
        fn test_filter_is_case_insensitive() {
            let suite = ScenarioSuite::standard(&reference_payload());
            let picked = suite.filtered(Some("DROPDOWN"));
            assert_eq!(picked.len(), 4);
            assert!(suite.filtered(Some("nothing-like-this")).is_empty());
            assert_eq!(suite.filtered(None).len(), suite.len());
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let report = SuiteReport {
                suite_name: "s".to_string(),
                language: LanguageTag::EnUs,
                seed: 1,
                results: vec![
                    ScenarioReport::pass("a", WizardStep::Amount),
                    ScenarioReport::fail("b", WizardStep::Contact, "boom"),
                ],
                elapsed_ms: 3,
            };
            assert!(!report.all_passed());
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failures()[0].name, "b");
        }

        #[test]
        fn test_serializes_step_and_skips_missing_error() {
            let json = serde_json::to_value(ScenarioReport::pass("a", WizardStep::Amount)).unwrap();
            assert_eq!(json["step"], "amount");
            assert!(json.get("error").is_none());
        }
    }

    mod runner_tests {
        use super::*;

        #[tokio::test]
        async fn test_standard_suite_passes_on_both_languages() {
            for language in [LanguageTag::EnUs, LanguageTag::NlNl] {
                let mut form = controller(MockDriver::new());
                let mut runner = ScenarioRunner::new(BASE, RequirementsGenerator::with_seed(3))
                    .with_language(language);
                let report = runner
                    .run(&mut form, &ScenarioSuite::standard(&reference_payload()))
                    .await;
                assert!(report.all_passed(), "{:?}", report.failures());
                assert_eq!(report.total(), 13);
            }
        }

        #[tokio::test]
        async fn test_failure_is_recorded_and_run_continues() {
            let mut form = controller(MockDriver::new().without_persistence());
            let mut runner = ScenarioRunner::new(BASE, RequirementsGenerator::with_seed(3));
            let report = runner
                .run(&mut form, &ScenarioSuite::standard(&reference_payload()))
                .await;
            let failed: Vec<_> = report.failures().iter().map(|r| r.name.as_str()).collect();
            assert_eq!(failed, ["amount/go-back", "amount/retain-on-reload"]);
            assert_eq!(report.total(), 13);
        }

        #[tokio::test]
        async fn test_complete_form_sees_submit_enable() {
            let mut form = controller(MockDriver::new());
            let mut runner = ScenarioRunner::new(BASE, RequirementsGenerator::with_seed(3))
                .with_filter("complete-form");
            let report = runner
                .run(&mut form, &ScenarioSuite::standard(&reference_payload()))
                .await;
            assert_eq!(report.total(), 1);
            assert!(report.all_passed(), "{:?}", report.failures());
            assert!(form.location().await.unwrap().contains("/amount"));
        }

        #[tokio::test]
        async fn test_progress_sees_every_scenario_in_order() {
            let suite = ScenarioSuite::standard(&reference_payload());
            let mut form = controller(MockDriver::new());
            let mut runner =
                ScenarioRunner::new(BASE, RequirementsGenerator::with_seed(3)).with_filter("amount/");
            let planned = runner.planned(&suite);
            let mut seen = Vec::new();
            let report = runner
                .run_with_progress(&mut form, &suite, |r| seen.push(r.name.clone()))
                .await;
            assert_eq!(planned, 10);
            assert_eq!(seen.len(), planned);
            let names: Vec<_> = report.results.iter().map(|r| r.name.clone()).collect();
            assert_eq!(seen, names);
        }

        #[tokio::test]
        async fn test_fail_fast_stops() {
            let mut form = controller(MockDriver::new().without_slider_geometry());
            let mut runner =
                ScenarioRunner::new(BASE, RequirementsGenerator::with_seed(3)).with_fail_fast();
            let report = runner
                .run(&mut form, &ScenarioSuite::standard(&reference_payload()))
                .await;
            assert_eq!(report.total(), 2);
            assert!(report.results[1].error.as_deref().unwrap().contains("No bounding box"));
        }

        #[tokio::test]
        async fn test_each_scenario_starts_from_fresh_session() {
            let mut form = controller(MockDriver::new());
            let mut runner =
                ScenarioRunner::new(BASE, RequirementsGenerator::with_seed(3)).with_filter("reload");
            let report = runner
                .run(&mut form, &ScenarioSuite::standard(&reference_payload()))
                .await;
            assert!(report.all_passed());
            let history = form.driver().history();
            let clear = history.iter().position(|c| c == "clear_session").unwrap();
            assert!(history[..clear].iter().any(|c| c.starts_with("navigate:")));
            assert_eq!(history[clear + 1], "reload");
        }
    }
}
