//! Navigation/Persistence Checker
//!
//! Fill the amount step, leave it one way or another, let the page settle,
//! and check the step still shows what was entered. Settlement is the
//! analytics beacon, except on back navigation where the amount input
//! reappearing is awaited instead.

use tracing::info;

use crate::controller::FormController;
use crate::driver::FormDriver;
use crate::interaction::SubmitState;
use crate::page_object::{AmountPage, WizardStep};
use crate::payload::RequirementsPayload;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for_settlement, wait_for_url_change, wait_for_visible};

impl<D: FormDriver> FormController<D> {
    /// Fill, then verify without leaving the page
    pub async fn fill_then_assert(&mut self, payload: &RequirementsPayload) -> ProbeResult<()> {
        self.complete_form(payload).await?;
        self.verify_form(payload).await
    }

    /// Fill, verify, and submit the step. Returns the new location.
    ///
    /// The amount controls are not rendered on the next step, so the form is
    /// verified before leaving; the submit affordance must be enabled.
    pub async fn fill_then_navigate_forward(
        &mut self,
        payload: &RequirementsPayload,
    ) -> ProbeResult<String> {
        self.fill_then_assert(payload).await?;
        let state = self.submit_state().await?;
        if !state.is_complete() {
            return Err(ProbeError::mismatch(
                "submitState",
                SubmitState::Complete.to_string(),
                state.to_string(),
            ));
        }

        let from = self.location().await?;
        self.driver.discard_responses().await?;
        self.driver.click(&AmountPage::next_button()).await?;
        let location = wait_for_url_change(&self.driver, &from, &self.wait).await?;
        wait_for_settlement(&mut self.driver, &self.wait).await?;
        info!(%location, "navigated forward");
        Ok(location)
    }

    /// Fill, go forward, come back with the in-page previous button and
    /// verify. Returns the location after coming back.
    pub async fn fill_then_navigate_back(
        &mut self,
        payload: &RequirementsPayload,
    ) -> ProbeResult<String> {
        let forward = self.fill_then_navigate_forward(payload).await?;

        self.driver.discard_responses().await?;
        let previous = AmountPage::previous_button();
        wait_for_visible(&self.driver, &previous, &self.wait).await?;
        self.driver.click(&previous).await?;
        wait_for_visible(&self.driver, &AmountPage::amount_input(), &self.wait).await?;

        let location = self.location().await?;
        if location == forward || WizardStep::from_url(&location) != Some(WizardStep::Amount) {
            return Err(ProbeError::mismatch(
                "location",
                format!("an {} location other than {forward}", WizardStep::Amount),
                location,
            ));
        }
        info!(%location, "navigated back");
        self.verify_form(payload).await?;
        Ok(location)
    }

    /// Fill, reload the page and verify
    pub async fn fill_then_reload(&mut self, payload: &RequirementsPayload) -> ProbeResult<()> {
        self.complete_form(payload).await?;
        self.driver.discard_responses().await?;
        self.driver.reload().await?;
        wait_for_settlement(&mut self.driver, &self.wait).await?;
        info!("reloaded");
        self.verify_form(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::generator::RequirementsGenerator;
    use crate::locale::LanguageTag;
    use crate::mock::MockDriver;
    use crate::payload::Selection;
    use crate::wait::WaitOptions;
    use std::sync::Arc;

    fn payload() -> RequirementsPayload {
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

    async fn on_amount(driver: MockDriver, language: LanguageTag) -> FormController<MockDriver> {
        let mut form = FormController::new(driver, Arc::new(Catalog::builtin().unwrap()))
            .with_wait_options(WaitOptions::new().with_timeout(50).with_poll_interval(5));
        form.goto_step("https://my.bridgefund.nl", WizardStep::Amount, language)
            .await
            .unwrap();
        form
    }

    mod forward_tests {
        use super::*;

        #[tokio::test]
        async fn test_forward_reaches_contact() {
            let mut form = on_amount(MockDriver::new(), LanguageTag::EnUs).await;
            let location = form.fill_then_navigate_forward(&payload()).await.unwrap();
            assert!(location.contains("contact"));
        }

        #[tokio::test]
        async fn test_forward_returns_the_new_location() {
            let mut form = on_amount(MockDriver::new(), LanguageTag::NlNl).await;
            let start = form.location().await.unwrap();
            let location = form.fill_then_navigate_forward(&payload()).await.unwrap();
            assert_ne!(location, start);
            assert_eq!(location, form.location().await.unwrap());
        }

        #[tokio::test]
        async fn test_forward_with_incomplete_payload() {
            let mut form = on_amount(MockDriver::new(), LanguageTag::EnUs).await;
            let mut partial = payload();
            partial.selections.truncate(2);
            let err = form.fill_then_navigate_forward(&partial).await.unwrap_err();
            assert!(err.to_string().contains("submitState"));
        }

        #[tokio::test]
        async fn test_forward_without_beacon_times_out() {
            let mut form = on_amount(MockDriver::new().without_telemetry(), LanguageTag::EnUs).await;
            let err = form.fill_then_navigate_forward(&payload()).await.unwrap_err();
            match err {
                ProbeError::WaitTimeout { address, .. } => assert_eq!(address, "**/g/collect?*"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod back_tests {
        use super::*;

        #[tokio::test]
        async fn test_back_returns_to_amount_and_verifies() {
            let mut form = on_amount(MockDriver::new(), LanguageTag::NlNl).await;
            let location = form.fill_then_navigate_back(&payload()).await.unwrap();
            assert!(location.contains("amount"));
            assert!(form.driver().was_called("click:gr-button.button-secondary"));
        }

        #[tokio::test]
        async fn test_back_detects_lost_answers() {
            let mut form = on_amount(MockDriver::new().without_persistence(), LanguageTag::EnUs).await;
            let err = form.fill_then_navigate_back(&payload()).await.unwrap_err();
            assert!(err.is_mismatch());
        }
    }

    mod reload_tests {
        use super::*;

        #[tokio::test]
        async fn test_reload_keeps_answers() {
            let mut form = on_amount(MockDriver::new(), LanguageTag::EnUs).await;
            form.fill_then_reload(&payload()).await.unwrap();
            assert!(form.driver().was_called("reload"));
        }

        #[tokio::test]
        async fn test_reload_detects_lost_answers() {
            let mut form = on_amount(MockDriver::new().without_persistence(), LanguageTag::EnUs).await;
            let err = form.fill_then_reload(&payload()).await.unwrap_err();
            match err {
                ProbeError::AssertionMismatch { field, actual, .. } => {
                    assert_eq!(field, "loanAmount");
                    assert_eq!(actual, "25,000");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_generated_payloads_survive_reload() {
            let catalog = Catalog::builtin().unwrap();
            let mut generator = RequirementsGenerator::with_seed(7);
            for _ in 0..5 {
                let payload = generator.generate_requirements(&catalog).unwrap();
                let mut form = on_amount(MockDriver::new(), LanguageTag::NlNl).await;
                form.fill_then_reload(&payload).await.unwrap();
            }
        }
    }
}
