//! Form State Verifier
//!
//! Re-reads what the amount step displays and compares it with a payload.
//! The first difference ends the verification.

use tracing::debug;

use crate::controller::FormController;
use crate::driver::FormDriver;
use crate::locale::{format_amount_str, LocaleContext};
use crate::page_object::AmountPage;
use crate::payload::RequirementsPayload;
use crate::resolver::resolve_control_address;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::wait_for_visible;

/// Field name reported for amount mismatches
pub const AMOUNT_FIELD: &str = "loanAmount";

impl<D: FormDriver> FormController<D> {
    /// The numeral input must show exactly `format_amount(expected, locale)`
    pub async fn verify_amount(&self, expected: &str, locale: LocaleContext) -> ProbeResult<()> {
        let expected = format_amount_str(expected, locale)?;
        let input = AmountPage::amount_input();
        wait_for_visible(&self.driver, &input, &self.wait).await?;
        let actual = self.driver.input_value(&input).await?;
        if actual != expected {
            return Err(ProbeError::mismatch(AMOUNT_FIELD, expected, actual));
        }
        Ok(())
    }

    /// Label a dropdown displays, read with the family's strategy
    pub async fn read_dropdown_label(&self, field: &str) -> ProbeResult<String> {
        let control = resolve_control_address(field);
        wait_for_visible(&self.driver, &control, &self.wait).await?;
        let strategy = self.labels.for_field(&self.catalog, field);
        let label = strategy.read_label(&self.driver, &control).await?;
        debug!(field, strategy = strategy.name(), %label, "dropdown label read");
        Ok(label)
    }

    /// The dropdown of `field` must display `expected`
    pub async fn verify_dropdown(&self, field: &str, expected: &str) -> ProbeResult<()> {
        let actual = self.read_dropdown_label(field).await?;
        if actual != expected {
            return Err(ProbeError::mismatch(field, expected, actual));
        }
        Ok(())
    }

    /// Amount first, then every selection in payload order
    pub async fn verify_form(&self, payload: &RequirementsPayload) -> ProbeResult<()> {
        let locale = self.locale().await?;
        self.verify_amount(&payload.loan_amount, locale).await?;
        for selection in &payload.selections {
            self.verify_dropdown(&selection.field, &selection.value).await?;
        }
        debug!("amount step verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, DropdownFamily};
    use crate::label::{LabelStrategies, ShadowStateLabel};
    use crate::locale::LanguageTag;
    use crate::mock::MockDriver;
    use crate::page_object::WizardStep;
    use crate::payload::Selection;
    use std::sync::Arc;

    fn payload() -> RequirementsPayload {
        RequirementsPayload::new(
            "12000",
            vec![
                Selection::new("loanPeriods", "Withdraw in installments"),
                Selection::new("companyRevenue", "Less than €25.000"),
                Selection::new("loanDeadline", "No rush"),
                Selection::new("loanGoal", "Vehicles"),
            ],
        )
    }

    async fn filled(language: LanguageTag) -> FormController<MockDriver> {
        let mut form = FormController::new(MockDriver::new(), Arc::new(Catalog::builtin().unwrap()));
        form.goto_step("https://my.bridgefund.nl", WizardStep::Amount, language)
            .await
            .unwrap();
        form.complete_form(&payload()).await.unwrap();
        form
    }

    #[tokio::test]
    async fn test_verify_form_passes() {
        filled(LanguageTag::EnUs).await.verify_form(&payload()).await.unwrap();
        filled(LanguageTag::NlNl).await.verify_form(&payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_amount_in_wrong_locale_mismatches() {
        let form = filled(LanguageTag::NlNl).await;
        let err = form.verify_amount("12000", LocaleContext::en_us()).await.unwrap_err();
        match err {
            ProbeError::AssertionMismatch { field, expected, actual } => {
                assert_eq!(field, "loanAmount");
                assert_eq!(expected, "12,000");
                assert_eq!(actual, "12.000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_dropdown_mismatch_reports_stripped_label() {
        let form = filled(LanguageTag::EnUs).await;
        let err = form.verify_dropdown("loanGoal", "Equity").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mismatch on 'loanGoal': expected 'Equity' but got 'Vehicles'"
        );
    }

    #[tokio::test]
    async fn test_fails_fast_on_first_difference() {
        let form = filled(LanguageTag::EnUs).await;
        let mut expected = payload();
        expected.selections[1].value = "More than €1.000.000".to_string();
        expected.selections[3].value = "Other".to_string();
        let err = form.verify_form(&expected).await.unwrap_err();
        assert!(err.to_string().contains("companyRevenue"));
    }

    #[tokio::test]
    async fn test_shadow_state_strategy_agrees() {
        let form = filled(LanguageTag::EnUs)
            .await
            .with_labels(LabelStrategies::new().with(DropdownFamily::LoanDeadline, Arc::new(ShadowStateLabel::default())));
        assert_eq!(form.read_dropdown_label("loanDeadline").await.unwrap(), "No rush");
        form.verify_form(&payload()).await.unwrap();
    }
}
