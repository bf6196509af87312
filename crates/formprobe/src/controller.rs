//! Form controller: the entry point for driving and verifying the wizard.
//!
//! # Example
//!
//! ```ignore
//! let catalog = Arc::new(Catalog::builtin()?);
//! let mut form = FormController::new(MockDriver::new(), catalog);
//! form.goto_step("https://my.bridgefund.nl", WizardStep::Amount, LanguageTag::EnUs).await?;
//! form.fill_then_reload(&payload).await?;
//! ```
//!
//! Interaction, verification, persistence checks and the contact step are
//! implemented on this type in their own modules.

use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::driver::FormDriver;
use crate::label::LabelStrategies;
use crate::locale::{LanguageTag, LocaleContext};
use crate::page_object::WizardStep;
use crate::result::ProbeResult;
use crate::wait::{wait_for_visible, WaitOptions};

/// Drives one browser page through the wizard
#[derive(Debug)]
pub struct FormController<D: FormDriver> {
    pub(crate) driver: D,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) labels: LabelStrategies,
    pub(crate) wait: WaitOptions,
}

impl<D: FormDriver> FormController<D> {
    /// Create controller with existing driver
    pub fn new(driver: D, catalog: Arc<Catalog>) -> Self {
        Self {
            driver,
            catalog,
            labels: LabelStrategies::default(),
            wait: WaitOptions::default(),
        }
    }

    /// Set the label strategies used by dropdown verification
    #[must_use]
    pub fn with_labels(mut self, labels: LabelStrategies) -> Self {
        self.labels = labels;
        self
    }

    /// Set wait bounds
    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Get the driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Get the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Shared catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Wait bounds
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Navigate to URL
    pub async fn goto(&mut self, url: &str) -> ProbeResult<()> {
        info!(url, "navigating");
        self.driver.navigate(url).await
    }

    /// Navigate to a wizard step below `base_url` and wait until it renders
    pub async fn goto_step(
        &mut self,
        base_url: &str,
        step: WizardStep,
        language: LanguageTag,
    ) -> ProbeResult<()> {
        self.goto(&step.url(base_url, language)).await?;
        wait_for_visible(&self.driver, &step.ready_marker(), &self.wait).await?;
        Ok(())
    }

    /// Current location
    pub async fn location(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    /// Locale of the current location; read fresh on every call
    pub async fn locale(&self) -> ProbeResult<LocaleContext> {
        Ok(LocaleContext::from_url(&self.driver.current_url().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    fn controller() -> FormController<MockDriver> {
        FormController::new(MockDriver::new(), Arc::new(Catalog::builtin().unwrap()))
    }

    #[tokio::test]
    async fn test_goto_step() {
        let mut form = controller();
        form.goto_step("https://my.bridgefund.nl/", WizardStep::Contact, LanguageTag::NlNl)
            .await
            .unwrap();
        assert_eq!(
            form.location().await.unwrap(),
            "https://my.bridgefund.nl/nl/nl/request-loan/contact"
        );
    }

    #[tokio::test]
    async fn test_goto_step_returns_once_step_renders() {
        let mut form = controller().with_wait_options(WaitOptions::new().with_timeout(20));
        for step in WizardStep::ALL {
            form.goto_step("https://my.bridgefund.nl", step, LanguageTag::EnUs)
                .await
                .unwrap();
            assert!(form.driver().is_visible(&step.ready_marker()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_locale_follows_location() {
        let mut form = controller();
        form.goto_step("https://my.bridgefund.nl", WizardStep::Amount, LanguageTag::EnUs)
            .await
            .unwrap();
        assert_eq!(form.locale().await.unwrap(), LocaleContext::en_us());
        form.goto_step("https://my.bridgefund.nl", WizardStep::Amount, LanguageTag::NlNl)
            .await
            .unwrap();
        assert_eq!(form.locale().await.unwrap(), LocaleContext::nl_nl());
    }

    #[test]
    fn test_builder() {
        let form = controller().with_wait_options(WaitOptions::new().with_timeout(10));
        assert_eq!(form.wait_options().timeout_ms, 10);
        assert!(form.catalog().contains_field("loanGoal"));
        assert!(form.driver().history().is_empty());
    }
}
