//! Contact step operations: company lookup, director choice and personal
//! details.
//!
//! Expected values come from the lookup service's own responses, captured
//! while the page calls it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::controller::FormController;
use crate::driver::FormDriver;
use crate::generator::RequirementsGenerator;
use crate::locator::Locator;
use crate::network::{
    CompanyInformation, CompanyInformationResponse, CompanySearchResponse, CompanySummary, Person,
    UrlPattern,
};
use crate::page_object::ContactPage;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::wait_for_visible;

/// Script reading a checkbox's checked state
const CHECKED_SCRIPT: &str = "el => el.checked";

/// What the applicant types into the contact step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Phone number without country prefix
    pub phone: String,
    /// Subscribe to marketing email
    #[serde(default)]
    pub email_opt_in: bool,
    /// Accept the terms and conditions
    #[serde(default)]
    pub accept_terms: bool,
}

impl PersonalDetails {
    /// Details with both checkboxes left unticked
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
            email_opt_in: false,
            accept_terms: false,
        }
    }

    /// Tick the marketing opt-in
    #[must_use]
    pub const fn with_email_opt_in(mut self, opt_in: bool) -> Self {
        self.email_opt_in = opt_in;
        self
    }

    /// Tick the terms and conditions
    #[must_use]
    pub const fn with_terms_accepted(mut self, accepted: bool) -> Self {
        self.accept_terms = accepted;
        self
    }
}

/// Uniform pick of a director
pub fn pick_director<'a>(
    people: &'a [Person],
    generator: &mut RequirementsGenerator,
) -> Option<&'a Person> {
    generator.pick_index(people.len()).map(|i| &people[i])
}

impl<D: FormDriver> FormController<D> {
    /// Type `term` into the company search, wait for the lookup, and click
    /// the first result carrying the top hit's name. Returns the top hit.
    pub async fn quick_company_search(&mut self, term: &str) -> ProbeResult<CompanySummary> {
        let input = ContactPage::search_input();
        wait_for_visible(&self.driver, &input, &self.wait).await?;
        self.driver.fill(&input, term).await?;

        let response = self
            .driver
            .wait_for_response(&UrlPattern::company_search(term), self.wait.settlement_timeout())
            .await?;
        let results: CompanySearchResponse = response.json()?;
        let top = results.data.into_iter().next().ok_or_else(|| {
            ProbeError::mismatch("companySearch", format!("a company matching '{term}'"), "no results")
        })?;

        let result = ContactPage::search_result(&top.name);
        wait_for_visible(&self.driver, &result, &self.wait).await?;
        self.driver.click(&result).await?;
        info!(term, company = %top.name, "company selected");
        Ok(top)
    }

    /// Details of the selected company, as the lookup service returned them
    pub async fn await_company_information(&mut self) -> ProbeResult<CompanyInformation> {
        let response = self
            .driver
            .wait_for_response(&UrlPattern::company_information(), self.wait.settlement_timeout())
            .await?;
        let info: CompanyInformationResponse = response.json()?;
        debug!(coc = %info.data.coc_number, people = info.data.people.len(), "company information received");
        Ok(info.data)
    }

    /// Click the director radio labelled `full_name`
    pub async fn select_director(&mut self, full_name: &str) -> ProbeResult<()> {
        let radio = ContactPage::director(full_name);
        wait_for_visible(&self.driver, &radio, &self.wait).await?;
        self.driver.click(&radio).await
    }

    /// The page must show the company's name, and its details block must
    /// mention the chamber of commerce number and full address
    pub async fn verify_company_details(&self, info: &CompanyInformation) -> ProbeResult<()> {
        let name = ContactPage::company_name();
        wait_for_visible(&self.driver, &name, &self.wait).await?;
        let shown = self.driver.text_content(&name).await?.unwrap_or_default();
        if shown.trim() != info.name {
            return Err(ProbeError::mismatch("companyName", &info.name, shown.trim()));
        }

        let details = self
            .driver
            .text_content(&ContactPage::company_details())
            .await?
            .unwrap_or_default();
        let expected = [
            ("cocNumber", &info.coc_number),
            ("addressLine", &info.address.address_line),
            ("postalCode", &info.address.postal_code),
            ("city", &info.address.city),
        ];
        for (field, value) in expected {
            if !details.contains(value.as_str()) {
                return Err(ProbeError::mismatch(field, value, details));
            }
        }
        Ok(())
    }

    /// Name inputs must hold the director's first and last name
    pub async fn verify_director_prefill(&self, director: &Person) -> ProbeResult<()> {
        self.expect_value("userFirstName", &ContactPage::first_name_input(), &director.first_name)
            .await?;
        self.expect_value("userLastName", &ContactPage::last_name_input(), &director.last_name)
            .await
    }

    /// Type the personal details and set both checkboxes
    pub async fn fill_personal_details(&mut self, details: &PersonalDetails) -> ProbeResult<()> {
        let inputs = [
            (ContactPage::first_name_input(), &details.first_name),
            (ContactPage::last_name_input(), &details.last_name),
            (ContactPage::email_input(), &details.email),
            (ContactPage::phone_input(), &details.phone),
        ];
        for (input, value) in &inputs {
            wait_for_visible(&self.driver, input, &self.wait).await?;
            self.driver.fill(input, value).await?;
        }
        self.driver.click(&Locator::new("body")).await?;

        self.set_checked(&ContactPage::email_opt_in(), details.email_opt_in)
            .await?;
        self.set_checked(&ContactPage::terms_checkbox(), details.accept_terms)
            .await?;
        info!(email = %details.email, "personal details entered");
        Ok(())
    }

    /// Inputs and checkboxes must hold the personal details
    pub async fn verify_personal_details(&self, details: &PersonalDetails) -> ProbeResult<()> {
        self.expect_value("userFirstName", &ContactPage::first_name_input(), &details.first_name)
            .await?;
        self.expect_value("userLastName", &ContactPage::last_name_input(), &details.last_name)
            .await?;
        self.expect_value("userEmail", &ContactPage::email_input(), &details.email)
            .await?;
        self.expect_value("phoneNumber", &ContactPage::phone_input(), &details.phone)
            .await?;
        for (field, checkbox, expected) in [
            ("emailOptIn", ContactPage::email_opt_in(), details.email_opt_in),
            ("agreeToTermsAndConditions", ContactPage::terms_checkbox(), details.accept_terms),
        ] {
            let actual = self.is_checked(&checkbox).await?;
            if actual != expected {
                return Err(ProbeError::mismatch(field, expected.to_string(), actual.to_string()));
            }
        }
        Ok(())
    }

    async fn expect_value(&self, field: &str, input: &Locator, expected: &str) -> ProbeResult<()> {
        wait_for_visible(&self.driver, input, &self.wait).await?;
        let actual = self.driver.input_value(input).await?;
        if actual != expected {
            return Err(ProbeError::mismatch(field, expected, actual));
        }
        Ok(())
    }

    async fn is_checked(&self, checkbox: &Locator) -> ProbeResult<bool> {
        let value = self.driver.evaluate_on(checkbox, CHECKED_SCRIPT).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn set_checked(&mut self, checkbox: &Locator, checked: bool) -> ProbeResult<()> {
        wait_for_visible(&self.driver, checkbox, &self.wait).await?;
        if self.is_checked(checkbox).await? != checked {
            self.driver.click(checkbox).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::interaction::SubmitState;
    use crate::locale::LanguageTag;
    use crate::mock::MockDriver;
    use crate::page_object::WizardStep;
    use crate::wait::WaitOptions;
    use std::sync::Arc;

    async fn on_contact() -> FormController<MockDriver> {
        let mut form = FormController::new(MockDriver::new(), Arc::new(Catalog::builtin().unwrap()))
            .with_wait_options(WaitOptions::new().with_timeout(50).with_poll_interval(5));
        form.goto_step("https://my.bridgefund.nl", WizardStep::Contact, LanguageTag::EnUs)
            .await
            .unwrap();
        form
    }

    fn john_wick() -> PersonalDetails {
        PersonalDetails::new("John", "Wick", "johnwick@gmail.com", "612198201")
    }

    mod company_tests {
        use super::*;

        #[tokio::test]
        async fn test_search_by_keyword_shows_details() {
            let mut form = on_contact().await;
            let top = form.quick_company_search("Technology").await.unwrap();
            let info = form.await_company_information().await.unwrap();
            assert_eq!(info.name, top.name);
            form.verify_company_details(&info).await.unwrap();
        }

        #[tokio::test]
        async fn test_details_mismatch_names_field() {
            let mut form = on_contact().await;
            form.quick_company_search("70304580").await.unwrap();
            let mut info = form.await_company_information().await.unwrap();
            info.address.city = "Rotterdam".to_string();
            let err = form.verify_company_details(&info).await.unwrap_err();
            assert!(err.to_string().contains("'city'"));
        }

        #[tokio::test]
        async fn test_search_without_hits() {
            let mut form = on_contact().await;
            let err = form.quick_company_search("99999999").await.unwrap_err();
            assert!(err.to_string().contains("no results"));
        }
    }

    mod director_tests {
        use super::*;

        #[tokio::test]
        async fn test_director_prefills_names() {
            let mut form = on_contact().await;
            form.quick_company_search("70304580").await.unwrap();
            let info = form.await_company_information().await.unwrap();
            let mut generator = RequirementsGenerator::with_seed(11);
            let director = pick_director(&info.people, &mut generator).unwrap().clone();
            form.select_director(&director.full_name).await.unwrap();
            form.verify_director_prefill(&director).await.unwrap();
        }

        #[test]
        fn test_pick_director_of_nobody() {
            let mut generator = RequirementsGenerator::with_seed(1);
            assert!(pick_director(&[], &mut generator).is_none());
        }
    }

    mod personal_details_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_and_verify() {
            let mut form = on_contact().await;
            form.quick_company_search("34095964").await.unwrap();
            let details = john_wick().with_terms_accepted(true);
            form.fill_personal_details(&details).await.unwrap();
            form.verify_personal_details(&details).await.unwrap();
            assert_eq!(form.submit_state().await.unwrap(), SubmitState::Complete);
        }

        #[tokio::test]
        async fn test_unticked_terms_keep_submit_disabled() {
            let mut form = on_contact().await;
            form.quick_company_search("34095964").await.unwrap();
            form.fill_personal_details(&john_wick()).await.unwrap();
            assert_eq!(form.submit_state().await.unwrap(), SubmitState::Incomplete);
        }

        #[tokio::test]
        async fn test_checkbox_mismatch() {
            let mut form = on_contact().await;
            form.fill_personal_details(&john_wick()).await.unwrap();
            let err = form
                .verify_personal_details(&john_wick().with_email_opt_in(true))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("emailOptIn"));
        }
    }
}
