//! Page objects of the loan wizard.
//!
//! Each step of the wizard gets a page object owning its locators, so the
//! interaction and verification code never spells a selector twice.

use serde::{Deserialize, Serialize};

use crate::locale::LanguageTag;
use crate::locator::Locator;
use crate::network::UrlPattern;
use crate::resolver::resolve_control_address;

/// Trait for page objects representing a page of the wizard.
pub trait PageObject {
    /// URL pattern that matches this page (glob, e.g. `**/request-loan/amount*`)
    fn url_pattern(&self) -> &str;

    /// Element whose visibility marks the page as ready for interaction
    fn ready_marker(&self) -> Locator;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Check if a URL belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        UrlPattern::glob(self.url_pattern()).matches(url)
    }
}

/// Steps of the wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    /// Loan amount and requirements
    Amount,
    /// Company and personal details
    Contact,
}

impl WizardStep {
    /// All steps, in wizard order
    pub const ALL: [Self; 2] = [Self::Amount, Self::Contact];

    /// Last path segment of the step
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Contact => "contact",
        }
    }

    /// Site-relative path, e.g. `/en/nl/request-loan/amount`
    #[must_use]
    pub fn path(self, language: LanguageTag) -> String {
        format!(
            "/{}/nl/request-loan/{}",
            language.url_segment(),
            self.segment()
        )
    }

    /// Absolute URL below `base_url`
    #[must_use]
    pub fn url(self, base_url: &str, language: LanguageTag) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path(language))
    }

    /// Step a URL points at, if any
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.page().matches_url(url))
    }

    /// Page object of the step
    #[must_use]
    pub fn page(self) -> &'static dyn PageObject {
        match self {
            Self::Amount => &AmountPage,
            Self::Contact => &ContactPage,
        }
    }

    /// Element whose visibility marks the step as rendered
    #[must_use]
    pub fn ready_marker(self) -> Locator {
        self.page().ready_marker()
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segment())
    }
}

/// The amount step
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountPage;

impl AmountPage {
    /// Numeric amount input
    #[must_use]
    pub fn amount_input() -> Locator {
        Locator::new("[inputmode=\"numeric\"]")
    }

    /// Continuous-range amount slider
    #[must_use]
    pub fn slider() -> Locator {
        Locator::new("input[type=\"range\"]")
    }

    /// Submit affordance of the step
    #[must_use]
    pub fn next_button() -> Locator {
        Locator::new("gr-button.button-primary")
    }

    /// In-page back button, rendered on later steps
    #[must_use]
    pub fn previous_button() -> Locator {
        Locator::new("gr-button.button-secondary").first()
    }

    /// Dropdown control of a field
    #[must_use]
    pub fn dropdown(field: &str) -> Locator {
        resolve_control_address(field)
    }

    /// Option of the open dropdown whose trimmed label equals `label`
    #[must_use]
    pub fn menu_item(label: &str) -> Locator {
        Locator::new("gr-menu-item").with_exact_text(label).first()
    }
}

impl PageObject for AmountPage {
    fn url_pattern(&self) -> &str {
        "**/request-loan/amount*"
    }

    fn ready_marker(&self) -> Locator {
        Self::amount_input()
    }

    fn page_name(&self) -> &str {
        "Amount-page"
    }
}

/// The contact step
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactPage;

impl ContactPage {
    fn named_input(name: &str) -> Locator {
        Locator::new(format!("gr-input[name=\"{name}\"]")).locator("input")
    }

    fn named_checkbox(name: &str) -> Locator {
        Locator::new(format!("gr-checkbox[name=\"{name}\"]")).locator("input[type=\"checkbox\"]")
    }

    /// Company search box
    #[must_use]
    pub fn search_input() -> Locator {
        Locator::placeholder("Type here to search")
    }

    /// Search results whose text contains `name`
    #[must_use]
    pub fn search_result(name: &str) -> Locator {
        Locator::new(".mt-5 li span").with_text(name).first()
    }

    /// Name heading of the selected company
    #[must_use]
    pub fn company_name() -> Locator {
        Locator::new(".mt-4 span").first()
    }

    /// Details block of the selected company
    #[must_use]
    pub fn company_details() -> Locator {
        Locator::new(".mt-5").first()
    }

    /// Director radio labelled `full_name`
    #[must_use]
    pub fn director(full_name: &str) -> Locator {
        Locator::new(".w-full gr-radio").with_text(full_name)
    }

    /// First name input
    #[must_use]
    pub fn first_name_input() -> Locator {
        Self::named_input("userFirstName")
    }

    /// Last name input
    #[must_use]
    pub fn last_name_input() -> Locator {
        Self::named_input("userLastName")
    }

    /// Email input
    #[must_use]
    pub fn email_input() -> Locator {
        Self::named_input("userEmail")
    }

    /// Phone number input
    #[must_use]
    pub fn phone_input() -> Locator {
        Locator::placeholder("Phone number")
    }

    /// Marketing email opt-in
    #[must_use]
    pub fn email_opt_in() -> Locator {
        Self::named_checkbox("emailOptIn")
    }

    /// Terms and conditions checkbox
    #[must_use]
    pub fn terms_checkbox() -> Locator {
        Self::named_checkbox("agreeToTermsAndConditions")
    }

    /// Submit affordance of the step
    #[must_use]
    pub fn next_button() -> Locator {
        Locator::new(".button-primary")
    }
}

impl PageObject for ContactPage {
    fn url_pattern(&self) -> &str {
        "**/request-loan/contact*"
    }

    fn ready_marker(&self) -> Locator {
        Self::search_input()
    }

    fn page_name(&self) -> &str {
        "Contact-page"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod wizard_step_tests {
        use super::*;

        #[test]
        fn test_paths() {
            assert_eq!(WizardStep::Amount.path(LanguageTag::EnUs), "/en/nl/request-loan/amount");
            assert_eq!(WizardStep::Contact.path(LanguageTag::NlNl), "/nl/nl/request-loan/contact");
        }

        #[test]
        fn test_url_joins_base() {
            assert_eq!(
                WizardStep::Amount.url("https://my.bridgefund.nl/", LanguageTag::EnUs),
                "https://my.bridgefund.nl/en/nl/request-loan/amount"
            );
        }

        #[test]
        fn test_from_url() {
            assert_eq!(
                WizardStep::from_url("https://my.bridgefund.nl/en/nl/request-loan/contact?x=1"),
                Some(WizardStep::Contact)
            );
            assert_eq!(WizardStep::from_url("https://my.bridgefund.nl/"), None);
        }

        #[test]
        fn test_ready_marker_per_step() {
            assert_eq!(WizardStep::Amount.ready_marker(), AmountPage::amount_input());
            assert_eq!(WizardStep::Contact.ready_marker(), ContactPage::search_input());
        }
    }

    mod page_tests {
        use super::*;

        #[test]
        fn test_amount_page_matches_url() {
            let page = AmountPage;
            assert!(page.matches_url("https://my.bridgefund.nl/en/nl/request-loan/amount"));
            assert!(!page.matches_url("https://my.bridgefund.nl/en/nl/request-loan/contact"));
            assert_eq!(page.page_name(), "Amount-page");
        }

        #[test]
        fn test_contact_page_matches_url() {
            let page = ContactPage;
            assert!(page.matches_url("https://my.bridgefund.nl/nl/nl/request-loan/contact"));
            assert_eq!(page.page_name(), "Contact-page");
        }

        #[test]
        fn test_dropdown_uses_resolver() {
            assert_eq!(
                AmountPage::dropdown("loanDeadline").address(),
                "gr-select[name=\"loanDeadline\"] >> gr-dropdown#dropdown-3"
            );
        }

        #[test]
        fn test_menu_item_is_first_exact_match() {
            let item = AmountPage::menu_item("Equity");
            assert_eq!(item.address(), "gr-menu-item:text-is(\"Equity\")");
            assert!(!item.options().strict);
        }

        #[test]
        fn test_contact_inputs_pierce_component() {
            assert_eq!(
                ContactPage::first_name_input().address(),
                "gr-input[name=\"userFirstName\"] >> input"
            );
            assert_eq!(
                ContactPage::terms_checkbox().address(),
                "gr-checkbox[name=\"agreeToTermsAndConditions\"] >> input[type=\"checkbox\"]"
            );
        }
    }
}
