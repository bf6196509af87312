//! In-memory simulation of the loan wizard.
//!
//! [`MockDriver`] answers the same locators the page objects produce and
//! behaves like the production wizard where the engine can observe it: the
//! amount input reformats per URL locale, dropdowns render their label
//! followed by a `Chevron Down` icon label, the next button is
//! `aria-disabled` until the step is complete, amount-step answers survive
//! reloads and navigation, and every page load fires an analytics beacon.
//!
//! Knobs switch individual behaviors off so the checker's failure paths can
//! be exercised.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::driver::FormDriver;
use crate::locale::{format_amount, parse_amount, Amount, LocaleContext};
use crate::locator::{BoundingBox, Locator, Point, Selector};
use crate::network::{
    CapturedResponse, CompanyAddress, CompanyInformation, CompanyInformationResponse,
    CompanySearchResponse, CompanySummary, Person, ResponseLog, UrlPattern,
};
use crate::page_object::WizardStep;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::LoadState;

/// Dropdowns rendered by the amount step: field, ordinal, option labels
const PAGE_DROPDOWNS: [(&str, u32, &[&str]); 4] = [
    ("loanPeriods", 1, &["Fixed rate loan", "Withdraw in installments"]),
    (
        "companyRevenue",
        2,
        &[
            "Less than €25.000",
            "€25.000 - €150.000",
            "€150.000 - €500.000",
            "€500.000 - €1.000.000",
            "More than €1.000.000",
        ],
    ),
    ("loanDeadline", 3, &["Within a week", "Within a month", "No rush"]),
    (
        "loanGoal",
        4,
        &[
            "Equity",
            "Vehicles",
            "Inventory",
            "Machinery",
            "Marketing",
            "Refinancing",
            "Other",
        ],
    ),
];

/// Label of a dropdown with nothing selected
const EMPTY_DROPDOWN_LABEL: &str = "Select";

/// Icon label rendered after every dropdown label
const ICON_LABEL: &str = "Chevron Down";

/// Amount shown before the user touches the step
const INITIAL_AMOUNT: u64 = 25_000;

/// Slider range and step
const SLIDER_MIN: u64 = 5_000;
const SLIDER_MAX: u64 = 250_000;
const SLIDER_STEP: u64 = 1_000;

/// Host of the company lookup service
const API_HOST: &str = "https://api.bridgefund.nl";

/// Analytics beacon fired on every page load
const BEACON_URL: &str = "https://region1.google-analytics.com/g/collect?v=2&tid=G-FORMPROBE&en=page_view";

const TEXT_INPUTS: [&str; 3] = ["userFirstName", "userLastName", "userEmail"];
const CHECKBOXES: [&str; 2] = ["emailOptIn", "agreeToTermsAndConditions"];

fn registered_companies() -> Vec<CompanyInformation> {
    fn company(
        name: &str,
        coc: &str,
        address: (&str, &str, &str),
        people: &[(&str, &str)],
    ) -> CompanyInformation {
        CompanyInformation {
            name: name.to_string(),
            coc_number: coc.to_string(),
            address: CompanyAddress {
                address_line: address.0.to_string(),
                postal_code: address.1.to_string(),
                city: address.2.to_string(),
            },
            people: people
                .iter()
                .map(|(first, last)| Person {
                    full_name: format!("{first} {last}"),
                    first_name: (*first).to_string(),
                    last_name: (*last).to_string(),
                })
                .collect(),
        }
    }
    vec![
        company(
            "BridgeFund B.V.",
            "70304580",
            ("Keizersgracht 555", "1017 DR", "Amsterdam"),
            &[("Jeroen", "van Dijk"), ("Sanne", "de Boer")],
        ),
        company(
            "Nederlandse Technology Groep B.V.",
            "34095964",
            ("Stationsplein 12", "3511 ED", "Utrecht"),
            &[("Pieter", "Bakker")],
        ),
        company(
            "Technology Solutions Rotterdam B.V.",
            "24381937",
            ("Coolsingel 40", "3011 AD", "Rotterdam"),
            &[("Lotte", "Visser"), ("Daan", "Smit")],
        ),
    ]
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Elements the simulated wizard renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Body,
    AmountInput,
    Slider,
    NextButton,
    PreviousButton,
    Dropdown(usize),
    MenuItem(usize),
    SearchInput,
    SearchResult(usize),
    CompanyName,
    CompanyDetails,
    Director(usize),
    TextInput(&'static str),
    PhoneInput,
    Checkbox(&'static str),
}

impl Node {
    /// CSS selectors the element answers to
    fn selectors(self) -> Vec<String> {
        match self {
            Self::Body => owned(&["body"]),
            Self::AmountInput => owned(&["[inputmode=\"numeric\"]", "input"]),
            Self::Slider => owned(&["input[type=\"range\"]", "input"]),
            Self::NextButton => owned(&["gr-button.button-primary", ".button-primary", "gr-button"]),
            Self::PreviousButton => {
                owned(&["gr-button.button-secondary", ".button-secondary", "gr-button"])
            }
            Self::Dropdown(i) => vec![
                format!("gr-dropdown#dropdown-{}", PAGE_DROPDOWNS[i].1),
                "gr-dropdown".to_string(),
            ],
            Self::MenuItem(_) => owned(&["gr-menu-item"]),
            Self::SearchInput | Self::PhoneInput => owned(&["input"]),
            Self::SearchResult(_) => owned(&[".mt-5 li span"]),
            Self::CompanyName => owned(&[".mt-4 span"]),
            Self::CompanyDetails => owned(&[".mt-5"]),
            Self::Director(_) => owned(&[".w-full gr-radio", "gr-radio"]),
            Self::TextInput(name) => vec!["input".to_string(), format!("input#{name}")],
            Self::Checkbox(_) => owned(&["input[type=\"checkbox\"]", "input"]),
        }
    }

    /// Selectors of the components the element is rendered inside
    fn scopes(self) -> Vec<String> {
        match self {
            Self::Dropdown(i) => vec![format!("gr-select[name=\"{}\"]", PAGE_DROPDOWNS[i].0)],
            Self::Director(_) => vec![".w-full".to_string()],
            Self::TextInput(name) => vec![format!("gr-input[name=\"{name}\"]")],
            Self::Checkbox(name) => vec![format!("gr-checkbox[name=\"{name}\"]")],
            _ => Vec::new(),
        }
    }

    const fn placeholder(self) -> Option<&'static str> {
        match self {
            Self::SearchInput => Some("Type here to search"),
            Self::PhoneInput => Some("Phone number"),
            _ => None,
        }
    }
}

/// Answers of the amount step, kept in session storage by the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
struct AmountAnswers {
    amount: Option<Amount>,
    display: String,
    selections: HashMap<&'static str, &'static str>,
}

impl Default for AmountAnswers {
    fn default() -> Self {
        Self {
            amount: Some(Amount::whole(INITIAL_AMOUNT)),
            display: String::new(),
            selections: HashMap::new(),
        }
    }
}

/// Transient state of the contact step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ContactAnswers {
    search_term: String,
    results: Vec<usize>,
    company: Option<usize>,
    inputs: HashMap<&'static str, String>,
    phone: String,
    checked: HashMap<&'static str, bool>,
}

/// Simulated loan wizard implementing [`FormDriver`]
#[derive(Debug)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Call history for verification
    pub call_history: Vec<String>,
    amount: AmountAnswers,
    contact: ContactAnswers,
    open_dropdown: Option<usize>,
    responses: ResponseLog,
    companies: Vec<CompanyInformation>,
    pointer: Point,
    dragging: bool,
    viewport: (u32, u32),
    persistent: bool,
    slider_geometry: bool,
    telemetry: bool,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            current_url: String::new(),
            call_history: Vec::new(),
            amount: AmountAnswers::default(),
            contact: ContactAnswers::default(),
            open_dropdown: None,
            responses: ResponseLog::default(),
            companies: registered_companies(),
            pointer: Point::new(0.0, 0.0),
            dragging: false,
            viewport: (1280, 720),
            persistent: true,
            slider_geometry: true,
            telemetry: true,
        }
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget amount-step answers on every page load
    #[must_use]
    pub fn without_persistence(mut self) -> Self {
        self.persistent = false;
        self
    }

    /// Render the slider without a layout box
    #[must_use]
    pub fn without_slider_geometry(mut self) -> Self {
        self.slider_geometry = false;
        self
    }

    /// Never fire the analytics beacon
    #[must_use]
    pub fn without_telemetry(mut self) -> Self {
        self.telemetry = false;
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Current viewport
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Responses captured and not yet consumed
    #[must_use]
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }

    fn locale(&self) -> LocaleContext {
        LocaleContext::from_url(&self.current_url)
    }

    fn step(&self) -> Option<WizardStep> {
        WizardStep::from_url(&self.current_url)
    }

    fn selected_label(&self, dropdown: usize) -> Option<&'static str> {
        self.amount.selections.get(PAGE_DROPDOWNS[dropdown].0).copied()
    }

    fn amount_complete(&self) -> bool {
        self.amount.amount.is_some()
            && PAGE_DROPDOWNS
                .iter()
                .all(|(field, _, _)| self.amount.selections.contains_key(field))
    }

    fn contact_complete(&self) -> bool {
        let filled = |name: &str| {
            self.contact
                .inputs
                .get(name)
                .is_some_and(|v| !v.trim().is_empty())
        };
        self.contact.company.is_some()
            && TEXT_INPUTS.iter().all(|name| filled(name))
            && !self.contact.phone.trim().is_empty()
            && self
                .contact
                .checked
                .get("agreeToTermsAndConditions")
                .copied()
                .unwrap_or(false)
    }

    /// Elements currently rendered, in document order
    fn nodes(&self) -> Vec<Node> {
        let mut nodes = vec![Node::Body];
        match self.step() {
            Some(WizardStep::Amount) => {
                nodes.extend([Node::AmountInput, Node::Slider]);
                nodes.extend((0..PAGE_DROPDOWNS.len()).map(Node::Dropdown));
                if let Some(open) = self.open_dropdown {
                    nodes.extend((0..PAGE_DROPDOWNS[open].2.len()).map(Node::MenuItem));
                }
                nodes.push(Node::NextButton);
            }
            Some(WizardStep::Contact) => {
                nodes.push(Node::SearchInput);
                match self.contact.company {
                    Some(company) => {
                        nodes.extend([Node::CompanyName, Node::CompanyDetails]);
                        nodes.extend(
                            (0..self.companies[company].people.len()).map(Node::Director),
                        );
                    }
                    None => nodes.extend(self.contact.results.iter().map(|i| Node::SearchResult(*i))),
                }
                nodes.extend(TEXT_INPUTS.map(Node::TextInput));
                nodes.push(Node::PhoneInput);
                nodes.extend(CHECKBOXES.map(Node::Checkbox));
                nodes.extend([Node::PreviousButton, Node::NextButton]);
            }
            None => {}
        }
        nodes
    }

    fn text_of(&self, node: Node) -> String {
        match node {
            Node::Dropdown(i) => format!(
                "{} {ICON_LABEL}",
                self.selected_label(i).unwrap_or(EMPTY_DROPDOWN_LABEL)
            ),
            Node::MenuItem(i) => self
                .open_dropdown
                .map(|open| format!(" {} ", PAGE_DROPDOWNS[open].2[i]))
                .unwrap_or_default(),
            Node::SearchResult(i) => self.companies[i].name.clone(),
            Node::CompanyName => self
                .contact
                .company
                .map(|c| format!(" {} ", self.companies[c].name))
                .unwrap_or_default(),
            Node::CompanyDetails => self
                .contact
                .company
                .map(|c| {
                    let info = &self.companies[c];
                    format!(
                        "KvK {} {}, {} {}",
                        info.coc_number,
                        info.address.address_line,
                        info.address.postal_code,
                        info.address.city
                    )
                })
                .unwrap_or_default(),
            Node::Director(i) => self
                .contact
                .company
                .map(|c| self.companies[c].people[i].full_name.clone())
                .unwrap_or_default(),
            Node::NextButton => "Next".to_string(),
            Node::PreviousButton => "Previous".to_string(),
            _ => String::new(),
        }
    }

    fn css_matches(node: Node, css: &str) -> bool {
        node.selectors().iter().any(|s| s == css)
    }

    fn matches(&self, node: Node, selector: &Selector) -> bool {
        match selector {
            Selector::Css(css) => Self::css_matches(node, css),
            Selector::CssWithText { css, text } => {
                Self::css_matches(node, css) && self.text_of(node).contains(text.as_str())
            }
            Selector::CssWithExactText { css, text } => {
                Self::css_matches(node, css) && self.text_of(node).trim() == text
            }
            Selector::Placeholder(p) => node.placeholder() == Some(p.as_str()),
            Selector::Descendant { parent, child } => {
                self.matches(node, child)
                    && match parent.as_ref() {
                        Selector::Css(scope) => node.scopes().iter().any(|s| s == scope),
                        _ => false,
                    }
            }
        }
    }

    fn select(&self, locator: &Locator) -> Vec<Node> {
        self.nodes()
            .into_iter()
            .filter(|node| self.matches(*node, locator.selector()))
            .collect()
    }

    fn resolve(&self, locator: &Locator) -> ProbeResult<Node> {
        let matches = self.select(locator);
        match matches.as_slice() {
            [] => Err(ProbeError::ElementNotFound {
                address: locator.address(),
            }),
            [node] => Ok(*node),
            [node, ..] if !locator.options().strict => Ok(*node),
            _ => Err(ProbeError::driver(format!(
                "strict mode violation: {locator} resolved to {} elements",
                matches.len()
            ))),
        }
    }

    fn slider_box() -> BoundingBox {
        BoundingBox::new(24.0, 380.0, 327.0, 16.0)
    }

    fn set_amount(&mut self, amount: Amount) {
        self.amount.display = format_amount(&amount, self.locale());
        self.amount.amount = Some(amount);
    }

    fn slide_to(&mut self, x: f32) {
        let bbox = Self::slider_box();
        let ratio = f64::from(((x - bbox.x) / bbox.width).clamp(0.0, 1.0));
        let steps = (SLIDER_MAX - SLIDER_MIN) / SLIDER_STEP;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let k = (ratio * steps as f64).round() as u64;
        self.set_amount(Amount::whole(SLIDER_MIN + k * SLIDER_STEP));
    }

    fn capture(&mut self, response: CapturedResponse) {
        debug!(url = %response.url, "captured response");
        self.responses.push(response);
    }

    /// Everything a fresh document does: transient state resets, stored
    /// answers are restored in the new locale, the beacon fires
    fn page_loaded(&mut self) {
        self.open_dropdown = None;
        self.dragging = false;
        self.contact = ContactAnswers::default();
        if !self.persistent {
            self.amount = AmountAnswers::default();
        }
        if let Some(amount) = self.amount.amount.clone() {
            self.set_amount(amount);
        }
        if self.telemetry {
            self.capture(CapturedResponse::new(BEACON_URL, 204, None));
        }
    }

    fn transition(&mut self, to: WizardStep) {
        let url = match self.step() {
            Some(from) => self.current_url.replace(
                &format!("/request-loan/{}", from.segment()),
                &format!("/request-loan/{}", to.segment()),
            ),
            None => return,
        };
        debug!(from = %self.current_url, to = %url, "wizard transition");
        self.current_url = url;
        self.page_loaded();
    }

    fn search(&mut self, term: &str) -> ProbeResult<()> {
        self.contact.search_term = term.to_string();
        self.contact.company = None;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            self.contact.results.clear();
            return Ok(());
        }
        self.contact.results = self
            .companies
            .iter()
            .enumerate()
            .filter(|(_, c)| c.coc_number == needle || c.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        let body = CompanySearchResponse {
            data: self
                .contact
                .results
                .iter()
                .map(|i| CompanySummary {
                    name: self.companies[*i].name.clone(),
                })
                .collect(),
        };
        let url = format!(
            "{API_HOST}/company-network-service/v1/companies?searchTerm={term}&countryCode=nl"
        );
        self.capture(CapturedResponse::new(url, 200, Some(serde_json::to_string(&body)?)));
        Ok(())
    }

    fn choose_company(&mut self, index: usize) -> ProbeResult<()> {
        self.contact.company = Some(index);
        self.contact.results.clear();
        let data = self.companies[index].clone();
        let url = format!(
            "{API_HOST}/company-network-service/v1/company-information?cocNumber={}&countryCode=nl",
            data.coc_number
        );
        let body = serde_json::to_string(&CompanyInformationResponse { data })?;
        self.capture(CapturedResponse::new(url, 200, Some(body)));
        Ok(())
    }

    fn choose_director(&mut self, index: usize) {
        if let Some(company) = self.contact.company {
            let person = &self.companies[company].people[index];
            let (first, last) = (person.first_name.clone(), person.last_name.clone());
            self.contact.inputs.insert("userFirstName", first);
            self.contact.inputs.insert("userLastName", last);
        }
    }
}

#[async_trait]
impl FormDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        self.current_url = url.to_string();
        self.page_loaded();
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.current_url.clone())
    }

    async fn reload(&mut self) -> ProbeResult<()> {
        self.call_history.push("reload".to_string());
        self.page_loaded();
        Ok(())
    }

    async fn clear_session(&mut self) -> ProbeResult<()> {
        self.call_history.push("clear_session".to_string());
        self.amount = AmountAnswers::default();
        Ok(())
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(!self.select(locator).is_empty())
    }

    async fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
        self.call_history.push(format!("click:{locator}"));
        let node = self.resolve(locator)?;
        match node {
            Node::Body => self.open_dropdown = None,
            Node::Dropdown(i) => {
                self.open_dropdown = if self.open_dropdown == Some(i) { None } else { Some(i) };
            }
            Node::MenuItem(i) => {
                if let Some(open) = self.open_dropdown.take() {
                    let (field, _, options) = PAGE_DROPDOWNS[open];
                    self.amount.selections.insert(field, options[i]);
                }
            }
            Node::NextButton => match self.step() {
                Some(WizardStep::Amount) if self.amount_complete() => {
                    self.transition(WizardStep::Contact);
                }
                _ => debug!("click on disabled next button ignored"),
            },
            Node::PreviousButton => self.transition(WizardStep::Amount),
            Node::SearchResult(i) => self.choose_company(i)?,
            Node::Director(i) => self.choose_director(i),
            Node::Checkbox(name) => {
                let checked = self.contact.checked.entry(name).or_insert(false);
                *checked = !*checked;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
        self.call_history.push(format!("fill:{locator}={value}"));
        match self.resolve(locator)? {
            Node::AmountInput => match parse_amount(value, self.locale()) {
                Ok(amount) => self.set_amount(amount),
                Err(_) => {
                    self.amount.amount = None;
                    self.amount.display = value.to_string();
                }
            },
            Node::TextInput(name) => {
                self.contact.inputs.insert(name, value.to_string());
            }
            Node::PhoneInput => self.contact.phone = value.to_string(),
            Node::SearchInput => self.search(value)?,
            _ => {
                return Err(ProbeError::driver(format!("{locator} is not editable")));
            }
        }
        Ok(())
    }

    async fn input_value(&self, locator: &Locator) -> ProbeResult<String> {
        match self.resolve(locator)? {
            Node::AmountInput => Ok(self.amount.display.clone()),
            Node::Slider => Ok(self
                .amount
                .amount
                .as_ref()
                .map(|a| a.units().to_string())
                .unwrap_or_default()),
            Node::TextInput(name) => Ok(self.contact.inputs.get(name).cloned().unwrap_or_default()),
            Node::PhoneInput => Ok(self.contact.phone.clone()),
            Node::SearchInput => Ok(self.contact.search_term.clone()),
            Node::Checkbox(_) => Ok("on".to_string()),
            _ => Err(ProbeError::driver(format!("{locator} is not an input"))),
        }
    }

    async fn text_content(&self, locator: &Locator) -> ProbeResult<Option<String>> {
        let node = self.resolve(locator)?;
        Ok(Some(self.text_of(node)))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let node = self.resolve(locator)?;
        Ok(match (node, name) {
            (Node::NextButton, "aria-disabled") => {
                let complete = match self.step() {
                    Some(WizardStep::Amount) => self.amount_complete(),
                    Some(WizardStep::Contact) => self.contact_complete(),
                    None => false,
                };
                Some((!complete).to_string())
            }
            (Node::Checkbox(box_name), "checked") => self
                .contact
                .checked
                .get(box_name)
                .copied()
                .unwrap_or(false)
                .then(String::new),
            (Node::AmountInput, "inputmode") => Some("numeric".to_string()),
            _ => None,
        })
    }

    /// The script is not interpreted: dropdowns answer with their internal
    /// selected label, checkboxes with their checked state
    async fn evaluate_on(
        &self,
        locator: &Locator,
        _function: &str,
    ) -> ProbeResult<serde_json::Value> {
        Ok(match self.resolve(locator)? {
            Node::Dropdown(i) => self
                .selected_label(i)
                .map_or(serde_json::Value::Null, |label| serde_json::Value::String(label.to_string())),
            Node::Checkbox(name) => {
                serde_json::Value::Bool(self.contact.checked.get(name).copied().unwrap_or(false))
            }
            _ => serde_json::Value::Null,
        })
    }

    async fn bounding_box(&self, locator: &Locator) -> ProbeResult<Option<BoundingBox>> {
        Ok(match self.resolve(locator)? {
            Node::Slider => self.slider_geometry.then(Self::slider_box),
            _ => Some(BoundingBox::new(24.0, 120.0, 327.0, 48.0)),
        })
    }

    async fn mouse_move(&mut self, point: Point) -> ProbeResult<()> {
        self.call_history.push(format!("mouse_move:{},{}", point.x, point.y));
        self.pointer = point;
        if self.dragging {
            self.slide_to(point.x);
        }
        Ok(())
    }

    async fn mouse_down(&mut self) -> ProbeResult<()> {
        self.call_history.push("mouse_down".to_string());
        let on_slider = self.step() == Some(WizardStep::Amount)
            && self.slider_geometry
            && Self::slider_box().contains(&self.pointer);
        if on_slider {
            self.dragging = true;
            self.slide_to(self.pointer.x);
        }
        Ok(())
    }

    async fn mouse_up(&mut self) -> ProbeResult<()> {
        self.call_history.push("mouse_up".to_string());
        self.dragging = false;
        Ok(())
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> ProbeResult<()> {
        self.call_history.push(format!("set_viewport:{width}x{height}"));
        self.viewport = (width, height);
        Ok(())
    }

    /// PNG signature followed by a description of what would be rendered
    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(
            format!("{} {}x{}", self.current_url, self.viewport.0, self.viewport.1).as_bytes(),
        );
        Ok(bytes)
    }

    async fn discard_responses(&mut self) -> ProbeResult<()> {
        self.call_history.push("discard_responses".to_string());
        self.responses.clear();
        Ok(())
    }

    /// Nothing arrives later in a simulation, so a miss times out at once
    async fn wait_for_response(
        &mut self,
        pattern: &UrlPattern,
        timeout: Duration,
    ) -> ProbeResult<CapturedResponse> {
        self.call_history.push(format!("wait_for_response:{pattern}"));
        self.responses
            .take(pattern)
            .ok_or_else(|| ProbeError::WaitTimeout {
                address: pattern.to_string(),
                elapsed_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }

    async fn wait_for_load_state(&mut self, state: LoadState, _timeout: Duration) -> ProbeResult<()> {
        self.call_history.push(format!("wait_for_load_state:{state}"));
        Ok(())
    }
}
