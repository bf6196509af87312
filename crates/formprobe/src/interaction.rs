//! Form Interaction Engine
//!
//! Fills, selects and drags on the amount step through resolved locators.
//! Every action first waits for its target to become visible.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::controller::FormController;
use crate::driver::FormDriver;
use crate::locale::format_amount_str;
use crate::locator::Point;
use crate::page_object::{AmountPage, ContactPage, WizardStep};
use crate::payload::RequirementsPayload;
use crate::resolver::resolve_control_address;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::wait_for_visible;

/// Horizontal inset of the drag start from the slider's left edge
pub const SLIDER_START_INSET: f32 = 5.0;

/// Horizontal inset of the drag end from the slider's right edge
pub const SLIDER_END_INSET: f32 = 10.0;

/// Intermediate pointer moves of a slider drag
pub const SLIDER_DRAG_STEPS: u16 = 10;

/// Observable state of the step's submit affordance.
///
/// The page moves it from `Incomplete` to `Complete` once every required
/// input has a value; the engine only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitState {
    /// `aria-disabled="true"`
    Incomplete,
    /// Enabled
    Complete,
}

impl SubmitState {
    /// Derive from the `aria-disabled` attribute; absent means enabled
    #[must_use]
    pub fn from_aria_disabled(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("true") => Self::Incomplete,
            _ => Self::Complete,
        }
    }

    /// Check if the step can be submitted
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for SubmitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incomplete => write!(f, "Incomplete"),
            Self::Complete => write!(f, "Complete"),
        }
    }
}

/// Amount input before and after a slider drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderDrag {
    /// Value before the drag
    pub initial: String,
    /// Value after the drag
    pub updated: String,
}

impl SliderDrag {
    /// Check if the drag changed the amount
    #[must_use]
    pub fn changed(&self) -> bool {
        self.initial != self.updated
    }
}

impl<D: FormDriver> FormController<D> {
    /// Open a dropdown and pick the first option whose trimmed label equals
    /// `label`.
    ///
    /// Duplicate labels within one dropdown are not disambiguated.
    pub async fn select_option(&mut self, field: &str, label: &str) -> ProbeResult<()> {
        let control = resolve_control_address(field);
        wait_for_visible(&self.driver, &control, &self.wait).await?;
        self.driver.click(&control).await?;

        let item = AmountPage::menu_item(label);
        wait_for_visible(&self.driver, &item, &self.wait).await?;
        self.driver.click(&item).await?;
        debug!(field, label, "option selected");
        Ok(())
    }

    /// Assign an amount to the numeral input, formatted for the locale of
    /// the current location. Returns the text that was entered.
    pub async fn fill_amount(&mut self, amount: &str) -> ProbeResult<String> {
        let locale = self.locale().await?;
        let text = format_amount_str(amount, locale)?;
        let input = AmountPage::amount_input();
        wait_for_visible(&self.driver, &input, &self.wait).await?;
        self.driver.fill(&input, &text).await?;
        debug!(amount, %text, locale = %locale.language_tag, "amount filled");
        Ok(text)
    }

    /// Drag the slider from its left edge to its right edge
    pub async fn drag_slider_full_range(&mut self) -> ProbeResult<SliderDrag> {
        let input = AmountPage::amount_input();
        let initial = self.driver.input_value(&input).await?;

        let slider = AmountPage::slider();
        wait_for_visible(&self.driver, &slider, &self.wait).await?;
        let bbox = self
            .driver
            .bounding_box(&slider)
            .await?
            .ok_or_else(|| ProbeError::MissingGeometry {
                address: slider.address(),
            })?;

        let y = bbox.y + bbox.height / 2.0;
        let start_x = bbox.x + SLIDER_START_INSET;
        let end_x = bbox.x + bbox.width - SLIDER_END_INSET;

        self.driver.mouse_move(Point::new(start_x, y)).await?;
        self.driver.mouse_down().await?;
        for step in 1..=SLIDER_DRAG_STEPS {
            let progress = f32::from(step) / f32::from(SLIDER_DRAG_STEPS);
            self.driver
                .mouse_move(Point::new(start_x + (end_x - start_x) * progress, y))
                .await?;
        }
        self.driver.mouse_up().await?;

        wait_for_visible(&self.driver, &input, &self.wait).await?;
        let updated = self.driver.input_value(&input).await?;
        debug!(%initial, %updated, "slider dragged");
        Ok(SliderDrag { initial, updated })
    }

    /// Enter the amount, then every selection in order
    pub async fn complete_form(&mut self, payload: &RequirementsPayload) -> ProbeResult<()> {
        info!(amount = %payload.loan_amount, selections = payload.selections.len(), "completing amount step");
        self.fill_amount(&payload.loan_amount).await?;
        for selection in &payload.selections {
            self.select_option(&selection.field, &selection.value).await?;
        }
        Ok(())
    }

    /// Current state of the submit affordance of the step being shown
    pub async fn submit_state(&self) -> ProbeResult<SubmitState> {
        let button = match WizardStep::from_url(&self.location().await?) {
            Some(WizardStep::Contact) => ContactPage::next_button(),
            _ => AmountPage::next_button(),
        };
        wait_for_visible(&self.driver, &button, &self.wait).await?;
        let disabled = self.driver.attribute(&button, "aria-disabled").await?;
        Ok(SubmitState::from_aria_disabled(disabled.as_deref()))
    }
}
