//! Formprobe: Form State Verification Engine
//!
//! Drives a two-step loan application wizard (amount, then contact details)
//! through a browser, fills it with seeded requirement payloads and checks
//! that what the page displays agrees with what was entered: locale-aware
//! amount formatting, dropdown labels, submit enablement, and persistence
//! across reloads and back navigation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   FORMPROBE Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Catalog +  │    │ Form       │    │ FormDriver │            │
//! │   │ Generator  │───►│ Controller │───►│ (chromium  │            │
//! │   │ (payload)  │    │ (verify)   │    │  or mock)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod catalog;
mod config;
mod contact;
mod controller;
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod driver;
mod generator;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod interaction;
mod label;
mod locale;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod locator;
mod page_object;
mod payload;
mod persistence;
mod resolver;
mod result;
mod verifier;

/// Chromium driver over the DevTools protocol
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
pub mod cdp;

/// Scripted in-memory wizard for tests
pub mod mock;

/// Response interception and the company registry payloads
pub mod network;

/// Named verification scenarios and their runner
pub mod scenarios;

/// Layout capture per wizard step and viewport
pub mod visual;

/// Wait bounds and load states
pub mod wait;

pub use catalog::{Catalog, DropdownFamily, FieldCatalogEntry};
#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;
pub use config::{ProbeConfig, ViewportSize, DEFAULT_BASE_URL};
pub use contact::{pick_director, PersonalDetails};
pub use controller::FormController;
pub use driver::{DriverConfig, FormDriver};
pub use generator::{
    AmountRange, RequirementsGenerator, DEFAULT_AMOUNT_STEP, DEFAULT_MAX_AMOUNT,
    DEFAULT_MIN_AMOUNT,
};
pub use interaction::{
    SliderDrag, SubmitState, SLIDER_DRAG_STEPS, SLIDER_END_INSET, SLIDER_START_INSET,
};
pub use label::{
    strip_icon_label, DisplayedLabelReadable, LabelStrategies, ShadowStateLabel,
    TextContentLabel, ICON_LABEL_PATTERN,
};
pub use locale::{
    format_amount, format_amount_str, parse_amount, parse_equivalent, Amount, LanguageTag,
    LocaleContext,
};
pub use locator::{BoundingBox, Locator, LocatorOptions, Point, Selector};
pub use mock::MockDriver;
pub use network::{CapturedResponse, ResponseLog, UrlPattern};
pub use page_object::{AmountPage, ContactPage, PageObject, WizardStep};
pub use payload::{RequirementsPayload, Selection};
pub use resolver::{
    resolve_control_address, resolve_dropdown_ordinal, DropdownAddress, DROPDOWN_ORDINALS,
    FALLBACK_ORDINAL,
};
pub use result::{ProbeError, ProbeResult};
pub use scenarios::{
    Scenario, ScenarioKind, ScenarioReport, ScenarioRunner, ScenarioSuite, SuiteReport,
};
pub use verifier::AMOUNT_FIELD;
pub use visual::{
    BaselineDirectory, Snapshot, SnapshotComparator, SnapshotVerdict, Viewport, VisualCase,
};
pub use wait::{LoadState, WaitOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::catalog::*;
    #[cfg(feature = "browser")]
    pub use super::cdp::*;
    pub use super::config::*;
    pub use super::contact::*;
    pub use super::controller::*;
    pub use super::driver::*;
    pub use super::generator::*;
    pub use super::interaction::*;
    pub use super::label::*;
    pub use super::locale::*;
    pub use super::mock::*;
    pub use super::page_object::*;
    pub use super::payload::*;
    pub use super::resolver::*;
    pub use super::result::*;
    pub use super::scenarios::*;
    pub use super::visual::*;
    pub use super::wait::*;
    pub use super::locator::{BoundingBox, Locator, LocatorOptions, Point, Selector};
    pub use super::network::{CapturedResponse, ResponseLog, UrlPattern};
}
