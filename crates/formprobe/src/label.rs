//! Reading the label a dropdown control currently displays.
//!
//! The visible text of a `gr-dropdown` carries the accessible label of its
//! chevron icon (`"Equity Chevron Down"`). Which source is authoritative
//! differs per component, so each dropdown family picks a strategy.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{Catalog, DropdownFamily};
use crate::driver::FormDriver;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Icon label rendered after the selected option
pub const ICON_LABEL_PATTERN: &str = r"\s*Chevron Down\s*";

/// Script reading the selected label from a dropdown's shadow state
pub const SELECTED_LABEL_SCRIPT: &str = "el => { \
    const root = el.shadowRoot; \
    const label = root && root.querySelector('[part~=\"label\"], .label'); \
    return label ? label.textContent : (el.value ?? null); \
}";

/// Remove the first icon label artifact and trim
pub fn strip_icon_label(raw: &str) -> ProbeResult<String> {
    let icon = Regex::new(ICON_LABEL_PATTERN)
        .map_err(|e| ProbeError::configuration(format!("icon label pattern: {e}")))?;
    Ok(icon.replace(raw, "").trim().to_string())
}

/// A way of reading the label a dropdown control displays
#[async_trait]
pub trait DisplayedLabelReadable: Send + Sync + std::fmt::Debug {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Unnormalized label as the page exposes it
    async fn read_raw(&self, driver: &dyn FormDriver, control: &Locator) -> ProbeResult<String>;

    /// Label with the icon artifact stripped and whitespace trimmed
    async fn read_label(&self, driver: &dyn FormDriver, control: &Locator) -> ProbeResult<String> {
        let raw = self.read_raw(driver, control).await?;
        strip_icon_label(&raw)
    }
}

/// Visible text content of the control
#[derive(Debug, Clone, Copy, Default)]
pub struct TextContentLabel;

#[async_trait]
impl DisplayedLabelReadable for TextContentLabel {
    fn name(&self) -> &'static str {
        "text-content"
    }

    async fn read_raw(&self, driver: &dyn FormDriver, control: &Locator) -> ProbeResult<String> {
        Ok(driver.text_content(control).await?.unwrap_or_default())
    }
}

/// The component's internal selected label, read by script
#[derive(Debug, Clone)]
pub struct ShadowStateLabel {
    script: String,
}

impl Default for ShadowStateLabel {
    fn default() -> Self {
        Self::new(SELECTED_LABEL_SCRIPT)
    }
}

impl ShadowStateLabel {
    /// Read with a custom `el => ...` script
    #[must_use]
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

#[async_trait]
impl DisplayedLabelReadable for ShadowStateLabel {
    fn name(&self) -> &'static str {
        "shadow-state"
    }

    async fn read_raw(&self, driver: &dyn FormDriver, control: &Locator) -> ProbeResult<String> {
        Ok(match driver.evaluate_on(control, &self.script).await? {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

/// Label strategy per dropdown family; text content unless overridden
#[derive(Debug, Clone)]
pub struct LabelStrategies {
    default: Arc<dyn DisplayedLabelReadable>,
    overrides: HashMap<DropdownFamily, Arc<dyn DisplayedLabelReadable>>,
}

impl Default for LabelStrategies {
    fn default() -> Self {
        Self::uniform(Arc::new(TextContentLabel))
    }
}

impl LabelStrategies {
    /// Text content for every family
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One strategy for every family
    #[must_use]
    pub fn uniform(strategy: Arc<dyn DisplayedLabelReadable>) -> Self {
        Self {
            default: strategy,
            overrides: HashMap::new(),
        }
    }

    /// Override the strategy of one family
    #[must_use]
    pub fn with(mut self, family: DropdownFamily, strategy: Arc<dyn DisplayedLabelReadable>) -> Self {
        self.overrides.insert(family, strategy);
        self
    }

    /// Strategy of a family
    #[must_use]
    pub fn for_family(&self, family: DropdownFamily) -> &dyn DisplayedLabelReadable {
        self.overrides
            .get(&family)
            .map_or(self.default.as_ref(), |strategy| strategy.as_ref())
    }

    /// Strategy of a wire-level field; fields outside the catalog use the default
    #[must_use]
    pub fn for_field(&self, catalog: &Catalog, field: &str) -> &dyn DisplayedLabelReadable {
        catalog
            .family_of(field)
            .map_or(self.default.as_ref(), |family| self.for_family(family))
    }
}
