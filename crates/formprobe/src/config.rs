//! Run configuration.
//!
//! Read from a YAML or JSON file; every field has a default, so an absent
//! file or a partial one is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::catalog::Catalog;
use crate::driver::DriverConfig;
use crate::locale::LanguageTag;
use crate::result::ProbeResult;
use crate::visual::{DEFAULT_SNAPSHOT_DIR, DEFAULT_SNAPSHOT_THRESHOLD};
use crate::wait::{WaitOptions, DEFAULT_SETTLEMENT_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Production host of the loan wizard
pub const DEFAULT_BASE_URL: &str = "https://my.bridgefund.nl";

/// Browser viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Settings of a verification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Host the wizard is served from
    pub base_url: String,
    /// Language the wizard is opened in
    pub language: LanguageTag,
    /// Catalog document; the built-in catalog when absent
    pub catalog_path: Option<PathBuf>,
    /// Generator seed; drawn from entropy when absent
    pub seed: Option<u64>,
    /// Bound of element waits
    pub element_timeout_ms: u64,
    /// Bound of settlement waits
    pub settlement_timeout_ms: u64,
    /// Run the browser without a window
    pub headless: bool,
    /// Browser viewport
    pub viewport: ViewportSize,
    /// Where layout baselines live
    pub snapshot_dir: PathBuf,
    /// Threshold handed to the snapshot comparator
    pub snapshot_threshold: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: LanguageTag::EnUs,
            catalog_path: None,
            seed: None,
            element_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            settlement_timeout_ms: DEFAULT_SETTLEMENT_TIMEOUT_MS,
            headless: true,
            viewport: ViewportSize::default(),
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            snapshot_threshold: DEFAULT_SNAPSHOT_THRESHOLD,
        }
    }
}

impl ProbeConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file yields the defaults. `.json` files
    /// are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> ProbeResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml_ng::from_str(&content)?
        };
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set language
    #[must_use]
    pub const fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = language;
        self
    }

    /// Set catalog path
    #[must_use]
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Set seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set element wait bound
    #[must_use]
    pub const fn with_element_timeout(mut self, timeout_ms: u64) -> Self {
        self.element_timeout_ms = timeout_ms;
        self
    }

    /// Set settlement wait bound
    #[must_use]
    pub const fn with_settlement_timeout(mut self, timeout_ms: u64) -> Self {
        self.settlement_timeout_ms = timeout_ms;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = ViewportSize { width, height };
        self
    }

    /// Set snapshot directory
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Set snapshot threshold
    #[must_use]
    pub const fn with_snapshot_threshold(mut self, threshold: f64) -> Self {
        self.snapshot_threshold = threshold;
        self
    }

    /// Wait bounds for the controller
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.element_timeout_ms)
            .with_settlement_timeout(self.settlement_timeout_ms)
    }

    /// Browser launch settings
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::new()
            .headless(self.headless)
            .viewport(self.viewport.width, self.viewport.height)
            .navigation_timeout(Duration::from_millis(self.settlement_timeout_ms))
    }

    /// The configured catalog, or the built-in one
    pub fn catalog(&self) -> ProbeResult<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(),
        }
    }
}
