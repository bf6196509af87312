//! FormDriver - Abstract Browser Automation Trait
//!
//! Everything the engine does to a page goes through [`FormDriver`]. The
//! engine never assumes a particular runtime: a CDP implementation lives
//! behind the `browser` feature, and [`crate::MockDriver`] simulates the loan
//! wizard in memory for tests.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  FormDriver (Abstract Trait)                                    │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐          ┌─────────────────────┐       │
//! │  │  ChromiumDriver     │          │  MockDriver         │       │
//! │  │  (feature=browser)  │          │  (in-memory wizard) │       │
//! │  │  CDP via            │          │  unit + scenario    │       │
//! │  │  chromiumoxide      │          │  tests              │       │
//! │  └─────────────────────┘          └─────────────────────┘       │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::locator::{BoundingBox, Locator, Point};
use crate::network::{CapturedResponse, UrlPattern};
use crate::result::ProbeResult;
use crate::wait::LoadState;

/// Browser launch configuration for a driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Timeout for navigation
    pub navigation_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            navigation_timeout: Duration::from_secs(30),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set the chromium executable
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Abstract driver trait for browser automation.
///
/// Reads take `&self`, anything that changes page state takes `&mut self`.
/// Element methods act on the single match of a strict locator, or the first
/// match of a relaxed one; reads of an absent element fail with
/// [`crate::ProbeError::ElementNotFound`].
#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Navigate to URL and wait for the load event
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Current URL, read from the page
    async fn current_url(&self) -> ProbeResult<String>;

    /// Full page reload
    async fn reload(&mut self) -> ProbeResult<()>;

    /// Clear session and local storage of the current origin
    async fn clear_session(&mut self) -> ProbeResult<()>;

    /// Whether the element exists and is rendered with a non-empty box
    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Click the element
    async fn click(&mut self, locator: &Locator) -> ProbeResult<()>;

    /// Assign the element's value directly and fire `input`/`change`
    async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Current `value` of an input element
    async fn input_value(&self, locator: &Locator) -> ProbeResult<String>;

    /// Text content of the element
    async fn text_content(&self, locator: &Locator) -> ProbeResult<Option<String>>;

    /// Attribute of the element
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Call a JavaScript function (`el => ...`) with the element
    async fn evaluate_on(&self, locator: &Locator, function: &str)
        -> ProbeResult<serde_json::Value>;

    /// Bounding box, `None` when the element is not rendered
    async fn bounding_box(&self, locator: &Locator) -> ProbeResult<Option<BoundingBox>>;

    /// Move the mouse pointer
    async fn mouse_move(&mut self, point: Point) -> ProbeResult<()>;

    /// Press the left mouse button at the pointer
    async fn mouse_down(&mut self) -> ProbeResult<()>;

    /// Release the left mouse button at the pointer
    async fn mouse_up(&mut self) -> ProbeResult<()>;

    /// Resize the viewport
    async fn set_viewport(&mut self, width: u32, height: u32) -> ProbeResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Drop every response captured so far
    async fn discard_responses(&mut self) -> ProbeResult<()>;

    /// Consume the first not-yet-consumed response matching `pattern`,
    /// waiting up to `timeout` for one to arrive
    async fn wait_for_response(
        &mut self,
        pattern: &UrlPattern,
        timeout: Duration,
    ) -> ProbeResult<CapturedResponse>;

    /// Wait for a page load state
    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration)
        -> ProbeResult<()>;
}
