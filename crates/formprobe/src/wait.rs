//! Wait Mechanisms
//!
//! Bounded polling against a [`FormDriver`]. Every wait has a ceiling and
//! reports [`ProbeError::WaitTimeout`] with the awaited address and the time
//! actually spent; nothing here retries an action.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::driver::FormDriver;
use crate::locator::Locator;
use crate::network::{CapturedResponse, UrlPattern};
use crate::result::{ProbeError, ProbeResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for the settlement signal (30 seconds)
pub const DEFAULT_SETTLEMENT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without responses)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no responses for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Bounds for element and settlement waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Element wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Settlement signal timeout in milliseconds
    pub settlement_timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            settlement_timeout_ms: DEFAULT_SETTLEMENT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set element timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set settlement timeout in milliseconds
    #[must_use]
    pub const fn with_settlement_timeout(mut self, timeout_ms: u64) -> Self {
        self.settlement_timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Element timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Settlement timeout as Duration
    #[must_use]
    pub const fn settlement_timeout(&self) -> Duration {
        Duration::from_millis(self.settlement_timeout_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn timeout_error(address: impl Into<String>, started: Instant) -> ProbeError {
    ProbeError::WaitTimeout {
        address: address.into(),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

// =============================================================================
// ELEMENT WAITS
// =============================================================================

/// Poll until the element is visible; returns the time it took
pub async fn wait_for_visible<D: FormDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
    options: &WaitOptions,
) -> ProbeResult<Duration> {
    let started = Instant::now();
    loop {
        if driver.is_visible(locator).await? {
            debug!(address = %locator, "element visible");
            return Ok(started.elapsed());
        }
        if started.elapsed() >= options.timeout() {
            return Err(timeout_error(locator.address(), started));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll until the page location differs from `from`; returns the new location
pub async fn wait_for_url_change<D: FormDriver + ?Sized>(
    driver: &D,
    from: &str,
    options: &WaitOptions,
) -> ProbeResult<String> {
    let started = Instant::now();
    loop {
        let url = driver.current_url().await?;
        if url != from {
            debug!(from, to = %url, "location changed");
            return Ok(url);
        }
        if started.elapsed() >= options.timeout() {
            return Err(timeout_error(format!("location to leave {from}"), started));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

// =============================================================================
// SETTLEMENT
// =============================================================================

/// Wait for the analytics beacon that marks the page as settled.
///
/// Only responses captured after the last
/// [`FormDriver::discard_responses`] count.
pub async fn wait_for_settlement<D: FormDriver + ?Sized>(
    driver: &mut D,
    options: &WaitOptions,
) -> ProbeResult<CapturedResponse> {
    let response = driver
        .wait_for_response(&UrlPattern::settlement(), options.settlement_timeout())
        .await?;
    debug!(url = %response.url, "page settled");
    Ok(response)
}
