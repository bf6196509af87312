//! Locator abstraction for element selection.
//!
//! Locators are plain values: they describe *where* an element is, never
//! touch the page themselves, and are handed to a [`crate::FormDriver`] for
//! every interaction. Web-component forms hide their inputs inside shadow
//! roots, so every CSS step pierces open shadow roots the way a browser
//! automation runtime does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default timeout for auto-waiting (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// JavaScript helper collecting matches of a CSS selector below a root,
/// descending into open shadow roots.
pub(crate) const DEEP_QUERY_PRELUDE: &str = "const __fpDeep = (root, sel) => { \
    const out = []; \
    const walk = (node) => { \
        node.querySelectorAll(sel).forEach(e => out.push(e)); \
        node.querySelectorAll('*').forEach(e => { if (e.shadowRoot) { walk(e.shadowRoot); } }); \
    }; \
    walk(root); \
    if (root.shadowRoot) { walk(root.shadowRoot); } \
    return Array.from(new Set(out)); \
};";

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "gr-button.button-primary")
    Css(String),
    /// CSS selector filtered by a text-content substring
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to find
        text: String,
    },
    /// CSS selector filtered by trimmed text content equality
    CssWithExactText {
        /// Base CSS selector
        css: String,
        /// Exact (trimmed) text content
        text: String,
    },
    /// Input or textarea with the given placeholder
    Placeholder(String),
    /// `child` searched inside every match of `parent`
    Descendant {
        /// Scoping selector
        parent: Box<Selector>,
        /// Selector evaluated below each parent match
        child: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    /// JavaScript expression evaluating to the array of matches below `roots`
    fn js_all_in(&self, roots: &str) -> String {
        match self {
            Self::Css(s) => format!("{roots}.flatMap(r => __fpDeep(r, {s:?}))"),
            Self::CssWithText { css, text } => format!(
                "{roots}.flatMap(r => __fpDeep(r, {css:?})).filter(e => (e.textContent || '').includes({text:?}))"
            ),
            Self::CssWithExactText { css, text } => format!(
                "{roots}.flatMap(r => __fpDeep(r, {css:?})).filter(e => (e.textContent || '').trim() === {text:?})"
            ),
            Self::Placeholder(p) => format!(
                "{roots}.flatMap(r => __fpDeep(r, 'input, textarea')).filter(e => e.placeholder === {p:?})"
            ),
            Self::Descendant { parent, child } => child.js_all_in(&parent.js_all_in(roots)),
        }
    }

    /// JavaScript expression (prelude included) evaluating to all matches
    #[must_use]
    pub fn to_query_all(&self) -> String {
        format!(
            "(() => {{ {DEEP_QUERY_PRELUDE} return {}; }})()",
            self.js_all_in("[document]")
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text({text:?})"),
            Self::CssWithExactText { css, text } => write!(f, "{css}:text-is({text:?})"),
            Self::Placeholder(p) => write!(f, "[placeholder={p:?}]"),
            Self::Descendant { parent, child } => write!(f, "{parent} >> {child}"),
        }
    }
}

/// Locator options for customizing behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

/// A locator for finding elements.
///
/// Strict by default: a driver refuses to act when more than one element
/// matches. [`Locator::first`] relaxes this to "first match wins".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Create a locator for an input with the given placeholder
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::placeholder(text))
    }

    /// Scope a CSS selector below this locator
    #[must_use]
    pub fn locator(self, css: impl Into<String>) -> Self {
        self.descend(Selector::Css(css.into()))
    }

    /// Scope an arbitrary selector below this locator
    #[must_use]
    pub fn descend(self, child: Selector) -> Self {
        Self {
            selector: Selector::Descendant {
                parent: Box::new(self.selector),
                child: Box::new(child),
            },
            options: self.options,
        }
    }

    /// Filter by a text-content substring
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        let selector = match self.selector {
            Selector::Css(css) => Selector::CssWithText { css, text },
            Selector::Descendant { parent, child } => match *child {
                Selector::Css(css) => Selector::Descendant {
                    parent,
                    child: Box::new(Selector::CssWithText { css, text }),
                },
                other => Selector::Descendant {
                    parent,
                    child: Box::new(other),
                },
            },
            other => other,
        };
        Self {
            selector,
            options: self.options,
        }
    }

    /// Filter by trimmed text-content equality
    #[must_use]
    pub fn with_exact_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        let selector = match self.selector {
            Selector::Css(css) => Selector::CssWithExactText { css, text },
            Selector::Descendant { parent, child } => match *child {
                Selector::Css(css) => Selector::Descendant {
                    parent,
                    child: Box::new(Selector::CssWithExactText { css, text }),
                },
                other => Selector::Descendant {
                    parent,
                    child: Box::new(other),
                },
            },
            other => other,
        };
        Self {
            selector,
            options: self.options,
        }
    }

    /// Allow multiple matches and act on the first one
    #[must_use]
    pub const fn first(mut self) -> Self {
        self.options.strict = false;
        self
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Human-readable address used in logs and error messages
    #[must_use]
    pub fn address(&self) -> String {
        self.selector.to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query_uses_deep_helper() {
            let query = Selector::css("gr-button.button-primary").to_query_all();
            assert!(query.contains("__fpDeep"));
            assert!(query.contains("\"gr-button.button-primary\""));
        }

        #[test]
        fn test_exact_text_query_trims() {
            let sel = Selector::CssWithExactText {
                css: "gr-menu-item".to_string(),
                text: "Equity".to_string(),
            };
            let query = sel.to_query_all();
            assert!(query.contains(".trim() === \"Equity\""));
        }

        #[test]
        fn test_placeholder_query() {
            let query = Selector::placeholder("Phone number").to_query_all();
            assert!(query.contains("e.placeholder === \"Phone number\""));
        }

        #[test]
        fn test_descendant_scopes_child_in_parent() {
            let loc = Locator::new("gr-select[name=\"loanGoal\"]").locator("gr-dropdown#dropdown-4");
            let query = loc.selector().to_query_all();
            let parent_at = query.find("loanGoal").unwrap();
            let child_at = query.find("dropdown-4").unwrap();
            assert!(parent_at < child_at);
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_locator_address_chain() {
            let loc = Locator::new("gr-select[name=\"loanPeriods\"]").locator("gr-dropdown#dropdown-1");
            assert_eq!(
                loc.address(),
                "gr-select[name=\"loanPeriods\"] >> gr-dropdown#dropdown-1"
            );
        }

        #[test]
        fn test_with_text_on_css() {
            let loc = Locator::new(".mt-5 li span").with_text("BridgeFund");
            assert_eq!(loc.address(), ".mt-5 li span:has-text(\"BridgeFund\")");
        }

        #[test]
        fn test_with_exact_text_on_descendant_child() {
            let loc = Locator::new(".w-full").locator("gr-radio").with_exact_text("Jan Jansen");
            assert_eq!(loc.address(), ".w-full >> gr-radio:text-is(\"Jan Jansen\")");
        }

        #[test]
        fn test_locator_strict_by_default() {
            let loc = Locator::new("gr-menu-item");
            assert!(loc.options().strict);
            assert!(!loc.first().options().strict);
        }

        #[test]
        fn test_locator_timeout() {
            let loc = Locator::new("input").with_timeout(Duration::from_secs(1));
            assert_eq!(loc.options().timeout, Duration::from_secs(1));
        }

        #[test]
        fn test_default_options() {
            let opts = LocatorOptions::default();
            assert_eq!(opts.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
            assert_eq!(opts.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        }
    }

    mod geometry_tests {
        use super::*;

        #[test]
        fn test_bounding_box_contains_edges() {
            let bbox = BoundingBox::new(0.0, 0.0, 100.0, 10.0);
            assert!(bbox.contains(&Point::new(0.0, 0.0)));
            assert!(bbox.contains(&Point::new(100.0, 10.0)));
            assert!(!bbox.contains(&Point::new(100.1, 5.0)));
        }
    }
}
