//! Locale Amount Formatter.
//!
//! The numeral input of the amount step displays loan amounts with the
//! grouping of the active language: `12,000` under `/en/`, `12.000`
//! otherwise. The same [`format_amount`] produces both the string typed
//! into the input and the string an already-filled input must show, so the
//! action and the oracle cannot drift apart.
//!
//! The locale is never cached: callers derive a [`LocaleContext`] from the
//! page's current URL at each call site, because back-navigation or a
//! language switch can change it between a fill and a verify.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::{ProbeError, ProbeResult};

/// Numeral convention of the active locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageTag {
    /// `en-US`: comma thousands, dot decimal
    #[serde(rename = "en-US", alias = "en")]
    EnUs,
    /// `nl-NL`: dot thousands, comma decimal
    #[serde(rename = "nl-NL", alias = "nl")]
    NlNl,
}

impl LanguageTag {
    /// BCP 47 tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::NlNl => "nl-NL",
        }
    }

    /// Thousands separator
    #[must_use]
    pub const fn group_separator(self) -> char {
        match self {
            Self::EnUs => ',',
            Self::NlNl => '.',
        }
    }

    /// Decimal separator
    #[must_use]
    pub const fn decimal_separator(self) -> char {
        match self {
            Self::EnUs => '.',
            Self::NlNl => ',',
        }
    }

    /// Language segment used in wizard URLs (`en` or `nl`)
    #[must_use]
    pub const fn url_segment(self) -> &'static str {
        match self {
            Self::EnUs => "en",
            Self::NlNl => "nl",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts the URL segment or the full tag, case-insensitively
impl FromStr for LanguageTag {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Self::EnUs),
            "nl" | "nl-nl" => Ok(Self::NlNl),
            other => Err(ProbeError::configuration(format!(
                "unsupported language '{other}', expected en or nl"
            ))),
        }
    }
}

/// Active numeral-formatting convention, derived from the navigation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocaleContext {
    /// Active language tag
    pub language_tag: LanguageTag,
}

impl LocaleContext {
    /// English (US) numerals
    #[must_use]
    pub const fn en_us() -> Self {
        Self {
            language_tag: LanguageTag::EnUs,
        }
    }

    /// Dutch numerals
    #[must_use]
    pub const fn nl_nl() -> Self {
        Self {
            language_tag: LanguageTag::NlNl,
        }
    }

    /// Derive the locale from a URL: an `/en/` path prefix selects `en-US`,
    /// anything else `nl-NL`.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let path = url_path(url);
        if path == "/en" || path.starts_with("/en/") {
            Self::en_us()
        } else {
            Self::nl_nl()
        }
    }
}

/// Path component of an absolute or relative URL
fn url_path(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(scheme_end) => {
            let after = &url[scheme_end + 3..];
            match after.find('/') {
                Some(path_start) => &after[path_start..],
                None => "/",
            }
        }
        None => url,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// A non-negative loan amount with an optional decimal fraction.
///
/// Trailing fractional zeros are dropped on construction, so `12000`,
/// `12000.0` and `12000.00` are the same amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    whole: u64,
    fraction: Option<String>,
}

impl Amount {
    /// Whole-unit amount
    #[must_use]
    pub const fn whole(units: u64) -> Self {
        Self {
            whole: units,
            fraction: None,
        }
    }

    /// Integer part
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.whole
    }

    /// Fraction digits, if any
    #[must_use]
    pub fn fraction(&self) -> Option<&str> {
        self.fraction.as_deref()
    }

    fn from_parts(whole: &str, fraction: Option<&str>, input: &str, locale: &str) -> ProbeResult<Self> {
        let invalid = || ProbeError::InvalidAmount {
            input: input.to_string(),
            locale: locale.to_string(),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole = whole.parse::<u64>().map_err(|_| invalid())?;
        let fraction = match fraction {
            None => None,
            Some(digits) => {
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                let trimmed = digits.trim_end_matches('0');
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        };
        Ok(Self { whole, fraction })
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self::whole(units)
    }
}

impl From<u32> for Amount {
    fn from(units: u32) -> Self {
        Self::whole(u64::from(units))
    }
}

/// Canonical machine form: plain digits, optional `.` fraction (`12000`, `12000.5`)
impl FromStr for Amount {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (s, None),
        };
        Self::from_parts(whole, fraction, s, "canonical")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fraction {
            Some(fraction) => write!(f, "{}.{fraction}", self.whole),
            None => write!(f, "{}", self.whole),
        }
    }
}

/// Group the integer digits with `separator` every three places
fn group_digits(whole: u64, separator: char) -> String {
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Format an amount the way the locale's numeral input displays it
#[must_use]
pub fn format_amount(amount: &Amount, locale: LocaleContext) -> String {
    let tag = locale.language_tag;
    let mut out = group_digits(amount.whole, tag.group_separator());
    if let Some(fraction) = &amount.fraction {
        out.push(tag.decimal_separator());
        out.push_str(fraction);
    }
    out
}

/// Format a canonical amount string (e.g. `"12000"`) for the locale
pub fn format_amount_str(amount: &str, locale: LocaleContext) -> ProbeResult<String> {
    let amount: Amount = amount.parse()?;
    Ok(format_amount(&amount, locale))
}

/// Digits of `whole` without group separators. Grouping is optional, but
/// when present every group after the first has exactly three digits.
fn ungroup(whole: &str, separator: char) -> Option<String> {
    let mut groups = whole.split(separator);
    let first = groups.next()?;
    if whole.contains(separator) && !(1..=3).contains(&first.len()) {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

/// Read a displayed, locale-formatted numeral back into an amount
pub fn parse_amount(displayed: &str, locale: LocaleContext) -> ProbeResult<Amount> {
    let tag = locale.language_tag;
    let compact: String = displayed.trim().chars().filter(|c| !c.is_whitespace()).collect();
    let (whole, fraction) = match compact.split_once(tag.decimal_separator()) {
        Some((w, f)) => (w, Some(f)),
        None => (compact.as_str(), None),
    };
    let whole = ungroup(whole, tag.group_separator()).unwrap_or_default();
    Amount::from_parts(&whole, fraction, displayed, tag.as_str())
}

/// Whether a displayed numeral denotes `amount` under `locale`
#[must_use]
pub fn parse_equivalent(displayed: &str, amount: &Amount, locale: LocaleContext) -> bool {
    parse_amount(displayed, locale).is_ok_and(|parsed| parsed == *amount)
}
