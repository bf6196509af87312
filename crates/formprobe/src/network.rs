//! Network observation: URL patterns, captured responses and the payload
//! shapes of the services the wizard calls.
//!
//! The engine never implements these services. It only reads their
//! responses to build expected values, and treats the analytics beacon as a
//! "page has settled" signal.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::result::{ProbeError, ProbeResult};

/// Analytics beacon used as the settlement signal
pub const SETTLEMENT_SIGNAL: &str = "**/g/collect?*";

/// Company information lookup
pub const COMPANY_INFORMATION: &str = "**/company-network-service/v1/company-information?*";

/// Pattern for matching request URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Contains substring
    Contains(String),
    /// Glob pattern (e.g., "**/g/collect?*")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Glob pattern
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// The settlement signal pattern
    #[must_use]
    pub fn settlement() -> Self {
        Self::glob(SETTLEMENT_SIGNAL)
    }

    /// Company search for a term, Dutch registry
    #[must_use]
    pub fn company_search(term: &str) -> Self {
        Self::glob(format!(
            "**/company-network-service/v1/companies?searchTerm={term}&countryCode=nl"
        ))
    }

    /// Company information lookup
    #[must_use]
    pub fn company_information() -> Self {
        Self::glob(COMPANY_INFORMATION)
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Contains(pattern) => url.contains(pattern),
            Self::Glob(pattern) => Self::glob_matches(pattern, url),
            Self::Any => true,
        }
    }

    /// Simple glob matching for URLs; `*` and `**` match any run of characters
    fn glob_matches(pattern: &str, url: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        let mut pos = 0;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            let is_last = i == parts.len() - 1;
            let found = if is_last {
                // the final literal must end the URL
                url[pos..].rfind(part).filter(|f| pos + f + part.len() == url.len())
            } else {
                url[pos..].find(part)
            };
            match found {
                Some(found) => {
                    if i == 0 && found != 0 {
                        return false;
                    }
                    pos += found + part.len();
                }
                None => return false,
            }
        }
        pattern.ends_with('*') || pos == url.len()
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) | Self::Contains(p) | Self::Glob(p) => write!(f, "{p}"),
            Self::Any => write!(f, "*"),
        }
    }
}

/// A response observed by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// Request URL
    pub url: String,
    /// HTTP status
    pub status: u16,
    /// Response body, when the driver could read it
    pub body: Option<String>,
}

impl CapturedResponse {
    /// Create a response
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body,
        }
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ProbeResult<T> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| ProbeError::driver(format!("response from {} has no body", self.url)))?;
        Ok(serde_json::from_str(body)?)
    }
}

/// Captured responses not yet consumed, oldest first.
///
/// Bounded: once full, each new response evicts the oldest one.
#[derive(Debug, Clone)]
pub struct ResponseLog {
    responses: VecDeque<CapturedResponse>,
    capacity: usize,
}

impl Default for ResponseLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl ResponseLog {
    /// Responses kept before the oldest is evicted
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create a log holding at most `capacity` responses
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            responses: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Record a response
    pub fn push(&mut self, response: CapturedResponse) {
        if self.responses.len() >= self.capacity {
            self.responses.pop_front();
        }
        self.responses.push_back(response);
    }

    /// Remove and return the oldest response matching `pattern`
    pub fn take(&mut self, pattern: &UrlPattern) -> Option<CapturedResponse> {
        let i = self.responses.iter().position(|r| pattern.matches(&r.url))?;
        self.responses.remove(i)
    }

    /// Drop every response
    pub fn clear(&mut self) {
        self.responses.clear();
    }

    /// Number of responses held
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Check if no response is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// One hit of the company search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    /// Registered company name
    pub name: String,
}

/// `.../companies?searchTerm=...` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySearchResponse {
    /// Matching companies, best first
    pub data: Vec<CompanySummary>,
}

/// Registered address of a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAddress {
    /// Street and number
    pub address_line: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
}

/// A person registered with the company (director)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Name as displayed in the director list
    pub full_name: String,
    /// Given name prefilled into the form
    pub first_name: String,
    /// Family name prefilled into the form
    pub last_name: String,
}

/// Company details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInformation {
    /// Registered name
    pub name: String,
    /// Chamber of commerce number
    pub coc_number: String,
    /// Registered address
    pub address: CompanyAddress,
    /// Registered people
    #[serde(default)]
    pub people: Vec<Person>,
}

/// `.../company-information?...` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInformationResponse {
    /// Company details
    pub data: CompanyInformation,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod response_log_tests {
        use super::*;

        fn response(url: &str) -> CapturedResponse {
            CapturedResponse::new(url, 200, None)
        }

        #[test]
        fn test_take_removes_oldest_match() {
            let mut log = ResponseLog::default();
            log.push(response("https://a.test/g/collect?v=1"));
            log.push(response("https://a.test/app.js"));
            log.push(response("https://a.test/g/collect?v=2"));

            let hit = log.take(&UrlPattern::settlement()).unwrap();
            assert_eq!(hit.url, "https://a.test/g/collect?v=1");
            assert_eq!(log.len(), 2);
            assert!(log.take(&UrlPattern::company_information()).is_none());
        }

        #[test]
        fn test_full_log_evicts_oldest() {
            let mut log = ResponseLog::with_capacity(2);
            for i in 0..5 {
                log.push(response(&format!("https://a.test/asset-{i}.png")));
            }
            assert_eq!(log.len(), 2);
            let first = log.take(&UrlPattern::glob("**/asset-*")).unwrap();
            assert_eq!(first.url, "https://a.test/asset-3.png");
        }

        #[test]
        fn test_clear() {
            let mut log = ResponseLog::with_capacity(0);
            log.push(response("https://a.test/"));
            assert_eq!(log.len(), 1);
            log.clear();
            assert!(log.is_empty());
        }
    }

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_settlement_signal() {
            let pattern = UrlPattern::settlement();
            assert!(pattern.matches(
                "https://region1.google-analytics.com/g/collect?v=2&tid=G-XYZ"
            ));
            assert!(!pattern.matches("https://my.bridgefund.nl/en/nl/request-loan/contact"));
        }

        #[test]
        fn test_company_search_requires_term() {
            let pattern = UrlPattern::company_search("34095964");
            assert!(pattern.matches(
                "https://api.example.nl/company-network-service/v1/companies?searchTerm=34095964&countryCode=nl"
            ));
            assert!(!pattern.matches(
                "https://api.example.nl/company-network-service/v1/companies?searchTerm=70304580&countryCode=nl"
            ));
            assert!(!pattern.matches(
                "https://api.example.nl/company-network-service/v1/companies?searchTerm=34095964&countryCode=nl&page=2"
            ));
        }

        #[test]
        fn test_company_information() {
            let pattern = UrlPattern::company_information();
            assert!(pattern.matches(
                "https://api.example.nl/company-network-service/v1/company-information?coc=34095964"
            ));
            assert!(!pattern.matches(
                "https://api.example.nl/company-network-service/v1/companies?searchTerm=x"
            ));
        }

        #[test]
        fn test_exact_contains_any() {
            assert!(UrlPattern::Exact("a".into()).matches("a"));
            assert!(!UrlPattern::Exact("a".into()).matches("ab"));
            assert!(UrlPattern::Contains("contact".into()).matches("/en/nl/request-loan/contact"));
            assert!(UrlPattern::Any.matches(""));
        }

        #[test]
        fn test_glob_literal_must_start_url() {
            let pattern = UrlPattern::glob("https://*");
            assert!(pattern.matches("https://x"));
            assert!(!pattern.matches("http://x"));
        }

        #[test]
        fn test_glob_repeated_suffix() {
            let pattern = UrlPattern::glob("*/amount");
            assert!(pattern.matches("/en/amount/amount"));
        }
    }

    mod response_tests {
        use super::*;

        #[test]
        fn test_company_information_shape() {
            let body = r#"{"data": {
                "name": "BridgeFund B.V.",
                "coc_number": "70304580",
                "address": {"address_line": "Keizersgracht 1", "postal_code": "1015 CJ", "city": "Amsterdam"},
                "people": [{"full_name": "Jan de Vries", "first_name": "Jan", "last_name": "de Vries", "role": "director"}],
                "sbi": []
            }}"#;
            let response = CapturedResponse::new("https://x/company-information?coc=1", 200, Some(body.into()));
            let info: CompanyInformationResponse = response.json().unwrap();
            assert_eq!(info.data.address.city, "Amsterdam");
            assert_eq!(info.data.people[0].last_name, "de Vries");
        }

        #[test]
        fn test_missing_body() {
            let response = CapturedResponse::new("https://x/g/collect?v=2", 204, None);
            let result: ProbeResult<serde_json::Value> = response.json();
            assert!(matches!(result, Err(ProbeError::Driver { .. })));
        }
    }
}
