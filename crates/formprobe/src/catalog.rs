//! Field catalog: the declarative options of every dropdown family.
//!
//! Loaded once at startup and shared read-only by every scenario.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::result::{ProbeError, ProbeResult};

/// Catalog bundled with the crate, mirroring the loan wizard's option lists
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

/// One of the four selection groups of the amount step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropdownFamily {
    /// Loan period / loan type
    LoanPeriod,
    /// Annual company turnover
    AnnualTurnover,
    /// When the loan is needed
    LoanDeadline,
    /// What the loan is for
    LoanGoal,
}

impl DropdownFamily {
    /// All families, in form order
    pub const ALL: [Self; 4] = [
        Self::LoanPeriod,
        Self::AnnualTurnover,
        Self::LoanDeadline,
        Self::LoanGoal,
    ];

    /// Key of this family in the catalog document
    #[must_use]
    pub const fn catalog_key(self) -> &'static str {
        match self {
            Self::LoanPeriod => "loanPeriodDropdown",
            Self::AnnualTurnover => "annualTurnoverDropdown",
            Self::LoanDeadline => "loanDeadlineDropdown",
            Self::LoanGoal => "loanGoalDropdown",
        }
    }
}

impl fmt::Display for DropdownFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.catalog_key())
    }
}

/// Options of one dropdown family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalogEntry {
    /// Wire-level field name (e.g. `loanPeriods`)
    pub field: String,
    /// Display labels, in page order
    pub options: Vec<String>,
}

impl FieldCatalogEntry {
    /// Create an entry
    #[must_use]
    pub fn new(field: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            field: field.into(),
            options,
        }
    }
}

/// The complete catalog: exactly one entry per [`DropdownFamily`].
///
/// The catalog key → wire field mapping is explicit: each entry carries its
/// own `field`, nothing is inferred from the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    loan_period_dropdown: FieldCatalogEntry,
    annual_turnover_dropdown: FieldCatalogEntry,
    loan_deadline_dropdown: FieldCatalogEntry,
    loan_goal_dropdown: FieldCatalogEntry,
}

impl Catalog {
    /// Build a catalog from its four entries
    pub fn new(
        loan_period: FieldCatalogEntry,
        annual_turnover: FieldCatalogEntry,
        loan_deadline: FieldCatalogEntry,
        loan_goal: FieldCatalogEntry,
    ) -> ProbeResult<Self> {
        let catalog = Self {
            loan_period_dropdown: loan_period,
            annual_turnover_dropdown: annual_turnover,
            loan_deadline_dropdown: loan_deadline,
            loan_goal_dropdown: loan_goal,
        };
        catalog.check_fields()?;
        Ok(catalog)
    }

    /// The catalog bundled with the crate
    pub fn builtin() -> ProbeResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Parse a YAML catalog document
    pub fn from_yaml_str(content: &str) -> ProbeResult<Self> {
        let catalog: Self = serde_yaml_ng::from_str(content)?;
        catalog.check_fields()?;
        Ok(catalog)
    }

    /// Parse a JSON catalog document
    pub fn from_json_str(content: &str) -> ProbeResult<Self> {
        let catalog: Self = serde_json::from_str(content)?;
        catalog.check_fields()?;
        Ok(catalog)
    }

    /// Load a catalog file; `.json` is read as JSON, `.yaml`/`.yml` as YAML
    pub fn from_path(path: &Path) -> ProbeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Err(ProbeError::configuration(format!(
                "unsupported catalog format: {}",
                path.display()
            ))),
        }
    }

    /// Entry of a family
    #[must_use]
    pub const fn entry(&self, family: DropdownFamily) -> &FieldCatalogEntry {
        match family {
            DropdownFamily::LoanPeriod => &self.loan_period_dropdown,
            DropdownFamily::AnnualTurnover => &self.annual_turnover_dropdown,
            DropdownFamily::LoanDeadline => &self.loan_deadline_dropdown,
            DropdownFamily::LoanGoal => &self.loan_goal_dropdown,
        }
    }

    /// Entries in form order
    pub fn entries(&self) -> impl Iterator<Item = (DropdownFamily, &FieldCatalogEntry)> {
        DropdownFamily::ALL.into_iter().map(|f| (f, self.entry(f)))
    }

    /// Family owning a wire-level field name
    #[must_use]
    pub fn family_of(&self, field: &str) -> Option<DropdownFamily> {
        self.entries()
            .find(|(_, entry)| entry.field == field)
            .map(|(family, _)| family)
    }

    /// Whether a wire-level field belongs to the catalog
    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.family_of(field).is_some()
    }

    /// Check every family has at least one option.
    ///
    /// Loading does not enforce this; generation reports an empty family when
    /// it reaches it. Call this to reject such a catalog up front.
    pub fn validate(&self) -> ProbeResult<()> {
        self.check_fields()?;
        for (family, entry) in self.entries() {
            if entry.options.is_empty() {
                return Err(ProbeError::configuration(format!(
                    "{family} ({}) has no options",
                    entry.field
                )));
            }
        }
        Ok(())
    }

    fn check_fields(&self) -> ProbeResult<()> {
        let mut seen = HashSet::new();
        for (family, entry) in self.entries() {
            if entry.field.trim().is_empty() {
                return Err(ProbeError::configuration(format!(
                    "{family} has an empty field name"
                )));
            }
            if !seen.insert(entry.field.as_str()) {
                return Err(ProbeError::configuration(format!(
                    "field '{}' is mapped by more than one family",
                    entry.field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(field: &str, options: &[&str]) -> FieldCatalogEntry {
        FieldCatalogEntry::new(field, options.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        catalog.validate().unwrap();
        assert_eq!(catalog.entry(DropdownFamily::LoanPeriod).field, "loanPeriods");
        assert_eq!(catalog.entry(DropdownFamily::AnnualTurnover).field, "companyRevenue");
        assert_eq!(catalog.entry(DropdownFamily::LoanDeadline).field, "loanDeadline");
        assert_eq!(catalog.entry(DropdownFamily::LoanGoal).field, "loanGoal");
        assert!(catalog
            .entry(DropdownFamily::AnnualTurnover)
            .options
            .contains(&"€150.000 - €500.000".to_string()));
    }

    #[test]
    fn test_family_lookup() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.family_of("loanGoal"), Some(DropdownFamily::LoanGoal));
        assert!(catalog.contains_field("companyRevenue"));
        assert!(!catalog.contains_field("annualTurnoverDropdown"));
    }

    #[test]
    fn test_json_catalog() {
        let json = r#"{
            "loanPeriodDropdown": {"field": "loanPeriods", "options": ["Fixed rate loan"]},
            "annualTurnoverDropdown": {"field": "companyRevenue", "options": ["Less than €25.000"]},
            "loanDeadlineDropdown": {"field": "loanDeadline", "options": ["No rush"]},
            "loanGoalDropdown": {"field": "loanGoal", "options": ["Equity"]}
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.entry(DropdownFamily::LoanDeadline).options, vec!["No rush"]);
    }

    #[test]
    fn test_missing_family_is_rejected() {
        let json = r#"{
            "loanPeriodDropdown": {"field": "loanPeriods", "options": ["a"]},
            "annualTurnoverDropdown": {"field": "companyRevenue", "options": ["b"]},
            "loanDeadlineDropdown": {"field": "loanDeadline", "options": ["c"]}
        }"#;
        assert!(matches!(Catalog::from_json_str(json), Err(ProbeError::Json(_))));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let result = Catalog::new(
            entry("loanPeriods", &["a"]),
            entry("loanPeriods", &["b"]),
            entry("loanDeadline", &["c"]),
            entry("loanGoal", &["d"]),
        );
        assert!(matches!(result, Err(ProbeError::Configuration { .. })));
    }

    #[test]
    fn test_empty_options_load_but_fail_validation() {
        let catalog = Catalog::new(
            entry("loanPeriods", &[]),
            entry("companyRevenue", &["b"]),
            entry("loanDeadline", &["c"]),
            entry("loanGoal", &["d"]),
        )
        .unwrap();
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("loanPeriodDropdown"));
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("catalog.yml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        file.write_all(BUILTIN_CATALOG.as_bytes()).unwrap();
        assert!(Catalog::from_path(&yaml_path).is_ok());

        let txt_path = dir.path().join("catalog.txt");
        std::fs::write(&txt_path, BUILTIN_CATALOG).unwrap();
        assert!(matches!(
            Catalog::from_path(&txt_path),
            Err(ProbeError::Configuration { .. })
        ));
    }
}
