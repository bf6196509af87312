//! Requirements payload: the values of one filled-in amount step.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::result::{ProbeError, ProbeResult};

/// One dropdown selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Wire-level field name
    pub field: String,
    /// Display label to select
    pub value: String,
}

impl Selection {
    /// Create a selection
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Amount plus one selection per dropdown family.
///
/// Serializes as `{"loanAmount": "...", "dropdowns": [{"field", "value"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsPayload {
    /// Loan amount in canonical form (e.g. `"12000"`); formatted per locale
    /// when typed or verified
    #[serde(rename = "loanAmount")]
    pub loan_amount: String,
    /// Selections, in execution order
    #[serde(rename = "dropdowns")]
    pub selections: Vec<Selection>,
}

impl RequirementsPayload {
    /// Create a payload
    #[must_use]
    pub fn new(loan_amount: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            loan_amount: loan_amount.into(),
            selections,
        }
    }

    /// Selected value for a field
    #[must_use]
    pub fn value_of(&self, field: &str) -> Option<&str> {
        self.selections
            .iter()
            .find(|s| s.field == field)
            .map(|s| s.value.as_str())
    }

    /// Check the payload against the catalog: every field known, no
    /// duplicates, exactly the catalog's families covered.
    pub fn validate(&self, catalog: &Catalog) -> ProbeResult<()> {
        let mut seen = HashSet::new();
        for selection in &self.selections {
            if !catalog.contains_field(&selection.field) {
                return Err(ProbeError::configuration(format!(
                    "field '{}' is not in the catalog",
                    selection.field
                )));
            }
            if !seen.insert(selection.field.as_str()) {
                return Err(ProbeError::configuration(format!(
                    "field '{}' is selected more than once",
                    selection.field
                )));
            }
        }
        for (family, entry) in catalog.entries() {
            if !seen.contains(entry.field.as_str()) {
                return Err(ProbeError::configuration(format!(
                    "{family} ({}) has no selection",
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

    fn scenario_a() -> RequirementsPayload {
        RequirementsPayload::new(
            "12000",
            vec![
                Selection::new("loanPeriods", "Fixed rate loan"),
                Selection::new("companyRevenue", "€150.000 - €500.000"),
                Selection::new("loanDeadline", "Within a week"),
                Selection::new("loanGoal", "Equity"),
            ],
        )
    }

    #[test]
    fn test_valid_payload() {
        let catalog = Catalog::builtin().unwrap();
        scenario_a().validate(&catalog).unwrap();
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(scenario_a()).unwrap();
        assert_eq!(json["loanAmount"], "12000");
        assert_eq!(json["dropdowns"][3]["field"], "loanGoal");
        assert_eq!(json["dropdowns"][3]["value"], "Equity");
    }

    #[test]
    fn test_unknown_field() {
        let catalog = Catalog::builtin().unwrap();
        let mut payload = scenario_a();
        payload.selections[0].field = "loanType".to_string();
        let err = payload.validate(&catalog).unwrap_err();
        assert!(err.to_string().contains("loanType"));
    }

    #[test]
    fn test_duplicate_field() {
        let catalog = Catalog::builtin().unwrap();
        let mut payload = scenario_a();
        payload.selections[1] = Selection::new("loanPeriods", "Withdraw in installments");
        assert!(payload.validate(&catalog).unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_family() {
        let catalog = Catalog::builtin().unwrap();
        let mut payload = scenario_a();
        payload.selections.pop();
        assert!(payload.validate(&catalog).unwrap_err().to_string().contains("loanGoalDropdown"));
    }

    #[test]
    fn test_value_of() {
        let payload = scenario_a();
        assert_eq!(payload.value_of("loanDeadline"), Some("Within a week"));
        assert_eq!(payload.value_of("nope"), None);
    }
}
