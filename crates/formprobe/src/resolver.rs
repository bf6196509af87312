//! Locator Resolver: semantic dropdown field names to control addresses.
//!
//! The loan wizard renders every dropdown as a `gr-select[name=<field>]`
//! wrapping a `gr-dropdown#dropdown-<ordinal>`. The ordinal is positional
//! and fixed per field, so it lives in a constant table.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::locator::Locator;

/// Ordinal used for any field missing from [`DROPDOWN_ORDINALS`].
///
/// Resolving to it never fails; the resulting address may point at an
/// unintended or absent control, which then surfaces later as a wait
/// timeout or a mismatch rather than here.
pub const FALLBACK_ORDINAL: u32 = 0;

/// Fixed field → ordinal table of the amount step
pub const DROPDOWN_ORDINALS: [(&str, u32); 4] = [
    ("loanPeriods", 1),
    ("companyRevenue", 2),
    ("loanDeadline", 3),
    ("loanGoal", 4),
];

/// Resolved position of a field's control within its container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropdownAddress {
    /// Wire-level field name (e.g. `loanPeriods`)
    pub field: String,
    /// Positional index of the dropdown control
    pub ordinal: u32,
}

impl DropdownAddress {
    /// Resolve a field to its address
    #[must_use]
    pub fn resolve(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ordinal: resolve_dropdown_ordinal(field),
        }
    }

    /// Whether this address came from the fallback rather than the table
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        lookup(&self.field).is_none()
    }

    /// Container locator (`gr-select[name=...]`)
    #[must_use]
    pub fn container(&self) -> Locator {
        Locator::new(format!("gr-select[name=\"{}\"]", self.field))
    }

    /// Control locator (container scoped to `gr-dropdown#dropdown-<ordinal>`)
    #[must_use]
    pub fn control(&self) -> Locator {
        self.container()
            .locator(format!("gr-dropdown#dropdown-{}", self.ordinal))
    }
}

fn lookup(field: &str) -> Option<u32> {
    DROPDOWN_ORDINALS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, ordinal)| *ordinal)
}

/// Map a dropdown field name to its ordinal.
///
/// Unknown fields resolve to [`FALLBACK_ORDINAL`].
#[must_use]
pub fn resolve_dropdown_ordinal(field: &str) -> u32 {
    lookup(field).unwrap_or_else(|| {
        warn!(field, "unmapped dropdown field, using fallback ordinal");
        FALLBACK_ORDINAL
    })
}

/// Compose the unique control address for a dropdown field
#[must_use]
pub fn resolve_control_address(field: &str) -> Locator {
    DropdownAddress::resolve(field).control()
}
