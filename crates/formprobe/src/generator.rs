//! Random Requirements Generator.
//!
//! Produces schema-valid payloads from the catalog. Every generator runs off
//! an explicit seed so a failing scenario can be replayed with the same
//! values; an unseeded generator draws its seed from entropy and reports it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::catalog::{Catalog, DropdownFamily, FieldCatalogEntry};
use crate::payload::{RequirementsPayload, Selection};
use crate::result::{ProbeError, ProbeResult};

/// Smallest generated loan amount
pub const DEFAULT_MIN_AMOUNT: u64 = 5_000;

/// Largest generated loan amount
pub const DEFAULT_MAX_AMOUNT: u64 = 250_000;

/// Lattice step of generated loan amounts
pub const DEFAULT_AMOUNT_STEP: u64 = 1_000;

/// Amount lattice `min, min + step, ..., max` (bounds inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountRange {
    /// Lower bound
    pub min: u64,
    /// Upper bound
    pub max: u64,
    /// Step between lattice points
    pub step: u64,
}

impl Default for AmountRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_AMOUNT,
            max: DEFAULT_MAX_AMOUNT,
            step: DEFAULT_AMOUNT_STEP,
        }
    }
}

impl AmountRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: u64, max: u64, step: u64) -> Self {
        Self { min, max, step }
    }

    /// Number of lattice points above `min`
    fn steps(&self) -> ProbeResult<u64> {
        if self.step == 0 || self.min > self.max {
            return Err(ProbeError::configuration(format!(
                "invalid amount range {}..={} step {}",
                self.min, self.max, self.step
            )));
        }
        Ok((self.max - self.min) / self.step)
    }

    /// Whether `amount` lies on the lattice
    #[must_use]
    pub fn contains(&self, amount: u64) -> bool {
        self.step != 0
            && amount >= self.min
            && amount <= self.max
            && (amount - self.min) % self.step == 0
    }
}

/// Seeded payload generator
#[derive(Debug)]
pub struct RequirementsGenerator {
    seed: u64,
    rng: StdRng,
    range: AmountRange,
}

impl Default for RequirementsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementsGenerator {
    /// Generator seeded from entropy; the seed is logged and kept for replay
    #[must_use]
    pub fn new() -> Self {
        let seed = rand::random::<u64>();
        info!(seed, "requirements generator seeded from entropy");
        Self::with_seed(seed)
    }

    /// Deterministic generator
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            range: AmountRange::default(),
        }
    }

    /// Override the amount lattice used by [`Self::generate_requirements`]
    #[must_use]
    pub const fn with_range(mut self, range: AmountRange) -> Self {
        self.range = range;
        self
    }

    /// Seed driving this generator
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform sample of `min + step * k`, `k ∈ 0..=(max-min)/step`
    pub fn generate_amount(&mut self, range: AmountRange) -> ProbeResult<u64> {
        let steps = range.steps()?;
        let k = self.rng.gen_range(0..=steps);
        Ok(range.min + range.step * k)
    }

    /// Uniform pick among an entry's options
    pub fn pick_option(&mut self, entry: &FieldCatalogEntry) -> ProbeResult<String> {
        if entry.options.is_empty() {
            return Err(ProbeError::configuration(format!(
                "no options for field '{}'",
                entry.field
            )));
        }
        let index = self.rng.gen_range(0..entry.options.len());
        Ok(entry.options[index].clone())
    }

    /// Uniform pick of an index into a non-empty slice length
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    /// One payload covering all four dropdown families plus an amount
    pub fn generate_requirements(&mut self, catalog: &Catalog) -> ProbeResult<RequirementsPayload> {
        let amount = self.generate_amount(self.range)?;
        let selections = DropdownFamily::ALL
            .into_iter()
            .map(|family| {
                let entry = catalog.entry(family);
                self.pick_option(entry)
                    .map(|value| Selection::new(entry.field.clone(), value))
            })
            .collect::<ProbeResult<Vec<_>>>()?;
        Ok(RequirementsPayload::new(amount.to_string(), selections))
    }
}
