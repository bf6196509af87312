//! Visual layout matrix.
//!
//! Every wizard page is captured at three viewport sizes and handed to a
//! [`SnapshotComparator`]. Pixel comparison itself happens outside this
//! crate; [`BaselineDirectory`] only records captures and accepts exact
//! repeats.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::controller::FormController;
use crate::driver::FormDriver;
use crate::locale::LanguageTag;
use crate::page_object::WizardStep;
use crate::result::{ProbeError, ProbeResult};
use crate::scenarios::ScenarioReport;
use crate::wait::LoadState;

/// Default directory of recorded snapshots
pub const DEFAULT_SNAPSHOT_DIR: &str = "test-data/visual-snapshots";

/// Default comparator threshold
pub const DEFAULT_SNAPSHOT_THRESHOLD: f64 = 1.0;

/// Named viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    /// 375×812
    Mobile,
    /// 768×1024
    Tablet,
    /// 1440×900
    Desktop,
}

impl Viewport {
    /// All viewports, smallest first
    pub const ALL: [Self; 3] = [Self::Mobile, Self::Tablet, Self::Desktop];

    /// Width and height in CSS pixels
    #[must_use]
    pub const fn size(self) -> (u32, u32) {
        match self {
            Self::Mobile => (375, 812),
            Self::Tablet => (768, 1024),
            Self::Desktop => (1440, 900),
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.size();
        write!(f, "{} ({width}x{height})", self.name())
    }
}

/// One cell of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualCase {
    /// Page captured
    pub step: WizardStep,
    /// Viewport it is captured at
    pub viewport: Viewport,
}

impl VisualCase {
    /// Every page at every viewport, page-major
    #[must_use]
    pub fn matrix() -> Vec<Self> {
        WizardStep::ALL
            .into_iter()
            .flat_map(|step| Viewport::ALL.into_iter().map(move |viewport| Self { step, viewport }))
            .collect()
    }

    /// Page name used in snapshot names
    #[must_use]
    pub fn page_name(&self) -> &'static str {
        self.step.page().page_name()
    }

    /// `ui-<page>-<viewport>.png`
    #[must_use]
    pub fn snapshot_name(&self) -> String {
        format!("ui-{}-{}.png", self.page_name(), self.viewport.name())
    }
}

/// A captured screenshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Snapshot file name
    pub name: String,
    /// PNG bytes
    pub data: Vec<u8>,
    /// Viewport width
    pub width: u32,
    /// Viewport height
    pub height: u32,
}

impl Snapshot {
    /// Create a new snapshot
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            width: 0,
            height: 0,
        }
    }

    /// Create with dimensions
    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Get snapshot size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// What a comparator concluded
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotVerdict {
    /// Within threshold of the baseline
    Match,
    /// No baseline existed; the capture became one
    Recorded {
        /// Where it was written
        path: PathBuf,
    },
    /// Outside threshold
    Mismatch {
        /// Comparator's explanation
        detail: String,
    },
}

impl SnapshotVerdict {
    /// Check if the capture is acceptable
    #[must_use]
    pub const fn is_acceptable(&self) -> bool {
        !matches!(self, Self::Mismatch { .. })
    }
}

/// Compares a capture with its baseline
pub trait SnapshotComparator: Send + Sync {
    /// Judge `snapshot` against its baseline with the given threshold
    fn compare(&self, snapshot: &Snapshot, threshold: f64) -> ProbeResult<SnapshotVerdict>;
}

/// Baselines kept as files named after the snapshot.
///
/// A missing baseline is recorded from the capture. Identical bytes match;
/// a threshold of `1.0` or more accepts any difference, anything lower
/// reports a mismatch for an external tool to judge.
#[derive(Debug, Clone)]
pub struct BaselineDirectory {
    dir: PathBuf,
}

impl BaselineDirectory {
    /// Baselines under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the baselines
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotComparator for BaselineDirectory {
    fn compare(&self, snapshot: &Snapshot, threshold: f64) -> ProbeResult<SnapshotVerdict> {
        let path = self.dir.join(&snapshot.name);
        if !path.exists() {
            std::fs::create_dir_all(&self.dir)?;
            std::fs::write(&path, &snapshot.data)?;
            info!(path = %path.display(), "baseline recorded");
            return Ok(SnapshotVerdict::Recorded { path });
        }

        let baseline = std::fs::read(&path)?;
        if baseline == snapshot.data || threshold >= 1.0 {
            return Ok(SnapshotVerdict::Match);
        }
        Ok(SnapshotVerdict::Mismatch {
            detail: format!(
                "{} differs from {} ({} vs {} bytes)",
                snapshot.name,
                path.display(),
                snapshot.size(),
                baseline.len()
            ),
        })
    }
}

impl<D: FormDriver> FormController<D> {
    /// Resize, open the page, wait for the network to go idle and capture
    pub async fn capture_layout(
        &mut self,
        base_url: &str,
        language: LanguageTag,
        case: VisualCase,
    ) -> ProbeResult<Snapshot> {
        let (width, height) = case.viewport.size();
        self.driver.set_viewport(width, height).await?;
        self.goto_step(base_url, case.step, language).await?;
        self.driver
            .wait_for_load_state(LoadState::NetworkIdle, self.wait.settlement_timeout())
            .await?;
        let data = self.driver.screenshot().await?;
        debug!(snapshot = %case.snapshot_name(), bytes = data.len(), "layout captured");
        Ok(Snapshot::new(case.snapshot_name(), data).with_dimensions(width, height))
    }

    /// Capture one cell and judge it; a mismatch is an assertion failure
    pub async fn verify_layout(
        &mut self,
        base_url: &str,
        language: LanguageTag,
        case: VisualCase,
        comparator: &dyn SnapshotComparator,
        threshold: f64,
    ) -> ProbeResult<SnapshotVerdict> {
        let snapshot = self.capture_layout(base_url, language, case).await?;
        match comparator.compare(&snapshot, threshold)? {
            SnapshotVerdict::Mismatch { detail } => Err(ProbeError::mismatch(
                snapshot.name,
                format!("a capture within threshold {threshold}"),
                detail,
            )),
            verdict => Ok(verdict),
        }
    }

    /// Run the whole matrix, one report per cell
    pub async fn verify_layout_matrix(
        &mut self,
        base_url: &str,
        language: LanguageTag,
        comparator: &dyn SnapshotComparator,
        threshold: f64,
    ) -> Vec<ScenarioReport> {
        let mut reports = Vec::new();
        for case in VisualCase::matrix() {
            let start = Instant::now();
            let name = format!("visual/{}", case.snapshot_name());
            let report = match self
                .verify_layout(base_url, language, case, comparator, threshold)
                .await
            {
                Ok(_) => ScenarioReport::pass(name, case.step),
                Err(e) => {
                    warn!(snapshot = %case.snapshot_name(), error = %e, "layout check failed");
                    ScenarioReport::fail(name, case.step, e.to_string())
                }
            };
            reports.push(report.with_elapsed(start.elapsed()));
        }
        reports
    }
}
