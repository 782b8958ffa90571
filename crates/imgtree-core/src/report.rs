//! Run report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};

use crate::image::RepoName;
use crate::version::Version;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Outcome of one image within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    /// Built (and, unless pushing was disabled, published) this run.
    Built { version: Version, pushed: bool },

    /// Not rebuilt; its current published version was bound so dependents
    /// could render against it.
    Reused { version: Version },

    /// The image's own step failed.
    Failed { kind: String, error: String },

    /// Never attempted because an ancestor (or, sequentially, any earlier
    /// image) did not produce a version.
    Skipped { blocked_on: RepoName },
}

impl ImageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImageOutcome::Built { .. } | ImageOutcome::Reused { .. })
    }
}

/// One image's entry in the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub repo: RepoName,

    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total number of images in the report
    pub total: usize,

    /// Number of images built this run
    pub built: usize,

    /// Number of images bound from the registry without a rebuild
    pub reused: usize,

    /// Number of images whose step failed
    pub failed: usize,

    /// Number of images skipped because of an earlier failure
    pub skipped: usize,
}

/// Run report (report.json v1)
///
/// This is the stable output format.
/// All fields are versioned and backward-compatible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: RunSummary,

    /// Per-image outcomes, in build order
    pub images: Vec<ImageResult>,
}

impl RunReport {
    /// Create a report from per-image results, computing the summary.
    pub fn from_results(images: Vec<ImageResult>) -> Self {
        let mut summary = RunSummary {
            total: images.len(),
            ..RunSummary::default()
        };

        for result in &images {
            match &result.outcome {
                ImageOutcome::Built { .. } => summary.built += 1,
                ImageOutcome::Reused { .. } => summary.reused += 1,
                ImageOutcome::Failed { .. } => summary.failed += 1,
                ImageOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            images,
        }
    }

    /// True only if every image succeeded; a skipped image counts as a
    /// run-level failure.
    pub fn succeeded(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
