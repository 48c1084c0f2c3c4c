//! Execution reports for stages and runs.

use crate::core::{RunStatus, StageKind, StageStatus, StepArtifact, StepOutcome};
use serde::{Deserialize, Serialize};

/// The resolved state of one stage after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// The stage name.
    pub name: String,
    /// The stage kind.
    pub kind: StageKind,
    /// The terminal status.
    pub status: StageStatus,
    /// Whether the stage was declared blocking.
    pub blocking: bool,
    /// The leaf outcome, absent for composites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StepOutcome>,
    /// Child reports, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StageReport>,
    /// Skip reason, when the stage was never entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl StageReport {
    /// Collects every artifact in the subtree, in stage order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<&StepArtifact> {
        let mut out = Vec::new();
        self.collect_artifacts(&mut out);
        out
    }

    fn collect_artifacts<'a>(&'a self, out: &mut Vec<&'a StepArtifact>) {
        if let Some(outcome) = &self.outcome {
            out.extend(outcome.artifacts.iter());
        }
        for child in &self.children {
            child.collect_artifacts(out);
        }
    }

    /// Names of stages in the subtree that failed advisorily.
    #[must_use]
    pub fn advisory_failures(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_advisory_failures(&mut out);
        out
    }

    fn collect_advisory_failures<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.status == StageStatus::Failed && !self.blocking {
            out.push(self.name.as_str());
        }
        for child in &self.children {
            child.collect_advisory_failures(out);
        }
    }

    /// Finds a report in the subtree by stage name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&StageReport> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

/// The result of a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The pipeline name.
    pub pipeline: String,
    /// The run ID.
    pub run_id: uuid::Uuid,
    /// Overall status: failed iff a blocking stage failed or the run was
    /// cancelled.
    pub status: RunStatus,
    /// Whether the run was cancelled.
    pub cancelled: bool,
    /// Cancellation reason, if cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// The resolved stage tree.
    pub root: StageReport,
    /// Finalizer failures as (name, message) pairs; logged, never fatal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizer_failures: Vec<(String, String)>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl RunReport {
    /// Returns true if the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}
