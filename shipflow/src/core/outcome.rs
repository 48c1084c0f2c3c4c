//! Step outcome type and the pure status aggregation rule.

use super::{StageStatus, StepArtifact};
use serde::{Deserialize, Serialize};

/// The result of executing one leaf action.
///
/// `StepOutcome` is immutable once produced. Failures are converted to
/// status values here, at the lowest level, and aggregated upward by
/// [`aggregate_status`] rather than by errors crossing component
/// boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    /// The terminal status of the step.
    pub status: StageStatus,

    /// Raw completion signal from the invoked tool. Diagnostics only; it
    /// never drives control flow beyond its mapping to `status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,

    /// True when the step was declared non-blocking, so a failure here is
    /// informational rather than fatal.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub advisory: bool,

    /// Artifacts produced by the step, handed to the finalizer chain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<StepArtifact>,

    /// Error message (for failed steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Skip reason (for skipped steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    /// Number of invocations made, when the step ran under a poll policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl StepOutcome {
    /// Creates a successful outcome with no artifacts.
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            status: StageStatus::Succeeded,
            exit_signal: Some(0),
            advisory: false,
            artifacts: Vec::new(),
            error: None,
            skip_reason: None,
            attempts: None,
        }
    }

    /// Creates a successful outcome carrying artifacts.
    #[must_use]
    pub fn succeeded_with(artifacts: Vec<StepArtifact>) -> Self {
        Self {
            artifacts,
            ..Self::succeeded()
        }
    }

    /// Creates a failed outcome from a raw completion signal.
    #[must_use]
    pub fn failed(exit_signal: i32, error: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Failed,
            exit_signal: Some(exit_signal),
            advisory: false,
            artifacts: Vec::new(),
            error: Some(error.into()),
            skip_reason: None,
            attempts: None,
        }
    }

    /// Creates a skipped outcome with a reason.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Skipped,
            exit_signal: None,
            advisory: false,
            artifacts: Vec::new(),
            error: None,
            skip_reason: Some(reason.into()),
            attempts: None,
        }
    }

    /// Flags the outcome as advisory (produced by a non-blocking step).
    #[must_use]
    pub fn advisory(mut self) -> Self {
        self.advisory = true;
        self
    }

    /// Attaches artifacts to the outcome.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Vec<StepArtifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Records how many invocations were made under a poll policy.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Returns true if the outcome indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the outcome indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Rolls child statuses up into a parent status.
///
/// Each entry pairs a child's `blocking` flag with its resolved status.
/// The rule: `Failed` if any blocking child failed; `Skipped` only if every
/// child was skipped; `Succeeded` otherwise. Advisory (non-blocking)
/// failures never flip the parent.
#[must_use]
pub fn aggregate_status(children: &[(bool, StageStatus)]) -> StageStatus {
    let fatal = children
        .iter()
        .any(|(blocking, status)| *blocking && *status == StageStatus::Failed);
    if fatal {
        return StageStatus::Failed;
    }

    let all_skipped = !children.is_empty()
        && children
            .iter()
            .all(|(_, status)| *status == StageStatus::Skipped);
    if all_skipped {
        StageStatus::Skipped
    } else {
        StageStatus::Succeeded
    }
}
