//! Executes one external action and maps its signal to an outcome.

use super::ExternalAction;
use crate::cancellation::CancellationToken;
use crate::context::RunContext;
use crate::core::StepOutcome;
use tracing::{debug, warn};

/// Runs single actions.
///
/// The runner never aborts the process on failure: a failing action yields
/// a `Failed` outcome and escalation is the graph executor's call, keeping
/// one point of control-flow decision-making. Non-blocking steps get the
/// same outcome flagged advisory so reporting can tell "this broke the
/// build" apart from "this is informational".
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRunner;

impl StepRunner {
    /// Invokes `action` once and captures its outcome.
    ///
    /// If the run is already cancelled the action is not started and a
    /// skipped outcome is returned.
    pub async fn run(
        action: &dyn ExternalAction,
        blocking: bool,
        ctx: &RunContext,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        if cancel.is_cancelled() {
            return StepOutcome::skipped("run cancelled");
        }

        debug!(action = action.name(), blocking, "invoking action");
        let signal = action.invoke(ctx, cancel).await;

        let outcome = if signal.is_success() {
            StepOutcome::succeeded_with(signal.artifacts)
        } else {
            let error = signal
                .detail
                .unwrap_or_else(|| format!("action '{}' signalled failure", action.name()));
            warn!(
                action = action.name(),
                exit_signal = signal.exit_code,
                advisory = !blocking,
                "action failed"
            );
            // Artifacts are kept on failure; reports from failed checks are
            // exactly what a human needs to diagnose the run.
            let failed = StepOutcome::failed(signal.exit_code, error).with_artifacts(signal.artifacts);
            if blocking {
                failed
            } else {
                failed.advisory()
            }
        };

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionSignal, FnAction};
    use crate::core::{StageStatus, StepArtifact};
    use crate::testing::test_context;

    #[tokio::test]
    async fn test_run_success_collects_artifacts() {
        let action = FnAction::new("tests", |_ctx| {
            ActionSignal::ok_with(vec![StepArtifact::inline(
                "junit.xml",
                "junit",
                "tests",
                b"<testsuite/>".to_vec(),
            )])
        });

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = StepRunner::run(&action, true, &ctx, &cancel).await;

        assert_eq!(outcome.status, StageStatus::Succeeded);
        assert_eq!(outcome.artifacts.len(), 1);
        assert!(!outcome.advisory);
    }

    #[tokio::test]
    async fn test_run_blocking_failure_does_not_panic_or_abort() {
        let action = FnAction::new("push", |_ctx| ActionSignal::failed(1).with_detail("denied"));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = StepRunner::run(&action, true, &ctx, &cancel).await;

        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(outcome.exit_signal, Some(1));
        assert_eq!(outcome.error.as_deref(), Some("denied"));
        assert!(!outcome.advisory);
    }

    #[tokio::test]
    async fn test_run_non_blocking_failure_flagged_advisory() {
        let action = FnAction::new("lint", |_ctx| ActionSignal::failed(1));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = StepRunner::run(&action, false, &ctx, &cancel).await;

        assert_eq!(outcome.status, StageStatus::Failed);
        assert!(outcome.advisory);
    }

    #[tokio::test]
    async fn test_failure_keeps_artifacts() {
        let action = FnAction::new("sast", |_ctx| {
            ActionSignal::failed(3).with_artifacts(vec![StepArtifact::inline(
                "sast.json",
                "report",
                "sast",
                b"{}".to_vec(),
            )])
        });

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = StepRunner::run(&action, false, &ctx, &cancel).await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.artifacts.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_action() {
        let action = FnAction::new("never", |_ctx| {
            panic!("action must not be invoked after cancellation")
        });

        let ctx = test_context();
        let cancel = CancellationToken::new();
        cancel.cancel("user abort");

        let outcome = StepRunner::run(&action, true, &ctx, &cancel).await;
        assert_eq!(outcome.status, StageStatus::Skipped);
    }
}
