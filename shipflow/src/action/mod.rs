//! The external action boundary.
//!
//! Everything tool-specific lives behind [`ExternalAction`]: the engine
//! never interprets what an action does, it only sequences, gates, retries
//! and aggregates the signals actions return.

mod poll;
mod runner;

pub use poll::{Backoff, FixedBackoff, JitteredBackoff, PollPolicy, RetryPoller};
pub use runner::StepRunner;

use crate::cancellation::CancellationToken;
use crate::context::RunContext;
use crate::core::StepArtifact;
use async_trait::async_trait;
use std::fmt::Debug;

/// Raw completion signal from an invoked external tool.
///
/// Only the mapping to success or failure drives control flow; the exit
/// code itself is kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ActionSignal {
    /// Process-style exit code; zero means success.
    pub exit_code: i32,
    /// Artifacts the action declared (reports, logs).
    pub artifacts: Vec<StepArtifact>,
    /// Human-readable detail for diagnostics.
    pub detail: Option<String>,
}

impl ActionSignal {
    /// A successful completion with no artifacts.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            exit_code: 0,
            artifacts: Vec::new(),
            detail: None,
        }
    }

    /// A successful completion carrying artifacts.
    #[must_use]
    pub fn ok_with(artifacts: Vec<StepArtifact>) -> Self {
        Self {
            exit_code: 0,
            artifacts,
            detail: None,
        }
    }

    /// A failed completion.
    #[must_use]
    pub fn failed(exit_code: i32) -> Self {
        Self {
            exit_code,
            artifacts: Vec::new(),
            detail: None,
        }
    }

    /// Attaches diagnostic detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attaches artifacts.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Vec<StepArtifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Returns true if the signal indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A named, opaque unit of external work.
///
/// Implementations wrap concrete tool invocations (build an image, run a
/// scanner, push to a registry). They read what they need from the shared
/// [`RunContext`], may watch the [`CancellationToken`] during long
/// operations, and report completion through an [`ActionSignal`]. They must
/// not hold shared mutable state beyond their own result.
#[async_trait]
pub trait ExternalAction: Send + Sync + Debug {
    /// Returns the action name.
    fn name(&self) -> &str;

    /// Performs the work.
    async fn invoke(&self, ctx: &RunContext, cancel: &CancellationToken) -> ActionSignal;
}

/// A function-based action, mostly useful for wiring and tests.
pub struct FnAction<F>
where
    F: Fn(&RunContext) -> ActionSignal + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn(&RunContext) -> ActionSignal + Send + Sync,
{
    /// Creates a new function-based action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnAction<F>
where
    F: Fn(&RunContext) -> ActionSignal + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> ExternalAction for FnAction<F>
where
    F: Fn(&RunContext) -> ActionSignal + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, ctx: &RunContext, _cancel: &CancellationToken) -> ActionSignal {
        (self.func)(ctx)
    }
}

/// An action that always succeeds immediately.
#[derive(Debug, Clone)]
pub struct NoOpAction {
    name: String,
}

impl NoOpAction {
    /// Creates a no-op action.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ExternalAction for NoOpAction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _ctx: &RunContext, _cancel: &CancellationToken) -> ActionSignal {
        ActionSignal::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_context;

    #[tokio::test]
    async fn test_fn_action() {
        let action = FnAction::new("echo", |_ctx| ActionSignal::ok());
        assert_eq!(action.name(), "echo");

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let signal = action.invoke(&ctx, &cancel).await;
        assert!(signal.is_success());
    }

    #[tokio::test]
    async fn test_fn_action_reads_context() {
        let action = FnAction::new("tag", |ctx| {
            ActionSignal::ok().with_detail(ctx.image.build_tag(&ctx.build))
        });

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let signal = action.invoke(&ctx, &cancel).await;
        assert!(signal.detail.unwrap().ends_with(":7"));
    }

    #[test]
    fn test_noop_action() {
        let action = NoOpAction::new("noop");
        let ctx = test_context();
        let cancel = CancellationToken::new();
        assert!(tokio_test::block_on(action.invoke(&ctx, &cancel)).is_success());
    }

    #[test]
    fn test_signal_failure() {
        let signal = ActionSignal::failed(2).with_detail("bad exit");
        assert!(!signal.is_success());
        assert_eq!(signal.exit_code, 2);
    }
}
