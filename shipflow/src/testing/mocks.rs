//! Scripted actions and guards for exercising the engine without real tools.

use crate::action::{ActionSignal, ExternalAction};
use crate::cancellation::CancellationToken;
use crate::context::{BuildIdentity, CredentialBundle, ImageCoordinates, RunContext};
use crate::graph::Guard;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Returns a run context suitable for tests.
#[must_use]
pub fn test_context() -> RunContext {
    RunContext::new(
        BuildIdentity::new(7, "abc1234"),
        ImageCoordinates::new("registry.test", "team/service"),
        "main",
        CredentialBundle::new("ci-bot", "test-password", "test-git-token"),
    )
}

/// Returns a run context on a specific branch.
#[must_use]
pub fn test_context_on_branch(branch: &str) -> RunContext {
    RunContext::new(
        BuildIdentity::new(7, "abc1234"),
        ImageCoordinates::new("registry.test", "team/service"),
        branch,
        CredentialBundle::new("ci-bot", "test-password", "test-git-token"),
    )
}

/// An action that fails its first `failures` invocations, then succeeds.
///
/// Models a service that becomes ready after a warm-up period.
#[derive(Debug)]
pub struct FailNTimesAction {
    name: String,
    failures: u32,
    calls: AtomicU32,
}

impl FailNTimesAction {
    /// Creates the action.
    #[must_use]
    pub fn new(name: impl Into<String>, failures: u32) -> Self {
        Self {
            name: name.into(),
            failures,
            calls: AtomicU32::new(0),
        }
    }

    /// Returns how many times the action has been invoked.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalAction for FailNTimesAction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _ctx: &RunContext, _cancel: &CancellationToken) -> ActionSignal {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            ActionSignal::failed(1).with_detail(format!("not ready (attempt {call})"))
        } else {
            ActionSignal::ok()
        }
    }
}

/// An action with a fixed exit code that records its invocations.
#[derive(Debug)]
pub struct RecordingAction {
    name: String,
    exit_code: i32,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl RecordingAction {
    /// An action that always succeeds.
    #[must_use]
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exit_code: 0,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// An action that always fails with the given exit code.
    #[must_use]
    pub fn failing(name: impl Into<String>, exit_code: i32) -> Self {
        Self {
            name: name.into(),
            exit_code,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Adds an artificial delay before completing, for join-barrier tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns how many times the action has been invoked.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns true if the action was invoked at least once.
    #[must_use]
    pub fn was_invoked(&self) -> bool {
        self.calls() > 0
    }
}

#[async_trait]
impl ExternalAction for RecordingAction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _ctx: &RunContext, _cancel: &CancellationToken) -> ActionSignal {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.exit_code == 0 {
            ActionSignal::ok()
        } else {
            ActionSignal::failed(self.exit_code)
        }
    }
}

/// Builds a guard that counts its evaluations.
#[must_use]
pub fn counting_guard(name: &str, counter: Arc<AtomicUsize>, result: bool) -> Guard {
    Guard::new(name, move |_ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_n_times() {
        let action = FailNTimesAction::new("warmup", 2);
        let ctx = test_context();
        let cancel = CancellationToken::new();

        assert!(!action.invoke(&ctx, &cancel).await.is_success());
        assert!(!action.invoke(&ctx, &cancel).await.is_success());
        assert!(action.invoke(&ctx, &cancel).await.is_success());
        assert_eq!(action.calls(), 3);
    }

    #[tokio::test]
    async fn test_recording_action_counts() {
        let action = RecordingAction::succeeding("build");
        let ctx = test_context();
        let cancel = CancellationToken::new();

        assert!(!action.was_invoked());
        action.invoke(&ctx, &cancel).await;
        assert!(action.was_invoked());
        assert_eq!(action.calls(), 1);
    }

    #[test]
    fn test_counting_guard_counts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = counting_guard("always", counter.clone(), true);

        let ctx = test_context();
        assert!(guard.evaluate(&ctx));
        assert!(guard.evaluate(&ctx));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
