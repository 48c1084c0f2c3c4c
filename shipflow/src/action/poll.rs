//! Bounded retry-with-polling for readiness checks.

use super::ExternalAction;
use crate::cancellation::CancellationToken;
use crate::context::RunContext;
use crate::core::StepOutcome;
use rand::Rng;
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

/// Delay strategy between poll attempts.
///
/// The observed readiness-check pattern uses a fixed interval; the trait
/// exists so callers can plug a different curve without touching the loop.
pub trait Backoff: Send + Sync + Debug {
    /// Returns the delay before the next attempt. `attempt` is the number
    /// of invocations already made (1-based).
    fn delay(&self, attempt: u32) -> Duration;
}

/// Constant delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Constant base with full jitter, for polls that would otherwise align
/// across concurrent runs.
#[derive(Debug, Clone, Copy)]
pub struct JitteredBackoff {
    /// Upper bound for each delay.
    pub base: Duration,
}

impl Backoff for JitteredBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        let max = self.base.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

/// Declarative poll configuration carried by a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of invocations, including the first.
    pub max_attempts: u32,
    /// Fixed delay between invocations.
    pub interval: Duration,
}

impl PollPolicy {
    /// Creates a poll policy.
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Wraps an action invocation in a bounded poll loop.
///
/// Transient failure during startup is expected and not itself an error;
/// only exhausting the attempt budget is. The loop returns on the first
/// success and observes cancellation before each sleep, so worst-case
/// teardown latency is one interval.
pub struct RetryPoller {
    max_attempts: u32,
    backoff: Box<dyn Backoff>,
}

impl Debug for RetryPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPoller")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl RetryPoller {
    /// Creates a poller with a fixed interval.
    #[must_use]
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Box::new(FixedBackoff(interval)),
        }
    }

    /// Creates a poller from a declarative policy.
    #[must_use]
    pub fn from_policy(policy: PollPolicy) -> Self {
        Self::fixed(policy.max_attempts, policy.interval)
    }

    /// Creates a poller with a custom backoff strategy.
    #[must_use]
    pub fn with_backoff(max_attempts: u32, backoff: Box<dyn Backoff>) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Invokes `action` until it succeeds or the attempt budget is spent.
    ///
    /// The returned outcome always carries the number of invocations made.
    /// Cancellation before the first invocation yields a skipped outcome,
    /// the same as a single-run leaf that never started; cancellation
    /// mid-poll yields a failed outcome without starting the next sleep or
    /// attempt.
    pub async fn poll_until_ready(
        &self,
        action: &dyn ExternalAction,
        blocking: bool,
        ctx: &RunContext,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let mut last_exit = 0;
        let mut last_detail = None;

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                if attempt == 1 {
                    // Nothing was started; report the same way as a
                    // single-run leaf cancelled before its invocation.
                    return StepOutcome::skipped("run cancelled");
                }
                // Cancellation landed during the preceding sleep.
                let outcome = StepOutcome::failed(
                    last_exit,
                    format!("cancelled before attempt {attempt}"),
                )
                .with_attempts(attempt - 1);
                return if blocking { outcome } else { outcome.advisory() };
            }

            let signal = action.invoke(ctx, cancel).await;
            if signal.is_success() {
                debug!(action = action.name(), attempt, "poll target ready");
                return StepOutcome::succeeded_with(signal.artifacts).with_attempts(attempt);
            }

            last_exit = signal.exit_code;
            last_detail = signal.detail;
            debug!(
                action = action.name(),
                attempt,
                max_attempts = self.max_attempts,
                "poll target not ready"
            );

            if attempt < self.max_attempts {
                if cancel.is_cancelled() {
                    let outcome = StepOutcome::failed(
                        last_exit,
                        format!("cancelled after attempt {attempt}"),
                    )
                    .with_attempts(attempt);
                    return if blocking { outcome } else { outcome.advisory() };
                }
                tokio::time::sleep(self.backoff.delay(attempt)).await;
            }
        }

        let error = last_detail.unwrap_or_else(|| {
            format!(
                "'{}' not ready after {} attempts",
                action.name(),
                self.max_attempts
            )
        });
        let outcome = StepOutcome::failed(last_exit, error).with_attempts(self.max_attempts);
        if blocking {
            outcome
        } else {
            outcome.advisory()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::testing::{test_context, FailNTimesAction, RecordingAction};

    #[tokio::test]
    async fn test_success_on_fifth_attempt_stops_early() {
        // Fails on attempts 1-4, succeeds on attempt 5.
        let action = FailNTimesAction::new("smoke", 4);
        let poller = RetryPoller::fixed(15, Duration::from_millis(1));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = poller.poll_until_ready(&action, true, &ctx, &cancel).await;

        assert_eq!(outcome.status, StageStatus::Succeeded);
        assert_eq!(outcome.attempts, Some(5));
        assert_eq!(action.calls(), 5);
    }

    #[tokio::test]
    async fn test_exhaustion_makes_exactly_max_invocations() {
        let action = RecordingAction::failing("smoke", 7);
        let poller = RetryPoller::fixed(15, Duration::from_millis(1));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = poller.poll_until_ready(&action, true, &ctx, &cancel).await;

        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(outcome.attempts, Some(15));
        assert_eq!(outcome.exit_signal, Some(7));
        assert_eq!(action.calls(), 15);
    }

    #[tokio::test]
    async fn test_immediate_success_makes_one_invocation() {
        let action = FailNTimesAction::new("ready", 0);
        let poller = RetryPoller::fixed(15, Duration::from_millis(1));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = poller.poll_until_ready(&action, true, &ctx, &cancel).await;

        assert_eq!(outcome.attempts, Some(1));
        assert_eq!(action.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_before_first_attempt_skips() {
        let action = RecordingAction::failing("smoke", 1);
        let poller = RetryPoller::fixed(100, Duration::from_millis(1));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        cancel.cancel("teardown");

        // Never-started work reports the same way on the poll path as on
        // the single-run path.
        let outcome = poller.poll_until_ready(&action, true, &ctx, &cancel).await;
        assert_eq!(outcome.status, StageStatus::Skipped);
        assert_eq!(action.calls(), 0);
        assert_eq!(outcome.skip_reason.as_deref(), Some("run cancelled"));
    }

    #[tokio::test]
    async fn test_cancellation_mid_poll_stops_before_next_sleep() {
        use crate::action::{ActionSignal, ExternalAction};
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicU32, Ordering};

        // Fails and requests cancellation from within the attempt, the way
        // an external abort arrives while the target is still warming up.
        #[derive(Debug)]
        struct FailAndCancelAction {
            calls: AtomicU32,
        }

        #[async_trait]
        impl ExternalAction for FailAndCancelAction {
            fn name(&self) -> &str {
                "warmup"
            }

            async fn invoke(
                &self,
                _ctx: &crate::context::RunContext,
                cancel: &CancellationToken,
            ) -> ActionSignal {
                self.calls.fetch_add(1, Ordering::SeqCst);
                cancel.cancel("operator abort");
                ActionSignal::failed(1).with_detail("not ready")
            }
        }

        let action = FailAndCancelAction {
            calls: AtomicU32::new(0),
        };
        let poller = RetryPoller::fixed(100, Duration::from_secs(60));

        let ctx = test_context();
        let cancel = CancellationToken::new();

        let start = std::time::Instant::now();
        let outcome = poller.poll_until_ready(&action, true, &ctx, &cancel).await;

        // One invocation, then the loop observed cancellation before the
        // next sleep: no second attempt and no 60s interval elapsed.
        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(action.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts, Some(1));
        assert!(outcome.error.unwrap().contains("cancelled"));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_advisory_poll_failure() {
        let action = RecordingAction::failing("warmup", 1);
        let poller = RetryPoller::fixed(2, Duration::from_millis(1));

        let ctx = test_context();
        let cancel = CancellationToken::new();
        let outcome = poller.poll_until_ready(&action, false, &ctx, &cancel).await;

        assert!(outcome.advisory);
        assert_eq!(outcome.attempts, Some(2));
    }

    #[test]
    fn test_fixed_backoff_constant() {
        let backoff = FixedBackoff(Duration::from_millis(250));
        assert_eq!(backoff.delay(1), Duration::from_millis(250));
        assert_eq!(backoff.delay(10), Duration::from_millis(250));
    }

    #[test]
    fn test_jittered_backoff_bounded() {
        let backoff = JitteredBackoff {
            base: Duration::from_millis(100),
        };
        for attempt in 1..20 {
            assert!(backoff.delay(attempt) <= Duration::from_millis(100));
        }
    }
}
