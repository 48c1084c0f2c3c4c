//! The stage graph executor.
//!
//! Walks a validated stage tree: sequential children in declared order,
//! parallel children concurrently behind a join barrier, guards evaluated
//! exactly once before any descendant, failures converted to status values
//! at the leaves and rolled up by the pure aggregation rule.

use super::{LeafSpec, NodeBody, StageGraph, StageNode, StageReport};
use crate::action::{RetryPoller, StepRunner};
use crate::cancellation::CancellationToken;
use crate::context::RunContext;
use crate::core::{aggregate_status, StageKind, StageStatus, StepOutcome};
use crate::events::{EventSink, NoOpSink, RunEvent};
use futures::future::{join_all, BoxFuture};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Executes stage graphs.
pub struct GraphExecutor {
    sink: Arc<dyn EventSink>,
}

impl Default for GraphExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphExecutor {
    /// Creates an executor that discards events.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(NoOpSink),
        }
    }

    /// Creates an executor emitting to the given sink.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Runs the graph to completion and returns the resolved stage tree.
    ///
    /// Never returns early on stage failure: a fatal failure short-circuits
    /// its own sequential list while sibling branches and the join barrier
    /// still resolve, so every check that could report does report.
    pub async fn execute(
        &self,
        graph: &StageGraph,
        ctx: Arc<RunContext>,
        cancel: Arc<CancellationToken>,
    ) -> StageReport {
        run_node(graph.root().clone(), ctx, cancel, self.sink.clone()).await
    }
}

fn run_node(
    node: StageNode,
    ctx: Arc<RunContext>,
    cancel: Arc<CancellationToken>,
    sink: Arc<dyn EventSink>,
) -> BoxFuture<'static, StageReport> {
    Box::pin(async move {
        if cancel.is_cancelled() {
            let report = skipped_report(&node, "run cancelled");
            sink.emit(
                RunEvent::stage("stage.skipped", &node.name)
                    .with_data(serde_json::json!({"reason": "run cancelled"})),
            );
            return report;
        }

        // Guard: evaluated exactly once, before any descendant runs.
        if let Some(guard) = &node.guard {
            if !guard.evaluate(&ctx) {
                let reason = format!("guard '{}' evaluated false", guard.name());
                sink.emit(
                    RunEvent::stage("stage.skipped", &node.name)
                        .with_data(serde_json::json!({"reason": &reason})),
                );
                return skipped_report(&node, &reason);
            }
        }

        let StageNode {
            name,
            guard: _,
            blocking,
            body,
        } = node;

        let start = Instant::now();
        sink.emit(RunEvent::stage("stage.started", &name));

        match body {
            NodeBody::Leaf(spec) => {
                run_leaf(name, blocking, spec, &ctx, &cancel, &sink, start).await
            }
            NodeBody::Sequential(children) => {
                run_sequential(name, blocking, children, ctx, cancel, sink, start).await
            }
            NodeBody::Parallel(children) => {
                run_parallel(name, blocking, children, ctx, cancel, sink, start).await
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
async fn run_leaf(
    name: String,
    blocking: bool,
    spec: LeafSpec,
    ctx: &RunContext,
    cancel: &CancellationToken,
    sink: &Arc<dyn EventSink>,
    start: Instant,
) -> StageReport {
    let outcome = match spec.poll {
        Some(policy) => {
            RetryPoller::from_policy(policy)
                .poll_until_ready(spec.action.as_ref(), blocking, ctx, cancel)
                .await
        }
        None => StepRunner::run(spec.action.as_ref(), blocking, ctx, cancel).await,
    };

    // Compensating cleanup runs whenever the main action was started, on
    // every outcome including cancellation mid-poll.
    if action_started(&outcome) {
        if let Some(cleanup) = &spec.cleanup {
            let signal = cleanup.invoke(ctx, cancel).await;
            if !signal.is_success() {
                warn!(
                    stage = %name,
                    cleanup = cleanup.name(),
                    exit_signal = signal.exit_code,
                    "compensating cleanup failed"
                );
                sink.emit(
                    RunEvent::stage("stage.cleanup_failed", &name)
                        .with_data(serde_json::json!({"exit_signal": signal.exit_code})),
                );
            }
        }
    }

    let status = outcome.status;
    emit_terminal(sink, &name, status, Some(&outcome));

    StageReport {
        name,
        kind: StageKind::Leaf,
        status,
        blocking,
        outcome: Some(outcome),
        children: Vec::new(),
        skip_reason: None,
        duration_ms: elapsed_ms(start),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_sequential(
    name: String,
    blocking: bool,
    children: Vec<StageNode>,
    ctx: Arc<RunContext>,
    cancel: Arc<CancellationToken>,
    sink: Arc<dyn EventSink>,
    start: Instant,
) -> StageReport {
    let mut reports = Vec::with_capacity(children.len());
    let mut fatal: Option<String> = None;

    for child in children {
        if let Some(reason) = &fatal {
            sink.emit(
                RunEvent::stage("stage.skipped", &child.name)
                    .with_data(serde_json::json!({"reason": reason})),
            );
            reports.push(skipped_report(&child, reason));
            continue;
        }

        let child_name = child.name.clone();
        let child_blocking = child.blocking;
        let report = run_node(child, ctx.clone(), cancel.clone(), sink.clone()).await;

        // Short-circuit is local to this sequential list: later siblings
        // are skipped, branches reached through an enclosing parallel node
        // are unaffected.
        if child_blocking && report.status == StageStatus::Failed {
            fatal = Some(format!("sibling stage '{child_name}' failed"));
        }
        reports.push(report);
    }

    finish_composite(name, StageKind::Sequential, blocking, reports, &sink, start)
}

#[allow(clippy::too_many_arguments)]
async fn run_parallel(
    name: String,
    blocking: bool,
    children: Vec<StageNode>,
    ctx: Arc<RunContext>,
    cancel: Arc<CancellationToken>,
    sink: Arc<dyn EventSink>,
    start: Instant,
) -> StageReport {
    let metas: Vec<(String, StageKind, bool)> = children
        .iter()
        .map(|c| (c.name.clone(), c.kind(), c.blocking))
        .collect();

    let handles: Vec<_> = children
        .into_iter()
        .map(|child| tokio::spawn(run_node(child, ctx.clone(), cancel.clone(), sink.clone())))
        .collect();

    // Join barrier: wait for the slowest child. A failed child does not
    // cancel siblings already in flight.
    let joined = join_all(handles).await;

    let reports: Vec<StageReport> = joined
        .into_iter()
        .zip(metas)
        .map(|(result, (child_name, kind, child_blocking))| match result {
            Ok(report) => report,
            Err(join_err) => {
                warn!(stage = %child_name, error = %join_err, "stage task panicked");
                StageReport {
                    name: child_name,
                    kind,
                    status: StageStatus::Failed,
                    blocking: child_blocking,
                    outcome: Some(StepOutcome::failed(
                        -1,
                        format!("stage task panicked: {join_err}"),
                    )),
                    children: Vec::new(),
                    skip_reason: None,
                    duration_ms: 0.0,
                }
            }
        })
        .collect();

    finish_composite(name, StageKind::Parallel, blocking, reports, &sink, start)
}

fn finish_composite(
    name: String,
    kind: StageKind,
    blocking: bool,
    children: Vec<StageReport>,
    sink: &Arc<dyn EventSink>,
    start: Instant,
) -> StageReport {
    let pairs: Vec<(bool, StageStatus)> = children
        .iter()
        .map(|r| (r.blocking, r.status))
        .collect();
    let status = aggregate_status(&pairs);
    emit_terminal(sink, &name, status, None);

    StageReport {
        name,
        kind,
        status,
        blocking,
        outcome: None,
        children,
        skip_reason: None,
        duration_ms: elapsed_ms(start),
    }
}

fn emit_terminal(
    sink: &Arc<dyn EventSink>,
    name: &str,
    status: StageStatus,
    outcome: Option<&StepOutcome>,
) {
    match status {
        StageStatus::Succeeded => sink.emit(RunEvent::stage("stage.completed", name)),
        StageStatus::Failed => {
            let data = outcome.map_or_else(
                || serde_json::json!({}),
                |o| {
                    serde_json::json!({
                        "exit_signal": o.exit_signal,
                        "advisory": o.advisory,
                        "error": o.error,
                    })
                },
            );
            sink.emit(RunEvent::stage("stage.failed", name).with_data(data));
        }
        StageStatus::Skipped => {
            sink.emit(RunEvent::stage("stage.skipped", name));
        }
        StageStatus::Pending | StageStatus::Running => {}
    }
}

/// Marks a node and its whole subtree skipped without executing anything.
fn skipped_report(node: &StageNode, reason: &str) -> StageReport {
    StageReport {
        name: node.name.clone(),
        kind: node.kind(),
        status: StageStatus::Skipped,
        blocking: node.blocking,
        outcome: None,
        children: node
            .children()
            .iter()
            .map(|child| skipped_report(child, reason))
            .collect(),
        skip_reason: Some(reason.to_string()),
        duration_ms: 0.0,
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn action_started(outcome: &StepOutcome) -> bool {
    match outcome.status {
        StageStatus::Skipped => false,
        _ => outcome.attempts.map_or(true, |a| a > 0),
    }
}
