//! The pipeline: a named stage graph plus finalizers, run to a report.

use crate::cancellation::CancellationToken;
use crate::context::RunContext;
use crate::core::{RunStatus, StageStatus};
use crate::errors::{GraphConstructionError, ShipflowError};
use crate::events::{EventSink, NoOpSink, RunEvent};
use crate::finalize::{Finalizer, FinalizerChain};
use crate::graph::{GraphExecutor, RunReport, StageGraph};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A runnable pipeline.
///
/// Holds the validated stage graph, the finalizer chain and the event sink.
/// Running consumes nothing; a pipeline can be run repeatedly with fresh
/// contexts.
pub struct Pipeline {
    name: String,
    graph: StageGraph,
    finalizers: FinalizerChain,
    sink: Arc<dyn EventSink>,
}

impl Pipeline {
    /// Creates a pipeline over a validated graph.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or whitespace-only.
    pub fn new(name: impl Into<String>, graph: StageGraph) -> Result<Self, ShipflowError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphConstructionError::EmptyName.into());
        }
        Ok(Self {
            name,
            graph,
            finalizers: FinalizerChain::new(),
            sink: Arc::new(NoOpSink),
        })
    }

    /// Appends a finalizer. Registration order is execution order.
    #[must_use]
    pub fn with_finalizer(mut self, finalizer: Arc<dyn Finalizer>) -> Self {
        self.finalizers.push(finalizer);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage graph.
    #[must_use]
    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Runs the pipeline with a fresh cancellation token.
    pub async fn run(&self, ctx: RunContext) -> RunReport {
        self.run_with_token(ctx, Arc::new(CancellationToken::new()))
            .await
    }

    /// Runs the pipeline under an externally held cancellation token.
    ///
    /// The returned report is always complete: finalizers have run exactly
    /// once by the time this returns, on success, blocking failure and
    /// cancellation alike. A cancelled run is reported failed even when
    /// every stage that did run succeeded.
    pub async fn run_with_token(
        &self,
        ctx: RunContext,
        cancel: Arc<CancellationToken>,
    ) -> RunReport {
        let ctx = Arc::new(ctx);
        let start = Instant::now();
        let run_id = ctx.identity.run_id;

        info!(pipeline = %self.name, run_id = %run_id, "run started");
        self.sink.emit(RunEvent::run("run.started").with_data(serde_json::json!({
            "pipeline": self.name,
            "run_id": run_id,
        })));

        // Surface the cancellation request the moment it lands, not when
        // the last in-flight leaf winds down.
        let cancel_sink = self.sink.clone();
        cancel.on_cancel(move || {
            cancel_sink.emit(RunEvent::run("run.cancel_requested"));
        });

        let executor = GraphExecutor::with_sink(self.sink.clone());
        let root = executor
            .execute(&self.graph, ctx.clone(), cancel.clone())
            .await;

        let finalizer_failures = self.finalizers.run_all(&ctx, &root, &self.sink).await;

        let cancelled = cancel.is_cancelled();
        let status = if cancelled || root.status == StageStatus::Failed {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };

        if cancelled {
            self.sink
                .emit(RunEvent::run("run.cancelled").with_data(serde_json::json!({
                    "reason": cancel.reason(),
                })));
        } else {
            self.sink
                .emit(RunEvent::run("run.completed").with_data(serde_json::json!({
                    "status": status,
                })));
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            pipeline = %self.name,
            run_id = %run_id,
            status = %status,
            cancelled,
            duration_ms,
            "run finished"
        );

        RunReport {
            pipeline: self.name.clone(),
            run_id,
            status,
            cancelled,
            cancel_reason: cancel.reason(),
            root,
            finalizer_failures,
            duration_ms,
        }
    }
}
