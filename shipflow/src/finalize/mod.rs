//! Guaranteed teardown.
//!
//! Finalizers run after every run, whatever the outcome: success, blocking
//! failure or cancellation. Each one is isolated; a failing finalizer is
//! recorded and the chain moves on.

mod archive;
mod workspace;

pub use archive::ArtifactArchiver;
pub use workspace::WorkspaceCleaner;

use crate::context::RunContext;
use crate::events::{EventSink, RunEvent};
use crate::graph::StageReport;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// A teardown step that runs after the stage tree has resolved.
///
/// Finalizers see the final report, so they can archive artifacts or act on
/// the outcome, but nothing they do can change it. Implementations must be
/// idempotent enough to tolerate a half-done run (missing directories,
/// partial artifacts).
#[async_trait]
pub trait Finalizer: Send + Sync + Debug {
    /// Returns the finalizer name.
    fn name(&self) -> &str;

    /// Performs the teardown work.
    async fn finalize(&self, ctx: &RunContext, report: &StageReport) -> anyhow::Result<()>;
}

/// An ordered chain of finalizers, run exactly once per run.
#[derive(Debug, Default)]
pub struct FinalizerChain {
    finalizers: Vec<Arc<dyn Finalizer>>,
}

impl FinalizerChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finalizer. Registration order is execution order.
    pub fn push(&mut self, finalizer: Arc<dyn Finalizer>) {
        self.finalizers.push(finalizer);
    }

    /// Returns the number of registered finalizers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.finalizers.len()
    }

    /// Returns true if no finalizers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.finalizers.is_empty()
    }

    /// Runs every finalizer in order, collecting failures.
    ///
    /// One finalizer failing never stops the others; the returned pairs are
    /// (finalizer name, error message) for each failure.
    pub async fn run_all(
        &self,
        ctx: &RunContext,
        report: &StageReport,
        sink: &Arc<dyn EventSink>,
    ) -> Vec<(String, String)> {
        let mut failures = Vec::new();
        for finalizer in &self.finalizers {
            debug!(finalizer = finalizer.name(), "running finalizer");
            match finalizer.finalize(ctx, report).await {
                Ok(()) => {
                    sink.emit(RunEvent::run("finalizer.completed").with_data(
                        serde_json::json!({"finalizer": finalizer.name()}),
                    ));
                }
                Err(err) => {
                    warn!(
                        finalizer = finalizer.name(),
                        error = %err,
                        "finalizer failed"
                    );
                    sink.emit(RunEvent::run("finalizer.failed").with_data(serde_json::json!({
                        "finalizer": finalizer.name(),
                        "error": err.to_string(),
                    })));
                    failures.push((finalizer.name().to_string(), err.to_string()));
                }
            }
        }
        failures
    }
}
