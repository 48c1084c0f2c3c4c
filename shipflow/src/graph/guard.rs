//! Guard predicates gating stage execution.

use crate::context::RunContext;
use std::fmt;
use std::sync::Arc;

/// A precondition predicate over the run context.
///
/// Guards are deterministic and side-effect-free: they read only the
/// immutable [`RunContext`], so plan-only tooling can evaluate them without
/// executing anything. The executor evaluates each guard exactly once,
/// before any descendant of the guarded node runs.
#[derive(Clone)]
pub struct Guard {
    name: String,
    predicate: Arc<dyn Fn(&RunContext) -> bool + Send + Sync>,
}

impl Guard {
    /// Creates a guard from a predicate.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&RunContext) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// A guard that passes only on the designated branch.
    #[must_use]
    pub fn branch_equals(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let name = format!("branch == {branch}");
        Self::new(name, move |ctx: &RunContext| ctx.branch == branch)
    }

    /// Returns the guard's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate against a context.
    #[must_use]
    pub fn evaluate(&self, ctx: &RunContext) -> bool {
        (self.predicate)(ctx)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}
