//! Error types for the shipflow engine.
//!
//! Step failures are deliberately *not* errors: they become status values at
//! the leaf and aggregate upward by the pure rule in [`crate::core`]. The
//! types here cover what genuinely prevents a run from starting or
//! operating.

use thiserror::Error;

/// The main error type for shipflow operations.
#[derive(Debug, Error)]
pub enum ShipflowError {
    /// A malformed stage graph was rejected before execution.
    #[error("{0}")]
    Construction(#[from] GraphConstructionError),

    /// IO error from a finalizer touching the archive or workspace.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors detected while validating a stage graph.
///
/// These are design errors, not runtime conditions: they surface before any
/// stage executes, never mid-run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphConstructionError {
    /// Two siblings share a name, which would make reports ambiguous.
    #[error("duplicate stage name '{name}' under '{parent}'")]
    DuplicateSiblingName {
        /// The parent stage.
        parent: String,
        /// The repeated name.
        name: String,
    },

    /// A sequential or parallel node has no children.
    #[error("stage '{name}' is a {kind} node with no children")]
    EmptyComposite {
        /// The offending stage.
        name: String,
        /// The node kind, for the message.
        kind: String,
    },

    /// A stage name is empty or whitespace-only.
    #[error("stage name cannot be empty or whitespace-only")]
    EmptyName,

    /// A leaf carries a poll policy that can never succeed.
    #[error("invalid poll policy on '{name}': {reason}")]
    InvalidPollPolicy {
        /// The offending stage.
        name: String,
        /// What is wrong with the policy.
        reason: String,
    },
}
