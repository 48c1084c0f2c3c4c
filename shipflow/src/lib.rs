//! # Shipflow
//!
//! A declarative execution engine for build-and-release pipelines.
//!
//! A pipeline is a tree of stages: leaves invoke external actions (build an
//! image, run a scanner, push to a registry), composites sequence or
//! parallelize their children. The engine contributes:
//!
//! - **Composable structure**: sequential and parallel nodes nest freely
//! - **Failure policy**: blocking failures short-circuit, advisory failures
//!   are recorded and the run continues
//! - **Guards**: branch-conditional stages skip cleanly instead of failing
//! - **Bounded polling**: leaves that wait on external readiness retry on a
//!   policy, never forever
//! - **Guaranteed teardown**: finalizers run exactly once on every outcome
//! - **Cooperative cancellation**: one token, observed at every seam
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shipflow::prelude::*;
//!
//! let graph = StageGraph::new(StageNode::sequential(
//!     "delivery",
//!     vec![
//!         StageNode::leaf("build", build_action),
//!         StageNode::parallel("validate", checks),
//!         StageNode::leaf("push", push_action).guarded(Guard::branch_equals("main")),
//!     ],
//! ))?;
//!
//! let pipeline = Pipeline::new("delivery", graph)?
//!     .with_finalizer(Arc::new(ArtifactArchiver::new("archive")));
//! let report = pipeline.run(ctx).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod action;
pub mod cancellation;
pub mod context;
pub mod core;
pub mod delivery;
pub mod errors;
pub mod events;
pub mod finalize;
pub mod graph;
pub mod observability;
pub mod pipeline;
pub mod utils;

#[cfg(test)]
pub mod testing;

pub use pipeline::Pipeline;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{
        ActionSignal, Backoff, ExternalAction, FixedBackoff, FnAction, JitteredBackoff,
        NoOpAction, PollPolicy, RetryPoller, StepRunner,
    };
    pub use crate::cancellation::CancellationToken;
    pub use crate::context::{
        BuildIdentity, CredentialBundle, ImageCoordinates, RunContext, RunIdentity, Secret,
    };
    pub use crate::core::{
        aggregate_status, ArtifactSource, RunStatus, StageKind, StageStatus, StepArtifact,
        StepOutcome,
    };
    pub use crate::delivery::{delivery_graph, DeliveryActions, DeliveryPolicy};
    pub use crate::errors::{GraphConstructionError, ShipflowError};
    pub use crate::events::{CollectingSink, EventSink, LoggingSink, NoOpSink, RunEvent};
    pub use crate::finalize::{ArtifactArchiver, Finalizer, FinalizerChain, WorkspaceCleaner};
    pub use crate::graph::{
        Guard, GraphExecutor, LeafSpec, NodeBody, RunReport, StageGraph, StageNode, StageReport,
    };
    pub use crate::pipeline::Pipeline;
    pub use crate::utils::iso_timestamp;
}
