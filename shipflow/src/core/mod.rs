//! Core types: statuses, step outcomes and artifacts.

mod artifact;
mod outcome;
mod status;

pub use artifact::{ArtifactSource, StepArtifact};
pub use outcome::{aggregate_status, StepOutcome};
pub use status::{RunStatus, StageKind, StageStatus};
