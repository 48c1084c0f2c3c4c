//! Workspace cleanup finalizer.

use super::Finalizer;
use crate::context::RunContext;
use crate::errors::ShipflowError;
use crate::graph::StageReport;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Removes a scratch directory after the run.
///
/// A directory that was never created (the run failed before any stage
/// touched the workspace) is not an error.
#[derive(Debug)]
pub struct WorkspaceCleaner {
    path: PathBuf,
}

impl WorkspaceCleaner {
    /// Creates a cleaner for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Finalizer for WorkspaceCleaner {
    fn name(&self) -> &str {
        "workspace-cleaner"
    }

    async fn finalize(&self, _ctx: &RunContext, _report: &StageReport) -> anyhow::Result<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "workspace removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ShipflowError::Io(err).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageKind, StageStatus};
    use crate::testing::test_context;

    fn empty_report() -> StageReport {
        StageReport {
            name: "root".to_string(),
            kind: StageKind::Leaf,
            status: StageStatus::Succeeded,
            blocking: true,
            outcome: None,
            children: Vec::new(),
            skip_reason: None,
            duration_ms: 0.0,
        }
    }

    #[tokio::test]
    async fn test_removes_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("scratch");
        fs::create_dir_all(workspace.join("nested")).unwrap();
        fs::write(workspace.join("nested/file.txt"), b"x").unwrap();

        let cleaner = WorkspaceCleaner::new(&workspace);
        cleaner
            .finalize(&test_context(), &empty_report())
            .await
            .unwrap();

        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_missing_workspace_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = WorkspaceCleaner::new(dir.path().join("never-created"));
        cleaner
            .finalize(&test_context(), &empty_report())
            .await
            .unwrap();
    }
}
