//! Artifact archiving finalizer.

use super::Finalizer;
use crate::context::RunContext;
use crate::core::ArtifactSource;
use crate::errors::ShipflowError;
use crate::graph::StageReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One entry in the archive manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Artifact name, also the file name inside the archive.
    pub name: String,
    /// Artifact kind (e.g., `sbom`, `scan-report`).
    pub kind: String,
    /// Name of the stage that produced it.
    pub produced_by: String,
    /// SHA-256 of the archived bytes, hex-encoded.
    pub sha256: String,
    /// Size of the archived bytes.
    pub size: u64,
}

/// Copies every artifact in the run into an archive directory.
///
/// Writes one file per artifact, a `manifest.json` with content digests and
/// a `report.json` holding the resolved stage tree. Missing source files are
/// logged and skipped; a half-done run must still archive what it produced.
#[derive(Debug)]
pub struct ArtifactArchiver {
    dir: PathBuf,
}

impl ArtifactArchiver {
    /// Creates an archiver targeting `dir`. The directory is created on
    /// first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn archive_bytes(&self, name: &str, bytes: &[u8]) -> Result<(String, u64), ShipflowError> {
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        let digest = Sha256::digest(bytes);
        Ok((hex::encode(digest), bytes.len() as u64))
    }

    fn archive_file(&self, name: &str, source: &Path) -> Result<Option<(String, u64)>, ShipflowError> {
        let bytes = match fs::read(source) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(artifact = name, path = %source.display(), "artifact file missing, skipping");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        self.archive_bytes(name, &bytes).map(Some)
    }
}

#[async_trait]
impl Finalizer for ArtifactArchiver {
    fn name(&self) -> &str {
        "artifact-archiver"
    }

    async fn finalize(&self, _ctx: &RunContext, report: &StageReport) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).map_err(ShipflowError::Io)?;

        let mut manifest = Vec::new();
        for artifact in report.artifacts() {
            let archived = match &artifact.source {
                ArtifactSource::Inline(bytes) => Some(self.archive_bytes(&artifact.name, bytes)?),
                ArtifactSource::FileRef(path) => self.archive_file(&artifact.name, path)?,
            };
            if let Some((sha256, size)) = archived {
                manifest.push(ManifestEntry {
                    name: artifact.name.clone(),
                    kind: artifact.kind.clone(),
                    produced_by: artifact.produced_by.clone(),
                    sha256,
                    size,
                });
            }
        }

        let manifest_json = serde_json::to_vec_pretty(&manifest)?;
        fs::write(self.dir.join("manifest.json"), manifest_json).map_err(ShipflowError::Io)?;

        let report_json = serde_json::to_vec_pretty(report)?;
        fs::write(self.dir.join("report.json"), report_json).map_err(ShipflowError::Io)?;

        debug!(
            dir = %self.dir.display(),
            archived = manifest.len(),
            "artifacts archived"
        );
        Ok(())
    }
}
