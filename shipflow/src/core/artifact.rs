//! Step artifact type for capturing reports and logs produced by actions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the artifact's bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    /// The bytes were handed over directly by the action.
    Inline(Vec<u8>),
    /// The action left a file on disk; the file may be absent by the time
    /// the archiver runs, which is tolerated.
    FileRef(PathBuf),
}

/// An artifact produced by an external action.
///
/// Artifacts are collected from every outcome in the stage tree and handed
/// to the finalizer chain, on failure as well as success, so a human can
/// diagnose a broken run without re-running it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepArtifact {
    /// The artifact name, unique within the producing step.
    pub name: String,

    /// The kind of artifact (e.g., "report", "log", "junit").
    pub kind: String,

    /// The artifact payload.
    pub source: ArtifactSource,

    /// The name of the action that produced the artifact.
    pub produced_by: String,

    /// When the artifact was created (ISO 8601).
    pub created_at: String,
}

impl StepArtifact {
    /// Creates an artifact carrying inline bytes.
    #[must_use]
    pub fn inline(
        name: impl Into<String>,
        kind: impl Into<String>,
        produced_by: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            source: ArtifactSource::Inline(bytes.into()),
            produced_by: produced_by.into(),
            created_at: crate::utils::iso_timestamp(),
        }
    }

    /// Creates an artifact referencing a file on disk.
    #[must_use]
    pub fn file_ref(
        name: impl Into<String>,
        kind: impl Into<String>,
        produced_by: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            source: ArtifactSource::FileRef(path.into()),
            produced_by: produced_by.into(),
            created_at: crate::utils::iso_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_artifact() {
        let artifact = StepArtifact::inline("lint.txt", "report", "lint", b"ok".to_vec());

        assert_eq!(artifact.name, "lint.txt");
        assert_eq!(artifact.kind, "report");
        assert_eq!(artifact.produced_by, "lint");
        assert_eq!(artifact.source, ArtifactSource::Inline(b"ok".to_vec()));
    }

    #[test]
    fn test_file_ref_artifact() {
        let artifact = StepArtifact::file_ref("junit.xml", "junit", "tests", "/tmp/junit.xml");

        match &artifact.source {
            ArtifactSource::FileRef(path) => assert_eq!(path.to_str(), Some("/tmp/junit.xml")),
            ArtifactSource::Inline(_) => panic!("expected file reference"),
        }
    }

    #[test]
    fn test_artifact_serialization() {
        let artifact = StepArtifact::inline("scan.json", "report", "vuln_scan", b"{}".to_vec());

        let json = serde_json::to_string(&artifact).unwrap();
        let back: StepArtifact = serde_json::from_str(&json).unwrap();

        assert_eq!(artifact.name, back.name);
        assert_eq!(artifact.source, back.source);
    }
}
