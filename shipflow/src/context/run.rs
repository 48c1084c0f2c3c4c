//! Process-wide run context, read-only after construction.

use super::{RunIdentity, Secret};

/// Build identity: a monotonic build number and the short commit hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    /// Monotonic build number assigned by the surrounding system.
    pub number: u64,
    /// Short commit hash of the source being built.
    pub short_commit: String,
}

impl BuildIdentity {
    /// Creates a build identity.
    #[must_use]
    pub fn new(number: u64, short_commit: impl Into<String>) -> Self {
        Self {
            number,
            short_commit: short_commit.into(),
        }
    }
}

/// Image coordinates: registry address, repository and the two mutable tags
/// a published image is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCoordinates {
    /// Registry address (e.g., `registry.example.com`).
    pub registry: String,
    /// Repository within the registry (e.g., `team/service`).
    pub repository: String,
}

impl ImageCoordinates {
    /// Creates image coordinates.
    #[must_use]
    pub fn new(registry: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            repository: repository.into(),
        }
    }

    /// The build-number tag for a given build.
    #[must_use]
    pub fn build_tag(&self, build: &BuildIdentity) -> String {
        format!("{}/{}:{}", self.registry, self.repository, build.number)
    }

    /// The short-commit tag for a given build.
    #[must_use]
    pub fn commit_tag(&self, build: &BuildIdentity) -> String {
        format!("{}/{}:{}", self.registry, self.repository, build.short_commit)
    }
}

/// Injected credentials for registry and downstream-repository access.
///
/// Values are [`Secret`] handles; nothing here renders into logs.
#[derive(Debug, Clone)]
pub struct CredentialBundle {
    /// Registry user name.
    pub registry_user: String,
    /// Registry password or token.
    pub registry_password: Secret,
    /// Write credential for the downstream configuration repository.
    pub git_token: Secret,
}

impl CredentialBundle {
    /// Creates a credential bundle.
    #[must_use]
    pub fn new(
        registry_user: impl Into<String>,
        registry_password: impl Into<Secret>,
        git_token: impl Into<Secret>,
    ) -> Self {
        Self {
            registry_user: registry_user.into(),
            registry_password: registry_password.into(),
            git_token: git_token.into(),
        }
    }
}

/// Everything a step may read about the run.
///
/// Constructed once before the graph runs and exclusively owned by the
/// executor behind an `Arc`; concurrently executing steps share it
/// read-only, so there is no runtime mutation to race on.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Correlation identity for this run.
    pub identity: RunIdentity,
    /// Build number and short commit.
    pub build: BuildIdentity,
    /// Target image coordinates.
    pub image: ImageCoordinates,
    /// The branch the run was triggered from.
    pub branch: String,
    /// Injected credentials.
    pub credentials: CredentialBundle,
}

impl RunContext {
    /// Creates a run context.
    #[must_use]
    pub fn new(
        build: BuildIdentity,
        image: ImageCoordinates,
        branch: impl Into<String>,
        credentials: CredentialBundle,
    ) -> Self {
        Self {
            identity: RunIdentity::new(),
            build,
            image,
            branch: branch.into(),
            credentials,
        }
    }

    /// Replaces the generated identity with a caller-supplied one.
    #[must_use]
    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }
}
