//! In-flight release state.
//!
//! A [`ReleaseAttempt`] is created once validation has passed and the
//! versions are planned, before anything is written. It records every side
//! effect the rollback handler has to undo.

use crate::config::ReleaseType;
use crate::manifest::ReleasePaths;
use crate::version::VersionPlan;
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseState {
    /// Nothing has happened yet.
    Idle,
    /// Checking preconditions.
    Validating,
    /// Writing the release version.
    MutatingStable,
    /// Release commit and tag exist.
    CommittedStable,
    /// Writing the development marker.
    MutatingPrerelease,
    /// Marker commit exists.
    CommittedPrerelease,
    /// Waiting for the operator.
    AwaitingConfirmation,
    /// Publishing and pushing.
    Publishing,
    /// Terminal: tag and branch pushed.
    Pushed,
    /// Terminal: local changes reverted.
    RolledBack,
}

impl ReleaseState {
    /// Whether the state ends an attempt.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Pushed | Self::RolledBack)
    }

    /// Log a transition that happens before an attempt exists.
    pub fn log_transition(self, next: Self) {
        info!(from = %self, to = %next, "Release state");
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::MutatingStable => "mutating(stable)",
            Self::CommittedStable => "committed(stable)",
            Self::MutatingPrerelease => "mutating(prerelease)",
            Self::CommittedPrerelease => "committed(prerelease)",
            Self::AwaitingConfirmation => "awaiting-confirmation",
            Self::Publishing => "publishing",
            Self::Pushed => "pushed",
            Self::RolledBack => "rolled-back",
        };
        f.write_str(name)
    }
}

/// Pre-attempt content of a file git will not restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// File path.
    pub path: PathBuf,
    /// Content before the attempt.
    pub content: String,
}

/// Side effects of one release attempt.
#[derive(Debug, Clone)]
pub struct ReleaseAttempt {
    /// Planned versions.
    pub plan: VersionPlan,
    /// Requested bump.
    pub release_type: ReleaseType,
    /// Manifest locations.
    pub paths: ReleasePaths,
    /// Remote branch commit observed during validation; rollback resets here.
    pub remote_hash: String,
    /// Current state.
    pub state: ReleaseState,
    /// Whether the release tag has been created.
    pub tag_created: bool,
    /// Whether the working tree is detached on the release tag.
    pub detached: bool,
    /// Untracked lock manifests to restore on rollback.
    pub snapshots: Vec<FileSnapshot>,
}

impl ReleaseAttempt {
    /// Start an attempt in the validating state.
    #[must_use]
    pub fn new(
        plan: VersionPlan,
        release_type: ReleaseType,
        paths: ReleasePaths,
        remote_hash: impl Into<String>,
    ) -> Self {
        Self {
            plan,
            release_type,
            paths,
            remote_hash: remote_hash.into(),
            state: ReleaseState::Validating,
            tag_created: false,
            detached: false,
            snapshots: Vec::new(),
        }
    }

    /// Version being released.
    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.plan.release
    }

    /// Tag name for the release: the bare version string.
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.plan.release.to_string()
    }

    /// Whether this is a prerelease bump.
    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.release_type.is_prerelease()
    }

    /// Move to `next`, logging the transition.
    pub fn advance(&mut self, next: ReleaseState) {
        info!(from = %self.state, to = %next, version = %self.plan.release, "Release state");
        self.state = next;
    }
}
