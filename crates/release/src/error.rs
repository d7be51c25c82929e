//! Error types for release operations.
//!
//! Every failure surfaced by this crate is one of two kinds:
//!
//! - [`Error::Usage`] - a precondition or input problem detected before any
//!   mutation. Nothing needs to be reverted.
//! - [`Error::Recovery`] - a failure once the attempt has started mutating the
//!   repository, or a failure of the rollback itself.
//!
//! Low-level command failures ([`RunnerError`](crate::runner::RunnerError))
//! are converted into one of these kinds at the `git`/`npm` seam.

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong before the release could start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageKind {
    /// No release type was supplied.
    MissingReleaseType,
    /// The release type is not a valid prerelease identifier.
    InvalidReleaseType,
    /// The publish access level is neither `public` nor `private`.
    InvalidAccess,
    /// Git could not resolve a reference.
    UnknownReference,
    /// HEAD is not on the release branch.
    NotOnReleaseBranch,
    /// The local branch differs from its remote counterpart.
    UnpushedChanges,
    /// Tracked files have uncommitted modifications.
    UncommittedChanges,
    /// The package manifest is missing, unreadable or has no valid version.
    MissingManifest,
}

impl UsageKind {
    /// Stable identifier used in diagnostics and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingReleaseType => "missing_release_type",
            Self::InvalidReleaseType => "invalid_release_type",
            Self::InvalidAccess => "invalid_access",
            Self::UnknownReference => "unknown_reference",
            Self::NotOnReleaseBranch => "not_on_release_branch",
            Self::UnpushedChanges => "unpushed_changes",
            Self::UncommittedChanges => "uncommitted_changes",
            Self::MissingManifest => "missing_manifest",
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong after the release started mutating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryKind {
    /// A commit/tag/publish/push step failed.
    StepFailed,
    /// Reverting the attempt failed. There is no further safety net.
    RollbackFailed,
}

impl RecoveryKind {
    /// Stable identifier used in diagnostics and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StepFailed => "step_failed",
            Self::RollbackFailed => "rollback_failed",
        }
    }
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while releasing a package.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Error {
    /// Precondition or input problem; nothing was mutated.
    #[error("{detail}")]
    #[diagnostic(
        code(pkgbump::usage),
        help("Fix the reported problem and run the release again")
    )]
    Usage {
        /// Which precondition failed.
        kind: UsageKind,
        /// Human-readable description.
        detail: String,
    },

    /// Failure during or after the mutation sequence.
    #[error("{detail}")]
    #[diagnostic(code(pkgbump::recovery))]
    Recovery {
        /// Which stage failed.
        kind: RecoveryKind,
        /// Human-readable description.
        detail: String,
        /// Whether local changes were reverted before the error surfaced.
        reverted: bool,
    },
}

impl Error {
    /// Create a usage error.
    #[must_use]
    pub fn usage(kind: UsageKind, detail: impl Into<String>) -> Self {
        Self::Usage {
            kind,
            detail: detail.into(),
        }
    }

    /// Release type was not supplied.
    #[must_use]
    pub fn missing_release_type() -> Self {
        Self::usage(
            UsageKind::MissingReleaseType,
            "A release type is required: major, minor, patch or a prerelease identifier",
        )
    }

    /// The release type cannot be used as a prerelease identifier.
    #[must_use]
    pub fn invalid_release_type(token: &str) -> Self {
        Self::usage(
            UsageKind::InvalidReleaseType,
            format!(
                "Invalid release type \"{token}\"; use major, minor, patch or an alphanumeric prerelease identifier"
            ),
        )
    }

    /// Access level could not be parsed.
    #[must_use]
    pub fn invalid_access(value: &str) -> Self {
        Self::usage(
            UsageKind::InvalidAccess,
            format!("Invalid access level \"{value}\"; expected \"public\" or \"private\""),
        )
    }

    /// Git could not resolve the given reference.
    #[must_use]
    pub fn unknown_reference(name: &str) -> Self {
        Self::usage(
            UsageKind::UnknownReference,
            format!("Git couldn't find the branch: \"{name}\"; please ensure it exists"),
        )
    }

    /// HEAD is elsewhere.
    #[must_use]
    pub fn not_on_release_branch(branch: &str) -> Self {
        Self::usage(
            UsageKind::NotOnReleaseBranch,
            format!("You need to be on the \"{branch}\" branch to run this script"),
        )
    }

    /// Local branch and remote branch differ.
    #[must_use]
    pub fn unpushed_changes() -> Self {
        Self::usage(
            UsageKind::UnpushedChanges,
            "You need to push your changes first",
        )
    }

    /// Tracked files are modified.
    #[must_use]
    pub fn uncommitted_changes() -> Self {
        Self::usage(
            UsageKind::UncommittedChanges,
            "You have uncommitted changes! Commit them before running this script",
        )
    }

    /// The manifest cannot be used.
    #[must_use]
    pub fn missing_manifest(detail: impl Into<String>) -> Self {
        Self::usage(UsageKind::MissingManifest, detail)
    }

    /// An external command failed; nothing has been reverted yet.
    #[must_use]
    pub fn command_failed(detail: impl Into<String>) -> Self {
        Self::Recovery {
            kind: RecoveryKind::StepFailed,
            detail: detail.into(),
            reverted: false,
        }
    }

    /// A mutation step failed and the attempt was reverted.
    #[must_use]
    pub fn step_failed(detail: impl Into<String>) -> Self {
        Self::Recovery {
            kind: RecoveryKind::StepFailed,
            detail: detail.into(),
            reverted: true,
        }
    }

    /// Rollback itself failed.
    #[must_use]
    pub fn rollback_failed(detail: impl Into<String>) -> Self {
        Self::Recovery {
            kind: RecoveryKind::RollbackFailed,
            detail: detail.into(),
            reverted: false,
        }
    }

    /// Returns true for precondition failures.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    /// Returns true for failures after mutation started.
    #[must_use]
    pub const fn is_recovery(&self) -> bool {
        matches!(self, Self::Recovery { .. })
    }

    /// The usage kind, if this is a usage error.
    #[must_use]
    pub const fn usage_kind(&self) -> Option<UsageKind> {
        match self {
            Self::Usage { kind, .. } => Some(*kind),
            Self::Recovery { .. } => None,
        }
    }

    /// The recovery kind, if this is a recovery error.
    #[must_use]
    pub const fn recovery_kind(&self) -> Option<RecoveryKind> {
        match self {
            Self::Recovery { kind, .. } => Some(*kind),
            Self::Usage { .. } => None,
        }
    }

    /// Human-readable description without the kind prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Usage { detail, .. } | Self::Recovery { detail, .. } => detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_reference_message() {
        let err = Error::unknown_reference("origin/main");
        assert_eq!(
            err.to_string(),
            "Git couldn't find the branch: \"origin/main\"; please ensure it exists"
        );
        assert_eq!(err.usage_kind(), Some(UsageKind::UnknownReference));
    }

    #[test]
    fn test_not_on_release_branch_message() {
        let err = Error::not_on_release_branch("main");
        assert!(err.to_string().contains("\"main\" branch"));
        assert!(err.is_usage());
        assert!(!err.is_recovery());
    }

    #[test]
    fn test_uncommitted_changes_kind() {
        let err = Error::uncommitted_changes();
        assert_eq!(err.usage_kind(), Some(UsageKind::UncommittedChanges));
        assert_eq!(err.recovery_kind(), None);
    }

    #[test]
    fn test_invalid_access_message() {
        let err = Error::invalid_access("team");
        assert!(err.to_string().contains("\"team\""));
        assert_eq!(err.usage_kind(), Some(UsageKind::InvalidAccess));
    }

    #[test]
    fn test_step_failed_is_reverted() {
        let err = Error::step_failed("git push failed");
        assert!(err.is_recovery());
        assert_eq!(err.recovery_kind(), Some(RecoveryKind::StepFailed));
        assert!(matches!(err, Error::Recovery { reverted: true, .. }));
    }

    #[test]
    fn test_rollback_failed_is_not_reverted() {
        let err = Error::rollback_failed("reset failed");
        assert!(matches!(err, Error::Recovery { reverted: false, .. }));
        assert_eq!(err.detail(), "reset failed");
    }

    #[test]
    fn test_kind_identifiers() {
        assert_eq!(UsageKind::UnpushedChanges.to_string(), "unpushed_changes");
        assert_eq!(RecoveryKind::RollbackFailed.to_string(), "rollback_failed");
    }
}
