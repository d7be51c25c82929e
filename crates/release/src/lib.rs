//! Release workflow for npm packages kept in git.
//!
//! A release validates the repository, bumps the version in `package.json`,
//! commits and tags it, asks the operator for confirmation and then publishes
//! and pushes. If the operator declines or any step fails, the local commits
//! and tag are reverted.
//!
//! # Architecture
//!
//! - [`git`] - branch state inspection and version-control primitives
//! - [`validate`] - release preconditions
//! - [`version`] - version calculation and bumping logic
//! - [`manifest`] - `package.json` and lock manifest rewriting
//! - [`orchestrator`] - the release state machine
//! - [`rollback`] - reverting an attempt
//! - [`runner`], [`npm`], [`prompt`] - external collaborator seams
//!
//! # Example
//!
//! ```rust,ignore
//! use pkgbump_release::{ReleaseConfig, ReleaseOrchestrator, SystemRunner};
//!
//! let runner = SystemRunner::new(".");
//! let orchestrator = ReleaseOrchestrator::new(runner, my_confirmer, ".");
//! let outcome = orchestrator
//!     .perform_release(&ReleaseConfig::default(), "patch")
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod attempt;
pub mod config;
pub mod error;
pub mod git;
pub mod manifest;
pub mod npm;
pub mod orchestrator;
pub mod prompt;
pub mod rollback;
pub mod runner;
pub mod validate;
pub mod version;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main types
pub use attempt::{ReleaseAttempt, ReleaseState};
pub use config::{PublishAccess, ReleaseConfig, ReleaseType, StableBump};
pub use error::{Error, RecoveryKind, Result, UsageKind};
pub use git::{BranchState, Git, StatusEntry};
pub use manifest::{JsonManifest, ReleasePaths};
pub use npm::{Npm, PublishOptions};
pub use orchestrator::{ReleaseOrchestrator, ReleaseOutcome};
pub use prompt::{Confirmation, Confirmer, ReleaseSummary};
pub use runner::{CommandRunner, RunnerError, SystemRunner};
pub use version::VersionPlan;

/// Version types used throughout the public API.
pub use semver;
