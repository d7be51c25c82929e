//! Release preconditions.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. HEAD is the release branch.
//! 2. The release branch matches its remote counterpart.
//! 3. No tracked file has uncommitted changes. Untracked files never block.

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::git::{BranchState, Git, StatusEntry};
use crate::runner::CommandRunner;
use tracing::{debug, instrument};

/// Status entries that prevent a release.
pub fn blocking_entries(entries: &[StatusEntry]) -> impl Iterator<Item = &StatusEntry> {
    entries.iter().filter(|entry| !entry.is_untracked())
}

/// Check that a release may start, returning the observed branch state.
///
/// # Errors
///
/// Returns a usage error describing the first failed precondition:
/// `UnknownReference`, `NotOnReleaseBranch`, `UnpushedChanges` or
/// `UncommittedChanges`.
#[instrument(skip_all, fields(branch = %config.branch, remote = %config.remote_name))]
pub async fn validate<R: CommandRunner>(git: &Git<R>, config: &ReleaseConfig) -> Result<BranchState> {
    let head_hash = git.hash_of("HEAD").await?;
    let branch_hash = git.hash_of(&config.branch).await?;
    if head_hash != branch_hash {
        return Err(Error::not_on_release_branch(&config.branch));
    }

    let remote_branch_hash = git.hash_of(&config.remote_branch()).await?;
    if branch_hash != remote_branch_hash {
        return Err(Error::unpushed_changes());
    }

    let working_tree = git.working_tree_status().await?;
    if let Some(entry) = blocking_entries(&working_tree).next() {
        debug!(code = %entry.code, path = %entry.path, "Tracked file has changes");
        return Err(Error::uncommitted_changes());
    }

    debug!(hash = %branch_hash, "Release preconditions satisfied");
    Ok(BranchState {
        head_hash,
        branch_hash,
        remote_branch_hash,
        working_tree,
    })
}
