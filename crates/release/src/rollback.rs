//! Reverting a release attempt.
//!
//! Rollback is all-or-nothing: the branch goes back to the remote commit
//! observed during validation, the release tag is removed and lock manifests
//! git does not track are restored from their snapshots. Pushed refs and
//! published packages are not touched.

use crate::attempt::{ReleaseAttempt, ReleaseState};
use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::runner::CommandRunner;
use std::fs;
use tracing::{error, info, instrument, warn};

/// Undo the local effects of `attempt`.
///
/// A failed tag deletion is logged and does not stop the reset.
///
/// # Errors
///
/// Returns a `RollbackFailed` recovery error if the branch cannot be checked
/// out or reset, or a snapshot cannot be restored.
#[instrument(skip_all, fields(version = %attempt.version(), reset_to = %attempt.remote_hash))]
pub async fn rollback<R: CommandRunner>(
    git: &Git<R>,
    attempt: &mut ReleaseAttempt,
    config: &ReleaseConfig,
) -> Result<()> {
    if let Err(e) = revert(git, attempt, config).await {
        error!(error = %e, "Rollback failed; the repository needs manual repair");
        return Err(Error::rollback_failed(format!(
            "Rollback failed: {}",
            e.detail()
        )));
    }
    attempt.advance(ReleaseState::RolledBack);
    info!("Changes reverted");
    Ok(())
}

async fn revert<R: CommandRunner>(
    git: &Git<R>,
    attempt: &mut ReleaseAttempt,
    config: &ReleaseConfig,
) -> Result<()> {
    if attempt.detached {
        git.force_checkout(&config.branch).await?;
        attempt.detached = false;
    }

    if attempt.tag_created {
        let tag = attempt.tag_name();
        match git.delete_tag(&tag).await {
            Ok(()) => attempt.tag_created = false,
            Err(e) => warn!(tag = %tag, error = %e, "Could not delete release tag"),
        }
    }

    git.reset_hard(&attempt.remote_hash).await?;

    for snapshot in &attempt.snapshots {
        fs::write(&snapshot.path, &snapshot.content).map_err(|e| {
            Error::command_failed(format!(
                "Failed to restore {}: {e}",
                snapshot.path.display()
            ))
        })?;
    }
    Ok(())
}
