//! Release orchestrator.
//!
//! Drives one release from validation to push:
//!
//! ```text
//! Idle → Validating → Mutating(stable) → CommittedStable
//!      → [Mutating(prerelease) → CommittedPrerelease]   (stable bumps only)
//!      → AwaitingConfirmation → Publishing → Pushed
//!                             ↘ RolledBack               (declined or failed)
//! ```
//!
//! Failures before the first write surface unchanged. Once the attempt
//! exists, any failure (including an unresolvable reference) rolls the
//! repository back before it is reported.

use crate::attempt::{FileSnapshot, ReleaseAttempt, ReleaseState};
use crate::config::{ReleaseConfig, ReleaseType};
use crate::error::{Error, Result};
use crate::git::Git;
use crate::manifest::{JsonManifest, ReleasePaths};
use crate::npm::{Npm, PublishOptions};
use crate::prompt::{Confirmer, ReleaseSummary};
use crate::rollback::rollback;
use crate::runner::CommandRunner;
use crate::validate::validate;
use crate::version::VersionPlan;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// How a release ended when no error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Tag and branch were pushed and the package published.
    Published {
        /// Released version.
        version: Version,
        /// Development marker left on the branch, for stable releases.
        marker: Option<Version>,
    },
    /// The operator declined and the local changes were reverted.
    Declined {
        /// Version that would have been released.
        version: Version,
    },
}

impl ReleaseOutcome {
    /// Version released or offered.
    #[must_use]
    pub const fn version(&self) -> &Version {
        match self {
            Self::Published { version, .. } | Self::Declined { version } => version,
        }
    }
}

/// A lock manifest loaded for mirroring.
#[derive(Debug)]
struct LockManifest {
    manifest: JsonManifest,
    tracked: bool,
    original: String,
}

/// Manifests written by an attempt.
#[derive(Debug)]
struct ManifestSet {
    package: JsonManifest,
    locks: Vec<LockManifest>,
}

impl ManifestSet {
    async fn load<R: CommandRunner>(git: &Git<R>, paths: &ReleasePaths) -> Result<Self> {
        let package = JsonManifest::load(&paths.manifest)?;
        let mut locks = Vec::with_capacity(paths.lock_manifests.len());
        for path in &paths.lock_manifests {
            let original = fs::read_to_string(path).map_err(|e| {
                Error::missing_manifest(format!("Failed to read {}: {e}", path.display()))
            })?;
            let manifest = JsonManifest::parse(path, &original)?;
            let tracked = git.is_tracked(&paths.git_path(path)).await?;
            debug!(path = %path.display(), tracked, "Found lock manifest");
            locks.push(LockManifest {
                manifest,
                tracked,
                original,
            });
        }
        Ok(Self { package, locks })
    }

    fn untracked_snapshots(&self) -> Vec<FileSnapshot> {
        self.locks
            .iter()
            .filter(|lock| !lock.tracked)
            .map(|lock| FileSnapshot {
                path: lock.manifest.path().to_path_buf(),
                content: lock.original.clone(),
            })
            .collect()
    }

    /// Write `version` to every manifest and stage the tracked ones.
    async fn write_version<R: CommandRunner>(
        &mut self,
        git: &Git<R>,
        paths: &ReleasePaths,
        version: &Version,
    ) -> Result<()> {
        self.package.set_version(version);
        persist(&self.package)?;
        for lock in &mut self.locks {
            lock.manifest.mirror_version(version);
            persist(&lock.manifest)?;
        }

        git.stage(&paths.git_path(self.package.path())).await?;
        for lock in self.locks.iter().filter(|lock| lock.tracked) {
            git.stage(&paths.git_path(lock.manifest.path())).await?;
        }
        Ok(())
    }

    /// Write `version` to the lock manifests git does not track.
    ///
    /// Checkouts leave these files alone, so they must be moved along with
    /// the tree they are published from.
    fn sync_untracked(&mut self, version: &Version) -> Result<()> {
        for lock in self.locks.iter_mut().filter(|lock| !lock.tracked) {
            lock.manifest.mirror_version(version);
            persist(&lock.manifest)?;
        }
        Ok(())
    }
}

fn persist(manifest: &JsonManifest) -> Result<()> {
    manifest.persist().map_err(|e| {
        Error::command_failed(format!(
            "Failed to write {}: {e}",
            manifest.path().display()
        ))
    })
}

/// Release orchestrator.
///
/// Collaborators are fixed at construction: the command runner executes git
/// and npm, the confirmer asks the operator before anything leaves the machine.
pub struct ReleaseOrchestrator<R, C> {
    runner: R,
    confirmer: C,
    work_dir: PathBuf,
}

impl<R: CommandRunner, C: Confirmer> ReleaseOrchestrator<R, C> {
    /// Creates an orchestrator for a repository checked out at or above
    /// `work_dir`, the directory `runner` executes in.
    #[must_use]
    pub fn new(runner: R, confirmer: C, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            confirmer,
            work_dir: work_dir.into(),
        }
    }

    /// Invocation directory.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run a release of `release_type`.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the input or repository state rules out a
    /// release; nothing is modified in that case. Returns a `StepFailed`
    /// recovery error after a failed step has been rolled back, and a
    /// `RollbackFailed` error if reverting failed too.
    #[instrument(skip(self, config), fields(remote = %config.remote_name, branch = %config.branch))]
    pub async fn perform_release(
        &self,
        config: &ReleaseConfig,
        release_type: &str,
    ) -> Result<ReleaseOutcome> {
        let release_type = ReleaseType::parse(release_type)?;
        let git = Git::new(&self.runner);

        ReleaseState::Idle.log_transition(ReleaseState::Validating);
        let state = validate(&git, config).await?;
        let offset = git.root_offset().await?;
        let paths = ReleasePaths::resolve(&self.work_dir, &offset);
        let mut manifests = ManifestSet::load(&git, &paths).await?;
        let plan = VersionPlan::new(&manifests.package.version()?, &release_type)?;
        info!(
            from = %plan.previous,
            to = %plan.release,
            marker = ?plan.next_marker.as_ref().map(ToString::to_string),
            "Planned release"
        );

        let mut attempt =
            ReleaseAttempt::new(plan, release_type, paths, state.remote_branch_hash);
        attempt.snapshots = manifests.untracked_snapshots();

        match self
            .run_attempt(&git, config, &mut attempt, &mut manifests)
            .await
        {
            Ok(true) => {
                attempt.advance(ReleaseState::Pushed);
                Ok(ReleaseOutcome::Published {
                    version: attempt.plan.release.clone(),
                    marker: attempt.plan.next_marker.clone(),
                })
            }
            Ok(false) => {
                info!(version = %attempt.version(), "Release declined");
                rollback(&git, &mut attempt, config).await?;
                Ok(ReleaseOutcome::Declined {
                    version: attempt.plan.release.clone(),
                })
            }
            Err(err) => {
                warn!(state = %attempt.state, error = %err, "Release step failed, rolling back");
                match rollback(&git, &mut attempt, config).await {
                    Ok(()) => Err(Error::step_failed(err.detail())),
                    Err(rollback_err) => Err(Error::rollback_failed(format!(
                        "{} ({})",
                        rollback_err.detail(),
                        err.detail()
                    ))),
                }
            }
        }
    }

    /// Mutate, commit, ask, and publish. Returns whether the operator
    /// accepted; the caller rolls back on `false` or an error.
    async fn run_attempt(
        &self,
        git: &Git<&R>,
        config: &ReleaseConfig,
        attempt: &mut ReleaseAttempt,
        manifests: &mut ManifestSet,
    ) -> Result<bool> {
        attempt.advance(ReleaseState::MutatingStable);
        let version = attempt.plan.release.clone();
        manifests
            .write_version(git, &attempt.paths, &version)
            .await?;
        git.commit(&config.commit_message(&format!("Tag {version}")))
            .await?;
        git.tag(&attempt.tag_name()).await?;
        attempt.tag_created = true;
        attempt.advance(ReleaseState::CommittedStable);

        if let Some(marker) = attempt.plan.next_marker.clone() {
            attempt.advance(ReleaseState::MutatingPrerelease);
            manifests
                .write_version(git, &attempt.paths, &marker)
                .await?;
            git.commit(&config.commit_message(&format!("Bump to {marker}")))
                .await?;
            attempt.advance(ReleaseState::CommittedPrerelease);
        }

        attempt.advance(ReleaseState::AwaitingConfirmation);
        let confirmation = self.confirmer.confirm(&summary(attempt, config)).await?;
        if !confirmation.proceed {
            return Ok(false);
        }

        attempt.advance(ReleaseState::Publishing);
        self.publish(git, config, attempt, manifests, confirmation.otp)
            .await?;
        Ok(true)
    }

    async fn publish(
        &self,
        git: &Git<&R>,
        config: &ReleaseConfig,
        attempt: &mut ReleaseAttempt,
        manifests: &mut ManifestSet,
        otp: Option<String>,
    ) -> Result<()> {
        let tag = attempt.tag_name();
        let tagged = git.hash_of(&tag).await?;
        debug!(tag = %tag, hash = %tagged, "Checking out release tag");
        git.checkout(&tag).await?;
        attempt.detached = true;
        manifests.sync_untracked(&attempt.plan.release)?;

        let options = PublishOptions {
            access: config.publish_access,
            tag: attempt.release_type.dist_tag().map(str::to_string),
            otp,
        };
        Npm::new(&self.runner)
            .publish(&attempt.paths.publish_dir, &options)
            .await?;
        git.push(&config.remote_name, &tag).await?;

        git.checkout(&config.branch).await?;
        attempt.detached = false;
        if let Some(marker) = &attempt.plan.next_marker {
            manifests.sync_untracked(marker)?;
        }

        if !attempt.is_prerelease() {
            // Recommit the marker so it does not share the tag commit's timestamp.
            let subject = git.head_subject().await?;
            git.reset_soft_one().await?;
            git.commit(&subject).await?;
        }

        git.push(&config.remote_name, &config.branch).await
    }
}

fn summary(attempt: &ReleaseAttempt, config: &ReleaseConfig) -> ReleaseSummary {
    ReleaseSummary {
        previous: attempt.plan.previous.clone(),
        version: attempt.plan.release.clone(),
        marker: attempt.plan.next_marker.clone(),
        remote: config.remote_name.clone(),
        branch: config.branch.clone(),
        dist_tag: attempt.release_type.dist_tag().map(str::to_string),
    }
}
