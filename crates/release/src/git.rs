//! Version-control primitives.
//!
//! [`Git`] is the only place that knows git's command lines. The read-only
//! queries (`hash_of`, `working_tree_status`, `root_offset`) make up the
//! branch state inspector; the rest are the mutations a release performs.
//!
//! Runner failures are converted to domain errors here: an unresolvable
//! reference becomes [`UsageKind::UnknownReference`](crate::error::UsageKind),
//! anything else a `StepFailed` recovery error that the orchestrator decides
//! how to surface.

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, RunnerError};
use std::path::Path;
use tracing::info;

const GIT: &str = "git";

/// Status code git uses for untracked paths.
pub const UNTRACKED: &str = "??";

/// One line of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Two-character status code, e.g. ` M` or `??`.
    pub code: String,
    /// Path relative to the repository root.
    pub path: String,
}

impl StatusEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(code: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: path.into(),
        }
    }

    /// Parse a single porcelain status line.
    ///
    /// Returns `None` for blank lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }
        let split = line.char_indices().nth(2).map_or(line.len(), |(i, _)| i);
        let (code, rest) = line.split_at(split);
        Some(Self::new(code, rest.trim_start()))
    }

    /// Whether git reports the path as untracked.
    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.code == UNTRACKED
    }
}

/// Parse the output of `git status --porcelain`.
#[must_use]
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
    output.split('\n').filter_map(StatusEntry::parse).collect()
}

/// Repository state observed by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchState {
    /// Commit checked out.
    pub head_hash: String,
    /// Commit the release branch points at.
    pub branch_hash: String,
    /// Commit the remote-tracking branch points at.
    pub remote_branch_hash: String,
    /// Working tree status entries, untracked ones included.
    pub working_tree: Vec<StatusEntry>,
}

/// Git command wrapper over a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct Git<R> {
    runner: R,
}

impl<R: CommandRunner> Git<R> {
    /// Wrap `runner`.
    #[must_use]
    pub const fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn git(&self, args: &[&str]) -> std::result::Result<String, RunnerError> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        self.runner.run(GIT, &args).await
    }

    async fn mutate(&self, action: &str, args: &[&str]) -> Result<()> {
        self.git(args)
            .await
            .map(|_| ())
            .map_err(|e| Error::command_failed(format!("Failed to {action}: {e}")))
    }

    /// Resolve `reference` to a commit hash.
    ///
    /// # Errors
    ///
    /// Returns an `UnknownReference` usage error when git cannot resolve the
    /// name, and a recovery error if git cannot be run at all.
    pub async fn hash_of(&self, reference: &str) -> Result<String> {
        match self.git(&["rev-parse", "--verify", reference]).await {
            Ok(out) => Ok(out.trim().to_string()),
            Err(RunnerError::Failed { .. }) => Err(Error::unknown_reference(reference)),
            Err(e) => Err(Error::command_failed(e.to_string())),
        }
    }

    /// Working tree status, untracked entries included.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git status` fails.
    pub async fn working_tree_status(&self) -> Result<Vec<StatusEntry>> {
        let out = self
            .git(&["status", "--porcelain"])
            .await
            .map_err(|e| Error::command_failed(format!("Failed to read working tree status: {e}")))?;
        Ok(parse_status(&out))
    }

    /// Path from the invocation directory to the repository root, e.g. `../`.
    ///
    /// Empty when invoked at the root.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if git cannot locate the repository.
    pub async fn root_offset(&self) -> Result<String> {
        let out = self
            .git(&["rev-parse", "--show-cdup"])
            .await
            .map_err(|e| Error::command_failed(format!("Failed to locate repository root: {e}")))?;
        Ok(out.trim().to_string())
    }

    /// Whether `path` is tracked by git.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if git cannot be run.
    pub async fn is_tracked(&self, path: &Path) -> Result<bool> {
        let path = path.to_string_lossy().into_owned();
        match self
            .git(&["ls-files", "--error-unmatch", "--", path.as_str()])
            .await
        {
            Ok(_) => Ok(true),
            Err(RunnerError::Failed { .. }) => Ok(false),
            Err(e) => Err(Error::command_failed(e.to_string())),
        }
    }

    /// Subject line of the commit at HEAD.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git show` fails.
    pub async fn head_subject(&self) -> Result<String> {
        let out = self
            .git(&["show", "-s", "--format=%s"])
            .await
            .map_err(|e| Error::command_failed(format!("Failed to read HEAD subject: {e}")))?;
        Ok(out.trim().to_string())
    }

    /// Stage `path`.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git add` fails.
    pub async fn stage(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy().into_owned();
        self.mutate(&format!("stage {path}"), &["add", "--", path.as_str()])
            .await
    }

    /// Commit staged changes.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git commit` fails.
    pub async fn commit(&self, message: &str) -> Result<()> {
        info!(message, "Committing");
        self.mutate("commit", &["commit", "-m", message]).await
    }

    /// Create a lightweight tag at HEAD.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git tag` fails.
    pub async fn tag(&self, name: &str) -> Result<()> {
        info!(tag = name, "Creating tag");
        self.mutate(&format!("create tag {name}"), &["tag", name])
            .await
    }

    /// Delete a local tag.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if the tag cannot be deleted, including when
    /// it does not exist.
    pub async fn delete_tag(&self, name: &str) -> Result<()> {
        self.mutate(&format!("delete tag {name}"), &["tag", "-d", name])
            .await
    }

    /// Reset the current branch, index and working tree to `target`.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git reset` fails.
    pub async fn reset_hard(&self, target: &str) -> Result<()> {
        self.mutate(&format!("reset to {target}"), &["reset", "--hard", target])
            .await
    }

    /// Move the branch back one commit, keeping its changes staged.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git reset` fails.
    pub async fn reset_soft_one(&self) -> Result<()> {
        self.mutate("soft-reset HEAD", &["reset", "--soft", "HEAD^"])
            .await
    }

    /// Check out `reference`.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git checkout` fails.
    pub async fn checkout(&self, reference: &str) -> Result<()> {
        self.mutate(&format!("check out {reference}"), &["checkout", "-q", reference])
            .await
    }

    /// Check out `reference`, discarding local modifications.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git checkout` fails.
    pub async fn force_checkout(&self, reference: &str) -> Result<()> {
        self.mutate(
            &format!("check out {reference}"),
            &["checkout", "-q", "-f", reference],
        )
        .await
    }

    /// Push `reference` to `remote`.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `git push` fails.
    pub async fn push(&self, remote: &str, reference: &str) -> Result<()> {
        info!(remote, reference, "Pushing");
        self.mutate(
            &format!("push {reference} to {remote}"),
            &["push", remote, reference],
        )
        .await
    }
}
