//! Operator confirmation seam.
//!
//! The orchestrator suspends once, after the release commits and tag exist
//! locally, and asks a [`Confirmer`] whether to publish. The answer decides
//! between publishing and rolling back.

use crate::error::Result;
use async_trait::async_trait;
use semver::Version;
use serde::Serialize;

/// What the operator is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    /// Version before the release.
    pub previous: Version,
    /// Version being tagged and published.
    pub version: Version,
    /// Development marker committed after the tag, for stable releases.
    pub marker: Option<Version>,
    /// Remote the tag and branch will be pushed to.
    pub remote: String,
    /// Release branch.
    pub branch: String,
    /// Distribution tag passed to the registry, for prerelease bumps.
    pub dist_tag: Option<String>,
}

/// The operator's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Whether to publish and push.
    pub proceed: bool,
    /// One-time password for the registry. Empty input is stored as `None`.
    pub otp: Option<String>,
}

impl Confirmation {
    /// Proceed, optionally with a one-time password.
    #[must_use]
    pub fn accept(otp: Option<String>) -> Self {
        Self {
            proceed: true,
            otp: otp.filter(|code| !code.trim().is_empty()),
        }
    }

    /// Abort and roll back.
    #[must_use]
    pub const fn decline() -> Self {
        Self {
            proceed: false,
            otp: None,
        }
    }
}

/// Asks the operator whether to publish.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Present `summary` and wait for an answer. No timeout applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read; the attempt is then
    /// rolled back.
    async fn confirm(&self, summary: &ReleaseSummary) -> Result<Confirmation>;
}

#[async_trait]
impl<T: Confirmer + ?Sized> Confirmer for &T {
    async fn confirm(&self, summary: &ReleaseSummary) -> Result<Confirmation> {
        (**self).confirm(summary).await
    }
}
