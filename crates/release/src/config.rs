//! Release configuration types.
//!
//! [`ReleaseConfig`] and [`ReleaseType`] are the two inputs of a release. The
//! CLI builds them once per invocation; the core never mutates them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default remote to validate against and push to.
pub const DEFAULT_REMOTE: &str = "origin";

/// Default release branch.
pub const DEFAULT_BRANCH: &str = "main";

/// Registry visibility passed to the publish command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAccess {
    /// Publicly installable package.
    Public,
    /// Restricted (scoped) package.
    Private,
}

impl PublishAccess {
    /// Value passed to `npm publish --access`.
    ///
    /// npm calls private scoped packages `restricted`.
    #[must_use]
    pub const fn registry_value(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "restricted",
        }
    }
}

impl fmt::Display for PublishAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

impl FromStr for PublishAccess {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" | "restricted" => Ok(Self::Private),
            _ => Err(Error::invalid_access(s)),
        }
    }
}

/// Settings for one release invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// Remote that is validated against and pushed to.
    pub remote_name: String,
    /// Branch releases are cut from.
    pub branch: String,
    /// Prefix prepended to release commit messages.
    pub commit_prefix: String,
    /// Registry access level; npm's default applies when unset.
    pub publish_access: Option<PublishAccess>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            remote_name: DEFAULT_REMOTE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            commit_prefix: String::new(),
            publish_access: None,
        }
    }
}

impl ReleaseConfig {
    /// Create a configuration for `remote`/`branch` with no prefix or access.
    #[must_use]
    pub fn new(remote_name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote_name: remote_name.into(),
            branch: branch.into(),
            ..Self::default()
        }
    }

    /// Sets the commit message prefix.
    #[must_use]
    pub fn with_commit_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.commit_prefix = prefix.into();
        self
    }

    /// Sets the publish access level.
    #[must_use]
    pub const fn with_publish_access(mut self, access: PublishAccess) -> Self {
        self.publish_access = Some(access);
        self
    }

    /// Remote-tracking reference of the release branch, e.g. `origin/main`.
    #[must_use]
    pub fn remote_branch(&self) -> String {
        format!("{}/{}", self.remote_name, self.branch)
    }

    /// Build a commit message, prepending the prefix when one is set.
    #[must_use]
    pub fn commit_message(&self, body: &str) -> String {
        let prefix = self.commit_prefix.trim();
        if prefix.is_empty() {
            body.to_string()
        } else {
            format!("{prefix} {body}")
        }
    }
}

/// Stable bump levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StableBump {
    /// `1.2.3` → `2.0.0`
    Major,
    /// `1.2.3` → `1.3.0`
    Minor,
    /// `1.2.3` → `1.2.4`
    Patch,
}

impl fmt::Display for StableBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

/// Kind of release requested by the operator.
///
/// `major`, `minor` and `patch` are reserved; any other non-empty token is a
/// prerelease identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReleaseType {
    /// A stable bump.
    Stable(StableBump),
    /// A prerelease bump with the given identifier, e.g. `beta`.
    Prerelease(String),
}

impl ReleaseType {
    /// Parse an operator-supplied token.
    ///
    /// # Errors
    ///
    /// Returns a `MissingReleaseType` usage error for an empty token.
    pub fn parse(token: &str) -> Result<Self> {
        match token.trim() {
            "" => Err(Error::missing_release_type()),
            "major" => Ok(Self::Stable(StableBump::Major)),
            "minor" => Ok(Self::Stable(StableBump::Minor)),
            "patch" => Ok(Self::Stable(StableBump::Patch)),
            other => Ok(Self::Prerelease(other.to_string())),
        }
    }

    /// Returns true for prerelease bumps.
    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        matches!(self, Self::Prerelease(_))
    }

    /// Distribution tag for the publish command (prerelease bumps only).
    #[must_use]
    pub fn dist_tag(&self) -> Option<&str> {
        match self {
            Self::Stable(_) => None,
            Self::Prerelease(id) => Some(id),
        }
    }
}

impl FromStr for ReleaseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable(bump) => write!(f, "{bump}"),
            Self::Prerelease(id) => write!(f, "{id}"),
        }
    }
}
