//! Version calculation and bumping logic.
//!
//! Increments follow npm's semantic-versioning rules:
//! - Stable bumps clear any prerelease and build metadata. A prerelease of the
//!   target version is promoted rather than bumped again (`1.2.5-pre` with
//!   `patch` becomes `1.2.5`).
//! - Prerelease bumps either start a new `<id>.0` series on the next patch or
//!   continue an existing `<id>.N` series.
//! - After a stable release the manifest is primed with a prerelease marker
//!   (`1.2.4` → `1.2.5-pre`) for the next development cycle.

use crate::config::{ReleaseType, StableBump};
use crate::error::{Error, Result};
use semver::{BuildMetadata, Prerelease, Version};

/// Suffix of the post-release development marker.
pub const PRERELEASE_MARKER: &str = "pre";

/// Versions produced by one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPlan {
    /// Version in the manifest before the release.
    pub previous: Version,
    /// Version that is tagged and published.
    pub release: Version,
    /// Development marker committed after a stable release.
    pub next_marker: Option<Version>,
}

impl VersionPlan {
    /// Plan the versions for `release_type` starting at `current`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidReleaseType` usage error if a prerelease identifier
    /// is not a valid semver identifier.
    pub fn new(current: &Version, release_type: &ReleaseType) -> Result<Self> {
        let release = compute_next(current, release_type)?;
        let next_marker = match release_type {
            ReleaseType::Stable(_) => Some(prerelease_marker(&release)),
            ReleaseType::Prerelease(_) => None,
        };
        Ok(Self {
            previous: current.clone(),
            release,
            next_marker,
        })
    }
}

/// Parse a manifest version string.
///
/// # Errors
///
/// Returns a `MissingManifest` usage error if the string is not valid semver.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed)
        .map_err(|e| Error::missing_manifest(format!("Invalid version \"{raw}\": {e}")))
}

/// Compute the version a release of `release_type` produces.
///
/// # Errors
///
/// Returns an `InvalidReleaseType` usage error for an unusable prerelease
/// identifier.
pub fn compute_next(current: &Version, release_type: &ReleaseType) -> Result<Version> {
    match release_type {
        ReleaseType::Stable(bump) => Ok(increment(current, *bump)),
        ReleaseType::Prerelease(id) => increment_prerelease(current, id),
    }
}

/// Apply a stable bump.
#[must_use]
pub fn increment(current: &Version, bump: StableBump) -> Version {
    let has_pre = !current.pre.is_empty();
    let mut next = Version::new(current.major, current.minor, current.patch);
    match bump {
        StableBump::Major => {
            if current.minor != 0 || current.patch != 0 || !has_pre {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
        }
        StableBump::Minor => {
            if current.patch != 0 || !has_pre {
                next.minor += 1;
            }
            next.patch = 0;
        }
        StableBump::Patch => {
            if !has_pre {
                next.patch += 1;
            }
        }
    }
    next
}

/// Apply a prerelease bump with `identifier`.
///
/// # Errors
///
/// Returns an `InvalidReleaseType` usage error if `identifier` is empty or
/// not a valid semver prerelease identifier, and a `MissingManifest` usage
/// error if the current numeric counter cannot be incremented.
pub fn increment_prerelease(current: &Version, identifier: &str) -> Result<Version> {
    if identifier.is_empty() || Prerelease::new(identifier).is_err() {
        return Err(Error::invalid_release_type(identifier));
    }

    let mut next = Version::new(current.major, current.minor, current.patch);
    let parts: Vec<String> = if current.pre.is_empty() {
        next.patch += 1;
        vec![identifier.to_string(), "0".to_string()]
    } else {
        let mut parts: Vec<String> = current.pre.as_str().split('.').map(String::from).collect();
        let mut overflowed = false;
        match parts.iter().rposition(|p| is_numeric(p)) {
            Some(idx) => match parts[idx].parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
                Some(n) => parts[idx] = n.to_string(),
                None => overflowed = true,
            },
            None => parts.push("0".to_string()),
        }
        let continues_series =
            parts[0] == identifier && parts.get(1).is_some_and(|p| is_numeric(p));
        if continues_series && overflowed {
            return Err(Error::missing_manifest(format!(
                "Cannot increment the prerelease counter of version {current}"
            )));
        }
        if continues_series {
            parts
        } else {
            vec![identifier.to_string(), "0".to_string()]
        }
    };

    next.pre =
        Prerelease::new(&parts.join(".")).map_err(|_| Error::invalid_release_type(identifier))?;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

/// Development marker following a stable release: next patch plus `-pre`.
#[must_use]
pub fn prerelease_marker(stable: &Version) -> Version {
    let mut marker = increment(stable, StableBump::Patch);
    // A stable version never carries a prerelease, so the marker is always valid.
    marker.pre = Prerelease::new(PRERELEASE_MARKER).unwrap_or(Prerelease::EMPTY);
    marker
}

fn is_numeric(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UsageKind;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn stable(bump: StableBump) -> ReleaseType {
        ReleaseType::Stable(bump)
    }

    fn pre(id: &str) -> ReleaseType {
        ReleaseType::Prerelease(id.to_string())
    }

    #[test]
    fn test_stable_increments() {
        assert_eq!(increment(&v("1.2.3"), StableBump::Patch), v("1.2.4"));
        assert_eq!(increment(&v("1.2.3"), StableBump::Minor), v("1.3.0"));
        assert_eq!(increment(&v("1.2.3"), StableBump::Major), v("2.0.0"));
    }

    #[test]
    fn test_stable_increment_promotes_prerelease() {
        assert_eq!(increment(&v("1.2.5-pre"), StableBump::Patch), v("1.2.5"));
        assert_eq!(increment(&v("1.3.0-pre"), StableBump::Minor), v("1.3.0"));
        assert_eq!(increment(&v("1.2.5-pre"), StableBump::Minor), v("1.3.0"));
        assert_eq!(increment(&v("2.0.0-rc.1"), StableBump::Major), v("2.0.0"));
        assert_eq!(increment(&v("1.2.5-pre"), StableBump::Major), v("2.0.0"));
    }

    #[test]
    fn test_stable_increment_drops_build_metadata() {
        assert_eq!(increment(&v("1.2.3+build.7"), StableBump::Patch), v("1.2.4"));
    }

    #[test]
    fn test_prerelease_starts_series_on_next_patch() {
        assert_eq!(increment_prerelease(&v("1.2.3"), "beta").unwrap(), v("1.2.4-beta.0"));
        assert_eq!(increment_prerelease(&v("2.0.0"), "rc").unwrap(), v("2.0.1-rc.0"));
    }

    #[test]
    fn test_prerelease_continues_series() {
        assert_eq!(
            increment_prerelease(&v("1.2.4-beta.0"), "beta").unwrap(),
            v("1.2.4-beta.1")
        );
        assert_eq!(
            increment_prerelease(&v("1.2.4-beta.9"), "beta").unwrap(),
            v("1.2.4-beta.10")
        );
    }

    #[test]
    fn test_prerelease_switches_identifier() {
        assert_eq!(
            increment_prerelease(&v("1.2.4-beta.3"), "rc").unwrap(),
            v("1.2.4-rc.0")
        );
        assert_eq!(increment_prerelease(&v("1.2.5-pre"), "beta").unwrap(), v("1.2.5-beta.0"));
    }

    #[test]
    fn test_prerelease_invalid_identifier() {
        let err = increment_prerelease(&v("1.2.3"), "not valid").unwrap_err();
        assert_eq!(err.usage_kind(), Some(UsageKind::InvalidReleaseType));
        assert!(increment_prerelease(&v("1.2.3"), "a..b").is_err());
    }

    #[test]
    fn test_prerelease_counter_at_limit_is_rejected() {
        let err = increment_prerelease(&v("1.2.3-beta.18446744073709551615"), "beta").unwrap_err();
        assert_eq!(err.usage_kind(), Some(UsageKind::MissingManifest));
        assert!(err.to_string().contains("1.2.3-beta.18446744073709551615"));
    }

    #[test]
    fn test_prerelease_counter_beyond_u64_is_rejected() {
        let err = increment_prerelease(&v("1.2.3-beta.99999999999999999999"), "beta").unwrap_err();
        assert_eq!(err.usage_kind(), Some(UsageKind::MissingManifest));
    }

    #[test]
    fn test_oversized_counter_allows_switching_identifier() {
        assert_eq!(
            increment_prerelease(&v("1.2.3-beta.18446744073709551615"), "rc").unwrap(),
            v("1.2.3-rc.0")
        );
    }

    #[test]
    fn test_prerelease_marker() {
        assert_eq!(prerelease_marker(&v("1.2.4")), v("1.2.5-pre"));
        assert_eq!(prerelease_marker(&v("2.0.0")).to_string(), "2.0.1-pre");
    }

    #[test]
    fn test_plan_stable_has_marker() {
        let plan = VersionPlan::new(&v("1.2.3"), &stable(StableBump::Patch)).unwrap();
        assert_eq!(plan.previous, v("1.2.3"));
        assert_eq!(plan.release, v("1.2.4"));
        assert_eq!(plan.next_marker, Some(v("1.2.5-pre")));
    }

    #[test]
    fn test_plan_prerelease_has_no_marker() {
        let plan = VersionPlan::new(&v("2.0.0"), &pre("rc")).unwrap();
        assert_eq!(plan.release, v("2.0.1-rc.0"));
        assert!(plan.next_marker.is_none());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3").unwrap(), v("1.2.3"));
        assert_eq!(parse_version(" v1.2.3 ").unwrap(), v("1.2.3"));
        let err = parse_version("1.2").unwrap_err();
        assert_eq!(err.usage_kind(), Some(UsageKind::MissingManifest));
    }

    fn stable_bump() -> impl Strategy<Value = StableBump> {
        prop_oneof![
            Just(StableBump::Major),
            Just(StableBump::Minor),
            Just(StableBump::Patch),
        ]
    }

    proptest! {
        #[test]
        fn prop_stable_bump_is_standard_increment(
            major in 0u64..1000,
            minor in 0u64..1000,
            patch in 0u64..1000,
            bump in stable_bump(),
        ) {
            let current = Version::new(major, minor, patch);
            let plan = VersionPlan::new(&current, &ReleaseType::Stable(bump)).unwrap();
            let expected = match bump {
                StableBump::Major => Version::new(major + 1, 0, 0),
                StableBump::Minor => Version::new(major, minor + 1, 0),
                StableBump::Patch => Version::new(major, minor, patch + 1),
            };
            prop_assert_eq!(&plan.release, &expected);
            let marker = plan.next_marker.unwrap();
            prop_assert_ne!(&marker, &current);
            prop_assert_ne!(&marker, &plan.release);
            prop_assert!(marker.to_string().ends_with("-pre"));
        }

        #[test]
        fn prop_prerelease_bump_incorporates_identifier(
            major in 0u64..1000,
            minor in 0u64..1000,
            patch in 0u64..1000,
            id in "[a-z][a-z0-9]{0,8}",
        ) {
            prop_assume!(!["major", "minor", "patch"].contains(&id.as_str()));
            let current = Version::new(major, minor, patch);
            let plan = VersionPlan::new(&current, &ReleaseType::Prerelease(id.clone())).unwrap();
            prop_assert!(plan.release.pre.as_str().starts_with(id.as_str()));
            prop_assert!(plan.release > current);
            prop_assert!(plan.next_marker.is_none());
        }
    }
}
