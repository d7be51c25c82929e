use crate::tracing::LogLevel;
use clap::Parser;
use miette::Report;
use pkgbump_release::config::{DEFAULT_BRANCH, DEFAULT_REMOTE};
use pkgbump_release::{Error, PublishAccess, ReleaseConfig, ReleaseOutcome};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// A release failed after it started; local changes were reverted (or
/// reverting failed)
pub const EXIT_RECOVERY: i32 = 1;
/// Invalid input or repository state; nothing was changed
pub const EXIT_USAGE: i32 = 2;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "pkgbump")]
#[command(
    about = "Bump the package version, tag it, publish to npm and push, reverting everything on failure"
)]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Release type: major, minor, patch or a prerelease identifier such as beta.
    #[arg(value_name = "RELEASE_TYPE")]
    pub release_type: Option<String>,

    /// Release type; takes precedence over the positional argument.
    #[arg(short = 't', long = "type", value_name = "RELEASE_TYPE")]
    pub type_flag: Option<String>,

    /// Remote to validate against and push to.
    #[arg(short, long, env = "PKGBUMP_REMOTE", default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Branch to release from.
    #[arg(short, long, env = "PKGBUMP_BRANCH", default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Prefix for release commit messages.
    #[arg(short, long, env = "PKGBUMP_PREFIX", default_value = "")]
    pub prefix: String,

    /// Registry access level: public or private.
    #[arg(long, env = "PKGBUMP_ACCESS", value_name = "ACCESS")]
    pub access: Option<String>,

    /// Directory to run in.
    #[arg(short = 'C', long, default_value = ".")]
    pub cwd: PathBuf,

    /// Logging verbosity level.
    #[arg(
        short = 'l',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON output and JSON logs.
    #[arg(long, help = "Emit JSON envelope and JSON logs")]
    pub json: bool,
}

impl Cli {
    /// Release type token, if one was given.
    ///
    /// `--type` wins over the positional argument; blank values count as absent.
    #[must_use]
    pub fn release_type(&self) -> Option<&str> {
        self.type_flag
            .as_deref()
            .or(self.release_type.as_deref())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Build the release configuration.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidAccess` usage error for an unknown access level.
    pub fn release_config(&self) -> pkgbump_release::Result<ReleaseConfig> {
        let mut config = ReleaseConfig::new(&self.remote, &self.branch)
            .with_commit_prefix(&self.prefix);
        if let Some(access) = self.access.as_deref().filter(|a| !a.trim().is_empty()) {
            config = config.with_publish_access(access.parse::<PublishAccess>()?);
        }
        Ok(config)
    }
}

/// Parse command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Map a release error to an exit code
#[must_use]
pub const fn exit_code_for(err: &Error) -> i32 {
    match err {
        Error::Usage { .. } => EXIT_USAGE,
        Error::Recovery { .. } => EXIT_RECOVERY,
    }
}

/// Operator-facing line printed after a failure, if any.
#[must_use]
pub const fn recovery_note(err: &Error) -> Option<&'static str> {
    match err {
        Error::Usage { .. } => None,
        Error::Recovery { reverted: true, .. } => Some("Changes reverted"),
        Error::Recovery {
            kind: pkgbump_release::RecoveryKind::RollbackFailed,
            ..
        } => Some("ROLLBACK FAILED: the repository was left mid-release and must be repaired by hand"),
        Error::Recovery { .. } => None,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &Error, json_mode: bool) {
    if json_mode {
        let (kind, code) = match err {
            Error::Usage { kind, .. } => ("usage", kind.as_str()),
            Error::Recovery { kind, .. } => ("recovery", kind.as_str()),
        };
        let reverted = matches!(err, Error::Recovery { reverted: true, .. });
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "kind": kind,
            "code": code,
            "message": err.to_string(),
            "reverted": reverted,
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        if let Some(note) = recovery_note(err) {
            eprintln!("{note}");
        }
        // Ensure output is flushed before potential process exit
        let _ = io::stderr().flush();
    }
}

/// Print the result of a finished release.
#[allow(clippy::print_stdout)]
pub fn render_outcome(outcome: &ReleaseOutcome, json_mode: bool) {
    if json_mode {
        let data = match outcome {
            ReleaseOutcome::Published { version, marker } => serde_json::json!({
                "outcome": "published",
                "version": version.to_string(),
                "marker": marker.as_ref().map(ToString::to_string),
            }),
            ReleaseOutcome::Declined { version } => serde_json::json!({
                "outcome": "declined",
                "version": version.to_string(),
            }),
        };
        if let Ok(json) = serde_json::to_string(&OkEnvelope::new(data)) {
            println!("{json}");
        }
    } else {
        match outcome {
            ReleaseOutcome::Published { version, .. } => println!("Released {version}"),
            ReleaseOutcome::Declined { .. } => println!("Changes reverted"),
        }
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgbump_release::UsageKind;

    fn parse_from(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pkgbump").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse_from(&["patch"]);
        assert_eq!(cli.release_type(), Some("patch"));
        let config = cli.release_config().unwrap();
        assert_eq!(config, ReleaseConfig::default());
        assert_eq!(cli.level, LogLevel::Warn);
        assert!(!cli.json);
    }

    #[test]
    fn test_type_flag_takes_precedence() {
        let cli = parse_from(&["patch", "-t", "beta"]);
        assert_eq!(cli.release_type(), Some("beta"));
    }

    #[test]
    fn test_missing_release_type() {
        assert_eq!(parse_from(&[]).release_type(), None);
        assert_eq!(parse_from(&["  "]).release_type(), None);
    }

    #[test]
    fn test_config_flags() {
        let cli = parse_from(&[
            "minor", "-r", "upstream", "-b", "master", "-p", "[ci skip]", "--access", "public",
        ]);
        let config = cli.release_config().unwrap();
        assert_eq!(config.remote_name, "upstream");
        assert_eq!(config.branch, "master");
        assert_eq!(config.commit_prefix, "[ci skip]");
        assert_eq!(config.publish_access, Some(PublishAccess::Public));
    }

    #[test]
    fn test_invalid_access_is_usage_error() {
        let cli = parse_from(&["patch", "--access", "team"]);
        let err = cli.release_config().unwrap_err();
        assert_eq!(err.usage_kind(), Some(UsageKind::InvalidAccess));
        assert_eq!(exit_code_for(&err), EXIT_USAGE);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EXIT_OK, 0);
        assert_eq!(exit_code_for(&Error::uncommitted_changes()), EXIT_USAGE);
        assert_eq!(exit_code_for(&Error::step_failed("push failed")), EXIT_RECOVERY);
        assert_eq!(exit_code_for(&Error::rollback_failed("reset failed")), EXIT_RECOVERY);
    }

    #[test]
    fn test_recovery_notes() {
        assert_eq!(recovery_note(&Error::unpushed_changes()), None);
        assert_eq!(
            recovery_note(&Error::step_failed("npm publish failed")),
            Some("Changes reverted")
        );
        assert!(
            recovery_note(&Error::rollback_failed("reset failed"))
                .is_some_and(|note| note.starts_with("ROLLBACK FAILED"))
        );
        assert_eq!(recovery_note(&Error::command_failed("git status failed")), None);
    }

    #[test]
    fn test_envelopes() {
        let ok = serde_json::to_value(OkEnvelope::new(1)).unwrap();
        assert_eq!(ok["status"], "ok");
        let err = serde_json::to_value(ErrorEnvelope::new("boom")).unwrap();
        assert_eq!(err["status"], "error");
    }
}
