//! Package registry publishing.

use crate::config::PublishAccess;
use crate::error::{Error, Result};
use crate::runner::CommandRunner;
use tracing::info;

const NPM: &str = "npm";

/// Options for one `npm publish` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Registry access level; omitted when unset.
    pub access: Option<PublishAccess>,
    /// Distribution tag; omitted for stable releases.
    pub tag: Option<String>,
    /// One-time password; omitted when empty.
    pub otp: Option<String>,
}

impl PublishOptions {
    /// Command-line arguments after `npm publish <dir>`.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(tag) = &self.tag {
            args.push("--tag".to_string());
            args.push(tag.clone());
        }
        if let Some(otp) = self.otp.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            args.push("--otp".to_string());
            args.push(otp.to_string());
        }
        if let Some(access) = self.access {
            args.push("--access".to_string());
            args.push(access.registry_value().to_string());
        }
        args
    }
}

/// npm command wrapper over a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct Npm<R> {
    runner: R,
}

impl<R: CommandRunner> Npm<R> {
    /// Wrap `runner`.
    #[must_use]
    pub const fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Publish the package in `dir`.
    ///
    /// # Errors
    ///
    /// Returns a recovery error if `npm publish` fails.
    pub async fn publish(&self, dir: &str, options: &PublishOptions) -> Result<()> {
        info!(dir, tag = ?options.tag, access = ?options.access, "Publishing package");
        let mut args = vec!["publish".to_string(), dir.to_string()];
        args.extend(options.to_args());
        self.runner
            .run(NPM, &args)
            .await
            .map(|_| ())
            .map_err(|e| Error::command_failed(format!("Failed to publish: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeRunner;

    #[test]
    fn test_default_options_add_nothing() {
        assert!(PublishOptions::default().to_args().is_empty());
    }

    #[test]
    fn test_empty_otp_is_omitted() {
        let options = PublishOptions {
            otp: Some("  ".to_string()),
            ..PublishOptions::default()
        };
        assert!(options.to_args().is_empty());
    }

    #[tokio::test]
    async fn test_publish_with_all_options() {
        let runner = FakeRunner::new();
        let npm = Npm::new(&runner);
        let options = PublishOptions {
            access: Some(PublishAccess::Private),
            tag: Some("beta".to_string()),
            otp: Some("123456".to_string()),
        };
        npm.publish(".", &options).await.unwrap();
        assert_eq!(
            runner.calls(),
            vec!["npm publish . --tag beta --otp 123456 --access restricted"]
        );
    }

    #[tokio::test]
    async fn test_publish_failure() {
        let runner = FakeRunner::new().fail("npm publish .");
        let npm = Npm::new(&runner);
        let err = npm.publish(".", &PublishOptions::default()).await.unwrap_err();
        assert!(err.is_recovery());
        assert!(err.to_string().starts_with("Failed to publish"));
    }
}
