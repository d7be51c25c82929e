//! Interactive confirmation on the terminal.

use async_trait::async_trait;
use pkgbump_release::{Confirmation, Confirmer, Error, ReleaseSummary, Result};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Asks on stderr and reads the answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirmer;

impl TerminalConfirmer {
    /// Create a terminal confirmer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Describe what is about to happen.
#[must_use]
pub fn render_summary(summary: &ReleaseSummary) -> String {
    let mut text = format!(
        "Version {} (was {}) is committed and tagged locally.\n",
        summary.version, summary.previous
    );
    if let Some(marker) = &summary.marker {
        text.push_str(&format!("The branch continues at {marker}.\n"));
    }
    match &summary.dist_tag {
        Some(tag) => text.push_str(&format!(
            "Publishing will use the \"{tag}\" dist-tag and push to {}/{}.\n",
            summary.remote, summary.branch
        )),
        None => text.push_str(&format!(
            "Publishing will push to {}/{}.\n",
            summary.remote, summary.branch
        )),
    }
    text
}

/// Whether a y/N answer is affirmative.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

fn io_error(e: &io::Error) -> Error {
    Error::command_failed(format!("Failed to read confirmation: {e}"))
}

#[allow(clippy::print_stderr)]
fn ask(question: &str) -> Result<()> {
    eprint!("{question}");
    io::stderr().flush().map_err(|e| io_error(&e))
}

#[async_trait]
impl Confirmer for TerminalConfirmer {
    #[allow(clippy::print_stderr)]
    async fn confirm(&self, summary: &ReleaseSummary) -> Result<Confirmation> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        eprint!("{}", render_summary(summary));
        ask("Are you sure you want to publish the new version? [y/N] ")?;
        let answer = lines.next_line().await.map_err(|e| io_error(&e))?;
        if !answer.as_deref().is_some_and(is_affirmative) {
            return Ok(Confirmation::decline());
        }

        ask("One-time password (leave empty if none): ")?;
        let otp = lines.next_line().await.map_err(|e| io_error(&e))?;
        Ok(Confirmation::accept(otp.map(|code| code.trim().to_string())))
    }
}
