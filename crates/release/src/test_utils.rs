//! Scripted collaborators for unit tests.

use crate::error::Result;
use crate::prompt::{Confirmation, Confirmer, ReleaseSummary};
use crate::runner::{render_command, CommandRunner, RunnerError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Records every command and answers from a table.
///
/// Commands without a scripted response succeed with empty output; commands
/// marked with [`FakeRunner::fail`] exit with status 1.
#[derive(Debug, Default)]
pub struct FakeRunner {
    responses: HashMap<String, String>,
    failures: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses
            .insert(command.to_string(), output.to_string());
        self
    }

    pub fn fail(mut self, command: &str) -> Self {
        self.failures.insert(command.to_string());
        self
    }

    /// Script a clean checkout of `branch` at `hash` that matches its remote.
    pub fn clean_repo(self, branch: &str, hash: &str) -> Self {
        self.respond("git rev-parse --verify HEAD", hash)
            .respond(&format!("git rev-parse --verify {branch}"), hash)
            .respond(&format!("git rev-parse --verify origin/{branch}"), hash)
            .respond("git status --porcelain", "")
            .respond("git rev-parse --show-cdup", "\n")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn position(&self, command: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == command)
    }

    pub fn called(&self, command: &str) -> bool {
        self.position(command).is_some()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                [
                    "git add", "git commit", "git tag", "git reset", "git checkout", "git push",
                    "npm publish",
                ]
                .iter()
                .any(|prefix| c.starts_with(prefix))
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::result::Result<String, RunnerError> {
        let command = render_command(program, args);
        self.calls.lock().unwrap().push(command.clone());
        if self.failures.contains(&command) {
            return Err(RunnerError::Failed {
                command,
                code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }
        Ok(self.responses.get(&command).cloned().unwrap_or_default())
    }
}

/// Answers every confirmation the same way and remembers what it was shown.
#[derive(Debug)]
pub struct ScriptedConfirmer {
    answer: Confirmation,
    seen: Mutex<Vec<ReleaseSummary>>,
}

impl ScriptedConfirmer {
    pub fn accept() -> Self {
        Self::answering(Confirmation::accept(None))
    }

    pub fn accept_with_otp(otp: &str) -> Self {
        Self::answering(Confirmation::accept(Some(otp.to_string())))
    }

    pub fn decline() -> Self {
        Self::answering(Confirmation::decline())
    }

    fn answering(answer: Confirmation) -> Self {
        Self {
            answer,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<ReleaseSummary> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, summary: &ReleaseSummary) -> Result<Confirmation> {
        self.seen.lock().unwrap().push(summary.clone());
        Ok(self.answer.clone())
    }
}
