//! The text-completion collaborator seam.
//!
//! Failure analysis and prompt adaptation both ask an LLM for free-form
//! text. The trait keeps them testable; the command-backed implementation
//! shells out to a completion CLI. Callers must treat every error from this
//! seam as recoverable and fall back to their rule-based path.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{OutreachError, Result};

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion. `system` frames the role, `prompt` is the task.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Completion backend that pipes the prompt into a CLI (e.g. `claude -p`)
/// and reads the response from stdout.
pub struct CommandCompletion {
    command: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandCompletion {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            args,
            timeout_secs,
        }
    }
}

#[async_trait]
impl CompletionBackend for CommandCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        debug!(command = %self.command, prompt_len = prompt.len(), "Running completion");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| OutreachError::Completion(format!("failed to spawn: {}", e)))?;

        let full_prompt = format!("{}\n\n{}", system, prompt);
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(full_prompt.as_bytes())
                .await
                .map_err(|e| OutreachError::Completion(format!("failed to write prompt: {}", e)))?;
            drop(stdin);
        }

        let output = timeout(Duration::from_secs(self.timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| {
                OutreachError::Timeout(format!("completion after {}s", self.timeout_secs))
            })?
            .map_err(|e| OutreachError::Completion(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = ?output.status.code(), stderr = %stderr, "Completion command failed");
            return Err(OutreachError::Completion(format!(
                "command exited with {:?}",
                output.status.code()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
