use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{OutreachError, Result};
use crate::prospect::{GenerationResult, ProspectInput};

/// Produces one personalized email per prospect. Implementations are opaque
/// to the runner: an external crew process in production, a stub in tests.
#[async_trait]
pub trait GenerationPipeline: Send + Sync {
    async fn generate(&self, prospect: &ProspectInput) -> Result<GenerationResult>;
}

/// Production pipeline: spawns the configured crew command with the prospect
/// fields as arguments and parses its stdout. The wait is bounded; a timeout
/// surfaces as `OutreachError::Timeout` and the runner converts it into a
/// failed test result.
pub struct CommandPipeline {
    command: String,
    base_args: Vec<String>,
    timeout_secs: u64,
}

impl CommandPipeline {
    pub fn new(command: impl Into<String>, base_args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            base_args,
            timeout_secs,
        }
    }

    fn prospect_args(prospect: &ProspectInput) -> Vec<(&'static str, &str)> {
        let mut args = vec![
            ("--first-name", prospect.first_name.as_str()),
            ("--last-name", prospect.last_name.as_str()),
            ("--company", prospect.company.as_str()),
        ];
        for (flag, value) in [
            ("--title", &prospect.title),
            ("--phone", &prospect.phone),
            ("--country", &prospect.country),
            ("--linkedin-profile", &prospect.linkedin_profile),
            ("--selling-intent", &prospect.selling_intent),
        ] {
            if !value.is_empty() {
                args.push((flag, value.as_str()));
            }
        }
        args
    }
}

#[async_trait]
impl GenerationPipeline for CommandPipeline {
    async fn generate(&self, prospect: &ProspectInput) -> Result<GenerationResult> {
        let mut command = Command::new(&self.command);
        command.args(&self.base_args);
        for (flag, value) in Self::prospect_args(prospect) {
            command.arg(flag).arg(value);
        }

        debug!(
            command = %self.command,
            prospect = %prospect.display_name(),
            "Invoking generation pipeline"
        );

        let output = timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| {
                OutreachError::Timeout(format!(
                    "generation for {} after {}s",
                    prospect.display_name(),
                    self.timeout_secs
                ))
            })?
            .map_err(|e| OutreachError::Generation(format!("failed to spawn pipeline: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = ?output.status.code(), stderr = %stderr, "Pipeline exited with failure");
            return Err(OutreachError::Generation(format!(
                "pipeline exited with {:?}",
                output.status.code()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pipeline_output(&stdout).ok_or_else(|| {
            OutreachError::Generation("pipeline produced no parseable email output".to_string())
        })
    }
}

/// Extract a `GenerationResult` from raw pipeline stdout.
///
/// Preferred form is a single-line JSON object (scanned bottom-up, since the
/// result is printed last after the crew's own logging). Falls back to
/// `field:` marker lines for pipelines that print fields individually.
/// Returns `None` when neither form yields a subject line and a body.
pub fn parse_pipeline_output(stdout: &str) -> Option<GenerationResult> {
    let lines: Vec<&str> = stdout.lines().collect();

    for line in lines.iter().rev() {
        let trimmed = line.trim();
        if trimmed.starts_with('{') && trimmed.contains("subject_line") {
            if let Ok(result) = serde_json::from_str::<GenerationResult>(trimmed) {
                return Some(result);
            }
        }
    }

    // Marker fallback: subject_line: ... / email_body: ... / follow_up_notes: ...
    let mut result = GenerationResult::default();
    let mut seen_subject = false;
    for line in &lines {
        let lower = line.to_lowercase();
        if let Some(value) = marker_value(line, &lower, "subject_line:") {
            result.subject_line = value;
            seen_subject = true;
        } else if let Some(value) = marker_value(line, &lower, "email_body:") {
            if seen_subject {
                result.email_body = value;
            }
        } else if let Some(value) = marker_value(line, &lower, "follow_up_notes:") {
            if seen_subject {
                result.follow_up_notes = value;
            }
        }
    }

    if !result.subject_line.is_empty() && !result.email_body.is_empty() {
        Some(result)
    } else {
        None
    }
}

fn marker_value(line: &str, lower: &str, marker: &str) -> Option<String> {
    let start = lower.find(marker)?;
    // The index comes from the lowercased copy; case folding can change byte
    // lengths, so the slice into the original line is fallible.
    let value = line.get(start + marker.len()..)?;
    Some(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_json_line() {
        let stdout = "crew log line\nanother line\n\
            {\"subject_line\":\"Hello\",\"email_body\":\"Hi Milan,\",\"follow_up_notes\":\"none\"}\n";
        let result = parse_pipeline_output(stdout).expect("json output parses");
        assert_eq!(result.subject_line, "Hello");
        assert_eq!(result.email_body, "Hi Milan,");
    }

    #[test]
    fn prefers_the_last_json_object() {
        let stdout = "{\"subject_line\":\"old\",\"email_body\":\"x\"}\n\
            noise\n\
            {\"subject_line\":\"new\",\"email_body\":\"y\"}\n";
        let result = parse_pipeline_output(stdout).expect("parses");
        assert_eq!(result.subject_line, "new");
    }

    #[test]
    fn falls_back_to_marker_lines() {
        let stdout = "Subject_line: Coffee Insights\nEmail_body: Hi Milan, hello\n";
        let result = parse_pipeline_output(stdout).expect("marker output parses");
        assert_eq!(result.subject_line, "Coffee Insights");
        assert_eq!(result.email_body, "Hi Milan, hello");
    }

    #[test]
    fn unparseable_output_is_none() {
        assert!(parse_pipeline_output("nothing useful here").is_none());
        assert!(parse_pipeline_output("email_body: body but no subject").is_none());
        assert!(parse_pipeline_output("").is_none());
    }

    #[test]
    fn optional_prospect_fields_are_skipped_when_empty() {
        let prospect = ProspectInput {
            first_name: "Milan".to_string(),
            last_name: "Kulhanek".to_string(),
            company: "Deloitte".to_string(),
            selling_intent: "coffee machine".to_string(),
            ..ProspectInput::default()
        };
        let args = CommandPipeline::prospect_args(&prospect);
        let flags: Vec<&str> = args.iter().map(|(f, _)| *f).collect();
        assert!(flags.contains(&"--selling-intent"));
        assert!(!flags.contains(&"--phone"));
        assert!(!flags.contains(&"--title"));
    }
}
