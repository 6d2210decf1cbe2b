use std::sync::Arc;

use tracing::{info, warn};

use crate::completion::CompletionBackend;
use crate::runner::{TestResult, TestSuiteResults};
use crate::utils::truncate_chars;

use super::parser::{parse_analysis_response, ParsedAnalysis};
use super::types::{AnalysisReport, FailurePattern, PatternKind};

const SYSTEM_PROMPT: &str = "You are an expert prompt engineer analyzing AI agent \
failures to recommend prompt improvements.";

/// How much of each prompt document is embedded into the analysis prompt.
const PROMPT_CONTEXT_CHARS: usize = 2000;
/// Failing examples included in the prompt.
const EXAMPLE_LIMIT: usize = 5;
/// Example descriptions attached to each derived pattern.
const PATTERN_EXAMPLE_LIMIT: usize = 3;

/// Sub-score bars for pattern derivation (80% of the dimension ceilings,
/// and the critical intent floor).
const INTENT_BAR: i32 = 12;
const PERSONALIZATION_BAR: i32 = 20;
const STRUCTURE_BAR: i32 = 28;
const MESSAGE_BAR: i32 = 20;

/// Derives failure patterns from suite statistics and asks the completion
/// backend for a deeper read. The backend failing is routine; the analyzer
/// then falls back to its deterministic rule table and the run continues.
pub struct FailureAnalyzer {
    completion: Arc<dyn CompletionBackend>,
}

impl FailureAnalyzer {
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }

    pub async fn analyze_failures(
        &self,
        suite: &TestSuiteResults,
        agents_text: &str,
        tasks_text: &str,
    ) -> AnalysisReport {
        info!(failures = suite.num_failures(), "Analyzing failures");

        let patterns = identify_failure_patterns(suite);

        let parsed = match self.deep_analysis(&patterns, suite, agents_text, tasks_text).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Completion-backed analysis failed, using rule-based fallback");
                fallback_analysis(&patterns)
            }
        };

        AnalysisReport {
            total_failures: suite.num_failures(),
            failure_patterns: patterns,
            agent_weaknesses: parsed.agent_weaknesses,
            task_weaknesses: parsed.task_weaknesses,
            priority_fixes: parsed.priority_fixes,
            summary: parsed.summary,
        }
    }

    async fn deep_analysis(
        &self,
        patterns: &[FailurePattern],
        suite: &TestSuiteResults,
        agents_text: &str,
        tasks_text: &str,
    ) -> crate::error::Result<ParsedAnalysis> {
        let prompt = build_analysis_prompt(patterns, suite, agents_text, tasks_text);
        let response = self.completion.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(parse_analysis_response(&response))
    }
}

/// Threshold each failed result against the sub-score bars; CTA comes from
/// the critical-failure entries.
pub fn identify_failure_patterns(suite: &TestSuiteResults) -> Vec<FailurePattern> {
    let failures: Vec<&TestResult> = suite.failures().collect();
    let total = failures.len();
    if total == 0 {
        return Vec::new();
    }

    let mut patterns = Vec::new();
    let mut push_pattern = |kind: PatternKind, matched: Vec<&TestResult>| {
        if matched.is_empty() {
            return;
        }
        let examples = matched
            .iter()
            .take(PATTERN_EXAMPLE_LIMIT)
            .map(|r| r.describe())
            .collect();
        patterns.push(FailurePattern::new(kind, matched.len(), total).with_examples(examples));
    };

    push_pattern(
        PatternKind::IntentCompliance,
        failures
            .iter()
            .copied()
            .filter(|r| r.score.as_ref().is_some_and(|s| s.intent.points < INTENT_BAR))
            .collect(),
    );
    push_pattern(
        PatternKind::PersonalizationWeak,
        failures
            .iter()
            .copied()
            .filter(|r| {
                r.score
                    .as_ref()
                    .is_some_and(|s| s.personalization.points < PERSONALIZATION_BAR)
            })
            .collect(),
    );
    push_pattern(
        PatternKind::StructureIssues,
        failures
            .iter()
            .copied()
            .filter(|r| r.score.as_ref().is_some_and(|s| s.structure.points < STRUCTURE_BAR))
            .collect(),
    );
    push_pattern(
        PatternKind::MessageQualityLow,
        failures
            .iter()
            .copied()
            .filter(|r| r.score.as_ref().is_some_and(|s| s.message.points < MESSAGE_BAR))
            .collect(),
    );
    push_pattern(
        PatternKind::MissingCta,
        failures
            .iter()
            .copied()
            .filter(|r| {
                r.critical_failures
                    .iter()
                    .any(|f| f.to_lowercase().contains("call-to-action"))
            })
            .collect(),
    );

    patterns
}

fn build_analysis_prompt(
    patterns: &[FailurePattern],
    suite: &TestSuiteResults,
    agents_text: &str,
    tasks_text: &str,
) -> String {
    let patterns_block: String = patterns
        .iter()
        .map(|p| {
            format!(
                "- {}: {} failures ({:.0}%) - {}\n",
                p.kind, p.frequency, p.percentage, p.root_cause
            )
        })
        .collect();

    let examples_block: String = suite
        .failures()
        .take(EXAMPLE_LIMIT)
        .map(|r| format!("- {}\n", r.describe()))
        .collect();

    format!(
        "You are analyzing failures in a multi-agent sales email generation system.\n\n\
         FAILURE PATTERNS IDENTIFIED:\n{patterns_block}\n\
         EXAMPLE FAILURES:\n{examples_block}\n\
         CURRENT AGENT PROMPTS (agents.yaml):\n```yaml\n{agents}\n```\n\n\
         CURRENT TASK DESCRIPTIONS (tasks.yaml):\n```yaml\n{tasks}\n```\n\n\
         Please analyze these failures and provide:\n\n\
         1. AGENT WEAKNESSES: Which agent prompts are unclear, missing instructions, or contradictory?\n\
            Format as: agent_name: [weakness1, weakness2, ...]\n\n\
         2. TASK WEAKNESSES: Which task descriptions need strengthening or clarification?\n\
            Format as: task_name: [weakness1, weakness2, ...]\n\n\
         3. PRIORITY FIXES: What are the top 5 most important changes to make?\n\
            Format as numbered list\n\n\
         4. SUMMARY: Brief 2-3 sentence summary of root causes and recommended approach\n\n\
         Format your response exactly as:\n\n\
         AGENT WEAKNESSES:\n\
         agent_name: [weakness1, weakness2]\n\
         ...\n\n\
         TASK WEAKNESSES:\n\
         task_name: [weakness1, weakness2]\n\
         ...\n\n\
         PRIORITY FIXES:\n\
         1. Fix1\n\
         2. Fix2\n\
         ...\n\n\
         SUMMARY:\n\
         Your summary here.\n",
        agents = truncate_chars(agents_text, PROMPT_CONTEXT_CHARS),
        tasks = truncate_chars(tasks_text, PROMPT_CONTEXT_CHARS),
    )
}

/// Deterministic analysis used whenever the completion backend is
/// unavailable. Keyed purely off which pattern kinds were detected.
pub fn fallback_analysis(patterns: &[FailurePattern]) -> ParsedAnalysis {
    let mut parsed = ParsedAnalysis::default();

    for pattern in patterns {
        match pattern.kind {
            PatternKind::IntentCompliance => {
                parsed.agent_weaknesses.insert(
                    "content_personalizer".to_string(),
                    vec![
                        "Not consistently using selling_intent keywords".to_string(),
                        "May be using generic messaging instead of specific use case".to_string(),
                    ],
                );
                parsed.agent_weaknesses.insert(
                    "email_copywriter".to_string(),
                    vec![
                        "Not enforcing selling_intent keywords in subject and body".to_string(),
                        "Allowing generic data platform messaging when specific intent provided"
                            .to_string(),
                    ],
                );
                parsed.priority_fixes.push(
                    "Strengthen selling_intent enforcement in content_personalizer and email_copywriter"
                        .to_string(),
                );
            }
            PatternKind::PersonalizationWeak => {
                parsed.agent_weaknesses.insert(
                    "linkedin_researcher".to_string(),
                    vec![
                        "May not be finding LinkedIn profiles consistently".to_string(),
                        "Confidence threshold may be too conservative".to_string(),
                    ],
                );
                parsed
                    .priority_fixes
                    .push("Improve LinkedIn research reliability and confidence assessment".to_string());
            }
            PatternKind::MissingCta => {
                parsed.agent_weaknesses.insert(
                    "email_copywriter".to_string(),
                    vec![
                        "Not consistently including strong CTAs".to_string(),
                        "May be using weak permission-seeking language".to_string(),
                    ],
                );
                parsed
                    .priority_fixes
                    .push("Add explicit CTA requirements with examples to email_copywriter".to_string());
            }
            PatternKind::StructureIssues => {
                parsed.task_weaknesses.insert(
                    "write_email_task".to_string(),
                    vec!["Structure requirements need explicit enumeration".to_string()],
                );
            }
            PatternKind::MessageQualityLow => {
                parsed.task_weaknesses.insert(
                    "write_email_task".to_string(),
                    vec!["Tone, length and subject-line expectations need tightening".to_string()],
                );
            }
        }
    }

    let kinds: Vec<&str> = patterns.iter().take(3).map(|p| p.kind.as_str()).collect();
    parsed.summary = format!(
        "Found {} failure patterns. Primary issues are {}.",
        patterns.len(),
        kinds.join(", ")
    );
    parsed
}
