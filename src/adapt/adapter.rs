use std::sync::Arc;

use tracing::{info, warn};

use crate::analysis::{AnalysisReport, PatternKind};
use crate::completion::CompletionBackend;
use crate::config::{PromptDoc, PromptStore};
use crate::error::Result;
use crate::runner::TestResult;

use super::parser::parse_improvements_response;
use super::types::{ImprovementTarget, PromptImprovement, PromptImprovements};

const SYSTEM_PROMPT: &str = "You are an expert prompt engineer specializing in improving \
AI agent prompts to fix specific failure patterns.";

/// Failing examples embedded into the adaptation prompt.
const EXAMPLE_LIMIT: usize = 3;

/// Canned fallback texts, appended to the existing field when the
/// completion backend is unavailable.
const INTENT_ENFORCEMENT: &str = "\n\nCRITICAL SELLING INTENT ENFORCEMENT:\n\
When selling_intent is provided, you MUST use those EXACT keywords throughout the email.\n\
Subject line MUST contain keywords from selling_intent.\n\
Email body MUST mention selling_intent keywords multiple times.\n\
NO generic data platform messaging when specific intent provided.";

const RESEARCH_ENFORCEMENT: &str = "\n\nMANDATORY: You MUST return LinkedIn profiles for \
unique name + company combinations.\n\
Don't be overly cautious - if the profile clearly matches, return it with high confidence.";

const CTA_ENFORCEMENT: &str = "\n\nMANDATORY CTA: Every email MUST end with a strong \
assumptive call-to-action.\n\
Examples: 'When's the best time this week for a 15-minute call?'\n\
FORBIDDEN: Weak CTAs like 'Would you be open to...'";

/// Turns an analysis report into concrete edits to the prompt documents and
/// applies them. Uses the completion backend when it answers, a fixed
/// catalogue of known-good edits when it does not.
pub struct PromptAdapter {
    completion: Arc<dyn CompletionBackend>,
}

impl PromptAdapter {
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }

    pub async fn adapt_prompts(
        &self,
        analysis: &AnalysisReport,
        agents: &PromptDoc,
        tasks: &PromptDoc,
        failure_examples: &[&TestResult],
    ) -> PromptImprovements {
        info!("Generating prompt improvements");

        let prompt = build_improvement_prompt(analysis, agents, tasks, failure_examples);
        match self.completion.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(response) => {
                let improvements = parse_improvements_response(&response, agents, tasks);
                info!(count = improvements.improvements.len(), "Parsed improvements");
                improvements
            }
            Err(e) => {
                warn!(error = %e, "Completion-backed adaptation failed, using canned improvements");
                fallback_improvements(analysis, agents, tasks)
            }
        }
    }

    /// Overwrite the named field of each improvement's target entity and
    /// persist both documents. Improvements naming unknown entities are
    /// skipped with a warning; the rest still apply.
    pub async fn apply_improvements(
        &self,
        improvements: &PromptImprovements,
        store: &PromptStore,
    ) -> Result<()> {
        if improvements.is_empty() {
            info!("No improvements to apply");
            return Ok(());
        }

        let mut agents = store.load_agents().await?;
        let mut tasks = store.load_tasks().await?;

        let mut applied = 0usize;
        for improvement in &improvements.improvements {
            let doc = match improvement.target {
                ImprovementTarget::Agent => &mut agents,
                ImprovementTarget::Task => &mut tasks,
            };
            match doc.set_field(&improvement.name, &improvement.field, &improvement.improved_text) {
                Ok(()) => {
                    applied += 1;
                    info!(
                        target = %improvement.target,
                        name = %improvement.name,
                        field = %improvement.field,
                        "Applied improvement"
                    );
                }
                Err(e) => {
                    warn!(
                        target = %improvement.target,
                        name = %improvement.name,
                        error = %e,
                        "Skipping improvement for unknown entity"
                    );
                }
            }
        }

        store.save_agents(&agents).await?;
        store.save_tasks(&tasks).await?;
        info!(applied, total = improvements.improvements.len(), "Persisted prompt documents");
        Ok(())
    }
}

fn build_improvement_prompt(
    analysis: &AnalysisReport,
    agents: &PromptDoc,
    tasks: &PromptDoc,
    failure_examples: &[&TestResult],
) -> String {
    let patterns_block: String = analysis
        .failure_patterns
        .iter()
        .map(|p| {
            format!(
                "- {} ({}): {} failures - {}\n",
                p.kind, p.severity, p.frequency, p.root_cause
            )
        })
        .collect();

    let fixes_block: String = analysis
        .priority_fixes
        .iter()
        .enumerate()
        .map(|(i, fix)| format!("{}. {}\n", i + 1, fix))
        .collect();

    let examples_block: String = failure_examples
        .iter()
        .take(EXAMPLE_LIMIT)
        .map(|r| format!("- {}\n", r.describe()))
        .collect();

    format!(
        "You are improving AI agent prompts based on failure analysis.\n\n\
         FAILURE ANALYSIS:\n{summary}\n\n\
         FAILURE PATTERNS:\n{patterns_block}\n\
         PRIORITY FIXES NEEDED:\n{fixes_block}\n\
         EXAMPLE FAILURES:\n{examples_block}\n\
         CURRENT AGENTS: {agent_names}\n\
         CURRENT TASKS: {task_names}\n\n\
         YOUR TASK:\n\
         Generate specific prompt improvements to address these failures. For each improvement:\n\
         1. Identify which agent or task needs modification\n\
         2. Identify which field (backstory, goal, description, expected_output)\n\
         3. Provide the improved text\n\
         4. Explain the rationale\n\n\
         GUIDELINES:\n\
         - Be specific and actionable\n\
         - Address root causes, not symptoms\n\
         - Preserve existing good functionality\n\
         - Strengthen critical requirements with \"CRITICAL:\", \"MANDATORY:\", etc.\n\
         - For intent compliance issues: Add explicit selling_intent enforcement\n\
         - For personalization issues: Strengthen research requirements\n\
         - For CTA issues: Add CTA examples and requirements\n\n\
         FORMAT YOUR RESPONSE AS:\n\n\
         IMPROVEMENT 1:\n\
         Target: agent | task\n\
         Name: agent_name or task_name\n\
         Field: backstory | goal | description | expected_output\n\
         Improved Text:\n\
         ```\n\
         Your improved text here (can be multiple lines)\n\
         ```\n\
         Rationale: Why this change addresses the failure\n\n\
         IMPROVEMENT 2:\n\
         ...\n\n\
         SUMMARY:\n\
         Brief summary of improvements and expected impact.\n\n\
         EXPECTED IMPACT:\n\
         Predicted improvement in pass rate and specific metrics.\n",
        summary = analysis.summary,
        agent_names = agents.names().join(", "),
        task_names = tasks.names().join(", "),
    )
}

/// Deterministic improvement catalogue keyed by detected pattern kinds.
/// Each entry appends enforcement text to a field that exists in the
/// default documents; entries whose entity is missing are dropped here so
/// apply never sees them.
pub fn fallback_improvements(
    analysis: &AnalysisReport,
    agents: &PromptDoc,
    tasks: &PromptDoc,
) -> PromptImprovements {
    let mut improvements = Vec::new();

    let mut append_edit = |doc: &PromptDoc,
                           target: ImprovementTarget,
                           name: &str,
                           field: &str,
                           addition: &str,
                           rationale: &str| {
        if !doc.contains(name) {
            return;
        }
        let original = doc.field(name, field).unwrap_or_default().to_string();
        improvements.push(PromptImprovement {
            target,
            name: name.to_string(),
            field: field.to_string(),
            improved_text: format!("{}{}", original, addition),
            original_text: original,
            rationale: rationale.to_string(),
        });
    };

    if analysis.has_pattern(PatternKind::IntentCompliance) {
        append_edit(
            agents,
            ImprovementTarget::Agent,
            "email_copywriter",
            "backstory",
            INTENT_ENFORCEMENT,
            "Add explicit selling_intent enforcement to prevent generic messaging",
        );
    }
    if analysis.has_pattern(PatternKind::PersonalizationWeak) {
        append_edit(
            agents,
            ImprovementTarget::Agent,
            "linkedin_researcher",
            "backstory",
            RESEARCH_ENFORCEMENT,
            "Increase aggressiveness in LinkedIn research",
        );
    }
    if analysis.has_pattern(PatternKind::MissingCta) {
        append_edit(
            tasks,
            ImprovementTarget::Task,
            "write_email_task",
            "description",
            CTA_ENFORCEMENT,
            "Add explicit CTA requirements with examples",
        );
    }

    PromptImprovements {
        improvements,
        summary: "Applied rule-based improvements for identified failure patterns".to_string(),
        expected_impact: "Improvements should address critical failure patterns".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    use super::*;
    use crate::analysis::FailurePattern;
    use crate::error::OutreachError;

    struct FailingCompletion;

    #[async_trait]
    impl CompletionBackend for FailingCompletion {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(OutreachError::Completion("auth failed".to_string()))
        }
    }

    struct CannedCompletion(String);

    #[async_trait]
    impl CompletionBackend for CannedCompletion {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn analysis_with(kinds: &[PatternKind]) -> AnalysisReport {
        AnalysisReport {
            total_failures: kinds.len(),
            failure_patterns: kinds
                .iter()
                .map(|&kind| FailurePattern::new(kind, 1, kinds.len()))
                .collect(),
            agent_weaknesses: BTreeMap::new(),
            task_weaknesses: BTreeMap::new(),
            priority_fixes: vec!["Fix the intent handling".to_string()],
            summary: "Intent keywords are dropped".to_string(),
        }
    }

    fn default_docs() -> (PromptDoc, PromptDoc) {
        (
            PromptDoc::parse(crate::config::DEFAULT_AGENTS_YAML).expect("default agents"),
            PromptDoc::parse(crate::config::DEFAULT_TASKS_YAML).expect("default tasks"),
        )
    }

    #[tokio::test]
    async fn fallback_catalogue_covers_known_patterns() {
        let adapter = PromptAdapter::new(Arc::new(FailingCompletion));
        let (agents, tasks) = default_docs();
        let analysis = analysis_with(&[
            PatternKind::IntentCompliance,
            PatternKind::PersonalizationWeak,
            PatternKind::MissingCta,
        ]);

        let improvements = adapter.adapt_prompts(&analysis, &agents, &tasks, &[]).await;
        assert_eq!(improvements.improvements.len(), 3);

        let copywriter = &improvements.improvements[0];
        assert_eq!(copywriter.name, "email_copywriter");
        assert!(copywriter.improved_text.contains("CRITICAL SELLING INTENT ENFORCEMENT"));
        assert!(copywriter.improved_text.starts_with(&copywriter.original_text));

        let task_edit = improvements
            .improvements
            .iter()
            .find(|i| i.target == ImprovementTarget::Task)
            .expect("task edit present");
        assert_eq!(task_edit.name, "write_email_task");
        assert!(task_edit.improved_text.contains("MANDATORY CTA"));
    }

    #[tokio::test]
    async fn fallback_skips_patterns_without_catalogue_entries() {
        let adapter = PromptAdapter::new(Arc::new(FailingCompletion));
        let (agents, tasks) = default_docs();
        let analysis = analysis_with(&[PatternKind::MessageQualityLow]);

        let improvements = adapter.adapt_prompts(&analysis, &agents, &tasks, &[]).await;
        assert!(improvements.is_empty());
    }

    #[tokio::test]
    async fn unparseable_completion_yields_noop_batch() {
        let adapter = PromptAdapter::new(Arc::new(CannedCompletion("gibberish".to_string())));
        let (agents, tasks) = default_docs();
        let analysis = analysis_with(&[PatternKind::IntentCompliance]);

        let improvements = adapter.adapt_prompts(&analysis, &agents, &tasks, &[]).await;
        assert!(improvements.is_empty());
    }

    #[tokio::test]
    async fn apply_improvements_persists_only_known_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().join("agents.yaml"), dir.path().join("tasks.yaml"));
        store.scaffold().await.expect("scaffold");

        let improvements = PromptImprovements {
            improvements: vec![
                PromptImprovement {
                    target: ImprovementTarget::Agent,
                    name: "email_copywriter".to_string(),
                    field: "backstory".to_string(),
                    original_text: String::new(),
                    improved_text: "Rewritten backstory.".to_string(),
                    rationale: "test".to_string(),
                },
                PromptImprovement {
                    target: ImprovementTarget::Agent,
                    name: "ghost_agent".to_string(),
                    field: "backstory".to_string(),
                    original_text: String::new(),
                    improved_text: "Should be skipped.".to_string(),
                    rationale: "test".to_string(),
                },
            ],
            summary: String::new(),
            expected_impact: String::new(),
        };

        let adapter = PromptAdapter::new(Arc::new(FailingCompletion));
        adapter
            .apply_improvements(&improvements, &store)
            .await
            .expect("apply succeeds");

        let agents = store.load_agents().await.expect("reload");
        assert_eq!(agents.field("email_copywriter", "backstory"), Some("Rewritten backstory."));
        assert!(!agents.contains("ghost_agent"));
    }
}
