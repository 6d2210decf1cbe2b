use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(label)
    }
}

/// Coarse pattern families derived from suite statistics. Each carries its
/// fixed blame assignment and root-cause text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    IntentCompliance,
    PersonalizationWeak,
    StructureIssues,
    MessageQualityLow,
    MissingCta,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentCompliance => "intent_compliance",
            Self::PersonalizationWeak => "personalization_weak",
            Self::StructureIssues => "structure_issues",
            Self::MessageQualityLow => "message_quality_low",
            Self::MissingCta => "missing_cta",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::IntentCompliance => Severity::Critical,
            Self::PersonalizationWeak | Self::MissingCta => Severity::High,
            Self::StructureIssues | Self::MessageQualityLow => Severity::Medium,
        }
    }

    pub fn affected_agents(&self) -> &'static str {
        match self {
            Self::IntentCompliance => "content_personalizer, email_copywriter",
            Self::PersonalizationWeak => "linkedin_researcher, prospect_researcher",
            Self::StructureIssues | Self::MessageQualityLow | Self::MissingCta => "email_copywriter",
        }
    }

    pub fn affected_tasks(&self) -> &'static str {
        match self {
            Self::IntentCompliance => "personalize_content_task, write_email_task",
            Self::PersonalizationWeak => "linkedin_research_task, research_prospect_task",
            Self::StructureIssues | Self::MessageQualityLow | Self::MissingCta => "write_email_task",
        }
    }

    pub fn root_cause(&self) -> &'static str {
        match self {
            Self::IntentCompliance => "Agents not properly using selling_intent keywords",
            Self::PersonalizationWeak => "Insufficient research or low-confidence findings",
            Self::StructureIssues => "Email structure requirements not followed",
            Self::MessageQualityLow => "Poor tone, length, or subject line quality",
            Self::MissingCta => "Missing or weak call-to-action",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One identified failure pattern with its share of the failing population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailurePattern {
    pub kind: PatternKind,
    pub frequency: usize,
    pub percentage: f64,
    pub affected_agent: String,
    pub affected_task: String,
    pub example_failures: Vec<String>,
    pub root_cause: String,
    pub severity: Severity,
}

impl FailurePattern {
    pub fn new(kind: PatternKind, frequency: usize, total_failures: usize) -> Self {
        Self {
            kind,
            frequency,
            percentage: if total_failures == 0 {
                0.0
            } else {
                frequency as f64 / total_failures as f64 * 100.0
            },
            affected_agent: kind.affected_agents().to_string(),
            affected_task: kind.affected_tasks().to_string(),
            example_failures: Vec::new(),
            root_cause: kind.root_cause().to_string(),
            severity: kind.severity(),
        }
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.example_failures = examples;
        self
    }
}

/// Full output of one analysis pass: rule-derived patterns plus the
/// (possibly fallback-derived) weakness lists and fix priorities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_failures: usize,
    pub failure_patterns: Vec<FailurePattern>,
    pub agent_weaknesses: BTreeMap<String, Vec<String>>,
    pub task_weaknesses: BTreeMap<String, Vec<String>>,
    pub priority_fixes: Vec<String>,
    pub summary: String,
}

impl AnalysisReport {
    pub fn has_pattern(&self, kind: PatternKind) -> bool {
        self.failure_patterns.iter().any(|p| p.kind == kind)
    }
}
