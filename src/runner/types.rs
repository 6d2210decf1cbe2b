use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prospect::{GenerationResult, ProspectInput};
use crate::scoring::ScoreBreakdown;

/// Named buckets failed tests are grouped into for trend reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    IntentComplianceLow,
    StructureIssues,
    PersonalizationWeak,
    MessageQualityLow,
    ExecutionFailure,
    CapitalizationError,
    MissingCta,
    GenericMessaging,
    CriticalIntentFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentComplianceLow => "intent_compliance_low",
            Self::StructureIssues => "structure_issues",
            Self::PersonalizationWeak => "personalization_weak",
            Self::MessageQualityLow => "message_quality_low",
            Self::ExecutionFailure => "execution_failure",
            Self::CapitalizationError => "capitalization_error",
            Self::MissingCta => "missing_cta",
            Self::GenericMessaging => "generic_messaging",
            Self::CriticalIntentFailure => "critical_intent_failure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prospect's test: the input, what the pipeline produced (if anything),
/// the score, and the critical failures that force a fail regardless of
/// score. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub prospect: ProspectInput,
    pub passed: bool,
    pub score: Option<ScoreBreakdown>,
    pub output: Option<GenerationResult>,
    pub critical_failures: Vec<String>,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    pub fn execution_failure(prospect: ProspectInput, error: String, duration_secs: f64) -> Self {
        Self {
            prospect,
            passed: false,
            score: None,
            output: None,
            critical_failures: vec![format!("Execution failed: {}", error)],
            duration_secs,
            error: Some(error),
        }
    }

    pub fn total_score(&self) -> Option<i32> {
        self.score.as_ref().map(|s| s.total)
    }

    /// Short description used as an example line in analysis reports.
    pub fn describe(&self) -> String {
        let mut line = format!(
            "Prospect: {} at {}",
            self.prospect.display_name(),
            self.prospect.company
        );
        if let Some(total) = self.total_score() {
            line.push_str(&format!(" | Score: {}/100", total));
        }
        if !self.critical_failures.is_empty() {
            line.push_str(&format!(
                " | Issues: {}",
                self.critical_failures
                    .iter()
                    .take(2)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        line
    }
}

/// Aggregate view over one suite run. Derived from the results, never
/// persisted past the iteration snapshot built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResults {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub pass_rate: f64,
    pub avg_quality_score: f64,
    pub results: Vec<TestResult>,
    pub failure_patterns: BTreeMap<String, usize>,
    pub timestamp: DateTime<Utc>,
}

impl TestSuiteResults {
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn num_failures(&self) -> usize {
        self.failed_tests
    }

    /// How far below the target this run landed; zero when met.
    pub fn shortfall(&self, target_pass_rate: f64) -> f64 {
        (target_pass_rate - self.pass_rate).max(0.0)
    }
}
