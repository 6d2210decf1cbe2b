use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an improvement cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Pass rate reached the target.
    TargetReached,
    /// No strictly better pass rate for the configured number of iterations.
    EarlyStop,
    /// Iteration budget exhausted below target.
    MaxIterations,
    /// Single suite run without adaptation.
    TestOnly,
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::TargetReached => "target_reached",
            Self::EarlyStop => "early_stop",
            Self::MaxIterations => "max_iterations",
            Self::TestOnly => "test_only",
        })
    }
}

/// Everything recorded about one iteration, persisted as one JSON document
/// in the run's log directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationSnapshot {
    pub iteration: u32,
    pub pass_rate: f64,
    pub avg_quality: f64,
    pub passed: usize,
    pub failed: usize,
    pub failure_patterns: BTreeMap<String, usize>,
    pub timestamp: DateTime<Utc>,
    /// Present only when the iteration went on to analyze and adapt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_fixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvements_applied: Option<usize>,
}

/// Final outcome of a whole improvement cycle, written as the report
/// artifact and mirrored to the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementReport {
    pub success: bool,
    pub outcome: CycleOutcome,
    pub iterations: u32,
    pub target_pass_rate: f64,
    pub initial_pass_rate: f64,
    pub final_pass_rate: f64,
    /// final minus initial pass rate.
    pub improvement: f64,
    pub final_avg_quality: f64,
    pub total_tests_run: usize,
    pub timestamp: DateTime<Utc>,
    pub iteration_history: Vec<IterationSnapshot>,
    pub message: String,
}
