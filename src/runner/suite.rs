use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::generation::GenerationPipeline;
use crate::prospect::ProspectInput;
use crate::scoring::QualityScorer;

use super::critical::critical_failures;
use super::types::{FailureKind, TestResult, TestSuiteResults};

/// Failed results whose sub-scores sit below 80% of the dimension ceiling
/// are bucketed into the matching pattern.
const STRUCTURE_BAR: i32 = 28;
const PERSONALIZATION_BAR: i32 = 20;
const MESSAGE_BAR: i32 = 20;
const INTENT_BAR: i32 = 12;

/// Drives end-to-end generations through the pipeline and scores the
/// output. Prospects run one at a time, in order; a failing prospect is
/// recorded and the suite moves on.
pub struct SuiteRunner {
    pipeline: Arc<dyn GenerationPipeline>,
    scorer: QualityScorer,
    quality_threshold: i32,
}

impl SuiteRunner {
    pub fn new(pipeline: Arc<dyn GenerationPipeline>, quality_threshold: i32) -> Self {
        Self {
            pipeline,
            scorer: QualityScorer::new(),
            quality_threshold,
        }
    }

    pub fn quality_threshold(&self) -> i32 {
        self.quality_threshold
    }

    /// Run one prospect through the pipeline and evaluate the output.
    /// Pipeline errors and timeouts become failed results, never errors.
    pub async fn run_single_test(&self, prospect: &ProspectInput) -> TestResult {
        let started = Instant::now();

        let output = match self.pipeline.generate(prospect).await {
            Ok(output) => output,
            Err(e) => {
                warn!(prospect = %prospect.display_name(), error = %e, "Generation failed");
                return TestResult::execution_failure(
                    prospect.clone(),
                    e.to_string(),
                    started.elapsed().as_secs_f64(),
                );
            }
        };

        let research = output.inferred_research();
        let score = self
            .scorer
            .score(&output.composed_email(), &research, prospect);
        let criticals = critical_failures(&output, prospect, &score);
        let passed = criticals.is_empty() && score.total >= self.quality_threshold;

        TestResult {
            prospect: prospect.clone(),
            passed,
            score: Some(score),
            output: Some(output),
            critical_failures: criticals,
            duration_secs: started.elapsed().as_secs_f64(),
            error: None,
        }
    }

    /// Run every prospect and aggregate. Order-preserving and strictly
    /// sequential; the target rate only affects reporting, not execution.
    pub async fn run_test_suite(
        &self,
        prospects: &[ProspectInput],
        target_pass_rate: f64,
    ) -> TestSuiteResults {
        info!(
            prospects = prospects.len(),
            target = target_pass_rate,
            threshold = self.quality_threshold,
            "Running test suite"
        );

        let mut results = Vec::with_capacity(prospects.len());
        for (i, prospect) in prospects.iter().enumerate() {
            let result = self.run_single_test(prospect).await;
            info!(
                test = i + 1,
                total = prospects.len(),
                prospect = %prospect.display_name(),
                passed = result.passed,
                score = ?result.total_score(),
                "Test finished"
            );
            results.push(result);
        }

        let passed_tests = results.iter().filter(|r| r.passed).count();
        let failed_tests = results.len() - passed_tests;
        let pass_rate = if results.is_empty() {
            0.0
        } else {
            passed_tests as f64 / results.len() as f64
        };

        let scored: Vec<i32> = results.iter().filter_map(TestResult::total_score).collect();
        let avg_quality_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<i32>() as f64 / scored.len() as f64
        };

        let failure_patterns = classify_failure_patterns(&results);

        if pass_rate < target_pass_rate {
            info!(
                pass_rate,
                shortfall = target_pass_rate - pass_rate,
                "Suite below target"
            );
        }

        TestSuiteResults {
            total_tests: results.len(),
            passed_tests,
            failed_tests,
            pass_rate,
            avg_quality_score,
            results,
            failure_patterns,
            timestamp: Utc::now(),
        }
    }
}

/// Bucket every failed result into named patterns by re-applying the
/// sub-score bars and scanning the critical-failure entries.
pub fn classify_failure_patterns(results: &[TestResult]) -> BTreeMap<String, usize> {
    let mut patterns: BTreeMap<String, usize> = BTreeMap::new();
    let mut bump = |kind: FailureKind| {
        *patterns.entry(kind.as_str().to_string()).or_insert(0) += 1;
    };

    for result in results.iter().filter(|r| !r.passed) {
        match &result.score {
            None => bump(FailureKind::ExecutionFailure),
            Some(score) => {
                if score.intent.points < INTENT_BAR {
                    bump(FailureKind::IntentComplianceLow);
                }
                if score.structure.points < STRUCTURE_BAR {
                    bump(FailureKind::StructureIssues);
                }
                if score.personalization.points < PERSONALIZATION_BAR {
                    bump(FailureKind::PersonalizationWeak);
                }
                if score.message.points < MESSAGE_BAR {
                    bump(FailureKind::MessageQualityLow);
                }
            }
        }

        for failure in &result.critical_failures {
            if failure.contains("Intent compliance") {
                bump(FailureKind::CriticalIntentFailure);
            } else if failure.contains("First name") {
                bump(FailureKind::CapitalizationError);
            } else if failure.contains("call-to-action") {
                bump(FailureKind::MissingCta);
            } else if failure.contains("Generic messaging") {
                bump(FailureKind::GenericMessaging);
            }
        }
    }

    patterns
}
