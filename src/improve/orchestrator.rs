use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapt::PromptAdapter;
use crate::analysis::FailureAnalyzer;
use crate::completion::CompletionBackend;
use crate::config::{OutreachConfig, ProjectPaths, PromptStore};
use crate::error::Result;
use crate::generation::GenerationPipeline;
use crate::prospect::ProspectGenerator;
use crate::runner::{SuiteRunner, TestResult, TestSuiteResults};

use super::report::{CycleOutcome, ImprovementReport, IterationSnapshot};

/// Failing examples handed to the prompt adapter each iteration.
const ADAPT_EXAMPLE_LIMIT: usize = 5;

/// Tracks the running best pass rate and how long it has been since a
/// strictly better one was observed.
#[derive(Debug, Clone, Copy)]
pub struct StagnationTracker {
    best: f64,
    stale: u32,
    limit: u32,
}

impl StagnationTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            best: 0.0,
            stale: 0,
            limit,
        }
    }

    /// Record one iteration's pass rate. Returns true when the cycle should
    /// stop: the rate has not strictly improved for `limit` consecutive
    /// iterations.
    pub fn observe(&mut self, pass_rate: f64) -> bool {
        if pass_rate <= self.best {
            self.stale += 1;
        } else {
            self.best = pass_rate;
            self.stale = 0;
        }
        self.stale >= self.limit
    }

    pub fn iterations_since_improvement(&self) -> u32 {
        self.stale
    }
}

/// Drives the full improve loop: generate prospects, run the suite, analyze
/// failures, adapt prompts, repeat until the target pass rate, a stagnation
/// stop, or the iteration budget. Owns all cross-iteration state.
pub struct ImprovementOrchestrator {
    config: OutreachConfig,
    paths: ProjectPaths,
    store: PromptStore,
    generator: ProspectGenerator,
    runner: SuiteRunner,
    analyzer: FailureAnalyzer,
    adapter: PromptAdapter,
    run_id: String,
}

impl ImprovementOrchestrator {
    pub fn new(
        config: OutreachConfig,
        paths: ProjectPaths,
        pipeline: Arc<dyn GenerationPipeline>,
        completion: Arc<dyn CompletionBackend>,
    ) -> Self {
        let store = PromptStore::new(&paths.agents_path, &paths.tasks_path);
        let generator = ProspectGenerator::new(config.generator.seed);
        let runner = SuiteRunner::new(pipeline, config.runner.quality_threshold);
        let analyzer = FailureAnalyzer::new(completion.clone());
        let adapter = PromptAdapter::new(completion);

        Self {
            config,
            paths,
            store,
            generator,
            runner,
            analyzer,
            adapter,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run the full improvement cycle. Only configuration and prompt-store
    /// I/O can error out of here; generation and completion failures are
    /// absorbed by the components.
    pub async fn run_cycle(&mut self) -> Result<ImprovementReport> {
        let improvement = self.config.improvement.clone();
        info!(
            max_iterations = improvement.max_iterations,
            target = improvement.target_pass_rate,
            prospects = improvement.num_prospects,
            run_id = %self.run_id,
            "Starting improvement cycle"
        );

        self.paths.ensure_dirs().await?;

        // Fail fast when the documents the cycle mutates are absent.
        self.store.load_agents().await?;
        self.store.load_tasks().await?;

        if improvement.backup_prompts {
            self.store.backup(&self.paths.backups_dir).await?;
        }

        let mut history: Vec<IterationSnapshot> = Vec::new();
        let mut stagnation = StagnationTracker::new(improvement.stagnation_limit);
        let mut initial_pass_rate: Option<f64> = None;
        let mut total_tests = 0usize;
        let mut last_suite: Option<(f64, f64)> = None;

        for iteration in 1..=improvement.max_iterations {
            info!(iteration, max = improvement.max_iterations, "Starting iteration");

            let prospects = self.generator.generate(improvement.num_prospects);
            let suite = self
                .runner
                .run_test_suite(&prospects, improvement.target_pass_rate)
                .await;

            total_tests += suite.total_tests;
            initial_pass_rate.get_or_insert(suite.pass_rate);
            last_suite = Some((suite.pass_rate, suite.avg_quality_score));

            let mut snapshot = snapshot_of(iteration, &suite);

            if suite.pass_rate >= improvement.target_pass_rate {
                info!(pass_rate = suite.pass_rate, "Target pass rate reached");
                history.push(snapshot.clone());
                self.save_iteration_log(&snapshot).await?;
                return self
                    .finish(
                        CycleOutcome::TargetReached,
                        iteration,
                        initial_pass_rate.unwrap_or_default(),
                        suite.pass_rate,
                        suite.avg_quality_score,
                        total_tests,
                        history,
                        format!(
                            "Successfully achieved {:.1}% pass rate in {} iterations",
                            suite.pass_rate * 100.0,
                            iteration
                        ),
                    )
                    .await;
            }

            if stagnation.observe(suite.pass_rate) {
                warn!(
                    stale = stagnation.iterations_since_improvement(),
                    "No improvement, stopping early"
                );
                history.push(snapshot.clone());
                self.save_iteration_log(&snapshot).await?;
                return self
                    .finish(
                        CycleOutcome::EarlyStop,
                        iteration,
                        initial_pass_rate.unwrap_or_default(),
                        suite.pass_rate,
                        suite.avg_quality_score,
                        total_tests,
                        history,
                        format!(
                            "Early stopping: No improvement for {} iterations",
                            improvement.stagnation_limit
                        ),
                    )
                    .await;
            }

            // Analyze and adapt. Document I/O stays fatal, collaborator
            // failures are handled inside the components.
            let (agents_text, tasks_text) = self.store.raw_documents().await?;
            let analysis = self
                .analyzer
                .analyze_failures(&suite, &agents_text, &tasks_text)
                .await;

            let agents = self.store.load_agents().await?;
            let tasks = self.store.load_tasks().await?;
            let failures: Vec<&TestResult> =
                suite.failures().take(ADAPT_EXAMPLE_LIMIT).collect();
            let improvements = self
                .adapter
                .adapt_prompts(&analysis, &agents, &tasks, &failures)
                .await;
            self.adapter.apply_improvements(&improvements, &self.store).await?;

            snapshot.analysis_summary = Some(analysis.summary.clone());
            snapshot.priority_fixes = analysis.priority_fixes.clone();
            snapshot.improvements_applied = Some(improvements.improvements.len());

            self.save_iteration_log(&snapshot).await?;
            history.push(snapshot);

            info!(
                iteration,
                pass_rate = suite.pass_rate,
                since_improvement = stagnation.iterations_since_improvement(),
                "Iteration complete"
            );
        }

        let (final_rate, final_quality) = last_suite.unwrap_or_default();
        self.finish(
            CycleOutcome::MaxIterations,
            self.config.improvement.max_iterations,
            initial_pass_rate.unwrap_or_default(),
            final_rate,
            final_quality,
            total_tests,
            history,
            format!(
                "Max iterations ({}) reached without achieving target",
                self.config.improvement.max_iterations
            ),
        )
        .await
    }

    /// Run one suite without touching the prompt documents.
    pub async fn test_only(&mut self) -> Result<ImprovementReport> {
        let improvement = self.config.improvement.clone();
        info!(prospects = improvement.num_prospects, "Test-only run");

        self.paths.ensure_dirs().await?;

        let prospects = self.generator.generate(improvement.num_prospects);
        let suite = self
            .runner
            .run_test_suite(&prospects, improvement.target_pass_rate)
            .await;

        let snapshot = snapshot_of(1, &suite);
        self.save_iteration_log(&snapshot).await?;

        let report = ImprovementReport {
            success: suite.pass_rate >= improvement.target_pass_rate,
            outcome: CycleOutcome::TestOnly,
            iterations: 1,
            target_pass_rate: improvement.target_pass_rate,
            initial_pass_rate: suite.pass_rate,
            final_pass_rate: suite.pass_rate,
            improvement: 0.0,
            final_avg_quality: suite.avg_quality_score,
            total_tests_run: suite.total_tests,
            timestamp: Utc::now(),
            iteration_history: vec![snapshot],
            message: "Test-only mode - no improvements applied".to_string(),
        };
        self.persist_report(&report).await?;
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        outcome: CycleOutcome,
        iterations: u32,
        initial_pass_rate: f64,
        final_pass_rate: f64,
        final_avg_quality: f64,
        total_tests_run: usize,
        iteration_history: Vec<IterationSnapshot>,
        message: String,
    ) -> Result<ImprovementReport> {
        let report = ImprovementReport {
            success: outcome == CycleOutcome::TargetReached,
            outcome,
            iterations,
            target_pass_rate: self.config.improvement.target_pass_rate,
            initial_pass_rate,
            final_pass_rate,
            improvement: final_pass_rate - initial_pass_rate,
            final_avg_quality,
            total_tests_run,
            timestamp: Utc::now(),
            iteration_history,
            message,
        };
        self.persist_report(&report).await?;
        Ok(report)
    }

    async fn save_iteration_log(&self, snapshot: &IterationSnapshot) -> Result<()> {
        let dir = self.run_log_dir();
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("iteration_{:03}.json", snapshot.iteration));
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, content).await?;
        info!(path = %path.display(), "Saved iteration log");
        Ok(())
    }

    async fn persist_report(&self, report: &ImprovementReport) -> Result<()> {
        let content = serde_json::to_string_pretty(report)?;
        fs::write(&self.paths.report_path, content).await?;
        info!(path = %self.paths.report_path.display(), "Saved improvement report");
        Ok(())
    }

    fn run_log_dir(&self) -> PathBuf {
        self.paths.logs_dir.join(format!("run-{}", self.run_id))
    }
}

fn snapshot_of(iteration: u32, suite: &TestSuiteResults) -> IterationSnapshot {
    IterationSnapshot {
        iteration,
        pass_rate: suite.pass_rate,
        avg_quality: suite.avg_quality_score,
        passed: suite.passed_tests,
        failed: suite.failed_tests,
        failure_patterns: suite.failure_patterns.clone(),
        timestamp: suite.timestamp,
        analysis_summary: None,
        priority_fixes: Vec::new(),
        improvements_applied: None,
    }
}
