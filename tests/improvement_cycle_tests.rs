use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use outreach_pilot::completion::CompletionBackend;
use outreach_pilot::config::{OutreachConfig, ProjectPaths, PromptStore};
use outreach_pilot::error::{OutreachError, Result};
use outreach_pilot::generation::GenerationPipeline;
use outreach_pilot::improve::{CycleOutcome, ImprovementOrchestrator};
use outreach_pilot::prospect::{GenerationResult, ProspectInput};

/// Pipeline that writes a strong, fully personalized email for every
/// prospect, echoing the selling intent verbatim.
struct StrongPipeline;

#[async_trait]
impl GenerationPipeline for StrongPipeline {
    async fn generate(&self, prospect: &ProspectInput) -> Result<GenerationResult> {
        let body = format!(
            "Hi {first},\n\n\
             Congratulations on the recent expansion - impressive work. We \
             recently helped Rohlik reach an 80% reduction in manual data \
             processing.\n\n\
             Given your focus on {intent}, I believe we could help you \
             achieve similar results at {company} and optimize costs.\n\n\
             When's the best time this week for a 15-minute call to discuss \
             {intent}?\n\n\
             Best regards,\nSarah",
            first = prospect.first_name,
            intent = prospect.selling_intent,
            company = prospect.company,
        );
        Ok(GenerationResult {
            subject_line: format!("{}, cut costs at {}", prospect.first_name, prospect.company),
            email_body: body,
            follow_up_notes: "Follow up in a week.".to_string(),
            validated_linkedin_profile: Some("https://linkedin.com/in/test".to_string()),
            ..GenerationResult::default()
        })
    }
}

/// Pipeline that never mentions the prospect or the intent.
struct WeakPipeline;

#[async_trait]
impl GenerationPipeline for WeakPipeline {
    async fn generate(&self, _prospect: &ProspectInput) -> Result<GenerationResult> {
        Ok(GenerationResult {
            subject_line: "Quarterly newsletter".to_string(),
            email_body: "Dear reader, here is some information about us.".to_string(),
            ..GenerationResult::default()
        })
    }
}

/// Completion backend that is always down, forcing every component onto its
/// deterministic fallback path.
struct OfflineCompletion;

#[async_trait]
impl CompletionBackend for OfflineCompletion {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Err(OutreachError::Completion("backend offline".to_string()))
    }
}

async fn initialized_project(dir: &TempDir) -> ProjectPaths {
    let paths = ProjectPaths::new(dir.path());
    paths.ensure_dirs().await.expect("dirs created");
    PromptStore::new(&paths.agents_path, &paths.tasks_path)
        .scaffold()
        .await
        .expect("prompts scaffolded");
    paths
}

fn config(max_iterations: u32, target: f64, stagnation_limit: u32) -> OutreachConfig {
    let mut config = OutreachConfig::default();
    config.improvement.max_iterations = max_iterations;
    config.improvement.target_pass_rate = target;
    config.improvement.num_prospects = 5;
    config.improvement.stagnation_limit = stagnation_limit;
    config.generator.seed = Some(1234);
    config
}

#[tokio::test]
async fn cycle_reaches_a_reachable_target_on_the_first_iteration() {
    let dir = TempDir::new().expect("tempdir");
    let paths = initialized_project(&dir).await;

    let mut orchestrator = ImprovementOrchestrator::new(
        config(10, 0.0, 3),
        paths.clone(),
        Arc::new(StrongPipeline),
        Arc::new(OfflineCompletion),
    );

    let report = orchestrator.run_cycle().await.expect("cycle runs");
    assert!(report.success);
    assert_eq!(report.outcome, CycleOutcome::TargetReached);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.iteration_history.len(), 1);
    assert!(paths.report_path.exists());
}

#[tokio::test]
async fn flat_pass_rate_stops_early_after_the_stagnation_limit() {
    let dir = TempDir::new().expect("tempdir");
    let paths = initialized_project(&dir).await;

    let mut orchestrator = ImprovementOrchestrator::new(
        config(10, 0.95, 3),
        paths.clone(),
        Arc::new(WeakPipeline),
        Arc::new(OfflineCompletion),
    );

    let report = orchestrator.run_cycle().await.expect("cycle runs");
    assert!(!report.success);
    assert_eq!(report.outcome, CycleOutcome::EarlyStop);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.iteration_history.len(), 3);
    assert!((report.final_pass_rate - 0.0).abs() < 1e-9);
    assert!(report.message.contains("Early stopping"));

    // Every iteration wrote its log into this run's directory.
    let run_dir = paths.logs_dir.join(format!("run-{}", orchestrator.run_id()));
    for i in 1..=3 {
        assert!(run_dir.join(format!("iteration_{:03}.json", i)).exists());
    }
}

#[tokio::test]
async fn fallback_improvements_mutate_the_prompt_documents() {
    let dir = TempDir::new().expect("tempdir");
    let paths = initialized_project(&dir).await;
    let store = PromptStore::new(&paths.agents_path, &paths.tasks_path);

    let before = store.load_agents().await.expect("load before");
    let original_backstory = before
        .field("email_copywriter", "backstory")
        .expect("default backstory")
        .to_string();

    let mut orchestrator = ImprovementOrchestrator::new(
        config(2, 0.95, 5),
        paths.clone(),
        Arc::new(WeakPipeline),
        Arc::new(OfflineCompletion),
    );
    let report = orchestrator.run_cycle().await.expect("cycle runs");
    assert_eq!(report.outcome, CycleOutcome::MaxIterations);

    // Weak emails ignore the selling intent, so the intent-compliance
    // fallback appends enforcement text to the copywriter persona.
    let after = store.load_agents().await.expect("load after");
    let backstory = after
        .field("email_copywriter", "backstory")
        .expect("backstory still present");
    assert!(backstory.starts_with(&original_backstory));
    assert!(backstory.contains("CRITICAL SELLING INTENT ENFORCEMENT"));
}

#[tokio::test]
async fn cycle_backs_up_prompts_before_mutating() {
    let dir = TempDir::new().expect("tempdir");
    let paths = initialized_project(&dir).await;

    let mut orchestrator = ImprovementOrchestrator::new(
        config(1, 0.95, 3),
        paths.clone(),
        Arc::new(WeakPipeline),
        Arc::new(OfflineCompletion),
    );
    orchestrator.run_cycle().await.expect("cycle runs");

    let mut backups = std::fs::read_dir(&paths.backups_dir)
        .expect("backups dir exists")
        .filter_map(|e| e.ok())
        .collect::<Vec<_>>();
    assert_eq!(backups.len(), 1);
    let backup_dir = backups.pop().expect("one backup").path();
    assert!(backup_dir.join("agents.yaml").exists());
    assert!(backup_dir.join("tasks.yaml").exists());
}

#[tokio::test]
async fn test_only_reports_without_touching_prompts() {
    let dir = TempDir::new().expect("tempdir");
    let paths = initialized_project(&dir).await;
    let store = PromptStore::new(&paths.agents_path, &paths.tasks_path);
    let before = store
        .load_agents()
        .await
        .expect("load")
        .to_yaml()
        .expect("yaml");

    let mut orchestrator = ImprovementOrchestrator::new(
        config(10, 0.95, 3),
        paths.clone(),
        Arc::new(WeakPipeline),
        Arc::new(OfflineCompletion),
    );
    let report = orchestrator.test_only().await.expect("test-only runs");

    assert!(!report.success);
    assert_eq!(report.outcome, CycleOutcome::TestOnly);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.total_tests_run, 5);
    assert!(report.message.contains("no improvements applied"));

    let after = store
        .load_agents()
        .await
        .expect("load")
        .to_yaml()
        .expect("yaml");
    assert_eq!(before, after);
}

#[tokio::test]
async fn missing_prompt_documents_are_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    paths.ensure_dirs().await.expect("dirs created");
    // No scaffold: the documents the cycle must mutate do not exist.

    let mut orchestrator = ImprovementOrchestrator::new(
        config(3, 0.95, 3),
        paths,
        Arc::new(WeakPipeline),
        Arc::new(OfflineCompletion),
    );
    let err = orchestrator.run_cycle().await.unwrap_err();
    assert!(err.is_fatal());
}
