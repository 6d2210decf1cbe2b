use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{OutreachError, Result};

pub const CONFIG_FILE: &str = "config.toml";
pub const PILOT_DIR: &str = ".outreach-pilot";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutreachConfig {
    pub improvement: ImprovementConfig,
    pub runner: RunnerConfig,
    pub generation: GenerationConfig,
    pub completion: CompletionConfig,
    pub generator: GeneratorConfig,
}

impl OutreachConfig {
    pub async fn load(pilot_dir: &Path) -> Result<Self> {
        let config_path = pilot_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, pilot_dir: &Path) -> Result<()> {
        self.validate()?;
        let config_path = pilot_dir.join(CONFIG_FILE);
        let content =
            toml::to_string_pretty(self).map_err(|e| OutreachError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate all sections at once, reporting every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.improvement.max_iterations == 0 {
            errors.push("improvement.max_iterations must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.improvement.target_pass_rate) {
            errors.push("improvement.target_pass_rate must be between 0.0 and 1.0");
        }
        if self.improvement.num_prospects == 0 {
            errors.push("improvement.num_prospects must be greater than 0");
        }
        if self.improvement.stagnation_limit == 0 {
            errors.push("improvement.stagnation_limit must be greater than 0");
        }

        if !(0..=100).contains(&self.runner.quality_threshold) {
            errors.push("runner.quality_threshold must be between 0 and 100");
        }

        if self.generation.command.is_empty() {
            errors.push("generation.command must not be empty");
        }
        if self.generation.timeout_secs == 0 {
            errors.push("generation.timeout_secs must be greater than 0");
        }

        if self.completion.command.is_empty() {
            errors.push("completion.command must not be empty");
        }
        if self.completion.timeout_secs == 0 {
            errors.push("completion.timeout_secs must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OutreachError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovementConfig {
    pub max_iterations: u32,
    pub target_pass_rate: f64,
    /// Prospects generated and tested per iteration.
    pub num_prospects: usize,
    /// Consecutive non-improving iterations before the cycle gives up.
    pub stagnation_limit: u32,
    /// Back up the prompt documents before the first mutation of a run.
    pub backup_prompts: bool,
}

impl Default for ImprovementConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            target_pass_rate: 0.95,
            num_prospects: 20,
            stagnation_limit: 3,
            backup_prompts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Minimum total score for a pass (critical failures trump it).
    pub quality_threshold: i32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// External crew command invoked once per prospect.
    pub command: String,
    pub args: Vec<String>,
    /// Bound on one generation; crews do research, so this is minutes-scale.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            command: "outreach-crew".to_string(),
            args: vec!["kickoff".to_string()],
            timeout_secs: 180,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Completion CLI used for failure analysis and prompt adaptation.
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["-p".to_string()],
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fixed seed for reproducible prospect batches; random when unset.
    pub seed: Option<u64>,
}

/// Resolved filesystem layout for one project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub pilot_dir: PathBuf,
    pub agents_path: PathBuf,
    pub tasks_path: PathBuf,
    pub logs_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub report_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let pilot_dir = root.join(PILOT_DIR);
        Self {
            agents_path: pilot_dir.join("prompts").join("agents.yaml"),
            tasks_path: pilot_dir.join("prompts").join("tasks.yaml"),
            logs_dir: pilot_dir.join("improvement_logs"),
            backups_dir: pilot_dir.join("prompt_backups"),
            report_path: pilot_dir.join("improvement_report.json"),
            pilot_dir,
            root,
        }
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.pilot_dir, &self.logs_dir, &self.backups_dir] {
            fs::create_dir_all(dir).await?;
        }
        if let Some(prompts_dir) = self.agents_path.parent() {
            fs::create_dir_all(prompts_dir).await?;
        }
        Ok(())
    }
}
