//! Configuration: the tool's own TOML settings, the resolved project
//! layout, and the YAML prompt-document store the improvement cycle mutates.

mod prompts;
mod settings;

pub use prompts::{PromptDoc, PromptStore, DEFAULT_AGENTS_YAML, DEFAULT_TASKS_YAML};
pub use settings::{
    CompletionConfig, GenerationConfig, GeneratorConfig, ImprovementConfig, OutreachConfig,
    ProjectPaths, RunnerConfig, CONFIG_FILE, PILOT_DIR,
};
