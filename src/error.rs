use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutreachError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt document error: {0}")]
    PromptStore(String),

    #[error("Unknown {target} '{name}' in prompt document")]
    PromptTarget { target: String, name: String },

    #[error("Generation pipeline failed: {0}")]
    Generation(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Completion backend failed: {0}")]
    Completion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl OutreachError {
    /// Errors that abort the whole run. Generation and completion failures
    /// are recovered locally (failed test result, rule-based fallback) and
    /// never surface through this path.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::PromptStore(_) | Self::Io(_) | Self::Yaml(_) | Self::Toml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OutreachError>;
