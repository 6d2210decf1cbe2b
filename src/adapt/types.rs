use serde::{Deserialize, Serialize};

/// Which prompt document an improvement edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementTarget {
    Agent,
    Task,
}

impl ImprovementTarget {
    /// Lenient parse of the collaborator's `Target:` value.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "agent" => Some(Self::Agent),
            "task" => Some(Self::Task),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImprovementTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Agent => "agent",
            Self::Task => "task",
        })
    }
}

/// One proposed edit: replace `field` of the named entity with
/// `improved_text`. The original text rides along for audit/diff output
/// only; applying an improvement never consults it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptImprovement {
    pub target: ImprovementTarget,
    pub name: String,
    pub field: String,
    pub original_text: String,
    pub improved_text: String,
    pub rationale: String,
}

/// A batch of improvements from one adaptation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptImprovements {
    pub improvements: Vec<PromptImprovement>,
    pub summary: String,
    pub expected_impact: String,
}

impl PromptImprovements {
    pub fn is_empty(&self) -> bool {
        self.improvements.is_empty()
    }
}
