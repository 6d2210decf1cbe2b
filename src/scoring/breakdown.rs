use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Points awarded for one scoring dimension, with a per-criterion detail map.
/// Detail values may be negative (penalties); the dimension total is clamped
/// by the scorer before it lands here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DimensionScore {
    pub points: i32,
    pub details: BTreeMap<String, i32>,
}

impl DimensionScore {
    pub fn detail(&self, criterion: &str) -> i32 {
        self.details.get(criterion).copied().unwrap_or(0)
    }
}

/// Full quality breakdown for one evaluated email. Created fresh per
/// evaluation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: i32,
    pub structure: DimensionScore,
    pub personalization: DimensionScore,
    pub message: DimensionScore,
    pub intent: DimensionScore,
}

impl ScoreBreakdown {
    pub fn new(
        structure: DimensionScore,
        personalization: DimensionScore,
        message: DimensionScore,
        intent: DimensionScore,
    ) -> Self {
        let total = structure.points + personalization.points + message.points + intent.points;
        Self {
            total,
            structure,
            personalization,
            message,
            intent,
        }
    }
}

/// Detail-map keys shared between the scorer, the regeneration policy and the
/// test runner's critical checks.
pub mod criteria {
    pub const FIRST_NAME: &str = "first_name";
    pub const ACHIEVEMENT: &str = "achievement";
    pub const INDUSTRY_CONTEXT: &str = "industry_context";
    pub const VALUE_PROPOSITION: &str = "value_proposition";
    pub const CALL_TO_ACTION: &str = "call_to_action";

    pub const LINKEDIN_CONFIDENCE: &str = "linkedin_confidence";
    pub const COMPANY_RESEARCH: &str = "company_research";
    pub const ROLE_RELEVANCE: &str = "role_relevance";

    pub const TONE_FLOW: &str = "tone_flow";
    pub const LENGTH_CRISPNESS: &str = "length_crispness";
    pub const SUBJECT_LINE: &str = "subject_line";

    pub const KEYWORD_COVERAGE: &str = "keyword_coverage";
    pub const USE_CASE_FOCUS: &str = "use_case_focus";
    pub const GENERIC_PENALTY: &str = "generic_penalty";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_dimensions() {
        let dim = |points| DimensionScore {
            points,
            details: BTreeMap::new(),
        };
        let breakdown = ScoreBreakdown::new(dim(30), dim(20), dim(18), dim(15));
        assert_eq!(breakdown.total, 83);
    }

    #[test]
    fn missing_detail_defaults_to_zero() {
        let dim = DimensionScore::default();
        assert_eq!(dim.detail("call_to_action"), 0);
    }
}
