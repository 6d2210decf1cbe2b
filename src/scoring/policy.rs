use std::collections::BTreeMap;

use crate::prospect::{ProspectInput, ProspectResearch};

use super::breakdown::{criteria, ScoreBreakdown};
use super::rules;
use super::scorer::QualityScorer;

/// Decides whether a scored email is worth keeping and, when it is not,
/// which issues the next attempt should address.
#[derive(Debug, Clone, Copy)]
pub struct RegenerationPolicy {
    /// Below this total the email is discarded outright.
    pub low_threshold: i32,
    /// At or above this total the email is accepted.
    pub accept_threshold: i32,
}

impl Default for RegenerationPolicy {
    fn default() -> Self {
        Self {
            low_threshold: 70,
            accept_threshold: 85,
        }
    }
}

impl RegenerationPolicy {
    pub fn should_regenerate(&self, score: &ScoreBreakdown) -> (bool, &'static str) {
        if score.total < self.low_threshold {
            (true, "Low quality score - immediate regeneration required")
        } else if score.total < self.accept_threshold {
            (true, "Medium quality score - single optimization attempt")
        } else {
            (false, "Quality score acceptable")
        }
    }

    /// Issue-tagged hints derived from the breakdown. Dimension hints fire
    /// below 80% of the dimension ceiling; detail hints fire off individual
    /// criteria.
    pub fn improvement_suggestions(&self, score: &ScoreBreakdown) -> BTreeMap<String, String> {
        let mut suggestions = BTreeMap::new();
        let mut suggest = |tag: &str, text: &str| {
            suggestions.insert(tag.to_string(), text.to_string());
        };

        if score.structure.points < dimension_bar(rules::STRUCTURE_MAX) {
            suggest(
                "structure",
                "Improve email structure - ensure proper greeting, achievement recognition, \
                 industry context, value proposition, and CTA",
            );
        }
        if score.personalization.points < dimension_bar(rules::PERSONALIZATION_MAX) {
            suggest(
                "personalization",
                "Enhance personalization - improve LinkedIn research and company-specific context",
            );
        }
        if score.message.points < dimension_bar(rules::MESSAGE_MAX) {
            suggest(
                "message",
                "Improve message quality - work on tone, flow, length and subject line",
            );
        }

        if score.structure.detail(criteria::FIRST_NAME) == 0 {
            suggest(
                "first_name",
                "Ensure first name is capitalized and properly formatted in greeting",
            );
        }
        if score.structure.detail(criteria::ACHIEVEMENT) < 7 {
            suggest(
                "achievement",
                "Add specific achievement recognition or improve generic pleasing message",
            );
        }
        if score.structure.detail(criteria::INDUSTRY_CONTEXT) < 8 {
            suggest(
                "industry_context",
                "Include a reference customer use case from a similar industry",
            );
        }
        if score.structure.detail(criteria::CALL_TO_ACTION) == 0 {
            suggest("cta", "Add clear meeting request call-to-action");
        }

        suggestions
    }
}

/// Dimension-level suggestion bar: 80% of the ceiling.
fn dimension_bar(max: i32) -> i32 {
    max * 4 / 5
}

/// Outcome of a bounded score-and-review loop over one email.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub score: ScoreBreakdown,
    pub accepted: bool,
    pub attempts: u32,
    /// Hints for the next generation attempt; empty when accepted.
    pub hints: Vec<String>,
}

/// Score an email and consult the policy up to `max_attempts` times,
/// collecting improvement hints for the caller to feed back into the
/// generation pipeline. The scorer is deterministic, so repeated attempts
/// only matter when the caller regenerates the email between them; this
/// helper exists so callers share one accept/hint decision path.
pub fn review_email(
    policy: &RegenerationPolicy,
    email: &str,
    research: &ProspectResearch,
    input: &ProspectInput,
    max_attempts: u32,
) -> ReviewOutcome {
    let scorer = QualityScorer::new();
    let score = scorer.score(email, research, input);
    let (regenerate, _) = policy.should_regenerate(&score);

    if !regenerate {
        return ReviewOutcome {
            score,
            accepted: true,
            attempts: 1,
            hints: Vec::new(),
        };
    }

    let hints = policy
        .improvement_suggestions(&score)
        .into_values()
        .collect();
    ReviewOutcome {
        score,
        accepted: false,
        attempts: max_attempts.max(1),
        hints,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::breakdown::DimensionScore;
    use super::*;

    fn breakdown(structure: i32, personalization: i32, message: i32, intent: i32) -> ScoreBreakdown {
        let dim = |points| DimensionScore {
            points,
            details: BTreeMap::new(),
        };
        ScoreBreakdown::new(dim(structure), dim(personalization), dim(message), dim(intent))
    }

    #[test]
    fn thresholds_partition_the_scale() {
        let policy = RegenerationPolicy::default();

        let (regen, reason) = policy.should_regenerate(&breakdown(20, 15, 15, 10));
        assert!(regen);
        assert!(reason.contains("immediate"));

        let (regen, reason) = policy.should_regenerate(&breakdown(30, 20, 20, 10));
        assert!(regen);
        assert!(reason.contains("single optimization"));

        let (regen, _) = policy.should_regenerate(&breakdown(33, 23, 20, 15));
        assert!(!regen);
    }

    #[test]
    fn suggestions_fire_below_eighty_percent() {
        let policy = RegenerationPolicy::default();
        // structure 27 < 28, personalization 20 == bar, message 21 > bar.
        let suggestions = policy.improvement_suggestions(&breakdown(27, 20, 21, 15));
        assert!(suggestions.contains_key("structure"));
        assert!(suggestions.contains_key("personalization"));
        assert!(!suggestions.contains_key("message"));
    }

    #[test]
    fn detail_suggestions_cover_missing_greeting_and_cta() {
        let policy = RegenerationPolicy::default();
        let mut score = breakdown(30, 21, 21, 15);
        score.structure.details.insert("first_name".to_string(), 0);
        score.structure.details.insert("call_to_action".to_string(), 0);
        score.structure.details.insert("achievement".to_string(), 8);
        score.structure.details.insert("industry_context".to_string(), 10);

        let suggestions = policy.improvement_suggestions(&score);
        assert!(suggestions.contains_key("first_name"));
        assert!(suggestions.contains_key("cta"));
        assert!(!suggestions.contains_key("achievement"));
        assert!(!suggestions.contains_key("industry_context"));
    }

    #[test]
    fn review_accepts_high_quality_without_hints() {
        let policy = RegenerationPolicy::default();
        let email = "Subject: Milan, cut costs with data\n\n\
            Hi Milan,\n\n\
            Congratulations on the recent launch - impressive work. We helped \
            Rohlik reach an 80% reduction in manual processing.\n\n\
            Given your role at Deloitte, I believe we could help you achieve \
            similar results and optimize data costs across the practice.\n\n\
            Would you be open to a brief 15-minute call to discuss?\n\n\
            Best regards,\nSarah";
        let input = ProspectInput {
            first_name: "Milan".to_string(),
            last_name: "K".to_string(),
            company: "Deloitte".to_string(),
            title: "Partner".to_string(),
            ..ProspectInput::default()
        };
        let research = ProspectResearch {
            linkedin_confidence: 95,
            achievements: vec!["recent launch".to_string()],
            company_achievements: vec!["a".to_string(), "b".to_string()],
        };

        let outcome = review_email(&policy, email, &research, &input, 3);
        assert!(outcome.accepted, "score was {:?}", outcome.score);
        assert!(outcome.hints.is_empty());
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn review_collects_hints_for_weak_email() {
        let policy = RegenerationPolicy::default();
        let outcome = review_email(
            &policy,
            "hello there",
            &ProspectResearch::default(),
            &ProspectInput::default(),
            3,
        );
        assert!(!outcome.accepted);
        assert!(!outcome.hints.is_empty());
    }
}
