use crate::prospect::{GenerationResult, ProspectInput};
use crate::scoring::{criteria, ScoreBreakdown};

/// Intent sub-score below this forces a fail when an intent was supplied.
pub const INTENT_FLOOR: i32 = 12;
/// CTA criterion below this forces a fail.
pub const CTA_FLOOR: i32 = 3;

/// Defects that fail a test no matter what the aggregate score says.
/// Returns human-readable entries; the bucketing in the runner keys off
/// their leading phrases, so changes here must stay in sync with
/// `classify_failure_patterns`.
pub fn critical_failures(
    output: &GenerationResult,
    prospect: &ProspectInput,
    score: &ScoreBreakdown,
) -> Vec<String> {
    let mut failures = Vec::new();

    if output.subject_line.trim().is_empty() {
        failures.push("Missing subject_line".to_string());
    }
    if output.email_body.trim().is_empty() {
        failures.push("Missing email_body".to_string());
    }

    let first_name = prospect.first_name.trim();
    if !first_name.is_empty() {
        let greeting = format!("Hi {}", first_name);
        let trailing_comma = format!("{},", first_name);
        if !output.email_body.contains(&greeting) && !output.email_body.contains(&trailing_comma) {
            failures.push("First name not properly capitalized in greeting".to_string());
        }
    }

    if prospect.has_intent() && score.intent.points < INTENT_FLOOR {
        failures.push(format!(
            "Intent compliance too low: {}/15 (required: >= {})",
            score.intent.points, INTENT_FLOOR
        ));
    }

    if score.structure.detail(criteria::CALL_TO_ACTION) < CTA_FLOOR {
        failures.push("Missing or weak call-to-action".to_string());
    }

    if prospect.has_intent() {
        let body_lower = output.email_body.to_lowercase();
        let has_keyword = prospect
            .selling_intent
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .any(|w| body_lower.contains(w));
        if !has_keyword {
            failures.push(
                "Generic messaging used despite specific selling_intent provided".to_string(),
            );
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prospect::ProspectResearch;
    use crate::scoring::QualityScorer;

    fn score_of(email_body: &str, prospect: &ProspectInput) -> (GenerationResult, ScoreBreakdown) {
        let output = GenerationResult {
            subject_line: "A subject".to_string(),
            email_body: email_body.to_string(),
            ..GenerationResult::default()
        };
        let score = QualityScorer::new().score(
            &output.composed_email(),
            &ProspectResearch::default(),
            prospect,
        );
        (output, score)
    }

    fn prospect(intent: &str) -> ProspectInput {
        ProspectInput {
            first_name: "Milan".to_string(),
            last_name: "Kulhanek".to_string(),
            company: "Deloitte".to_string(),
            selling_intent: intent.to_string(),
            ..ProspectInput::default()
        }
    }

    #[test]
    fn missing_fields_are_critical() {
        let prospect = prospect("");
        let (_, score) = score_of("Hi Milan, let's discuss", &prospect);
        let empty = GenerationResult::default();
        let failures = critical_failures(&empty, &prospect, &score);
        assert!(failures.iter().any(|f| f.contains("subject_line")));
        assert!(failures.iter().any(|f| f.contains("email_body")));
    }

    #[test]
    fn greeting_form_is_required() {
        let prospect = prospect("");
        let (output, score) = score_of("Dear sir, let's discuss a demo", &prospect);
        let failures = critical_failures(&output, &prospect, &score);
        assert!(failures.iter().any(|f| f.contains("First name")));

        // Either greeting form satisfies the check.
        let (output, score) = score_of("Milan, shall we discuss a demo?", &prospect);
        let failures = critical_failures(&output, &prospect, &score);
        assert!(!failures.iter().any(|f| f.contains("First name")));
    }

    #[test]
    fn low_intent_score_is_critical_only_with_intent() {
        let with_intent = prospect("coffee machine");
        let (output, score) = score_of("Hi Milan, our data platform helps. Let's discuss.", &with_intent);
        assert!(score.intent.points < INTENT_FLOOR);
        let failures = critical_failures(&output, &with_intent, &score);
        assert!(failures.iter().any(|f| f.contains("Intent compliance")));

        let without_intent = prospect("");
        let (output, score) = score_of("Hi Milan, our data platform helps. Let's discuss.", &without_intent);
        let failures = critical_failures(&output, &without_intent, &score);
        assert!(!failures.iter().any(|f| f.contains("Intent compliance")));
    }

    #[test]
    fn weak_cta_is_critical() {
        let prospect = prospect("");
        let (output, score) = score_of("Hi Milan, this is just information.", &prospect);
        let failures = critical_failures(&output, &prospect, &score);
        assert!(failures.iter().any(|f| f.contains("call-to-action")));
    }

    #[test]
    fn generic_messaging_flagged_when_intent_ignored() {
        let prospect = prospect("coffee machine analytics");
        let (output, score) = score_of("Hi Milan, quick call about our data tools?", &prospect);
        let failures = critical_failures(&output, &prospect, &score);
        assert!(failures.iter().any(|f| f.contains("Generic messaging")));
    }
}
