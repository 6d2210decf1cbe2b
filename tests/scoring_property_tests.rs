//! Property-style checks of the public scoring API.

use outreach_pilot::prospect::{ProspectInput, ProspectResearch};
use outreach_pilot::scoring::{QualityScorer, RegenerationPolicy};

fn prospect(first_name: &str, intent: &str) -> ProspectInput {
    ProspectInput {
        first_name: first_name.to_string(),
        last_name: "Kulhanek".to_string(),
        company: "Deloitte".to_string(),
        title: "Partner".to_string(),
        selling_intent: intent.to_string(),
        ..ProspectInput::default()
    }
}

/// A grid of emails from empty to fully formed, crossed with research and
/// intent variants. Every combination must satisfy the breakdown invariants.
#[test]
fn totals_always_sum_and_stay_in_range() {
    let scorer = QualityScorer::new();

    let emails = [
        "",
        "x",
        "Hi Milan,",
        "Subject: hello\n\nHi Milan,\n\nShort note.\n\nBest regards,",
        "Subject: Milan, 80% less data cost\n\nHi Milan,\n\nCongratulations on the \
         promotion - impressive. We helped Rohlik cut manual work by 80%.\n\nGiven \
         your role at Deloitte I believe we could help you achieve similar results \
         with coffee machine analytics and monitoring.\n\nWhen's the best time for \
         a 15-minute call?\n\nBest regards,\nSarah",
        "no subject marker, no greeting, nothing useful at all",
    ];
    let research_variants = [
        ProspectResearch::default(),
        ProspectResearch {
            linkedin_confidence: 95,
            achievements: vec!["promotion".to_string()],
            company_achievements: vec!["one".to_string(), "two".to_string()],
        },
        ProspectResearch {
            linkedin_confidence: 50,
            ..ProspectResearch::default()
        },
    ];
    let intents = ["", "coffee machine", "crm analytics", "supply chain visibility", "weird niche"];

    for email in &emails {
        for research in &research_variants {
            for intent in &intents {
                let input = prospect("Milan", intent);
                let score = scorer.score(email, research, &input);

                assert_eq!(
                    score.total,
                    score.structure.points
                        + score.personalization.points
                        + score.message.points
                        + score.intent.points,
                    "sum invariant broken for email {:?} intent {:?}",
                    email,
                    intent
                );
                assert!(
                    (0..=100).contains(&score.total),
                    "range invariant broken: {} for email {:?}",
                    score.total,
                    email
                );
                assert!(score.intent.points >= 0, "intent went negative");

                // Idempotence: same triple, same breakdown.
                assert_eq!(score, scorer.score(email, research, &input));
            }
        }
    }
}

#[test]
fn empty_intent_always_scores_exactly_fifteen() {
    let scorer = QualityScorer::new();
    for email in ["", "anything", "data platform pitch with no focus"] {
        let score = scorer.score(email, &ProspectResearch::default(), &prospect("Ann", ""));
        assert_eq!(score.intent.points, 15);
    }
}

#[test]
fn greeting_credit_follows_capitalization() {
    let scorer = QualityScorer::new();
    let research = ProspectResearch::default();

    let capitalized = scorer.score("Hi Milan, welcome", &research, &prospect("Milan", ""));
    assert_eq!(capitalized.structure.detail("first_name"), 5);

    let lowercase = scorer.score("Hi milan, welcome", &research, &prospect("milan", ""));
    assert_eq!(lowercase.structure.detail("first_name"), 0);
}

#[test]
fn policy_bands_match_the_documented_thresholds() {
    let scorer = QualityScorer::new();
    let policy = RegenerationPolicy::default();

    // An empty email lands far below 70.
    let bad = scorer.score("", &ProspectResearch::default(), &prospect("Milan", ""));
    assert!(bad.total < 70);
    let (regen, reason) = policy.should_regenerate(&bad);
    assert!(regen);
    assert!(reason.contains("immediate"));

    let suggestions = policy.improvement_suggestions(&bad);
    assert!(suggestions.contains_key("structure"));
    assert!(suggestions.contains_key("first_name"));
    assert!(suggestions.contains_key("cta"));
}
