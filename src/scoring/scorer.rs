use std::collections::BTreeMap;

use crate::prospect::{ProspectInput, ProspectResearch};

use super::breakdown::{criteria, DimensionScore, ScoreBreakdown};
use super::rules;

/// Deterministic, rule-based email quality scorer.
///
/// Scoring is pure keyword/pattern matching over the composed email text
/// (subject marker line plus body): no external calls, identical output for
/// identical input. Sparse inputs (empty strings, missing research) score
/// low, they never error.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        email: &str,
        research: &ProspectResearch,
        input: &ProspectInput,
    ) -> ScoreBreakdown {
        let email_lower = email.to_lowercase();

        ScoreBreakdown::new(
            self.structure_compliance(email, &email_lower, research, input),
            self.personalization_quality(&email_lower, research, input),
            self.message_quality(email, &email_lower, input),
            self.intent_compliance(&email_lower, input),
        )
    }

    /// Structure compliance, max 35.
    fn structure_compliance(
        &self,
        email: &str,
        email_lower: &str,
        research: &ProspectResearch,
        input: &ProspectInput,
    ) -> DimensionScore {
        let mut details = BTreeMap::new();

        let first_name = input.first_name.trim();
        let greeted = !first_name.is_empty()
            && first_name.starts_with(|c: char| c.is_uppercase())
            && email.contains(&format!("Hi {}", first_name));
        details.insert(
            criteria::FIRST_NAME.to_string(),
            if greeted { rules::GREETING_POINTS } else { 0 },
        );

        details.insert(
            criteria::ACHIEVEMENT.to_string(),
            self.achievement_recognition(email_lower, research),
        );

        details.insert(
            criteria::INDUSTRY_CONTEXT.to_string(),
            self.industry_context(email_lower),
        );

        details.insert(
            criteria::VALUE_PROPOSITION.to_string(),
            self.value_proposition(email_lower, input)
                .min(rules::VALUE_PROP_CAP),
        );

        let cta = if rules::CTA_PATTERNS.iter().any(|p| p.is_match(email_lower)) {
            rules::CTA_POINTS
        } else {
            0
        };
        details.insert(criteria::CALL_TO_ACTION.to_string(), cta);

        // The raw criteria can add up to 38; the dimension ceiling wins.
        DimensionScore {
            points: details.values().sum::<i32>().min(rules::STRUCTURE_MAX),
            details,
        }
    }

    /// Achievement recognition, max 10. High-confidence research is expected
    /// to surface a specific achievement; low confidence accepts a generic
    /// congratulatory keyword.
    fn achievement_recognition(&self, email_lower: &str, research: &ProspectResearch) -> i32 {
        let keyword_present = rules::ACHIEVEMENT_KEYWORDS
            .iter()
            .any(|k| email_lower.contains(k));

        if research.linkedin_confidence >= rules::ACHIEVEMENT_CONFIDENCE_FLOOR {
            if keyword_present && !research.achievements.is_empty() {
                let verbatim = research
                    .achievements
                    .iter()
                    .take(rules::ACHIEVEMENT_SAMPLE)
                    .any(|a| email_lower.contains(&a.to_lowercase()));
                if verbatim { 10 } else { 8 }
            } else {
                4
            }
        } else if keyword_present {
            7
        } else {
            3
        }
    }

    /// Industry context, max 10: named reference customer beats a result
    /// metric beats generic platform vocabulary.
    fn industry_context(&self, email_lower: &str) -> i32 {
        if rules::REFERENCE_CUSTOMERS
            .iter()
            .any(|c| email_lower.contains(c))
        {
            10
        } else if rules::RESULT_METRICS.iter().any(|m| email_lower.contains(m)) {
            8
        } else if rules::DATA_PLATFORM_TERMS
            .iter()
            .any(|t| email_lower.contains(t))
        {
            5
        } else {
            0
        }
    }

    /// Value proposition on the raw 10-point scale; the caller caps it.
    fn value_proposition(&self, email_lower: &str, input: &ProspectInput) -> i32 {
        let company = input.company.trim().to_lowercase();
        if !company.is_empty()
            && email_lower.contains(&company)
            && rules::ACTION_VALUE_PHRASES
                .iter()
                .any(|p| email_lower.contains(p))
        {
            return 10;
        }
        if rules::GENERIC_VALUE_TERMS
            .iter()
            .any(|t| email_lower.contains(t))
        {
            return 6;
        }
        0
    }

    /// Personalization quality, max 25.
    fn personalization_quality(
        &self,
        email_lower: &str,
        research: &ProspectResearch,
        input: &ProspectInput,
    ) -> DimensionScore {
        let mut details = BTreeMap::new();

        let confidence_points = rules::LINKEDIN_CONFIDENCE_BANDS
            .iter()
            .find(|(floor, _)| research.linkedin_confidence >= *floor)
            .map(|(_, points)| *points)
            .unwrap_or(rules::LINKEDIN_CONFIDENCE_FLOOR_POINTS);
        details.insert(criteria::LINKEDIN_CONFIDENCE.to_string(), confidence_points);

        details.insert(
            criteria::COMPANY_RESEARCH.to_string(),
            self.company_research_depth(email_lower, research)
                .min(rules::COMPANY_RESEARCH_CAP),
        );

        details.insert(
            criteria::ROLE_RELEVANCE.to_string(),
            self.role_relevance(email_lower, &input.title),
        );

        DimensionScore {
            points: details.values().sum(),
            details,
        }
    }

    /// Company research depth on the raw 10-point scale; the caller caps it.
    fn company_research_depth(&self, email_lower: &str, research: &ProspectResearch) -> i32 {
        match research.company_achievements.len() {
            n if n >= 2 => 10,
            1 => 7,
            _ if rules::SOFT_RESEARCH_PHRASES
                .iter()
                .any(|p| email_lower.contains(p)) =>
            {
                4
            }
            _ => 0,
        }
    }

    /// Role relevance, max 5. Matching vocabulary earns full credit, an
    /// unrecognized role with any vocabulary earns 4, everything else the
    /// floor of 2.
    fn role_relevance(&self, email_lower: &str, title: &str) -> i32 {
        let title = title.to_lowercase();

        let technical_vocab = rules::TECHNICAL_VOCABULARY
            .iter()
            .any(|k| email_lower.contains(k));
        let business_vocab = rules::BUSINESS_VOCABULARY
            .iter()
            .any(|k| email_lower.contains(k));

        if rules::TECHNICAL_ROLES.iter().any(|r| title.contains(r)) {
            if technical_vocab {
                return rules::ROLE_MATCH_POINTS;
            }
        } else if rules::BUSINESS_ROLES.iter().any(|r| title.contains(r)) {
            if business_vocab {
                return rules::ROLE_MATCH_POINTS;
            }
        } else if technical_vocab || business_vocab {
            return rules::ROLE_GENERIC_POINTS;
        }

        rules::ROLE_FLOOR_POINTS
    }

    /// Message quality, max 25.
    fn message_quality(
        &self,
        email: &str,
        email_lower: &str,
        input: &ProspectInput,
    ) -> DimensionScore {
        let mut details = BTreeMap::new();

        details.insert(
            criteria::TONE_FLOW.to_string(),
            self.tone_and_flow(email, email_lower).min(rules::TONE_CAP),
        );
        details.insert(
            criteria::LENGTH_CRISPNESS.to_string(),
            self.length_and_crispness(email).min(rules::LENGTH_CAP),
        );
        details.insert(
            criteria::SUBJECT_LINE.to_string(),
            self.subject_line(email, input),
        );

        DimensionScore {
            points: details.values().sum(),
            details,
        }
    }

    /// Tone and flow on the raw 15-point scale; the caller caps it at 12.
    fn tone_and_flow(&self, email: &str, email_lower: &str) -> i32 {
        let mut score = 0;

        if rules::GREETING_PATTERN.is_match(email) {
            score += 3;
        }
        if rules::TRANSITION_WORDS.iter().any(|w| email_lower.contains(w)) {
            score += 4;
        }
        if rules::CLOSING_PATTERN.is_match(email) {
            score += 3;
        }
        if rules::CONVERSATIONAL_PHRASES
            .iter()
            .any(|p| email_lower.contains(p))
        {
            score += 5;
        }

        score.min(rules::TONE_RAW_CAP)
    }

    /// Length and crispness on the raw 10-point scale; the caller caps it.
    fn length_and_crispness(&self, email: &str) -> i32 {
        let words = email.split_whitespace().count();
        let paragraphs = email
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();

        let in_band = |n: usize, (lo, hi): (usize, usize)| (lo..=hi).contains(&n);

        let word_score = if in_band(words, rules::WORDS_IDEAL) {
            5
        } else if in_band(words, rules::WORDS_ACCEPTABLE) {
            3
        } else {
            1
        };

        let paragraph_score = if in_band(paragraphs, rules::PARAGRAPHS_IDEAL) {
            5
        } else if in_band(paragraphs, rules::PARAGRAPHS_ACCEPTABLE) {
            3
        } else {
            1
        };

        word_score + paragraph_score
    }

    /// Subject line impact, max 5. Zero when no "Subject:" marker line exists.
    fn subject_line(&self, email: &str, input: &ProspectInput) -> i32 {
        let Some(subject) = email
            .lines()
            .find_map(|line| line.strip_prefix(rules::SUBJECT_MARKER))
            .map(str::trim)
        else {
            return 0;
        };
        if subject.is_empty() {
            return 0;
        }

        let subject_lower = subject.to_lowercase();
        let mut score = 0;

        let first_name = input.first_name.trim();
        if !first_name.is_empty() && subject.contains(first_name) {
            score += 2;
        }
        let company = input.company.trim();
        if !company.is_empty() && subject.contains(company) {
            score += 1;
        }
        if rules::SUBJECT_VALUE_TOKENS
            .iter()
            .any(|t| subject_lower.contains(t))
        {
            score += 2;
        }

        score.min(rules::SUBJECT_CAP)
    }

    /// Selling-intent compliance, max 15. Full credit when no intent was
    /// supplied; otherwise keyword coverage plus use-case focus minus the
    /// generic-messaging penalty, clamped at zero.
    fn intent_compliance(&self, email_lower: &str, input: &ProspectInput) -> DimensionScore {
        let mut details = BTreeMap::new();

        let intent = input.selling_intent.trim().to_lowercase();
        if intent.is_empty() {
            details.insert(criteria::KEYWORD_COVERAGE.to_string(), rules::INTENT_MAX);
            return DimensionScore {
                points: rules::INTENT_MAX,
                details,
            };
        }

        let keywords: Vec<&str> = intent
            .split_whitespace()
            .filter(|w| w.len() >= rules::INTENT_TOKEN_MIN_LEN)
            .collect();

        let coverage = if keywords.is_empty() {
            0.0
        } else {
            let found = keywords.iter().filter(|k| email_lower.contains(*k)).count();
            found as f64 / keywords.len() as f64
        };
        let coverage_score = rules::INTENT_COVERAGE_BANDS
            .iter()
            .find(|(floor, _)| coverage >= *floor)
            .map(|(_, points)| *points)
            .unwrap_or(0);
        details.insert(criteria::KEYWORD_COVERAGE.to_string(), coverage_score);

        let use_case_score = self
            .use_case_focus(email_lower, &intent, &keywords)
            .min(rules::USE_CASE_CAP);
        details.insert(criteria::USE_CASE_FOCUS.to_string(), use_case_score);

        let penalty = self.generic_penalty(email_lower, &intent);
        details.insert(criteria::GENERIC_PENALTY.to_string(), penalty);

        DimensionScore {
            points: (coverage_score + use_case_score + penalty).max(0),
            details,
        }
    }

    fn use_case_focus(&self, email_lower: &str, intent: &str, keywords: &[&str]) -> i32 {
        let any = |terms: &[&str]| terms.iter().any(|t| email_lower.contains(t));

        if intent.contains("coffee machine") {
            let mut score = 0;
            if email_lower.contains("coffee") {
                score += 2;
            }
            if any(rules::COFFEE_CONTEXT_TERMS) {
                score += 2;
            }
            if any(rules::COFFEE_ANALYTICS_TERMS) {
                score += 1;
            }
            score
        } else if intent.contains("crm") {
            let mut score = 0;
            if email_lower.contains("crm") {
                score += 3;
            }
            if any(rules::CRM_CONTEXT_TERMS) {
                score += 2;
            }
            score
        } else if intent.contains("supply chain") {
            let mut score = 0;
            if any(rules::SUPPLY_CHAIN_TERMS) {
                score += 3;
            }
            if any(rules::SUPPLY_CHAIN_VALUE_TERMS) {
                score += 2;
            }
            score
        } else if keywords.iter().any(|k| email_lower.contains(*k)) {
            3
        } else {
            0
        }
    }

    fn generic_penalty(&self, email_lower: &str, intent: &str) -> i32 {
        if !intent.contains("coffee machine") || email_lower.contains("coffee") {
            return 0;
        }
        if email_lower.contains("data platform") {
            rules::STRONG_GENERIC_PENALTY
        } else if rules::GENERIC_PLATFORM_PENALTY_TERMS
            .iter()
            .any(|t| email_lower.contains(t))
        {
            rules::MILD_GENERIC_PENALTY
        } else {
            0
        }
    }
}
