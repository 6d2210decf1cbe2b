//! Rule tables for the email quality scorer.
//!
//! Every keyword list, allow-list and banding threshold the scorer consults
//! lives here as a named constant so the tables can be tuned and tested
//! independently of the scoring control flow.

use std::sync::LazyLock;

use regex::Regex;

/// Dimension ceilings. The authoritative scheme is 35/25/25/15 = 100.
pub const STRUCTURE_MAX: i32 = 35;
pub const PERSONALIZATION_MAX: i32 = 25;
pub const MESSAGE_MAX: i32 = 25;
pub const INTENT_MAX: i32 = 15;

/// Points for a verbatim "Hi {first_name}" salutation with a capitalized name.
pub const GREETING_POINTS: i32 = 5;

/// Words that signal the email acknowledges a prospect achievement.
pub const ACHIEVEMENT_KEYWORDS: &[&str] = &[
    "congratulations",
    "impressive",
    "notable",
    "achievement",
    "success",
    "proud",
    "recognized",
];

/// Research confidence at or above which a specific achievement is expected.
pub const ACHIEVEMENT_CONFIDENCE_FLOOR: u8 = 70;

/// How many supplied achievement strings are checked for a verbatim match.
pub const ACHIEVEMENT_SAMPLE: usize = 3;

/// Named reference customers whose mention earns full industry-context credit.
pub const REFERENCE_CUSTOMERS: &[&str] = &["home credit", "rohlik", "p3 logistic", "brix"];

/// Result-metric phrasing that earns partial industry-context credit.
pub const RESULT_METRICS: &[&str] = &[
    "70%",
    "80%",
    "50%",
    "reduction",
    "unified data",
    "days vs months",
];

/// Generic data-platform vocabulary, worth the industry-context floor.
pub const DATA_PLATFORM_TERMS: &[&str] =
    &["data platform", "data stack", "data operations", "analytics"];

/// Action-value phrasing expected next to the prospect's company name.
pub const ACTION_VALUE_PHRASES: &[&str] = &[
    "help you",
    "achieve similar",
    "opportunities",
    "optimize",
    "streamline",
];

/// Generic but still relevant value vocabulary.
pub const GENERIC_VALUE_TERMS: &[&str] = &["data costs", "efficiency", "operations", "similar results"];

/// Value proposition is computed on a 10-point scale then capped here.
pub const VALUE_PROP_CAP: i32 = 8;

/// Call-to-action patterns, matched against the lowercased email.
pub static CTA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"15[-\s]?minute call",
        r"brief call",
        r"quick call",
        r"demo",
        r"consultation",
        r"meeting",
        r"discuss",
        r"explore",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static CTA pattern"))
    .collect()
});

pub const CTA_POINTS: i32 = 5;

/// LinkedIn-confidence banding: (inclusive floor, awarded points).
pub const LINKEDIN_CONFIDENCE_BANDS: &[(u8, i32)] = &[(90, 12), (70, 10)];
pub const LINKEDIN_CONFIDENCE_FLOOR_POINTS: i32 = 6;

/// Company research depth is computed on a 10-point scale then capped here.
pub const COMPANY_RESEARCH_CAP: i32 = 8;

/// Soft qualitative phrases that earn minimal company-research credit.
pub const SOFT_RESEARCH_PHRASES: &[&str] = &["impressive work", "doing well"];

pub const TECHNICAL_ROLES: &[&str] = &["cto", "engineer", "developer", "architect", "technical", "data"];
pub const BUSINESS_ROLES: &[&str] = &["ceo", "cmo", "vp", "director", "manager", "head"];
pub const TECHNICAL_VOCABULARY: &[&str] =
    &["technical", "integration", "api", "automation", "platform"];
pub const BUSINESS_VOCABULARY: &[&str] = &["business", "roi", "efficiency", "costs", "revenue"];

/// Matched-role vocabulary earns 5, unmatched role with any vocabulary 4,
/// anything else the floor of 2.
pub const ROLE_MATCH_POINTS: i32 = 5;
pub const ROLE_GENERIC_POINTS: i32 = 4;
pub const ROLE_FLOOR_POINTS: i32 = 2;

/// Capitalized professional greeting, e.g. "Hi Milan,".
pub static GREETING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Hi [A-Z][a-z]+,").expect("static greeting pattern"));

pub const TRANSITION_WORDS: &[&str] = &["given", "since", "because", "therefore", "recently", "we helped"];

pub static CLOSING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Best regards|Best|Regards|Sincerely").expect("static closing pattern"));

pub const CONVERSATIONAL_PHRASES: &[&str] = &["i believe", "would you", "i noticed", "given your"];

/// Tone/flow is accumulated to at most 15 raw points then capped here.
pub const TONE_RAW_CAP: i32 = 15;
pub const TONE_CAP: i32 = 12;

/// Word-count bands: ideal, acceptable, fallback.
pub const WORDS_IDEAL: (usize, usize) = (120, 180);
pub const WORDS_ACCEPTABLE: (usize, usize) = (100, 220);

/// Paragraph-count bands (paragraphs are blank-line separated).
pub const PARAGRAPHS_IDEAL: (usize, usize) = (4, 6);
pub const PARAGRAPHS_ACCEPTABLE: (usize, usize) = (3, 7);

/// Length/crispness is computed on a 10-point scale then capped here.
pub const LENGTH_CAP: i32 = 8;

/// Literal marker introducing the subject line inside the composed email.
pub const SUBJECT_MARKER: &str = "Subject:";

/// Value tokens that make a subject line land.
pub const SUBJECT_VALUE_TOKENS: &[&str] = &["50%", "70%", "80%", "cut costs", "reduce", "data"];

pub const SUBJECT_CAP: i32 = 5;

/// Intent tokens shorter than this many characters are ignored.
pub const INTENT_TOKEN_MIN_LEN: usize = 3;

/// Keyword-coverage banding: (inclusive coverage floor, awarded points).
pub const INTENT_COVERAGE_BANDS: &[(f64, i32)] = &[(0.8, 8), (0.6, 6), (0.4, 4), (0.2, 2)];

pub const USE_CASE_CAP: i32 = 5;

/// Use-case vocabulary for the specially handled intent families.
pub const COFFEE_CONTEXT_TERMS: &[&str] = &["facilities", "consumption", "maintenance", "machine"];
pub const COFFEE_ANALYTICS_TERMS: &[&str] = &["predictive", "analytics", "monitoring"];
pub const CRM_CONTEXT_TERMS: &[&str] = &["customer", "segmentation", "lead scoring"];
pub const SUPPLY_CHAIN_TERMS: &[&str] = &["supply chain", "logistics", "inventory"];
pub const SUPPLY_CHAIN_VALUE_TERMS: &[&str] = &["optimization", "visibility", "tracking"];

/// Generic platform language that is penalized when a coffee-machine intent
/// was requested and the email never mentions coffee.
pub const GENERIC_PLATFORM_PENALTY_TERMS: &[&str] =
    &["generic data", "data transformation", "analytics platform"];
pub const STRONG_GENERIC_PENALTY: i32 = -3;
pub const MILD_GENERIC_PENALTY: i32 = -2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_ceilings_sum_to_one_hundred() {
        assert_eq!(
            STRUCTURE_MAX + PERSONALIZATION_MAX + MESSAGE_MAX + INTENT_MAX,
            100
        );
    }

    #[test]
    fn cta_patterns_compile_and_match() {
        assert!(CTA_PATTERNS.iter().any(|p| p.is_match("a 15-minute call")));
        assert!(CTA_PATTERNS.iter().any(|p| p.is_match("15 minute call")));
        assert!(CTA_PATTERNS.iter().any(|p| p.is_match("book a demo")));
        assert!(!CTA_PATTERNS.iter().any(|p| p.is_match("just saying hi")));
    }

    #[test]
    fn greeting_pattern_requires_capitalized_name() {
        assert!(GREETING_PATTERN.is_match("Hi Milan,"));
        assert!(!GREETING_PATTERN.is_match("Hi milan,"));
    }

    #[test]
    fn coverage_bands_are_descending() {
        let floors: Vec<f64> = INTENT_COVERAGE_BANDS.iter().map(|(f, _)| *f).collect();
        assert!(floors.windows(2).all(|w| w[0] > w[1]));
    }
}
