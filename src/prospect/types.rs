use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One outreach target. First name, last name and company are mandatory;
/// the rest defaults to empty. Inputs are immutable once built, except for
/// `retry_hints`, which the orchestrator may append between generation
/// attempts and which never persists past a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProspectInput {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub title: String,
    pub phone: String,
    pub country: String,
    pub linkedin_profile: String,
    /// Free-text description of the product use case the email must push.
    pub selling_intent: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub retry_hints: Vec<String>,
}

impl ProspectInput {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_intent(&self) -> bool {
        !self.selling_intent.trim().is_empty()
    }

    /// Attach hints for the next generation attempt. Hints ride along for
    /// one retry and are dropped from serialized output when empty.
    pub fn with_retry_hints(mut self, hints: Vec<String>) -> Self {
        self.retry_hints = hints;
        self
    }
}

/// Research signals the scorer consumes. The generation pipeline does not
/// expose its internal research, so the runner reconstructs these from the
/// validated output fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectResearch {
    /// 0-100 confidence that the right LinkedIn profile was found.
    pub linkedin_confidence: u8,
    pub achievements: Vec<String>,
    pub company_achievements: Vec<String>,
}

/// Output of one generation attempt. The `validated_*` fields are only set
/// when the pipeline asserts high confidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationResult {
    pub subject_line: String,
    pub email_body: String,
    #[serde(default)]
    pub follow_up_notes: String,
    #[serde(default)]
    pub validated_title: Option<String>,
    #[serde(default)]
    pub validated_linkedin_profile: Option<String>,
    #[serde(default)]
    pub validated_country: Option<String>,
}

impl GenerationResult {
    /// The full email as the scorer sees it: subject marker line plus body.
    pub fn composed_email(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject_line, self.email_body)
    }

    /// Research signals inferred from the output: baseline confidence of 80,
    /// raised to 95 when the pipeline validated a LinkedIn profile.
    pub fn inferred_research(&self) -> ProspectResearch {
        ProspectResearch {
            linkedin_confidence: if self.validated_linkedin_profile.is_some() {
                95
            } else {
                80
            },
            ..ProspectResearch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_email_carries_subject_marker() {
        let result = GenerationResult {
            subject_line: "Coffee Insights".to_string(),
            email_body: "Hi Milan,\n\nbody".to_string(),
            ..GenerationResult::default()
        };
        let email = result.composed_email();
        assert!(email.starts_with("Subject: Coffee Insights\n\n"));
        assert!(email.contains("Hi Milan,"));
    }

    #[test]
    fn validated_profile_raises_confidence() {
        let mut result = GenerationResult::default();
        assert_eq!(result.inferred_research().linkedin_confidence, 80);

        result.validated_linkedin_profile = Some("https://linkedin.com/in/milan".to_string());
        assert_eq!(result.inferred_research().linkedin_confidence, 95);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let parsed: ProspectInput = serde_json::from_str(
            r#"{"first_name":"Milan","last_name":"Kulhanek","company":"Deloitte"}"#,
        )
        .expect("minimal prospect parses");
        assert!(parsed.title.is_empty());
        assert!(!parsed.has_intent());
    }

    #[test]
    fn empty_retry_hints_stay_out_of_serialized_output() {
        let prospect = ProspectInput {
            first_name: "Milan".to_string(),
            last_name: "Kulhanek".to_string(),
            company: "Deloitte".to_string(),
            ..ProspectInput::default()
        };
        let json = serde_json::to_string(&prospect).expect("serializes");
        assert!(!json.contains("retry_hints"));

        let hinted = prospect.with_retry_hints(vec!["Add clear meeting request".to_string()]);
        let json = serde_json::to_string(&hinted).expect("serializes");
        assert!(json.contains("retry_hints"));
    }
}
