//! Parser for the adaptation collaborator's `IMPROVEMENT N:` response
//! format. Each block carries `Target:`, `Name:`, `Field:`, a (usually
//! fenced) `Improved Text:` body and a `Rationale:` line; the response ends
//! with `SUMMARY:` and `EXPECTED IMPACT:` sections. Blocks missing any
//! required part are dropped, a wholly unparseable response yields an empty
//! batch, and neither case is an error.

use tracing::debug;

use crate::config::PromptDoc;

use super::types::{ImprovementTarget, PromptImprovement, PromptImprovements};

#[derive(Debug, Default)]
struct PartialImprovement {
    target: Option<ImprovementTarget>,
    name: Option<String>,
    field: Option<String>,
    improved_lines: Option<Vec<String>>,
    rationale: Option<String>,
}

impl PartialImprovement {
    /// Promote to a complete improvement, pulling the original text from the
    /// matching document for the audit trail.
    fn build(self, agents: &PromptDoc, tasks: &PromptDoc) -> Option<PromptImprovement> {
        let target = self.target?;
        let name = self.name?;
        let field = self.field?;
        let improved_text = self.improved_lines?.join("\n").trim().to_string();
        if improved_text.is_empty() {
            return None;
        }

        let doc = match target {
            ImprovementTarget::Agent => agents,
            ImprovementTarget::Task => tasks,
        };
        let original_text = doc.field(&name, &field).unwrap_or_default().to_string();

        Some(PromptImprovement {
            target,
            name,
            field,
            original_text,
            improved_text,
            rationale: self.rationale.unwrap_or_default(),
        })
    }
}

pub fn parse_improvements_response(
    response: &str,
    agents: &PromptDoc,
    tasks: &PromptDoc,
) -> PromptImprovements {
    let mut improvements = Vec::new();
    let mut current: Option<PartialImprovement> = None;
    let mut in_improved_text = false;

    let mut summary_lines: Vec<String> = Vec::new();
    let mut impact_lines: Vec<String> = Vec::new();
    let mut tail_section: Option<&str> = None;

    for raw_line in response.lines() {
        let line = raw_line.trim();

        if line.starts_with("IMPROVEMENT") {
            if let Some(done) = current.take() {
                improvements.extend(done.build(agents, tasks));
            }
            current = Some(PartialImprovement::default());
            in_improved_text = false;
            tail_section = None;
            continue;
        }
        if line.starts_with("SUMMARY:") {
            if let Some(done) = current.take() {
                improvements.extend(done.build(agents, tasks));
            }
            in_improved_text = false;
            tail_section = Some("summary");
            continue;
        }
        if line.starts_with("EXPECTED IMPACT:") {
            in_improved_text = false;
            tail_section = Some("impact");
            continue;
        }

        match tail_section {
            Some("summary") if !line.is_empty() => {
                summary_lines.push(line.to_string());
                continue;
            }
            Some("impact") if !line.is_empty() => {
                impact_lines.push(line.to_string());
                continue;
            }
            _ => {}
        }

        let Some(partial) = current.as_mut() else {
            continue;
        };

        if let Some(value) = line.strip_prefix("Target:") {
            partial.target = ImprovementTarget::parse(value);
            in_improved_text = false;
        } else if let Some(value) = line.strip_prefix("Name:") {
            partial.name = Some(value.trim().to_string());
            in_improved_text = false;
        } else if let Some(value) = line.strip_prefix("Field:") {
            partial.field = Some(value.trim().to_string());
            in_improved_text = false;
        } else if line.starts_with("Improved Text:") {
            partial.improved_lines = Some(Vec::new());
            in_improved_text = true;
        } else if let Some(value) = line.strip_prefix("Rationale:") {
            partial.rationale = Some(value.trim().to_string());
            in_improved_text = false;
        } else if in_improved_text && !line.starts_with("```") {
            if let Some(lines) = partial.improved_lines.as_mut() {
                lines.push(raw_line.to_string());
            }
        }
    }

    if let Some(done) = current.take() {
        improvements.extend(done.build(agents, tasks));
    }

    debug!(parsed = improvements.len(), "Parsed improvement blocks");
    PromptImprovements {
        improvements,
        summary: summary_lines.join(" "),
        expected_impact: impact_lines.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> (PromptDoc, PromptDoc) {
        let agents = PromptDoc::parse(
            "email_copywriter:\n  backstory: Old copywriter backstory.\n",
        )
        .expect("agents parse");
        let tasks = PromptDoc::parse(
            "write_email_task:\n  description: Old task description.\n",
        )
        .expect("tasks parse");
        (agents, tasks)
    }

    #[test]
    fn parses_complete_blocks_with_fences() {
        let (agents, tasks) = docs();
        let response = "\
IMPROVEMENT 1:
Target: agent
Name: email_copywriter
Field: backstory
Improved Text:
```
New backstory line one.
New backstory line two.
```
Rationale: Enforce keywords.

IMPROVEMENT 2:
Target: task
Name: write_email_task
Field: description
Improved Text:
```
New description.
```
Rationale: Add CTA examples.

SUMMARY:
Two targeted edits.

EXPECTED IMPACT:
Pass rate should rise.
";
        let parsed = parse_improvements_response(response, &agents, &tasks);
        assert_eq!(parsed.improvements.len(), 2);

        let first = &parsed.improvements[0];
        assert_eq!(first.target, ImprovementTarget::Agent);
        assert_eq!(first.name, "email_copywriter");
        assert_eq!(first.field, "backstory");
        assert_eq!(first.improved_text, "New backstory line one.\nNew backstory line two.");
        assert_eq!(first.original_text, "Old copywriter backstory.");
        assert_eq!(first.rationale, "Enforce keywords.");

        assert_eq!(parsed.summary, "Two targeted edits.");
        assert_eq!(parsed.expected_impact, "Pass rate should rise.");
    }

    #[test]
    fn incomplete_blocks_are_dropped() {
        let (agents, tasks) = docs();
        let response = "\
IMPROVEMENT 1:
Target: agent
Name: email_copywriter
Rationale: No field or text given.

IMPROVEMENT 2:
Target: task
Name: write_email_task
Field: description
Improved Text:
Better text.
Rationale: Complete block.
";
        let parsed = parse_improvements_response(response, &agents, &tasks);
        assert_eq!(parsed.improvements.len(), 1);
        assert_eq!(parsed.improvements[0].name, "write_email_task");
    }

    #[test]
    fn unknown_target_kind_drops_the_block() {
        let (agents, tasks) = docs();
        let response = "\
IMPROVEMENT 1:
Target: pipeline
Name: email_copywriter
Field: backstory
Improved Text:
Text.
Rationale: Wrong target kind.
";
        let parsed = parse_improvements_response(response, &agents, &tasks);
        assert!(parsed.is_empty());
    }

    #[test]
    fn unparseable_response_yields_empty_batch() {
        let (agents, tasks) = docs();
        let parsed = parse_improvements_response("I cannot help with that.", &agents, &tasks);
        assert!(parsed.is_empty());
        assert!(parsed.summary.is_empty());
    }

    #[test]
    fn unknown_entity_still_parses_with_empty_original() {
        let (agents, tasks) = docs();
        let response = "\
IMPROVEMENT 1:
Target: agent
Name: brand_new_agent
Field: backstory
Improved Text:
Text for an agent the store does not know.
Rationale: Model hallucinated a target.
";
        let parsed = parse_improvements_response(response, &agents, &tasks);
        assert_eq!(parsed.improvements.len(), 1);
        assert!(parsed.improvements[0].original_text.is_empty());
    }
}
