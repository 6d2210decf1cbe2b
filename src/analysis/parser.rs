//! Tolerant parser for the analysis collaborator's semi-structured response.
//!
//! The expected shape is four section headers (`AGENT WEAKNESSES:`,
//! `TASK WEAKNESSES:`, `PRIORITY FIXES:`, `SUMMARY:`) each followed by
//! lines in a section-specific format. Real responses drift: sections go
//! missing, lines come malformed, unknown headers appear. Every such case
//! degrades to "skip", never to an error.

use std::collections::BTreeMap;

/// Parsed analysis sections; any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAnalysis {
    pub agent_weaknesses: BTreeMap<String, Vec<String>>,
    pub task_weaknesses: BTreeMap<String, Vec<String>>,
    pub priority_fixes: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Agents,
    Tasks,
    Priorities,
    Summary,
}

pub fn parse_analysis_response(response: &str) -> ParsedAnalysis {
    let mut parsed = ParsedAnalysis::default();
    let mut section = Section::None;
    let mut summary_lines: Vec<String> = Vec::new();

    for raw_line in response.lines() {
        let line = raw_line.trim();

        if line.starts_with("AGENT WEAKNESSES:") {
            section = Section::Agents;
            continue;
        }
        if line.starts_with("TASK WEAKNESSES:") {
            section = Section::Tasks;
            continue;
        }
        if line.starts_with("PRIORITY FIXES:") {
            section = Section::Priorities;
            continue;
        }
        if line.starts_with("SUMMARY:") {
            section = Section::Summary;
            continue;
        }
        if line.is_empty() {
            continue;
        }

        match section {
            Section::Agents => {
                if let Some((name, weaknesses)) = parse_weakness_line(line) {
                    parsed.agent_weaknesses.entry(name).or_default().extend(weaknesses);
                }
            }
            Section::Tasks => {
                if let Some((name, weaknesses)) = parse_weakness_line(line) {
                    parsed.task_weaknesses.entry(name).or_default().extend(weaknesses);
                }
            }
            Section::Priorities => {
                if let Some(fix) = parse_priority_line(line) {
                    parsed.priority_fixes.push(fix);
                }
            }
            Section::Summary => summary_lines.push(line.to_string()),
            Section::None => {} // Preamble or unknown section: ignore.
        }
    }

    parsed.summary = summary_lines.join(" ");
    parsed
}

/// `name: [weakness1, weakness2]` or `name: free text`. Lines without a
/// colon are malformed and skipped.
fn parse_weakness_line(line: &str) -> Option<(String, Vec<String>)> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim().trim_start_matches('-').trim();
    if name.is_empty() {
        return None;
    }

    let rest = rest.trim();
    let inner = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(rest);

    let weaknesses: Vec<String> = inner
        .split(',')
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if weaknesses.is_empty() {
        return None;
    }
    Some((name.to_string(), weaknesses))
}

/// `1. Fix text` numbered entries; anything unnumbered is skipped.
fn parse_priority_line(line: &str) -> Option<String> {
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let fix = match line.split_once('.') {
        Some((_, rest)) => rest.trim(),
        None => line,
    };
    if fix.is_empty() {
        None
    } else {
        Some(fix.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_response() {
        let response = "\
Some preamble the model added.

AGENT WEAKNESSES:
linkedin_researcher: [too cautious, low confidence]
email_copywriter: [ignores selling intent]

TASK WEAKNESSES:
write_email_task: [missing CTA requirement]

PRIORITY FIXES:
1. Enforce selling_intent keywords
2. Add CTA examples

SUMMARY:
Agents drop the selling intent.
Fixes should enforce keywords.
";
        let parsed = parse_analysis_response(response);
        assert_eq!(parsed.agent_weaknesses.len(), 2);
        assert_eq!(
            parsed.agent_weaknesses["linkedin_researcher"],
            vec!["too cautious".to_string(), "low confidence".to_string()]
        );
        assert_eq!(parsed.task_weaknesses.len(), 1);
        assert_eq!(parsed.priority_fixes.len(), 2);
        assert_eq!(parsed.priority_fixes[0], "Enforce selling_intent keywords");
        assert!(parsed.summary.starts_with("Agents drop the selling intent."));
    }

    #[test]
    fn missing_sections_yield_empty_results() {
        let parsed = parse_analysis_response("SUMMARY:\nAll good.\n");
        assert!(parsed.agent_weaknesses.is_empty());
        assert!(parsed.task_weaknesses.is_empty());
        assert!(parsed.priority_fixes.is_empty());
        assert_eq!(parsed.summary, "All good.");
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let response = "\
AGENT WEAKNESSES:
this line has no colon
: weakness without a name
valid_agent: [one thing]

PRIORITY FIXES:
not numbered
3. A real fix
";
        let parsed = parse_analysis_response(response);
        assert_eq!(parsed.agent_weaknesses.len(), 1);
        assert!(parsed.agent_weaknesses.contains_key("valid_agent"));
        assert_eq!(parsed.priority_fixes, vec!["A real fix".to_string()]);
    }

    #[test]
    fn wholly_unparseable_text_is_empty_not_an_error() {
        let parsed = parse_analysis_response("The model rambled about nothing at all.");
        assert_eq!(parsed, ParsedAnalysis::default());
    }

    #[test]
    fn unbracketed_weakness_text_still_parses() {
        let parsed =
            parse_analysis_response("AGENT WEAKNESSES:\nresearcher: misses profiles often\n");
        assert_eq!(
            parsed.agent_weaknesses["researcher"],
            vec!["misses profiles often".to_string()]
        );
    }
}
