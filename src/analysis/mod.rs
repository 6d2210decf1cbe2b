//! Failure analysis: rule-derived patterns plus a completion-backed deep
//! read with a deterministic fallback.

mod analyzer;
mod parser;
mod types;

pub use analyzer::{fallback_analysis, identify_failure_patterns, FailureAnalyzer};
pub use parser::{parse_analysis_response, ParsedAnalysis};
pub use types::{AnalysisReport, FailurePattern, PatternKind, Severity};
