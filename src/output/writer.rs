use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::improve::ImprovementReport;
use crate::runner::TestSuiteResults;
use crate::scoring::ScoreBreakdown;

/// Writes results in the selected output format.
///
/// - Text: human-readable summary (default)
/// - Json: one JSON object on stdout at completion
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn emit_report(&self, report: &ImprovementReport) {
        match self.format {
            OutputFormat::Text => self.print_report(report),
            OutputFormat::Json => self.write_json(report),
        }
    }

    pub fn emit_suite(&self, suite: &TestSuiteResults, target_pass_rate: f64) {
        match self.format {
            OutputFormat::Text => self.print_suite(suite, target_pass_rate),
            OutputFormat::Json => self.write_json(suite),
        }
    }

    pub fn emit_score(&self, output: &ScoreOutput) {
        match self.format {
            OutputFormat::Text => self.print_score(output),
            OutputFormat::Json => self.write_json(output),
        }
    }

    pub fn emit_message(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => self.write_json(&MessageOutput {
                message: message.to_string(),
            }),
        }
    }

    fn write_json<T: Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }

    fn print_report(&self, report: &ImprovementReport) {
        println!();
        if report.success {
            println!("Improvement cycle succeeded.");
        } else {
            println!("Improvement cycle ended below target ({}).", report.outcome);
        }
        println!();
        println!("Iterations:        {}", report.iterations);
        println!(
            "Pass rate:         {:.1}% -> {:.1}% (target {:.0}%)",
            report.initial_pass_rate * 100.0,
            report.final_pass_rate * 100.0,
            report.target_pass_rate * 100.0
        );
        println!("Improvement:       {:+.1}%", report.improvement * 100.0);
        println!("Final avg quality: {:.1}/100", report.final_avg_quality);
        println!("Total tests run:   {}", report.total_tests_run);
        println!();
        println!("{}", report.message);
    }

    fn print_suite(&self, suite: &TestSuiteResults, target_pass_rate: f64) {
        println!();
        println!("Tests: {} total, {} passed, {} failed", suite.total_tests, suite.passed_tests, suite.failed_tests);
        println!(
            "Pass rate: {:.1}% (target {:.0}%)",
            suite.pass_rate * 100.0,
            target_pass_rate * 100.0
        );
        println!("Average quality: {:.1}/100", suite.avg_quality_score);

        if suite.pass_rate < target_pass_rate {
            println!(
                "Below target by {:.1} percentage points",
                suite.shortfall(target_pass_rate) * 100.0
            );
        }

        if !suite.failure_patterns.is_empty() {
            println!();
            println!("Failure patterns:");
            let mut patterns: Vec<(&String, &usize)> = suite.failure_patterns.iter().collect();
            patterns.sort_by(|a, b| b.1.cmp(a.1));
            for (pattern, count) in patterns {
                println!("  {:<28} {}", pattern, count);
            }
        }
    }

    fn print_score(&self, output: &ScoreOutput) {
        println!();
        println!("Total score: {}/100", output.score.total);
        println!("  structure:       {}/35", output.score.structure.points);
        println!("  personalization: {}/25", output.score.personalization.points);
        println!("  message:         {}/25", output.score.message.points);
        println!("  intent:          {}/15", output.score.intent.points);
        println!();
        println!(
            "Verdict: {}",
            if output.regenerate { "regenerate" } else { "accept" }
        );
        println!("Reason: {}", output.reason);

        if !output.suggestions.is_empty() {
            println!();
            println!("Suggestions:");
            for (tag, hint) in &output.suggestions {
                println!("  [{}] {}", tag, hint);
            }
        }
    }
}

/// Scoring result as emitted by the `score` command.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreOutput {
    pub score: ScoreBreakdown,
    pub regenerate: bool,
    pub reason: String,
    pub suggestions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
struct MessageOutput {
    message: String,
}
