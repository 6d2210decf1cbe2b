use console::{style, Style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::Severity;
use crate::improve::ImprovementReport;
use crate::runner::TestSuiteResults;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn print_iteration_banner(&self, iteration: u32, max: u32) {
        println!();
        println!(
            "{}",
            style(format!("Iteration {}/{}", iteration, max)).bold()
        );
        println!("{}", style("─".repeat(40)).dim());
    }

    pub fn print_suite_line(&self, suite: &TestSuiteResults) {
        let rate = suite.pass_rate * 100.0;
        let rate_style = if suite.failed_tests == 0 {
            Style::new().green().bold()
        } else if rate >= 70.0 {
            Style::new().yellow()
        } else {
            Style::new().red()
        };
        println!(
            "  {} passed, {} failed  pass rate {}  avg quality {:.1}",
            style(suite.passed_tests).green(),
            style(suite.failed_tests).red(),
            rate_style.apply_to(format!("{:.1}%", rate)),
            suite.avg_quality_score
        );
    }

    pub fn print_report_summary(&self, report: &ImprovementReport) {
        self.print_header("Improvement report");
        if report.success {
            self.print_success(&report.message);
        } else {
            self.print_warning(&report.message);
        }
        println!(
            "  pass rate {} -> {}  quality {:.1}  iterations {}",
            style(format!("{:.1}%", report.initial_pass_rate * 100.0)).dim(),
            style(format!("{:.1}%", report.final_pass_rate * 100.0)).bold(),
            report.final_avg_quality,
            report.iterations
        );
    }

    pub fn severity_style(&self, severity: Severity) -> Style {
        match severity {
            Severity::Critical => Style::new().red().bold(),
            Severity::High => Style::new().red(),
            Severity::Medium => Style::new().yellow(),
            Severity::Low => Style::new().dim(),
        }
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
