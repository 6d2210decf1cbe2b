use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "outreach-pilot")]
#[command(author, version, about = "Auto-improvement orchestrator for sales outreach crews", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Project root (default: current directory)
    #[arg(long, global = true, env = "OUTREACH_PILOT_ROOT")]
    pub root: Option<PathBuf>,
}

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize outreach-pilot in the current project
    Init,

    /// Score an email file without running the pipeline
    Score {
        /// Path to the email text ("-" for stdin)
        email: PathBuf,

        #[arg(long)]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long)]
        company: String,

        #[arg(long, default_value = "")]
        title: String,

        /// Selling intent the email should comply with
        #[arg(long, default_value = "")]
        selling_intent: String,

        /// Assumed LinkedIn research confidence (0-100)
        #[arg(long, default_value = "80")]
        linkedin_confidence: u8,
    },

    /// Run one test suite against the current prompts, without adaptation
    Test {
        /// Prospects to generate and test
        #[arg(long)]
        num_prospects: Option<usize>,

        /// Target pass rate (0.0-1.0)
        #[arg(long)]
        target_pass_rate: Option<f64>,

        /// Fixed seed for reproducible prospect batches
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the full improvement cycle until target, stagnation, or budget
    Improve {
        /// Maximum improvement iterations
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Target pass rate (0.0-1.0)
        #[arg(long)]
        target_pass_rate: Option<f64>,

        /// Prospects per iteration
        #[arg(long)]
        num_prospects: Option<usize>,

        /// Skip the backup of the original prompt documents
        #[arg(long)]
        no_backup: bool,

        /// Fixed seed for reproducible prospect batches
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Reset to defaults
    Reset,
}
