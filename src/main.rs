use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use outreach_pilot::cli::{Cli, Commands, ConfigAction, Display, OutputFormat};
use outreach_pilot::completion::CommandCompletion;
use outreach_pilot::config::{OutreachConfig, ProjectPaths, PromptStore};
use outreach_pilot::error::{OutreachError, Result};
use outreach_pilot::generation::CommandPipeline;
use outreach_pilot::improve::ImprovementOrchestrator;
use outreach_pilot::output::{OutputWriter, ScoreOutput};
use outreach_pilot::prospect::{ProspectInput, ProspectResearch};
use outreach_pilot::scoring::{QualityScorer, RegenerationPolicy};

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    writer: &'a OutputWriter,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        // Completed with a structured report, but the target was missed.
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("outreach_pilot=debug")
    } else {
        EnvFilter::new("outreach_pilot=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<bool> {
    let display = Display::new();
    let writer = OutputWriter::new(cli.output);
    let out = OutputContext {
        display: &display,
        writer: &writer,
    };
    let root = project_root(cli.root)?;

    match cli.command {
        Commands::Init => cmd_init(&out, root).await,
        Commands::Score {
            email,
            first_name,
            last_name,
            company,
            title,
            selling_intent,
            linkedin_confidence,
        } => {
            cmd_score(
                &out,
                email,
                ProspectInput {
                    first_name,
                    last_name,
                    company,
                    title,
                    selling_intent,
                    ..ProspectInput::default()
                },
                linkedin_confidence,
            )
            .await
        }
        Commands::Test {
            num_prospects,
            target_pass_rate,
            seed,
        } => cmd_test(&out, root, num_prospects, target_pass_rate, seed).await,
        Commands::Improve {
            max_iterations,
            target_pass_rate,
            num_prospects,
            no_backup,
            seed,
        } => {
            cmd_improve(
                &out,
                root,
                max_iterations,
                target_pass_rate,
                num_prospects,
                no_backup,
                seed,
            )
            .await
        }
        Commands::Config { action } => cmd_config(&out, root, action).await,
    }
}

fn project_root(override_root: Option<PathBuf>) -> Result<PathBuf> {
    match override_root {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir()?),
    }
}

fn ensure_initialized(paths: &ProjectPaths) -> Result<()> {
    if !paths.pilot_dir.exists() {
        return Err(OutreachError::Config(
            "Project not initialized. Run 'outreach-pilot init' first.".to_string(),
        ));
    }
    Ok(())
}

async fn cmd_init(out: &OutputContext<'_>, root: PathBuf) -> Result<bool> {
    let paths = ProjectPaths::new(root);

    if paths.pilot_dir.exists() {
        if out.writer.format() == OutputFormat::Text {
            out.display
                .print_warning("outreach-pilot is already initialized in this project.");
        }
        return Ok(true);
    }

    paths.ensure_dirs().await?;
    let config = OutreachConfig::default();
    config.save(&paths.pilot_dir).await?;

    let store = PromptStore::new(&paths.agents_path, &paths.tasks_path);
    store.scaffold().await?;

    if out.writer.format() == OutputFormat::Text {
        out.display.print_success("Initialized outreach-pilot.");
        out.display.print_info(&format!(
            "Configuration: {}",
            paths.pilot_dir.join("config.toml").display()
        ));
        out.display.print_info(&format!(
            "Prompts: {}",
            paths.agents_path.parent().unwrap_or(&paths.pilot_dir).display()
        ));
    } else {
        out.writer.emit_message("Initialized outreach-pilot");
    }

    Ok(true)
}

async fn cmd_score(
    out: &OutputContext<'_>,
    email_path: PathBuf,
    prospect: ProspectInput,
    linkedin_confidence: u8,
) -> Result<bool> {
    let email = if email_path.as_os_str() == "-" {
        use tokio::io::AsyncReadExt;
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        buffer
    } else {
        tokio::fs::read_to_string(&email_path).await?
    };

    let research = ProspectResearch {
        linkedin_confidence,
        ..ProspectResearch::default()
    };

    let score = QualityScorer::new().score(&email, &research, &prospect);
    let policy = RegenerationPolicy::default();
    let (regenerate, reason) = policy.should_regenerate(&score);
    let suggestions = if regenerate {
        policy.improvement_suggestions(&score)
    } else {
        Default::default()
    };

    out.writer.emit_score(&ScoreOutput {
        score,
        regenerate,
        reason: reason.to_string(),
        suggestions,
    });

    Ok(true)
}

async fn cmd_test(
    out: &OutputContext<'_>,
    root: PathBuf,
    num_prospects: Option<usize>,
    target_pass_rate: Option<f64>,
    seed: Option<u64>,
) -> Result<bool> {
    let paths = ProjectPaths::new(root);
    ensure_initialized(&paths)?;

    let mut config = OutreachConfig::load(&paths.pilot_dir).await?;
    if let Some(n) = num_prospects {
        config.improvement.num_prospects = n;
    }
    if let Some(target) = target_pass_rate {
        config.improvement.target_pass_rate = target;
    }
    if seed.is_some() {
        config.generator.seed = seed;
    }
    config.validate()?;

    let mut orchestrator = build_orchestrator(config, paths);

    let spinner = text_spinner(out, "Running test suite...");
    let report = orchestrator.test_only().await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    let report = report?;

    out.writer.emit_report(&report);
    Ok(report.success)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_improve(
    out: &OutputContext<'_>,
    root: PathBuf,
    max_iterations: Option<u32>,
    target_pass_rate: Option<f64>,
    num_prospects: Option<usize>,
    no_backup: bool,
    seed: Option<u64>,
) -> Result<bool> {
    let paths = ProjectPaths::new(root);
    ensure_initialized(&paths)?;

    let mut config = OutreachConfig::load(&paths.pilot_dir).await?;
    if let Some(n) = max_iterations {
        config.improvement.max_iterations = n;
    }
    if let Some(target) = target_pass_rate {
        config.improvement.target_pass_rate = target;
    }
    if let Some(n) = num_prospects {
        config.improvement.num_prospects = n;
    }
    if no_backup {
        config.improvement.backup_prompts = false;
    }
    if seed.is_some() {
        config.generator.seed = seed;
    }
    config.validate()?;

    let mut orchestrator = build_orchestrator(config, paths);

    let spinner = text_spinner(out, "Running improvement cycle...");
    let report = orchestrator.run_cycle().await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    let report = report?;

    if out.writer.format() == OutputFormat::Text {
        out.display.print_report_summary(&report);
    }
    out.writer.emit_report(&report);
    Ok(report.success)
}

async fn cmd_config(out: &OutputContext<'_>, root: PathBuf, action: ConfigAction) -> Result<bool> {
    let paths = ProjectPaths::new(root);
    ensure_initialized(&paths)?;

    match action {
        ConfigAction::Show => {
            let config = OutreachConfig::load(&paths.pilot_dir).await?;
            let content = toml::to_string_pretty(&config)
                .map_err(|e| OutreachError::Config(e.to_string()))?;
            println!("{}", content);
        }
        ConfigAction::Reset => {
            OutreachConfig::default().save(&paths.pilot_dir).await?;
            out.display.print_success("Configuration reset to defaults.");
        }
    }
    Ok(true)
}

fn build_orchestrator(config: OutreachConfig, paths: ProjectPaths) -> ImprovementOrchestrator {
    let pipeline = Arc::new(CommandPipeline::new(
        &config.generation.command,
        config.generation.args.clone(),
        config.generation.timeout_secs,
    ));
    let completion = Arc::new(CommandCompletion::new(
        &config.completion.command,
        config.completion.args.clone(),
        config.completion.timeout_secs,
    ));
    ImprovementOrchestrator::new(config, paths, pipeline, completion)
}

fn text_spinner(out: &OutputContext<'_>, message: &str) -> Option<indicatif::ProgressBar> {
    if out.writer.format() == OutputFormat::Text {
        Some(out.display.create_spinner(message))
    } else {
        None
    }
}
