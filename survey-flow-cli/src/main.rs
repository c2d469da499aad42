//! survey-flow - lint and simulate branching surveys
//!
//! # Commands
//! - `survey-flow lint <definition.json>` - report routing and option problems
//! - `survey-flow simulate <definition.json> --answers <answers.json>` - run a scripted respondent
//! - `survey-flow sample <name>` - print a bundled survey as JSON

mod simulate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use survey_flow::{Answers, FlowConfig, FlowController, MemoryBackend, RespondentIntake, SurveyDefinition};

#[derive(Parser)]
#[command(name = "survey-flow")]
#[command(author, version, about = "Lint and simulate branching surveys")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report configuration problems in a survey definition
    Lint {
        /// Survey definition (JSON)
        definition: PathBuf,
    },

    /// Walk a scripted respondent through a survey
    Simulate {
        /// Survey definition (JSON)
        definition: PathBuf,

        /// Answers keyed by question id (JSON)
        #[arg(short, long)]
        answers: PathBuf,

        /// Flow settings (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Respondent name
        #[arg(long, default_value = "Simulated respondent")]
        name: String,

        /// Talk to a running service instead of an in-memory one
        #[cfg(feature = "http")]
        #[arg(long)]
        server: Option<String>,
    },

    /// Print a bundled survey as JSON
    Sample {
        /// One of: early-exit, skip-ahead, site-inspection
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Lint { definition } => lint(&definition),
        Commands::Simulate {
            definition,
            answers,
            config,
            name,
            #[cfg(feature = "http")]
            server,
        } => {
            let definition = Arc::new(read_definition(&definition)?);
            let script: Answers = read_json(&answers)?;
            let config = match config {
                Some(path) => FlowConfig::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => FlowConfig::default(),
            };
            tracing::debug!(survey = %definition.id, ?config, "simulating");
            let intake = RespondentIntake::new(name);
            let mut stdout = std::io::stdout().lock();

            #[cfg(feature = "http")]
            if let Some(server) = server {
                let backend = Arc::new(survey_flow::HttpBackend::new(server, config.service_timeout())?);
                let mut flow = FlowController::new(definition, backend, config)?;
                let outcome = simulate::run(&mut flow, intake, &script, &mut stdout).await?;
                return Ok(exit_code(&outcome));
            }

            let backend = Arc::new(MemoryBackend::new().with_survey(Arc::clone(&definition)));
            let mut flow = FlowController::new(definition, backend, config)?;
            let outcome = simulate::run(&mut flow, intake, &script, &mut stdout).await?;
            Ok(exit_code(&outcome))
        }
        Commands::Sample { name } => {
            let Some(survey) = example_surveys::by_name(&name) else {
                bail!(
                    "Unknown sample '{}'. Available: {}",
                    name,
                    example_surveys::NAMES.join(", ")
                );
            };
            println!("{}", serde_json::to_string_pretty(&survey)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn lint(path: &Path) -> Result<ExitCode> {
    let definition = read_definition(path)?;
    let issues = definition.lint();
    if issues.is_empty() {
        println!("{}: {} questions, no issues", definition.id, definition.len());
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        println!("{}: {}", definition.id, issue);
    }
    println!("{} issue(s)", issues.len());
    Ok(ExitCode::FAILURE)
}

fn exit_code(outcome: &simulate::Outcome) -> ExitCode {
    match outcome {
        simulate::Outcome::Completed { .. } => ExitCode::SUCCESS,
        simulate::Outcome::Stopped { .. } => ExitCode::FAILURE,
    }
}

fn read_definition(path: &Path) -> Result<SurveyDefinition> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
