//! `palate`: validate, map and evaluate palate profiles from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use palate_core::{schema_json, validate, Answers, ConsistencyEvaluator, Evaluation, ExperienceTier};
use palate_runtime::{
    create_provider, LlmProvider, MappingRequest, OnboardingPipeline, ProfileMapper,
    ReplayProvider, RuntimeConfig,
};

#[derive(Parser)]
#[command(name = "palate", version, about = "Palate profile validation, mapping and evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a profile JSON file against the schema
    Validate {
        profile: PathBuf,
    },

    /// Score a profile against onboarding answers
    Evaluate {
        profile: PathBuf,

        /// YAML map of question id to answer text
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Declared wine-knowledge tier (logged only)
        #[arg(long)]
        experience: Option<ExperienceTier>,

        /// Runtime configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Include the per-check diagnostics
        #[arg(long)]
        diagnostics: bool,
    },

    /// Map onboarding answers to a profile through the configured model
    Map {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        experience: ExperienceTier,

        /// YAML map of question id to answer text
        #[arg(long)]
        answers: PathBuf,

        /// Use the contents of this file as the model reply
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Runtime configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also evaluate the mapped profile
        #[arg(long)]
        evaluate: bool,
    },

    /// Print the embedded profile JSON Schema
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Validate { profile } => run_validate(&profile),
        Command::Evaluate {
            profile,
            answers,
            experience,
            config,
            diagnostics,
        } => run_evaluate(
            &profile,
            answers.as_deref(),
            experience,
            config.as_deref(),
            diagnostics,
        ),
        Command::Map {
            user_id,
            experience,
            answers,
            replay,
            config,
            evaluate,
        } => {
            let request = MappingRequest::new(user_id, experience, load_answers(&answers)?);
            run_map(request, replay.as_deref(), config.as_deref(), evaluate).await
        }
        Command::Schema => {
            println!("{}", schema_json());
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("palate=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_validate(path: &Path) -> Result<()> {
    let value = load_json(path)?;
    match validate(&value) {
        Ok(profile) => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Err(violation) => {
            if violation.additional > 0 {
                tracing::info!(additional = violation.additional, "further violations not shown");
            }
            bail!("{}: {}", path.display(), violation)
        }
    }
}

fn run_evaluate(
    path: &Path,
    answers: Option<&Path>,
    experience: Option<ExperienceTier>,
    config: Option<&Path>,
    diagnostics: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let profile = validate(&load_json(path)?)
        .with_context(|| format!("{} is not a valid profile", path.display()))?;
    let answers = answers.map(load_answers).transpose()?;

    let evaluation = ConsistencyEvaluator::with_config(config.evaluator)?.evaluate(
        &profile,
        answers.as_ref(),
        experience,
    );

    println!("{}", render_evaluation(&evaluation, diagnostics)?);
    Ok(())
}

async fn run_map(
    request: MappingRequest,
    replay: Option<&Path>,
    config: Option<&Path>,
    evaluate: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let provider: Arc<dyn LlmProvider> = match replay {
        Some(path) => {
            let reply = fs::read_to_string(path)
                .with_context(|| format!("failed to read replay file {}", path.display()))?;
            Arc::new(ReplayProvider::new(reply))
        }
        None => create_provider(&config.provider, None)?,
    };

    ensure_healthy(provider.as_ref()).await?;
    tracing::info!(provider = provider.name(), user_id = %request.user_id, "mapping answers");

    let output = if evaluate {
        let pipeline = OnboardingPipeline::builder()
            .provider(provider)
            .config(config)
            .build()?;
        serde_json::to_string_pretty(&pipeline.run(&request).await?)?
    } else {
        let mapper = ProfileMapper::with_config(provider, config.completion());
        serde_json::to_string_pretty(&mapper.map(&request).await?)?
    };

    println!("{}", output);
    Ok(())
}

/// Refuse to map through a provider that cannot serve a request.
async fn ensure_healthy(provider: &dyn LlmProvider) -> Result<()> {
    if !provider.health_check().await {
        bail!("provider '{}' failed its health check (is an API key configured?)", provider.name());
    }
    Ok(())
}

/// Checks are a diagnostics payload; by default only the score and text show.
fn render_evaluation(evaluation: &Evaluation, diagnostics: bool) -> Result<String> {
    let rendered = if diagnostics {
        serde_json::to_string_pretty(evaluation)?
    } else {
        serde_json::to_string_pretty(&serde_json::json!({
            "confidence": evaluation.confidence,
            "commentary": evaluation.commentary,
        }))?
    };
    Ok(rendered)
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn load_json(path: &Path) -> Result<serde_json::Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not JSON", path.display()))
}

fn load_answers(path: &Path) -> Result<Answers> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read answers {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Answers::new());
    }
    serde_yaml::from_str(&contents)
        .with_context(|| format!("{} is not a YAML map of question id to text", path.display()))
}
