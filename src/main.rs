//! `affect-lab` command line.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use affect_lab::adapters::ai::{OpenAIClient, OpenAIConfig};
use affect_lab::adapters::dataset::{augment_file, load_records};
use affect_lab::adapters::output::CsvResultSink;
use affect_lab::application::ExperimentRunner;
use affect_lab::config::{AppConfig, LogFormat, LoggingConfig};
use affect_lab::domain::affect::EmotionLabel;
use affect_lab::domain::experiment::{preset, preset_names, ExperimentDefinition};

#[derive(Parser)]
#[command(
    name = "affect-lab",
    version,
    about = "Predict student emotional state turn by turn across tutoring dialogues"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an experiment over a dataset and write one CSV row per turn
    Run(RunArgs),
    /// List built-in experiment presets
    Presets,
    /// Add random skill and math anxiety levels to a dataset
    Augment(AugmentArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("experiment").required(true).args(["preset", "definition"])))]
struct RunArgs {
    /// Built-in preset name (see `affect-lab presets`)
    #[arg(long)]
    preset: Option<String>,

    /// YAML experiment definition
    #[arg(long)]
    definition: Option<PathBuf>,

    /// JSON-records dataset
    #[arg(long)]
    dataset: PathBuf,

    /// Number of repetitions over the dataset
    #[arg(long)]
    times: Option<u32>,

    /// Seed for first-turn states
    #[arg(long)]
    seed: Option<u64>,

    /// Experiment name, also the output file stem
    #[arg(long)]
    name: Option<String>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// State presented on each conversation's first turn instead of a random label
    #[arg(long)]
    initial_state: Option<String>,
}

#[derive(Parser, Debug)]
struct AugmentArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long)]
    seed: Option<u64>,

    /// Overwrite an existing output file
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    match cli.cmd {
        Command::Run(args) => run(config, args).await,
        Command::Presets => {
            for (name, mode) in preset_names() {
                println!("{name}\t{mode}");
            }
            Ok(())
        }
        Command::Augment(args) => augment(args).await,
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: AppConfig, args: RunArgs) -> Result<()> {
    let definition = resolve_definition(&config, &args).await?;
    config.validate().context("invalid configuration")?;

    let api_key = config
        .completion
        .api_key
        .as_ref()
        .map(|key| key.expose_secret().clone())
        .context("completion API key is not set")?;
    let client = OpenAIClient::new(
        OpenAIConfig::new(api_key)
            .with_base_url(config.completion.base_url.clone())
            .with_timeout(config.completion.timeout()),
    )
    .context("failed to build HTTP client")?;

    let records = load_records(&args.dataset).await?;
    let sink = CsvResultSink::new(&config.output.dir);

    let mut runner = ExperimentRunner::new(definition, Arc::new(client), Arc::new(sink))?
        .with_retry_policy(config.completion.retry.policy());
    let report = runner.run(&records).await?;

    println!(
        "{}: {} turns ({} skipped pairs, {} unknown, {} failed calls, {} retries) -> {}",
        report.experiment,
        report.turns_emitted(),
        report.pairs_skipped,
        report.unknown_predictions,
        report.failed_calls,
        report.retries,
        report.location
    );
    Ok(())
}

async fn resolve_definition(config: &AppConfig, args: &RunArgs) -> Result<ExperimentDefinition> {
    let mut definition = match (&args.preset, &args.definition) {
        (Some(name), _) => match preset(name) {
            Some(definition) => definition?.with_model(config.completion.model.clone()),
            None => bail!("unknown preset '{name}'; see `affect-lab presets`"),
        },
        (None, Some(path)) => {
            let source = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            ExperimentDefinition::from_yaml(&source)
                .with_context(|| format!("invalid experiment definition {}", path.display()))?
        }
        (None, None) => bail!("either --preset or --definition is required"),
    };

    if let Some(times) = args.times {
        definition = definition.with_repetitions(times);
    }
    if let Some(seed) = args.seed {
        definition = definition.with_seed(seed);
    }
    if let Some(name) = &args.name {
        definition.name = name.clone();
    }
    if let Some(model) = &args.model {
        definition = definition.with_model(model.clone());
    }
    if let Some(state) = &args.initial_state {
        let label = EmotionLabel::new(state).context("invalid --initial-state")?;
        definition = definition.with_initial_state(label);
    }
    Ok(definition)
}

async fn augment(args: AugmentArgs) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let summary = augment_file(&args.input, &args.output, args.force, &mut rng).await?;
    println!(
        "{} records, {} values added -> {}",
        summary.records,
        summary.values_added,
        args.output.display()
    );
    Ok(())
}
