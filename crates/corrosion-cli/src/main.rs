//! `corrosion` -- corrosion-rate prediction and mitigation advice.
//!
//! - `corrosion predict` -- classify one observation, optionally with LLM advice.
//! - `corrosion materials` -- ask the LLM for candidate materials.
//! - `corrosion ask` -- send a raw prompt through the provider gateway.
//! - `corrosion check` -- load every artifact and report readiness.

mod display;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use corrosion_ai::CorrosionPredictor;
use corrosion_core::{AppConfig, MaterialQuery, ProviderKind, RawObservation};
use corrosion_llm::{LlmGateway, main_prompt, material_report, material_selection_prompt};
use tracing::info;

#[derive(Parser)]
#[command(name = "corrosion", about = "Corrosion-rate prediction and mitigation advice", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML config file. Without one, model paths resolve against the working directory.
    #[arg(short, long, global = true, env = "CORROSION_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    keys: KeyArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct KeyArgs {
    /// Groq API keys, comma-separated; used round-robin.
    #[arg(long, env = "GROQ_API_KEYS", value_delimiter = ',', hide_env_values = true)]
    groq_keys: Vec<String>,

    /// OpenRouter API keys, comma-separated; used round-robin.
    #[arg(long, env = "OPENROUTER_API_KEYS", value_delimiter = ',', hide_env_values = true)]
    openrouter_keys: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the corrosion-rate class for one observation.
    Predict(PredictArgs),
    /// Recommend materials for a set of operating conditions.
    Materials(MaterialArgs),
    /// Send a prompt to the LLM gateway and print the reply.
    Ask {
        prompt: String,
        /// Primary provider (groq or openrouter); the other is the fallback.
        #[arg(long)]
        provider: Option<ProviderKind>,
    },
    /// Load all artifacts and the embedding model, then report readiness.
    Check,
}

#[derive(Args)]
struct PredictArgs {
    /// Environment as named in the training data, e.g. "seawater".
    #[arg(long)]
    environment: String,
    /// Temperature in °C.
    #[arg(long)]
    temperature: f64,
    /// Concentration in percent (0-100).
    #[arg(long)]
    concentration: f64,
    /// Alloy UNS designation, e.g. S31600.
    #[arg(long)]
    alloy: String,
    /// Free-text description of the exposure conditions.
    #[arg(long, default_value = "")]
    condition: String,
    /// Also print the assembled classifier input row.
    #[arg(long)]
    features: bool,
    /// Ask the LLM for five bullet points of mitigation advice.
    #[arg(long)]
    advise: bool,
    #[arg(long)]
    provider: Option<ProviderKind>,
}

#[derive(Args)]
struct MaterialArgs {
    #[arg(long)]
    environment: String,
    #[arg(long, default_value_t = 7.0)]
    ph: f64,
    /// Chloride presence, e.g. "none", "low", "high".
    #[arg(long, default_value = "none")]
    chloride: String,
    /// °C
    #[arg(long, default_value_t = 25.0)]
    temperature: f64,
    /// bar
    #[arg(long, default_value_t = 1.0)]
    pressure: f64,
    #[arg(long, default_value = "stagnant")]
    flow: String,
    /// Dissimilar metals in contact, if any.
    #[arg(long, default_value = "none")]
    galvanic_contact: String,
    /// Required design life in years.
    #[arg(long, default_value_t = 20)]
    design_life: u32,
    #[arg(long, default_value = "standard")]
    maintenance: String,
    #[arg(long, default_value = "moderate")]
    budget: String,
    #[arg(long, default_value = "")]
    notes: String,
    /// Write a plain-text report to this file as well.
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    provider: Option<ProviderKind>,
}

impl From<&MaterialArgs> for MaterialQuery {
    fn from(args: &MaterialArgs) -> Self {
        Self {
            environment: args.environment.clone(),
            ph: args.ph,
            chloride: args.chloride.clone(),
            temperature: args.temperature,
            pressure: args.pressure,
            flow: args.flow.clone(),
            galvanic_contact: args.galvanic_contact.clone(),
            design_life_years: args.design_life,
            maintenance: args.maintenance.clone(),
            budget: args.budget.clone(),
            notes: args.notes.clone(),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::with_base_dir(
            &std::env::current_dir().context("resolving working directory")?,
        ),
    };
    let keys = &cli.keys;
    if !keys.groq_keys.is_empty() {
        config.llm.groq.api_keys = keys.groq_keys.clone();
    }
    if !keys.openrouter_keys.is_empty() {
        config.llm.openrouter.api_keys = keys.openrouter_keys.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
    info!("corrosion v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Predict(args) => predict(&config, args).await,
        Commands::Materials(args) => materials(&config, args).await,
        Commands::Ask { prompt, provider } => {
            let gateway = LlmGateway::from_config(&config.llm);
            println!("{}", gateway.invoke_llm(prompt, *provider).await);
            Ok(())
        }
        Commands::Check => check(&config).await,
    }
}

async fn predict(config: &AppConfig, args: &PredictArgs) -> anyhow::Result<()> {
    let observation = RawObservation::new(
        &args.environment,
        args.temperature,
        args.concentration,
        &args.alloy,
        &args.condition,
    )?;
    let predictor = CorrosionPredictor::from_config(config);

    // Embedding and inference are CPU-bound.
    let want_features = args.features;
    let (result, features) = tokio::task::spawn_blocking(move || {
        let features = if want_features {
            Some(predictor.features(&observation)?)
        } else {
            None
        };
        predictor
            .predict_observation(observation)
            .map(|result| (result, features))
    })
    .await??;

    display::print_prediction_card(&result.to_record_batch()?);
    if let Some(features) = features {
        display::print_feature_card(&features.to_record_batch()?);
    }

    if args.advise {
        let gateway = LlmGateway::from_config(&config.llm);
        let advice = gateway
            .invoke_llm(&main_prompt(&result), args.provider)
            .await;
        println!("Mitigation advice\n{advice}");
    }
    Ok(())
}

async fn materials(config: &AppConfig, args: &MaterialArgs) -> anyhow::Result<()> {
    let query = MaterialQuery::from(args);
    let gateway = LlmGateway::from_config(&config.llm);
    let recommendation = gateway
        .invoke_llm(&material_selection_prompt(&query), args.provider)
        .await;
    println!("{recommendation}");

    if let Some(path) = &args.output {
        std::fs::write(path, material_report(&query, &recommendation))
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "wrote material selection report");
    }
    Ok(())
}

async fn check(config: &AppConfig) -> anyhow::Result<()> {
    println!("Artifacts");
    for (role, path) in config.artifacts.entries() {
        let state = if path.exists() { "ok" } else { "MISSING" };
        println!("  {role:<12} {state:<8} {}", path.display());
    }
    println!();

    println!("LLM providers (default: {})", config.llm.default_provider);
    for kind in [ProviderKind::Groq, ProviderKind::OpenRouter] {
        let settings = config.llm.provider(kind);
        println!(
            "  {:<12} {} keys, {} models, {}",
            kind.as_str(),
            settings.api_keys.len(),
            settings.models.len(),
            settings.base_url
        );
    }
    println!();

    let predictor = CorrosionPredictor::from_config(config);
    tokio::task::spawn_blocking(move || predictor.warm_up())
        .await?
        .context("loading models")?;
    println!("Models loaded; ready to predict.");
    Ok(())
}
