use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emotion_recognizer::analysis::FeatureExtractor;
use emotion_recognizer::audio::DecoderChain;
use emotion_recognizer::training::{self, LabelMap};
use emotion_recognizer::{init_logging, AppConfig, InferenceService};

#[derive(Parser, Debug)]
#[command(
    name = "emotion_cli",
    about = "Train, query and serve the speech emotion classifier"
)]
struct Cli {
    /// Configuration file (defaults to assets/emotion_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a model from a labelled corpus and print the held-out report
    Train {
        /// Corpus root containing one folder per label
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Where to write the model artifact
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Classify one audio file and print the result as JSON
    Predict {
        #[arg(long)]
        model: Option<PathBuf>,
        audio: PathBuf,
    },
    /// Print the named feature vector of one audio file as JSON
    Extract { audio: PathBuf },
    /// Serve the inference endpoint over HTTP
    #[cfg(feature = "http")]
    Serve {
        #[arg(long)]
        model: Option<PathBuf>,
        /// Bind address, e.g. 127.0.0.1:8000
        #[arg(long)]
        addr: Option<String>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "info" });

    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Train { dataset, output } => run_train(&config, dataset, output),
        Commands::Predict { model, audio } => run_predict(&config, model, audio),
        Commands::Extract { audio } => run_extract(audio),
        #[cfg(feature = "http")]
        Commands::Serve { model, addr } => run_serve(&config, model, addr),
    }
}

fn run_train(config: &AppConfig, dataset: Option<PathBuf>, output: Option<PathBuf>) -> Result<ExitCode> {
    let root = dataset.unwrap_or_else(|| config.dataset.root.clone());
    let output = output.unwrap_or_else(|| config.model.path.clone());
    let label_map = LabelMap::from_config(&config.dataset);

    println!("Loading dataset from {}...", root.display());
    let outcome = training::train_from_corpus(&root, &label_map, &config.training, &output)?;

    println!(
        "Trained on {} samples, evaluated on {}",
        outcome.train_rows, outcome.test_rows
    );
    println!("\nClassification Report:\n{}", outcome.report);
    println!("Model saved to {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn load_service(config: &AppConfig, model: Option<PathBuf>) -> Result<InferenceService> {
    let path = model.unwrap_or_else(|| config.model.path.clone());
    InferenceService::load(&path).with_context(|| format!("loading model {}", path.display()))
}

fn run_predict(config: &AppConfig, model: Option<PathBuf>, audio: PathBuf) -> Result<ExitCode> {
    let service = load_service(config, model)?;
    let bytes = std::fs::read(&audio).with_context(|| format!("reading {}", audio.display()))?;

    let response = service.predict_bytes(&bytes);
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.is_error() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn run_extract(audio: PathBuf) -> Result<ExitCode> {
    let waveform = DecoderChain::default()
        .decode_file(&audio)
        .with_context(|| format!("decoding {}", audio.display()))?;
    let features = FeatureExtractor::new(waveform.sample_rate()).extract(waveform.samples());
    println!("{}", serde_json::to_string_pretty(&features.named())?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "http")]
fn run_serve(config: &AppConfig, model: Option<PathBuf>, addr: Option<String>) -> Result<ExitCode> {
    let service = std::sync::Arc::new(load_service(config, model)?);
    let mut server = config.server.clone();
    if let Some(addr) = addr {
        server.bind_addr = addr;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(emotion_recognizer::http::run_server(service, &server))?;
    Ok(ExitCode::SUCCESS)
}
