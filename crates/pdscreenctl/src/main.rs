//! pdscreen control - CLI client for the screening daemon
//!
//! Sends symptom and voice-feature payloads to pdscreend and keeps a
//! local history of results.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdscreenctl::client::{DEFAULT_URL, URL_ENV};
use pdscreenctl::commands::{self, PredictArgs};
use pdscreenctl::errors::EXIT_GENERAL_ERROR;
use pdscreenctl::payload::Severity;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdscreenctl")]
#[command(about = "Parkinson's disease risk screening client", long_about = None)]
#[command(version)]
struct Cli {
    /// pdscreend base URL
    #[arg(long, global = true, env = URL_ENV, default_value = DEFAULT_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a prediction from the daemon
    Predict {
        /// Free-text symptom description
        #[arg(long)]
        symptoms: Option<String>,

        /// Symptom severity
        #[arg(long, value_enum)]
        severity: Option<Severity>,

        /// Checklist symptom (repeatable, e.g. --common tremor --common rigidity)
        #[arg(long = "common")]
        common: Vec<String>,

        /// JSON file with voice features
        #[arg(long)]
        features_file: Option<PathBuf>,

        /// Single voice feature as name=value (repeatable)
        #[arg(long = "feature")]
        features: Vec<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,

        /// Do not record the result in local history
        #[arg(long)]
        no_history: bool,
    },

    /// Run the pipeline locally against a model artifact
    Evaluate {
        /// Model artifact (JSON)
        #[arg(long)]
        model: PathBuf,

        /// Override the numeric feature threshold
        #[arg(long)]
        threshold: Option<usize>,

        /// Print the raw JSON decision
        #[arg(long)]
        json: bool,

        /// Payload file, in the same shape as a /predict body
        payload: PathBuf,
    },

    /// Show past results
    History {
        /// Number of entries to list
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Delete all saved results
        #[arg(long)]
        clear: bool,
    },

    /// Check daemon health and model info
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Predict {
            symptoms,
            severity,
            common,
            features_file,
            features,
            json,
            no_history,
        } => {
            commands::predict(PredictArgs {
                url: cli.url,
                symptoms,
                severity,
                common,
                features_file,
                features,
                json,
                no_history,
            })
            .await
        }
        Commands::Evaluate {
            model,
            threshold,
            json,
            payload,
        } => commands::evaluate(&model, &payload, threshold, json),
        Commands::History { limit, clear } => commands::history(limit, clear),
        Commands::Health => commands::health(&cli.url).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            EXIT_GENERAL_ERROR
        }
    };
    std::process::exit(code);
}
