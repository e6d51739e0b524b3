//! Command implementations for pdscreenctl.
//!
//! Each command returns the process exit code.

use crate::client::{DaemonClient, PredictOutcome};
use crate::errors::{exit_code_for_status, EXIT_DAEMON_UNAVAILABLE, EXIT_SUCCESS};
use crate::history::{History, HistoryEntry};
use crate::payload::{PayloadBuilder, Severity};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pdscreen_common::features::{SEVERITY_KEY, SYMPTOM_TEXT_KEY};
use pdscreen_common::{load_classifier, Decision, DecisionPolicy, FEATURE_NAMES};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs for `predict`
#[derive(Debug, Default)]
pub struct PredictArgs {
    pub url: String,
    pub symptoms: Option<String>,
    pub severity: Option<Severity>,
    pub common: Vec<String>,
    pub features_file: Option<PathBuf>,
    pub features: Vec<String>,
    pub json: bool,
    pub no_history: bool,
}

impl PredictArgs {
    pub fn payload(&self) -> Result<Value> {
        let mut builder = PayloadBuilder::new();
        if let Some(path) = &self.features_file {
            builder = builder.features_file(path)?;
        }
        for assignment in &self.features {
            builder = builder.feature(assignment)?;
        }
        if let Some(text) = &self.symptoms {
            builder = builder.symptoms(text);
        }
        if let Some(severity) = self.severity {
            builder = builder.severity(severity);
        }
        if !self.common.is_empty() {
            builder = builder.common_symptoms(&self.common);
        }
        Ok(builder.build())
    }
}

/// Plain-text verdict for a decision
pub fn verdict_text(decision: &Decision) -> String {
    let label = if decision.is_positive() {
        "Parkinson's suspected"
    } else {
        "No Parkinson's detected"
    };
    format!("{} - Probability: {:.1}%", label, decision.probability * 100.0)
}

fn print_verdict(decision: &Decision) {
    let text = verdict_text(decision);
    if decision.is_positive() {
        println!("{}", text.red().bold());
    } else {
        println!("{}", text.green().bold());
    }
}

/// Severity as sent, whether it came from `--severity` or a features file
pub fn payload_severity(payload: &Value) -> Option<&str> {
    payload
        .get(SEVERITY_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Warning for a payload that can only ever produce the default negative
pub fn missing_input_warning(payload: &Value) -> Option<&'static str> {
    let has_symptoms = payload
        .get(SYMPTOM_TEXT_KEY)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    let has_features = FEATURE_NAMES.iter().any(|name| payload.get(*name).is_some());

    if has_symptoms || has_features {
        None
    } else {
        Some("no symptoms or voice features given (use --symptoms, --feature or --features-file)")
    }
}

fn record_history(decision: &Decision, payload: &Value) -> Result<()> {
    let mut history = History::load(&History::default_path()?)?;
    history.record(HistoryEntry::from_decision(
        decision,
        payload_severity(payload),
    ));
    history.save()
}

pub async fn predict(args: PredictArgs) -> Result<i32> {
    let payload = args.payload()?;
    if let Some(warning) = missing_input_warning(&payload) {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    let client = DaemonClient::new(&args.url)?;

    let outcome = match client.predict(&payload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red(), e);
            return Ok(EXIT_DAEMON_UNAVAILABLE);
        }
    };

    match outcome {
        PredictOutcome::Decision(decision) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                print_verdict(&decision);
            }

            if !args.no_history {
                if let Err(e) = record_history(&decision, &payload) {
                    eprintln!("{} result not saved to history: {:#}", "warning:".yellow(), e);
                }
            }
            Ok(EXIT_SUCCESS)
        }
        PredictOutcome::Rejected { status, body } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                eprintln!("{} {} (HTTP {})", "error:".red(), body.error, status);
                eprintln!("  {}", body.detail.dimmed());
            }
            Ok(exit_code_for_status(status))
        }
    }
}

/// Run the pipeline in-process against a local model artifact
pub fn evaluate(model: &Path, payload: &Path, threshold: Option<usize>, json: bool) -> Result<i32> {
    let classifier = load_classifier(model)
        .with_context(|| format!("Failed to load model {}", model.display()))?;
    let mut policy = DecisionPolicy::new(classifier);
    if let Some(threshold) = threshold {
        policy = policy.with_numeric_threshold(threshold);
    }

    let content = fs::read_to_string(payload)
        .with_context(|| format!("Failed to read {}", payload.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", payload.display()))?;

    let evaluation = match policy.evaluate(&value) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);
            let status = if e.is_client_error() { 400 } else { 500 };
            return Ok(exit_code_for_status(status));
        }
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation.decision)?);
    } else {
        print_verdict(&evaluation.decision);
        println!(
            "  decided by: {}  (non-zero features: {})",
            evaluation.source.as_str(),
            evaluation.non_zero_count
        );
    }
    Ok(EXIT_SUCCESS)
}

/// Show or clear the local result history
pub fn history(limit: usize, clear: bool) -> Result<i32> {
    let path = History::default_path()?;

    if clear {
        let history = History::empty(&path);
        history.save()?;
        println!("History cleared ({})", history.path().display());
        return Ok(EXIT_SUCCESS);
    }

    let history = History::load(&path)?;
    let summary = history.summary();
    println!("Total tests:    {}", summary.total);
    println!("Positive:       {}", summary.positive.to_string().red());
    println!("Negative:       {}", summary.negative.to_string().green());

    if summary.total == 0 {
        return Ok(EXIT_SUCCESS);
    }

    println!();
    println!("{:<26} {:<32} {:>11}", "Date", "Result", "Probability");
    for entry in history.entries().iter().take(limit) {
        let result = if entry.is_positive() {
            "Parkinson's"
        } else {
            "No Parkinson's"
        };
        println!(
            "{:<26} {:<32} {:>10}%",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            format!("{} ({})", result, entry.severity),
            entry.probability
        );
    }
    Ok(EXIT_SUCCESS)
}

pub async fn health(url: &str) -> Result<i32> {
    let client = DaemonClient::new(url)?;
    let health = match client.health().await {
        Ok(health) => health,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red(), e);
            return Ok(EXIT_DAEMON_UNAVAILABLE);
        }
    };

    println!("pdscreend {} ({})", health.version, health.status.green());
    println!("  uptime:      {}s", health.uptime_seconds);
    println!(
        "  model:       {} {} ({} features)",
        health.model.kind, health.model.version, health.model.feature_count
    );
    println!(
        "  probability: {}",
        if health.model.supports_probability {
            "calibrated"
        } else {
            "not available (fixed 1.0)"
        }
    );
    Ok(EXIT_SUCCESS)
}
