//! setpoint-advisor: one-shot shift recommendation
//!
//! Reads a shift context, loads the trained surrogates, runs the anomaly
//! gate and the optimizer, and prints one JSON object on stdout.
//!
//! # Usage
//!
//! ```bash
//! setpoint-advisor '{"ambient_temperature_c": 28, "humidity_pct": 61}' ml/artifacts
//!
//! # Quick run, human-readable
//! setpoint-advisor --trials 50 --summary '{"raw_material_quality_index": 0.8}'
//! ```
//!
//! # Environment Variables
//!
//! - `SETPOINT_ADVISOR_CONFIG`: path to an `advisor_config.toml`
//! - `RUST_LOG`: logging level (default: warn). Logs always go to stderr.

use anyhow::{Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use setpoint_advisor::{parse_context, AdvisorConfig, RecommendOptions, RecommendationOrchestrator};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "setpoint-advisor")]
#[command(about = "Recommend steel plant shift setpoints from trained surrogate models")]
#[command(version)]
struct CliArgs {
    /// Shift context as a JSON object of numeric fields
    context: String,

    /// Directory holding the trained artifacts (default: [artifacts] dir)
    artifact_dir: Option<PathBuf>,

    /// Optimization trials (default: [optimizer] n_trials)
    #[arg(long)]
    trials: Option<usize>,

    /// Sampler seed (default: [optimizer] seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Uniform exploration trials before model-guided search
    #[arg(long)]
    startup_trials: Option<usize>,

    /// Do not run the anomaly gate
    #[arg(long)]
    skip_anomaly_check: bool,

    /// Print a human-readable summary instead of JSON
    #[arg(long)]
    summary: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "SETPOINT_ADVISOR_LOG_JSON")]
    log_json: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(), // --help / --version
        Err(e) => {
            println!("{}", usage_error_body(&e));
            return ExitCode::FAILURE;
        }
    };
    init_logging(args.log_json);

    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", error_body(&e));
            ExitCode::FAILURE
        }
    }
}

/// stdout body for a failed run: full cause chain plus debug rendering.
fn error_body(e: &anyhow::Error) -> serde_json::Value {
    serde_json::json!({
        "error": format!("{e:#}"),
        "traceback": format!("{e:?}"),
    })
}

/// stdout body for bad command-line usage.
fn usage_error_body(e: &clap::Error) -> serde_json::Value {
    let message = e.kind().as_str().unwrap_or("invalid arguments");
    serde_json::json!({
        "error": format!("Usage: setpoint-advisor '<context_json>' [artifact_dir] ({message})"),
    })
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: &CliArgs) -> Result<String> {
    // Malformed input fails before any artifact is loaded
    let context = parse_context(&args.context).context("Invalid JSON context")?;

    let mut config = AdvisorConfig::load();
    if let Some(trials) = args.trials {
        config.optimizer.n_trials = trials;
    }
    if let Some(seed) = args.seed {
        config.optimizer.seed = seed;
    }
    if let Some(startup) = args.startup_trials {
        config.optimizer.n_startup_trials = startup;
    }
    config.validate().context("invalid settings")?;

    let dir = args
        .artifact_dir
        .clone()
        .unwrap_or_else(|| config.artifacts.dir.clone());
    info!(dir = %dir.display(), fields = context.len(), "Recommending setpoints");

    let orchestrator = RecommendationOrchestrator::from_artifacts(&dir, &config);
    let options = RecommendOptions::new(config.optimizer.n_trials)
        .skip_anomaly_check(args.skip_anomaly_check);
    let result = orchestrator
        .recommend(&context, options)
        .context("optimization failed")?;

    if args.summary {
        Ok(result.to_string())
    } else {
        Ok(serde_json::to_string_pretty(&result.to_report())?)
    }
}
