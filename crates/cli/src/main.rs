#![deny(unsafe_code)]
//! CLI binary for the plume tracker.
//!
//! Subcommands:
//! - `run`: drive one simulation N steps, print per-step summaries and the final state
//! - `field`: generate one field realization at a time step, print stats or JSON
//! - `config`: print the effective configuration as JSON

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use plume_core::{DVec2, SimConfig};
use plume_sim::Simulation;
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "plume", about = "AUV plume-tracking simulator")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log per-step and planner detail to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Configuration sources shared by every subcommand.
#[derive(clap::Args)]
struct ConfigArgs {
    /// JSON config file; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Config overrides as a JSON string, applied after --config.
    #[arg(long, default_value = "{}")]
    params: String,

    /// PRNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control loop for N steps or until the energy budget is spent.
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Number of steps to attempt.
        #[arg(short, long, default_value_t = 100)]
        steps: usize,

        /// Start position as "x,y".
        #[arg(long, value_parser = parse_point)]
        start: Option<DVec2>,
    },
    /// Generate one concentration and current realization at time step T.
    Field {
        #[command(flatten)]
        config: ConfigArgs,

        /// Time step to generate.
        #[arg(short, long, default_value_t = 0)]
        time: u64,
    },
    /// Print the effective configuration.
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn parse_point(s: &str) -> Result<DVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
    };
    Ok(DVec2::new(parse(x)?, parse(y)?))
}

fn load_config(args: &ConfigArgs) -> Result<SimConfig, CliError> {
    let mut merged = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<Value>(&text)
                .map_err(|e| CliError::Input(format!("invalid config {}: {e}", path.display())))?
        }
        None => Value::Object(Default::default()),
    };
    let overrides: Value = serde_json::from_str(&args.params)
        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
    match (&mut merged, overrides) {
        (Value::Object(base), Value::Object(extra)) => base.extend(extra),
        _ => return Err(CliError::Input("config must be a JSON object".into())),
    }

    let mut config = SimConfig::from_json(&merged);
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run {
            config,
            steps,
            start,
        } => {
            let mut config = load_config(&config)?;
            if let Some(start) = start {
                config.start = start;
            }
            let mut sim = Simulation::new(config)?;
            let report = sim.run(steps);
            let state = sim.state();

            if cli.json {
                let info = serde_json::json!({
                    "summaries": report.summaries,
                    "status": report.status,
                    "state": state,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for s in &report.summaries {
                    println!(
                        "step {:>5}  pos ({:>8.3}, {:>8.3})  conc {:.4}  energy {:.2}",
                        s.step, s.position.x, s.position.y, s.concentration, s.energy
                    );
                }
                eprintln!(
                    "ran {} of {steps} steps; {:?} at ({:.3}, {:.3}) with {:.2} energy, {} samples",
                    report.len(),
                    report.status,
                    state.position.x,
                    state.position.y,
                    state.energy,
                    state.sample_count
                );
            }
        }
        Command::Field { config, time } => {
            let mut sim = Simulation::new(load_config(&config)?)?;
            let view = sim.query_field(time);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let values: Vec<f64> = view.concentration.iter().flatten().copied().collect();
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
                let speed = view
                    .u
                    .iter()
                    .flatten()
                    .zip(view.v.iter().flatten())
                    .map(|(u, v)| u.hypot(*v))
                    .fold(0.0, f64::max);
                println!(
                    "t={time} {}x{}  concentration min {min:.4} max {max:.4} mean {mean:.4}  max current {speed:.3}",
                    view.xs.len(),
                    view.ys.len()
                );
            }
        }
        Command::Config { config } => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
