//! DevSim - Device Behavior Simulator CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use devsim::device::ValueMap;
use devsim::util::config::load_config;
use devsim::util::logger;
use devsim::{check_script, parse_value_map, simulate, NAME, VERSION};

/// Script-driven device behavior engine for IoT simulation
#[derive(Parser, Debug)]
#[command(name = "devsim")]
#[command(author = "DevSim Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a behavior script for one simulated device
    Run {
        /// Script identifier (file name relative to the scripts directory)
        #[arg(value_name = "SCRIPT")]
        script: String,

        /// Scripts directory (overrides devsim.toml)
        #[arg(long, value_name = "DIR")]
        scripts_dir: Option<PathBuf>,

        /// Simulation context as inline JSON, e.g. '{"device_id":"sim-1"}'
        #[arg(long, value_name = "JSON")]
        context: Option<String>,

        /// Initial device state as a JSON file
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,

        /// Initial device properties as a JSON file
        #[arg(long, value_name = "FILE")]
        properties: Option<PathBuf>,

        /// Number of ticks to run
        #[arg(long, default_value_t = 1)]
        ticks: u32,

        /// Delay between ticks in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },

    /// Check a script for syntax errors without executing it
    Check {
        /// Script identifier to check
        #[arg(value_name = "SCRIPT")]
        script: String,

        /// Scripts directory (overrides devsim.toml)
        #[arg(long, value_name = "DIR")]
        scripts_dir: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(std::path::Path::new(".")).context("Failed to load devsim.toml")?;

    if args.verbose {
        logger::init_debug();
    } else {
        match config.log.level.parse::<logger::LogLevel>() {
            Ok(level) => logger::init_with_level(level),
            Err(_) => logger::init_cli(),
        }
    }

    match args.command {
        Commands::Run {
            script,
            scripts_dir,
            context,
            state,
            properties,
            ticks,
            interval_ms,
        } => {
            let dir = scripts_dir.unwrap_or_else(|| config.scripts.dir.clone());
            let context = match context {
                Some(json) => parse_value_map(&json).context("Invalid --context JSON")?,
                None => ValueMap::new(),
            };
            let initial_state = load_value_map(state.as_deref())?;
            let initial_properties = load_value_map(properties.as_deref())?;

            let (final_state, final_properties) = simulate(
                &dir,
                &script,
                &context,
                initial_state,
                initial_properties,
                ticks,
                Duration::from_millis(interval_ms),
            )
            .with_context(|| format!("Failed to run: {}", script))?;

            println!("{}", render_snapshots(&final_state, &final_properties)?);
        }
        Commands::Check { script, scripts_dir } => {
            let dir = scripts_dir.unwrap_or_else(|| config.scripts.dir.clone());
            check_script(&dir, &script).with_context(|| format!("Failed to check: {}", script))?;
            eprintln!("Check passed!");
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}

fn load_value_map(path: Option<&std::path::Path>) -> Result<ValueMap> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Expected a JSON object in: {}", path.display()))
        }
        None => Ok(ValueMap::new()),
    }
}

fn render_snapshots(
    state: &ValueMap,
    properties: &ValueMap,
) -> Result<String> {
    let output = serde_json::json!({
        "state": state,
        "properties": properties,
    });
    serde_json::to_string_pretty(&output).context("Failed to render snapshots")
}
