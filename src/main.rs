//! Stride - headless movement demo.
//!
//! Drives a player through the test course and logs what the controller did
//! on each leg.
//!
//! Usage:
//!   stride
//!   stride --config movement.toml --leg ladder
//!   RUST_LOG=debug stride --tick-rate 120

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stride_game::{run_tour, SimulationConfig, TourLeg};

#[derive(Parser)]
#[command(about = "Run the Stride movement core through its test course")]
struct Args {
    /// TOML file with simulation and movement settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run the leg with this name (stairs, pool, ladder, turntable, jump)
    #[arg(long)]
    leg: Option<String>,

    /// Override the simulation tick rate
    #[arg(long)]
    tick_rate: Option<u32>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match SimulationConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };
    if let Some(tick_rate) = args.tick_rate {
        config.tick_rate = tick_rate;
        if let Err(e) = config.validate() {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let mut legs = TourLeg::standard();
    if let Some(name) = &args.leg {
        legs.retain(|l| l.name == name.as_str());
        if legs.is_empty() {
            log::error!("no leg named '{name}'");
            return ExitCode::FAILURE;
        }
    }
    // Legs are scripted in 60 Hz ticks
    for leg in &mut legs {
        leg.ticks = leg.ticks * config.tick_rate / 60;
    }

    let report = match run_tour(config, &legs) {
        Ok(report) => report,
        Err(e) => {
            log::error!("failed to start tour: {e}");
            return ExitCode::FAILURE;
        }
    };

    for leg in &report.legs {
        let modes: Vec<String> = leg.modes.iter().map(ToString::to_string).collect();
        log::info!(
            "{:>10}: end {:>7.1} {:>7.1} {:>7.1}  peak {:>6.1}  yaw {:+.2}  modes [{}]  events {}",
            leg.name,
            leg.end_position.x,
            leg.end_position.y,
            leg.end_position.z,
            leg.peak_height,
            leg.yaw_change,
            modes.join(" -> "),
            leg.events.len()
        );
    }
    let seen: Vec<String> = report.modes_seen().iter().map(ToString::to_string).collect();
    log::info!("modes seen: {}", seen.join(", "));

    ExitCode::SUCCESS
}
