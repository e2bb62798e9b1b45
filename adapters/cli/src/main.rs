#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Creep Defence match.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    config::RunConfig,
    session::{RunSummary, Session},
};

/// Plays the wave table against a tower layout and reports the result.
#[derive(Debug, Parser)]
#[command(name = "creep-defence", version, about)]
struct Cli {
    /// TOML file describing the lane, towers and simulation settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Number of waves to play, starting from the first.
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u16).range(1..))]
    waves: Option<u16>,
    /// Overrides the configured game speed multiplier.
    #[arg(long, value_name = "MULTIPLIER")]
    speed: Option<f32>,
    /// Prints the run summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Creep Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("creep_defence=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(speed) = cli.speed {
        config.simulation.game_speed = speed;
        config.validate().context("invalid --speed override")?;
    }

    let waves = session::waves(cli.waves.map(usize::from));
    let summary = Session::new(&config, waves)?.run()?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{:?} after {} frames ({} ms simulated)",
        summary.outcome, summary.frames, summary.elapsed_ms
    );
    println!(
        "kills {} / leaks {} / lives {} / gold {} / bosses engaged {}",
        summary.kills, summary.leaks, summary.lives, summary.gold, summary.boss_hits
    );
    for report in &summary.waves {
        println!(
            "wave {:>2}: killed {:>3}, leaked {:>3}",
            report.wave, report.killed, report.leaked
        );
    }
}
