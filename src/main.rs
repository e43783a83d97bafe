use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{debug, error, info, trace, warn};
use std::path::PathBuf;
use std::time::Instant;

use cell_model::batch::run_batch_cached;
use cell_model::common::SimulationConfig;
use cell_model::output::{save_histogram_csv, save_positions_csv, save_snapshots, OutputFormat};
use cell_model::CellSimulation;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulation configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single seeded simulation and record snapshots at each output time
    Run,
    /// Run many independently seeded replicas and average their position histograms
    Batch {
        /// Number of replicas (defaults to batch.replicas from the config)
        #[arg(long)]
        replicas: Option<u32>,
        /// Ignore and do not write batch.cache_file
        #[arg(long)]
        no_cache: bool,
    },
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    let config = SimulationConfig::load(&args.config)?;
    info!("Using {} Rayon threads.", rayon::current_num_threads());

    match args.command {
        Command::Run => run(config),
        Command::Batch { replicas, no_cache } => batch(config, replicas, !no_cache),
    }
}

fn run(config: SimulationConfig) -> Result<()> {
    info!("Starting cell model simulation...");

    let mut sim = CellSimulation::new(config.clone())?;
    let params = config.get_sim_params();
    info!("Initialized {} cells.", sim.current_particle_count());
    debug!("Simulation Parameters: {:#?}", params);

    if params.output_interval < params.max_dt {
        warn!(
            "Output interval ({:e}) is shorter than max_dt ({:e}); each output is a single reduced step.",
            params.output_interval, params.max_dt
        );
    }

    let keep_positions = config.output.save_positions_in_snapshot;
    sim.record_snapshot(keep_positions);

    let start_time = Instant::now();
    for out in 0..params.n_output {
        let integrate_start = Instant::now();
        match sim.integrate(params.output_interval) {
            Ok(schedule) => trace!(
                "Output [{}/{}]: {} steps in {:.2} ms",
                out + 1,
                params.n_output,
                schedule.step_count(),
                integrate_start.elapsed().as_secs_f64() * 1000.0
            ),
            Err(e) => {
                error!("Error integrating output interval {}: {}", out + 1, e);
                anyhow::bail!("Simulation step failed.");
            }
        }
        sim.record_snapshot(keep_positions);
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished: t={:.5} in {} steps, {:.3} s wall time (excluding output).",
        sim.elapsed(),
        sim.steps_taken(),
        total_duration.as_secs_f64()
    );

    // --- Save Recorded Data ---
    if config.output.save_snapshots {
        let format = OutputFormat::from_config(config.output.format.as_deref());
        save_snapshots(&config.output.base_filename, sim.get_recorded_snapshots(), format)?;
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    if config.output.save_positions {
        let filename = format!("{}_final_positions.csv", config.output.base_filename);
        save_positions_csv(&filename, &sim.positions())?;
        info!("Final positions saved to {}", filename);
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

fn batch(config: SimulationConfig, replicas: Option<u32>, use_cache: bool) -> Result<()> {
    let replicas = replicas.unwrap_or(config.batch.replicas);
    if replicas == 0 {
        anyhow::bail!("At least one replica is required.");
    }

    let start_time = Instant::now();
    let hist = run_batch_cached(&config, replicas, use_cache)?;
    info!(
        "Histogram over {} replicas ready in {:.3} s.",
        hist.replicas,
        start_time.elapsed().as_secs_f64()
    );

    let filename = format!("{}_histogram.csv", config.output.base_filename);
    save_histogram_csv(&filename, &hist)?;
    info!("Histogram frames saved to {}", filename);
    Ok(())
}
