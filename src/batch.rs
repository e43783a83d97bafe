use crate::output::{load_cache, save_cache};
use crate::simulation::CellSimulation;
use anyhow::{Context, Result};
use cell_model_common::{CellParamsConfig, DensityHistogram, InitialConditions, SimulationConfig, TimingConfig};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Runs one replica with its own seed and bins its positions after each output interval.
pub fn run_replica(config: &SimulationConfig, seed: u64) -> Result<DensityHistogram> {
    let mut replica_config = config.clone();
    replica_config.initial_conditions.seed = seed;
    let params = replica_config.get_sim_params();

    let mut hist = DensityHistogram::new(config.batch.bins, params.n_output as usize);
    hist.replicas = 1;

    let mut sim = CellSimulation::new(replica_config)?;
    for frame in 0..params.n_output as usize {
        sim.integrate(params.output_interval)
            .with_context(|| format!("replica {seed} failed at output {frame}"))?;
        hist.accumulate(frame, &sim.positions());
    }
    debug!("Replica {} finished after {} steps.", seed, sim.steps_taken());
    Ok(hist)
}

/// Runs `replicas` independently seeded simulations in parallel and sums their histograms.
///
/// Replica `k` uses seed `initial_conditions.seed + k`, so the result depends only on the
/// configuration and not on how replicas are scheduled across threads.
pub fn run_batch(config: &SimulationConfig, replicas: u32) -> Result<DensityHistogram> {
    let n_frames = config.timing.n_output as usize;
    let base_seed = config.initial_conditions.seed;
    info!(
        "Running {} replicas ({} cells each) on {} threads.",
        replicas,
        config.cells.count,
        rayon::current_num_threads()
    );

    (0..replicas as u64)
        .into_par_iter()
        .map(|k| run_replica(config, base_seed.wrapping_add(k)))
        .try_reduce(
            || DensityHistogram::new(config.batch.bins, n_frames),
            |mut acc, hist| {
                acc.merge(&hist)?;
                Ok(acc)
            },
        )
}

/// Histogram cache record: the result together with the settings that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCache {
    pub timing: TimingConfig,
    pub cells: CellParamsConfig,
    pub initial_conditions: InitialConditions,
    pub histogram: DensityHistogram,
}

impl BatchCache {
    pub fn new(config: &SimulationConfig, histogram: DensityHistogram) -> Self {
        Self {
            timing: config.timing.clone(),
            cells: config.cells.clone(),
            initial_conditions: config.initial_conditions.clone(),
            histogram,
        }
    }

    /// First setting that differs from the requested run, if any.
    pub fn mismatch(&self, config: &SimulationConfig, replicas: u32) -> Option<&'static str> {
        if self.histogram.replicas != replicas {
            Some("replica count")
        } else if self.histogram.bins != config.batch.bins {
            Some("histogram bins")
        } else if self.timing != config.timing {
            Some("timing")
        } else if self.cells != config.cells {
            Some("cells")
        } else if self.initial_conditions != config.initial_conditions {
            Some("initial conditions")
        } else {
            None
        }
    }
}

/// Like [`run_batch`], but reuses `batch.cache_file` when it was produced by the same
/// settings and replica count, and rewrites it otherwise.
pub fn run_batch_cached(config: &SimulationConfig, replicas: u32, use_cache: bool) -> Result<DensityHistogram> {
    let cache = config.batch.cache_file.as_ref().filter(|_| use_cache);

    if let Some(path) = cache {
        if path.exists() {
            info!("Reading cached histogram from {}", path.display());
            match load_cache::<_, BatchCache>(path) {
                Ok(cached) => match cached.mismatch(config, replicas) {
                    None => return Ok(cached.histogram),
                    Some(what) => warn!("Cached histogram {} does not match the request; recomputing.", what),
                },
                Err(e) => warn!("Ignoring unreadable cache: {:#}", e),
            }
        }
    }

    let hist = run_batch(config, replicas)?;
    if let Some(path) = cache {
        save_cache(path, &BatchCache::new(config, hist.clone()))?;
        info!("Histogram cached to {}", path.display());
    }
    Ok(hist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig::from_toml_str(
            r#"
            [timing]
            end_time = 0.0005
            n_output = 2

            [cells]
            count = 12
            size = 0.02

            [initial_conditions]
            seed = 40

            [batch]
            replicas = 3
            bins = [4, 4]

            [output]
            base_filename = "unused"
            save_positions = false
            save_snapshots = false
            "#,
        )
        .unwrap()
    }

    #[test]
    fn every_cell_is_binned_every_frame() {
        let config = small_config();
        let hist = run_batch(&config, 3).unwrap();
        assert_eq!(hist.replicas, 3);
        assert_eq!(hist.n_frames(), 2);
        for frame in 0..2 {
            assert_eq!(hist.frame_total(frame), 36.0);
        }
    }

    #[test]
    fn cache_mismatch_names_the_changed_setting() {
        let config = small_config();
        let cache = BatchCache::new(&config, run_batch(&config, 2).unwrap());
        assert_eq!(cache.mismatch(&config, 2), None);
        assert_eq!(cache.mismatch(&config, 5), Some("replica count"));

        let mut reseeded = config.clone();
        reseeded.initial_conditions.seed = 999;
        assert_eq!(cache.mismatch(&reseeded, 2), Some("initial conditions"));

        let mut more_cells = config.clone();
        more_cells.cells.count = 50;
        assert_eq!(cache.mismatch(&more_cells, 2), Some("cells"));

        let mut longer = config.clone();
        longer.timing.end_time = 0.001;
        assert_eq!(cache.mismatch(&longer, 2), Some("timing"));

        let mut rebinned = config;
        rebinned.batch.bins = [8, 8];
        assert_eq!(cache.mismatch(&rebinned, 2), Some("histogram bins"));
    }

    #[test]
    fn replica_depends_only_on_seed() {
        let config = small_config();
        assert_eq!(run_replica(&config, 41).unwrap(), run_replica(&config, 41).unwrap());
    }
}
