use crate::ensemble::Ensemble;
use crate::error::Result as SimResult;
use crate::integrator::{integrate, StepSchedule};
use crate::sampling::place_initial_cells;
use crate::stepper::step;
use anyhow::Result;
use cell_model_common::{SimParams, SimulationConfig, Snapshot, Vec2};
use log::{debug, info};
use rand::prelude::*;
use rayon::prelude::*;

/// Manages the ensemble, its random number generator and the simulated clock.
pub struct CellSimulation {
    /// The simulation configuration, when built from one.
    config: Option<SimulationConfig>,
    /// Ensemble state; the only data mutated by a step.
    pub ensemble: Ensemble,
    /// Generator used for initial placement and then for every diffusion draw.
    pub rng: StdRng,
    /// Simulated time elapsed since construction.
    elapsed: f64,
    /// Number of explicit steps taken since construction.
    steps_taken: u64,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl CellSimulation {
    /// Creates a new `CellSimulation`, placing initial cells with a generator seeded from
    /// `initial_conditions.seed`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.initial_conditions.seed);
        let params = config.get_sim_params();

        let initial_positions = place_initial_cells(config.cells.count, &config.initial_conditions, &mut rng)?;
        let mut ensemble = Ensemble::from_points(&initial_positions, params.cell_size, params.max_dt)?;
        ensemble.set_interactions(params.interactions_enabled);
        ensemble.set_coincidence_tolerance(params.coincidence_tolerance)?;
        debug!(
            "Placed {} cells (seed {}), max_dt {:e}.",
            ensemble.len(),
            config.initial_conditions.seed,
            params.max_dt
        );

        Ok(Self {
            config: Some(config),
            ensemble,
            rng,
            elapsed: 0.0,
            steps_taken: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Wraps an existing ensemble with a generator seeded from `seed`.
    pub fn from_ensemble(ensemble: Ensemble, seed: u64) -> Self {
        Self {
            config: None,
            ensemble,
            rng: StdRng::seed_from_u64(seed),
            elapsed: 0.0,
            steps_taken: 0,
            recorded_snapshots: Vec::new(),
        }
    }

    pub fn set_interactions(&mut self, enabled: bool) {
        self.ensemble.set_interactions(enabled);
    }

    /// Advances by one explicit step of size `dt`.
    pub fn step(&mut self, dt: f64) -> SimResult<()> {
        step(&mut self.ensemble, dt, &mut self.rng)?;
        self.elapsed += dt;
        self.steps_taken += 1;
        Ok(())
    }

    /// Advances by `period`, subdivided into steps no larger than `max_dt`.
    pub fn integrate(&mut self, period: f64) -> SimResult<StepSchedule> {
        let schedule = integrate(&mut self.ensemble, period, &mut self.rng)?;
        self.elapsed += schedule.total();
        self.steps_taken += schedule.step_count();
        Ok(schedule)
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.ensemble.positions()
    }

    pub fn current_particle_count(&self) -> usize {
        self.ensemble.len()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn config(&self) -> Option<&SimulationConfig> {
        self.config.as_ref()
    }

    pub fn params(&self) -> Option<SimParams> {
        self.config.as_ref().map(SimulationConfig::get_sim_params)
    }

    /// Distance from each cell to its nearest other cell (`f64::INFINITY` when alone).
    fn nearest_neighbor_distances_parallel(&self) -> Vec<f64> {
        let xs = self.ensemble.xs();
        let ys = self.ensemble.ys();

        (0..xs.len())
            .into_par_iter()
            .map(|i| {
                let pi = Vec2::new(xs[i], ys[i]);
                xs.iter()
                    .zip(ys)
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, (&x, &y))| pi.distance_squared(Vec2::new(x, y)))
                    .fold(f64::INFINITY, f64::min)
                    .sqrt()
            })
            .collect()
    }

    /// Number of unordered pairs closer than one cell size.
    fn count_overlapping_pairs_parallel(&self) -> u32 {
        let xs = self.ensemble.xs();
        let ys = self.ensemble.ys();
        let size_sq = self.ensemble.cell_size().powi(2);

        (0..xs.len())
            .into_par_iter()
            .map(|i| {
                let pi = Vec2::new(xs[i], ys[i]);
                (i + 1..xs.len())
                    .filter(|&j| pi.distance_squared(Vec2::new(xs[j], ys[j])) < size_sq)
                    .count() as u32
            })
            .sum()
    }

    /// Records the current positions and spatial statistics.
    pub fn record_snapshot(&mut self, include_positions: bool) -> &Snapshot {
        let distances = self.nearest_neighbor_distances_parallel();
        let mean_nearest_neighbor_distance = if distances.len() > 1 {
            distances.iter().sum::<f64>() / distances.len() as f64
        } else {
            0.0
        };
        let overlapping_pairs = self.count_overlapping_pairs_parallel();

        info!(
            "Snapshot t={:.5}: cells={}, mean NN distance={:.5}, overlapping pairs={}",
            self.elapsed,
            self.ensemble.len(),
            mean_nearest_neighbor_distance,
            overlapping_pairs
        );

        self.recorded_snapshots.push(Snapshot {
            time: self.elapsed,
            steps_taken: self.steps_taken,
            particle_count: self.ensemble.len() as u32,
            mean_nearest_neighbor_distance,
            overlapping_pairs,
            positions: include_positions.then(|| self.ensemble.positions()),
        });
        &self.recorded_snapshots[self.recorded_snapshots.len() - 1]
    }

    pub fn get_recorded_snapshots(&self) -> &Vec<Snapshot> {
        &self.recorded_snapshots
    }
}
