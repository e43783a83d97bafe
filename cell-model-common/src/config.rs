use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::{Path, PathBuf};

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TimingConfig {
    pub end_time: f64,
    /// Number of equally spaced output points between t=0 and `end_time`.
    pub n_output: u32,
}

// Parameters for cell properties, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CellParamsConfig {
    pub count: u32,
    pub size: f64,
    /// Largest step as a fraction of the cell size travelled by diffusion.
    #[serde(default = "default_timestep_ratio")]
    pub timestep_ratio: f64,
    /// Explicit stability bound; derived from `timestep_ratio` when absent.
    #[serde(default)]
    pub max_dt: Option<f64>,
    #[serde(default = "default_interactions")]
    pub interactions: bool,
    #[serde(default)]
    pub coincidence_tolerance: f64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionType {
    Normal,
    Uniform,
}

// Initial conditions for the simulation, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InitialConditions {
    #[serde(default = "default_distribution")]
    pub distribution: DistributionType,
    #[serde(default = "default_mean")]
    pub mean: f64,
    #[serde(default = "default_std_dev")]
    pub std_dev: f64,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default = "default_bins")]
    pub bins: [u32; 2],
    /// Histogram cache; read instead of recomputing when it exists.
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            replicas: default_replicas(),
            bins: default_bins(),
            cache_file: None,
        }
    }
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_snapshots: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub timing: TimingConfig,
    pub cells: CellParamsConfig,
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

fn default_timestep_ratio() -> f64 {
    0.23
}

fn default_interactions() -> bool {
    true
}

fn default_distribution() -> DistributionType {
    DistributionType::Normal
}

fn default_mean() -> f64 {
    0.5
}

fn default_std_dev() -> f64 {
    0.05
}

fn default_replicas() -> u32 {
    100
}

fn default_bins() -> [u32; 2] {
    [20, 20]
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cells.size > 0.0 && self.cells.size.is_finite()) {
            anyhow::bail!("cells.size must be positive and finite.");
        }
        if self.cells.count == 0 {
            anyhow::bail!("cells.count must be greater than 0.");
        }
        if !(self.cells.timestep_ratio > 0.0 && self.cells.timestep_ratio.is_finite()) {
            anyhow::bail!("cells.timestep_ratio must be positive and finite.");
        }
        if let Some(max_dt) = self.cells.max_dt {
            if !(max_dt > 0.0 && max_dt.is_finite()) {
                anyhow::bail!("cells.max_dt must be positive and finite.");
            }
        }
        if !(self.cells.coincidence_tolerance >= 0.0 && self.cells.coincidence_tolerance.is_finite()) {
            anyhow::bail!("cells.coincidence_tolerance must be non-negative and finite.");
        }
        if !(self.timing.end_time > 0.0 && self.timing.end_time.is_finite()) {
            anyhow::bail!("timing.end_time must be positive and finite.");
        }
        if self.timing.n_output == 0 {
            anyhow::bail!("timing.n_output must be at least 1.");
        }
        if !(self.initial_conditions.std_dev >= 0.0 && self.initial_conditions.std_dev.is_finite()) {
            anyhow::bail!("initial_conditions.std_dev must be non-negative and finite.");
        }
        if self.batch.bins.contains(&0) {
            anyhow::bail!("batch.bins must be non-zero in both directions.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let size = self.cells.size;
        // Diffusive travel per step stays a fixed fraction of the cell size.
        let max_dt = self
            .cells
            .max_dt
            .unwrap_or_else(|| (self.cells.timestep_ratio * size).powi(2) / 4.0);

        SimParams {
            cell_size: size,
            max_dt,
            interactions_enabled: self.cells.interactions,
            coincidence_tolerance: self.cells.coincidence_tolerance,
            end_time: self.timing.end_time,
            n_output: self.timing.n_output,
            output_interval: self.timing.end_time / self.timing.n_output as f64,
        }
    }
}
