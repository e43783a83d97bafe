use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Cells
    pub cell_size: f64,
    pub interactions_enabled: bool,
    pub coincidence_tolerance: f64,

    // Time
    pub max_dt: f64, // Stability bound for a single explicit step
    pub end_time: f64,
    pub n_output: u32,
    pub output_interval: f64,
}
