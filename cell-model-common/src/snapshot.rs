use serde::{Serialize, Deserialize};
use crate::vecmath::Vec2;

/// A snapshot of the ensemble and its spatial statistics at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated time at which the snapshot was taken.
    pub time: f64,
    /// Number of explicit steps taken so far.
    pub steps_taken: u64,
    pub particle_count: u32,
    /// Mean distance from each cell to its nearest other cell.
    /// Zero for ensembles with fewer than two cells.
    pub mean_nearest_neighbor_distance: f64,
    /// Unordered pairs closer than one cell size.
    pub overlapping_pairs: u32,
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "positions": null
    pub positions: Option<Vec<Vec2>>,
}
