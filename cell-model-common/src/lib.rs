pub mod config;
pub mod histogram;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, TimingConfig, CellParamsConfig, InitialConditions, DistributionType, BatchConfig, OutputConfig};
pub use histogram::DensityHistogram;
pub use sim_params::SimParams;
pub use snapshot::Snapshot;
pub use vecmath::Vec2;
