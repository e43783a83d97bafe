//! Brownian cells with soft excluded-volume repulsion on the unit square.
//!
//! The core is [`Ensemble`] plus four step operators: [`interaction`], [`diffusion`],
//! [`boundary`] and the [`stepper`] that composes them; [`integrator`] drives the
//! stepper over arbitrary periods. [`CellSimulation`] and [`batch`] build the
//! configured, seeded runs on top of that core.

pub mod batch;
pub mod boundary;
pub mod diffusion;
pub mod ensemble;
pub mod error;
pub mod integrator;
pub mod interaction;
pub mod output;
pub mod sampling;
pub mod simulation;
pub mod stepper;

pub use cell_model_common as common;
pub use ensemble::Ensemble;
pub use error::{Result, SimError};
pub use integrator::{integrate, StepSchedule};
pub use simulation::CellSimulation;
pub use stepper::step;
