use crate::ensemble::Ensemble;
use crate::error::{Result, SimError};
use crate::stepper::step;
use log::{debug, warn};
use rand::Rng;

/// How a period is split into explicit steps: `full_steps` steps of `max_dt` followed by
/// one `remainder` step when the remainder is strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSchedule {
    pub full_steps: u64,
    pub max_dt: f64,
    pub remainder: f64,
}

impl StepSchedule {
    pub fn new(period: f64, max_dt: f64) -> Result<Self> {
        if !(period >= 0.0 && period.is_finite()) {
            return Err(SimError::invalid(format!("period must be non-negative and finite, got {period}")));
        }
        if !(max_dt > 0.0 && max_dt.is_finite()) {
            return Err(SimError::invalid(format!("max_dt must be positive and finite, got {max_dt}")));
        }

        let full_steps = (period / max_dt).floor();
        let mut remainder = period - full_steps * max_dt;
        // Rounding in the division can leave a remainder a few ulps above max_dt.
        if remainder > max_dt {
            warn!("Remainder step {remainder:e} exceeds max_dt {max_dt:e}; clamping.");
            remainder = max_dt;
        }
        Ok(Self {
            full_steps: full_steps as u64,
            max_dt,
            remainder: remainder.max(0.0),
        })
    }

    /// Total number of calls to the stepper.
    pub fn step_count(&self) -> u64 {
        self.full_steps + u64::from(self.remainder > 0.0)
    }

    /// Sum of all step sizes.
    pub fn total(&self) -> f64 {
        self.full_steps as f64 * self.max_dt + self.remainder
    }

    /// Step sizes in the order they are taken.
    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let max_dt = self.max_dt;
        let remainder = (self.remainder > 0.0).then_some(self.remainder);
        (0..self.full_steps).map(move |_| max_dt).chain(remainder)
    }
}

/// Advances the ensemble by `period`, never taking a step larger than its `max_dt`.
///
/// Returns the schedule that was executed. A failing step stops the integration; steps
/// already taken stay committed.
pub fn integrate<R: Rng + ?Sized>(ensemble: &mut Ensemble, period: f64, rng: &mut R) -> Result<StepSchedule> {
    let schedule = StepSchedule::new(period, ensemble.max_dt())?;
    debug!(
        "Integrating {:e} over {} steps ({} x {:e} + {:e}).",
        period,
        schedule.step_count(),
        schedule.full_steps,
        schedule.max_dt,
        schedule.remainder
    );
    for dt in schedule.iter() {
        step(ensemble, dt, rng)?;
    }
    Ok(schedule)
}
