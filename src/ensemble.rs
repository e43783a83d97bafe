use crate::error::{Result, SimError};
use crate::interaction::InteractionKernel;
use cell_model_common::Vec2;

/// The cell population and the parameters shared by every cell.
///
/// Positions are kept as separate x and y vectors (SoA) so the operators can run over
/// plain slices. The particle count is fixed at construction; index `i` names the same
/// cell for the lifetime of the ensemble.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub(crate) positions_x: Vec<f64>,
    pub(crate) positions_y: Vec<f64>,
    cell_size: f64,
    max_dt: f64,
    interactions_enabled: bool,
    coincidence_tolerance: f64,
}

impl Ensemble {
    /// Builds an ensemble from separate coordinate vectors.
    ///
    /// Interactions start disabled, matching a freshly constructed diffusion-only model.
    pub fn new(positions_x: Vec<f64>, positions_y: Vec<f64>, cell_size: f64, max_dt: f64) -> Result<Self> {
        if positions_x.len() != positions_y.len() {
            return Err(SimError::invalid(format!(
                "x and y must have the same length (got {} and {})",
                positions_x.len(),
                positions_y.len()
            )));
        }
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(SimError::invalid(format!("cell_size must be positive and finite, got {cell_size}")));
        }
        if !(max_dt > 0.0 && max_dt.is_finite()) {
            return Err(SimError::invalid(format!("max_dt must be positive and finite, got {max_dt}")));
        }
        let non_finite = positions_x
            .iter()
            .zip(&positions_y)
            .position(|(x, y)| !(x.is_finite() && y.is_finite()));
        if let Some(idx) = non_finite {
            return Err(SimError::invalid(format!("initial position of cell {idx} is not finite")));
        }

        Ok(Self {
            positions_x,
            positions_y,
            cell_size,
            max_dt,
            interactions_enabled: false,
            coincidence_tolerance: 0.0,
        })
    }

    /// Builds an ensemble from a sequence of points.
    pub fn from_points(points: &[Vec2], cell_size: f64, max_dt: f64) -> Result<Self> {
        let xs = points.iter().map(|p| p.x).collect();
        let ys = points.iter().map(|p| p.y).collect();
        Self::new(xs, ys, cell_size, max_dt)
    }

    pub fn set_interactions(&mut self, enabled: bool) {
        self.interactions_enabled = enabled;
    }

    pub fn interactions_enabled(&self) -> bool {
        self.interactions_enabled
    }

    /// Pairs closer than `tolerance` are treated as coincident and skipped by the
    /// interaction sum. Zero skips only exactly coincident pairs.
    pub fn set_coincidence_tolerance(&mut self, tolerance: f64) -> Result<()> {
        if !(tolerance >= 0.0 && tolerance.is_finite()) {
            return Err(SimError::invalid(format!(
                "coincidence tolerance must be non-negative and finite, got {tolerance}"
            )));
        }
        self.coincidence_tolerance = tolerance;
        Ok(())
    }

    pub fn coincidence_tolerance(&self) -> f64 {
        self.coincidence_tolerance
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn max_dt(&self) -> f64 {
        self.max_dt
    }

    pub fn len(&self) -> usize {
        self.positions_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions_x.is_empty()
    }

    pub fn xs(&self) -> &[f64] {
        &self.positions_x
    }

    pub fn ys(&self) -> &[f64] {
        &self.positions_y
    }

    /// Copy of the current positions, in cell order.
    pub fn positions(&self) -> Vec<Vec2> {
        self.positions_x
            .iter()
            .zip(&self.positions_y)
            .map(|(&x, &y)| Vec2::new(x, y))
            .collect()
    }

    pub(crate) fn kernel(&self) -> InteractionKernel {
        InteractionKernel {
            cell_size: self.cell_size,
            coincidence_tolerance: self.coincidence_tolerance,
        }
    }

    /// Replaces the current positions with a fully computed step.
    pub(crate) fn commit(&mut self, next_x: Vec<f64>, next_y: Vec<f64>) {
        debug_assert_eq!(next_x.len(), self.positions_x.len());
        debug_assert_eq!(next_y.len(), self.positions_y.len());
        self.positions_x = next_x;
        self.positions_y = next_y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_length_mismatch() {
        let err = Ensemble::new(vec![0.1, 0.2], vec![0.1], 0.02, 1e-5).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_non_positive_scales() {
        assert!(Ensemble::new(vec![0.1], vec![0.1], 0.0, 1e-5).is_err());
        assert!(Ensemble::new(vec![0.1], vec![0.1], -0.02, 1e-5).is_err());
        assert!(Ensemble::new(vec![0.1], vec![0.1], 0.02, 0.0).is_err());
        assert!(Ensemble::new(vec![0.1], vec![0.1], 0.02, f64::NAN).is_err());
    }

    #[test]
    fn rejects_non_finite_positions() {
        assert!(Ensemble::new(vec![0.1, f64::INFINITY], vec![0.1, 0.2], 0.02, 1e-5).is_err());
    }

    #[test]
    fn positions_round_trip_points() {
        let points = vec![Vec2::new(0.25, 0.5), Vec2::new(0.75, 0.125)];
        let ensemble = Ensemble::from_points(&points, 0.02, 1e-5).unwrap();
        assert_eq!(ensemble.len(), 2);
        assert_eq!(ensemble.positions(), points);
        assert!(!ensemble.interactions_enabled());
    }

    #[test]
    fn empty_ensemble_is_allowed() {
        let ensemble = Ensemble::new(Vec::new(), Vec::new(), 0.02, 1e-5).unwrap();
        assert!(ensemble.is_empty());
    }

    #[test]
    fn tolerance_must_be_non_negative() {
        let mut ensemble = Ensemble::new(vec![0.5], vec![0.5], 0.02, 1e-5).unwrap();
        assert!(ensemble.set_coincidence_tolerance(-1.0).is_err());
        ensemble.set_coincidence_tolerance(1e-12).unwrap();
        assert_eq!(ensemble.coincidence_tolerance(), 1e-12);
    }
}
