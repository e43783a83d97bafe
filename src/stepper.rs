use crate::boundary::apply_boundaries;
use crate::diffusion::apply_diffusion;
use crate::ensemble::Ensemble;
use crate::error::{Result, SimError};
use crate::interaction::accumulate_interactions;
use rand::Rng;

/// Advances the ensemble by one explicit step of size `dt`.
///
/// The next positions are built in local buffers: interactions (reading the pre-step
/// positions), then diffusion, then the boundary map. They replace the current
/// positions only once every stage has completed, so an error leaves the ensemble
/// untouched.
pub fn step<R: Rng + ?Sized>(ensemble: &mut Ensemble, dt: f64, rng: &mut R) -> Result<()> {
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SimError::invalid(format!("step size must be positive and finite, got {dt}")));
    }

    let mut next_x = ensemble.positions_x.clone();
    let mut next_y = ensemble.positions_y.clone();

    // The flag is read on every call so callers may toggle it between steps.
    if ensemble.interactions_enabled() {
        let kernel = ensemble.kernel();
        accumulate_interactions(
            &ensemble.positions_x,
            &ensemble.positions_y,
            &mut next_x,
            &mut next_y,
            dt,
            &kernel,
        );
    }
    apply_diffusion(&mut next_x, &mut next_y, dt, rng);
    apply_boundaries(&mut next_x);
    apply_boundaries(&mut next_y);

    let degenerate = next_x
        .iter()
        .zip(&next_y)
        .position(|(x, y)| !(x.is_finite() && y.is_finite()));
    if let Some(index) = degenerate {
        return Err(SimError::NumericalDegeneracy { index, x: next_x[index], y: next_y[index] });
    }

    ensemble.commit(next_x, next_y);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pair() -> Ensemble {
        Ensemble::new(vec![0.49, 0.51], vec![0.5, 0.5], 0.02, 1e-5).unwrap()
    }

    #[test]
    fn rejects_non_positive_dt_without_mutation() {
        let mut ensemble = pair();
        let before = ensemble.positions();
        let mut rng = StdRng::seed_from_u64(1);
        for dt in [0.0, -1e-5, f64::NAN, f64::INFINITY] {
            let err = step(&mut ensemble, dt, &mut rng).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfiguration(_)));
        }
        assert_eq!(ensemble.positions(), before);
    }

    #[test]
    fn overflowing_step_commits_nothing() {
        let mut ensemble = pair();
        let before = ensemble.positions();
        let mut rng = StdRng::seed_from_u64(3);
        let err = step(&mut ensemble, f64::MAX, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::NumericalDegeneracy { index: 0, .. }));
        assert_eq!(ensemble.positions(), before);
    }

    #[test]
    fn interactions_read_pre_step_positions() {
        // With identical seeds, the only difference between the two runs is the
        // interaction term computed from the starting positions.
        let mut with = pair();
        with.set_interactions(true);
        let mut without = pair();
        let dt = 1e-5;

        step(&mut with, dt, &mut StdRng::seed_from_u64(5)).unwrap();
        step(&mut without, dt, &mut StdRng::seed_from_u64(5)).unwrap();

        let expected = (dt / 0.02) * (-1.0f64).exp();
        let shift = with.xs()[1] - without.xs()[1];
        assert!((shift - expected).abs() < 1e-12, "shift {shift} expected {expected}");
        assert!(((without.xs()[0] - with.xs()[0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn step_keeps_cells_in_domain() {
        let mut ensemble =
            Ensemble::new(vec![0.0, 0.999_999, 0.5], vec![0.999_999, 0.0, 0.5], 0.02, 1e-5).unwrap();
        ensemble.set_interactions(true);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            step(&mut ensemble, 1e-5, &mut rng).unwrap();
            assert!(ensemble.positions().iter().all(|p| p.in_unit_square()));
        }
    }
}
