use cell_model_common::Vec2;
use rayon::prelude::*;

/// Soft exponential excluded-volume repulsion between two cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionKernel {
    /// Repulsion length scale.
    pub cell_size: f64,
    /// Pairs at or below this separation are skipped.
    pub coincidence_tolerance: f64,
}

impl InteractionKernel {
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size, coincidence_tolerance: 0.0 }
    }

    /// Displacement over `dt` of a cell at `pi` pushed away from a cell at `pj`:
    /// `(dt / s) * exp(-r / s) * (pi - pj) / r`.
    ///
    /// Returns zero for coincident pairs, where the direction is undefined.
    #[inline(always)]
    pub fn pair_displacement(&self, pi: Vec2, pj: Vec2, dt: f64) -> Vec2 {
        let d = pi - pj;
        let r = d.length();
        if r <= self.coincidence_tolerance {
            return Vec2::zero();
        }
        d * ((dt / self.cell_size) * (-r / self.cell_size).exp() / r)
    }

    /// Summed displacement on cell `i` from every other cell, taken in index order.
    #[inline]
    pub fn displacement_on(&self, i: usize, xs: &[f64], ys: &[f64], dt: f64) -> Vec2 {
        let pi = Vec2::new(xs[i], ys[i]);
        let mut sum = Vec2::zero();
        for (j, (&xj, &yj)) in xs.iter().zip(ys).enumerate() {
            if j == i {
                continue;
            }
            sum += self.pair_displacement(pi, Vec2::new(xj, yj), dt);
        }
        sum
    }
}

/// Adds the all-pairs repulsion to the `next` buffers, reading source positions from `xs`/`ys`.
///
/// Parallel over the receiving cell; each task writes only its own slot and the
/// summation order inside a slot is fixed, so the result does not depend on the
/// thread count.
pub fn accumulate_interactions(
    xs: &[f64],
    ys: &[f64],
    next_x: &mut [f64],
    next_y: &mut [f64],
    dt: f64,
    kernel: &InteractionKernel,
) {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert_eq!(xs.len(), next_x.len());
    debug_assert_eq!(xs.len(), next_y.len());

    next_x
        .par_iter_mut()
        .zip(next_y.par_iter_mut())
        .enumerate()
        .for_each(|(i, (nx, ny))| {
            let d = kernel.displacement_on(i, xs, ys, dt);
            *nx += d.x;
            *ny += d.y;
        });
}

/// Interaction displacement of every cell, without applying it.
pub fn interaction_displacements(xs: &[f64], ys: &[f64], dt: f64, kernel: &InteractionKernel) -> Vec<Vec2> {
    (0..xs.len())
        .into_par_iter()
        .map(|i| kernel.displacement_on(i, xs, ys, dt))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: f64 = 0.02;
    const DT: f64 = 1e-5;

    #[test]
    fn pair_is_antisymmetric() {
        let kernel = InteractionKernel::new(SIZE);
        let d = interaction_displacements(&[0.40, 0.43], &[0.50, 0.54], DT, &kernel);
        assert!((d[0].x + d[1].x).abs() < 1e-20);
        assert!((d[0].y + d[1].y).abs() < 1e-20);
        assert!((d[0].length() - d[1].length()).abs() < 1e-20);
    }

    #[test]
    fn pushes_cells_apart() {
        let kernel = InteractionKernel::new(SIZE);
        let d = interaction_displacements(&[0.49, 0.51], &[0.5, 0.5], DT, &kernel);
        assert!(d[0].x < 0.0 && d[1].x > 0.0);
        assert_eq!(d[0].y, 0.0);

        let r: f64 = 0.02;
        let expected = (DT / SIZE) * (-r / SIZE).exp();
        assert!((d[1].x - expected).abs() < 1e-15);
    }

    #[test]
    fn single_cell_feels_nothing() {
        let kernel = InteractionKernel::new(SIZE);
        let d = interaction_displacements(&[0.3], &[0.7], DT, &kernel);
        assert_eq!(d, vec![Vec2::zero()]);
    }

    #[test]
    fn coincident_pair_contributes_zero() {
        let kernel = InteractionKernel::new(SIZE);
        let mut nx = vec![0.5, 0.5];
        let mut ny = vec![0.5, 0.5];
        accumulate_interactions(&[0.5, 0.5], &[0.5, 0.5], &mut nx, &mut ny, DT, &kernel);
        assert_eq!(nx, vec![0.5, 0.5]);
        assert_eq!(ny, vec![0.5, 0.5]);
    }

    #[test]
    fn coincident_pair_does_not_mask_third_cell() {
        let kernel = InteractionKernel::new(SIZE);
        let xs = [0.5, 0.5, 0.52];
        let ys = [0.5, 0.5, 0.5];
        let d = interaction_displacements(&xs, &ys, DT, &kernel);
        assert!(d.iter().all(|v| v.is_finite()));
        assert!(d[0].x < 0.0);
        assert_eq!(d[0], d[1]);
        assert!((d[2].x + d[0].x + d[1].x).abs() < 1e-18);
    }

    #[test]
    fn tolerance_widens_exclusion() {
        let mut kernel = InteractionKernel::new(SIZE);
        kernel.coincidence_tolerance = 1e-3;
        let d = interaction_displacements(&[0.5, 0.5005], &[0.5, 0.5], DT, &kernel);
        assert_eq!(d, vec![Vec2::zero(), Vec2::zero()]);
    }

    #[test]
    fn decays_with_distance() {
        let kernel = InteractionKernel::new(SIZE);
        let near = kernel.pair_displacement(Vec2::new(0.51, 0.5), Vec2::new(0.5, 0.5), DT);
        let far = kernel.pair_displacement(Vec2::new(0.6, 0.5), Vec2::new(0.5, 0.5), DT);
        assert!(near.length() > far.length());
        assert!(far.length() > 0.0);
    }
}
