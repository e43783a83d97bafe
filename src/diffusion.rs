use rand::Rng;
use rand_distr::StandardNormal;

/// Adds an Euler-Maruyama Brownian displacement (unit diffusion coefficient) to every cell.
///
/// Each cell draws its x then its y increment from the same generator, in cell order,
/// so a seeded generator reproduces the step exactly.
pub fn apply_diffusion<R: Rng + ?Sized>(next_x: &mut [f64], next_y: &mut [f64], dt: f64, rng: &mut R) {
    let c = (2.0 * dt).sqrt();
    for (x, y) in next_x.iter_mut().zip(next_y.iter_mut()) {
        let dx: f64 = rng.sample(StandardNormal);
        let dy: f64 = rng.sample(StandardNormal);
        *x += c * dx;
        *y += c * dy;
    }
}
