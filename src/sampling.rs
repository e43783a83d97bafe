use anyhow::Result;
use cell_model_common::{DistributionType, InitialConditions, Vec2};
use rand::distr::Uniform;
use rand::Rng;
use rand_distr::Normal;

/// Draws initial cell positions.
///
/// All x coordinates are drawn first, then all y coordinates. Normal samples are not
/// clipped to the unit square; the first step maps any outliers back into it.
pub fn place_initial_cells<R: Rng + ?Sized>(
    count: u32,
    initial: &InitialConditions,
    rng: &mut R,
) -> Result<Vec<Vec2>> {
    let n = count as usize;
    let (xs, ys): (Vec<f64>, Vec<f64>) = match initial.distribution {
        DistributionType::Normal => {
            let dist = Normal::new(initial.mean, initial.std_dev)?;
            let xs = (0..n).map(|_| rng.sample(dist)).collect();
            let ys = (0..n).map(|_| rng.sample(dist)).collect();
            (xs, ys)
        }
        DistributionType::Uniform => {
            let dist = Uniform::new(0.0f64, 1.0f64)?;
            let xs = (0..n).map(|_| rng.sample(dist)).collect();
            let ys = (0..n).map(|_| rng.sample(dist)).collect();
            (xs, ys)
        }
    };

    Ok(xs.into_iter().zip(ys).map(|(x, y)| Vec2::new(x, y)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn conditions(distribution: DistributionType) -> InitialConditions {
        InitialConditions { distribution, mean: 0.5, std_dev: 0.05, seed: 0 }
    }

    #[test]
    fn uniform_stays_in_unit_square() {
        let cells = place_initial_cells(500, &conditions(DistributionType::Uniform), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(cells.len(), 500);
        assert!(cells.iter().all(|p| p.in_unit_square()));
    }

    #[test]
    fn normal_is_centred_on_mean() {
        let cells = place_initial_cells(2000, &conditions(DistributionType::Normal), &mut StdRng::seed_from_u64(2)).unwrap();
        let mean_x = cells.iter().map(|p| p.x).sum::<f64>() / cells.len() as f64;
        let mean_y = cells.iter().map(|p| p.y).sum::<f64>() / cells.len() as f64;
        assert!((mean_x - 0.5).abs() < 0.01);
        assert!((mean_y - 0.5).abs() < 0.01);
    }

    #[test]
    fn same_seed_same_cells() {
        let c = conditions(DistributionType::Normal);
        let a = place_initial_cells(10, &c, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = place_initial_cells(10, &c, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
