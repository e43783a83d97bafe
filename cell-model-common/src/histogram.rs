use serde::{Deserialize, Serialize};
use crate::vecmath::Vec2;

/// Spatial histograms of cell positions over the unit square, one frame per output time,
/// summed over independently seeded replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityHistogram {
    /// Number of bins along x and y.
    pub bins: [u32; 2],
    /// `counts[frame][iy * bins[0] + ix]`, summed over all replicas.
    pub counts: Vec<Vec<f64>>,
    /// Number of replicas folded into `counts`.
    pub replicas: u32,
}

impl DensityHistogram {
    pub fn new(bins: [u32; 2], n_frames: usize) -> Self {
        let cells = bins[0] as usize * bins[1] as usize;
        DensityHistogram {
            bins,
            counts: vec![vec![0.0; cells]; n_frames],
            replicas: 0,
        }
    }

    pub fn n_frames(&self) -> usize {
        self.counts.len()
    }

    /// Flat bin index for a position, or `None` if it lies outside the unit square.
    pub fn bin_index(&self, pos: Vec2) -> Option<usize> {
        if !pos.in_unit_square() {
            return None;
        }
        let bx = self.bins[0] as usize;
        let by = self.bins[1] as usize;
        let ix = ((pos.x * bx as f64) as usize).min(bx - 1);
        let iy = ((pos.y * by as f64) as usize).min(by - 1);
        Some(iy * bx + ix)
    }

    /// Adds one count per position to `frame`. Returns how many positions were binned.
    pub fn accumulate(&mut self, frame: usize, positions: &[Vec2]) -> usize {
        let mut binned = 0;
        for &pos in positions {
            if let Some(idx) = self.bin_index(pos) {
                self.counts[frame][idx] += 1.0;
                binned += 1;
            }
        }
        binned
    }

    /// Folds another histogram with the same shape into this one.
    pub fn merge(&mut self, other: &DensityHistogram) -> anyhow::Result<()> {
        if self.bins != other.bins || self.n_frames() != other.n_frames() {
            anyhow::bail!(
                "Cannot merge histograms of shape {:?}x{} and {:?}x{}.",
                self.bins,
                self.n_frames(),
                other.bins,
                other.n_frames()
            );
        }
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += *s;
            }
        }
        self.replicas += other.replicas;
        Ok(())
    }

    /// Replica-averaged count in one bin.
    pub fn mean(&self, frame: usize, ix: usize, iy: usize) -> f64 {
        if self.replicas == 0 {
            return 0.0;
        }
        self.counts[frame][iy * self.bins[0] as usize + ix] / self.replicas as f64
    }

    /// Total (summed) count in a frame.
    pub fn frame_total(&self, frame: usize) -> f64 {
        self.counts[frame].iter().sum()
    }
}
