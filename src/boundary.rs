//! Maps candidate coordinates back into the unit interval.
//!
//! The lower edge reflects and the upper edge wraps. Displacements larger than one
//! domain width in a single step are not folded further; `max_dt` keeps per-step
//! travel far below that.

/// Corrects one coordinate: `v < 0` reflects to `-v`, `v >= 1` wraps to `v - 1`.
#[inline(always)]
pub fn apply_boundary(v: f64) -> f64 {
    if v < 0.0 {
        -v
    } else if v >= 1.0 {
        v - 1.0
    } else {
        v
    }
}

/// Applies [`apply_boundary`] in place to every coordinate along one axis.
pub fn apply_boundaries(coords: &mut [f64]) {
    for v in coords.iter_mut() {
        *v = apply_boundary(*v);
    }
}
