//! Summary statistics over recorded traces.

use crate::error::{Result, SceneError};
use crate::pairs::PairTable;
use crate::trace::Trace;

pub const DEFAULT_STABILITY_THRESHOLD: f32 = 0.25;

/// Translational kinetic energy per frame, `sum 0.5 m |v|^2` over tracked objects.
pub fn kinetic_energy(trace: &Trace, masses: &[f32]) -> Result<Vec<f32>> {
    if masses.len() != trace.tracked() {
        return Err(SceneError::MalformedTrace(format!(
            "{} masses for {} tracked objects", masses.len(), trace.tracked())));
    }
    Ok(trace.linear_velocity.iter()
        .map(|row| row.iter().zip(masses)
            .map(|(v, m)| 0.5 * m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
            .sum())
        .collect())
}

/// Fraction of objects whose height changed by more than `threshold` between
/// the first and last frame. Zero for an empty trace.
pub fn stability(trace: &Trace, threshold: f32) -> f32 {
    let (Some(first), Some(last)) = (trace.position.first(), trace.position.last()) else { return 0.0 };
    if first.is_empty() { return 0.0; }
    let moved = first.iter().zip(last).filter(|(a, b)| (b[2] - a[2]).abs() > threshold).count();
    moved as f32 / first.len() as f32
}

/// Angle (radians from +x, atan2 convention) and length of the mean xy
/// displacement between first and last frame.
pub fn direction(trace: &Trace) -> (f32, f32) {
    let (Some(first), Some(last)) = (trace.position.first(), trace.position.last()) else { return (0.0, 0.0) };
    if first.is_empty() { return (0.0, 0.0); }
    let n = first.len() as f32;
    let (mut dx, mut dy) = (0.0f32, 0.0f32);
    for (a, b) in first.iter().zip(last) {
        dx += b[0] - a[0];
        dy += b[1] - a[1];
    }
    let (dx, dy) = (dx / n, dy / n);
    (dy.atan2(dx), (dx * dx + dy * dy).sqrt())
}

/// For each pair column, the first frame with a nonzero contact count.
pub fn first_contact_frames(trace: &Trace) -> Vec<Option<usize>> {
    let cols = PairTable::new(trace.tracked()).len();
    (0..cols)
        .map(|c| trace.collisions.iter().position(|row| row.get(c).copied().unwrap_or(0) > 0))
        .collect()
}
