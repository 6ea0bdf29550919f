//! Injectable force and perturbation policies for the stepper.
//!
//! Step indices are counted from the first internal step of the trace being
//! recorded, not from `set_world`.

use core::f32::consts::TAU;

use galileo_core::{vec3, Vec3, XorShift64};

/* ---------------- Forces ---------------- */
pub trait ForcePolicy {
    /// Objects this policy may push, resolved once per trace.
    fn targets(&self) -> &[String];

    /// Called once before the first internal step of each trace.
    fn begin(&mut self) {}

    /// Force on `targets()[k]` during internal step `step`.
    fn force(&self, step: u64, k: usize) -> Option<Vec3>;
}

#[derive(Clone, Debug, Default)]
pub struct NoForce;

impl ForcePolicy for NoForce {
    fn targets(&self) -> &[String] { &[] }
    fn force(&self, _step: u64, _k: usize) -> Option<Vec3> { None }
}

/// Constant force on every listed object during steps `[start_step, end_step)`.
#[derive(Clone, Debug)]
pub struct FixedWindow {
    pub objects: Vec<String>,
    pub force: Vec3,
    pub start_step: u64,
    pub end_step: u64,
}

impl FixedWindow {
    pub fn new(objects: &[&str], force: Vec3, start_step: u64, end_step: u64) -> Self {
        Self { objects: objects.iter().map(|s| s.to_string()).collect(), force, start_step, end_step }
    }
    #[inline] pub fn contains(&self, step: u64) -> bool { step >= self.start_step && step < self.end_step }
}

impl ForcePolicy for FixedWindow {
    fn targets(&self) -> &[String] { &self.objects }
    fn force(&self, step: u64, _k: usize) -> Option<Vec3> { self.contains(step).then_some(self.force) }
}

/// Like `FixedWindow`, but each object gets its own horizontal direction,
/// drawn once per trace from a seeded stream.
#[derive(Clone, Debug)]
pub struct RandomDirection {
    pub objects: Vec<String>,
    pub magnitude: f32,
    pub start_step: u64,
    pub end_step: u64,
    rng: XorShift64,
    dirs: Vec<Vec3>,
}

impl RandomDirection {
    pub fn new(objects: &[&str], magnitude: f32, start_step: u64, end_step: u64, seed: u64) -> Self {
        Self {
            objects: objects.iter().map(|s| s.to_string()).collect(),
            magnitude,
            start_step,
            end_step,
            rng: XorShift64::new(seed),
            dirs: Vec::new(),
        }
    }

    /// Unit directions drawn for the current trace.
    pub fn directions(&self) -> &[Vec3] { &self.dirs }
}

impl ForcePolicy for RandomDirection {
    fn targets(&self) -> &[String] { &self.objects }

    fn begin(&mut self) {
        let n = self.objects.len();
        self.dirs.clear();
        for _ in 0..n {
            let a = self.rng.uniform(0.0, TAU);
            self.dirs.push(vec3(a.cos(), a.sin(), 0.0));
        }
    }

    fn force(&self, step: u64, k: usize) -> Option<Vec3> {
        if step < self.start_step || step >= self.end_step { return None; }
        self.dirs.get(k).map(|d| *d * self.magnitude)
    }
}

/* ---------------- Perturbations ---------------- */
pub trait PerturbationPolicy {
    /// Position offset for a tracked dynamic object, applied once before the
    /// first internal step (after any checkpoint restore).
    fn perturb(&mut self, name: &str) -> Option<Vec3>;
}

#[derive(Clone, Debug, Default)]
pub struct NoPerturbation;

impl PerturbationPolicy for NoPerturbation {
    fn perturb(&mut self, _name: &str) -> Option<Vec3> { None }
}

/// Gaussian xy jitter with standard deviation `sigma`. An empty `objects`
/// list means every tracked object.
#[derive(Clone, Debug)]
pub struct PositionJitter {
    pub sigma: f32,
    pub objects: Vec<String>,
    rng: XorShift64,
}

impl PositionJitter {
    pub fn new(sigma: f32, seed: u64) -> Self { Self { sigma, objects: Vec::new(), rng: XorShift64::new(seed) } }
    pub fn only(mut self, objects: &[&str]) -> Self {
        self.objects = objects.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl PerturbationPolicy for PositionJitter {
    fn perturb(&mut self, name: &str) -> Option<Vec3> {
        if !self.objects.is_empty() && !self.objects.iter().any(|o| o == name) { return None; }
        let dx = self.rng.gaussian() * self.sigma;
        let dy = self.rng.gaussian() * self.sigma;
        Some(vec3(dx, dy, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn window_is_half_open() {
        let w = FixedWindow::new(&["A"], vec3(1.0, 0.0, 0.0), 4, 8);
        assert!(w.force(3, 0).is_none());
        assert!(w.force(4, 0).is_some());
        assert!(w.force(7, 0).is_some());
        assert!(w.force(8, 0).is_none());
    }

    #[test]
    fn random_directions_are_horizontal_and_seeded() {
        let mut a = RandomDirection::new(&["A", "B"], 5.0, 0, 10, 7);
        let mut b = RandomDirection::new(&["A", "B"], 5.0, 0, 10, 7);
        a.begin();
        b.begin();
        assert_eq!(a.directions(), b.directions());
        for d in a.directions() {
            assert_abs_diff_eq!(d.z, 0.0);
            assert_abs_diff_eq!(d.length(), 1.0, epsilon = 1e-5);
        }
        let f = a.force(0, 1).unwrap();
        assert_abs_diff_eq!(f.length(), 5.0, epsilon = 1e-4);
        assert!(a.force(10, 0).is_none());
    }

    #[test]
    fn jitter_respects_filter() {
        let mut j = PositionJitter::new(0.1, 3).only(&["A"]);
        assert!(j.perturb("B").is_none());
        let d = j.perturb("A").unwrap();
        assert_eq!(d.z, 0.0);
        assert!(NoPerturbation.perturb("A").is_none());
    }
}
