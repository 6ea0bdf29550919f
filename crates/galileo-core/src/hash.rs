//! blake3 digests of simulation state. Every digest starts with a short
//! domain tag so step, trace and scene hashes never collide.

use blake3::Hasher;
use crate::types::Vec3;
use glam::Quat;

pub struct StepHasher(Hasher);

impl Default for StepHasher {
    fn default() -> Self { Self::new() }
}

impl StepHasher {
    pub fn new() -> Self { StepHasher(Hasher::new()) }

    /// `tag` should end in a NUL, e.g. `b"TRACEv1\0"`.
    pub fn tagged(tag: &[u8]) -> Self {
        let mut h = Self::new();
        h.update_bytes(tag);
        h
    }

    pub fn update_bytes(&mut self, bytes: &[u8]) { self.0.update(bytes); }
    pub fn update_u32(&mut self, x: u32) { self.0.update(&x.to_le_bytes()); }
    pub fn update_u64(&mut self, x: u64) { self.0.update(&x.to_le_bytes()); }
    /// NUL-terminated so ["ab","c"] and ["a","bc"] differ.
    pub fn update_str(&mut self, s: &str) { self.0.update(s.as_bytes()); self.0.update(&[0]); }
    pub fn update_f32s(&mut self, xs: &[f32]) { for x in xs { self.0.update(&x.to_le_bytes()); } }
    pub fn finalize(self) -> [u8; 32] { *self.0.finalize().as_bytes() }
}

#[inline]
pub fn hash_vec3(h: &mut StepHasher, v: &Vec3) { h.update_f32s(&v.to_array()); }

/// xyzw, matching the trace layout.
#[inline]
pub fn hash_quat(h: &mut StepHasher, q: &Quat) { h.update_f32s(&q.to_array()); }
