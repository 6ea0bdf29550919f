/// Seeded generator for force directions and pose jitter. Same seed, same draws.
#[derive(Copy, Clone, Debug)]
pub struct XorShift64 { state: u64 }

impl XorShift64 {
    pub fn new(seed: u64) -> Self { Self { state: seed | 1 } }
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12; x ^= x << 25; x ^= x >> 27;
        self.state = x;
        ((x.wrapping_mul(2685821657736338717)) >> 32) as u32
    }
    pub fn state(&self) -> u64 { self.state }

    /// Uniform in [0, 1).
    #[inline] pub fn next_f32(&mut self) -> f32 { (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0) }
    #[inline] pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 { lo + (hi - lo) * self.next_f32() }

    /// Standard normal via Box-Muller.
    pub fn gaussian(&mut self) -> f32 {
        let u1 = self.next_f32().max(f32::MIN_POSITIVE);
        let u2 = self.next_f32();
        (-2.0 * u1.ln()).sqrt() * (core::f32::consts::TAU * u2).cos()
    }
}
