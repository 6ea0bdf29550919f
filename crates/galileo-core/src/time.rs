use thiserror::Error;

#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub contact_pairs: u32,
    pub contact_points: u32,
    pub awake_bodies: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("time_step and fps must be positive (time_step={time_step}, fps={fps})")]
    NonPositive { time_step: u32, fps: u32 },
    #[error("fps {fps} exceeds physics rate {time_step}")]
    FpsAboveRate { time_step: u32, fps: u32 },
    #[error("time_step * time_scale / fps = {ratio} is not an integer")]
    NonIntegerRatio { ratio: f64 },
    #[error("duration must be finite and non-negative, got {0}")]
    BadDuration(f64),
}

/// Fixed internal rate vs. reporting rate. A frame closes after every `steps_per_frame`-th step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameClock {
    pub time_step: u32,
    pub fps: u32,
    pub time_scale: f32,
    pub steps_per_frame: u32,
}

/// Guards `floor(duration * fps)` against representation error (0.7 * 60 = 41.999..).
const FRAME_EPS: f64 = 1.0e-9;

impl FrameClock {
    pub fn new(time_step: u32, fps: u32, time_scale: f32) -> Result<Self, ClockError> {
        if time_step == 0 || fps == 0 || !(time_scale > 0.0) {
            return Err(ClockError::NonPositive { time_step, fps });
        }
        let ratio = time_step as f64 * time_scale as f64 / fps as f64;
        if ratio < 1.0 - FRAME_EPS {
            return Err(ClockError::FpsAboveRate { time_step, fps });
        }
        let spf = ratio.round();
        if (ratio - spf).abs() > 1.0e-6 {
            return Err(ClockError::NonIntegerRatio { ratio });
        }
        Ok(Self { time_step, fps, time_scale, steps_per_frame: spf as u32 })
    }

    #[inline] pub fn dt(&self) -> f32 { 1.0 / self.time_step as f32 }

    pub fn frames(&self, duration: f64) -> Result<usize, ClockError> {
        if !duration.is_finite() || duration < 0.0 { return Err(ClockError::BadDuration(duration)); }
        Ok((duration * self.fps as f64 + FRAME_EPS).floor() as usize)
    }

    pub fn total_steps(&self, duration: f64) -> Result<u64, ClockError> {
        Ok(self.frames(duration)? as u64 * self.steps_per_frame as u64)
    }

    /// True when `step` (0-based) is the last sub-step of its frame.
    #[inline] pub fn closes_frame(&self, step: u64) -> bool { (step + 1) % self.steps_per_frame as u64 == 0 }
    #[inline] pub fn frame_of(&self, step: u64) -> usize { (step / self.steps_per_frame as u64) as usize }
}
