use serde::{Deserialize, Serialize};
use crate::time::{ClockError, FrameClock};

/// Contact/material parameters handed to the engine untouched.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParams {
    pub friction: f32,
    pub restitution: f32,
    pub rolling_friction: f32,
    pub linear_damping: f32,
}

impl SurfaceParams {
    pub const fn new(friction: f32, restitution: f32, rolling_friction: f32, linear_damping: f32) -> Self {
        Self { friction, restitution, rolling_friction, linear_damping }
    }
}

/// Per-shape fallbacks for fields a scene record leaves out.
/// Balls bounce, blocks do not.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDefaults {
    pub block: SurfaceParams,
    pub ball: SurfaceParams,
    pub cylinder: SurfaceParams,
    pub mesh: SurfaceParams,
    pub surface: SurfaceParams,
}

impl Default for ObjectDefaults {
    fn default() -> Self {
        Self {
            block:    SurfaceParams::new(0.5, 0.0, 0.1, 0.006),
            ball:     SurfaceParams::new(0.5, 0.9, 0.01, 0.006),
            cylinder: SurfaceParams::new(0.5, 0.2, 0.1, 0.006),
            mesh:     SurfaceParams::new(0.5, 0.2, 0.1, 0.006),
            surface:  SurfaceParams::new(0.8, 0.0, 0.0, 0.0),
        }
    }
}

/// Everything that used to be a module-level constant. One per World.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub gravity: [f32; 3],
    /// Internal physics rate in Hz.
    pub time_step: u32,
    /// Output frame rate in Hz.
    pub fps: u32,
    pub time_scale: f32,
    /// Contact points farther apart than this are not counted.
    pub contact_tolerance: f32,
    pub solver_iterations: u32,
    pub defaults: ObjectDefaults,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -10.0],
            time_step: 240,
            fps: 60,
            time_scale: 1.0,
            contact_tolerance: 0.005,
            solver_iterations: 4,
            defaults: ObjectDefaults::default(),
        }
    }
}

impl SimConfig {
    pub fn clock(&self) -> Result<FrameClock, ClockError> {
        FrameClock::new(self.time_step, self.fps, self.time_scale)
    }
    pub fn with_gravity(mut self, g: [f32; 3]) -> Self { self.gravity = g; self }
    pub fn with_rates(mut self, time_step: u32, fps: u32) -> Self {
        self.time_step = time_step;
        self.fps = fps;
        self
    }
}
