//! Rigid-body scene simulation on top of rapier: build a `World` from a
//! `SceneDescription`, step it at a fixed physics rate with a `Stepper`, and
//! record per-frame `Trace`s that can be checkpointed, resumed and compared.

pub mod error;
pub mod engine;
pub mod loader;
mod world;
pub mod recorder;
pub mod policy;
pub mod stepper;
pub mod checkpoint;
pub mod markov;
pub mod compare;
pub mod interactive;

pub use error::{Result, SimError};
pub use engine::Engine;
pub use loader::build;
pub use world::{World, WorldBuilder};
pub use recorder::Recorder;
pub use policy::{FixedWindow, ForcePolicy, NoForce, NoPerturbation, PerturbationPolicy, PositionJitter, RandomDirection};
pub use stepper::{Stepper, TraceRequest};
pub use checkpoint::{restore, snapshot};
pub use markov::markov_trace;
pub use compare::{compare_traces, quat_angle_deg, Eps, Mismatch};
pub use interactive::{run_interactive, Control, ControlSource, InteractiveOptions, InteractiveReport};

pub use galileo_core::{SimConfig, StepStats};
pub use galileo_scene::{capture, Checkpoint, SceneDescription, Trace};
pub use galileo_viz::{DebugSettings, Ledger, LedgerEvent};

/// One-shot convenience: build `scene` into `world` and record `req` with no
/// forces or perturbations.
pub fn get_trace(world: &mut World, scene: &SceneDescription, req: &TraceRequest) -> Result<Trace> {
    world.set_world(scene)?;
    Stepper::new().get_trace(world, req)
}
