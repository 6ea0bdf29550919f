//! Segmented re-simulation: rebuild the world for every segment and resume it
//! from the last recorded frame of the previous one.

use galileo_scene::{capture, Checkpoint, SceneDescription, Trace};

use crate::error::{Result, SimError};
use crate::stepper::{Stepper, TraceRequest};
use crate::world::World;

pub fn markov_trace(
    world: &mut World,
    scene: &SceneDescription,
    stepper: &mut Stepper,
    objects: &[String],
    segments: usize,
    segment_duration: f64,
) -> Result<Trace> {
    if segments == 0 {
        return Err(SimError::Config("markov_trace needs at least one segment".into()));
    }
    let mut out: Option<Trace> = None;
    let mut resume: Option<Checkpoint> = None;

    for seg in 0..segments {
        world.set_world(scene)?;
        let req = TraceRequest { duration: segment_duration, objects: objects.to_vec(), resume_from: resume.take(), rates: None };
        let t = stepper.get_trace(world, &req)?;
        let Some(last) = t.frames().checked_sub(1) else {
            return Err(SimError::Config(format!("segment duration {segment_duration}s records no frames")));
        };
        resume = Some(capture(&t, last)?);
        log::debug!("markov segment {seg}: {} frames", t.frames());
        out = Some(match out {
            Some(acc) => acc.concat(&t)?,
            None => t,
        });
    }
    out.ok_or_else(|| SimError::Config("no segments recorded".into()))
}
