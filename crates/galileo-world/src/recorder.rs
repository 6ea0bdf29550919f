use std::sync::Arc;

use galileo_core::BodyId;
use galileo_scene::{FrameSample, PairTable, Trace};
use galileo_viz::LedgerEvent;

use crate::error::Result;
use crate::world::World;

/// Samples the tracked objects once per output frame.
pub struct Recorder {
    ids: Vec<BodyId>,
    pairs: Arc<PairTable>,
    touched: Vec<bool>,
    trace: Trace,
}

impl Recorder {
    /// Fails with a lookup error on the first unknown name.
    pub fn new(world: &World, objects: &[String], pairs: Arc<PairTable>, frames: usize) -> Result<Self> {
        let ids = world.handles(objects)?;
        let clock = world.clock();
        Ok(Self {
            ids,
            touched: vec![false; pairs.len()],
            pairs,
            trace: Trace::with_capacity(objects.to_vec(), clock.fps, clock.time_step, frames),
        })
    }

    pub fn sample(&self, world: &World) -> Result<FrameSample> {
        let n = self.ids.len();
        let mut f = FrameSample {
            position: Vec::with_capacity(n),
            rotation: Vec::with_capacity(n),
            linear_velocity: Vec::with_capacity(n),
            angular_velocity: Vec::with_capacity(n),
            collisions: Vec::with_capacity(self.pairs.len()),
        };
        for id in &self.ids {
            let p = world.get_body_pose(*id)?;
            let v = world.get_body_vel(*id)?;
            f.position.push(p.pos.to_array());
            f.rotation.push(p.rot.to_array());
            f.linear_velocity.push(v.lin.to_array());
            f.angular_velocity.push(v.ang.to_array());
        }
        for &(i, j) in self.pairs.pairs() {
            f.collisions.push(world.contact_points(self.ids[i], self.ids[j])?);
        }
        Ok(f)
    }

    pub fn record_frame(&mut self, world: &mut World, step: u64) -> Result<()> {
        let f = self.sample(world)?;
        let frame = self.trace.frames();
        for (col, &points) in f.collisions.iter().enumerate() {
            if points > 0 && !self.touched[col] {
                self.touched[col] = true;
                let (i, j) = self.pairs.pairs()[col];
                world.record(LedgerEvent::FirstContact {
                    frame,
                    a: self.trace.objects[i].clone(),
                    b: self.trace.objects[j].clone(),
                    points,
                });
            }
        }
        self.trace.push_frame(f);
        world.record(LedgerEvent::FrameRecorded { frame, step });
        log::trace!("frame {frame} recorded at step {step}");
        Ok(())
    }

    #[inline] pub fn frames(&self) -> usize { self.trace.frames() }
    pub fn finish(self) -> Trace { self.trace }
}
