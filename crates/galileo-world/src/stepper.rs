use std::collections::HashSet;

use galileo_core::Isometry;
use galileo_scene::{Checkpoint, PairCache, Trace};
use galileo_viz::LedgerEvent;

use crate::checkpoint::restore;
use crate::error::{Result, SimError};
use crate::policy::{ForcePolicy, NoForce, NoPerturbation, PerturbationPolicy};
use crate::recorder::Recorder;
use crate::world::World;

/// What to record: how long, which objects (order defines every column), and
/// an optional state to start from.
///
/// `rates` (`time_step`, `fps`) switches the world's rates before recording;
/// they remain in effect on that world afterwards.
#[derive(Clone, Debug)]
pub struct TraceRequest {
    pub duration: f64,
    pub objects: Vec<String>,
    pub resume_from: Option<Checkpoint>,
    pub rates: Option<(u32, u32)>,
}

impl TraceRequest {
    pub fn new(duration: f64, objects: &[&str]) -> Self {
        Self { duration, objects: objects.iter().map(|s| s.to_string()).collect(), resume_from: None, rates: None }
    }
    pub fn resume_from(mut self, cp: Checkpoint) -> Self { self.resume_from = Some(cp); self }
    pub fn with_rates(mut self, time_step: u32, fps: u32) -> Self { self.rates = Some((time_step, fps)); self }
}

/// Fixed-step driver: steps the world at its physics rate and emits one frame
/// per `steps_per_frame` steps, sampled after the last sub-step.
pub struct Stepper {
    force: Box<dyn ForcePolicy>,
    perturbation: Box<dyn PerturbationPolicy>,
    pairs: PairCache,
}

impl Default for Stepper {
    fn default() -> Self { Self::new() }
}

impl Stepper {
    pub fn new() -> Self {
        Self { force: Box::new(NoForce), perturbation: Box::new(NoPerturbation), pairs: PairCache::new() }
    }

    pub fn with_force(mut self, p: impl ForcePolicy + 'static) -> Self { self.force = Box::new(p); self }
    pub fn with_perturbation(mut self, p: impl PerturbationPolicy + 'static) -> Self { self.perturbation = Box::new(p); self }

    pub fn set_force(&mut self, p: Box<dyn ForcePolicy>) { self.force = p; }
    pub fn set_perturbation(&mut self, p: Box<dyn PerturbationPolicy>) { self.perturbation = p; }

    pub fn get_trace(&mut self, world: &mut World, req: &TraceRequest) -> Result<Trace> {
        if !world.is_built() { return Err(SimError::WorldNotBuilt); }
        let mut seen = HashSet::with_capacity(req.objects.len());
        if let Some(dup) = req.objects.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(SimError::DuplicateObject(dup.clone()));
        }
        let clock = match req.rates {
            Some((time_step, fps)) => world.set_rates(time_step, fps)?,
            None => world.clock(),
        };
        let frames = clock.frames(req.duration)?;
        let pairs = self.pairs.get(req.objects.len());
        let mut rec = Recorder::new(world, &req.objects, pairs, frames)?;
        let force_ids = world.handles(self.force.targets())?;

        if let Some(cp) = &req.resume_from {
            restore(world, cp)?;
        }
        self.perturb(world, &req.objects)?;
        self.force.begin();

        let total = clock.total_steps(req.duration)?;
        log::debug!("get_trace: {} objects, {frames} frames, {total} steps ({} per frame)",
                    req.objects.len(), clock.steps_per_frame);

        let mut announced = vec![false; force_ids.len()];
        for step in 0..total {
            world.clear_forces();
            for (k, id) in force_ids.iter().enumerate() {
                let Some(f) = self.force.force(step, k) else { continue };
                if world.apply_force(*id, f)? && !announced[k] {
                    announced[k] = true;
                    let body = self.force.targets()[k].clone();
                    world.record(LedgerEvent::ForceApplied { step, body, force: f.to_array() });
                }
            }
            world.step()?;
            if clock.closes_frame(step) {
                rec.record_frame(world, step)?;
            }
        }
        world.clear_forces();

        let trace = rec.finish();
        debug_assert_eq!(trace.frames(), frames);
        Ok(trace)
    }

    fn perturb(&mut self, world: &mut World, objects: &[String]) -> Result<()> {
        for name in objects {
            let id = world.handle(name)?;
            if !world.engine().is_dynamic(id) { continue; }
            let Some(delta) = self.perturbation.perturb(name) else { continue };
            let p = world.get_body_pose(id)?;
            world.set_body_pose(id, Isometry { pos: p.pos + delta, rot: p.rot })?;
            world.record(LedgerEvent::Perturbed { body: name.clone(), delta: delta.to_array() });
        }
        Ok(())
    }
}
