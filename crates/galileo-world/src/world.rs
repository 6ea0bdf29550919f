use std::collections::BTreeMap;

use galileo_core::{BodyId, FrameClock, Isometry, SimConfig, StepStats, Vec3, Velocity};
use galileo_scene::{hex32, initial_overlaps, resolve_scene, SceneDescription};
use galileo_viz::{DebugSettings, Ledger, LedgerEvent};

use crate::engine::Engine;
use crate::error::{Result, SimError};
use crate::loader::build;

/* ---------------- Builder ---------------- */
pub struct WorldBuilder {
    pub cfg: SimConfig,
    pub debug: DebugSettings,
    pub ledger_cap: usize,
}

impl Default for WorldBuilder {
    fn default() -> Self { Self::new() }
}

impl WorldBuilder {
    pub fn new() -> Self { Self { cfg: SimConfig::default(), debug: DebugSettings::default(), ledger_cap: 4096 } }

    pub fn with_config(mut self, cfg: SimConfig) -> Self { self.cfg = cfg; self }
    pub fn with_gravity(mut self, g: [f32; 3]) -> Self { self.cfg.gravity = g; self }
    pub fn with_rates(mut self, time_step: u32, fps: u32) -> Self { self.cfg = self.cfg.with_rates(time_step, fps); self }
    pub fn with_debug(mut self, debug: DebugSettings) -> Self { self.debug = debug; self }
    pub fn with_ledger_capacity(mut self, cap: usize) -> Self { self.ledger_cap = cap; self }

    /// Fails on an invalid rate combination.
    pub fn build(self) -> Result<World> {
        let clock = self.cfg.clock()?;
        Ok(World {
            engine: Engine::new(&self.cfg),
            cfg: self.cfg,
            clock,
            names: BTreeMap::new(),
            masses: BTreeMap::new(),
            pending_forces: Vec::new(),
            built: false,
            debug: self.debug,
            ledger: Ledger::new(self.ledger_cap),
        })
    }
}

/* ---------------- World ---------------- */
/// Owns one engine session and the name → body mapping built from a scene.
pub struct World {
    engine: Engine,
    cfg: SimConfig,
    clock: FrameClock,
    names: BTreeMap<String, BodyId>,
    masses: BTreeMap<String, f32>,
    // initial_force records, applied on the first step after set_world
    pending_forces: Vec<(String, BodyId, Vec3)>,
    built: bool,
    debug: DebugSettings,
    ledger: Ledger,
}

impl World {
    pub fn new(cfg: SimConfig) -> Result<Self> { WorldBuilder::new().with_config(cfg).build() }

    #[inline] pub fn config(&self) -> &SimConfig { &self.cfg }
    #[inline] pub fn clock(&self) -> FrameClock { self.clock }
    #[inline] pub fn is_built(&self) -> bool { self.built }
    #[inline] pub fn len(&self) -> usize { self.names.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.names.is_empty() }
    #[inline] pub fn tick_index(&self) -> u64 { self.engine.tick_index() }
    pub fn names(&self) -> impl Iterator<Item = (&str, BodyId)> { self.names.iter().map(|(k, v)| (k.as_str(), *v)) }
    pub fn engine(&self) -> &Engine { &self.engine }

    /* ---------- Debug / provenance ---------- */
    pub fn set_debug(&mut self, cfg: DebugSettings) { self.debug = cfg; }
    pub fn ledger(&self) -> &Ledger { &self.ledger }
    pub(crate) fn record(&mut self, e: LedgerEvent) { self.ledger.push(e); }

    /// Switches physics and frame rates. The new rates stay in effect for later
    /// traces and `set_world` calls on this world.
    pub fn set_rates(&mut self, time_step: u32, fps: u32) -> Result<FrameClock> {
        let cfg = self.cfg.with_rates(time_step, fps);
        let clock = cfg.clock()?;
        if clock != self.clock {
            log::debug!("rates: {} Hz physics, {} fps", time_step, fps);
        }
        self.engine.set_time_step(time_step);
        self.cfg = cfg;
        self.clock = clock;
        Ok(clock)
    }

    /* ---------- Scene ---------- */
    /// Hard reset, then gravity, static surfaces and objects, in that order.
    /// On failure the world is left empty and unbuilt.
    pub fn set_world(&mut self, scene: &SceneDescription) -> Result<()> {
        self.clear();
        let g = scene.gravity_or(self.cfg.gravity);
        self.engine.set_gravity(Vec3::from_array(g));

        if let Err(e) = self.populate(scene) {
            log::warn!("set_world failed: {e}");
            self.clear();
            return Err(e);
        }
        debug_assert_eq!(self.names.len(), scene.body_count());
        self.built = true;
        log::debug!("world built: {} surfaces, {} objects, gravity {:?}",
                    scene.static_surfaces.len(), scene.objects.len(), g);
        Ok(())
    }

    fn clear(&mut self) {
        self.engine.reset(&self.cfg);
        self.names.clear();
        self.masses.clear();
        self.pending_forces.clear();
        self.ledger.clear();
        self.built = false;
    }

    fn populate(&mut self, scene: &SceneDescription) -> Result<()> {
        let specs = resolve_scene(scene, &self.cfg.defaults)?;
        for spec in &specs {
            let id = build(spec, &mut self.engine)?;
            self.names.insert(spec.name.clone(), id);
            self.masses.insert(spec.name.clone(), if spec.is_static() { 0.0 } else { spec.mass.mass });
            if let Some(f) = spec.initial_force.filter(|_| !spec.is_static()) {
                self.pending_forces.push((spec.name.clone(), id, f));
            }
        }
        for (a, b) in initial_overlaps(&specs, self.cfg.contact_tolerance) {
            log::warn!("{a} and {b} start interpenetrating");
        }
        Ok(())
    }

    /// Dropped when a checkpoint overrides the scene's initial state.
    pub(crate) fn discard_initial_forces(&mut self) { self.pending_forces.clear(); }

    /* ---------- Lookup ---------- */
    pub fn handle(&self, name: &str) -> Result<BodyId> {
        if !self.built { return Err(SimError::WorldNotBuilt); }
        self.names.get(name).copied().ok_or_else(|| SimError::UnknownObject(name.to_string()))
    }

    pub fn handles(&self, names: &[String]) -> Result<Vec<BodyId>> {
        names.iter().map(|n| self.handle(n)).collect()
    }

    pub fn mass(&self, name: &str) -> Result<f32> {
        self.handle(name)?;
        Ok(self.masses.get(name).copied().unwrap_or(0.0))
    }

    pub fn pose(&self, name: &str) -> Result<Isometry> { self.engine.get_body_pose(self.handle(name)?) }
    pub fn vel(&self, name: &str) -> Result<Velocity> { self.engine.get_body_vel(self.handle(name)?) }

    pub fn get_body_pose(&self, id: BodyId) -> Result<Isometry> { self.engine.get_body_pose(id) }
    pub fn get_body_vel(&self, id: BodyId) -> Result<Velocity> { self.engine.get_body_vel(id) }
    pub fn set_body_pose(&mut self, id: BodyId, pose: Isometry) -> Result<()> { self.engine.set_body_pose(id, pose) }
    pub fn set_body_vel(&mut self, id: BodyId, vel: Velocity) -> Result<()> { self.engine.set_body_vel(id, vel) }
    pub fn contact_points(&self, a: BodyId, b: BodyId) -> Result<u32> { self.engine.contact_points(a, b) }

    /* ---------- Forces ---------- */
    /// False for static bodies, which ignore forces.
    pub fn apply_force(&mut self, id: BodyId, f: Vec3) -> Result<bool> {
        if !self.built { return Err(SimError::WorldNotBuilt); }
        self.engine.apply_force(id, f)
    }
    pub fn clear_forces(&mut self) { self.engine.clear_forces(); }

    /* ---------- Step ---------- */
    /// One internal step at the configured physics rate.
    pub fn step(&mut self) -> Result<StepStats> {
        if !self.built { return Err(SimError::WorldNotBuilt); }
        let mut consumed = Vec::with_capacity(self.pending_forces.len());
        for (name, id, f) in std::mem::take(&mut self.pending_forces) {
            if self.engine.apply_force(id, f)? {
                let step = self.engine.tick_index();
                self.ledger.push(LedgerEvent::ForceApplied { step, body: name, force: f.to_array() });
                consumed.push(id);
            }
        }
        let stats = self.engine.step()?;
        // rapier keeps user forces until reset; an initial force lasts one step
        for id in consumed {
            self.engine.clear_force(id)?;
        }

        let tick = self.engine.tick_index();
        if self.debug.prints_at(tick) {
            self.print_debug_block(&stats);
        }
        if self.debug.dumps_at(tick) {
            if let Err(e) = self.ledger.write_jsonl(&self.debug.dump_dir, tick) {
                log::warn!("ledger dump failed: {e}");
            }
        }
        Ok(stats)
    }

    /// Digest of every body's pose and velocity at the current tick.
    pub fn step_hash(&self) -> [u8; 32] { self.engine.step_hash() }

    fn print_debug_block(&self, stats: &StepStats) {
        println!("--- debug @ tick {}  pairs={} points={} awake={}  hash={} ---",
                 self.engine.tick_index(), stats.contact_pairs, stats.contact_points, stats.awake_bodies,
                 &hex32(&self.step_hash())[..16]);

        if self.debug.show_energy {
            println!("energy: KE_total = {:.6}", self.engine.kinetic_energy());
        }

        if self.debug.show_bodies {
            for (name, id) in self.names.iter().take(self.debug.max_lines) {
                let (Ok(p), Ok(v)) = (self.engine.get_body_pose(*id), self.engine.get_body_vel(*id)) else { continue };
                println!("body {:>8}  pos=({:+.3},{:+.3},{:+.3})  vel=({:+.3},{:+.3},{:+.3})",
                         name, p.pos.x, p.pos.y, p.pos.z, v.lin.x, v.lin.y, v.lin.z);
            }
        }

        if self.debug.show_contacts {
            let bodies: Vec<(&String, &BodyId)> = self.names.iter().collect();
            let mut shown = 0usize;
            'outer: for (i, (na, a)) in bodies.iter().enumerate() {
                for (nb, b) in &bodies[i + 1..] {
                    let n = self.engine.contact_points(**a, **b).unwrap_or(0);
                    if n > 0 {
                        println!("contact  {na} <-> {nb}  points={n}");
                        shown += 1;
                        if shown >= self.debug.max_lines { break 'outer; }
                    }
                }
            }
            if shown == 0 { println!("contacts: (none)"); }
        }
    }
}
