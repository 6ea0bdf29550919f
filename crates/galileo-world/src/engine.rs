//! Rapier session: body/collider creation, fixed-dt stepping, pose/velocity
//! access, user forces and contact queries. Everything above this module
//! speaks `galileo_core` types and `BodyId`s only.

use core::f32::consts::FRAC_PI_2;
use std::num::NonZeroUsize;

use galileo_core::{hash_quat, hash_vec3, vec3, BodyId, Isometry, Quat, SimConfig, StepHasher, StepStats, Vec3, Velocity};
use galileo_geom::{MassProps, Material, Shape};
use rapier3d::na;
use rapier3d::prelude::{
    CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    QueryPipeline, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};

use crate::error::{Result, SimError};

/* ---------------- glam <-> nalgebra ---------------- */
#[inline] fn na_vec(v: Vec3) -> na::Vector3<f32> { na::Vector3::new(v.x, v.y, v.z) }
#[inline] fn g_vec(v: &na::Vector3<f32>) -> Vec3 { vec3(v.x, v.y, v.z) }

fn na_iso(p: &Isometry) -> na::Isometry3<f32> {
    let q = na::Quaternion::new(p.rot.w, p.rot.x, p.rot.y, p.rot.z);
    na::Isometry3::from_parts(
        na::Translation3::new(p.pos.x, p.pos.y, p.pos.z),
        na::UnitQuaternion::from_quaternion(q),
    )
}

fn g_iso(p: &na::Isometry3<f32>) -> Isometry {
    let t = &p.translation.vector;
    let r = &p.rotation;
    Isometry { pos: vec3(t.x, t.y, t.z), rot: Quat::from_xyzw(r.i, r.j, r.k, r.w) }
}

/// Rapier cylinders run along local y; ours run along local z.
fn cylinder_fix(local: &Isometry) -> Isometry {
    Isometry { pos: local.pos, rot: local.rot * Quat::from_rotation_x(FRAC_PI_2) }
}

/* ---------------- Engine ---------------- */
pub struct Engine {
    gravity: na::Vector3<f32>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query: QueryPipeline,

    // BodyId.0 indexes these
    handles: Vec<RigidBodyHandle>,
    masses: Vec<f32>,

    contact_tolerance: f32,
    tick: u64,
}

impl Engine {
    pub fn new(cfg: &SimConfig) -> Self {
        let mut params = IntegrationParameters::default();
        params.dt = 1.0 / cfg.time_step.max(1) as f32;
        if let Some(iters) = NonZeroUsize::new(cfg.solver_iterations as usize) {
            params.num_solver_iterations = iters;
        }
        Self {
            gravity: na::Vector3::new(cfg.gravity[0], cfg.gravity[1], cfg.gravity[2]),
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query: QueryPipeline::new(),
            handles: Vec::new(),
            masses: Vec::new(),
            contact_tolerance: cfg.contact_tolerance,
            tick: 0,
        }
    }

    /// Drop every body, collider, contact and cached solver state.
    pub fn reset(&mut self, cfg: &SimConfig) {
        *self = Engine::new(cfg);
    }

    pub fn set_gravity(&mut self, g: Vec3) { self.gravity = na_vec(g); }
    #[inline] pub fn tick_index(&self) -> u64 { self.tick }
    #[inline] pub fn num_bodies(&self) -> u32 { self.handles.len() as u32 }

    /* ---------- World composition ---------- */
    /// Zero mass makes a fixed body; velocities are then ignored.
    pub fn add_body(&mut self, pose: Isometry, vel: Velocity, mass: MassProps, material: &Material) -> BodyId {
        let dynamic = !mass.is_static();
        let builder = if dynamic {
            RigidBodyBuilder::dynamic()
                .linvel(na_vec(vel.lin))
                .angvel(na_vec(vel.ang))
                .linear_damping(material.linear_damping)
                .angular_damping(material.rolling_friction)
        } else {
            RigidBodyBuilder::fixed()
        };
        let h = self.bodies.insert(builder.position(na_iso(&pose)).can_sleep(false).build());
        let id = BodyId(self.handles.len() as u32);
        self.handles.push(h);
        self.masses.push(if dynamic { mass.mass } else { 0.0 });
        id
    }

    /// `local` is relative to the body. `mass` goes on this collider only.
    pub fn add_collider(&mut self, body: BodyId, shape: &Shape, material: &Material, local: Isometry, mass: Option<f32>) -> Result<ColliderHandle> {
        let parent = self.handle(body)?;
        if !shape.is_valid() {
            return Err(SimError::Engine(format!("degenerate shape on body {body}: {shape:?}")));
        }
        let (builder, local) = match shape {
            Shape::Sphere { r } => (ColliderBuilder::ball(*r), local),
            Shape::Box { hx, hy, hz } => (ColliderBuilder::cuboid(*hx, *hy, *hz), local),
            Shape::Cylinder { r, hh } => (ColliderBuilder::cylinder(*hh, *r), cylinder_fix(&local)),
            Shape::ConvexMesh { points } => {
                let pts: Vec<na::Point3<f32>> = points.iter().map(|p| na::Point3::new(p.x, p.y, p.z)).collect();
                let b = ColliderBuilder::convex_hull(&pts)
                    .ok_or_else(|| SimError::Engine(format!("convex hull failed for body {body} ({} points)", pts.len())))?;
                (b, local)
            }
        };
        let mut builder = builder
            .position(na_iso(&local))
            .friction(material.friction)
            .restitution(material.restitution)
            .friction_combine_rule(CoefficientCombineRule::Multiply)
            .restitution_combine_rule(CoefficientCombineRule::Max);
        if let Some(m) = mass.filter(|m| *m > 0.0) {
            builder = builder.mass(m);
        }
        Ok(self.colliders.insert_with_parent(builder.build(), parent, &mut self.bodies))
    }

    #[inline]
    fn handle(&self, id: BodyId) -> Result<RigidBodyHandle> {
        self.handles.get(id.0 as usize).copied()
            .ok_or_else(|| SimError::Engine(format!("no body {id} in session")))
    }

    /* ---------- State access ---------- */
    pub fn get_body_pose(&self, id: BodyId) -> Result<Isometry> {
        let h = self.handle(id)?;
        self.bodies.get(h).map(|rb| g_iso(rb.position()))
            .ok_or_else(|| SimError::Engine(format!("stale handle for body {id}")))
    }

    pub fn get_body_vel(&self, id: BodyId) -> Result<Velocity> {
        let h = self.handle(id)?;
        self.bodies.get(h).map(|rb| Velocity { lin: g_vec(rb.linvel()), ang: g_vec(rb.angvel()) })
            .ok_or_else(|| SimError::Engine(format!("stale handle for body {id}")))
    }

    /// Teleport. Contacts are regenerated on the next step.
    pub fn set_body_pose(&mut self, id: BodyId, pose: Isometry) -> Result<()> {
        let h = self.handle(id)?;
        let rb = self.bodies.get_mut(h).ok_or_else(|| SimError::Engine(format!("stale handle for body {id}")))?;
        rb.set_position(na_iso(&pose), true);
        Ok(())
    }

    /// No-op on fixed bodies.
    pub fn set_body_vel(&mut self, id: BodyId, vel: Velocity) -> Result<()> {
        let h = self.handle(id)?;
        let rb = self.bodies.get_mut(h).ok_or_else(|| SimError::Engine(format!("stale handle for body {id}")))?;
        if rb.is_dynamic() {
            rb.set_linvel(na_vec(vel.lin), true);
            rb.set_angvel(na_vec(vel.ang), true);
        }
        Ok(())
    }

    #[inline] pub fn body_mass(&self, id: BodyId) -> f32 { self.masses.get(id.0 as usize).copied().unwrap_or(0.0) }
    #[inline] pub fn is_dynamic(&self, id: BodyId) -> bool { self.body_mass(id) > 0.0 }

    /* ---------- Forces ---------- */
    /// Accumulates until `clear_forces`. Returns false (and does nothing) for fixed bodies.
    pub fn apply_force(&mut self, id: BodyId, f: Vec3) -> Result<bool> {
        let h = self.handle(id)?;
        match self.bodies.get_mut(h) {
            Some(rb) if rb.is_dynamic() => { rb.add_force(na_vec(f), true); Ok(true) }
            Some(_) => Ok(false),
            None => Err(SimError::Engine(format!("stale handle for body {id}"))),
        }
    }

    /// Zeroes the accumulated force on one body; fixed bodies are left alone.
    pub fn clear_force(&mut self, id: BodyId) -> Result<()> {
        let h = self.handle(id)?;
        if let Some(rb) = self.bodies.get_mut(h) {
            if rb.is_dynamic() { rb.reset_forces(false); }
        }
        Ok(())
    }

    /// Physics rate in steps per second.
    pub fn set_time_step(&mut self, time_step: u32) { self.params.dt = 1.0 / time_step.max(1) as f32; }

    pub fn clear_forces(&mut self) {
        for h in &self.handles {
            if let Some(rb) = self.bodies.get_mut(*h) {
                if rb.is_dynamic() { rb.reset_forces(false); }
            }
        }
    }

    /* ---------- Step ---------- */
    pub fn step(&mut self) -> Result<StepStats> {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query),
            &(),
            &(),
        );
        self.tick += 1;

        for (i, h) in self.handles.iter().enumerate() {
            if let Some(rb) = self.bodies.get(*h) {
                let finite = rb.translation().iter().all(|x| x.is_finite())
                    && rb.linvel().iter().all(|x| x.is_finite())
                    && rb.angvel().iter().all(|x| x.is_finite());
                if !finite {
                    return Err(SimError::Engine(format!("non-finite state on body {i} at tick {}", self.tick)));
                }
            }
        }

        let mut stats = StepStats::default();
        for pair in self.narrow_phase.contact_pairs() {
            let pts = self.active_points(pair.manifolds.iter().map(|m| m.points.iter().map(|p| p.dist)));
            if pts > 0 {
                stats.contact_pairs += 1;
                stats.contact_points += pts;
            }
        }
        stats.awake_bodies = self.handles.iter()
            .filter(|h| self.bodies.get(**h).is_some_and(|rb| rb.is_dynamic() && !rb.is_sleeping()))
            .count() as u32;
        Ok(stats)
    }

    fn active_points<I, J>(&self, manifolds: I) -> u32
    where I: Iterator<Item = J>, J: Iterator<Item = f32> {
        let tol = self.contact_tolerance;
        manifolds.map(|pts| pts.filter(|d| *d <= tol).count() as u32).sum()
    }

    /* ---------- Contacts ---------- */
    /// Contact points between any collider of `a` and any collider of `b` whose
    /// separation is within the contact tolerance.
    pub fn contact_points(&self, a: BodyId, b: BodyId) -> Result<u32> {
        let (ha, hb) = (self.handle(a)?, self.handle(b)?);
        let (Some(ra), Some(rb)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
            return Err(SimError::Engine(format!("stale handle for body {a} or {b}")));
        };
        let mut n = 0;
        for ca in ra.colliders() {
            for cb in rb.colliders() {
                if let Some(pair) = self.narrow_phase.contact_pair(*ca, *cb) {
                    n += self.active_points(pair.manifolds.iter().map(|m| m.points.iter().map(|p| p.dist)));
                }
            }
        }
        Ok(n)
    }

    /* ---------- Diagnostics ---------- */
    /// Translational kinetic energy over dynamic bodies.
    pub fn kinetic_energy(&self) -> f32 {
        self.handles.iter().zip(&self.masses)
            .filter_map(|(h, m)| self.bodies.get(*h).map(|rb| 0.5 * m * rb.linvel().norm_squared()))
            .sum()
    }

    pub fn step_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::tagged(b"STEPv1\0");
        h.update_u64(self.tick);
        for (i, bh) in self.handles.iter().enumerate() {
            if let Some(rb) = self.bodies.get(*bh) {
                let p = g_iso(rb.position());
                h.update_u32(i as u32);
                hash_vec3(&mut h, &p.pos);
                hash_quat(&mut h, &p.rot);
                hash_vec3(&mut h, &g_vec(rb.linvel()));
                hash_vec3(&mut h, &g_vec(rb.angvel()));
            }
        }
        h.finalize()
    }
}
