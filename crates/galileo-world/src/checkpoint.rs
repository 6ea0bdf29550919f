//! Direct state overwrite from a checkpoint, and the inverse read.

use galileo_core::{Isometry, Quat, Vec3, Velocity};
use galileo_scene::Checkpoint;
use galileo_viz::LedgerEvent;

use crate::error::{Result, SimError};
use crate::world::World;

/// Writes pose and velocity of every checkpointed object. No forces, no
/// stepping. Also cancels any pending scene `initial_force`, since the
/// checkpoint replaces the scene's initial state.
pub fn restore(world: &mut World, cp: &Checkpoint) -> Result<()> {
    cp.validate()?;
    let ids = world.handles(&cp.objects)?;
    for (k, id) in ids.iter().enumerate() {
        let r = cp.rotations[k];
        let rot = Quat::from_xyzw(r[0], r[1], r[2], r[3]);
        if !(rot.length_squared() > 0.0 && rot.is_finite()) {
            return Err(SimError::Config(format!("checkpoint rotation for {} is not a valid quaternion", cp.objects[k])));
        }
        let pos = Vec3::from_array(cp.positions[k]);
        let lin = Vec3::from_array(cp.linear_velocities[k]);
        world.set_body_pose(*id, Isometry { pos, rot: rot.normalize() })?;
        world.set_body_vel(*id, Velocity { lin, ang: Vec3::from_array(cp.angular_velocities[k]) })?;
        world.record(LedgerEvent::Restored { body: cp.objects[k].clone(), pos: pos.to_array(), lin: lin.to_array() });
    }
    world.discard_initial_forces();
    log::debug!("restored {} objects", cp.len());
    Ok(())
}

/// Current state of `objects`, in that order.
pub fn snapshot(world: &World, objects: &[String]) -> Result<Checkpoint> {
    let ids = world.handles(objects)?;
    let mut cp = Checkpoint {
        objects: objects.to_vec(),
        positions: Vec::with_capacity(ids.len()),
        rotations: Vec::with_capacity(ids.len()),
        linear_velocities: Vec::with_capacity(ids.len()),
        angular_velocities: Vec::with_capacity(ids.len()),
    };
    for id in ids {
        let p = world.get_body_pose(id)?;
        let v = world.get_body_vel(id)?;
        cp.positions.push(p.pos.to_array());
        cp.rotations.push(p.rot.to_array());
        cp.linear_velocities.push(v.lin.to_array());
        cp.angular_velocities.push(v.ang.to_array());
    }
    Ok(cp)
}
