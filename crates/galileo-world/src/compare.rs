use galileo_core::Quat;
use galileo_scene::{SceneError, Trace};

use crate::error::Result;

/// Tolerances for near-equality between two traces.
#[derive(Copy, Clone, Debug)]
pub struct Eps {
    pub pos: f32,        // meters
    pub vel: f32,        // m/s, linear and angular
    pub quat_deg: f32,   // degrees
    pub contacts: u32,   // allowed per-pair contact-count delta
}

impl Default for Eps {
    fn default() -> Self { Self { pos: 1.0e-3, vel: 1.0e-3, quat_deg: 0.05, contacts: 2 } }
}

/// First disagreement found, scanning frames in order and objects in tracked order.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub frame: usize,
    /// Object name, or the pair "a|b" for contacts; empty for frame-count mismatches.
    pub object: String,
    pub field: &'static str,
    pub delta: f32,
}

#[inline]
fn dist3(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

pub fn quat_angle_deg(a: Quat, b: Quat) -> f32 {
    let d = a.dot(b).abs().min(1.0);
    (2.0 * d.acos()).to_degrees()
}

fn contacts_close(a: u32, b: u32, tol: u32) -> bool { a.abs_diff(b) <= tol }

/// `Ok(None)` when every frame agrees within `eps`. Traces over different
/// objects are an error, not a mismatch.
pub fn compare_traces(a: &Trace, b: &Trace, eps: Eps) -> Result<Option<Mismatch>> {
    if a.objects != b.objects {
        return Err(SceneError::ObjectMismatch { left: a.objects.clone(), right: b.objects.clone() }.into());
    }
    let frames = a.frames().min(b.frames());
    let name = |i: usize| a.objects[i].clone();
    for k in 0..frames {
        for i in 0..a.tracked() {
            let d = dist3(&a.position[k][i], &b.position[k][i]);
            if d > eps.pos { return Ok(Some(Mismatch { frame: k, object: name(i), field: "position", delta: d })); }

            let qa = Quat::from_array(a.rotation[k][i]);
            let qb = Quat::from_array(b.rotation[k][i]);
            let d = quat_angle_deg(qa, qb);
            if d > eps.quat_deg { return Ok(Some(Mismatch { frame: k, object: name(i), field: "rotation", delta: d })); }

            let d = dist3(&a.linear_velocity[k][i], &b.linear_velocity[k][i]);
            if d > eps.vel { return Ok(Some(Mismatch { frame: k, object: name(i), field: "linear_velocity", delta: d })); }

            let d = dist3(&a.angular_velocity[k][i], &b.angular_velocity[k][i]);
            if d > eps.vel { return Ok(Some(Mismatch { frame: k, object: name(i), field: "angular_velocity", delta: d })); }
        }
        for (col, (ca, cb)) in a.collisions[k].iter().zip(&b.collisions[k]).enumerate() {
            if !contacts_close(*ca, *cb, eps.contacts) {
                let (i, j) = galileo_scene::PairTable::new(a.tracked()).pair(col).unwrap_or((0, 0));
                return Ok(Some(Mismatch {
                    frame: k,
                    object: format!("{}|{}", a.objects[i], a.objects[j]),
                    field: "collisions",
                    delta: ca.abs_diff(*cb) as f32,
                }));
            }
        }
    }
    if a.frames() != b.frames() {
        return Ok(Some(Mismatch {
            frame: frames,
            object: String::new(),
            field: "frames",
            delta: a.frames().abs_diff(b.frames()) as f32,
        }));
    }
    Ok(None)
}
