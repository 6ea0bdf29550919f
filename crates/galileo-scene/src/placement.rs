//! Ramp/table layout helpers.
//!
//! The table top is the z = 0 plane, running along +x from the origin. The ramp
//! runs along -x, pitched by `angle` about y.

use galileo_core::{vec3, Vec3};

use crate::error::{Result, SceneError};
use crate::scene::{ObjectRecord, Orientation, SceneDescription, SurfaceRecord};

/// Point a signed distance `mag` along a surface tilted by `angle` about y,
/// lifted `z` off that surface along its normal.
pub fn pct_to_coord(mag: f32, angle: f32, z: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    vec3(c * mag + s * z, 0.0, s * mag.abs() + c * z)
}

/// Table along +x and a ramp along -x, both one unit thick.
pub fn ramp_scene(table_dims: [f32; 2], ramp_dims: [f32; 2], ramp_angle: f32, table_friction: f32, ramp_friction: f32) -> SceneDescription {
    let down = vec3(0.0, 0.0, 0.5);
    let t = pct_to_coord(table_dims[0] * 0.5, 0.0, 0.0) - down;
    let r = pct_to_coord(ramp_dims[0] * -0.5, ramp_angle, 0.0) - down;
    SceneDescription::new()
        .with_surface("table", SurfaceRecord::slab([table_dims[0], table_dims[1], 1.0], t.to_array(), table_friction))
        .with_surface(
            "ramp",
            SurfaceRecord::slab([ramp_dims[0], ramp_dims[1], 1.0], r.to_array(), ramp_friction)
                .with_orientation(Orientation::Euler([0.0, ramp_angle, 0.0])),
        )
}

/// `place` in [0, 1) is a fraction along the table, (1, 2) a fraction down the
/// ramp. The object's pose is overwritten so it rests on that surface.
pub fn place_object(scene: &SceneDescription, name: &str, rec: ObjectRecord, place: f32) -> Result<SceneDescription> {
    let dim = |s: &str| -> Result<f32> {
        scene.static_surfaces.get(s)
            .and_then(|r| r.dims.first().copied())
            .ok_or_else(|| SceneError::invalid(name, "place", format!("scene has no {s}")))
    };
    let (mag, angle) = if (0.0..1.0).contains(&place) {
        (place * dim("table")?, 0.0)
    } else if place > 1.0 && place < 2.0 {
        let angle = match scene.static_surfaces.get("ramp").map(|r| r.orientation) {
            Some(Orientation::Euler(e)) => e[1],
            Some(o @ Orientation::Quaternion(_)) => {
                let (_, pitch, _) = o.to_quat().to_euler(glam::EulerRot::ZYX);
                pitch
            }
            None => 0.0,
        };
        ((1.0 - place) * dim("ramp")?, angle)
    } else {
        return Err(SceneError::invalid(name, "place", format!("{place} is neither on the table nor the ramp")));
    };

    let half_h = rec.dims.last().copied().unwrap_or(0.0) * 0.5;
    let pos = pct_to_coord(mag, angle, half_h);
    let rec = ObjectRecord { position: pos.to_array(), orientation: Orientation::Euler([0.0, angle, 0.0]), ..rec };
    Ok(scene.with_object(name, rec))
}
