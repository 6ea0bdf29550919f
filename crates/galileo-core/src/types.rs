use glam::{Quat, Vec3A};

pub type Vec3 = Vec3A;

#[inline] pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn iso(pos: Vec3, rot: Quat) -> Isometry { Isometry { pos, rot } }

/// Extrinsic roll/pitch/yaw about fixed x, y, z (applied in that order).
#[inline]
pub fn quat_from_euler(e: [f32; 3]) -> Quat {
    Quat::from_rotation_z(e[2]) * Quat::from_rotation_y(e[1]) * Quat::from_rotation_x(e[0])
}

/// Scene files store quaternions scalar-first.
#[inline]
pub fn quat_from_wxyz(q: [f32; 4]) -> Quat {
    Quat::from_xyzw(q[1], q[2], q[3], q[0]).normalize()
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Isometry { pub pos: Vec3, pub rot: Quat }

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Velocity { pub lin: Vec3, pub ang: Vec3 }

impl Default for Isometry {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

impl Isometry {
    #[inline] pub fn from_translation(pos: Vec3) -> Self { Self { pos, rot: Quat::IDENTITY } }
    #[inline] pub fn transform_point(&self, p: Vec3) -> Vec3 { self.pos + self.rot * p }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test] fn euler_pitch_tilts_x_toward_minus_z() {
        let q = quat_from_euler([0.0, core::f32::consts::FRAC_PI_2, 0.0]);
        let x = q * Vec3::X;
        assert_abs_diff_eq!(x.z, -1.0, epsilon = 1e-6);
    }
    #[test] fn yaw_applies_after_roll() {
        // roll 90 then yaw 90: local y goes to +z under roll, and yaw leaves +z alone
        let q = quat_from_euler([core::f32::consts::FRAC_PI_2, 0.0, core::f32::consts::FRAC_PI_2]);
        let y = q * Vec3::Y;
        assert_abs_diff_eq!(y.z, 1.0, epsilon = 1e-6);
    }
    #[test] fn wxyz_is_scalar_first() {
        let q = quat_from_wxyz([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(q, Quat::IDENTITY);
    }
}
