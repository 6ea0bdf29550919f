use galileo_core::types::{Isometry, Vec3};
use glam::Mat3A;
use crate::aabb::Aabb;

use core::f32::consts::PI;

/// Engine-facing collision geometry. Cylinders and boxes use local z as "up".
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { r: f32 },
    Box { hx: f32, hy: f32, hz: f32 },
    Cylinder { r: f32, hh: f32 }, // half-height along local Z
    ConvexMesh { points: Vec<Vec3> },
}

impl Shape {
    pub fn volume(&self) -> f32 {
        match *self {
            Shape::Sphere { r } => (4.0 / 3.0) * PI * r * r * r,
            Shape::Box { hx, hy, hz } => 8.0 * hx * hy * hz,
            Shape::Cylinder { r, hh } => PI * r * r * 2.0 * hh,
            // mass for meshes is supplied by the scene, never derived
            Shape::ConvexMesh { .. } => 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        let pos = |x: f32| x.is_finite() && x > 0.0;
        match self {
            Shape::Sphere { r } => pos(*r),
            Shape::Box { hx, hy, hz } => pos(*hx) && pos(*hy) && pos(*hz),
            Shape::Cylinder { r, hh } => pos(*r) && pos(*hh),
            Shape::ConvexMesh { points } => points.len() >= 4 && points.iter().all(|p| p.is_finite()),
        }
    }

    /// Local-frame half extents.
    fn local_half_extents(&self) -> Vec3 {
        match self {
            Shape::Sphere { r } => Vec3::splat(*r),
            Shape::Box { hx, hy, hz } => Vec3::new(*hx, *hy, *hz),
            Shape::Cylinder { r, hh } => Vec3::new(*r, *r, *hh),
            Shape::ConvexMesh { points } => points.iter().fold(Vec3::ZERO, |m, p| m.max(p.abs())),
        }
    }
}

#[inline]
pub fn aabb_of(shape: &Shape, xf: &Isometry) -> Aabb {
    match shape {
        Shape::Sphere { r } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(*r)),
        Shape::ConvexMesh { points } if !points.is_empty() => {
            let mut mn = Vec3::splat(f32::INFINITY);
            let mut mx = Vec3::splat(f32::NEG_INFINITY);
            for p in points {
                let w = xf.transform_point(*p);
                mn = mn.min(w); mx = mx.max(w);
            }
            Aabb::new(mn, mx)
        }
        _ => {
            let he = shape.local_half_extents();
            let rot = Mat3A::from_quat(xf.rot);
            let m = Mat3A::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
            Aabb::from_center_half_extents(xf.pos, m * he)
        }
    }
}
