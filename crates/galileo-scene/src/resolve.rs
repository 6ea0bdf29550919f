//! Record → engine-agnostic body description.
//!
//! Everything a Loader needs to create one body: collision shape, contact
//! material, mass, initial pose and velocity. Configuration errors surface here,
//! before any engine state is touched.

use core::f32::consts::FRAC_PI_2;

use galileo_core::{iso, quat_from_euler, vec3, Isometry, ObjectDefaults, SurfaceParams, Velocity, Vec3};
use galileo_geom::{aabb_of, MassProps, Material, Shape};
use galileo_materials::{density_in_bounds, friction_in_bounds, props};

use crate::error::{Result, SceneError};
use crate::mesh::{load_mesh_points, scale_points};
use crate::scene::{ObjectRecord, SceneDescription, ShapeKind, SurfaceRecord};

#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    pub name: String,
    pub shape: Shape,
    pub material: Material,
    pub mass: MassProps,
    pub pose: Isometry,
    pub vel: Velocity,
    pub initial_force: Option<Vec3>,
    /// Additional colliders on the same body, posed relative to it.
    pub extra_colliders: Vec<(Shape, Isometry)>,
}

impl BodySpec {
    #[inline] pub fn is_static(&self) -> bool { self.mass.is_static() }
}

fn check_dims(name: &str, dims: &[f32], allowed: &[usize]) -> Result<()> {
    if !allowed.contains(&dims.len()) {
        return Err(SceneError::invalid(name, "dims", format!("expected {allowed:?} values, got {}", dims.len())));
    }
    if let Some(d) = dims.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
        return Err(SceneError::invalid(name, "dims", format!("non-positive extent {d}")));
    }
    Ok(())
}

fn check_finite(name: &str, field: &'static str, xs: &[f32]) -> Result<()> {
    if xs.iter().all(|x| x.is_finite()) { Ok(()) } else { Err(SceneError::invalid(name, field, "non-finite value")) }
}

fn check_non_negative(name: &str, field: &'static str, x: Option<f32>) -> Result<()> {
    match x {
        Some(v) if !(v.is_finite() && v >= 0.0) => Err(SceneError::invalid(name, field, format!("{v} must be >= 0"))),
        _ => Ok(()),
    }
}

/// Shape from tag + dims. Mesh assets resolve against the scene's directory.
fn shape_of(name: &str, kind: &ShapeKind, dims: &[f32], source: Option<&str>, scene: &SceneDescription) -> Result<Shape> {
    match kind {
        ShapeKind::Block => {
            check_dims(name, dims, &[3])?;
            Ok(Shape::Box { hx: dims[0] * 0.5, hy: dims[1] * 0.5, hz: dims[2] * 0.5 })
        }
        ShapeKind::Ball => {
            check_dims(name, dims, &[1, 3])?;
            Ok(Shape::Sphere { r: dims[0] })
        }
        ShapeKind::Cylinder => {
            check_dims(name, dims, &[3])?;
            Ok(Shape::Cylinder { r: dims[0] * 0.5, hh: dims[2] * 0.5 })
        }
        ShapeKind::Mesh => {
            let src = source.ok_or_else(|| SceneError::MissingField { name: name.to_string(), field: "source" })?;
            if !dims.is_empty() { check_dims(name, dims, &[3])?; }
            let pts = load_mesh_points(&scene.resolve_source(src))?;
            Ok(Shape::ConvexMesh { points: scale_points(&pts, dims) })
        }
        ShapeKind::Other(s) => Err(SceneError::UnsupportedShape { name: name.to_string(), shape: s.clone() }),
    }
}

fn defaults_for(kind: &ShapeKind, d: &ObjectDefaults) -> SurfaceParams {
    match kind {
        ShapeKind::Ball => d.ball,
        ShapeKind::Cylinder => d.cylinder,
        ShapeKind::Mesh => d.mesh,
        _ => d.block,
    }
}

pub fn resolve_object(name: &str, rec: &ObjectRecord, defaults: &ObjectDefaults, scene: &SceneDescription) -> Result<BodySpec> {
    let shape = shape_of(name, &rec.shape, &rec.dims, rec.source.as_deref(), scene)?;
    check_finite(name, "position", &rec.position)?;
    check_non_negative(name, "density", rec.density)?;
    check_non_negative(name, "mass", rec.mass)?;
    check_non_negative(name, "friction", rec.friction)?;
    check_non_negative(name, "restitution", rec.restitution)?;
    check_non_negative(name, "rolling_friction", rec.rolling_friction)?;
    check_non_negative(name, "linear_damping", rec.linear_damping)?;

    let preset = rec.material.map(props);
    let base = defaults_for(&rec.shape, defaults);

    let density = match (rec.density, preset, rec.mass) {
        (Some(d), _, _) => d,
        (None, Some(p), _) => p.density,
        (None, None, Some(_)) => 0.0,
        (None, None, None) if rec.shape == ShapeKind::Mesh => 0.0,
        (None, None, None) => return Err(SceneError::MissingField { name: name.to_string(), field: "density" }),
    };
    if density > 0.0 && !density_in_bounds(density) {
        log::warn!("object {name}: density {density} outside generator bounds");
    }

    let material = Material {
        density,
        friction: rec.friction.or(preset.map(|p| p.friction)).unwrap_or(base.friction),
        restitution: rec.restitution.unwrap_or(base.restitution),
        rolling_friction: rec.rolling_friction.unwrap_or(base.rolling_friction),
        linear_damping: rec.linear_damping.unwrap_or(base.linear_damping),
        id: rec.material,
    };
    if !friction_in_bounds(material.friction) {
        log::warn!("object {name}: friction {} outside generator bounds", material.friction);
    }

    let mass = match rec.mass {
        Some(m) => MassProps::from_mass(m),
        None => MassProps::from_density(&shape, density),
    };
    if rec.shape == ShapeKind::Mesh && mass.is_static() {
        log::debug!("object {name}: mesh without explicit mass is static");
    }

    let vel = match rec.initial_vel {
        Some(v) => {
            check_finite(name, "initial_vel", &v.linear)?;
            check_finite(name, "initial_vel", &v.angular)?;
            Velocity { lin: Vec3::from_array(v.linear), ang: Vec3::from_array(v.angular) }
        }
        None => Velocity::default(),
    };
    let initial_force = match rec.initial_force {
        Some(f) => { check_finite(name, "initial_force", &f)?; Some(Vec3::from_array(f)) }
        None => None,
    };

    Ok(BodySpec {
        name: name.to_string(),
        shape,
        material,
        mass,
        pose: iso(rec.position_v(), rec.orientation.to_quat()),
        vel,
        initial_force,
        extra_colliders: Vec::new(),
    })
}

/// Left, right and far-end walls for a table slab, each the same size as the slab.
pub fn wall_colliders(hx: f32, hy: f32, hz: f32) -> Vec<(Shape, Isometry)> {
    let slab = Shape::Box { hx, hy, hz };
    let side = quat_from_euler([FRAC_PI_2, 0.0, 0.0]);
    let end = quat_from_euler([0.0, FRAC_PI_2, 0.0]);
    vec![
        (slab.clone(), iso(vec3(0.0, -hy, hz), side)),
        (slab.clone(), iso(vec3(0.0, hy, hz), side)),
        (slab, iso(vec3(hx + hz, 0.0, hz), end)),
    ]
}

pub fn resolve_surface(name: &str, rec: &SurfaceRecord, defaults: &ObjectDefaults, scene: &SceneDescription) -> Result<BodySpec> {
    let shape = shape_of(name, &rec.shape, &rec.dims, rec.source.as_deref(), scene)?;
    check_finite(name, "position", &rec.position)?;
    check_non_negative(name, "friction", rec.friction)?;
    check_non_negative(name, "restitution", rec.restitution)?;

    let extra_colliders = match (&shape, rec.walls) {
        (Shape::Box { hx, hy, hz }, true) => wall_colliders(*hx, *hy, *hz),
        (_, true) => return Err(SceneError::invalid(name, "walls", "walls need a Block surface")),
        _ => Vec::new(),
    };

    let base = defaults.surface;
    Ok(BodySpec {
        name: name.to_string(),
        shape,
        material: Material {
            density: 0.0,
            friction: rec.friction.unwrap_or(base.friction),
            restitution: rec.restitution.unwrap_or(base.restitution),
            rolling_friction: base.rolling_friction,
            linear_damping: base.linear_damping,
            id: None,
        },
        mass: MassProps::infinite(),
        pose: iso(vec3(rec.position[0], rec.position[1], rec.position[2]), rec.orientation.to_quat()),
        vel: Velocity::default(),
        initial_force: None,
        extra_colliders,
    })
}

/// Surfaces first, then objects; each group in name order.
pub fn resolve_scene(scene: &SceneDescription, defaults: &ObjectDefaults) -> Result<Vec<BodySpec>> {
    scene.check_names()?;
    let mut out = Vec::with_capacity(scene.body_count());
    for (name, rec) in &scene.static_surfaces {
        out.push(resolve_surface(name, rec, defaults, scene)?);
    }
    for (name, rec) in &scene.objects {
        out.push(resolve_object(name, rec, defaults, scene)?);
    }
    Ok(out)
}

/// Pairs of dynamic bodies whose starting bounds interpenetrate by more than
/// `slack`. Resting contact against a surface is not reported.
pub fn initial_overlaps(specs: &[BodySpec], slack: f32) -> Vec<(String, String)> {
    let boxes: Vec<_> = specs.iter()
        .filter(|s| !s.is_static())
        .map(|s| (s.name.as_str(), aabb_of(&s.shape, &s.pose).shrink_by(slack)))
        .collect();
    let mut out = Vec::new();
    for (i, (a, ba)) in boxes.iter().enumerate() {
        for (b, bb) in &boxes[i + 1..] {
            if ba.overlaps(bb) { out.push((a.to_string(), b.to_string())); }
        }
    }
    out
}
