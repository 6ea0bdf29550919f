//! Resolved body specs → engine bodies.

use galileo_core::{BodyId, Isometry};
use galileo_scene::BodySpec;

use crate::engine::Engine;
use crate::error::Result;

/// One body with its primary collider plus any extra colliders (table walls).
pub fn build(spec: &BodySpec, engine: &mut Engine) -> Result<BodyId> {
    let id = engine.add_body(spec.pose, spec.vel, spec.mass, &spec.material);
    let mass = (!spec.is_static()).then_some(spec.mass.mass);
    engine.add_collider(id, &spec.shape, &spec.material, Isometry::default(), mass)?;
    for (shape, local) in &spec.extra_colliders {
        engine.add_collider(id, shape, &spec.material, *local, None)?;
    }
    log::trace!("built {} as body {id} (mass {:.4})", spec.name, spec.mass.mass);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use galileo_core::SimConfig;
    use galileo_scene::{resolve_object, resolve_surface, ObjectRecord, SceneDescription, SceneError, ShapeKind, SurfaceRecord};

    #[test]
    fn unsupported_shape_never_reaches_engine() {
        let cfg = SimConfig::default();
        let mut e = Engine::new(&cfg);
        let scene = SceneDescription::new();
        let bad = ObjectRecord::new(ShapeKind::Other("Cone".into()), &[1.0; 3], 1.0, [0.0; 3]);
        let r = resolve_object("X", &bad, &cfg.defaults, &scene);
        assert!(matches!(r, Err(SceneError::UnsupportedShape { .. })));
        assert_eq!(e.num_bodies(), 0);

        let ok = ObjectRecord::new(ShapeKind::Ball, &[0.5], 1.0, [0.0, 0.0, 1.0]);
        let spec = resolve_object("B", &ok, &cfg.defaults, &scene).unwrap();
        let id = build(&spec, &mut e).unwrap();
        assert_eq!(id, BodyId(0));
        assert!(e.is_dynamic(id));
        assert!((e.body_mass(id) - spec.mass.mass).abs() < 1e-6);
    }

    #[test]
    fn surface_with_walls_is_one_body() {
        let cfg = SimConfig::default();
        let mut e = Engine::new(&cfg);
        let table = SurfaceRecord::slab([10.0, 10.0, 1.0], [5.0, 0.0, -0.5], 0.8).with_walls();
        let spec = resolve_surface("table", &table, &cfg.defaults, &SceneDescription::new()).unwrap();
        assert_eq!(spec.extra_colliders.len(), 3);
        let id = build(&spec, &mut e).unwrap();
        assert_eq!(e.num_bodies(), 1);
        assert!(!e.is_dynamic(id));
    }
}
