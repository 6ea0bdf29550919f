use galileo_materials::MaterialId;

use crate::shape::Shape;

/// Contact parameters plus density. Passed through to the engine as-is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub rolling_friction: f32,
    pub linear_damping: f32,
    pub id: Option<MaterialId>,
}

impl Default for Material {
    fn default() -> Self {
        Self { density: 1.0, friction: 0.5, restitution: 0.0, rolling_friction: 0.0, linear_damping: 0.0, id: None }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassProps {
    pub mass: f32,
    pub inv_mass: f32,
}

impl MassProps {
    /// Immovable. Also what a zero mass means in a scene file.
    pub fn infinite() -> Self { Self { mass: 0.0, inv_mass: 0.0 } }

    pub fn from_mass(m: f32) -> Self {
        if m > 0.0 && m.is_finite() { Self { mass: m, inv_mass: 1.0 / m } } else { Self::infinite() }
    }

    /// density x volume. Meshes have no computed volume and come out static.
    pub fn from_density(shape: &Shape, density: f32) -> Self {
        Self::from_mass(density * shape.volume())
    }

    #[inline] pub fn is_static(&self) -> bool { self.inv_mass == 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test] fn unit_block() {
        let m = MassProps::from_density(&Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 }, 2.0);
        assert!((m.mass - 2.0).abs() < 1e-6);
        assert!(!m.is_static());
    }
    #[test] fn zero_density_is_static() {
        assert!(MassProps::from_density(&Shape::Sphere { r: 1.0 }, 0.0).is_static());
        assert!(MassProps::from_density(&Shape::ConvexMesh { points: vec![] }, 5.0).is_static());
    }
}
