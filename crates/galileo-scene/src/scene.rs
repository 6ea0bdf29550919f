use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use galileo_core::{quat_from_euler, quat_from_wxyz, vec3, Quat, Vec3};
use galileo_materials::MaterialId;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/* ─────────────────────────  Scene schema ───────────────────────── */

/// Shape tag as written in scene files. Anything else is kept verbatim so the
/// Loader can reject it per object instead of failing the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeKind {
    Block,
    Ball,
    Cylinder,
    Mesh,
    Other(String),
}

impl From<String> for ShapeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Block" => ShapeKind::Block,
            "Ball" => ShapeKind::Ball,
            "Cylinder" | "Puck" => ShapeKind::Cylinder,
            "Mesh" => ShapeKind::Mesh,
            _ => ShapeKind::Other(s),
        }
    }
}

impl From<ShapeKind> for String {
    fn from(k: ShapeKind) -> Self { k.to_string() }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Block => f.write_str("Block"),
            ShapeKind::Ball => f.write_str("Ball"),
            ShapeKind::Cylinder => f.write_str("Cylinder"),
            ShapeKind::Mesh => f.write_str("Mesh"),
            ShapeKind::Other(s) => f.write_str(s),
        }
    }
}

/// Three numbers are roll/pitch/yaw, four are a scalar-first quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub enum Orientation {
    Euler([f32; 3]),
    Quaternion([f32; 4]),
}

impl Default for Orientation {
    fn default() -> Self { Orientation::Euler([0.0; 3]) }
}

impl TryFrom<Vec<f32>> for Orientation {
    type Error = String;
    fn try_from(v: Vec<f32>) -> std::result::Result<Self, Self::Error> {
        match v.as_slice() {
            [r, p, y] => Ok(Orientation::Euler([*r, *p, *y])),
            [w, x, y, z] => Ok(Orientation::Quaternion([*w, *x, *y, *z])),
            other => Err(format!("orientation needs 3 (euler) or 4 (wxyz) numbers, got {}", other.len())),
        }
    }
}

impl From<Orientation> for Vec<f32> {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::Euler(e) => e.to_vec(),
            Orientation::Quaternion(q) => q.to_vec(),
        }
    }
}

impl Orientation {
    pub fn to_quat(&self) -> Quat {
        match *self {
            Orientation::Euler(e) => quat_from_euler(e),
            Orientation::Quaternion(q) => quat_from_wxyz(q),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialVelocity {
    #[serde(default)]
    pub linear: [f32; 3],
    #[serde(default)]
    pub angular: [f32; 3],
}

/// A bare number is the vertical (z) component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gravity {
    Vertical(f32),
    Vector([f32; 3]),
}

impl Gravity {
    pub fn to_array(&self) -> [f32; 3] {
        match *self {
            Gravity::Vertical(g) => [0.0, 0.0, g],
            Gravity::Vector(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub shape: ShapeKind,
    #[serde(default)]
    pub dims: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    /// Overrides density x volume. The only way to give a Mesh dynamics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_friction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_damping: Option<f32>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_vel: Option<InitialVelocity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_force: Option<[f32; 3]>,
    /// Mesh asset (glTF/GLB), relative to the scene file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Generator bookkeeping (appearance, volume, ...) carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ObjectRecord {
    /// Minimal record; everything optional left to per-shape defaults.
    pub fn new(shape: ShapeKind, dims: &[f32], density: f32, position: [f32; 3]) -> Self {
        Self {
            shape,
            dims: dims.to_vec(),
            density: Some(density),
            mass: None,
            material: None,
            friction: None,
            restitution: None,
            rolling_friction: None,
            linear_damping: None,
            position,
            orientation: Orientation::default(),
            initial_vel: None,
            initial_force: None,
            source: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_orientation(mut self, o: Orientation) -> Self { self.orientation = o; self }
    pub fn with_velocity(mut self, linear: [f32; 3], angular: [f32; 3]) -> Self {
        self.initial_vel = Some(InitialVelocity { linear, angular });
        self
    }
    pub fn with_friction(mut self, f: f32) -> Self { self.friction = Some(f); self }
    pub fn with_restitution(mut self, r: f32) -> Self { self.restitution = Some(r); self }
    pub fn with_mass(mut self, m: f32) -> Self { self.mass = Some(m); self }
    pub fn with_force(mut self, f: [f32; 3]) -> Self { self.initial_force = Some(f); self }

    #[inline] pub fn position_v(&self) -> Vec3 { vec3(self.position[0], self.position[1], self.position[2]) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRecord {
    #[serde(default = "block_kind")]
    pub shape: ShapeKind,
    pub dims: Vec<f32>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
    /// Enclose the surface with left/right/far-end walls of the same slab size.
    #[serde(default, skip_serializing_if = "is_false")]
    pub walls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn block_kind() -> ShapeKind { ShapeKind::Block }
fn is_false(b: &bool) -> bool { !*b }

impl SurfaceRecord {
    pub fn slab(dims: [f32; 3], position: [f32; 3], friction: f32) -> Self {
        Self {
            shape: ShapeKind::Block,
            dims: dims.to_vec(),
            position,
            orientation: Orientation::default(),
            friction: Some(friction),
            restitution: None,
            walls: false,
            source: None,
            extra: BTreeMap::new(),
        }
    }
    pub fn with_orientation(mut self, o: Orientation) -> Self { self.orientation = o; self }
    pub fn with_walls(mut self) -> Self { self.walls = true; self }
}

/// Declarative scene. Every top-level key other than `objects` and `gravity`
/// names a static surface (`table`, `ramp`, `track`, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity: Option<Gravity>,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectRecord>,
    #[serde(flatten)]
    pub static_surfaces: BTreeMap<String, SurfaceRecord>,
    /// Directory mesh `source` paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl SceneDescription {
    pub fn new() -> Self { Self::default() }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let scene: SceneDescription = serde_json::from_str(s)?;
        scene.check_names()?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        let mut scene = Self::from_json_str(&text)?;
        scene.base_dir = path.parent().map(Path::to_path_buf);
        log::debug!("loaded scene {} ({} surfaces, {} objects)",
                    path.display(), scene.static_surfaces.len(), scene.objects.len());
        Ok(scene)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        Ok(if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? })
    }

    /// Objects and surfaces share one namespace.
    pub fn check_names(&self) -> Result<()> {
        if let Some(dup) = self.objects.keys().find(|k| self.static_surfaces.contains_key(*k)) {
            return Err(SceneError::DuplicateName(dup.clone()));
        }
        Ok(())
    }

    #[inline] pub fn body_count(&self) -> usize { self.static_surfaces.len() + self.objects.len() }

    pub fn gravity_or(&self, fallback: [f32; 3]) -> [f32; 3] {
        self.gravity.map(|g| g.to_array()).unwrap_or(fallback)
    }

    /// Returns a new description; the receiver is never edited in place.
    pub fn with_object(&self, name: &str, rec: ObjectRecord) -> Self {
        let mut s = self.clone();
        s.objects.insert(name.to_string(), rec);
        s
    }
    pub fn with_surface(&self, name: &str, rec: SurfaceRecord) -> Self {
        let mut s = self.clone();
        s.static_surfaces.insert(name.to_string(), rec);
        s
    }
    pub fn with_gravity(&self, g: Gravity) -> Self {
        let mut s = self.clone();
        s.gravity = Some(g);
        s
    }

    pub fn resolve_source(&self, source: &str) -> PathBuf {
        let p = Path::new(source);
        match &self.base_dir {
            Some(dir) if p.is_relative() => dir.join(p),
            _ => p.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAMP_SCENE: &str = r#"{
        "table": { "dims": [10, 10, 1], "position": [5, 0, -0.5], "orientation": [0, 0, 0], "friction": 0.8 },
        "ramp":  { "dims": [10, 10, 1], "position": [-5, 0, 5], "orientation": [0, 0.7853982, 0], "friction": 0.8 },
        "objects": {
            "A": { "shape": "Block", "dims": [0.3, 0.3, 0.15], "density": 2.0, "friction": 0.3,
                   "position": [1.0, 0.0, 0.075], "orientation": [0, 0, 0], "appearance": "brick" },
            "B": { "shape": "Puck", "dims": [0.3, 0.3, 0.15], "density": 8.0, "friction": 0.2,
                   "position": [-2.0, 0.0, 2.5], "orientation": [1, 0, 0, 0] }
        }
    }"#;

    #[test] fn parse_surfaces_and_objects() {
        let s = SceneDescription::from_json_str(RAMP_SCENE).unwrap();
        assert_eq!(s.static_surfaces.len(), 2);
        assert_eq!(s.objects.len(), 2);
        assert_eq!(s.body_count(), 4);
        assert_eq!(s.objects["B"].shape, ShapeKind::Cylinder);
        assert!(matches!(s.objects["B"].orientation, Orientation::Quaternion(_)));
        assert_eq!(s.gravity_or([0.0, 0.0, -10.0]), [0.0, 0.0, -10.0]);
    }

    #[test] fn round_trip_keeps_unknown_keys() {
        let s = SceneDescription::from_json_str(RAMP_SCENE).unwrap();
        let again = SceneDescription::from_json_str(&s.to_json_string(false).unwrap()).unwrap();
        assert_eq!(s, again);
        assert_eq!(again.objects["A"].extra["appearance"], serde_json::json!("brick"));
    }

    #[test] fn unknown_shape_survives_parse() {
        let s = SceneDescription::from_json_str(
            r#"{ "objects": { "X": { "shape": "Torus", "dims": [1, 1, 1], "density": 1 } } }"#).unwrap();
        assert_eq!(s.objects["X"].shape, ShapeKind::Other("Torus".into()));
    }

    #[test] fn bad_orientation_length() {
        let r = SceneDescription::from_json_str(
            r#"{ "objects": { "X": { "shape": "Ball", "dims": [1], "density": 1, "orientation": [0, 0] } } }"#);
        assert!(matches!(r, Err(SceneError::Json(_))));
    }

    #[test] fn gravity_forms() {
        let s = SceneDescription::from_json_str(r#"{ "gravity": -3.7, "objects": {} }"#).unwrap();
        assert_eq!(s.gravity_or([0.0; 3]), [0.0, 0.0, -3.7]);
        let s = SceneDescription::from_json_str(r#"{ "gravity": [0, -9.81, 0] }"#).unwrap();
        assert_eq!(s.gravity_or([0.0; 3]), [0.0, -9.81, 0.0]);
    }

    #[test] fn names_are_one_namespace() {
        let r = SceneDescription::from_json_str(
            r#"{ "table": { "dims": [1, 1, 1] }, "objects": { "table": { "shape": "Ball", "dims": [1], "density": 1 } } }"#);
        assert!(matches!(r, Err(SceneError::DuplicateName(n)) if n == "table"));
    }

    #[test] fn mutation_returns_new_scene() {
        let s = SceneDescription::from_json_str(RAMP_SCENE).unwrap();
        let heavier = s.with_object("A", ObjectRecord { density: Some(8.0), ..s.objects["A"].clone() });
        assert_eq!(s.objects["A"].density, Some(2.0));
        assert_eq!(heavier.objects["A"].density, Some(8.0));
    }
}
