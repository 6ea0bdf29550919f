use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Material catalog is fixed. Densities are relative to wood, matching the
/// stimulus generator's unit convention (iron 7800, brick 2000, wood 700 kg/m^3,
/// rounded to 8 : 2 : 1).
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MaterialId {
    Wood,
    Brick,
    Iron,
}

pub const ALL: [MaterialId; 3] = [MaterialId::Wood, MaterialId::Brick, MaterialId::Iron];

/// Generator-side sampling bounds.
pub const DENSITY_BOUNDS: [f32; 2] = [0.01, 2000.0];
pub const FRICTION_BOUNDS: [f32; 2] = [0.001, 1.0];

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatProps {
    pub density: f32,   // relative units
    pub friction: f32,  // lateral, dimensionless
}

/// Base single-material table. Friction ratios follow the engineering toolbox
/// pairings (brick/wood 0.6, wood/iron 0.4) scaled to a common table surface.
pub fn props(id: MaterialId) -> MatProps {
    use MaterialId::*;
    match id {
        Wood  => MatProps { density: 1.0, friction: 0.263 },
        Brick => MatProps { density: 2.0, friction: 0.323 },
        Iron  => MatProps { density: 8.0, friction: 0.215 },
    }
}

#[inline] pub fn density_in_bounds(d: f32) -> bool { d >= DENSITY_BOUNDS[0] && d <= DENSITY_BOUNDS[1] }
#[inline] pub fn friction_in_bounds(f: f32) -> bool { f >= FRICTION_BOUNDS[0] && f <= FRICTION_BOUNDS[1] }

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self { MaterialId::Wood => "Wood", MaterialId::Brick => "Brick", MaterialId::Iron => "Iron" };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMaterial(pub String);

impl fmt::Display for UnknownMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown material {:?}", self.0) }
}
impl std::error::Error for UnknownMaterial {}

impl FromStr for MaterialId {
    type Err = UnknownMaterial;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .copied()
            .find(|m| m.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}
