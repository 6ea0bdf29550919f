//! Scene descriptions, traces and checkpoints for galileo, plus their JSON and
//! glTF IO. Nothing here touches the physics engine.

pub mod error;
pub mod scene;
pub mod mesh;
pub mod resolve;
pub mod placement;
pub mod pairs;
pub mod trace;
pub mod analysis;

use std::path::Path;

use blake3::Hasher;
use serde::Serialize;

pub use error::{Result, SceneError};
pub use scene::{Gravity, InitialVelocity, ObjectRecord, Orientation, SceneDescription, ShapeKind, SurfaceRecord};
pub use resolve::{initial_overlaps, resolve_object, resolve_scene, resolve_surface, BodySpec};
pub use placement::{pct_to_coord, place_object, ramp_scene};
pub use pairs::{PairCache, PairTable};
pub use trace::{capture, Checkpoint, FrameSample, Trace};
pub use analysis::{direction, first_contact_frames, kinetic_energy, stability};

/// Stable blake3 digest of the scene's canonical (sorted-key, compact) JSON.
pub fn scene_hash(scene: &SceneDescription) -> Result<[u8; 32]> {
    let canon = scene.to_json_string(false)?;
    let mut h = Hasher::new();
    h.update(b"SCENEv1\0");
    h.update(&(canon.len() as u64).to_le_bytes());
    h.update(canon.as_bytes());
    Ok(*h.finalize().as_bytes())
}

/// Write any scene/trace/checkpoint to JSON at `out_path`.
pub fn write_json<T: Serialize>(value: &T, out_path: &Path, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(out_path, json).map_err(|e| SceneError::io(out_path, e))?;
    Ok(())
}

/// Hex helper (lowercase)
pub fn hex32(bytes: &[u8; 32]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(64);
    for &b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 0x0f) as usize] as char);
    }
    s
}
