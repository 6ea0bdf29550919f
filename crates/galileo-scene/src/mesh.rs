//! glTF/GLB vertex extraction for `Mesh` records.
//!
//! Only POSITION attributes are read. Node transforms are ignored: the hull is
//! built in the asset's mesh space and then scaled by the record's `dims`.

use std::path::Path;

use galileo_core::{vec3, Vec3};

use crate::error::{Result, SceneError};

/// All vertex positions of every primitive of every mesh in the asset.
pub fn load_mesh_points(path: &Path) -> Result<Vec<Vec3>> {
    let (doc, buffers, _images) = gltf::import(path)
        .map_err(|e| SceneError::Mesh { path: path.to_path_buf(), reason: e.to_string() })?;

    let mut pts = Vec::new();
    for mesh in doc.meshes() {
        for prim in mesh.primitives() {
            let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            if let Some(iter) = reader.read_positions() {
                pts.extend(iter.map(|p| vec3(p[0], p[1], p[2])));
            }
        }
    }

    if pts.len() < 4 {
        return Err(SceneError::Mesh {
            path: path.to_path_buf(),
            reason: format!("need at least 4 vertices for a hull, found {}", pts.len()),
        });
    }
    log::debug!("mesh {}: {} vertices", path.display(), pts.len());
    Ok(pts)
}

/// Component-wise scale; missing dims default to 1.
pub fn scale_points(pts: &[Vec3], dims: &[f32]) -> Vec<Vec3> {
    let s = vec3(
        dims.first().copied().unwrap_or(1.0),
        dims.get(1).copied().unwrap_or(1.0),
        dims.get(2).copied().unwrap_or(1.0),
    );
    pts.iter().map(|p| *p * s).collect()
}
