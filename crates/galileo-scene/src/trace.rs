use std::path::Path;

use galileo_core::StepHasher;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::pairs::PairTable;

/* ─────────────────────────  Trace ───────────────────────── */

/// Per-frame kinematic record of the tracked objects. Row = frame, column =
/// position in `objects`. Rotations are `[x, y, z, w]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub objects: Vec<String>,
    pub fps: u32,
    pub time_step: u32,
    pub position: Vec<Vec<[f32; 3]>>,
    pub rotation: Vec<Vec<[f32; 4]>>,
    pub angular_velocity: Vec<Vec<[f32; 3]>>,
    pub linear_velocity: Vec<Vec<[f32; 3]>>,
    /// Contact points per unordered pair, columns in `combinations(0..n, 2)` order.
    pub collisions: Vec<Vec<u32>>,
}

/// One recorded frame, columns already in tracked order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSample {
    pub position: Vec<[f32; 3]>,
    pub rotation: Vec<[f32; 4]>,
    pub linear_velocity: Vec<[f32; 3]>,
    pub angular_velocity: Vec<[f32; 3]>,
    pub collisions: Vec<u32>,
}

impl Trace {
    pub fn with_capacity(objects: Vec<String>, fps: u32, time_step: u32, frames: usize) -> Self {
        Self {
            objects,
            fps,
            time_step,
            position: Vec::with_capacity(frames),
            rotation: Vec::with_capacity(frames),
            angular_velocity: Vec::with_capacity(frames),
            linear_velocity: Vec::with_capacity(frames),
            collisions: Vec::with_capacity(frames),
        }
    }

    #[inline] pub fn frames(&self) -> usize { self.position.len() }
    #[inline] pub fn tracked(&self) -> usize { self.objects.len() }

    pub fn push_frame(&mut self, f: FrameSample) {
        self.position.push(f.position);
        self.rotation.push(f.rotation);
        self.linear_velocity.push(f.linear_velocity);
        self.angular_velocity.push(f.angular_velocity);
        self.collisions.push(f.collisions);
    }

    pub fn object_index(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o == name)
    }

    /// Collision column for the pair of named objects.
    pub fn pair_index(&self, a: &str, b: &str) -> Option<usize> {
        PairTable::new(self.tracked()).index(self.object_index(a)?, self.object_index(b)?)
    }

    /// Every array has `frames` rows of the right width.
    pub fn validate(&self) -> Result<()> {
        let n = self.tracked();
        let frames = self.frames();
        let pairs = n * n.saturating_sub(1) / 2;
        let rows_ok = self.rotation.len() == frames
            && self.linear_velocity.len() == frames
            && self.angular_velocity.len() == frames
            && self.collisions.len() == frames;
        if !rows_ok {
            return Err(SceneError::MalformedTrace("arrays disagree on frame count".into()));
        }
        for k in 0..frames {
            let widths_ok = self.position[k].len() == n
                && self.rotation[k].len() == n
                && self.linear_velocity[k].len() == n
                && self.angular_velocity[k].len() == n
                && self.collisions[k].len() == pairs;
            if !widths_ok {
                return Err(SceneError::MalformedTrace(format!("frame {k} has the wrong width for {n} objects")));
            }
        }
        Ok(())
    }

    /// Frames `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Trace> {
        if start > end || end > self.frames() {
            return Err(SceneError::FrameOutOfRange { index: end.max(start), frames: self.frames() });
        }
        Ok(Trace {
            objects: self.objects.clone(),
            fps: self.fps,
            time_step: self.time_step,
            position: self.position[start..end].to_vec(),
            rotation: self.rotation[start..end].to_vec(),
            angular_velocity: self.angular_velocity[start..end].to_vec(),
            linear_velocity: self.linear_velocity[start..end].to_vec(),
            collisions: self.collisions[start..end].to_vec(),
        })
    }

    /// `self` followed by `next`. Both must track the same objects at the same rates.
    pub fn concat(&self, next: &Trace) -> Result<Trace> {
        if self.objects != next.objects {
            return Err(SceneError::ObjectMismatch { left: self.objects.clone(), right: next.objects.clone() });
        }
        if self.fps != next.fps || self.time_step != next.time_step {
            return Err(SceneError::MalformedTrace(format!(
                "rate mismatch: {}/{} vs {}/{}", self.time_step, self.fps, next.time_step, next.fps)));
        }
        let mut out = self.clone();
        out.position.extend_from_slice(&next.position);
        out.rotation.extend_from_slice(&next.rotation);
        out.angular_velocity.extend_from_slice(&next.angular_velocity);
        out.linear_velocity.extend_from_slice(&next.linear_velocity);
        out.collisions.extend_from_slice(&next.collisions);
        Ok(out)
    }

    /// blake3 over names, rates and every sample, little-endian.
    pub fn trace_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::tagged(b"TRACEv1\0");
        for o in &self.objects { h.update_str(o); }
        h.update_u32(self.fps);
        h.update_u32(self.time_step);
        for k in 0..self.frames() {
            for p in &self.position[k] { h.update_f32s(p); }
            for q in &self.rotation[k] { h.update_f32s(q); }
            for v in &self.linear_velocity[k] { h.update_f32s(v); }
            for w in &self.angular_velocity[k] { h.update_f32s(w); }
            for c in &self.collisions[k] { h.update_u32(*c); }
        }
        h.finalize()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let t: Trace = serde_json::from_str(s)?;
        t.validate()?;
        Ok(t)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        Ok(if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? })
    }
}

/* ─────────────────────────  Checkpoint ───────────────────────── */

/// Full kinematic state of the tracked set at one frame. Every field is
/// required on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub objects: Vec<String>,
    pub positions: Vec<[f32; 3]>,
    /// `[x, y, z, w]`, same as traces.
    pub rotations: Vec<[f32; 4]>,
    pub linear_velocities: Vec<[f32; 3]>,
    pub angular_velocities: Vec<[f32; 3]>,
}

impl Checkpoint {
    #[inline] pub fn len(&self) -> usize { self.objects.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.objects.is_empty() }

    pub fn validate(&self) -> Result<()> {
        let n = self.objects.len();
        if self.positions.len() != n || self.rotations.len() != n
            || self.linear_velocities.len() != n || self.angular_velocities.len() != n {
            return Err(SceneError::MalformedTrace(format!("checkpoint arrays do not all have {n} entries")));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let c: Checkpoint = serde_json::from_str(s)?;
        c.validate()?;
        Ok(c)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        Ok(if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? })
    }
}

/// Frame `k` of `trace` as a checkpoint. Pure read. Negative-style indexing is
/// not supported; use `trace.frames() - 1` for the last frame.
pub fn capture(trace: &Trace, k: usize) -> Result<Checkpoint> {
    if k >= trace.frames() {
        return Err(SceneError::FrameOutOfRange { index: k, frames: trace.frames() });
    }
    Ok(Checkpoint {
        objects: trace.objects.clone(),
        positions: trace.position[k].clone(),
        rotations: trace.rotation[k].clone(),
        linear_velocities: trace.linear_velocity[k].clone(),
        angular_velocities: trace.angular_velocity[k].clone(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two objects moving along x at different speeds, touching from frame 2.
    pub(crate) fn toy_trace(frames: usize) -> Trace {
        let mut t = Trace::with_capacity(vec!["A".into(), "B".into()], 60, 240, frames);
        for k in 0..frames {
            let x = k as f32 * 0.1;
            t.push_frame(FrameSample {
                position: vec![[x, 0.0, 0.5], [2.0 * x, 1.0, 0.5]],
                rotation: vec![[0.0, 0.0, 0.0, 1.0]; 2],
                linear_velocity: vec![[6.0, 0.0, 0.0], [12.0, 0.0, 0.0]],
                angular_velocity: vec![[0.0; 3]; 2],
                collisions: vec![if k >= 2 { 4 } else { 0 }],
            });
        }
        t
    }

    #[test] fn shapes_validate() {
        let t = toy_trace(5);
        assert_eq!(t.frames(), 5);
        t.validate().unwrap();
        let mut bad = t.clone();
        bad.collisions[3].push(1);
        assert!(bad.validate().is_err());
    }

    #[test] fn json_field_names() {
        let v: serde_json::Value = serde_json::from_str(&toy_trace(1).to_json_string(false).unwrap()).unwrap();
        for k in ["position", "rotation", "angular_velocity", "linear_velocity", "collisions", "objects", "fps", "time_step"] {
            assert!(v.get(k).is_some(), "missing {k}");
        }
        assert_eq!(v["rotation"][0][0], serde_json::json!([0.0, 0.0, 0.0, 1.0]));
    }

    #[test] fn slice_and_concat_invert() {
        let t = toy_trace(6);
        let a = t.slice(0, 4).unwrap();
        let b = t.slice(4, 6).unwrap();
        assert_eq!(a.concat(&b).unwrap(), t);
        assert!(t.slice(3, 7).is_err());
    }

    #[test] fn concat_rejects_other_objects() {
        let a = toy_trace(2);
        let mut b = toy_trace(2);
        b.objects.reverse();
        assert!(matches!(a.concat(&b), Err(SceneError::ObjectMismatch { .. })));
    }

    #[test] fn pair_lookup_by_name() {
        let t = toy_trace(1);
        assert_eq!(t.pair_index("B", "A"), Some(0));
        assert_eq!(t.pair_index("A", "C"), None);
    }

    #[test] fn capture_reads_one_frame() {
        let t = toy_trace(4);
        let c = capture(&t, 3).unwrap();
        assert_eq!(c.positions[1], t.position[3][1]);
        assert_eq!(c.linear_velocities[0], [6.0, 0.0, 0.0]);
        assert!(matches!(capture(&t, 4), Err(SceneError::FrameOutOfRange { index: 4, frames: 4 })));
    }

    #[test] fn checkpoint_requires_named_fields() {
        let c = capture(&toy_trace(2), 1).unwrap();
        let back = Checkpoint::from_json_str(&c.to_json_string(true).unwrap()).unwrap();
        assert_eq!(back, c);
        let positional = r#"{ "objects": ["A"], "positions": [[0,0,0]], "rotations": [[0,0,0,1]], "velocities": [[0,0,0]] }"#;
        assert!(Checkpoint::from_json_str(positional).is_err());
    }

    #[test] fn hash_tracks_content() {
        let t = toy_trace(3);
        let mut u = t.clone();
        assert_eq!(t.trace_hash(), u.trace_hash());
        u.position[2][0][2] += 1e-3;
        assert_ne!(t.trace_hash(), u.trace_hash());
    }
}
