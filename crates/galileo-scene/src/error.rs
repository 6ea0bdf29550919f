//! Error types for galileo-scene.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("unsupported shape {shape:?} for object {name:?}")]
    UnsupportedShape { name: String, shape: String },

    #[error("invalid field {field} on {name:?}: {reason}")]
    InvalidField { name: String, field: &'static str, reason: String },

    #[error("missing required field {field} on {name:?}")]
    MissingField { name: String, field: &'static str },

    #[error("duplicate name {0:?} (objects and static surfaces share one namespace)")]
    DuplicateName(String),

    #[error("mesh asset {path}: {reason}")]
    Mesh { path: PathBuf, reason: String },

    #[error("frame {index} out of range (trace has {frames} frames)")]
    FrameOutOfRange { index: usize, frames: usize },

    #[error("trace object lists differ: {left:?} vs {right:?}")]
    ObjectMismatch { left: Vec<String>, right: Vec<String> },

    #[error("malformed trace: {0}")]
    MalformedTrace(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;

impl SceneError {
    pub(crate) fn invalid(name: &str, field: &'static str, reason: impl Into<String>) -> Self {
        SceneError::InvalidField { name: name.to_string(), field, reason: reason.into() }
    }
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SceneError::Io { path: path.into(), source }
    }
}
