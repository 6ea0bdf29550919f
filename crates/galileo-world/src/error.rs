use galileo_core::ClockError;
use galileo_scene::SceneError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error("unknown object {0:?}")]
    UnknownObject(String),

    #[error("object {0:?} tracked more than once")]
    DuplicateObject(String),

    #[error("world used before a successful set_world")]
    WorldNotBuilt,

    #[error("engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl SimError {
    /// Lookup failures (unknown name, unbuilt world), as opposed to configuration
    /// or engine faults.
    pub fn is_lookup(&self) -> bool {
        matches!(self, SimError::UnknownObject(_) | SimError::WorldNotBuilt)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
