pub mod ids;
pub mod types;
pub mod hash;
pub mod time;
pub mod rng;
pub mod config;

pub use ids::BodyId;
pub use types::{Vec3, Isometry, Velocity, vec3, iso, quat_from_euler, quat_from_wxyz};
pub use hash::{StepHasher, hash_vec3, hash_quat};
pub use time::{FrameClock, StepStats, ClockError};
pub use rng::XorShift64;
pub use config::{SimConfig, SurfaceParams, ObjectDefaults};
pub use glam::Quat;
