//! Common utilities and collaborator interfaces used by the steering
//! and walkability crates

pub mod debug;
mod geometry;
mod math;
mod query;

pub use geometry::*;
pub use math::*;
pub use query::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Represents a point or direction in 2D velocity space
pub type Vec2 = glam::Vec2;

/// Represents an orientation
pub type Quat = glam::Quat;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid agent: {0}")]
    InvalidAgent(String),

    #[error("invalid obstacle: {0}")]
    InvalidObstacle(String),
}

/// Result type for steering operations
pub type Result<T> = std::result::Result<T, Error>;
