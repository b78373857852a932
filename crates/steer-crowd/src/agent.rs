//! Agent and obstacle records
//!
//! Records are stored in dense arrays and identified by their creation
//! index. Ids are never reused: removal is deliberately a no-op (the slot
//! stays allocated), so a handle held by the owning simulation can never
//! dangle. The owning simulation overwrites records every tick through
//! the setters on [`crate::CollisionAvoidanceSystem`].

use steer_common::{ActorHandle, Vec2, Vec3};

/// Identifier of an agent record; a dense index assigned on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub u32);

/// Identifier of an obstacle record; a dense index assigned on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObstacleId(pub u32);

/// A moving, circular, vertically-extruded agent
///
/// Invariant: `radius > 0` and `0 <= min_speed <= max_speed`; violations
/// are caught by debug assertions in the setters, not handled at runtime.
#[derive(Debug, Clone, Copy)]
pub struct Agent {
    /// World position (Z up)
    pub position: Vec3,
    /// Current velocity on the movement plane
    pub velocity: Vec2,
    /// Where the agent wants to go this tick; the avoidance output
    /// degrades to this value when no admissible velocity exists
    pub desired_velocity: Vec2,
    /// Facing direction, used for the neighbor visibility flag
    pub look_direction: Vec2,
    pub radius: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Handle back to the owning actor; used only for navmesh clamping
    pub actor: Option<ActorHandle>,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec2::ZERO,
            desired_velocity: Vec2::ZERO,
            look_direction: Vec2::X,
            radius: 0.5,
            min_speed: 0.0,
            max_speed: 2.0,
            actor: None,
        }
    }
}

/// A static or externally-moved circular obstacle
///
/// Obstacles carry no velocity: an agent avoiding one takes full
/// responsibility for the maneuver, unlike agent-agent pairs which split
/// it.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
}

impl Default for Obstacle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 0.5,
        }
    }
}
