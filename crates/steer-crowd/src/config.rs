//! Tuning parameters for the avoidance solver
//!
//! All parameters are passed explicitly at construction so the solver can
//! be unit-tested with fixed values; there is no hidden global state.

/// Configuration for [`crate::CollisionAvoidanceSystem`]
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AvoidanceConfig {
    /// Look-ahead horizon for agent-obstacle constraints, in seconds
    pub obstacle_time_horizon: f32,
    /// Look-ahead horizon for agent-agent constraints, in seconds
    pub agent_time_horizon: f32,
    /// Nominal tick duration; also scales the navmesh clamp displacement
    pub time_step: f32,
    /// Candidate velocities slower than this are not worth steering to
    pub min_speed: f32,
    /// Only the nearest this-many agents contribute constraint lines
    pub max_agents_considered: usize,
    /// Neighbor search range, in world units
    pub range: f32,
    /// Whether selected velocities are clamped against the navigation mesh
    pub clamp_with_nav_mesh: bool,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            obstacle_time_horizon: 2.5,
            agent_time_horizon: 2.5,
            time_step: 0.1,
            min_speed: 0.1,
            max_agents_considered: 8,
            range: 10.0,
            clamp_with_nav_mesh: true,
        }
    }
}
