//! Per-tick collision avoidance for crowd agents
//!
//! This crate computes a collision-free steering velocity for every moving
//! agent in a crowd, once per simulation tick. Agents and obstacles are
//! registered as dense records; each update gathers nearby records, builds
//! half-plane constraint lines in velocity space, intersects them into a
//! feasible polygon and picks the admissible velocity closest to the
//! agent's desired velocity, optionally clamped against the navigation
//! mesh.
//!
//! # Example
//!
//! ```rust,ignore
//! use steer_crowd::{Agent, AvoidanceConfig, CollisionAvoidanceSystem};
//!
//! let mut system = CollisionAvoidanceSystem::new(AvoidanceConfig::default());
//! let id = system.create_agent(Agent {
//!     position: start_pos,
//!     desired_velocity: goal_vel,
//!     radius: 0.5,
//!     ..Default::default()
//! });
//!
//! // Every tick: refresh records, update, read back.
//! system.set_agent(id, agent_record)?;
//! system.update(dt, None, None, None);
//! let velocity = system.avoidance_velocity(id)?;
//! ```
//!
//! # Architecture
//!
//! - [`CollisionAvoidanceSystem`]: registries and the per-tick pipeline
//! - [`ConstraintLine`]: a directed half-plane boundary in velocity space
//! - [`FeasibleArea`]: fixed-capacity polygon clipping and the candidate
//!   velocity selection
//!
//! Avoidance is a best-effort overlay: when no admissible velocity exists
//! even after relaxation, the agent's desired velocity is emitted
//! unchanged. No call ever produces a NaN velocity.

pub mod agent;
pub mod config;
pub mod constraint;
pub mod solver;
pub mod system;

pub use agent::*;
pub use config::*;
pub use constraint::*;
pub use solver::*;
pub use system::*;

#[cfg(test)]
mod avoidance_scenario_tests;
