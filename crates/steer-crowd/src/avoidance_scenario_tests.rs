//! End-to-end scenarios for the collision avoidance system
//!
//! These tests drive the full per-tick pipeline: neighbor gathering,
//! constraint construction, feasible-region solving, candidate selection
//! and fallback degradation.

use steer_common::{
    ActorHandle, ActorRegistry, MeshId, NavAgentType, NavMeshQuery, NavRaycastResult, Vec2, Vec3,
};

use crate::{Agent, AvoidanceConfig, CollisionAvoidanceSystem, Obstacle};

fn system() -> CollisionAvoidanceSystem {
    CollisionAvoidanceSystem::new(AvoidanceConfig::default())
}

fn agent_at(x: f32, y: f32, desired: Vec2) -> Agent {
    Agent {
        position: Vec3::new(x, y, 0.0),
        velocity: desired,
        desired_velocity: desired,
        look_direction: desired.normalize_or_zero(),
        radius: 0.5,
        min_speed: 0.1,
        max_speed: 2.0,
        actor: None,
    }
}

#[test]
fn test_head_on_agents_get_mirrored_velocities() {
    let mut system = system();
    let a = system.create_agent(agent_at(-1.0, 0.0, Vec2::new(1.0, 0.0)));
    let b = system.create_agent(agent_at(1.0, 0.0, Vec2::new(-1.0, 0.0)));

    system.update(0.1, None, None, None);

    let va = system.avoidance_velocity(a).unwrap();
    let vb = system.avoidance_velocity(b).unwrap();

    assert!(va.is_finite() && vb.is_finite());
    // Fully symmetric inputs: the outputs are point reflections of each
    // other, and both deviate laterally to pass one another
    assert!((va + vb).length() < 1e-3, "va={va:?} vb={vb:?}");
    assert!(va.y.abs() > 0.1, "expected lateral deviation, got {va:?}");
    assert!(va.length() <= 2.0 + 1e-3);
}

#[test]
fn test_agent_steers_around_static_obstacle() {
    let mut system = system();
    system.create_obstacle(Obstacle {
        position: Vec3::ZERO,
        radius: 1.0,
    });
    let id = system.create_agent(agent_at(3.0, 0.0, Vec2::new(-1.0, 0.0)));

    system.update(0.1, None, None, None);

    let v = system.avoidance_velocity(id).unwrap();
    assert!(v.is_finite());
    // The straight line would collide: the selected velocity deflects
    // laterally around the obstacle and respects the speed limit
    assert!(v.y.abs() > 0.1, "expected lateral deflection, got {v:?}");
    assert!(v.x < 0.0, "agent should still make progress, got {v:?}");
    assert!(v.length() <= 2.0 + 1e-3);
}

#[test]
fn test_coincident_agents_do_not_crash_or_emit_nan() {
    let mut system = system();
    let a = system.create_agent(agent_at(0.0, 0.0, Vec2::new(1.0, 0.0)));
    let b = system.create_agent(agent_at(0.0, 0.0, Vec2::new(-1.0, 0.0)));

    system.update(0.1, None, None, None);

    // The degenerate pair is filtered out entirely; both agents keep
    // their desired velocities
    assert_eq!(system.avoidance_velocity(a).unwrap(), Vec2::new(1.0, 0.0));
    assert_eq!(system.avoidance_velocity(b).unwrap(), Vec2::new(-1.0, 0.0));
}

#[test]
fn test_neighbors_on_other_floor_are_ignored() {
    let mut system = system();
    let id = system.create_agent(agent_at(0.0, 0.0, Vec2::new(1.0, 0.0)));
    // Same lateral spot one storey up
    let mut above = agent_at(1.0, 0.0, Vec2::new(-1.0, 0.0));
    above.position.z = 3.0;
    system.create_agent(above);

    system.update(0.1, None, None, None);

    assert_eq!(system.avoidance_velocity(id).unwrap(), Vec2::new(1.0, 0.0));
}

#[test]
fn test_idle_agent_velocity_passes_through() {
    let mut system = system();
    let id = system.create_agent(agent_at(0.0, 0.0, Vec2::ZERO));
    system.create_obstacle(Obstacle {
        position: Vec3::new(0.6, 0.0, 0.0),
        radius: 0.5,
    });

    system.update(0.1, None, None, None);

    // Zero desired speed skips the solve entirely
    assert_eq!(system.avoidance_velocity(id).unwrap(), Vec2::ZERO);
}

#[test]
fn test_crowded_fallback_terminates() {
    let mut system = system();
    let id = system.create_agent(agent_at(0.0, 0.0, Vec2::new(1.0, 0.0)));

    // Surround the agent with more close neighbors than the solver will
    // consider, all pressing inward; the relaxation loop must terminate
    for i in 0..12 {
        let angle = i as f32 * std::f32::consts::TAU / 12.0;
        let (sin, cos) = angle.sin_cos();
        let position = Vec2::new(cos, sin) * 0.9;
        system.create_agent(agent_at(position.x, position.y, -position.normalize()));
    }

    system.update(0.1, None, None, None);

    let v = system.avoidance_velocity(id).unwrap();
    assert!(v.is_finite());
    assert!(v.length() <= 2.0 + 1e-3);
}

#[test]
fn test_registry_round_trip_and_noop_removal() {
    let mut system = system();
    let a = system.create_agent(agent_at(1.0, 2.0, Vec2::X));
    let o = system.create_obstacle(Obstacle {
        position: Vec3::new(5.0, 0.0, 0.0),
        radius: 2.0,
    });

    assert_eq!(system.agent_count(), 1);
    assert_eq!(system.get_agent(a).unwrap().position, Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(system.get_obstacle(o).unwrap().radius, 2.0);

    // Removal is a documented no-op: the slot stays valid
    system.remove_agent(a);
    system.remove_obstacle(o);
    assert_eq!(system.agent_count(), 1);
    assert!(system.get_agent(a).is_some());

    let mut updated = agent_at(9.0, 9.0, Vec2::X);
    updated.radius = 0.7;
    system.set_agent(a, updated).unwrap();
    assert_eq!(system.get_agent(a).unwrap().radius, 0.7);

    system.reset(false);
    assert_eq!(system.agent_count(), 0);
    assert!(system.avoidance_velocity(a).is_err());
}

struct OneMeshNav {
    hit_distance: Option<f32>,
}

impl NavMeshQuery for OneMeshNav {
    fn enclosing_mesh(&self, _agent_type: NavAgentType, _position: Vec3) -> Option<MeshId> {
        Some(MeshId(1))
    }

    fn raycast_in_mesh(&self, _mesh: MeshId, _from: Vec3, _to: Vec3) -> NavRaycastResult {
        match self.hit_distance {
            Some(distance) => NavRaycastResult {
                hit: true,
                distance,
            },
            None => NavRaycastResult {
                hit: false,
                distance: 0.0,
            },
        }
    }
}

struct FixedActors;

impl ActorRegistry for FixedActors {
    fn nav_agent_type(&self, _actor: ActorHandle) -> Option<NavAgentType> {
        Some(NavAgentType(0))
    }

    fn world_position(&self, _actor: ActorHandle) -> Option<Vec3> {
        Some(Vec3::ZERO)
    }
}

#[test]
fn test_nav_mesh_clamp_scales_velocity_down() {
    let mut system = system();
    let mut agent = agent_at(0.0, 0.0, Vec2::new(1.0, 0.0));
    agent.actor = Some(ActorHandle(7));
    let id = system.create_agent(agent);

    // Mesh boundary halfway along the 0.1 unit displacement
    let nav = OneMeshNav {
        hit_distance: Some(0.05),
    };
    system.update(0.1, Some(&nav), Some(&FixedActors), None);

    let v = system.avoidance_velocity(id).unwrap();
    assert!((v - Vec2::new(0.5, 0.0)).length() < 1e-4, "got {v:?}");
}

struct RelocatedActors;

impl ActorRegistry for RelocatedActors {
    fn nav_agent_type(&self, _actor: ActorHandle) -> Option<NavAgentType> {
        Some(NavAgentType(0))
    }

    fn world_position(&self, _actor: ActorHandle) -> Option<Vec3> {
        Some(Vec3::new(10.0, 0.0, 0.0))
    }
}

struct FarBoundaryNav;

impl NavMeshQuery for FarBoundaryNav {
    fn enclosing_mesh(&self, _agent_type: NavAgentType, _position: Vec3) -> Option<MeshId> {
        Some(MeshId(1))
    }

    fn raycast_in_mesh(&self, _mesh: MeshId, from: Vec3, _to: Vec3) -> NavRaycastResult {
        // Boundary exists only on the far side of x = 5
        if from.x > 5.0 {
            NavRaycastResult {
                hit: true,
                distance: 0.05,
            }
        } else {
            NavRaycastResult {
                hit: false,
                distance: 0.0,
            }
        }
    }
}

#[test]
fn test_nav_mesh_clamp_follows_registry_transform() {
    let mut system = system();
    let mut agent = agent_at(0.0, 0.0, Vec2::new(1.0, 0.0));
    agent.actor = Some(ActorHandle(7));
    let id = system.create_agent(agent);

    // The registry places the actor across the boundary while the record
    // still says origin; the clamp must cast from the registry transform
    system.update(0.1, Some(&FarBoundaryNav), Some(&RelocatedActors), None);

    let v = system.avoidance_velocity(id).unwrap();
    assert!((v - Vec2::new(0.5, 0.0)).length() < 1e-4, "got {v:?}");
}

#[test]
fn test_nav_mesh_clean_miss_keeps_velocity() {
    let mut system = system();
    let mut agent = agent_at(0.0, 0.0, Vec2::new(1.0, 0.0));
    agent.actor = Some(ActorHandle(7));
    let id = system.create_agent(agent);

    let nav = OneMeshNav { hit_distance: None };
    system.update(0.1, Some(&nav), Some(&FixedActors), None);

    assert_eq!(system.avoidance_velocity(id).unwrap(), Vec2::new(1.0, 0.0));
}

#[test]
fn test_debug_renderer_receives_constraint_geometry() {
    use steer_common::debug::DebugBuffer;

    let mut system = system();
    system.create_obstacle(Obstacle {
        position: Vec3::ZERO,
        radius: 1.0,
    });
    system.create_agent(agent_at(3.0, 0.0, Vec2::new(-1.0, 0.0)));

    let mut buffer = DebugBuffer::new();
    system.update(0.1, None, None, Some(&mut buffer));
    assert!(!buffer.lines.is_empty());
}
