//! Construction of half-plane constraint lines in velocity space
//!
//! Every nearby agent or obstacle contributes one directed line; the set
//! of admissible velocities is the intersection of the "left of" half
//! planes. Lines are transient and rebuilt from scratch every tick.

use steer_common::{det, sqr, Vec2, TIGHT_EPSILON};

use crate::{Agent, AvoidanceConfig, Obstacle};

/// What kind of record a constraint line originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Agent,
    Obstacle,
}

/// A directed half-plane boundary in 2D velocity space.
///
/// Velocities to the left of the line (positive side of
/// `det(direction, v - point)`) are admissible.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintLine {
    pub point: Vec2,
    /// Unit direction along the boundary
    pub direction: Vec2,
    pub kind: ConstraintKind,
    /// Dense index of the originating record, for debug visualization
    pub source: usize,
}

/// Transient neighbor record produced by the per-agent scan
#[derive(Debug, Clone, Copy)]
pub struct NearbyAgent {
    pub index: usize,
    pub distance_sq: f32,
    /// Whether the neighbor is itself in motion; a stationary agent is
    /// avoided like an obstacle
    pub moving: bool,
    /// Whether the neighbor is facing this agent; only a neighbor that
    /// can see us shares the avoidance effort
    pub can_see_me: bool,
}

/// Transient obstacle neighbor record
#[derive(Debug, Clone, Copy)]
pub struct NearbyObstacle {
    pub index: usize,
    pub distance_sq: f32,
}

/// Builds the constraint line for an agent-obstacle pair. The obstacle
/// contributes nothing to the maneuver, so the full displacement `u` is
/// applied on this agent's side.
pub fn obstacle_constraint_line(
    agent: &Agent,
    obstacle: &Obstacle,
    source: usize,
    horizon_scale: f32,
    config: &AvoidanceConfig,
) -> Option<ConstraintLine> {
    let rel_pos = (obstacle.position - agent.position).truncate();
    let radii = agent.radius + obstacle.radius;
    let horizon = config.obstacle_time_horizon * horizon_scale;

    let (point, direction) = half_plane_for_disc(
        agent.desired_velocity,
        agent.desired_velocity,
        rel_pos,
        radii,
        horizon,
        config.time_step,
        1.0,
    )?;

    Some(ConstraintLine {
        point,
        direction,
        kind: ConstraintKind::Obstacle,
        source,
    })
}

/// Builds the constraint line for an agent-agent pair.
///
/// A moving neighbor that can see us splits the avoidance effort 50/50
/// (reciprocal constraint); a moving neighbor that cannot see us leaves
/// the full effort to this agent; a stationary neighbor degrades to
/// obstacle-style geometry with the obstacle horizon.
pub fn agent_constraint_line(
    agent: &Agent,
    other: &Agent,
    nearby: &NearbyAgent,
    horizon_scale: f32,
    config: &AvoidanceConfig,
) -> Option<ConstraintLine> {
    let rel_pos = (other.position - agent.position).truncate();
    let radii = agent.radius + other.radius;

    let (other_vel, horizon, effort) = if !nearby.moving {
        (Vec2::ZERO, config.obstacle_time_horizon, 1.0)
    } else if nearby.can_see_me {
        (other.velocity, config.agent_time_horizon, 0.5)
    } else {
        (other.velocity, config.agent_time_horizon, 1.0)
    };

    let (point, direction) = half_plane_for_disc(
        agent.desired_velocity - other_vel,
        agent.desired_velocity,
        rel_pos,
        radii,
        horizon * horizon_scale,
        config.time_step,
        effort,
    )?;

    Some(ConstraintLine {
        point,
        direction,
        kind: ConstraintKind::Agent,
        source: nearby.index,
    })
}

/// Core velocity-obstacle geometry for a disc at `rel_pos` with combined
/// radius `radii`, seen from the origin of relative velocity space.
///
/// `v_rel` is the relative reference velocity, `base` the velocity the
/// resulting line is anchored around, `effort` the share of the
/// displacement taken by this agent. Returns `None` when the geometry is
/// too degenerate to produce a stable line; the caller simply skips the
/// term.
fn half_plane_for_disc(
    v_rel: Vec2,
    base: Vec2,
    rel_pos: Vec2,
    radii: f32,
    horizon: f32,
    time_step: f32,
    effort: f32,
) -> Option<(Vec2, Vec2)> {
    let dist_sq = rel_pos.length_squared();
    let radii_sq = sqr(radii);

    if horizon < TIGHT_EPSILON || time_step < TIGHT_EPSILON {
        return None;
    }

    let (u, direction) = if dist_sq <= radii_sq {
        // Already overlapping: push out of the disc within one tick
        let inv_dt = 1.0 / time_step;
        let w = v_rel - rel_pos * inv_dt;
        let w_len = w.length();
        if w_len < TIGHT_EPSILON {
            return None;
        }
        let unit_w = w / w_len;
        (
            unit_w * (radii * inv_dt - w_len),
            Vec2::new(unit_w.y, -unit_w.x),
        )
    } else if predicted_collision(v_rel, rel_pos, radii, horizon) {
        // On collision course within the horizon: constrain along the
        // velocity-obstacle leg on the side the agent already tends to,
        // steering it around the disc instead of merely slowing it down
        let leg = (dist_sq - radii_sq).sqrt();
        let direction = if det(rel_pos, v_rel) > 0.0 {
            Vec2::new(
                rel_pos.x * leg - rel_pos.y * radii,
                rel_pos.x * radii + rel_pos.y * leg,
            ) / dist_sq
        } else {
            -Vec2::new(
                rel_pos.x * leg + rel_pos.y * radii,
                -rel_pos.x * radii + rel_pos.y * leg,
            ) / dist_sq
        };
        (direction * v_rel.dot(direction) - v_rel, direction)
    } else {
        // No predicted collision: a mild constraint at the cutoff circle
        // keeps the reference velocity admissible
        let cutoff_center = rel_pos / horizon;
        let w = v_rel - cutoff_center;
        let w_len = w.length();
        if w_len < TIGHT_EPSILON {
            return None;
        }
        let unit_w = w / w_len;
        (
            unit_w * (radii / horizon - w_len),
            Vec2::new(unit_w.y, -unit_w.x),
        )
    };

    Some((base + u * effort, direction))
}

/// Whether a point moving from the origin with velocity `v` enters the
/// disc at `center` with radius `radius` within `horizon` seconds
fn predicted_collision(v: Vec2, center: Vec2, radius: f32, horizon: f32) -> bool {
    match intersect_ray_circle(v, center, radius) {
        Some(t) => t < horizon,
        None => false,
    }
}

/// First non-negative ray parameter where `origin + dir * t` touches the
/// circle, or `None` when the ray misses or is degenerate
pub fn intersect_ray_circle(dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let a = dir.length_squared();
    if a < TIGHT_EPSILON {
        return None;
    }
    let b = -2.0 * dir.dot(center);
    let c = center.length_squared() - sqr(radius);
    let discr = sqr(b) - 4.0 * a * c;
    if discr < 0.0 {
        return None;
    }

    let sqrt_discr = discr.sqrt();
    let t1 = (-b - sqrt_discr) / (2.0 * a);
    let t2 = (-b + sqrt_discr) / (2.0 * a);
    if t1 >= 0.0 {
        Some(t1)
    } else if t2 >= 0.0 {
        Some(t2)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steer_common::{line_side, Vec3};

    fn config() -> AvoidanceConfig {
        AvoidanceConfig::default()
    }

    #[test]
    fn test_ray_circle_hit() {
        let t = intersect_ray_circle(Vec2::new(1.0, 0.0), Vec2::new(5.0, 0.0), 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_circle_miss() {
        assert!(intersect_ray_circle(Vec2::new(0.0, 1.0), Vec2::new(5.0, 0.0), 1.0).is_none());
        // Degenerate direction
        assert!(intersect_ray_circle(Vec2::ZERO, Vec2::new(5.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_head_on_obstacle_makes_desired_infeasible() {
        let agent = Agent {
            position: Vec3::new(3.0, 0.0, 0.0),
            desired_velocity: Vec2::new(-1.0, 0.0),
            velocity: Vec2::new(-1.0, 0.0),
            radius: 0.5,
            ..Default::default()
        };
        let obstacle = Obstacle {
            position: Vec3::ZERO,
            radius: 1.0,
        };

        let line = obstacle_constraint_line(&agent, &obstacle, 0, 1.0, &config()).unwrap();
        assert_eq!(line.kind, ConstraintKind::Obstacle);
        assert!((line.direction.length() - 1.0).abs() < 1e-4);
        // The desired velocity heads straight into the obstacle and must
        // end up on the forbidden side of the line
        assert!(line_side(line.point, line.direction, agent.desired_velocity) < 0.0);
    }

    #[test]
    fn test_distant_obstacle_keeps_desired_feasible() {
        let agent = Agent {
            position: Vec3::new(9.0, 0.0, 0.0),
            desired_velocity: Vec2::new(-0.2, 0.0),
            radius: 0.5,
            ..Default::default()
        };
        let obstacle = Obstacle {
            position: Vec3::ZERO,
            radius: 1.0,
        };

        // Closing at 0.2 u/s over a 7.5 unit gap: nothing happens within
        // the 2.5 s horizon
        let line = obstacle_constraint_line(&agent, &obstacle, 0, 1.0, &config()).unwrap();
        assert!(line_side(line.point, line.direction, agent.desired_velocity) >= -1e-4);
    }

    #[test]
    fn test_reciprocal_pair_is_point_symmetric() {
        let a = Agent {
            position: Vec3::new(-1.0, 0.0, 0.0),
            velocity: Vec2::new(1.0, 0.0),
            desired_velocity: Vec2::new(1.0, 0.0),
            radius: 0.5,
            ..Default::default()
        };
        let b = Agent {
            position: Vec3::new(1.0, 0.0, 0.0),
            velocity: Vec2::new(-1.0, 0.0),
            desired_velocity: Vec2::new(-1.0, 0.0),
            radius: 0.5,
            ..Default::default()
        };
        let nearby = NearbyAgent {
            index: 0,
            distance_sq: 4.0,
            moving: true,
            can_see_me: true,
        };

        let la = agent_constraint_line(&a, &b, &nearby, 1.0, &config()).unwrap();
        let lb = agent_constraint_line(&b, &a, &nearby, 1.0, &config()).unwrap();

        // Mirrored inputs produce point-reflected lines
        assert!((la.point + lb.point).length() < 1e-4);
        assert!((la.direction + lb.direction).length() < 1e-4);
    }

    #[test]
    fn test_stationary_neighbor_uses_obstacle_geometry() {
        let a = Agent {
            position: Vec3::ZERO,
            desired_velocity: Vec2::new(1.0, 0.0),
            radius: 0.5,
            ..Default::default()
        };
        let idle = Agent {
            position: Vec3::new(2.0, 0.0, 0.0),
            velocity: Vec2::ZERO,
            desired_velocity: Vec2::ZERO,
            radius: 0.5,
            ..Default::default()
        };
        let nearby = NearbyAgent {
            index: 3,
            distance_sq: 4.0,
            moving: false,
            can_see_me: false,
        };

        let line = agent_constraint_line(&a, &idle, &nearby, 1.0, &config()).unwrap();
        assert_eq!(line.kind, ConstraintKind::Agent);
        assert_eq!(line.source, 3);
        // Heading into a stationary agent must be forbidden
        assert!(line_side(line.point, line.direction, a.desired_velocity) < 0.0);
    }
}
