//! The per-tick collision avoidance system
//!
//! Owns the agent/obstacle registries and all transient per-tick buffers.
//! Single-threaded by design: `update` runs to completion on the
//! simulation thread, and the scratch buffers are cleared in place rather
//! than reallocated so steady-state allocation is near zero.

use steer_common::debug::{Color, DebugRenderer};
use steer_common::{
    sqr, ActorRegistry, Error, NavMeshQuery, Result, Vec2, Vec3, EPSILON, TIGHT_EPSILON,
};

use crate::{
    agent_constraint_line, collect_candidates, compute_feasible_area, obstacle_constraint_line,
    Agent, AgentId, AvoidanceConfig, ConstraintKind, ConstraintLine, NearbyAgent, NearbyObstacle,
    Obstacle, ObstacleId, VelocityCandidate,
};

/// Neighbors on a different floor are ignored; height differences below
/// this are treated as the same walkable level
const VERTICAL_FLOOR_BAND: f32 = 2.0;

/// Horizon multiplier applied on retry after a failed solve
const HORIZON_RETRY_SCALE: f32 = 0.25;

/// Upper bound on the displacement ray used for navmesh clamping
const MAX_CLAMP_DISTANCE: f32 = 1.0;

/// Per-tick scratch buffers, reused across ticks
#[derive(Debug, Default)]
struct Scratch {
    nearby_agents: Vec<NearbyAgent>,
    nearby_obstacles: Vec<NearbyObstacle>,
    lines: Vec<ConstraintLine>,
    candidates: Vec<VelocityCandidate>,
}

impl Scratch {
    fn release(&mut self) {
        *self = Scratch::default();
    }
}

/// Computes one avoidance velocity per registered agent, every tick
#[derive(Debug)]
pub struct CollisionAvoidanceSystem {
    config: AvoidanceConfig,
    agents: Vec<Agent>,
    obstacles: Vec<Obstacle>,
    avoidance_velocities: Vec<Vec2>,
    scratch: Scratch,
}

impl CollisionAvoidanceSystem {
    pub fn new(config: AvoidanceConfig) -> Self {
        Self {
            config,
            agents: Vec::new(),
            obstacles: Vec::new(),
            avoidance_velocities: Vec::new(),
            scratch: Scratch::default(),
        }
    }

    pub fn config(&self) -> &AvoidanceConfig {
        &self.config
    }

    /// Appends a new agent record and returns its id. Ids are dense
    /// indices and are never reused.
    pub fn create_agent(&mut self, agent: Agent) -> AgentId {
        debug_assert!(agent.radius > 0.0);
        debug_assert!(0.0 <= agent.min_speed && agent.min_speed <= agent.max_speed);
        let id = AgentId(self.agents.len() as u32);
        self.avoidance_velocities.push(agent.desired_velocity);
        self.agents.push(agent);
        id
    }

    /// Overwrites an agent record; called once per tick by the owning
    /// simulation
    pub fn set_agent(&mut self, id: AgentId, agent: Agent) -> Result<()> {
        debug_assert!(agent.radius > 0.0);
        debug_assert!(0.0 <= agent.min_speed && agent.min_speed <= agent.max_speed);
        match self.agents.get_mut(id.0 as usize) {
            Some(slot) => {
                *slot = agent;
                Ok(())
            }
            None => Err(Error::InvalidAgent(format!("no agent with id {}", id.0))),
        }
    }

    pub fn get_agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0 as usize)
    }

    /// Deliberate no-op: ids are permanent slots. Kept so hosts can pair
    /// every create with a remove without special-casing this registry.
    pub fn remove_agent(&mut self, _id: AgentId) {}

    pub fn create_obstacle(&mut self, obstacle: Obstacle) -> ObstacleId {
        debug_assert!(obstacle.radius > 0.0);
        let id = ObstacleId(self.obstacles.len() as u32);
        self.obstacles.push(obstacle);
        id
    }

    pub fn set_obstacle(&mut self, id: ObstacleId, obstacle: Obstacle) -> Result<()> {
        debug_assert!(obstacle.radius > 0.0);
        match self.obstacles.get_mut(id.0 as usize) {
            Some(slot) => {
                *slot = obstacle;
                Ok(())
            }
            None => Err(Error::InvalidObstacle(format!(
                "no obstacle with id {}",
                id.0
            ))),
        }
    }

    pub fn get_obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(id.0 as usize)
    }

    /// Deliberate no-op, mirroring [`Self::remove_agent`]
    pub fn remove_obstacle(&mut self, _id: ObstacleId) {}

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// The avoidance velocity computed for `id` by the last `update`
    pub fn avoidance_velocity(&self, id: AgentId) -> Result<Vec2> {
        self.avoidance_velocities
            .get(id.0 as usize)
            .copied()
            .ok_or_else(|| Error::InvalidAgent(format!("no agent with id {}", id.0)))
    }

    /// Clears all registries; with `unload` the backing storage is
    /// released as well
    pub fn reset(&mut self, unload: bool) {
        if unload {
            self.agents = Vec::new();
            self.obstacles = Vec::new();
            self.avoidance_velocities = Vec::new();
            self.scratch.release();
        } else {
            self.agents.clear();
            self.obstacles.clear();
            self.avoidance_velocities.clear();
        }
    }

    /// Runs one avoidance tick over every agent with a nonzero desired
    /// speed. Collaborators are optional: without a navigation mesh the
    /// clamp step is skipped, without a renderer nothing is drawn.
    pub fn update(
        &mut self,
        dt: f32,
        nav_mesh: Option<&dyn NavMeshQuery>,
        actors: Option<&dyn ActorRegistry>,
        mut debug: Option<&mut (dyn DebugRenderer + '_)>,
    ) {
        let cfg = AvoidanceConfig {
            time_step: if dt > TIGHT_EPSILON {
                dt
            } else {
                self.config.time_step
            },
            ..self.config
        };

        let mut scratch = std::mem::take(&mut self.scratch);
        for i in 0..self.agents.len() {
            let agent = self.agents[i];
            if agent.desired_velocity.length_squared() <= sqr(EPSILON) {
                self.avoidance_velocities[i] = agent.desired_velocity;
                continue;
            }

            self.gather_neighbors(i, &agent, &mut scratch);
            let solved = self.solve_agent(
                &agent,
                &cfg,
                &mut scratch,
                nav_mesh,
                actors,
                debug.as_deref_mut(),
            );
            // Unsolvable: emit the unmodified desired velocity rather
            // than an unstable one
            self.avoidance_velocities[i] = solved.unwrap_or(agent.desired_velocity);
        }
        self.scratch = scratch;
    }

    /// Linear scan over all records, keeping those in range and on the
    /// same floor, sorted ascending by squared distance
    fn gather_neighbors(&self, index: usize, agent: &Agent, scratch: &mut Scratch) {
        scratch.nearby_obstacles.clear();
        for (i, obstacle) in self.obstacles.iter().enumerate() {
            if (obstacle.position.z - agent.position.z).abs() >= VERTICAL_FLOOR_BAND {
                continue;
            }
            let distance_sq = (obstacle.position - agent.position)
                .truncate()
                .length_squared();
            // Coincident records would produce degenerate geometry
            if distance_sq <= sqr(EPSILON) {
                continue;
            }
            if distance_sq < sqr(self.config.range + obstacle.radius) {
                scratch.nearby_obstacles.push(NearbyObstacle {
                    index: i,
                    distance_sq,
                });
            }
        }
        scratch
            .nearby_obstacles
            .sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));

        scratch.nearby_agents.clear();
        for (i, other) in self.agents.iter().enumerate() {
            if i == index {
                continue;
            }
            if (other.position.z - agent.position.z).abs() >= VERTICAL_FLOOR_BAND {
                continue;
            }
            let to_me = (agent.position - other.position).truncate();
            let distance_sq = to_me.length_squared();
            if distance_sq <= sqr(EPSILON) {
                continue;
            }
            if distance_sq < sqr(self.config.range + other.radius) {
                scratch.nearby_agents.push(NearbyAgent {
                    index: i,
                    distance_sq,
                    moving: other.velocity.length_squared() > sqr(EPSILON),
                    can_see_me: other.look_direction.dot(to_me) > 0.0,
                });
            }
        }
        scratch
            .nearby_agents
            .sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));
    }

    /// Full-horizon solve, then monotonic relaxation: shrink the horizon,
    /// drop the furthest droppable neighbor, retry. Terminates because
    /// the considered prefix strictly shrinks each iteration.
    fn solve_agent(
        &self,
        agent: &Agent,
        cfg: &AvoidanceConfig,
        scratch: &mut Scratch,
        nav_mesh: Option<&dyn NavMeshQuery>,
        actors: Option<&dyn ActorRegistry>,
        mut debug: Option<&mut (dyn DebugRenderer + '_)>,
    ) -> Option<Vec2> {
        let mut consider = scratch.nearby_agents.len().min(cfg.max_agents_considered);

        if let Some(v) = self.attempt(
            agent,
            cfg,
            1.0,
            consider,
            scratch,
            nav_mesh,
            actors,
            debug.as_deref_mut(),
        ) {
            return Some(v);
        }

        log::trace!("avoidance solve failed at full horizon, relaxing");
        loop {
            if let Some(v) = self.attempt(
                agent,
                cfg,
                HORIZON_RETRY_SCALE,
                consider,
                scratch,
                nav_mesh,
                actors,
                debug.as_deref_mut(),
            ) {
                return Some(v);
            }
            if consider == 0 {
                return None;
            }
            let furthest = scratch.nearby_agents[consider - 1];
            let neighbor_radius = self.agents[furthest.index].radius;
            // A neighbor this close cannot be safely ignored; stop here
            if furthest.distance_sq <= sqr(2.0 * agent.radius + neighbor_radius) {
                return None;
            }
            consider -= 1;
        }
    }

    /// One constraint-build/solve/select pass over the current neighbor
    /// prefix
    #[allow(clippy::too_many_arguments)]
    fn attempt(
        &self,
        agent: &Agent,
        cfg: &AvoidanceConfig,
        horizon_scale: f32,
        consider: usize,
        scratch: &mut Scratch,
        nav_mesh: Option<&dyn NavMeshQuery>,
        actors: Option<&dyn ActorRegistry>,
        debug: Option<&mut (dyn DebugRenderer + '_)>,
    ) -> Option<Vec2> {
        let Scratch {
            nearby_agents,
            nearby_obstacles,
            lines,
            candidates,
        } = scratch;

        lines.clear();
        for nearby in nearby_obstacles.iter() {
            if let Some(line) = obstacle_constraint_line(
                agent,
                &self.obstacles[nearby.index],
                nearby.index,
                horizon_scale,
                cfg,
            ) {
                lines.push(line);
            }
        }
        for nearby in nearby_agents.iter().take(consider) {
            if let Some(line) =
                agent_constraint_line(agent, &self.agents[nearby.index], nearby, horizon_scale, cfg)
            {
                lines.push(line);
            }
        }

        let area = compute_feasible_area(lines, agent.max_speed);
        if let Some(renderer) = debug {
            draw_agent_state(renderer, agent, lines, area.vertices());
        }
        if area.is_empty() {
            return None;
        }

        collect_candidates(
            &area,
            agent.desired_velocity,
            cfg.min_speed,
            agent.max_speed,
            candidates,
        );
        for candidate in candidates.iter() {
            let clamped = self.clamp_to_nav_mesh(agent, candidate.velocity, cfg, nav_mesh, actors);
            if clamped.length_squared() > sqr(EPSILON) {
                return Some(clamped);
            }
        }
        None
    }

    /// Projects the per-tick displacement onto the enclosing navigation
    /// mesh; on a boundary hit the velocity is scaled down to the hit
    /// distance. Absence of a mesh (or any collaborator) disables
    /// clamping entirely.
    fn clamp_to_nav_mesh(
        &self,
        agent: &Agent,
        velocity: Vec2,
        cfg: &AvoidanceConfig,
        nav_mesh: Option<&dyn NavMeshQuery>,
        actors: Option<&dyn ActorRegistry>,
    ) -> Vec2 {
        if !cfg.clamp_with_nav_mesh {
            return velocity;
        }
        let (Some(nav_mesh), Some(actors), Some(actor)) = (nav_mesh, actors, agent.actor) else {
            return velocity;
        };
        let Some(agent_type) = actors.nav_agent_type(actor) else {
            return velocity;
        };
        // The registry transform is authoritative for mesh placement; the
        // record position may lag it within the tick
        let origin = actors.world_position(actor).unwrap_or(agent.position);
        let Some(mesh) = nav_mesh.enclosing_mesh(agent_type, origin) else {
            return velocity;
        };

        let mut displacement = velocity * cfg.time_step;
        let mut length = displacement.length();
        if length < TIGHT_EPSILON {
            return velocity;
        }
        if length > MAX_CLAMP_DISTANCE {
            displacement *= MAX_CLAMP_DISTANCE / length;
            length = MAX_CLAMP_DISTANCE;
        }

        let to = origin + Vec3::new(displacement.x, displacement.y, 0.0);
        let result = nav_mesh.raycast_in_mesh(mesh, origin, to);
        if result.hit {
            velocity * (result.distance / length).clamp(0.0, 1.0)
        } else {
            velocity
        }
    }
}

fn draw_agent_state(
    renderer: &mut (dyn DebugRenderer + '_),
    agent: &Agent,
    lines: &[ConstraintLine],
    feasible: &[Vec2],
) {
    let z = agent.position.z;
    for line in lines {
        let color = match line.kind {
            ConstraintKind::Agent => Color::CYAN,
            ConstraintKind::Obstacle => Color::ORANGE,
        };
        let half = line.direction * (1.0 + agent.max_speed);
        let a = line.point - half;
        let b = line.point + half;
        renderer.add_line(Vec3::new(a.x, a.y, z), Vec3::new(b.x, b.y, z), color);
    }
    renderer.add_polygon(feasible, z, Color::GREEN);
}
