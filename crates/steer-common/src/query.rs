//! Narrow interfaces to the external collaborators (physics backend,
//! navigation mesh, actor registry).
//!
//! The steering core never owns entities or meshes; it only consumes
//! snapshots and answers produced through these traits. Hosts provide
//! whatever backend they have; tests provide small hand-rolled fakes.

use crate::{Aabb, Quat, Vec3};

/// Opaque handle to a physical entity owned by the physics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityHandle(pub u64);

/// Opaque handle to an AI actor owned by the host's actor registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorHandle(pub u64);

/// Navigation agent type, resolved by the actor registry and consumed by
/// the navigation mesh collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct NavAgentType(pub u32);

/// Identifier of a navigation mesh enclosing a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshId(pub u32);

/// Result of a downward or directed ray cast against a single entity
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
}

/// World transform and local bounds of a physical entity
#[derive(Debug, Clone, Copy)]
pub struct EntityStatus {
    pub position: Vec3,
    pub orientation: Quat,
    pub local_aabb: Aabb,
}

impl EntityStatus {
    /// Conservative world-space bounds: the local box translated to the
    /// entity position and inflated to cover any orientation
    pub fn world_aabb(&self) -> Aabb {
        let half = self.local_aabb.size() * 0.5;
        let r = half.length();
        let center = self.position + self.local_aabb.center();
        Aabb::from_center_half_extents(center, Vec3::splat(r))
    }
}

/// Physics/collision query backend. Bounded, synchronous, and assumed to
/// be the expensive part of every walkability operation.
pub trait SpatialQuery {
    /// Enumerates entities overlapping the box, truncating at `capacity`
    fn entities_in_box(&self, min: Vec3, max: Vec3, capacity: usize) -> Vec<EntityHandle>;

    /// Casts a ray against a single entity
    fn ray_trace_entity(&self, entity: EntityHandle, origin: Vec3, dir: Vec3) -> Option<RayHit>;

    /// Swept-capsule overlap against the world (the "torso" test)
    fn capsule_overlaps_world(&self, p0: Vec3, p1: Vec3, radius: f32) -> bool;

    /// Current transform and local bounds of an entity, if it still exists
    fn entity_status(&self, entity: EntityHandle) -> Option<EntityStatus>;
}

/// Result of a constrained ray cast within a navigation mesh
#[derive(Debug, Clone, Copy)]
pub struct NavRaycastResult {
    pub hit: bool,
    /// Distance to the boundary when `hit`, otherwise unspecified
    pub distance: f32,
}

/// Navigation mesh collaborator used only for displacement clamping
pub trait NavMeshQuery {
    fn enclosing_mesh(&self, agent_type: NavAgentType, position: Vec3) -> Option<MeshId>;

    fn raycast_in_mesh(&self, mesh: MeshId, from: Vec3, to: Vec3) -> NavRaycastResult;
}

/// Host actor registry; resolves opaque actor handles for navmesh clamping
pub trait ActorRegistry {
    fn nav_agent_type(&self, actor: ActorHandle) -> Option<NavAgentType>;

    fn world_position(&self, actor: ActorHandle) -> Option<Vec3>;
}
