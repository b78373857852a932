//! AABB-bounded entity snapshot with an embedded floor-height memo
//!
//! A [`WalkabilityCache`] captures the physical entities around one actor
//! once, then answers floor and walkability queries against that snapshot
//! instead of the live physics world. The snapshot is invalidated by
//! per-entity fingerprints; the floor memo survives a re-snapshot as long
//! as every entity is still where it was.

use steer_common::{
    fast_cbrt, quantize, Aabb, EntityHandle, EntityStatus, SpatialQuery, EPSILON, Vec2, Vec3,
};

use crate::floor_cache::{FloorHeightCache, NO_FLOOR};

/// Snapshot capacity; enumeration truncates past this
pub const MAX_CACHED_ENTITIES: usize = 512;

/// Vertical clearance kept above the floor for the torso sweep, and the
/// upward expansion of the snapshot box
pub const TORSO_HEIGHT: f32 = 0.5;

/// How far below a query position the floor is searched for
pub const FLOOR_BAND: f32 = 2.5;

/// Downward floor rays start this far above the query position
pub const RAY_START_ABOVE: f32 = 0.5;

/// Horizontal border added around the required box on re-snapshot, so a
/// slowly drifting actor keeps hitting the cached box
pub const HORIZONTAL_BORDER: f32 = 0.4;

/// Keep the current snapshot while its cube-root volume stays under this
/// multiple of what a fresh snapshot would use
pub const VOLUME_KEEP_RATIO: f32 = 1.5;

/// Walkability sweeps are processed in segments of this length
pub const SEGMENT_LENGTH: f32 = 2.0;

/// Maximum floor-height step between consecutive samples
pub const STEP_HEIGHT: f32 = 0.5;

/// Below this horizontal distance a walk is trivially accepted
pub const MIN_WALK_DISTANCE: f32 = 0.01;

const MIN_SAMPLE_SPACING: f32 = 0.1;

const POSITION_QUANTUM: f32 = 0.01;
const ORIENTATION_QUANTUM: f32 = 1.0 / 1024.0;

/// Pose fingerprint of one snapshot entity. Quantized so physics jitter
/// below perceptible thresholds does not churn the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityFingerprint {
    entity: EntityHandle,
    position: (i32, i32, i32),
    orientation: (i32, i32, i32, i32),
}

impl EntityFingerprint {
    fn of(entity: EntityHandle, status: &EntityStatus) -> Self {
        let p = status.position;
        let q = status.orientation;
        Self {
            entity,
            position: (
                quantize(p.x, POSITION_QUANTUM),
                quantize(p.y, POSITION_QUANTUM),
                quantize(p.z, POSITION_QUANTUM),
            ),
            orientation: (
                quantize(q.x, ORIENTATION_QUANTUM),
                quantize(q.y, ORIENTATION_QUANTUM),
                quantize(q.z, ORIENTATION_QUANTUM),
                quantize(q.w, ORIENTATION_QUANTUM),
            ),
        }
    }
}

/// One entity captured in the snapshot
#[derive(Debug, Clone, Copy)]
pub struct CachedEntity {
    pub handle: EntityHandle,
    /// Conservative world bounds at snapshot time
    pub aabb: Aabb,
}

/// What [`WalkabilityCache::cache`] did with the existing snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The existing snapshot still satisfies the request
    Kept,
    /// The snapshot was rebuilt
    Refreshed {
        /// True when every entity kept its fingerprint, so the floor
        /// memo was carried over
        floor_preserved: bool,
    },
}

/// Outcome of a successful walkability check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkabilityResult {
    /// Floor point under the target
    pub floor: Vec3,
    /// True when no floor-height transition occurred along the run
    pub flat: bool,
}

/// Entity snapshot around one actor, plus the floor memo built on it
#[derive(Debug, Default)]
pub struct WalkabilityCache {
    aabb: Option<Aabb>,
    entities: Vec<CachedEntity>,
    fingerprints: Vec<EntityFingerprint>,
    floor: FloorHeightCache,
}

impl WalkabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The box the snapshot currently covers
    pub fn aabb(&self) -> Option<Aabb> {
        self.aabb
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn floor_cache(&self) -> &FloorHeightCache {
        &self.floor
    }

    /// Whether `p` lies inside the covered box
    pub fn covers(&self, p: Vec3) -> bool {
        self.aabb.is_some_and(|aabb| aabb.contains_point(p))
    }

    pub fn clear(&mut self) {
        self.aabb = None;
        self.entities.clear();
        self.fingerprints.clear();
        self.floor.clear();
    }

    /// Validates the snapshot against `request` and rebuilds it when
    /// needed.
    ///
    /// The snapshot is kept while it still contains the required volume
    /// and has not become oversized: the cube-root of its volume must
    /// stay under [`VOLUME_KEEP_RATIO`] times that of a fresh snapshot.
    /// That hysteresis stops a cache built for a large request from being
    /// carried forever once the requests shrink, without re-snapshotting
    /// on every small fluctuation.
    pub fn cache(&mut self, request: &Aabb, world: &dyn SpatialQuery) -> CacheOutcome {
        let required = request.expanded(0.0, TORSO_HEIGHT, FLOOR_BAND);
        let target = required.expanded(HORIZONTAL_BORDER, 0.0, 0.0);

        if let Some(current) = self.aabb {
            if current.contains_aabb(&required)
                && fast_cbrt(current.volume()) < fast_cbrt(target.volume()) * VOLUME_KEEP_RATIO
            {
                return CacheOutcome::Kept;
            }
        }

        let handles = world.entities_in_box(target.min, target.max, MAX_CACHED_ENTITIES);
        let mut snapshot: Vec<(CachedEntity, EntityFingerprint)> = handles
            .into_iter()
            .filter_map(|handle| {
                let status = world.entity_status(handle)?;
                Some((
                    CachedEntity {
                        handle,
                        aabb: status.world_aabb(),
                    },
                    EntityFingerprint::of(handle, &status),
                ))
            })
            .collect();
        // Order-insensitive fingerprint comparison
        snapshot.sort_by_key(|(e, _)| e.handle.0);

        let (entities, fingerprints): (Vec<_>, Vec<_>) = snapshot.into_iter().unzip();
        let floor_preserved = fingerprints == self.fingerprints;
        if !floor_preserved {
            log::debug!(
                "walkability snapshot rebuilt: {} entities, floor memo dropped",
                entities.len()
            );
            self.floor.clear();
        }

        self.aabb = Some(target);
        self.entities = entities;
        self.fingerprints = fingerprints;
        CacheOutcome::Refreshed { floor_preserved }
    }

    /// Floor height under `position`, memoized per grid cell.
    ///
    /// `None` means no floor within the search band; that answer is
    /// memoized too, via the sentinel.
    pub fn find_floor(&mut self, position: Vec3, world: &dyn SpatialQuery) -> Option<f32> {
        let Self {
            entities, floor, ..
        } = self;
        floor_against_entities(entities, floor, position, world)
    }

    /// Checks that an actor of `radius` can walk from `origin` to
    /// `target` inside the snapshot. `None` means blocked (or no floor).
    pub fn check_walkability(
        &mut self,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        world: &dyn SpatialQuery,
    ) -> Option<WalkabilityResult> {
        let Self {
            entities, floor, ..
        } = self;
        walk_path(origin, target, radius, world, &mut |p| {
            floor_against_entities(entities, floor, p, world)
        })
    }
}

fn floor_against_entities(
    entities: &[CachedEntity],
    floor: &mut FloorHeightCache,
    position: Vec3,
    world: &dyn SpatialQuery,
) -> Option<f32> {
    if let Some(height) = floor.height(position) {
        return (height != NO_FLOOR).then_some(height);
    }
    let mut best: Option<f32> = None;
    for entity in entities {
        if !entity.aabb.contains_point_lateral(position) {
            continue;
        }
        if let Some(z) = cast_floor_ray(world, entity.handle, position) {
            best = Some(best.map_or(z, |b: f32| b.max(z)));
        }
    }
    floor.set_height(position, best.unwrap_or(NO_FLOOR));
    best
}

/// Downward ray against one entity; returns the hit height when it lands
/// within the floor band
fn cast_floor_ray(world: &dyn SpatialQuery, entity: EntityHandle, position: Vec3) -> Option<f32> {
    let origin = position + Vec3::Z * RAY_START_ABOVE;
    let dir = Vec3::NEG_Z * (RAY_START_ABOVE + FLOOR_BAND);
    let hit = world.ray_trace_entity(entity, origin, dir)?;
    (hit.point.z >= position.z - FLOOR_BAND).then_some(hit.point.z)
}

/// Segment-wise walkability sweep shared by the cached and uncached
/// paths; `floor_at` supplies the floor height under a sample point.
///
/// Samples the floor every `radius` along the run, rejects a step higher
/// than [`STEP_HEIGHT`], and sweeps the torso capsule across a segment
/// only when its floor height actually varied.
pub(crate) fn walk_path(
    origin: Vec3,
    target: Vec3,
    radius: f32,
    world: &dyn SpatialQuery,
    floor_at: &mut dyn FnMut(Vec3) -> Option<f32>,
) -> Option<WalkabilityResult> {
    let delta = Vec2::new(target.x - origin.x, target.y - origin.y);
    let distance = delta.length();
    if distance < MIN_WALK_DISTANCE {
        return Some(WalkabilityResult {
            floor: origin,
            flat: true,
        });
    }
    let dir = delta / distance;
    let spacing = radius.max(MIN_SAMPLE_SPACING);
    let sample = |s: f32, z: f32| Vec3::new(origin.x + dir.x * s, origin.y + dir.y * s, z);

    let mut floor_z = floor_at(origin)?;
    let mut flat = true;
    let mut walked = 0.0;

    while walked < distance {
        let segment_end = (walked + SEGMENT_LENGTH).min(distance);
        let segment_start_z = floor_z;
        let mut varied = false;

        let mut s = walked + spacing;
        loop {
            let at = s.min(segment_end);
            let h = floor_at(sample(at, floor_z))?;
            if (h - floor_z).abs() > STEP_HEIGHT {
                return None;
            }
            if (h - floor_z).abs() > EPSILON {
                varied = true;
            }
            floor_z = h;
            if s >= segment_end {
                break;
            }
            s += spacing;
        }

        if varied {
            flat = false;
            let lift = TORSO_HEIGHT + radius;
            let p0 = sample(walked, segment_start_z + lift);
            let p1 = sample(segment_end, floor_z + lift);
            if world.capsule_overlaps_world(p0, p1, radius) {
                return None;
            }
        }
        walked = segment_end;
    }

    Some(WalkabilityResult {
        floor: Vec3::new(target.x, target.y, floor_z),
        flat,
    })
}

/// Uncached floor query straight against the physics world. Always
/// correct, never memoized; the fallback when no snapshot covers the
/// position.
pub(crate) fn global_find_floor(position: Vec3, world: &dyn SpatialQuery) -> Option<f32> {
    const PROBE: f32 = 0.1;
    let min = Vec3::new(
        position.x - PROBE,
        position.y - PROBE,
        position.z - FLOOR_BAND,
    );
    let max = Vec3::new(
        position.x + PROBE,
        position.y + PROBE,
        position.z + RAY_START_ABOVE,
    );
    let mut best: Option<f32> = None;
    for handle in world.entities_in_box(min, max, MAX_CACHED_ENTITIES) {
        if let Some(z) = cast_floor_ray(world, handle, position) {
            best = Some(best.map_or(z, |b: f32| b.max(z)));
        }
    }
    best
}

/// Uncached walkability check straight against the physics world
pub(crate) fn global_check_walkability(
    origin: Vec3,
    target: Vec3,
    radius: f32,
    world: &dyn SpatialQuery,
) -> Option<WalkabilityResult> {
    walk_path(origin, target, radius, world, &mut |p| {
        global_find_floor(p, world)
    })
}
