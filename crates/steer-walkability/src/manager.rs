//! Per-actor walkability cache pool
//!
//! One [`WalkabilityCache`] per enabled actor, stored in a slab with a
//! free-list so enable/disable cycles do not reallocate. Each cache is
//! validated at most once per frame; queries fall back from the actor's
//! own cache to any other fresh covering cache, and finally to the
//! uncached world path.

use std::collections::HashMap;

use steer_common::debug::{Color, DebugRenderer};
use steer_common::{point_in_polygon_2d, Aabb, ActorHandle, SpatialQuery, Vec2, Vec3};

use crate::walkability_cache::{
    global_check_walkability, global_find_floor, CacheOutcome, WalkabilityCache, WalkabilityResult,
};

/// Per-frame query counters, reset by [`WalkabilityCacheManager::begin_frame`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    pub floor_requests: u64,
    pub floor_cache_hits: u64,
    pub walkability_requests: u64,
    pub walkability_cache_hits: u64,
    /// Cache validations that carried the floor memo over
    pub preserved_floor_caches: u64,
}

#[derive(Debug)]
struct CacheEntry {
    actor: ActorHandle,
    cache: WalkabilityCache,
    last_update_frame: u64,
}

#[derive(Debug)]
enum Slot {
    Occupied(CacheEntry),
    Vacant { next_free: Option<usize> },
}

/// Owns and validates the per-actor caches
#[derive(Debug, Default)]
pub struct WalkabilityCacheManager {
    slots: Vec<Slot>,
    next_free: Option<usize>,
    index: HashMap<ActorHandle, usize>,
    frame: u64,
    stats: CacheStats,
}

impl WalkabilityCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new simulation frame: caches validated before this call
    /// no longer count as fresh, and the stats window restarts
    pub fn begin_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        self.stats = CacheStats::default();
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Counters accumulated since the last [`begin_frame`](Self::begin_frame)
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    /// Allocates (or frees) the cache slot for `actor`
    pub fn enable_actor(&mut self, actor: ActorHandle, enable: bool) {
        if enable {
            self.slot_for(actor);
        } else if let Some(slot) = self.index.remove(&actor) {
            self.slots[slot] = Slot::Vacant {
                next_free: self.next_free,
            };
            self.next_free = Some(slot);
        }
    }

    /// Drops every cache and all bookkeeping
    pub fn reset(&mut self) {
        self.slots.clear();
        self.next_free = None;
        self.index.clear();
        self.stats = CacheStats::default();
    }

    /// Validates the actor's cache against `request`, creating it on
    /// first use. At most one validation per actor per frame; later
    /// calls in the same frame are no-ops.
    pub fn prepare_actor(&mut self, actor: ActorHandle, request: &Aabb, world: &dyn SpatialQuery) {
        let frame = self.frame;
        let slot = self.slot_for(actor);
        let Slot::Occupied(entry) = &mut self.slots[slot] else {
            unreachable!("slot_for returns an occupied slot");
        };
        if entry.last_update_frame == frame {
            return;
        }
        entry.last_update_frame = frame;
        match entry.cache.cache(request, world) {
            CacheOutcome::Kept
            | CacheOutcome::Refreshed {
                floor_preserved: true,
            } => self.stats.preserved_floor_caches += 1,
            CacheOutcome::Refreshed { .. } => {}
        }
    }

    /// Floor height under `position`, served from a covering cache when
    /// one exists and from the world otherwise
    pub fn find_floor(
        &mut self,
        actor: ActorHandle,
        position: Vec3,
        world: &dyn SpatialQuery,
    ) -> Option<f32> {
        self.stats.floor_requests += 1;
        match self.covering_cache(actor, &[position]) {
            Some(slot) => {
                self.stats.floor_cache_hits += 1;
                let Slot::Occupied(entry) = &mut self.slots[slot] else {
                    unreachable!("covering_cache returns occupied slots");
                };
                entry.cache.find_floor(position, world)
            }
            None => global_find_floor(position, world),
        }
    }

    /// Whether a cache usable this frame (the actor's own, or another
    /// actor's) already has a memoized floor answer for `position` (hit
    /// or no-floor sentinel alike)
    pub fn is_floor_cached(&self, actor: ActorHandle, position: Vec3) -> bool {
        self.covering_cache(actor, &[position])
            .is_some_and(|slot| match &self.slots[slot] {
                Slot::Occupied(entry) => entry.cache.floor_cache().contains(position),
                Slot::Vacant { .. } => false,
            })
    }

    /// Walkability of the `origin`..`target` run for an actor of
    /// `radius`; `None` means blocked or no floor
    pub fn check_walkability(
        &mut self,
        actor: ActorHandle,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        world: &dyn SpatialQuery,
    ) -> Option<WalkabilityResult> {
        self.stats.walkability_requests += 1;
        match self.covering_cache(actor, &[origin, target]) {
            Some(slot) => {
                self.stats.walkability_cache_hits += 1;
                let Slot::Occupied(entry) = &mut self.slots[slot] else {
                    unreachable!("covering_cache returns occupied slots");
                };
                entry.cache.check_walkability(origin, target, radius, world)
            }
            None => global_check_walkability(origin, target, radius, world),
        }
    }

    /// Like [`check_walkability`](Self::check_walkability) but rejects
    /// targets outside the lateral boundary polygon before touching any
    /// cache or the world
    pub fn check_walkability_in_boundary(
        &mut self,
        actor: ActorHandle,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        boundary: &[Vec2],
        world: &dyn SpatialQuery,
    ) -> Option<WalkabilityResult> {
        if !point_in_polygon_2d(Vec2::new(target.x, target.y), boundary) {
            return None;
        }
        self.check_walkability(actor, origin, target, radius, world)
    }

    /// Read access to an actor's cache, mainly for inspection and tests
    pub fn cache(&self, actor: ActorHandle) -> Option<&WalkabilityCache> {
        self.index
            .get(&actor)
            .and_then(|&slot| match &self.slots[slot] {
                Slot::Occupied(entry) => Some(&entry.cache),
                Slot::Vacant { .. } => None,
            })
    }

    /// Draws the per-frame counters as a text overlay
    pub fn draw_stats(&self, at: Vec3, renderer: &mut dyn DebugRenderer) {
        let s = &self.stats;
        let lines = [
            format!("caches: {}", self.index.len()),
            format!("floor: {}/{} hits", s.floor_cache_hits, s.floor_requests),
            format!(
                "walk: {}/{} hits",
                s.walkability_cache_hits, s.walkability_requests
            ),
            format!("preserved floors: {}", s.preserved_floor_caches),
        ];
        for (i, line) in lines.iter().enumerate() {
            renderer.add_text(at - Vec3::Z * (i as f32 * 0.2), line, Color::WHITE);
        }
    }

    /// Slot of the actor's cache, allocating from the free-list (or
    /// growing the slab) on first use
    fn slot_for(&mut self, actor: ActorHandle) -> usize {
        if let Some(&slot) = self.index.get(&actor) {
            return slot;
        }
        let entry = CacheEntry {
            actor,
            cache: WalkabilityCache::new(),
            // Never equal to the current frame, so the first
            // prepare_actor call always validates
            last_update_frame: u64::MAX,
        };
        let slot = match self.next_free {
            Some(free) => {
                let Slot::Vacant { next_free } = &self.slots[free] else {
                    unreachable!("free-list points at occupied slot");
                };
                self.next_free = *next_free;
                self.slots[free] = Slot::Occupied(entry);
                free
            }
            None => {
                self.slots.push(Slot::Occupied(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(actor, slot);
        slot
    }

    /// Best cache to answer a query touching `points`: the actor's own
    /// cache first, else any other actor's, in both cases only when the
    /// cache was validated this frame and covers every point. A cache
    /// that was not re-validated may hold a snapshot the world has since
    /// diverged from, so stale caches are never consulted.
    fn covering_cache(&self, actor: ActorHandle, points: &[Vec3]) -> Option<usize> {
        let usable = |entry: &CacheEntry| {
            entry.last_update_frame == self.frame && points.iter().all(|&p| entry.cache.covers(p))
        };

        if let Some(&slot) = self.index.get(&actor) {
            if let Slot::Occupied(entry) = &self.slots[slot] {
                if usable(entry) {
                    return Some(slot);
                }
            }
        }
        self.slots.iter().position(|slot| match slot {
            Slot::Occupied(entry) => entry.actor != actor && usable(entry),
            Slot::Vacant { .. } => false,
        })
    }
}
