//! Cached ground-height and traversability queries
//!
//! Moving actors constantly ask two questions of the world: "how high is
//! the floor here" and "can I walk from A to B". Both bottom out in
//! expensive physics queries (downward ray casts, swept capsule
//! overlaps). This crate bounds that cost with a per-actor cache:
//!
//! - [`FloorHeightCache`]: a grid-quantized memo of computed floor
//!   heights, including a "no floor found" sentinel
//! - [`WalkabilityCache`]: an AABB-bounded snapshot of nearby physical
//!   entities plus the embedded floor cache; answers floor and
//!   segment-walkability queries against the snapshot
//! - [`WalkabilityCacheManager`]: one cache per active actor, validated
//!   at most once per frame, with hit/miss statistics and an uncached
//!   (slower but always correct) fallback path
//!
//! All state is owned by the single simulation thread; nothing here is
//! safe to share across threads without external serialization.

pub mod floor_cache;
pub mod manager;
pub mod walkability_cache;

pub use floor_cache::*;
pub use manager::*;
pub use walkability_cache::*;
