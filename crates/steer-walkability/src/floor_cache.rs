//! Grid-quantized memo of computed floor heights
//!
//! Positions are quantized to lateral cells of [`FLOOR_CELL_SIZE`] and a
//! coarse vertical band, so repeated queries from a slowly moving actor
//! land in the same cell and skip the downward ray cast entirely.

use std::collections::BTreeMap;

use steer_common::debug::{Color, DebugRenderer};
use steer_common::{quantize, Vec3};

/// Lateral cell size of the floor-height grid, in world units
pub const FLOOR_CELL_SIZE: f32 = 0.25;

/// Vertical band size; queries within the same band share a cell
pub const FLOOR_VERTICAL_BAND: f32 = 2.0;

/// Cached "queried and found nothing" sentinel. Distinct from a cache
/// miss: absence means "not yet queried".
pub const NO_FLOOR: f32 = f32::MAX;

/// Quantized cell key; ordered so lookups are deterministic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FloorCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl FloorCell {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            x: quantize(position.x, FLOOR_CELL_SIZE),
            y: quantize(position.y, FLOOR_CELL_SIZE),
            z: quantize(position.z, FLOOR_VERTICAL_BAND),
        }
    }

    /// World-space center of the cell, at the bottom of its band
    fn center(&self) -> Vec3 {
        Vec3::new(
            (self.x as f32 + 0.5) * FLOOR_CELL_SIZE,
            (self.y as f32 + 0.5) * FLOOR_CELL_SIZE,
            self.z as f32 * FLOOR_VERTICAL_BAND,
        )
    }
}

/// Per-actor memo of the last computed ground height per cell
#[derive(Debug, Clone, Default)]
pub struct FloorHeightCache {
    heights: BTreeMap<FloorCell, f32>,
}

impl FloorHeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoizes `height` (which may be [`NO_FLOOR`]) for the cell
    /// containing `position`
    pub fn set_height(&mut self, position: Vec3, height: f32) {
        self.heights.insert(FloorCell::from_position(position), height);
    }

    /// Cached height for the cell containing `position`; `None` means
    /// the cell has not been queried yet
    pub fn height(&self, position: Vec3) -> Option<f32> {
        self.heights.get(&FloorCell::from_position(position)).copied()
    }

    pub fn contains(&self, position: Vec3) -> bool {
        self.heights.contains_key(&FloorCell::from_position(position))
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Draws one marker per cached cell: green at the cached height,
    /// gray for "no floor" cells
    pub fn draw(&self, renderer: &mut dyn DebugRenderer) {
        const MARKER: f32 = FLOOR_CELL_SIZE * 0.4;
        for (cell, &height) in &self.heights {
            let center = cell.center();
            let (at, color) = if height == NO_FLOOR {
                (center, Color::GRAY)
            } else {
                (Vec3::new(center.x, center.y, height), Color::GREEN)
            };
            renderer.add_line(
                at - Vec3::new(MARKER, 0.0, 0.0),
                at + Vec3::new(MARKER, 0.0, 0.0),
                color,
            );
            renderer.add_line(
                at - Vec3::new(0.0, MARKER, 0.0),
                at + Vec3::new(0.0, MARKER, 0.0),
                color,
            );
        }
    }
}
