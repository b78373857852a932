//! Renderer-agnostic debug visualization
//!
//! The steering and walkability crates emit draw commands through the
//! [`DebugRenderer`] trait when (and only when) the host passes one in;
//! the numeric paths have no dependency on any renderer.

use crate::{Vec2, Vec3};

/// Color representation for debug visualization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Creates a new color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from RGB values (alpha = 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// Common debug colors
impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.5, 0.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
}

/// Debug line for rendering
#[derive(Debug, Clone, Copy)]
pub struct DebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
}

/// Debug text for rendering
#[derive(Debug, Clone)]
pub struct DebugText {
    pub position: Vec3,
    pub text: String,
    pub color: Color,
}

/// Sink for debug draw commands
pub trait DebugRenderer {
    fn add_line(&mut self, start: Vec3, end: Vec3, color: Color);

    fn add_text(&mut self, position: Vec3, text: &str, color: Color);

    /// Draws a closed polygon outline on the XY plane at height `z`
    fn add_polygon(&mut self, verts: &[Vec2], z: f32, color: Color) {
        if verts.len() < 2 {
            return;
        }
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            self.add_line(Vec3::new(a.x, a.y, z), Vec3::new(b.x, b.y, z), color);
        }
    }

    /// Draws a circle outline on the XY plane at height `z`
    fn add_circle(&mut self, center: Vec3, radius: f32, color: Color) {
        const SEGMENTS: usize = 24;
        let step = std::f32::consts::TAU / SEGMENTS as f32;
        for i in 0..SEGMENTS {
            let (s0, c0) = (i as f32 * step).sin_cos();
            let (s1, c1) = ((i + 1) as f32 * step).sin_cos();
            self.add_line(
                center + Vec3::new(c0 * radius, s0 * radius, 0.0),
                center + Vec3::new(c1 * radius, s1 * radius, 0.0),
                color,
            );
        }
    }
}

/// Simple command buffer implementing [`DebugRenderer`]; handy for tests
/// and for hosts that batch draw submissions
#[derive(Debug, Default)]
pub struct DebugBuffer {
    pub lines: Vec<DebugLine>,
    pub texts: Vec<DebugText>,
}

impl DebugBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.texts.clear();
    }
}

impl DebugRenderer for DebugBuffer {
    fn add_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        self.lines.push(DebugLine { start, end, color });
    }

    fn add_text(&mut self, position: Vec3, text: &str, color: Color) {
        self.texts.push(DebugText {
            position,
            text: text.to_string(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_outline_is_closed() {
        let mut buf = DebugBuffer::new();
        let verts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ];
        buf.add_polygon(&verts, 0.0, Color::GREEN);
        assert_eq!(buf.lines.len(), 3);
        assert_eq!(buf.lines[2].end, Vec3::new(0.0, 0.0, 0.0));
    }
}
