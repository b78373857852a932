//! Axis-aligned boxes and small 2D helpers

use glam::{Vec2, Vec3};

/// World-space axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A box centered on `center` with the given half extents
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        (s.x * s.y * s.z).max(0.0)
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }

    /// Lateral (XY-plane) containment test, ignoring height
    pub fn contains_point_lateral(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Returns this box grown by `border` horizontally, `up` above and
    /// `down` below (Z-up convention)
    pub fn expanded(&self, border: f32, up: f32, down: f32) -> Self {
        Self {
            min: Vec3::new(self.min.x - border, self.min.y - border, self.min.z - down),
            max: Vec3::new(self.max.x + border, self.max.y + border, self.max.z + up),
        }
    }
}

/// Computes the 2D cross product (determinant) of two vectors
#[inline]
pub fn det(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Signed side of point `p` relative to the directed line through `point`
/// along `direction`; positive is to the left
#[inline]
pub fn line_side(point: Vec2, direction: Vec2, p: Vec2) -> f32 {
    det(direction, p - point)
}

/// Closest point to `p` on the segment `a`..`b`
pub fn closest_point_on_segment_2d(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Whether `p` lies inside the (convex or concave) polygon `verts`,
/// tested on the XY plane with the standard crossing rule
pub fn point_in_polygon_2d(p: Vec2, verts: &[Vec2]) -> bool {
    let mut inside = false;
    let n = verts.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (vi, vj) = (verts[i], verts[j]);
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_containment() {
        let outer = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        let inner = Aabb::new(Vec3::splat(1.0), Vec3::splat(9.0));
        assert!(outer.contains_aabb(&inner));
        assert!(!inner.contains_aabb(&outer));
        assert!(outer.overlaps(&inner));
    }

    #[test]
    fn test_aabb_expanded() {
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE).expanded(0.5, 2.0, 3.0);
        assert_eq!(b.min, Vec3::new(-0.5, -0.5, -3.0));
        assert_eq!(b.max, Vec3::new(1.5, 1.5, 3.0));
    }

    #[test]
    fn test_line_side() {
        // Line along +X through origin: +Y is to the left
        assert!(line_side(Vec2::ZERO, Vec2::X, Vec2::new(0.0, 1.0)) > 0.0);
        assert!(line_side(Vec2::ZERO, Vec2::X, Vec2::new(0.0, -1.0)) < 0.0);
    }

    #[test]
    fn test_closest_point_on_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(
            closest_point_on_segment_2d(Vec2::new(5.0, 3.0), a, b),
            Vec2::new(5.0, 0.0)
        );
        assert_eq!(closest_point_on_segment_2d(Vec2::new(-5.0, 3.0), a, b), a);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(point_in_polygon_2d(Vec2::new(2.0, 2.0), &square));
        assert!(!point_in_polygon_2d(Vec2::new(5.0, 2.0), &square));
    }
}
