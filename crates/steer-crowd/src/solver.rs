//! Feasible-region computation and velocity candidate selection
//!
//! The admissible velocity set is a convex polygon: a bounding square in
//! velocity space clipped against every constraint half-plane in turn.
//! Clipping runs over fixed-capacity inline buffers; per-tick allocation
//! in the solver is zero.

use steer_common::{det, line_side, sqr, Vec2, EPSILON, TIGHT_EPSILON};

use crate::ConstraintLine;

/// Maximum vertex count of the clipped feasible polygon. Each clip can
/// add at most one vertex over the 4-vertex bounding square, so this
/// bounds the constraint lines a single pass can consume; further lines
/// still clip but excess crossing vertices are dropped deterministically.
pub const MAX_FEASIBLE_VERTS: usize = 64;

/// Convex polygon of admissible velocities
#[derive(Debug, Clone, Copy)]
pub struct FeasibleArea {
    verts: [Vec2; MAX_FEASIBLE_VERTS],
    count: usize,
}

impl FeasibleArea {
    /// The unclipped bounding square with half-size `1 + radius`
    pub fn bounding_square(radius: f32) -> Self {
        let h = 1.0 + radius;
        let mut verts = [Vec2::ZERO; MAX_FEASIBLE_VERTS];
        verts[0] = Vec2::new(-h, -h);
        verts[1] = Vec2::new(h, -h);
        verts[2] = Vec2::new(h, h);
        verts[3] = Vec2::new(-h, h);
        Self { verts, count: 4 }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.verts[..self.count]
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether `v` lies inside (or within epsilon of) the polygon
    pub fn contains(&self, v: Vec2) -> bool {
        if self.count < 3 {
            return false;
        }
        for i in 0..self.count {
            let a = self.verts[i];
            let b = self.verts[(i + 1) % self.count];
            if det(b - a, v - a) < -EPSILON {
                return false;
            }
        }
        true
    }

    /// Clips the polygon against one constraint half-plane
    /// (Sutherland-Hodgman step, keeping the "left of" side)
    pub fn clip(&mut self, line: &ConstraintLine) {
        let mut out = [Vec2::ZERO; MAX_FEASIBLE_VERTS];
        let mut out_count = 0;

        let mut push = |v: Vec2, n: &mut usize| {
            if *n < MAX_FEASIBLE_VERTS {
                out[*n] = v;
                *n += 1;
            }
        };

        for i in 0..self.count {
            let cur = self.verts[i];
            let next = self.verts[(i + 1) % self.count];
            let side_cur = line_side(line.point, line.direction, cur);
            let side_next = line_side(line.point, line.direction, next);

            if side_cur >= -EPSILON {
                push(cur, &mut out_count);
            }
            // Edge crosses the boundary: insert the interpolated vertex
            if (side_cur > EPSILON && side_next < -EPSILON)
                || (side_cur < -EPSILON && side_next > EPSILON)
            {
                let t = side_cur / (side_cur - side_next);
                push(cur + (next - cur) * t, &mut out_count);
            }
        }

        // A clipped polygon with fewer than 3 vertices has no area
        if out_count < 3 {
            out_count = 0;
        }
        self.verts = out;
        self.count = out_count;
    }

    /// Closest point on the polygon boundary to `v`
    pub fn closest_boundary_point(&self, v: Vec2) -> Option<Vec2> {
        if self.count < 2 {
            return None;
        }
        let mut best = None;
        let mut best_dist_sq = f32::MAX;
        for i in 0..self.count {
            let a = self.verts[i];
            let b = self.verts[(i + 1) % self.count];
            let p = steer_common::closest_point_on_segment_2d(v, a, b);
            let d = (p - v).length_squared();
            if d < best_dist_sq {
                best_dist_sq = d;
                best = Some(p);
            }
        }
        best
    }
}

/// Intersects the bounding square with every constraint half-plane.
/// Returns an empty area when the constraints are jointly unsatisfiable.
pub fn compute_feasible_area(lines: &[ConstraintLine], radius: f32) -> FeasibleArea {
    let mut area = FeasibleArea::bounding_square(radius);
    for line in lines {
        area.clip(line);
        if area.is_empty() {
            break;
        }
    }
    area
}

/// A velocity worth trying, ranked by its distance to the desired one
#[derive(Debug, Clone, Copy)]
pub struct VelocityCandidate {
    pub velocity: Vec2,
    pub distance_sq: f32,
}

/// Collects candidate velocities out of the feasible polygon, ordered by
/// ascending squared distance to `desired`.
///
/// When `desired` itself is admissible it is the single candidate.
/// Otherwise the set is: the boundary point nearest to `desired`, every
/// polygon vertex inside the max-speed circle, and every edge/max-speed
/// circle crossing faster than `min_speed`.
pub fn collect_candidates(
    area: &FeasibleArea,
    desired: Vec2,
    min_speed: f32,
    max_speed: f32,
    out: &mut Vec<VelocityCandidate>,
) {
    out.clear();
    if area.is_empty() {
        return;
    }

    let mut push = |v: Vec2, out: &mut Vec<VelocityCandidate>| {
        out.push(VelocityCandidate {
            velocity: v,
            distance_sq: (v - desired).length_squared(),
        });
    };

    if area.contains(desired) {
        push(desired, out);
        return;
    }

    if let Some(p) = area.closest_boundary_point(desired) {
        push(p, out);
    }

    let max_speed_sq = sqr(max_speed);
    let min_speed_sq = sqr(min_speed);
    let verts = area.vertices();
    for i in 0..verts.len() {
        let a = verts[i];
        if a.length_squared() <= max_speed_sq {
            push(a, out);
        }
        let b = verts[(i + 1) % verts.len()];
        for p in segment_circle_crossings(a, b, max_speed) {
            if p.length_squared() >= min_speed_sq {
                push(p, out);
            }
        }
    }

    out.sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));
}

/// Points where the segment `a`..`b` crosses the circle of `radius`
/// around the origin; zero, one or two of them
fn segment_circle_crossings(a: Vec2, b: Vec2, radius: f32) -> impl Iterator<Item = Vec2> {
    let d = b - a;
    let qa = d.length_squared();
    let mut hits = [None, None];
    if qa > TIGHT_EPSILON {
        let qb = 2.0 * a.dot(d);
        let qc = a.length_squared() - sqr(radius);
        let discr = sqr(qb) - 4.0 * qa * qc;
        if discr > 0.0 {
            let sqrt_discr = discr.sqrt();
            for (slot, t) in hits
                .iter_mut()
                .zip([(-qb - sqrt_discr) / (2.0 * qa), (-qb + sqrt_discr) / (2.0 * qa)])
            {
                if (0.0..=1.0).contains(&t) {
                    *slot = Some(a + d * t);
                }
            }
        }
    }
    hits.into_iter().flatten()
}
