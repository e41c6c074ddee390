// Convex polygon collision shapes

use std::f64::consts::{PI, TAU};

use super::collision::Contact;
use super::PhysicsError;
use crate::core::geometry::Edge;
use crate::core::math::{Vec2, VecExt};

/// Samples per axis for the bounding-center search
const CENTER_GRID_STEPS: usize = 100;

/// World-space geometry memoized for one (position, angle) pose.
///
/// The cache never recomputes on its own; the owner checks
/// [`GeometryCache::is_current`] and calls [`GeometryCache::store`].
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    cached_for: Option<(Vec2, f64)>,
    points: Vec<Vec2>,
    edges: Vec<Edge>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cached geometry was computed for exactly this pose
    pub fn is_current(&self, position: Vec2, angle: f64) -> bool {
        self.cached_for == Some((position, angle))
    }

    pub fn invalidate(&mut self) {
        self.cached_for = None;
    }

    /// Replace the cached geometry. Edges close the polygon, the first edge
    /// runs from the last vertex to the first.
    pub fn store(&mut self, position: Vec2, angle: f64, points: Vec<Vec2>) {
        self.edges.clear();
        if let Some(&last) = points.last() {
            let mut previous = last;
            for &point in &points {
                self.edges.push(Edge::new(previous, point));
                previous = point;
            }
        }
        self.points = points;
        self.cached_for = Some((position, angle));
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Convex polygon attached to a body.
///
/// Vertices are stored relative to an approximate Chebyshev center; the
/// distance from that center to the farthest vertex is the bounding radius
/// used by the broad phase. World geometry follows the owning body's
/// *future* pose so collisions are found before they are committed.
#[derive(Debug, Clone)]
pub struct PolygonRigidbody {
    local_points: Vec<Vec2>,
    local_center: Vec2,
    radius: f64,
    /// Current (committed) position of the owning body
    anchor: Vec2,
    cache: GeometryCache,
}

impl PolygonRigidbody {
    /// Build a shape from vertices given in the body's local frame.
    /// Vertices should be wound clockwise so edge normals face outward.
    pub fn new(points: Vec<Vec2>) -> Result<Self, PhysicsError> {
        if points.len() < 3 {
            return Err(PhysicsError::DegeneratePolygon {
                vertices: points.len(),
            });
        }

        let (local_center, radius) = approximate_chebyshev_center(&points);
        let local_points = points.into_iter().map(|p| p - local_center).collect();

        Ok(Self {
            local_points,
            local_center,
            radius,
            anchor: Vec2::ZERO,
            cache: GeometryCache::new(),
        })
    }

    /// Bounding radius around [`Self::center`]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Offset of the bounding center from the body origin
    pub fn local_center(&self) -> Vec2 {
        self.local_center
    }

    /// Vertices relative to the bounding center
    pub fn local_points(&self) -> &[Vec2] {
        &self.local_points
    }

    /// Bounding center at the owning body's current position
    pub fn center(&self) -> Vec2 {
        self.local_center + self.anchor
    }

    /// Sync with the owning body. Geometry is only rebuilt when the future
    /// pose changed since the last call; returns whether it was.
    pub fn refresh(&mut self, position: Vec2, future_position: Vec2, future_angle: f64) -> bool {
        self.anchor = position;
        if self.cache.is_current(future_position, future_angle) {
            return false;
        }

        let points = self.points_at(future_position, future_angle);
        self.cache.store(future_position, future_angle, points);
        log::trace!("Recomputed polygon geometry at {:?}", future_position);
        true
    }

    /// World-space vertices for the last refreshed pose
    pub fn points(&self) -> &[Vec2] {
        self.cache.points()
    }

    /// World-space edges for the last refreshed pose
    pub fn edges(&self) -> &[Edge] {
        self.cache.edges()
    }

    /// World-space vertices for an arbitrary pose, bypassing the cache
    pub fn points_at(&self, position: Vec2, angle: f64) -> Vec<Vec2> {
        self.local_points
            .iter()
            .map(|p| p.rotated(angle) + self.local_center + position)
            .collect()
    }

    /// Every crossing between this shape's edges and `other`'s.
    ///
    /// Pairs whose bounding circles are apart are rejected without looking
    /// at edges. Both shapes must have been refreshed for the current pass.
    pub fn intersections(&self, other: &PolygonRigidbody) -> Vec<Contact> {
        if self.center().distance(other.center()) > self.radius + other.radius {
            return Vec::new();
        }

        let mut contacts = Vec::new();
        for edge in self.edges() {
            for other_edge in other.edges() {
                if let Some(point) = edge.intersection(other_edge) {
                    contacts.push(Contact {
                        edge: *edge,
                        other_edge: *other_edge,
                        point,
                    });
                }
            }
        }
        contacts
    }
}

/// Coarse grid search for the point minimizing the largest vertex distance.
/// Returns the point and that distance.
fn approximate_chebyshev_center(points: &[Vec2]) -> (Vec2, f64) {
    let min = points.iter().copied().fold(Vec2::splat(f64::INFINITY), Vec2::min);
    let max = points.iter().copied().fold(Vec2::splat(f64::NEG_INFINITY), Vec2::max);
    let size = max - min;

    let steps_x = if size.x > 0.0 { CENTER_GRID_STEPS } else { 1 };
    let steps_y = if size.y > 0.0 { CENTER_GRID_STEPS } else { 1 };
    let step = size / CENTER_GRID_STEPS as f64;

    let farthest = |candidate: Vec2| {
        points
            .iter()
            .map(|p| p.distance(candidate))
            .fold(0.0_f64, f64::max)
    };

    let mut best = min;
    let mut best_distance = farthest(min);
    for i in 0..steps_x {
        for j in 0..steps_y {
            let candidate = min + Vec2::new(step.x * i as f64, step.y * j as f64);
            let distance = farthest(candidate);
            if distance < best_distance {
                best_distance = distance;
                best = candidate;
            }
        }
    }
    (best, best_distance)
}

/// Vertices of a regular `n`-gon of circumradius `radius` around the origin,
/// wound clockwise starting at 45 degrees from the +y axis
pub fn regular_polygon(radius: f64, n: usize) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(n);
    let mut angle = PI / 4.0;
    for _ in 0..n {
        points.push(Vec2::new(radius * angle.sin(), radius * angle.cos()));
        angle += TAU / n as f64;
    }
    points
}
