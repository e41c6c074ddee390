// Segment geometry used by the polygon collision shapes

use super::math::{Vec2, VecExt};
use crate::engine::physics::PhysicsError;

/// Determinants smaller than this are treated as parallel segments
const PARALLEL_EPSILON: f64 = 1e-12;

/// An ordered segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Vec2,
    pub end: Vec2,
}

impl Edge {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Direction from `start` to `end` (not normalized)
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    /// Outward unit normal for an edge of a clockwise-wound polygon.
    /// Zero for a zero-length edge.
    pub fn normal(&self) -> Vec2 {
        (self.start - self.end).normalize_or_zero().rotate_clockwise_90()
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Intersection point with another segment, see [`edge_intersection`]
    pub fn intersection(&self, other: &Edge) -> Option<Vec2> {
        edge_intersection(self, other)
    }
}

/// Parametric segment/segment intersection.
///
/// Returns the crossing point only when both segment parameters lie in
/// `[0, 1]`. Parallel and near-parallel segments (including collinear
/// overlaps) report no intersection.
pub fn edge_intersection(first: &Edge, second: &Edge) -> Option<Vec2> {
    let a = first.start;
    let b = first.end;
    let c = second.start;
    let d = second.end;

    let det = (b - a).determinant(c - d);
    let scale = (b - a).length() * (c - d).length();
    if scale == 0.0 || det.abs() <= PARALLEL_EPSILON * scale {
        return None;
    }

    let t = (c - a).determinant(c - d) / det;
    let u = (b - a).determinant(c - a) / det;

    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(a * (1.0 - t) + b * t)
}

/// Build a vertex list from flat `[x0, y0, x1, y1, ...]` coordinates
pub fn polygon_from_coords(coords: &[f64]) -> Result<Vec<Vec2>, PhysicsError> {
    if coords.len() % 2 != 0 {
        return Err(PhysicsError::DimensionMismatch {
            expected: coords.len() + 1,
            actual: coords.len(),
        });
    }
    Ok(coords
        .chunks_exact(2)
        .map(|pair| Vec2::new(pair[0], pair[1]))
        .collect())
}
