//! Forces that act between bodies or on all of them, evaluated once per tick
//! after collision resolution.

use std::fmt;

use super::body::Body;
use super::world::BodyId;
use super::PhysicsError;
use crate::core::math::{Vec2, VecExt};
use crate::engine::config::SimulationConfig;

/// A force field run by the model every tick
pub trait ForceGenerator: fmt::Debug {
    /// Accumulate this tick's forces on `bodies`
    fn apply(&self, bodies: &mut [Body], config: &SimulationConfig);

    /// Potential energy stored in the field
    fn energy(&self, bodies: &[Body], config: &SimulationConfig) -> f64;

    /// Check that every body the generator refers to exists
    fn validate(&self, body_count: usize) -> Result<(), PhysicsError> {
        let _ = body_count;
        Ok(())
    }
}

/// Hookean spring between two bodies
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub first: BodyId,
    pub second: BodyId,
    /// Attachment point in `first`'s local frame
    pub first_anchor: Vec2,
    /// Attachment point in `second`'s local frame
    pub second_anchor: Vec2,
    pub rest_length: f64,
    pub stiffness: f64,
}

impl Spring {
    pub fn new(first: BodyId, second: BodyId, rest_length: f64, stiffness: f64) -> Self {
        Self {
            first,
            second,
            first_anchor: Vec2::ZERO,
            second_anchor: Vec2::ZERO,
            rest_length,
            stiffness,
        }
    }

    pub fn with_anchors(mut self, first_anchor: Vec2, second_anchor: Vec2) -> Self {
        self.first_anchor = first_anchor;
        self.second_anchor = second_anchor;
        self
    }

    /// World positions of both ends
    pub fn endpoints(&self, bodies: &[Body]) -> Option<(Vec2, Vec2)> {
        let first = bodies.get(self.first.0)?;
        let second = bodies.get(self.second.0)?;
        Some((
            first.position + self.first_anchor.rotated(first.angle),
            second.position + self.second_anchor.rotated(second.angle),
        ))
    }

    fn extension(&self, start: Vec2, end: Vec2) -> f64 {
        start.distance(end) - self.rest_length
    }
}

impl ForceGenerator for Spring {
    fn apply(&self, bodies: &mut [Body], _config: &SimulationConfig) {
        let Some((start, end)) = self.endpoints(bodies) else {
            return;
        };
        if !start.is_finite() || !end.is_finite() {
            return;
        }
        let direction = (end - start).normalize_or_zero();
        let force = direction * (self.stiffness * self.extension(start, end));

        bodies[self.first.0].apply_force(force, Some(start));
        bodies[self.second.0].apply_force(-force, Some(end));
    }

    fn energy(&self, bodies: &[Body], _config: &SimulationConfig) -> f64 {
        match self.endpoints(bodies) {
            Some((start, end)) if start.is_finite() && end.is_finite() => {
                let extension = self.extension(start, end);
                0.5 * self.stiffness * extension * extension
            }
            _ => 0.0,
        }
    }

    fn validate(&self, body_count: usize) -> Result<(), PhysicsError> {
        for id in [self.first, self.second] {
            if id.0 >= body_count {
                return Err(PhysicsError::UnknownBody(id.0));
            }
        }
        Ok(())
    }
}

/// Newtonian attraction between every pair of dynamic bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutualGravitation {
    pub constant: f64,
}

impl MutualGravitation {
    pub fn new(constant: f64) -> Self {
        Self { constant }
    }

    /// Index pairs of dynamic bodies with distinct finite positions
    fn pairs(bodies: &[Body]) -> impl Iterator<Item = (usize, usize)> + '_ {
        let attracting = |body: &Body| !body.is_immovable() && body.is_valid();
        (0..bodies.len())
            .flat_map(move |i| (i + 1..bodies.len()).map(move |j| (i, j)))
            .filter(move |&(i, j)| {
                attracting(&bodies[i])
                    && attracting(&bodies[j])
                    && bodies[i].position != bodies[j].position
            })
    }
}

impl Default for MutualGravitation {
    fn default() -> Self {
        Self::new(crate::engine::config::GRAVITATIONAL_CONSTANT)
    }
}

impl ForceGenerator for MutualGravitation {
    fn apply(&self, bodies: &mut [Body], _config: &SimulationConfig) {
        let forces: Vec<(usize, usize, Vec2)> = Self::pairs(bodies)
            .map(|(i, j)| {
                let offset = bodies[j].position - bodies[i].position;
                let magnitude =
                    self.constant * bodies[i].mass * bodies[j].mass / offset.length_squared();
                (i, j, offset.normalize_or_zero() * magnitude)
            })
            .collect();

        for (i, j, force) in forces {
            bodies[i].apply_force(force, None);
            bodies[j].apply_force(-force, None);
        }
    }

    fn energy(&self, bodies: &[Body], _config: &SimulationConfig) -> f64 {
        Self::pairs(bodies)
            .map(|(i, j)| {
                let distance = bodies[i].position.distance(bodies[j].position);
                -self.constant * bodies[i].mass * bodies[j].mass / distance
            })
            .sum()
    }
}

/// Resistance of the surrounding medium, proportional to velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDrag {
    pub coefficient: f64,
}

impl LinearDrag {
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }
}

impl ForceGenerator for LinearDrag {
    fn apply(&self, bodies: &mut [Body], _config: &SimulationConfig) {
        for body in bodies.iter_mut().filter(|body| !body.is_immovable()) {
            let force = body.velocity * -self.coefficient;
            body.apply_force(force, None);
        }
    }

    fn energy(&self, _bodies: &[Body], _config: &SimulationConfig) -> f64 {
        0.0
    }
}
