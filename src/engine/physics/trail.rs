use std::collections::VecDeque;

use super::debug::Renderer;
use super::world::BodyId;
use crate::core::math::Vec2;

/// A recorded position of the followed body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub time: f64,
    pub position: Vec2,
}

/// Trajectory recorder for one body
#[derive(Debug, Clone)]
pub struct Trail {
    body: BodyId,
    ticks_per_record: u32,
    limit: usize,
    ticks: u32,
    samples: VecDeque<TrailSample>,
}

impl Trail {
    /// Record every `ticks_per_record` ticks (at least 1), keeping at most
    /// `limit` samples. A limit of 0 keeps everything.
    pub fn new(body: BodyId, ticks_per_record: u32, limit: usize) -> Self {
        Self {
            body,
            ticks_per_record: ticks_per_record.max(1),
            limit,
            ticks: 0,
            samples: VecDeque::new(),
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Count one tick and record a sample when due. Non-finite positions are
    /// never recorded.
    pub fn tick(&mut self, time: f64, position: Vec2) {
        self.ticks += 1;
        if self.ticks < self.ticks_per_record {
            return;
        }
        self.ticks = 0;

        if !position.is_finite() {
            return;
        }
        self.samples.push_back(TrailSample { time, position });
        if self.limit > 0 && self.samples.len() > self.limit {
            self.samples.pop_front();
        }
    }

    pub fn samples(&self) -> impl Iterator<Item = &TrailSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.ticks = 0;
    }

    /// Draw the trajectory as a polyline
    pub fn render(&self, renderer: &mut dyn Renderer) {
        let mut points = self.samples.iter().map(|sample| sample.position);
        let Some(mut previous) = points.next() else {
            return;
        };
        for point in points {
            renderer.draw_line(previous, point);
            previous = point;
        }
    }
}
