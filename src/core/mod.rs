// Core utilities and shared types

pub mod geometry;
pub mod math;
