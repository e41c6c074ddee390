//! Fixed-step 2D rigid-body mechanics: interchangeable integrators, polygon
//! collision detection against predicted poses and impulse-style collision
//! response with energy bookkeeping.

pub mod core;
pub mod engine;
