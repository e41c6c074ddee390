// Rigid-body mechanics: integration, polygon collision and impulse response

pub mod body;
mod collision;
mod debug;
pub mod forces;
pub mod integrator;
mod rigidbody;
mod trail;
mod world;

pub use body::{Body, BodyBuilder, BodyKind, DynamicState};
pub use collision::{CollisionEvent, Contact, CollisionKind};
pub use debug::{DebugRenderer, DrawCommand, Renderer};
pub use forces::{ForceGenerator, LinearDrag, MutualGravitation, Spring};
pub use integrator::{integrate_angle, Integrator, IntegratorFn, KinematicState};
pub use rigidbody::{regular_polygon, GeometryCache, PolygonRigidbody};
pub use trail::{Trail, TrailSample};
pub use world::{BodyId, SimulationModel};

/// Errors raised while configuring or building a simulation.
///
/// Physical degeneracies during a tick (zero-length normals, bodies that
/// drift to NaN) are never reported here; they are contained per tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    #[error("Gravity magnitude must be non-negative and finite, got {0}")]
    InvalidGravity(f64),

    #[error("Ticks per frame must be at least 1")]
    InvalidTicksPerFrame,

    #[error("Mass must be positive and finite, got {0}")]
    InvalidMass(f64),

    #[error("Pivot arm must be positive and finite, got {0}")]
    InvalidPivotArm(f64),

    #[error("Polygon needs at least 3 vertices, got {vertices}")]
    DegeneratePolygon { vertices: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No body with id {0}")]
    UnknownBody(usize),

    #[error("Unknown integrator: {0}")]
    UnknownIntegrator(String),
}
