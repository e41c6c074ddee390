//! Simulation configuration.
//!
//! Every value that used to be an ambient global (time step, ticks per
//! rendered frame, gravity) travels in a [`SimulationConfig`] handed to the
//! model at construction.

use crate::engine::physics::{Integrator, PhysicsError};

/// Standard gravitational acceleration near the Earth's surface (m/s^2)
pub const STANDARD_GRAVITY: f64 = 9.8;

/// Newtonian constant of gravitation (m^3 kg^-1 s^-2)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.6743e-11;

/// Wall-clock length of one rendered frame the demos aim for (seconds)
pub const FRAME_RENDER_TIME: f64 = 0.016;

/// Default number of physics ticks per rendered frame
pub const DEFAULT_TICKS_PER_FRAME: u32 = 100;

/// Configuration for one simulation run.
///
/// # Builder Pattern
/// ```
/// use mechanics_lab::engine::config::SimulationConfig;
/// use mechanics_lab::engine::physics::Integrator;
///
/// let config = SimulationConfig::new()
///     .with_dt(1e-4)
///     .with_gravity(9.81)
///     .with_integrator(Integrator::Ralston);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Fixed time step of one tick (seconds). Default: 0.016 / 100.
    pub dt: f64,
    /// Ticks run per rendered frame. Default: 100.
    pub ticks_per_frame: u32,
    /// Magnitude of the downward gravitational acceleration. Default: 9.8.
    pub gravity: f64,
    /// Global gravity switch. Default: on.
    pub use_gravity: bool,
    /// Integrator given to bodies built through the model. Default: RK4.
    pub integrator: Integrator,
}

impl SimulationConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            dt: FRAME_RENDER_TIME / DEFAULT_TICKS_PER_FRAME as f64,
            ticks_per_frame: DEFAULT_TICKS_PER_FRAME,
            gravity: STANDARD_GRAVITY,
            use_gravity: true,
            integrator: Integrator::default(),
        }
    }

    /// Derive the step from a frame time split into `ticks_per_frame` ticks,
    /// scaled by `time_scale`
    pub fn from_frame_rate(frame_time: f64, ticks_per_frame: u32, time_scale: f64) -> Self {
        Self {
            dt: frame_time / ticks_per_frame.max(1) as f64 * time_scale,
            ticks_per_frame,
            ..Self::new()
        }
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_ticks_per_frame(mut self, ticks_per_frame: u32) -> Self {
        self.ticks_per_frame = ticks_per_frame;
        self
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_gravity_enabled(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Simulated seconds covered by one rendered frame
    pub fn frame_duration(&self) -> f64 {
        self.dt * self.ticks_per_frame as f64
    }

    /// Reject values that would make a tick meaningless
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(PhysicsError::InvalidTimestep(self.dt));
        }
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(PhysicsError::InvalidGravity(self.gravity));
        }
        if self.ticks_per_frame == 0 {
            return Err(PhysicsError::InvalidTicksPerFrame);
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
