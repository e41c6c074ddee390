//! Numerical integrators for body motion.
//!
//! Every integrator is a pure function of a [`KinematicState`] snapshot and a
//! fixed step. Acceleration is taken as constant over the step, so the
//! Runge-Kutta stages evaluate velocity in closed form (`v + a * c_i * dt`)
//! instead of re-applying forces.

use std::fmt;
use std::str::FromStr;

use super::PhysicsError;
use crate::core::math::Vec2;

/// Signature of a user-supplied linear integrator
pub type IntegratorFn = fn(&KinematicState, f64) -> Vec2;

/// Snapshot of the linear motion of a body at the start of a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl KinematicState {
    pub fn new(position: Vec2, velocity: Vec2, acceleration: Vec2) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    /// Velocity at `fraction` of a step of length `dt`
    fn velocity_at(&self, fraction: f64, dt: f64) -> Vec2 {
        self.velocity + self.acceleration * (fraction * dt)
    }
}

/// Linear integration scheme
#[derive(Debug, Clone, Copy)]
pub enum Integrator {
    /// `x + v * dt`
    Euler,
    /// Classic fourth-order Runge-Kutta
    Rk4,
    /// Kutta's 3/8 rule
    Rk3Over8,
    /// Ralston's minimum-error fourth-order method
    Ralston,
    /// Strong-stability-preserving third-order Runge-Kutta
    Ssprk3,
    /// Any pure function of the snapshot and step
    Custom(IntegratorFn),
}

/// Integrators compare by name. Function pointers have no reliable identity,
/// so any two custom schemes are equal.
impl PartialEq for Integrator {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::Rk4
    }
}

impl Integrator {
    /// All built-in integrators, in the order they are usually presented
    pub const BUILTIN: [Integrator; 5] = [
        Integrator::Euler,
        Integrator::Rk4,
        Integrator::Rk3Over8,
        Integrator::Ralston,
        Integrator::Ssprk3,
    ];

    /// Position after one step of length `dt`
    pub fn integrate(&self, state: &KinematicState, dt: f64) -> Vec2 {
        match self {
            Integrator::Euler => state.position + state.velocity * dt,
            Integrator::Rk4 => {
                let k1 = state.velocity_at(0.0, dt);
                let k2 = state.velocity_at(0.5, dt);
                let k3 = state.velocity_at(0.5, dt);
                let k4 = state.velocity_at(1.0, dt);
                state.position + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
            }
            Integrator::Rk3Over8 => {
                let k1 = state.velocity_at(0.0, dt);
                let k2 = state.velocity_at(1.0 / 3.0, dt);
                let k3 = state.velocity_at(2.0 / 3.0, dt);
                let k4 = state.velocity_at(1.0, dt);
                state.position + (k1 + k2 * 3.0 + k3 * 3.0 + k4) * (dt / 8.0)
            }
            Integrator::Ralston => {
                let t = ralston::Tableau::get();
                let k1 = state.velocity_at(t.c[0], dt);
                let k2 = state.velocity_at(t.c[1], dt);
                let k3 = state.velocity_at(t.c[2], dt);
                let k4 = state.velocity_at(t.c[3], dt);
                state.position + (k1 * t.b[0] + k2 * t.b[1] + k3 * t.b[2] + k4 * t.b[3]) * dt
            }
            Integrator::Ssprk3 => {
                let k1 = state.velocity_at(0.0, dt);
                let k3 = state.velocity_at(2.0 / 3.0, dt);
                state.position + (k1 * 0.25 + k3 * 0.75) * dt
            }
            Integrator::Custom(f) => f(state, dt),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Integrator::Euler => "euler",
            Integrator::Rk4 => "rk4",
            Integrator::Rk3Over8 => "rk3over8",
            Integrator::Ralston => "ralston",
            Integrator::Ssprk3 => "ssprk3",
            Integrator::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Integrator {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Integrator::BUILTIN
            .into_iter()
            .find(|integrator| integrator.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PhysicsError::UnknownIntegrator(s.to_string()))
    }
}

/// Angle after one step, always with the RK4 weighted average regardless of
/// the linear integrator in use
pub fn integrate_angle(angle: f64, angular_velocity: f64, angular_acceleration: f64, dt: f64) -> f64 {
    let k1 = angular_velocity;
    let k2 = angular_velocity + angular_acceleration * 0.5 * dt;
    let k3 = angular_velocity + angular_acceleration * 0.5 * dt;
    let k4 = angular_velocity + angular_acceleration * dt;
    angle + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (dt / 6.0)
}

mod ralston {
    /// Stage times and weights of Ralston's fourth-order method
    pub struct Tableau {
        pub c: [f64; 4],
        pub b: [f64; 4],
    }

    impl Tableau {
        pub fn get() -> Self {
            let s5 = 5.0_f64.sqrt();
            Self {
                c: [0.0, 0.4, (14.0 - 3.0 * s5) / 16.0, 1.0],
                b: [
                    (263.0 + 24.0 * s5) / 1812.0,
                    (125.0 - 1000.0 * s5) / 3828.0,
                    (3_426_304.0 + 1_661_952.0 * s5) / 5_924_787.0,
                    (30.0 - 4.0 * s5) / 123.0,
                ],
            }
        }
    }
}
