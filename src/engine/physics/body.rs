use super::debug::Renderer;
use super::integrator::{integrate_angle, Integrator, KinematicState};
use super::rigidbody::{regular_polygon, PolygonRigidbody};
use super::PhysicsError;
use crate::core::math::{Vec2, VecExt};

/// Radius of the circle drawn for a pendulum bob
const PENDULUM_BOB_RADIUS: f64 = 0.3;

/// Accumulators and settings that only movable bodies carry
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicState {
    /// Linear acceleration accumulated this tick
    pub acceleration: Vec2,
    /// Angular acceleration accumulated this tick
    pub angular_acceleration: f64,
    /// Velocity-cancelling force queued by collision resolution
    pub stop_force: Vec2,
    /// Whether off-center forces produce torque
    pub can_rotate: bool,
    /// Linear integration scheme
    pub integrator: Integrator,
    /// Arm length of a body swinging about a fixed pivot at its position.
    /// The weight sits at the end of the arm.
    pub pivot_arm: Option<f64>,
    /// Angular damping of a pivoted body
    pub angular_damping: f64,
}

impl DynamicState {
    fn new(can_rotate: bool, integrator: Integrator) -> Self {
        Self {
            acceleration: Vec2::ZERO,
            angular_acceleration: 0.0,
            stop_force: Vec2::ZERO,
            can_rotate,
            integrator,
            pivot_arm: None,
            angular_damping: 0.0,
        }
    }
}

/// Static bodies never move; dynamic bodies integrate accumulated forces
#[derive(Debug, Clone, PartialEq)]
pub enum BodyKind {
    Static,
    Dynamic(DynamicState),
}

/// A simulated object: kinematic state, mass properties and an optional
/// collision shape
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub angle: f64,
    pub velocity: Vec2,
    pub angular_velocity: f64,
    pub mass: f64,
    pub moment_of_inertia: f64,
    pub affected_by_gravity: bool,
    future_angle: f64,
    rigidbody: Option<PolygonRigidbody>,
    kind: BodyKind,
}

impl Body {
    pub fn kind(&self) -> &BodyKind {
        &self.kind
    }

    pub fn dynamic_state(&self) -> Option<&DynamicState> {
        match &self.kind {
            BodyKind::Dynamic(state) => Some(state),
            BodyKind::Static => None,
        }
    }

    pub fn is_immovable(&self) -> bool {
        matches!(self.kind, BodyKind::Static)
    }

    /// False once the position has gone NaN or infinite
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
    }

    pub fn can_rotate(&self) -> bool {
        self.dynamic_state().is_some_and(|state| state.can_rotate)
    }

    /// Arm length when the body swings about a fixed pivot
    pub fn pivot_arm(&self) -> Option<f64> {
        self.dynamic_state().and_then(|state| state.pivot_arm)
    }

    pub fn is_pivoted(&self) -> bool {
        self.pivot_arm().is_some()
    }

    /// Where the mass sits: the bob of a pivoted body, `position` otherwise
    pub fn weight_position(&self) -> Vec2 {
        match self.pivot_arm() {
            Some(arm) => self.position + Vec2::new(arm, 0.0).rotated(self.angle),
            None => self.position,
        }
    }

    pub fn rigidbody(&self) -> Option<&PolygonRigidbody> {
        self.rigidbody.as_ref()
    }

    /// Snapshot handed to the integrator
    pub fn kinematic_state(&self) -> KinematicState {
        let acceleration = self
            .dynamic_state()
            .map_or(Vec2::ZERO, |state| state.acceleration);
        KinematicState::new(self.position, self.velocity, acceleration)
    }

    /// Where the body would end up this tick under the forces accumulated
    /// so far
    pub fn future_position(&self, dt: f64) -> Vec2 {
        match &self.kind {
            BodyKind::Static => self.position,
            BodyKind::Dynamic(state) if state.pivot_arm.is_some() => self.position,
            BodyKind::Dynamic(state) => state.integrator.integrate(&self.kinematic_state(), dt),
        }
    }

    /// Angle predicted at the end of the previous tick
    pub fn future_angle(&self) -> f64 {
        self.future_angle
    }

    /// Bring the collision shape in line with the future pose
    pub fn refresh_geometry(&mut self, dt: f64) {
        let future_position = self.future_position(dt);
        let future_angle = self.future_angle;
        let position = self.position;
        if let Some(rigidbody) = self.rigidbody.as_mut() {
            rigidbody.refresh(position, future_position, future_angle);
        }
    }

    /// Rebuild the collision shape at the committed pose
    pub fn sync_geometry(&mut self) {
        let (position, angle) = (self.position, self.angle);
        if let Some(rigidbody) = self.rigidbody.as_mut() {
            rigidbody.refresh(position, position, angle);
        }
    }

    /// Accumulate a force for this tick.
    ///
    /// Without rotation (or with no lever arm) the whole force accelerates the
    /// body. Rotating bodies split it: the part along the lever arm
    /// `apply_point - position` accelerates, the part across it only
    /// produces torque. A pivoted body only turns, and forces without an
    /// application point act on its bob.
    pub fn apply_force(&mut self, force: Vec2, apply_point: Option<Vec2>) {
        let apply_point = apply_point.or_else(|| self.is_pivoted().then(|| self.weight_position()));
        let lever = apply_point.map_or(Vec2::ZERO, |point| point - self.position);
        let mass = self.mass;
        let inertia = self.moment_of_inertia;
        let BodyKind::Dynamic(state) = &mut self.kind else {
            return;
        };

        if state.pivot_arm.is_some() {
            if inertia > 0.0 {
                state.angular_acceleration += lever.determinant(force) / inertia;
            }
        } else if state.can_rotate && inertia > 0.0 && lever != Vec2::ZERO {
            state.angular_acceleration += lever.determinant(force) / inertia;
            let axis = lever.normalize_or_zero();
            state.acceleration += axis * (force.dot(axis) / mass);
        } else {
            state.acceleration += force / mass;
        }
    }

    /// Queue a force that cancels the velocity component along `normal`,
    /// counting stop forces already queued this tick
    pub fn apply_stop_velocity_force(&mut self, normal: Vec2, dt: f64) {
        let mass = self.mass;
        let velocity = self.velocity;
        let BodyKind::Dynamic(state) = &mut self.kind else {
            return;
        };

        let pending = velocity + state.stop_force / mass * dt;
        let along = pending.dot(normal);
        state.stop_force -= normal * (along * mass / dt);
    }

    /// Commit one tick: apply the queued stop force (and damping of a
    /// pivoted body), integrate position and angle, then velocities, clear
    /// the accumulators and move the collision shape to the new pose
    pub fn update(&mut self, dt: f64) {
        let (stop_force, damping) = match &self.kind {
            BodyKind::Dynamic(state) => (state.stop_force, state.angular_damping),
            BodyKind::Static => return,
        };
        if stop_force != Vec2::ZERO {
            self.apply_force(stop_force, None);
        }
        if self.is_pivoted() && damping != 0.0 {
            let arm = self.weight_position() - self.position;
            self.apply_force(arm.perp() * (-self.angular_velocity * damping), None);
        }

        let state = self.kinematic_state();
        let BodyKind::Dynamic(dynamic) = &mut self.kind else {
            return;
        };

        if dynamic.pivot_arm.is_none() {
            self.position = dynamic.integrator.integrate(&state, dt);
            self.velocity += dynamic.acceleration * dt;
        }
        self.angle = integrate_angle(
            self.angle,
            self.angular_velocity,
            dynamic.angular_acceleration,
            dt,
        );

        self.angular_velocity += dynamic.angular_acceleration * dt;

        dynamic.acceleration = Vec2::ZERO;
        dynamic.angular_acceleration = 0.0;
        dynamic.stop_force = Vec2::ZERO;

        self.future_angle = self.angle + self.angular_velocity * dt;
        self.sync_geometry();
    }

    /// `m|v|^2/2 + I*w^2/2`
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
            + 0.5 * self.moment_of_inertia * self.angular_velocity * self.angular_velocity
    }

    /// `m*g*(y - offset_y)`, measured at the weight position
    pub fn potential_energy(&self, offset_y: f64, gravity: f64) -> f64 {
        self.mass * gravity * (self.weight_position().y - offset_y)
    }

    /// Draw the shape at the current (committed) pose. A pivoted body also
    /// draws its arm and bob.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if self.is_pivoted() {
            let bob = self.weight_position();
            renderer.draw_line(self.position, bob);
            renderer.draw_circle(bob, PENDULUM_BOB_RADIUS);
        }
        match &self.rigidbody {
            Some(rigidbody) => {
                let points = rigidbody.points_at(self.position, self.angle);
                renderer.draw_polygon(&points);
            }
            None if !self.is_pivoted() => renderer.draw_circle(self.position, 0.0),
            None => {}
        }
    }
}

/// Builder for creating bodies with common configurations
#[derive(Debug, Clone)]
pub struct BodyBuilder {
    is_static: bool,
    position: Vec2,
    angle: f64,
    velocity: Vec2,
    angular_velocity: f64,
    mass: f64,
    moment_of_inertia: Option<f64>,
    inertia_radius: Option<f64>,
    can_rotate: bool,
    affected_by_gravity: bool,
    integrator: Integrator,
    pivot_arm: Option<f64>,
    angular_damping: f64,
    shape: Option<Vec<Vec2>>,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            is_static: false,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 1.0,
            moment_of_inertia: None,
            inertia_radius: None,
            can_rotate: false,
            affected_by_gravity: true,
            integrator: Integrator::default(),
            pivot_arm: None,
            angular_damping: 0.0,
            shape: None,
        }
    }

    /// Create a new static body (completely immovable, massless)
    pub fn new_static() -> Self {
        Self {
            is_static: true,
            mass: 0.0,
            affected_by_gravity: false,
            ..Self::new_dynamic()
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn position_vec(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set the initial rotation (radians, counter-clockwise)
    pub fn angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set the initial linear velocity
    pub fn velocity(mut self, x: f64, y: f64) -> Self {
        self.velocity = Vec2::new(x, y);
        self
    }

    /// Set the initial angular velocity (radians per second)
    pub fn angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Override the moment of inertia (otherwise `m*r^2/2` for rotating bodies)
    pub fn moment_of_inertia(mut self, moment_of_inertia: f64) -> Self {
        self.moment_of_inertia = Some(moment_of_inertia);
        self
    }

    /// Radius used for the default moment of inertia when there is no shape
    pub fn inertia_radius(mut self, radius: f64) -> Self {
        self.inertia_radius = Some(radius);
        self
    }

    pub fn can_rotate(mut self, can_rotate: bool) -> Self {
        self.can_rotate = can_rotate;
        self
    }

    pub fn affected_by_gravity(mut self, affected: bool) -> Self {
        self.affected_by_gravity = affected;
        self
    }

    pub fn integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Swing about the body position on an arm of length `arm` instead of
    /// translating. The arm points along the body angle.
    pub fn pivot_arm(mut self, arm: f64) -> Self {
        self.pivot_arm = Some(arm);
        self
    }

    /// Damping coefficient of a pivoted body's swing
    pub fn angular_damping(mut self, damping: f64) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Attach a convex polygon (local frame, clockwise)
    pub fn shape(mut self, points: Vec<Vec2>) -> Self {
        self.shape = Some(points);
        self
    }

    /// Build the body
    pub fn build(self) -> Result<Body, PhysicsError> {
        let rigidbody = self.shape.map(PolygonRigidbody::new).transpose()?;

        if self.is_static {
            let mut body = Body {
                position: self.position,
                angle: self.angle,
                velocity: Vec2::ZERO,
                angular_velocity: 0.0,
                mass: 0.0,
                moment_of_inertia: 0.0,
                affected_by_gravity: false,
                future_angle: self.angle,
                rigidbody,
                kind: BodyKind::Static,
            };
            body.sync_geometry();
            return Ok(body);
        }

        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(self.mass));
        }

        if let Some(arm) = self.pivot_arm {
            if !arm.is_finite() || arm <= 0.0 {
                return Err(PhysicsError::InvalidPivotArm(arm));
            }
        }
        let can_rotate = self.can_rotate || self.pivot_arm.is_some();

        let moment_of_inertia = match (self.moment_of_inertia, can_rotate) {
            (Some(inertia), _) => inertia,
            (None, true) => {
                let radius = self
                    .inertia_radius
                    .or(self.pivot_arm)
                    .or_else(|| rigidbody.as_ref().map(PolygonRigidbody::radius))
                    .unwrap_or(0.0);
                self.mass * radius * radius / 2.0
            }
            (None, false) => 0.0,
        };

        let mut state = DynamicState::new(can_rotate, self.integrator);
        state.pivot_arm = self.pivot_arm;
        state.angular_damping = self.angular_damping;

        let mut body = Body {
            position: self.position,
            angle: self.angle,
            velocity: if self.pivot_arm.is_some() { Vec2::ZERO } else { self.velocity },
            angular_velocity: self.angular_velocity,
            mass: self.mass,
            moment_of_inertia,
            affected_by_gravity: self.affected_by_gravity,
            future_angle: self.angle,
            rigidbody,
            kind: BodyKind::Dynamic(state),
        };
        body.sync_geometry();
        Ok(body)
    }
}

/// Common body configurations used by the demos
pub mod presets {
    use super::*;

    /// Number of sides used to approximate a circle
    pub const CIRCLE_SEGMENTS: usize = 12;

    /// A dynamic, non-rotating ball
    pub fn circle(radius: f64, position: Vec2, mass: f64) -> Result<Body, PhysicsError> {
        BodyBuilder::new_dynamic()
            .position_vec(position)
            .mass(mass)
            .shape(regular_polygon(radius, CIRCLE_SEGMENTS))
            .build()
    }

    /// A static slab of thickness 1 hanging below the segment
    /// `start .. start + direction`
    pub fn line(start: Vec2, direction: Vec2) -> Result<Body, PhysicsError> {
        let thickness = direction.normalize_or_zero().rotate_clockwise_90();
        BodyBuilder::new_static()
            .position_vec(start)
            .shape(vec![
                Vec2::ZERO,
                direction,
                direction + thickness,
                thickness,
            ])
            .build()
    }

    /// A pendulum hanging from `pivot` on an arm of length `arm`, its bob
    /// `angle` radians counter-clockwise from +x. `damping` slows the swing.
    pub fn pendulum(
        pivot: Vec2,
        arm: f64,
        angle: f64,
        mass: f64,
        damping: f64,
    ) -> Result<Body, PhysicsError> {
        BodyBuilder::new_dynamic()
            .position_vec(pivot)
            .angle(angle)
            .mass(mass)
            .pivot_arm(arm)
            .angular_damping(damping)
            .build()
    }

    /// A static anchor without a shape, for springs and pivots
    pub fn anchor(position: Vec2) -> Body {
        Body {
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 0.0,
            moment_of_inertia: 0.0,
            affected_by_gravity: false,
            future_angle: 0.0,
            rigidbody: None,
            kind: BodyKind::Static,
        }
    }
}
