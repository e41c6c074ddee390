use super::body::{Body, BodyBuilder};
use super::collision::{resolve_pair, CollisionEvent};
use super::debug::Renderer;
use super::forces::ForceGenerator;
use super::trail::Trail;
use super::PhysicsError;
use crate::core::math::Vec2;
use crate::engine::config::SimulationConfig;

/// Handle to a body owned by a [`SimulationModel`]. Bodies are never
/// removed, so the index stays valid for the lifetime of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

/// The simulation: owns every body, force field and trail, and advances
/// them one fixed tick at a time
#[derive(Debug)]
pub struct SimulationModel {
    /// Step, gravity and tick settings
    config: SimulationConfig,

    /// Bodies in insertion order
    bodies: Vec<Body>,

    /// Bodies dropped from collision, force and energy passes after their
    /// position went non-finite
    excluded: Vec<bool>,

    /// Fields evaluated every tick after collisions
    force_generators: Vec<Box<dyn ForceGenerator>>,

    /// Recorded trajectories
    trails: Vec<Trail>,

    /// Collisions resolved during the last tick
    collision_events: Vec<CollisionEvent>,

    /// Simulated time in seconds
    time: f64,

    /// Ticks run so far
    ticks: u64,

    /// Whether `render_frame` draws velocity vectors
    render_velocities: bool,
}

impl SimulationModel {
    /// Create an empty model. Fails when the configuration is unusable.
    pub fn new(config: SimulationConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        log::info!(
            "Simulation created: dt={} ticks/frame={} gravity={} ({}) integrator={}",
            config.dt,
            config.ticks_per_frame,
            config.gravity,
            if config.use_gravity { "on" } else { "off" },
            config.integrator
        );

        Ok(Self {
            config,
            bodies: Vec::new(),
            excluded: Vec::new(),
            force_generators: Vec::new(),
            trails: Vec::new(),
            collision_events: Vec::new(),
            time: 0.0,
            ticks: 0,
            render_velocities: false,
        })
    }

    /// Dynamic body builder preset with the configured integrator
    pub fn dynamic_body(&self) -> BodyBuilder {
        BodyBuilder::new_dynamic().integrator(self.config.integrator)
    }

    /// Add a body to the simulation
    pub fn add_object(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        self.excluded.push(false);
        BodyId(self.bodies.len() - 1)
    }

    /// Chaining form of [`SimulationModel::add_object`]
    pub fn with_object(mut self, body: Body) -> Self {
        self.add_object(body);
        self
    }

    /// Register a force field. Fails when it refers to a body that does not
    /// exist yet.
    pub fn add_force_generator(
        &mut self,
        generator: impl ForceGenerator + 'static,
    ) -> Result<(), PhysicsError> {
        generator.validate(self.bodies.len())?;
        self.force_generators.push(Box::new(generator));
        Ok(())
    }

    /// Start recording the trajectory of `body`, returning the trail index
    pub fn add_trail(
        &mut self,
        body: BodyId,
        ticks_per_record: u32,
        limit: usize,
    ) -> Result<usize, PhysicsError> {
        if body.0 >= self.bodies.len() {
            return Err(PhysicsError::UnknownBody(body.0));
        }
        self.trails.push(Trail::new(body, ticks_per_record, limit));
        Ok(self.trails.len() - 1)
    }

    /// Run one tick: resolve collisions against predicted poses, apply force
    /// fields and gravity, integrate every body and advance time
    pub fn update(&mut self) {
        let dt = self.config.dt;
        self.exclude_invalid_bodies();
        self.collision_events.clear();

        for i in 0..self.bodies.len() {
            for j in 0..i {
                if self.excluded[i] || self.excluded[j] {
                    continue;
                }
                let (first, second) = pair_mut(&mut self.bodies, i, j);
                if let Some(event) = resolve_pair((i, first), (j, second), &self.config) {
                    self.collision_events.push(event);
                }
            }
        }

        for generator in &self.force_generators {
            generator.apply(&mut self.bodies, &self.config);
        }

        let gravity = self.config.use_gravity.then_some(self.config.gravity);
        for (body, excluded) in self.bodies.iter_mut().zip(&self.excluded) {
            if *excluded {
                continue;
            }
            if let Some(g) = gravity.filter(|_| body.affected_by_gravity) {
                let weight = Vec2::new(0.0, -g * body.mass);
                body.apply_force(weight, None);
            }
            body.update(dt);
        }

        self.time += dt;
        self.ticks += 1;

        for trail in &mut self.trails {
            let position = self.bodies[trail.body().0].position;
            trail.tick(self.time, position);
        }
    }

    /// Run `ticks` ticks
    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.update();
        }
    }

    /// Kinetic energy, gravitational potential energy (when gravity is on)
    /// and force field energy of every valid movable body
    pub fn full_energy(&self) -> f64 {
        let bodies = self
            .bodies
            .iter()
            .zip(&self.excluded)
            .filter(|(body, excluded)| !**excluded && body.is_valid() && !body.is_immovable())
            .map(|(body, _)| {
                let potential = if self.config.use_gravity {
                    body.potential_energy(0.0, self.config.gravity)
                } else {
                    0.0
                };
                body.kinetic_energy() + potential
            })
            .sum::<f64>();

        let fields = self
            .force_generators
            .iter()
            .map(|generator| generator.energy(&self.bodies, &self.config))
            .sum::<f64>();

        bodies + fields
    }

    /// Draw every valid body, then velocity vectors and trails
    pub fn render_frame(&self, renderer: &mut dyn Renderer) {
        renderer.prepare_frame();

        for body in self.bodies.iter().filter(|body| body.is_valid()) {
            body.render(renderer);
            if self.render_velocities && !body.is_immovable() {
                renderer.draw_vector(body.position, body.velocity);
            }
        }

        for trail in &self.trails {
            trail.render(renderer);
        }

        renderer.finish_frame();
    }

    pub fn set_render_velocities(&mut self, enabled: bool) {
        self.render_velocities = enabled;
    }

    pub fn renders_velocities(&self) -> bool {
        self.render_velocities
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    /// Whether `id` has been dropped after going non-finite
    pub fn is_excluded(&self, id: BodyId) -> bool {
        self.excluded.get(id.0).copied().unwrap_or(false)
    }

    /// Collisions resolved during the last tick
    pub fn collision_events(&self) -> &[CollisionEvent] {
        &self.collision_events
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn exclude_invalid_bodies(&mut self) {
        for (index, (body, excluded)) in self.bodies.iter().zip(&mut self.excluded).enumerate() {
            if !*excluded && !body.is_valid() {
                *excluded = true;
                log::warn!(
                    "Body {} left the simulation at t={:.4}: position {:?} is not finite",
                    index,
                    self.time,
                    body.position
                );
            }
        }
    }
}

/// Mutable access to two distinct bodies, `i > j`
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    let (head, tail) = bodies.split_at_mut(i);
    (&mut tail[0], &mut head[j])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::presets;
    use crate::engine::physics::debug::{DebugRenderer, DrawCommand};
    use crate::engine::physics::forces::{LinearDrag, Spring};
    use crate::engine::physics::{CollisionKind, Integrator};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    const DT: f64 = 1e-3;

    fn weightless() -> SimulationConfig {
        SimulationConfig::default()
            .with_dt(DT)
            .with_gravity_enabled(false)
    }

    fn ball(model: &mut SimulationModel, x: f64, y: f64, vx: f64, vy: f64) -> BodyId {
        let mut body = presets::circle(0.5, Vec2::new(x, y), 1.0).unwrap();
        body.velocity = Vec2::new(vx, vy);
        model.add_object(body)
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = SimulationModel::new(SimulationConfig::default().with_dt(0.0));
        assert!(matches!(result, Err(PhysicsError::InvalidTimestep(_))));
    }

    #[test]
    fn test_free_fall_is_exact_for_constant_gravity() {
        let config = SimulationConfig::default().with_dt(DT);
        let mut model = SimulationModel::new(config).unwrap();
        let id = model.add_object(BodyBuilder::new_dynamic().position(0.0, 10.0).build().unwrap());
        model.run(100);

        let body = model.body(id).unwrap();
        assert_abs_diff_eq!(body.velocity.y, -0.98, epsilon = 1e-12);
        assert_abs_diff_eq!(body.position.y, 10.0 - 0.049, epsilon = 1e-12);
        assert_abs_diff_eq!(model.time(), 0.1, epsilon = 1e-12);
        assert_eq!(model.ticks(), 100);
    }

    #[test]
    fn test_gravity_respects_body_flag() {
        let mut model = SimulationModel::new(SimulationConfig::default().with_dt(DT)).unwrap();
        let floating = model.add_object(
            BodyBuilder::new_dynamic()
                .affected_by_gravity(false)
                .build()
                .unwrap(),
        );
        model.run(10);
        assert_eq!(model.body(floating).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_head_on_circles_exchange_velocities() {
        let mut model = SimulationModel::new(weightless()).unwrap();
        let left = ball(&mut model, -1.5, 0.0, 2.0, 0.0);
        let right = ball(&mut model, 1.5, 0.0, -2.0, 0.0);
        let energy = model.full_energy();
        assert_abs_diff_eq!(energy, 4.0, epsilon = 1e-12);

        let mut collisions = 0;
        for _ in 0..1500 {
            model.update();
            collisions += model.collision_events().len();
        }

        assert_eq!(collisions, 1);
        let (left, right) = (model.body(left).unwrap(), model.body(right).unwrap());
        assert_abs_diff_eq!(left.velocity.x, -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(right.velocity.x, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(left.velocity.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(right.velocity.y, 0.0, epsilon = 1e-9);
        assert!(left.position.x < right.position.x);
        assert_abs_diff_eq!(model.full_energy(), energy, epsilon = 1e-9);
    }

    #[test]
    fn test_ball_dropped_onto_line_bounces() {
        let config = SimulationConfig::default().with_dt(DT).with_gravity(9.8);
        let mut model = SimulationModel::new(config).unwrap();
        model.add_object(presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0)).unwrap());
        let id = ball(&mut model, 0.0, 5.0, 0.0, 0.0);

        let mut impact_speed = None;
        for _ in 0..3000 {
            let before = model.body(id).unwrap().velocity.y;
            model.update();
            if let Some(event) = model.collision_events().first() {
                assert_eq!(event.kind, CollisionKind::WithImmovable);
                impact_speed = Some(-before);
                break;
            }
        }

        let impact_speed = impact_speed.expect("ball never reached the line");
        let bounce = model.body(id).unwrap().velocity.y;
        assert!(impact_speed > 9.0);
        assert!(bounce > 0.0);
        assert!(bounce <= impact_speed * (1.0 + 1e-9));
        assert!(bounce >= 0.9 * impact_speed);

        // Still above the line a little later
        model.run(100);
        assert!(model.body(id).unwrap().position.y > 0.4);
    }

    fn spring_energy_drift(integrator: Integrator, dt: f64) -> f64 {
        let config = SimulationConfig::default()
            .with_dt(dt)
            .with_gravity_enabled(false);
        let mut model = SimulationModel::new(config).unwrap();
        let anchor = model.add_object(presets::anchor(Vec2::ZERO));
        let weight = model.add_object(
            BodyBuilder::new_dynamic()
                .position(1.0, 0.0)
                .integrator(integrator)
                .build()
                .unwrap(),
        );
        model
            .add_force_generator(Spring::new(anchor, weight, 0.0, 100.0))
            .unwrap();

        let initial = model.full_energy();
        let mut drift: f64 = 0.0;
        for _ in 0..(1.0 / dt).round() as u32 {
            model.update();
            drift = drift.max((model.full_energy() - initial).abs() / initial);
        }
        drift
    }

    #[test]
    fn test_spring_energy_is_nearly_conserved() {
        let coarse = spring_energy_drift(Integrator::Rk4, 1e-4);
        let fine = spring_energy_drift(Integrator::Rk4, 5e-5);
        assert!(coarse < 0.01, "drift {coarse}");
        assert!(fine < coarse, "drift {fine} >= {coarse}");
    }

    #[test]
    fn test_euler_drifts_more_than_rk4() {
        let euler = spring_energy_drift(Integrator::Euler, 1e-4);
        let rk4 = spring_energy_drift(Integrator::Rk4, 1e-4);
        assert!(euler > rk4, "euler {euler} <= rk4 {rk4}");
    }

    #[test]
    fn test_runs_are_deterministic() {
        let build = || {
            let mut model = SimulationModel::new(SimulationConfig::default().with_dt(DT)).unwrap();
            model.add_object(presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0)).unwrap());
            ball(&mut model, -1.0, 2.0, 1.5, 0.0);
            ball(&mut model, 1.0, 3.0, -1.0, 0.5);
            model.add_force_generator(LinearDrag::new(0.1)).unwrap();
            model
        };
        let (mut first, mut second) = (build(), build());
        first.run(2000);
        second.run(2000);

        let bits = |v: Vec2| (v.x.to_bits(), v.y.to_bits());
        for (a, b) in first.bodies().iter().zip(second.bodies()) {
            assert_eq!(bits(a.position), bits(b.position));
            assert_eq!(bits(a.velocity), bits(b.velocity));
        }
        assert_eq!(first.full_energy().to_bits(), second.full_energy().to_bits());
    }

    #[test]
    fn test_non_finite_body_is_excluded() {
        let mut model = SimulationModel::new(weightless()).unwrap();
        let healthy = ball(&mut model, 0.0, 0.0, 1.0, 0.0);
        let broken = ball(&mut model, 0.2, 0.0, 0.0, 0.0);
        model.body_mut(broken).unwrap().position = Vec2::new(f64::NAN, 0.0);

        model.update();
        assert!(model.is_excluded(broken));
        assert!(!model.is_excluded(healthy));
        assert!(model.collision_events().is_empty());
        assert_abs_diff_eq!(model.full_energy(), 0.5, epsilon = 1e-12);

        model.run(10);
        assert!(model.body(healthy).unwrap().is_valid());
    }

    #[test]
    fn test_non_finite_velocity_leads_to_exclusion() {
        let mut model = SimulationModel::new(weightless()).unwrap();
        let id = ball(&mut model, 0.0, 0.0, f64::INFINITY, 0.0);
        model.update();
        assert!(!model.is_excluded(id));
        model.update();
        assert!(model.is_excluded(id));
    }

    #[test]
    fn test_unknown_body_references_are_rejected() {
        let mut model = SimulationModel::new(weightless()).unwrap();
        let id = ball(&mut model, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(model.add_trail(BodyId(3), 1, 0), Err(PhysicsError::UnknownBody(3)));
        assert_eq!(
            model.add_force_generator(Spring::new(id, BodyId(7), 1.0, 1.0)),
            Err(PhysicsError::UnknownBody(7))
        );
    }

    #[test]
    fn test_render_frame_draws_bodies_vectors_and_trails() {
        let mut model = SimulationModel::new(weightless()).unwrap();
        model.add_object(presets::line(Vec2::new(-5.0, -2.0), Vec2::new(10.0, 0.0)).unwrap());
        let id = ball(&mut model, 0.0, 0.0, 1.0, 0.0);
        model.add_object(presets::anchor(Vec2::new(3.0, 3.0)));
        model.add_trail(id, 10, 0).unwrap();
        model.set_render_velocities(true);
        model.run(30);

        let mut renderer = DebugRenderer::new();
        model.render_frame(&mut renderer);

        assert_eq!(renderer.polygons().count(), 2);
        let vectors: Vec<_> = renderer.vectors().collect();
        assert_eq!(vectors.len(), 1);
        assert_abs_diff_eq!(vectors[0].1.x, 1.0, epsilon = 1e-12);
        let circles = renderer
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Circle { .. }))
            .count();
        assert_eq!(circles, 1);
        let lines = renderer
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 2);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn test_dynamic_body_uses_configured_integrator() {
        let model =
            SimulationModel::new(weightless().with_integrator(Integrator::Ssprk3)).unwrap();
        let body = model.dynamic_body().build().unwrap();
        assert_eq!(
            body.dynamic_state().map(|state| state.integrator),
            Some(Integrator::Ssprk3)
        );
    }

    #[test]
    fn test_geometry_follows_committed_pose() {
        let config = SimulationConfig::default().with_dt(DT);
        let mut model = SimulationModel::new(config).unwrap();
        model.add_object(presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0)).unwrap());
        let resting = ball(&mut model, 0.0, 0.55, 0.0, 0.0);
        let lone = ball(&mut model, 40.0, 5.0, 0.0, 0.0);
        model.run(500);

        for id in [lone, resting] {
            let body = model.body(id).unwrap();
            let rigidbody = body.rigidbody().unwrap();
            let committed = rigidbody.points_at(body.position, body.angle);
            assert_eq!(rigidbody.points().len(), committed.len());
            for (cached, expected) in rigidbody.points().iter().zip(&committed) {
                assert_abs_diff_eq!(cached.x, expected.x, epsilon = 1e-12);
                assert_abs_diff_eq!(cached.y, expected.y, epsilon = 1e-12);
            }
        }
        assert!(model.body(lone).unwrap().position.y < 5.0);
    }

    fn pendulum_model(dt: f64, damping: f64) -> (SimulationModel, BodyId) {
        let config = SimulationConfig::default().with_dt(dt);
        let mut model = SimulationModel::new(config).unwrap();
        let pendulum =
            presets::pendulum(Vec2::ZERO, 1.0, -FRAC_PI_2 + 0.1, 1.0, damping).unwrap();
        let id = model.add_object(pendulum);
        (model, id)
    }

    fn pendulum_energy_drift(dt: f64) -> f64 {
        let (mut model, _) = pendulum_model(dt, 0.0);
        let initial = model.full_energy();
        let mut drift: f64 = 0.0;
        for _ in 0..(2.0 / dt).round() as u32 {
            model.update();
            drift = drift.max((model.full_energy() - initial).abs());
        }
        drift
    }

    #[test]
    fn test_pendulum_energy_drift_shrinks_with_step() {
        let coarse = pendulum_energy_drift(1e-3);
        let fine = pendulum_energy_drift(5e-4);
        assert!(coarse < 5e-3, "drift {coarse}");
        assert!(fine < coarse, "drift {fine} >= {coarse}");
    }

    fn late_amplitude(damping: f64) -> f64 {
        let (mut model, id) = pendulum_model(DT, damping);
        model.run(4000);
        let mut amplitude: f64 = 0.0;
        for _ in 0..1000 {
            model.update();
            let body = model.body(id).unwrap();
            assert_eq!(body.position, Vec2::ZERO);
            amplitude = amplitude.max((body.angle + FRAC_PI_2).abs());
        }
        amplitude
    }

    #[test]
    fn test_pendulum_damping_decays_amplitude() {
        assert!(late_amplitude(0.0) > 0.09);
        assert!(late_amplitude(0.5) < 0.03);
    }

    #[test]
    fn test_springs_couple_pendulums() {
        let mut model = SimulationModel::new(SimulationConfig::default().with_dt(DT)).unwrap();
        let left = model
            .add_object(presets::pendulum(Vec2::new(-1.0, 0.0), 1.0, -FRAC_PI_2 + 0.2, 1.0, 0.0).unwrap());
        let right = model
            .add_object(presets::pendulum(Vec2::new(1.0, 0.0), 1.0, -FRAC_PI_2, 1.0, 0.0).unwrap());
        let arm_end = Vec2::new(1.0, 0.0);
        model
            .add_force_generator(Spring::new(left, right, 2.0, 5.0).with_anchors(arm_end, arm_end))
            .unwrap();

        model.run(500);
        let right = model.body(right).unwrap();
        assert!((right.angle + FRAC_PI_2).abs() > 1e-3);
        assert_eq!(right.position, Vec2::new(1.0, 0.0));
    }
}
