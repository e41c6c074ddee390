use super::body::Body;
use crate::core::geometry::Edge;
use crate::core::math::{Vec2, VecExt};
use crate::engine::config::SimulationConfig;

/// Resolved force magnitudes below this count as a stuck (resting or
/// grazing) contact
const DEADLOCK_EPSILON: f64 = 1e-15;

/// One crossing between an edge of each shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Edge of the shape that ran the query
    pub edge: Edge,
    /// Edge of the other shape
    pub other_edge: Edge,
    pub point: Vec2,
}

/// Which response was used for a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// A movable body bounced off an immovable one
    WithImmovable,
    /// Two movable bodies exchanged momentum
    BetweenMovables,
    /// Both response forces vanished and the normals had to be nudged
    BetweenMovablesNudged,
}

/// Record of a collision resolved during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub first: usize,
    pub second: usize,
    pub kind: CollisionKind,
    /// Averaged contact point
    pub point: Vec2,
    /// Aggregated outward normal of `first`'s shape
    pub first_normal: Vec2,
    /// Aggregated outward normal of `second`'s shape
    pub second_normal: Vec2,
    pub contacts: usize,
}

/// Detect and respond to a collision between two bodies.
///
/// Both shapes are tested at their future pose. Returns `None` when the pair
/// cannot collide (both immovable, invalid, shapeless) or does not touch.
pub(crate) fn resolve_pair(
    (first_index, first): (usize, &mut Body),
    (second_index, second): (usize, &mut Body),
    config: &SimulationConfig,
) -> Option<CollisionEvent> {
    if first.is_immovable() && second.is_immovable() {
        return None;
    }
    if !first.is_valid() || !second.is_valid() {
        return None;
    }

    first.refresh_geometry(config.dt);
    second.refresh_geometry(config.dt);

    let (first_shape, second_shape) = (first.rigidbody()?, second.rigidbody()?);
    let contacts = first_shape.intersections(second_shape);
    if contacts.is_empty() {
        return None;
    }

    let mut first_normal = Vec2::ZERO;
    let mut second_normal = Vec2::ZERO;
    let mut point = Vec2::ZERO;
    for contact in &contacts {
        first_normal += contact.edge.normal();
        second_normal += contact.other_edge.normal();
        point += contact.point;
    }
    if first_normal.length() == 0.0 {
        first_normal = second_shape.center() - first_shape.center();
    }
    if second_normal.length() == 0.0 {
        second_normal = first_shape.center() - second_shape.center();
    }
    let first_normal = first_normal.normalize_or_zero();
    let second_normal = second_normal.normalize_or_zero();
    let point = point / contacts.len() as f64;

    let kind = if second.is_immovable() {
        solve_with_immovable(first, second_normal, point, config)
    } else if first.is_immovable() {
        solve_with_immovable(second, first_normal, point, config)
    } else {
        solve_between_movables(first, second, first_normal, second_normal, point, config)
    };

    log::debug!(
        "Collision {:?} between {} and {} at {:?} ({} contacts)",
        kind,
        first_index,
        second_index,
        point,
        contacts.len()
    );

    Some(CollisionEvent {
        first: first_index,
        second: second_index,
        kind,
        point,
        first_normal,
        second_normal,
        contacts: contacts.len(),
    })
}

/// Cancel the approach velocity along the wall's normal, then push back with
/// the reflected speed. Gravity applied later in the same tick is
/// compensated for here.
fn solve_with_immovable(
    moving: &mut Body,
    normal: Vec2,
    point: Vec2,
    config: &SimulationConfig,
) -> CollisionKind {
    let dt = config.dt;
    let velocity = moving.velocity;

    moving.apply_stop_velocity_force(normal, dt);

    let mut speed = (-velocity).dot(normal);
    if moving.affected_by_gravity && config.use_gravity {
        speed += normal.cosine_between(Vec2::NEG_Y) * (-config.gravity) * dt;
    }

    moving.apply_force(normal * (speed * moving.mass / dt), Some(point));
    CollisionKind::WithImmovable
}

/// Elastic exchange along the contact normals. Each body's normal velocity
/// is first stopped along the other body's normal, then replaced by the
/// two-body elastic result.
fn solve_between_movables(
    first: &mut Body,
    second: &mut Body,
    first_normal: Vec2,
    second_normal: Vec2,
    point: Vec2,
    config: &SimulationConfig,
) -> CollisionKind {
    let dt = config.dt;
    let (v1, v2) = (first.velocity, second.velocity);
    let (m1, m2) = (first.mass, second.mass);

    let mut n1 = first_normal;
    let mut n2 = second_normal;
    let mut kind = CollisionKind::BetweenMovables;

    first.apply_stop_velocity_force(n2, dt);
    second.apply_stop_velocity_force(n1, dt);
    let (mut force1, mut force2) = elastic_normal_speeds(v1, v2, m1, m2, n1, n2);

    // Resting or grazing contact: bend the normals toward the incoming
    // velocities and try once more
    if force1.abs() < DEADLOCK_EPSILON && force2.abs() < DEADLOCK_EPSILON {
        n1 = (n1 + v2.normalize_or_zero()).normalize_or_zero();
        n2 = (n2 + v1.normalize_or_zero()).normalize_or_zero();

        first.apply_stop_velocity_force(n2, dt);
        second.apply_stop_velocity_force(n1, dt);
        let (retry1, retry2) = elastic_normal_speeds(v1, v2, m1, m2, n1, n2);
        force1 += retry1;
        force2 += retry2;
        kind = CollisionKind::BetweenMovablesNudged;
    }

    first.apply_force(n2 * (force1 * m1 / dt), Some(point));
    second.apply_force(n1 * (force2 * m2 / dt), Some(point));
    kind
}

/// Post-collision velocity components: `u1` along `n2`, `u2` along `n1`
fn elastic_normal_speeds(v1: Vec2, v2: Vec2, m1: f64, m2: f64, n1: Vec2, n2: Vec2) -> (f64, f64) {
    let total = m1 + m2;
    let u1 = v1 - n2 * ((v1 - v2).dot(n2) * 2.0 * m2 / total);
    let u2 = v2 - n1 * ((v2 - v1).dot(n1) * 2.0 * m1 / total);
    (u1.dot(n2), u2.dot(n1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::{presets, BodyBuilder};
    use crate::engine::physics::regular_polygon;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn config() -> SimulationConfig {
        SimulationConfig::default().with_dt(1e-3).with_gravity_enabled(false)
    }

    fn square(x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Body {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .velocity(vx, vy)
            .mass(mass)
            .shape(regular_polygon(FRAC_1_SQRT_2, 4))
            .build()
            .unwrap()
    }

    #[test]
    fn test_elastic_normal_speeds_equal_masses_swap() {
        let (u1, u2) = elastic_normal_speeds(
            Vec2::new(2.0, 0.0),
            Vec2::new(-2.0, 0.0),
            1.0,
            1.0,
            Vec2::X,
            -Vec2::X,
        );
        // u1 = (-2, 0) projected on -x, u2 = (2, 0) projected on +x
        assert_abs_diff_eq!(u1, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u2, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_separated_bodies_do_not_collide() {
        let mut a = square(0.0, 0.0, 1.0, 0.0, 1.0);
        let mut b = square(3.0, 0.0, -1.0, 0.0, 1.0);
        assert!(resolve_pair((1, &mut a), (0, &mut b), &config()).is_none());
    }

    #[test]
    fn test_two_static_bodies_are_skipped() {
        let mut a = presets::line(Vec2::ZERO, Vec2::new(5.0, 0.0)).unwrap();
        let mut b = presets::line(Vec2::new(1.0, 0.5), Vec2::new(0.0, -5.0)).unwrap();
        assert!(resolve_pair((1, &mut a), (0, &mut b), &config()).is_none());
    }

    #[test]
    fn test_shapeless_bodies_are_skipped() {
        let mut a = presets::anchor(Vec2::ZERO);
        let mut b = square(0.0, 0.0, 0.0, 0.0, 1.0);
        assert!(resolve_pair((1, &mut b), (0, &mut a), &config()).is_none());
    }

    #[test]
    fn test_invalid_body_is_skipped() {
        let mut a = square(0.0, 0.0, 0.0, 0.0, 1.0);
        let mut b = square(0.5, 0.0, 0.0, 0.0, 1.0);
        b.position = Vec2::new(f64::NAN, 0.0);
        assert!(resolve_pair((1, &mut a), (0, &mut b), &config()).is_none());
    }

    /// 12-gon ball of radius 0.5; its flat sides sit at x = +-0.48296
    fn ball(x: f64, vx: f64, mass: f64) -> Body {
        let mut body = presets::circle(0.5, Vec2::new(x, 0.0), mass).unwrap();
        body.velocity = Vec2::new(vx, 0.0);
        body
    }

    #[test]
    fn test_head_on_balls_exchange_velocities() {
        let config = config();
        // ~0.003 overlap at the future pose
        let mut a = ball(-0.4835, 2.0, 1.0);
        let mut b = ball(0.4835, -2.0, 1.0);
        let momentum_before = a.velocity * a.mass + b.velocity * b.mass;

        let event = resolve_pair((1, &mut a), (0, &mut b), &config).expect("balls overlap");
        assert_eq!(event.kind, CollisionKind::BetweenMovables);
        assert_abs_diff_eq!(event.first_normal.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(event.second_normal.x, -1.0, epsilon = 1e-12);

        a.update(config.dt);
        b.update(config.dt);
        assert_abs_diff_eq!(a.velocity.x, -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.velocity.x, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.velocity.y, 0.0, epsilon = 1e-9);

        let momentum_after = a.velocity * a.mass + b.velocity * b.mass;
        assert_abs_diff_eq!(momentum_before.x, momentum_after.x, epsilon = 1e-9);
        assert_abs_diff_eq!(momentum_before.y, momentum_after.y, epsilon = 1e-9);
    }

    #[test]
    fn test_unequal_masses_conserve_momentum_and_energy() {
        let config = config();
        let mut a = ball(-0.4835, 3.0, 3.0);
        let mut b = ball(0.4835, -1.0, 1.0);
        let momentum_before = a.velocity * a.mass + b.velocity * b.mass;
        let energy_before = a.kinetic_energy() + b.kinetic_energy();

        resolve_pair((1, &mut a), (0, &mut b), &config).expect("balls overlap");
        a.update(config.dt);
        b.update(config.dt);

        let momentum_after = a.velocity * a.mass + b.velocity * b.mass;
        assert_abs_diff_eq!(momentum_before.x, momentum_after.x, epsilon = 1e-9);
        assert_abs_diff_eq!(
            energy_before,
            a.kinetic_energy() + b.kinetic_energy(),
            epsilon = 1e-9
        );
        // 1D elastic result: v1' = 1, v2' = 5
        assert_abs_diff_eq!(a.velocity.x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.velocity.x, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounce_off_immovable_without_gravity() {
        let config = config();
        let mut floor = presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0)).unwrap();
        let mut ball = square(0.3, 0.5, 1.0, -3.0, 1.0);

        let event = resolve_pair((1, &mut ball), (0, &mut floor), &config).expect("touching floor");
        assert_eq!(event.kind, CollisionKind::WithImmovable);
        assert_abs_diff_eq!(event.second_normal.y, 1.0, epsilon = 1e-12);

        ball.update(config.dt);
        assert_abs_diff_eq!(ball.velocity.y, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ball.velocity.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_immovable_listed_first_is_handled() {
        let config = config();
        let mut floor = presets::line(Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0)).unwrap();
        let mut ball = square(0.0, 0.5, 0.0, -3.0, 1.0);

        resolve_pair((1, &mut floor), (0, &mut ball), &config).expect("touching floor");
        ball.update(config.dt);
        assert_abs_diff_eq!(ball.velocity.y, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_resting_contact_takes_nudge_path_without_nan() {
        // Known-approximate case: overlapping bodies at rest. The nudged
        // retry must stay finite; no energy claim is made.
        let config = config();
        let mut a = ball(-0.482, 0.0, 1.0);
        let mut b = ball(0.482, 0.0, 1.0);

        let event = resolve_pair((1, &mut a), (0, &mut b), &config).expect("overlapping");
        assert_eq!(event.kind, CollisionKind::BetweenMovablesNudged);

        a.update(config.dt);
        b.update(config.dt);
        assert!(a.velocity.is_finite() && b.velocity.is_finite());
        assert!(a.position.is_finite() && b.position.is_finite());
    }
}
