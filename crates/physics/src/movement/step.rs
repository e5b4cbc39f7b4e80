//! Stepping up onto small obstacles.
//!
//! When the body is about to run into something low, the step resolver
//! traces forward, then up, then across, then down. If that lands on
//! standable ground the body is teleported on top of the obstacle before
//! the physics step, and the same position is forced back afterwards so
//! the integrator's own response to the obstacle is discarded.

use glam::Vec3;

use crate::body::BodyIntegrator;
use crate::collision::{ContentFlags, TraceProvider, TraceResult};

use super::math::is_nearly_zero;
use super::state::{BodyDims, MotionState};

/// Distance kept between the body and the obstacle, and above the new ground.
pub const STEP_SKIN: f32 = 0.095;

/// Minimum free space above the obstacle for a step to be worth taking.
pub const MIN_STEP_CLEARANCE: f32 = 2.0;

/// Horizontal speed kept after a step.
pub const STEP_SPEED_SCALE: f32 = 0.9;

/// Cross-section scales tried when the forward sweep starts embedded.
pub const STEP_PROBE_SCALES: [f32; 5] = [1.0, 0.9, 0.8, 0.7, 0.6];

/// Find where a step over an obstacle in the way of `velocity` would land.
///
/// # Arguments
///
/// * `world` - Trace provider
/// * `position` - Feet position of the body
/// * `velocity` - Body velocity; only its horizontal part is used
/// * `dims` - Current body dimensions
/// * `max_height` - Tallest obstacle that can be stepped onto
/// * `delta_time` - Length of the coming physics step
/// * `standable` - Whether the top of the obstacle can be stood on
///
/// Returns the new feet position, or `None` if no step applies. A landing
/// that would not raise the feet is not a step.
pub fn find_step(
    world: &dyn TraceProvider,
    position: Vec3,
    velocity: Vec3,
    dims: BodyDims,
    max_height: f32,
    delta_time: f32,
    standable: &dyn Fn(&TraceResult) -> bool,
) -> Option<Vec3> {
    let movement = velocity.truncate().extend(0.0) * delta_time;
    let direction = movement.normalize_or_zero();
    let from = position - direction * STEP_SKIN;
    let to = position + movement;
    let mask = ContentFlags::MASK_PLAYER_SOLID;

    // Find the obstruction
    let (scale, forward) = STEP_PROBE_SCALES.iter().find_map(|&scale| {
        let trace = world.sweep(dims.body_box(scale, 1.0), from, to, mask);
        (!trace.started_solid).then_some((scale, trace))
    })?;

    if !forward.hit_something() {
        return None;
    }

    let remaining = movement.length() - forward.distance;
    if remaining <= 0.0 {
        return None;
    }

    let shape = dims.body_box(scale, 1.0);

    let obstruction = forward.end_position;
    let up = world.sweep(shape, obstruction, obstruction + Vec3::Z * max_height, mask);
    if up.started_solid || up.distance < MIN_STEP_CLEARANCE {
        log::trace!("step blocked above {obstruction:?}");
        return None;
    }

    let raised = up.end_position;
    let across = world.sweep(shape, raised, raised + direction * remaining, mask);
    if across.started_solid {
        return None;
    }

    let over = across.end_position;
    let down = world.sweep(shape, over, over - Vec3::Z * max_height, mask);
    if !down.hit_something() || down.started_solid || !standable(&down) {
        log::trace!("no footing beyond {obstruction:?}");
        return None;
    }
    if down.end_position.z <= position.z + STEP_SKIN {
        log::trace!("footing beyond {obstruction:?} is no higher than the feet");
        return None;
    }

    Some(down.end_position + Vec3::Z * STEP_SKIN)
}

/// Step the body up onto a low obstacle ahead of it.
///
/// Clears the previous step record first. Does nothing while grounding is
/// suppressed or while the body isn't moving horizontally. On success the
/// body is moved, its vertical speed dropped and horizontal speed scaled
/// down, and the position is recorded for [`restore_step`].
#[allow(clippy::too_many_arguments)]
pub fn try_step(
    body: &mut dyn BodyIntegrator,
    state: &mut MotionState,
    world: &dyn TraceProvider,
    dims: BodyDims,
    max_height: f32,
    delta_time: f32,
    standable: &dyn Fn(&TraceResult) -> bool,
) -> bool {
    state.step = None;

    let velocity = body.velocity();
    let horizontal = velocity.truncate().extend(0.0);
    if is_nearly_zero(horizontal, 1e-4) || state.ground.is_suppressed() {
        return false;
    }

    let Some(landing) = find_step(
        world,
        body.position(),
        velocity,
        dims,
        max_height,
        delta_time,
        standable,
    ) else {
        return false;
    };

    log::trace!("stepped from {:?} to {landing:?}", body.position());
    body.set_position(landing);
    body.set_velocity(horizontal * STEP_SPEED_SCALE);
    state.step = Some(landing);
    true
}

/// Put the body back where the last step placed it, once.
pub fn restore_step(body: &mut dyn BodyIntegrator, state: &mut MotionState) -> bool {
    match state.step.take() {
        Some(position) => {
            body.set_position(position);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::SimBody;
    use crate::collision::CollisionWorld;

    const DT: f32 = 1.0 / 60.0;

    fn dims() -> BodyDims {
        BodyDims {
            radius: 16.0,
            height: 72.0,
        }
    }

    fn flat(trace: &TraceResult) -> bool {
        trace.normal_or_up().z > 0.7
    }

    /// Floor with its top at z=0 and a 10-unit step whose face is at x=10.
    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::new(1000.0, 1000.0, 8.0),
            ContentFlags::SOLID,
        );
        world.add_box(
            Vec3::new(110.0, 0.0, 5.0),
            Vec3::new(100.0, 100.0, 5.0),
            ContentFlags::SOLID,
        );
        world
    }

    #[test]
    fn test_no_obstruction_is_a_no_op() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::new(-200.0, 0.0, 0.0));
        body.set_velocity(Vec3::new(110.0, 0.0, 0.0));
        let mut state = MotionState::default();

        let stepped = try_step(&mut body, &mut state, &world, dims(), 18.0, DT, &flat);

        assert!(!stepped);
        assert!(state.step.is_none());
        assert_eq!(body.position(), Vec3::new(-200.0, 0.0, 0.0));
        assert_eq!(body.velocity(), Vec3::new(110.0, 0.0, 0.0));
    }

    #[test]
    fn test_steps_onto_ten_unit_ledge_and_restores() {
        let world = create_test_world();
        // Front of the feet box half a unit from the step face
        let start = Vec3::new(1.5, 0.0, 0.0);
        let mut body = SimBody::new(start);
        body.set_velocity(Vec3::new(110.0, 0.0, -5.0));
        let mut state = MotionState::default();

        let stepped = try_step(&mut body, &mut state, &world, dims(), 18.0, DT, &flat);
        assert!(stepped, "should step onto the ledge");

        let landing = state.step.expect("step recorded");
        assert!((landing.z - (10.0 + STEP_SKIN)).abs() < 0.05, "landing {landing:?}");
        assert!(landing.x > start.x);
        assert_eq!(body.position(), landing);
        assert!((body.velocity() - Vec3::new(99.0, 0.0, 0.0)).length() < 1e-3);

        body.integrate(&world, DT);
        assert!(restore_step(&mut body, &mut state));
        assert_eq!(body.position(), landing);

        // A second restore has nothing to do
        assert!(!restore_step(&mut body, &mut state));
    }

    #[test]
    fn test_too_tall_obstacle_does_not_lift_body() {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::new(1000.0, 1000.0, 8.0),
            ContentFlags::SOLID,
        );
        world.add_box(
            Vec3::new(110.0, 0.0, 20.0),
            Vec3::new(100.0, 100.0, 20.0),
            ContentFlags::SOLID,
        );

        let mut body = SimBody::new(Vec3::new(1.5, 0.0, 0.0));
        body.set_velocity(Vec3::new(110.0, 0.0, 0.0));
        let mut state = MotionState::default();

        // Still blocked at step height, the down sweep comes back to the floor
        let stepped = try_step(&mut body, &mut state, &world, dims(), 18.0, DT, &flat);
        assert!(!stepped);
        assert!(state.step.is_none());
        assert_eq!(body.position(), Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(body.velocity(), Vec3::new(110.0, 0.0, 0.0));
    }

    #[test]
    fn test_unstandable_top_is_not_stepped() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::new(1.5, 0.0, 0.0));
        body.set_velocity(Vec3::new(110.0, 0.0, 0.0));
        let mut state = MotionState::default();

        assert!(!try_step(&mut body, &mut state, &world, dims(), 18.0, DT, &|_| false));
        assert!(state.step.is_none());
    }

    #[test]
    fn test_suppressed_grounding_blocks_steps() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::new(1.5, 0.0, 0.0));
        body.set_velocity(Vec3::new(110.0, 0.0, 0.0));
        let mut state = MotionState::default();
        state.ground.prevent(0.2);

        assert!(!try_step(&mut body, &mut state, &world, dims(), 18.0, DT, &flat));
    }
}
