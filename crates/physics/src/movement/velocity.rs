//! Velocity shaping and body configuration.

use glam::Vec3;

use crate::body::BodyProperties;

use super::config::ControllerConfig;
use super::math::{add_clamped, clamp_length};
use super::state::MotionState;

/// Base ground acceleration factor, before friction.
pub const GROUND_ACCELERATION: f32 = 0.25;

/// Ground acceleration added per unit of surface friction.
pub const FRICTION_ACCELERATION: f32 = 10.0;

/// Fraction of the wish velocity added per tick while airborne.
pub const AIR_ACCELERATION: f32 = 0.05;

/// Wish speeds below this count as "trying to stop" for feet friction.
const STOP_WISH_SPEED: f32 = 5.0;

/// Steer the body velocity towards `wish` relative to the ground.
///
/// The added part is capped along the wish direction, and the resulting
/// ground-relative speed never exceeds the larger of the wish speed and the
/// speed the body already had. A zero wish leaves the velocity untouched.
///
/// # Arguments
///
/// * `body_velocity` - Current world velocity of the body
/// * `ground_velocity` - Velocity of the support (zero in the air)
/// * `wish` - Desired ground-relative velocity
/// * `grounded` - Whether the body stands on something
/// * `friction` - Friction of the support
pub fn shape_velocity(
    body_velocity: Vec3,
    ground_velocity: Vec3,
    wish: Vec3,
    grounded: bool,
    friction: f32,
) -> Vec3 {
    if wish.length_squared() <= f32::EPSILON {
        return body_velocity;
    }

    let relative = body_velocity - ground_velocity;
    let wish_speed = wish.length();
    let max_speed = wish_speed.max(relative.length());

    let shaped = if grounded {
        let accel = GROUND_ACCELERATION + FRICTION_ACCELERATION * friction;
        add_clamped(relative, wish * accel, wish_speed * accel)
    } else {
        add_clamped(relative, wish * AIR_ACCELERATION, wish_speed)
    };

    let mut velocity = clamp_length(shaped, max_speed) + ground_velocity;
    if grounded {
        velocity.z = body_velocity.z;
    }
    velocity
}

/// Apply a jump impulse to `body_velocity`.
///
/// Motion against the jump is cancelled first, then the jump is added without
/// pushing the speed along it past the jump's own length.
pub fn jump_velocity(body_velocity: Vec3, jump: Vec3) -> Vec3 {
    let speed = jump.length();
    if speed <= f32::EPSILON {
        return body_velocity;
    }

    let dir = jump / speed;
    let along = body_velocity.dot(dir);
    let velocity = if along < 0.0 {
        body_velocity - dir * along
    } else {
        body_velocity
    };

    add_clamped(velocity, jump, speed)
}

/// Body properties every mode shares: size, mass, mass center and feet friction.
pub fn base_body_properties(
    state: &MotionState,
    config: &ControllerConfig,
    current: &BodyProperties,
) -> BodyProperties {
    let dims = state.body_dims(config);
    let wish_speed = state.wish_velocity().length();
    let grounded = state.is_grounded();

    let braking = wish_speed < STOP_WISH_SPEED || wish_speed < state.velocity.length() * 0.9;
    let feet_friction = if grounded && braking {
        1.0 + 100.0 * config.brake_power * state.ground.friction()
    } else {
        0.0
    };

    let half_height = dims.height * 0.5;
    let mass_center_height = if grounded {
        wish_speed.clamp(0.0, half_height)
    } else {
        half_height
    };

    BodyProperties {
        mass: config.body.mass,
        radius: dims.radius,
        height: dims.height,
        feet_friction,
        mass_center_height,
        ..*current
    }
}

/// Gravity and damping for modes that walk and fall.
///
/// Gravity switches off only while resting still on static ground, and the
/// body brakes hard when standing without input.
pub fn apply_default_policy(props: &mut BodyProperties, state: &MotionState, config: &ControllerConfig) {
    let grounded = state.is_grounded();
    let ground_speed = state.ground.velocity.length();

    props.gravity = !grounded
        || state.velocity.length() > 1.0
        || ground_speed > 1.0
        || state.ground.is_dynamic();

    props.linear_damping = if grounded && state.wish_velocity().length() < 1.0 && ground_speed < 1.0 {
        10.0 * config.brake_power
    } else {
        config.air_friction
    };
    props.angular_damping = 1.0;
}
