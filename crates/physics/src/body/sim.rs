//! Reference rigid body integrator.
//!
//! Integrates gravity, damping and feet friction, then resolves collisions
//! with a slide move against the collision world. The body collides as a
//! [`BodyShape`]: a feet box under an upper-body capsule.

use glam::Vec3;

use crate::collision::{CollisionWorld, ContentFlags, TouchingVolume, TraceProvider};

use super::shape::BodyShape;
use super::slide::slide_move;
use super::{BodyIntegrator, BodyProperties};

/// Gravity applied to bodies that have it enabled (units/second²).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, 0.0, -800.0);

/// Deceleration per unit of feet friction (units/second²).
const FRICTION_DECELERATION: f32 = 50.0;

/// Below this speed a body starts counting towards sleep.
const SLEEP_SPEED: f32 = 1.0;

/// Seconds spent below [`SLEEP_SPEED`] before the body sleeps.
const SLEEP_DELAY: f32 = 0.5;

/// How far below the feet the friction probe looks for a support.
const SUPPORT_PROBE: f32 = 2.0;

/// Depenetration passes before giving up for this step.
const DEPENETRATION_PASSES: usize = 4;

#[derive(Debug, Clone)]
pub struct SimBody {
    position: Vec3,
    velocity: Vec3,
    properties: BodyProperties,
    gravity: Vec3,
    mask: ContentFlags,
    sleeping: bool,
    rest_time: f32,
    touching: Vec<TouchingVolume>,
}

impl SimBody {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            properties: BodyProperties::default(),
            gravity: DEFAULT_GRAVITY,
            mask: ContentFlags::MASK_PLAYER_SOLID,
            sleeping: false,
            rest_time: 0.0,
            touching: Vec::new(),
        }
    }

    /// Use a different gravity vector.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Colliders for the current dimensions.
    pub fn shape(&self) -> BodyShape {
        BodyShape::new(self.properties.radius, self.properties.height)
    }

    /// Advance the body by one physics step.
    ///
    /// # Arguments
    ///
    /// * `world` - Collision world to move through
    /// * `delta_time` - Time step in seconds
    pub fn integrate(&mut self, world: &CollisionWorld, delta_time: f32) {
        let shape = self.shape();

        if self.sleeping {
            shape.touching_volumes(world, self.position, &mut self.touching);
            return;
        }

        self.depenetrate(world, &shape);

        let props = self.properties;
        if props.gravity {
            self.velocity += self.gravity * delta_time;
        }

        self.velocity *= 1.0 / (1.0 + props.linear_damping.max(0.0) * delta_time);

        if props.feet_friction > 0.0 {
            self.apply_feet_friction(world, &shape, delta_time);
        }

        slide_move(
            world,
            &mut self.position,
            &mut self.velocity,
            &shape,
            self.mask,
            delta_time,
        );

        if self.velocity.length() < SLEEP_SPEED {
            self.rest_time += delta_time;
            if self.rest_time >= SLEEP_DELAY {
                self.sleeping = true;
                self.velocity = Vec3::ZERO;
            }
        } else {
            self.rest_time = 0.0;
        }

        shape.touching_volumes(world, self.position, &mut self.touching);
    }

    fn depenetrate(&mut self, world: &CollisionWorld, shape: &BodyShape) {
        for _ in 0..DEPENETRATION_PASSES {
            if !shape.is_embedded(world, self.position, self.mask) {
                return;
            }
            self.position = shape.push_out(world, self.position, self.mask);
        }
    }

    /// Drag horizontal velocity towards the velocity of the supporting surface.
    fn apply_feet_friction(&mut self, world: &CollisionWorld, shape: &BodyShape, delta_time: f32) {
        let probe = world.sweep(
            shape.feet,
            self.position,
            self.position - Vec3::Z * SUPPORT_PROBE,
            self.mask,
        );
        if !probe.hit_something() || probe.started_solid {
            return;
        }

        let surface_velocity = probe
            .object
            .and_then(|id| world.surface_motion(id, self.position))
            .map(|m| m.velocity)
            .unwrap_or(Vec3::ZERO);

        let relative = (self.velocity - surface_velocity).truncate().extend(0.0);
        let speed = relative.length();
        if speed <= f32::EPSILON {
            return;
        }

        let drop = self.properties.feet_friction * FRICTION_DECELERATION * delta_time;
        let new_speed = (speed - drop).max(0.0);
        let horizontal = surface_velocity.truncate().extend(0.0) + relative * (new_speed / speed);
        self.velocity = horizontal.truncate().extend(self.velocity.z);
    }
}

impl BodyIntegrator for SimBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        if position.distance_squared(self.position) > 1e-8 {
            self.wake();
        }
        self.position = position;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if velocity.distance_squared(self.velocity) > 1e-6 {
            self.wake();
        }
        self.velocity = velocity;
    }

    fn properties(&self) -> &BodyProperties {
        &self.properties
    }

    fn set_properties(&mut self, properties: BodyProperties) {
        if properties.gravity != self.properties.gravity
            || properties.linear_damping != self.properties.linear_damping
        {
            self.wake();
        }
        self.properties = properties;
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn wake(&mut self) {
        self.sleeping = false;
        self.rest_time = 0.0;
    }

    fn touching_volumes(&self) -> &[TouchingVolume] {
        &self.touching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::BrushMotion;
    use glam::Quat;

    const DT: f32 = 1.0 / 60.0;

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        // Floor with its top at z=0
        world.add_box(
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::new(1000.0, 1000.0, 8.0),
            ContentFlags::SOLID,
        );
        world
    }

    #[test]
    fn test_falls_and_lands() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::new(0.0, 0.0, 50.0));

        for _ in 0..120 {
            body.integrate(&world, DT);
        }

        assert!(body.position().z.abs() < 0.05, "landed at {:?}", body.position());
        assert!(body.velocity().z.abs() < 1.0);
    }

    #[test]
    fn test_no_gravity_floats() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::new(0.0, 0.0, 50.0));
        body.set_properties(BodyProperties {
            gravity: false,
            ..BodyProperties::default()
        });

        body.integrate(&world, DT);
        assert_eq!(body.position(), Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn test_damping_slows_body() {
        let world = CollisionWorld::new();
        let mut body = SimBody::new(Vec3::ZERO);
        body.set_properties(BodyProperties {
            gravity: false,
            linear_damping: 10.0,
            ..BodyProperties::default()
        });
        body.set_velocity(Vec3::new(100.0, 0.0, 0.0));

        body.integrate(&world, 0.1);
        assert!((body.velocity().x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_feet_friction_stops_sliding() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::ZERO);
        body.set_properties(BodyProperties {
            feet_friction: 81.0,
            ..BodyProperties::default()
        });
        body.set_velocity(Vec3::new(300.0, 0.0, 0.0));

        for _ in 0..10 {
            body.integrate(&world, DT);
        }
        assert!(body.velocity().x.abs() < 1.0, "velocity {:?}", body.velocity());
    }

    #[test]
    fn test_feet_friction_matches_platform_velocity() {
        let mut world = create_test_world();
        let platform = world.add_box(
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(64.0, 64.0, 4.0),
            ContentFlags::SOLID,
        );
        world.set_motion(
            platform,
            BrushMotion::Kinematic {
                velocity: Vec3::new(40.0, 0.0, 0.0),
                yaw_rate: 0.0,
            },
        );

        let mut body = SimBody::new(Vec3::new(0.0, 0.0, 8.0));
        body.set_properties(BodyProperties {
            feet_friction: 81.0,
            ..BodyProperties::default()
        });

        for _ in 0..10 {
            world.advance(DT);
            body.integrate(&world, DT);
        }
        assert!((body.velocity().x - 40.0).abs() < 1.0, "velocity {:?}", body.velocity());
    }

    #[test]
    fn test_sleeps_at_rest_and_wakes_on_velocity() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::ZERO);
        body.set_properties(BodyProperties {
            gravity: false,
            ..BodyProperties::default()
        });

        for _ in 0..60 {
            body.integrate(&world, DT);
        }
        assert!(body.is_sleeping());

        body.set_velocity(Vec3::new(10.0, 0.0, 0.0));
        assert!(!body.is_sleeping());
    }

    #[test]
    fn test_gravity_change_wakes_sleeping_body() {
        let world = CollisionWorld::new();
        let mut body = SimBody::new(Vec3::new(0.0, 0.0, 50.0));
        let floating = BodyProperties {
            gravity: false,
            ..BodyProperties::default()
        };
        body.set_properties(floating);
        for _ in 0..60 {
            body.integrate(&world, DT);
        }
        assert!(body.is_sleeping());

        // Same properties again leave it asleep
        body.set_properties(floating);
        assert!(body.is_sleeping());

        body.set_properties(BodyProperties::default());
        assert!(!body.is_sleeping());
        body.integrate(&world, DT);
        assert!(body.position().z < 50.0, "Should fall, at {:?}", body.position());
    }

    #[test]
    fn test_pushed_out_of_rising_floor() {
        let world = create_test_world();
        let mut body = SimBody::new(Vec3::new(0.0, 0.0, -3.0));
        body.set_properties(BodyProperties {
            gravity: false,
            ..BodyProperties::default()
        });

        body.integrate(&world, DT);
        assert!(body.position().z >= 0.0, "still embedded at {:?}", body.position());
    }

    #[test]
    fn test_reports_touching_volumes() {
        let mut world = create_test_world();
        world.add_volume(
            ContentFlags::WATER,
            Vec3::new(0.0, 0.0, 30.0),
            Vec3::new(100.0, 100.0, 30.0),
            Quat::IDENTITY,
        );

        let mut body = SimBody::new(Vec3::ZERO);
        body.integrate(&world, DT);
        assert_eq!(body.touching_volumes().len(), 1);
        assert!(body.touching_volumes()[0].has_any(ContentFlags::WATER));
    }
}
