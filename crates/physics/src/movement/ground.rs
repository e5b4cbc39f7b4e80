//! Ground detection.
//!
//! Every physics tick the ground state is rebuilt from a short downward
//! sweep of the body box. Only the two time accumulators and the
//! suppression window carry over between ticks.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{ContentFlags, ObjectId, SurfaceMaterial, TraceProvider, TraceResult};

use super::state::BodyDims;

/// Grounding suppression after a mode that disallows grounding.
pub const MODE_SUPPRESSION: f32 = 0.1;

/// Grounding suppression after a jump.
pub const JUMP_SUPPRESSION: f32 = 0.2;

/// Grounding suppression after being launched by the ground.
pub const LAUNCH_SUPPRESSION: f32 = 0.3;

/// Upward ground speed that launches the body off its support.
pub const LAUNCH_SPEED: f32 = 250.0;

/// Upward ground speed at which grounding isn't even probed.
pub const NO_PROBE_SPEED: f32 = 300.0;

/// Ground probe starts this far above the feet...
pub const PROBE_UP: f32 = 4.0;

/// ...and ends this far below them.
pub const PROBE_DOWN: f32 = 2.0;

/// Height fraction of the body box used by ground probes.
pub const PROBE_HEIGHT_SCALE: f32 = 0.5;

/// Cross-section scales tried when a ground probe starts embedded.
pub const GROUND_PROBE_SCALES: [f32; 4] = [1.0, 0.9, 0.8, 0.7];

/// Gap left between the feet and the ground after regrounding.
const REGROUND_SKIN: f32 = 0.01;

/// What the body is standing on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSupport {
    pub object: ObjectId,
    pub surface: SurfaceMaterial,
    pub friction: f32,
    /// Whether the support can move.
    pub is_dynamic: bool,
    pub normal: Vec3,
}

impl GroundSupport {
    /// Build a support from a sweep that struck standable ground.
    ///
    /// Friction comes from the surface material unless the collider sets its
    /// own. Supports without collider information count as dynamic.
    pub fn from_trace(trace: &TraceResult) -> Option<Self> {
        let object = trace.object?;
        let friction = trace
            .collider
            .and_then(|c| c.friction)
            .unwrap_or(trace.surface.friction);
        let is_dynamic = trace.collider.map_or(true, |c| c.is_dynamic);

        Some(Self {
            object,
            surface: trace.surface,
            friction,
            is_dynamic,
            normal: trace.normal_or_up(),
        })
    }
}

/// Edge produced when the grounded flag flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTransition {
    None,
    Landed,
    Left,
}

/// Ground state of a character.
///
/// Grounded if and only if `support` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundState {
    pub support: Option<GroundSupport>,
    /// Velocity of the support at the feet.
    pub velocity: Vec3,
    /// Rotation rate of the support around world up (radians/second).
    pub yaw_rate: f32,
    pub time_since_grounded: f32,
    pub time_since_ungrounded: f32,
    /// Grounding is suppressed while this is positive.
    pub time_until_allowed: f32,
}

impl Default for GroundState {
    fn default() -> Self {
        Self {
            support: None,
            velocity: Vec3::ZERO,
            yaw_rate: 0.0,
            time_since_grounded: 0.0,
            time_since_ungrounded: 0.0,
            time_until_allowed: 0.0,
        }
    }
}

impl GroundState {
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.support.is_some()
    }

    /// Friction of the current support, zero in the air.
    pub fn friction(&self) -> f32 {
        self.support.map_or(0.0, |s| s.friction)
    }

    /// Whether the current support can move. True in the air.
    pub fn is_dynamic(&self) -> bool {
        self.support.map_or(true, |s| s.is_dynamic)
    }

    pub fn object(&self) -> Option<ObjectId> {
        self.support.map(|s| s.object)
    }

    #[inline]
    pub fn is_suppressed(&self) -> bool {
        self.time_until_allowed > 0.0
    }

    /// Advance the timers by `delta_time` seconds.
    pub fn advance(&mut self, delta_time: f32) {
        self.time_since_grounded += delta_time;
        self.time_since_ungrounded += delta_time;
        self.time_until_allowed = (self.time_until_allowed - delta_time).max(0.0);
    }

    /// Replace the support, resetting the matching timer.
    pub fn set_support(&mut self, support: Option<GroundSupport>) -> GroundTransition {
        let was_grounded = self.is_grounded();
        self.support = support;

        if self.is_grounded() {
            self.time_since_grounded = 0.0;
        } else {
            self.time_since_ungrounded = 0.0;
        }

        match (was_grounded, self.is_grounded()) {
            (false, true) => GroundTransition::Landed,
            (true, false) => GroundTransition::Left,
            _ => GroundTransition::None,
        }
    }

    /// Keep the body ungrounded for at least `seconds`.
    pub fn prevent(&mut self, seconds: f32) -> GroundTransition {
        self.time_until_allowed = self.time_until_allowed.max(seconds);
        self.set_support(None)
    }
}

/// Re-evaluate what the body stands on.
///
/// # Arguments
///
/// * `ground` - Ground state to update
/// * `world` - Trace provider
/// * `position` - Feet position of the body
/// * `dims` - Current body dimensions
/// * `allow_grounding` - Whether the active mode uses ground at all
/// * `standable` - The active mode's standable-surface test
pub fn categorize(
    ground: &mut GroundState,
    world: &dyn TraceProvider,
    position: Vec3,
    dims: BodyDims,
    allow_grounding: bool,
    standable: &dyn Fn(&TraceResult) -> bool,
) -> GroundTransition {
    if !allow_grounding {
        return ground.prevent(MODE_SUPPRESSION);
    }

    if ground.velocity.z > LAUNCH_SPEED {
        return ground.prevent(LAUNCH_SUPPRESSION);
    }

    if ground.is_suppressed() || ground.velocity.z > NO_PROBE_SPEED {
        return ground.set_support(None);
    }

    let from = position + Vec3::Z * PROBE_UP;
    let to = position - Vec3::Z * PROBE_DOWN;

    let found = GROUND_PROBE_SCALES.iter().find_map(|&scale| {
        let shape = dims.body_box(scale, PROBE_HEIGHT_SCALE);
        let trace = world.sweep(shape, from, to, ContentFlags::MASK_PLAYER_SOLID);
        let clean = !trace.started_solid && (!trace.hit_something() || standable(&trace));
        clean.then_some(trace)
    });

    let support = found
        .filter(|trace| trace.hit_something())
        .and_then(|trace| GroundSupport::from_trace(&trace));

    ground.set_support(support)
}

/// Refresh the ground velocity from the current support.
///
/// A support that no longer exists is dropped, which reads as leaving the
/// ground.
pub fn refresh_ground_velocity(
    ground: &mut GroundState,
    world: &dyn TraceProvider,
    position: Vec3,
    body_mass: f32,
) -> GroundTransition {
    let Some(support) = ground.support else {
        ground.velocity = Vec3::ZERO;
        ground.yaw_rate = 0.0;
        return GroundTransition::None;
    };

    match world.surface_motion(support.object, position) {
        Some(motion) => {
            ground.velocity = match motion.mass {
                Some(mass) => motion.velocity * (mass / (body_mass + mass)),
                None => motion.velocity,
            };
            ground.yaw_rate = motion.yaw_rate;
            GroundTransition::None
        }
        None => {
            log::debug!("ground object {:?} is gone", support.object);
            ground.velocity = Vec3::ZERO;
            ground.yaw_rate = 0.0;
            ground.set_support(None)
        }
    }
}

/// Find where the body should be put back down onto the ground.
///
/// Sweeps from just above the feet down by `max_distance`. Returns the new
/// feet position one skin above the hit, or `None` if nothing was found.
pub fn reground_target(
    world: &dyn TraceProvider,
    position: Vec3,
    dims: BodyDims,
    max_distance: f32,
) -> Option<Vec3> {
    let from = position + Vec3::Z;
    let to = position - Vec3::Z * max_distance;

    let trace = GROUND_PROBE_SCALES.iter().find_map(|&scale| {
        let trace = world.sweep(
            dims.body_box(scale, PROBE_HEIGHT_SCALE),
            from,
            to,
            ContentFlags::MASK_PLAYER_SOLID,
        );
        (!trace.started_solid).then_some(trace)
    })?;

    if !trace.hit_something() {
        return None;
    }

    Some(trace.end_position + Vec3::Z * REGROUND_SKIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{BrushMotion, CollisionWorld};

    const DT: f32 = 1.0 / 60.0;

    fn dims() -> BodyDims {
        BodyDims {
            radius: 16.0,
            height: 72.0,
        }
    }

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

    fn flat(trace: &TraceResult) -> bool {
        trace.normal_or_up().z > 0.7
    }

    #[test]
    fn test_grounded_iff_support() {
        let world = create_test_world();
        let mut ground = GroundState::default();

        let t = categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        assert_eq!(t, GroundTransition::Landed);
        assert!(ground.is_grounded());
        assert_eq!(ground.object(), Some(ObjectId(0)));

        let t = categorize(&mut ground, &world, Vec3::new(0.0, 0.0, 50.0), dims(), true, &flat);
        assert_eq!(t, GroundTransition::Left);
        assert!(!ground.is_grounded());
        assert!(ground.object().is_none());
    }

    #[test]
    fn test_friction_override_and_dynamic_default() {
        let mut world = create_test_world();
        world.set_surface(ObjectId(0), SurfaceMaterial::ICE);

        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        assert_eq!(ground.friction(), SurfaceMaterial::ICE.friction);
        assert!(!ground.is_dynamic());

        world.set_friction(ObjectId(0), Some(0.4));
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        assert_eq!(ground.friction(), 0.4);

        // Providers that report no collider count as dynamic
        let mut trace = TraceResult::hit(Vec3::Z, Vec3::ZERO, 0.5, Vec3::Z, ObjectId(9));
        trace.collider = None;
        let support = GroundSupport::from_trace(&trace).expect("hit has an object");
        assert!(support.is_dynamic);
    }

    #[test]
    fn test_prevent_grounding_holds_for_duration() {
        let world = create_test_world();
        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        assert!(ground.is_grounded());

        ground.prevent(0.25);
        let mut ungrounded_time = 0.0;
        for _ in 0..60 {
            ground.advance(DT);
            categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
            if ground.is_grounded() {
                break;
            }
            ungrounded_time += DT;
        }

        assert!(ungrounded_time >= 0.25 - DT - 1e-4, "only {ungrounded_time}s");
        assert!(ground.is_grounded(), "grounding should come back");
    }

    #[test]
    fn test_prevent_keeps_longest_window() {
        let mut ground = GroundState::default();
        ground.prevent(0.3);
        ground.prevent(0.1);
        assert_eq!(ground.time_until_allowed, 0.3);
    }

    #[test]
    fn test_launch_speed_suppresses() {
        let world = create_test_world();
        let mut ground = GroundState {
            velocity: Vec3::new(0.0, 0.0, 260.0),
            ..Default::default()
        };

        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        assert!(!ground.is_grounded());
        assert_eq!(ground.time_until_allowed, LAUNCH_SUPPRESSION);
    }

    #[test]
    fn test_mode_without_grounding() {
        let world = create_test_world();
        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), false, &flat);
        assert!(!ground.is_grounded());
        assert_eq!(ground.time_until_allowed, MODE_SUPPRESSION);
    }

    #[test]
    fn test_unstandable_surface_is_not_ground() {
        let world = create_test_world();
        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &|_| false);
        assert!(!ground.is_grounded());
        // No suppression from a plain miss
        assert_eq!(ground.time_until_allowed, 0.0);
    }

    #[test]
    fn test_squeezed_probe_shrinks() {
        let mut world = create_test_world();
        // Pillars pinching the probe at full width but not at 80%
        world.add_box(Vec3::new(14.5, 0.0, 20.0), Vec3::new(7.0, 50.0, 20.0), ContentFlags::SOLID);
        world.add_box(Vec3::new(-14.5, 0.0, 20.0), Vec3::new(7.0, 50.0, 20.0), ContentFlags::SOLID);

        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        assert!(ground.is_grounded());
    }

    #[test]
    fn test_ground_velocity_mass_ratio() {
        let mut world = create_test_world();
        world.set_motion(
            ObjectId(0),
            BrushMotion::Dynamic {
                velocity: Vec3::new(100.0, 0.0, 0.0),
                mass: 500.0,
            },
        );

        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);
        refresh_ground_velocity(&mut ground, &world, Vec3::ZERO, 500.0);
        assert_eq!(ground.velocity, Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_destroyed_ground_reads_as_no_ground() {
        let mut world = create_test_world();
        let mut ground = GroundState::default();
        categorize(&mut ground, &world, Vec3::ZERO, dims(), true, &flat);

        world.remove(ObjectId(0));
        let t = refresh_ground_velocity(&mut ground, &world, Vec3::ZERO, 500.0);
        assert_eq!(t, GroundTransition::Left);
        assert!(!ground.is_grounded());
        assert_eq!(ground.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_reground_target() {
        let world = create_test_world();
        let target = reground_target(&world, Vec3::new(0.0, 0.0, 10.0), dims(), 18.0)
            .expect("floor within reach");
        assert!((target.z - REGROUND_SKIN).abs() < 0.02, "target {target:?}");

        assert!(reground_target(&world, Vec3::new(0.0, 0.0, 30.0), dims(), 18.0).is_none());
    }
}
