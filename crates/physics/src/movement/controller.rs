//! Character controller.
//!
//! This is the main entry point for character movement. It owns the body and
//! the movement modes, turns input commands into a wish velocity once per
//! fixed update, and wraps the host's physics step with the active mode's
//! pre- and post-step work.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::BodyIntegrator;
use crate::collision::{ContentFlags, TraceProvider, TraceResult};

use super::config::ControllerConfig;
use super::error::ControllerError;
use super::events::{ControllerEvent, ControllerListener, EventQueue};
use super::ground::{self, GroundState, GroundTransition};
use super::math::clamp_length;
use super::modes::{AnimationState, LadderMode, ModeKind, MoveContext, MoveMode, SwimMode, WalkMode};
use super::selector::ModeSet;
use super::state::{wrap_angle, CommandButtons, EyeAngles, FallTracker, MotionState, MoveCommand, ReplicatedState};
use super::step;
use super::velocity::base_body_properties;

/// How far above the head free space is measured.
const HEADROOM_PROBE: f32 = 100.0;

/// A jump is still allowed this long after leaving the ground.
const JUMP_GRACE: f32 = 0.33;

/// Minimum time between two jumps.
const JUMP_COOLDOWN: f32 = 0.5;

/// Falls shorter than this don't count as landings.
const LANDING_MIN_DISTANCE: f32 = 1.0;

/// Who drives a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Authority {
    /// Input is read and velocity is shaped here.
    #[default]
    Local,
    /// Mirrors replicated state from elsewhere.
    Proxy,
}

/// Character movement controller.
///
/// Handles:
/// - Mode selection (walk, swim, climb, and custom modes)
/// - Ground detection on static and moving surfaces
/// - Step climbing and sticking to the ground
/// - Jumping, ducking and fall tracking
///
/// # Example
///
/// ```ignore
/// let mut controller = CharacterController::with_default_modes(body, ControllerConfig::default())?;
///
/// // Each fixed tick:
/// controller.fixed_update(&command, &world, delta_time);
/// controller.physics_tick(&world, delta_time, |body| body.integrate(&world, delta_time));
/// ```
#[derive(Debug)]
pub struct CharacterController<B: BodyIntegrator> {
    body: B,
    config: ControllerConfig,
    modes: ModeSet,
    state: MotionState,
    authority: Authority,
    events: EventQueue,
    /// Grounded flag as of the last event, for edge detection.
    was_grounded: bool,
}

impl<B: BodyIntegrator> CharacterController<B> {
    /// Create a controller driving `body`.
    ///
    /// The first mode in `modes` starts out active.
    pub fn new(body: B, config: ControllerConfig, modes: Vec<Box<dyn MoveMode>>) -> Result<Self, ControllerError> {
        config.validate()?;
        let modes = ModeSet::new(modes)?;

        let mut controller = Self {
            body,
            config,
            modes,
            state: MotionState::default(),
            authority: Authority::Local,
            events: EventQueue::new(),
            was_grounded: false,
        };
        controller.configure_body();
        Ok(controller)
    }

    /// Create a controller with walking, swimming and ladder modes.
    pub fn with_default_modes(body: B, config: ControllerConfig) -> Result<Self, ControllerError> {
        Self::new(
            body,
            config,
            vec![
                Box::new(WalkMode::default()),
                Box::new(SwimMode::default()),
                Box::new(LadderMode::default()),
            ],
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn body(&self) -> &B {
        &self.body
    }

    /// Direct body access for the host. Changes made here are seen by the
    /// next tick.
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn active_mode(&self) -> ModeKind {
        self.modes.active_kind()
    }

    pub fn active(&self) -> &dyn MoveMode {
        self.modes.active()
    }

    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded()
    }

    /// Velocity relative to the ground, as of the last physics tick.
    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    pub fn wish_velocity(&self) -> Vec3 {
        self.state.wish_velocity()
    }

    pub fn ground(&self) -> &GroundState {
        &self.state.ground
    }

    pub fn eye_angles(&self) -> EyeAngles {
        self.state.eye_angles()
    }

    /// World position of the eyes.
    pub fn eye_position(&self) -> Vec3 {
        let height = self.state.body_dims(&self.config).height;
        self.body.position() + Vec3::Z * (height - self.config.eye_distance_from_top)
    }

    /// Point the view somewhere, e.g. at spawn.
    pub fn set_eye_angles(&mut self, eyes: EyeAngles) {
        self.state.replicated.eye_angles = eyes;
    }

    pub fn animation_state(&self) -> AnimationState {
        self.modes.active().animation_state(&self.state)
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn set_authority(&mut self, authority: Authority) {
        self.authority = authority;
    }

    pub fn replicated(&self) -> ReplicatedState {
        self.state.replicated
    }

    /// Apply mirrored state on a proxy.
    pub fn set_replicated(&mut self, replicated: ReplicatedState) {
        self.state.replicated = replicated;
    }

    pub fn add_listener(&mut self, listener: impl ControllerListener + 'static) {
        self.events.add_listener(Box::new(listener));
    }

    /// Take the events raised since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        self.events.drain()
    }

    /// Move the body to `position` and forget about the ground and any fall
    /// in progress.
    pub fn teleport(&mut self, position: Vec3) {
        self.body.set_position(position);
        self.body.set_velocity(Vec3::ZERO);
        self.body.wake();
        self.state.step = None;
        self.state.velocity = Vec3::ZERO;
        self.state.fall = FallTracker::default();
        self.state.ground.set_support(None);
        self.sync_ground();
    }

    // ========================================================================
    // Fixed Update
    // ========================================================================

    /// Per-tick work that runs before the physics step.
    ///
    /// Measures headroom, tracks falls and lets every mode sense its
    /// surroundings. A locally driven character then reads `command`: view
    /// angles, wish velocity, ducking and jumping.
    ///
    /// # Arguments
    ///
    /// * `command` - Input for this tick (ignored by proxies)
    /// * `world` - Trace provider
    /// * `delta_time` - Time step in seconds
    pub fn fixed_update(&mut self, command: &MoveCommand, world: &dyn TraceProvider, delta_time: f32) {
        self.state.time_since_jump += delta_time;

        self.update_headroom(world);
        self.update_falling();

        {
            let (mut ctx, modes) = self.parts(world, delta_time);
            for mode in modes.iter_mut() {
                mode.sense(&mut ctx);
            }
        }

        if self.authority == Authority::Local {
            self.update_input(command, world, delta_time);
        }

        self.sync_ground();
    }

    fn update_headroom(&mut self, world: &dyn TraceProvider) {
        let shape = self.state.body_dims(&self.config).body_box(1.0, 1.0);
        let from = self.body.position();
        let trace = world.sweep(shape, from, from + Vec3::Z * HEADROOM_PROBE, ContentFlags::MASK_PLAYER_SOLID);

        self.state.headroom = if trace.started_solid { 0.0 } else { trace.distance };
    }

    fn update_falling(&mut self) {
        if !self.modes.active().allow_falling() {
            self.state.fall = FallTracker::default();
            return;
        }

        let height = self.body.position().z;
        let fall = &mut self.state.fall;

        if !self.state.ground.is_grounded() {
            if !fall.was_falling {
                fall.was_falling = true;
                fall.peak_height = height;
            }
            fall.peak_height = fall.peak_height.max(height);
            fall.distance = fall.peak_height - height;
            fall.last_velocity = self.body.velocity();
            return;
        }

        if !fall.was_falling {
            return;
        }

        let distance = fall.peak_height - height;
        let impact_velocity = fall.last_velocity;
        *fall = FallTracker::default();

        if distance > LANDING_MIN_DISTANCE {
            log::debug!("landed after falling {distance:.1} at {impact_velocity:?}");
            self.events.emit(ControllerEvent::Landed {
                distance,
                impact_velocity,
            });
        }
    }

    fn update_input(&mut self, command: &MoveCommand, world: &dyn TraceProvider, delta_time: f32) {
        self.state.previous_buttons = self.state.buttons;
        self.state.buttons = command.buttons;

        let mut eyes = self.state.eye_angles();
        if self.config.rotate_with_ground && self.state.is_grounded() {
            eyes.yaw = wrap_angle(eyes.yaw + self.state.ground.yaw_rate * delta_time);
        }
        eyes.apply_delta(command.view_delta.0, command.view_delta.1, self.config.pitch_limit);
        self.state.replicated.eye_angles = eyes;

        self.update_ducking(command.wants_duck(), world);

        {
            let (mut ctx, modes) = self.parts(world, delta_time);
            let mode = modes.active_mut();
            let wish = mode.update_move(&mut ctx, eyes, command.analog_move);
            let max_speed = mode.max_wish_speed(ctx.config);
            ctx.state.replicated.wish_velocity = clamp_length(wish, max_speed);
        }

        if self.wants_jump() {
            let jump = Vec3::Z * self.config.jump_speed;
            let (mut ctx, _) = self.parts(world, delta_time);
            ctx.jump(jump);
            log::debug!("jump from {:?}", self.body.position());
            self.events.emit(ControllerEvent::Jumped);
        }
    }

    /// Duck when asked to. Standing back up waits for enough headroom.
    fn update_ducking(&mut self, wants_duck: bool, world: &dyn TraceProvider) {
        if wants_duck == self.state.is_ducking() {
            return;
        }

        let body = self.config.body;
        let delta = body.height - body.duck_height;

        if !wants_duck {
            if self.state.headroom >= delta {
                self.state.replicated.is_ducking = false;
            }
            return;
        }

        self.state.replicated.is_ducking = true;
        if self.state.is_grounded() {
            return;
        }

        // Tuck the legs up in the air so the head stays where it was
        let shape = self.state.body_dims(&self.config).body_box(1.0, 1.0);
        let from = self.body.position();
        let trace = world.sweep(shape, from, from + Vec3::Z * delta, ContentFlags::MASK_PLAYER_SOLID);
        if !trace.started_solid {
            self.body.set_position(trace.end_position);
        }
    }

    fn wants_jump(&self) -> bool {
        let ground = &self.state.ground;
        self.config.jump_speed > 0.0
            && self.state.pressed(CommandButtons::JUMP)
            && self.modes.active().allow_grounding()
            && (ground.is_grounded() || ground.time_since_grounded <= JUMP_GRACE)
            && self.state.time_since_jump >= JUMP_COOLDOWN
    }

    // ========================================================================
    // Physics Tick
    // ========================================================================

    /// Run one physics step around the host's integrator.
    ///
    /// # Arguments
    ///
    /// * `world` - Trace provider
    /// * `delta_time` - Time step in seconds
    /// * `integrate` - Moves the body by one step
    pub fn physics_tick<F>(&mut self, world: &dyn TraceProvider, delta_time: f32, integrate: F)
    where
        F: FnOnce(&mut B),
    {
        self.pre_physics_step(world, delta_time);
        integrate(&mut self.body);
        self.post_physics_step(world, delta_time);
    }

    fn pre_physics_step(&mut self, world: &dyn TraceProvider, delta_time: f32) {
        self.configure_body();

        if self.authority == Authority::Local {
            let (mut ctx, modes) = self.parts(world, delta_time);
            let mode = modes.active_mut();
            mode.add_velocity(&mut ctx);
            mode.pre_physics_step(&mut ctx);
        }

        self.sync_ground();
    }

    fn post_physics_step(&mut self, world: &dyn TraceProvider, delta_time: f32) {
        self.state.velocity = self.body.velocity() - self.state.ground.velocity;
        self.state.ground.advance(delta_time);

        let position = self.body.position();
        ground::refresh_ground_velocity(&mut self.state.ground, world, position, self.config.body.mass);
        step::restore_step(&mut self.body, &mut self.state);

        {
            let (mut ctx, modes) = self.parts(world, delta_time);
            modes.active_mut().post_physics_step(&mut ctx);
        }

        self.categorize(world);
        self.sync_ground();
        self.select_mode(world, delta_time);
    }

    fn categorize(&mut self, world: &dyn TraceProvider) {
        let mode = self.modes.active();
        let standable = |trace: &TraceResult| mode.is_standable_surface(trace);
        let dims = self.state.body_dims(&self.config);

        let transition = ground::categorize(
            &mut self.state.ground,
            world,
            self.body.position(),
            dims,
            mode.allow_grounding(),
            &standable,
        );

        if transition != GroundTransition::None {
            log::trace!("{transition:?} on {:?}", self.state.ground.object());
        }
    }

    fn select_mode(&mut self, world: &dyn TraceProvider, delta_time: f32) {
        let switch = {
            let (mut ctx, modes) = self.parts(world, delta_time);
            modes.select(&mut ctx)
        };
        let Some(switch) = switch else {
            return;
        };

        self.events.emit(ControllerEvent::ModeEnd(switch.from));
        self.events.emit(ControllerEvent::ModeBegin(switch.to));

        // Enter and exit hooks may have jumped
        self.configure_body();
        self.sync_ground();
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Shared body properties, then the active mode's gravity and damping.
    fn configure_body(&mut self) {
        let mut props = base_body_properties(&self.state, &self.config, self.body.properties());
        self.modes.active().configure_body(&self.state, &self.config, &mut props);
        self.body.set_properties(props);
    }

    /// Raise grounding events and reconfigure the body when the grounded
    /// flag has flipped since the last call. Losing the ground wakes the body.
    fn sync_ground(&mut self) {
        let grounded = self.state.is_grounded();
        if grounded == self.was_grounded {
            return;
        }
        self.was_grounded = grounded;

        // A body left resting on ground that vanished is still asleep
        if !grounded {
            self.body.wake();
        }
        self.configure_body();
        self.events.emit(if grounded {
            ControllerEvent::Grounded
        } else {
            ControllerEvent::Ungrounded
        });
    }

    fn parts<'a>(&'a mut self, world: &'a dyn TraceProvider, delta_time: f32) -> (MoveContext<'a>, &'a mut ModeSet) {
        let ctx = MoveContext {
            body: &mut self.body,
            world,
            state: &mut self.state,
            config: &self.config,
            delta_time,
        };
        (ctx, &mut self.modes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::SimBody;
    use crate::collision::{BrushMotion, CollisionWorld, ObjectId};
    use crate::movement::config::ConfigError;
    use glam::Quat;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    /// Floor with its top at z=0.
    fn create_test_world() -> (CollisionWorld, ObjectId) {
        let mut world = CollisionWorld::new();
        let floor = world.add_box(
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::new(1000.0, 1000.0, 8.0),
            ContentFlags::SOLID,
        );
        (world, floor)
    }

    fn create_controller(position: Vec3, config: ControllerConfig) -> CharacterController<SimBody> {
        CharacterController::with_default_modes(SimBody::new(position), config).expect("valid controller")
    }

    fn tick(controller: &mut CharacterController<SimBody>, world: &CollisionWorld, command: &MoveCommand) {
        controller.fixed_update(command, world, DT);
        controller.physics_tick(world, DT, |body| body.integrate(world, DT));
    }

    fn forward() -> MoveCommand {
        MoveCommand {
            analog_move: Vec3::X,
            ..Default::default()
        }
    }

    fn held(button: u16) -> MoveCommand {
        let mut command = MoveCommand::default();
        command.buttons.press(button);
        command
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_requires_a_mode() {
        let result = CharacterController::new(SimBody::new(Vec3::ZERO), ControllerConfig::default(), Vec::new());
        assert_eq!(result.err(), Some(ControllerError::NoModes));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ControllerConfig {
            jump_speed: -1.0,
            ..Default::default()
        };
        let result = CharacterController::with_default_modes(SimBody::new(Vec3::ZERO), config);
        assert!(matches!(
            result.err(),
            Some(ControllerError::Config(ConfigError::Negative { field: "jump_speed", .. }))
        ));
    }

    #[test]
    fn test_starts_walking_with_body_configured() {
        let controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        assert_eq!(controller.active_mode(), ModeKind::Walk);
        assert_eq!(controller.body().properties().mass, 500.0);
        assert_eq!(controller.body().properties().height, 72.0);
        assert_eq!(controller.eye_position(), Vec3::new(0.0, 0.0, 64.0));
    }

    // ========================================================================
    // Ground
    // ========================================================================

    #[test]
    fn test_grounded_event_on_floor() {
        let (world, _) = create_test_world();
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());

        tick(&mut controller, &world, &MoveCommand::default());

        assert!(controller.is_grounded(), "Should be on ground");
        assert_eq!(controller.drain_events(), vec![ControllerEvent::Grounded]);
    }

    #[test]
    fn test_flat_ground_walk() {
        let (world, _) = create_test_world();
        let config = ControllerConfig {
            walk_speed: 100.0,
            ..Default::default()
        };
        let mut controller = create_controller(Vec3::ZERO, config);

        for _ in 0..10 {
            tick(&mut controller, &world, &forward());
        }

        let v = controller.velocity();
        assert!(v.x > 95.0 && v.x <= 100.0, "Should walk at about 100, got {v:?}");
        assert!(v.y.abs() < 1e-3);
        assert!(controller.is_grounded());
        assert!(controller.body().position().x > 10.0);
    }

    #[test]
    fn test_launch_platform_suppresses_grounding() {
        let (mut world, floor) = create_test_world();
        world.set_motion(
            floor,
            BrushMotion::Kinematic {
                velocity: Vec3::new(0.0, 0.0, 260.0),
                yaw_rate: 0.0,
            },
        );
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());

        tick(&mut controller, &world, &MoveCommand::default());
        assert!(controller.is_grounded(), "Should land on the platform first");

        tick(&mut controller, &world, &MoveCommand::default());
        assert!(!controller.is_grounded(), "Should be launched");
        assert!(
            (controller.ground().time_until_allowed - 0.3).abs() < 1e-6,
            "Should suppress grounding for 0.3s, got {}",
            controller.ground().time_until_allowed
        );
        assert_eq!(
            controller.drain_events(),
            vec![ControllerEvent::Grounded, ControllerEvent::Ungrounded]
        );
    }

    #[test]
    fn test_rotates_with_ground() {
        let (mut world, floor) = create_test_world();
        world.set_motion(
            floor,
            BrushMotion::Kinematic {
                velocity: Vec3::ZERO,
                yaw_rate: 1.0,
            },
        );

        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        for _ in 0..3 {
            tick(&mut controller, &world, &MoveCommand::default());
        }
        let yaw = controller.eye_angles().yaw;
        assert!((yaw - DT).abs() < 1e-5, "Should turn with the ground, yaw={yaw}");

        let config = ControllerConfig {
            rotate_with_ground: false,
            ..Default::default()
        };
        let mut controller = create_controller(Vec3::ZERO, config);
        for _ in 0..3 {
            tick(&mut controller, &world, &MoveCommand::default());
        }
        assert_eq!(controller.eye_angles().yaw, 0.0);
    }

    #[test]
    fn test_landing_reports_fall() {
        let (world, _) = create_test_world();
        let mut controller = create_controller(Vec3::new(0.0, 0.0, 50.0), ControllerConfig::default());

        for _ in 0..60 {
            tick(&mut controller, &world, &MoveCommand::default());
        }

        let events = controller.drain_events();
        let landed = events.iter().find_map(|e| match e {
            ControllerEvent::Landed {
                distance,
                impact_velocity,
            } => Some((*distance, *impact_velocity)),
            _ => None,
        });
        let (distance, impact_velocity) = landed.expect("Should report a landing");
        assert!(distance > 45.0 && distance < 50.5, "distance={distance}");
        assert!(impact_velocity.z < -200.0, "impact={impact_velocity:?}");
        assert!(!controller.state().fall.was_falling);
    }

    #[test]
    fn test_teleport_clears_ground() {
        let (world, _) = create_test_world();
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        tick(&mut controller, &world, &MoveCommand::default());
        controller.drain_events();

        controller.teleport(Vec3::new(0.0, 0.0, 500.0));

        assert!(!controller.is_grounded());
        assert_eq!(controller.body().position(), Vec3::new(0.0, 0.0, 500.0));
        assert_eq!(controller.drain_events(), vec![ControllerEvent::Ungrounded]);
    }

    #[test]
    fn test_resting_body_falls_when_floor_is_removed() {
        let (mut world, floor) = create_test_world();
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());

        for _ in 0..60 {
            tick(&mut controller, &world, &MoveCommand::default());
        }
        assert!(controller.is_grounded());
        assert!(controller.body().is_sleeping(), "Idle body should be asleep");
        controller.drain_events();

        assert!(world.remove(floor));
        for _ in 0..60 {
            tick(&mut controller, &world, &MoveCommand::default());
        }

        assert!(!controller.is_grounded());
        assert!(!controller.body().is_sleeping());
        assert!(
            controller.body().position().z < -10.0,
            "Should fall once the floor is gone, at {:?}",
            controller.body().position()
        );
        assert_eq!(controller.drain_events().first(), Some(&ControllerEvent::Ungrounded));
    }

    // ========================================================================
    // Jumping and Ducking
    // ========================================================================

    #[test]
    fn test_jump() {
        let (world, _) = create_test_world();
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        for _ in 0..5 {
            tick(&mut controller, &world, &MoveCommand::default());
        }
        assert!(controller.is_grounded(), "Should start on ground");
        controller.drain_events();

        controller.fixed_update(&held(CommandButtons::JUMP), &world, DT);

        let vz = controller.body().velocity().z;
        assert!((vz - 300.0).abs() < 1.0, "Should have jump velocity, got {vz}");
        assert!(!controller.is_grounded());
        assert!(controller.ground().is_suppressed());
        assert_eq!(
            controller.drain_events(),
            vec![ControllerEvent::Jumped, ControllerEvent::Ungrounded]
        );
    }

    #[test]
    fn test_holding_jump_jumps_once() {
        let (world, _) = create_test_world();
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        tick(&mut controller, &world, &MoveCommand::default());

        for _ in 0..120 {
            tick(&mut controller, &world, &held(CommandButtons::JUMP));
        }

        let jumps = controller
            .drain_events()
            .into_iter()
            .filter(|e| *e == ControllerEvent::Jumped)
            .count();
        assert_eq!(jumps, 1, "Should need a fresh press to jump again");
    }

    #[test]
    fn test_duck_in_the_air_lifts_feet() {
        let world = CollisionWorld::new();
        let mut controller = create_controller(Vec3::new(0.0, 0.0, 200.0), ControllerConfig::default());

        controller.fixed_update(&held(CommandButtons::DUCK), &world, DT);

        assert!(controller.state().is_ducking());
        assert!((controller.body().position().z - 236.0).abs() < 1e-3);
        assert_eq!(controller.eye_position().z, 236.0 + 36.0 - 8.0);
    }

    #[test]
    fn test_ceiling_blocks_standing_up() {
        let (mut world, _) = create_test_world();
        // Ceiling 50 units up
        world.add_box(
            Vec3::new(0.0, 0.0, 58.0),
            Vec3::new(1000.0, 1000.0, 8.0),
            ContentFlags::SOLID,
        );

        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        controller.set_replicated(ReplicatedState {
            is_ducking: true,
            ..Default::default()
        });

        for _ in 0..5 {
            tick(&mut controller, &world, &MoveCommand::default());
        }

        assert!(controller.state().is_ducking(), "Should stay ducked under the ceiling");
        assert!((controller.state().headroom - 14.0).abs() < 0.1);

        let (open, _) = create_test_world();
        tick(&mut controller, &open, &MoveCommand::default());
        assert!(!controller.state().is_ducking(), "Should stand up in the open");
    }

    // ========================================================================
    // Modes
    // ========================================================================

    #[test]
    fn test_switches_to_swimming() {
        let (mut world, _) = create_test_world();
        // 57.6 / 72 = 0.8 submerged
        world.add_volume(
            ContentFlags::WATER,
            Vec3::new(0.0, 0.0, 28.8),
            Vec3::new(500.0, 500.0, 28.8),
            Quat::IDENTITY,
        );
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());

        for _ in 0..3 {
            tick(&mut controller, &world, &MoveCommand::default());
        }

        assert_eq!(controller.active_mode(), ModeKind::Swim);
        assert!(controller.state().is_swimming);
        assert!(!controller.body().properties().gravity);
        assert!(!controller.is_grounded());

        let events = controller.drain_events();
        let end = events.iter().position(|e| *e == ControllerEvent::ModeEnd(ModeKind::Walk));
        let begin = events.iter().position(|e| *e == ControllerEvent::ModeBegin(ModeKind::Swim));
        assert!(end.is_some() && begin.is_some() && end < begin, "events={events:?}");
    }

    #[test]
    fn test_listener_sees_mode_changes() {
        let (mut world, _) = create_test_world();
        world.add_volume(
            ContentFlags::LADDER,
            Vec3::new(10.0, 0.0, 100.0),
            Vec3::new(4.0, 16.0, 100.0),
            Quat::IDENTITY,
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        controller.add_listener(move |event: &ControllerEvent| sink.borrow_mut().push(event.clone()));

        for _ in 0..2 {
            tick(&mut controller, &world, &MoveCommand::default());
        }

        assert_eq!(controller.active_mode(), ModeKind::Ladder);
        assert!(controller.animation_state().climbing);
        assert!(seen.borrow().contains(&ControllerEvent::ModeBegin(ModeKind::Ladder)));
        assert_eq!(*seen.borrow(), controller.drain_events());
    }

    // ========================================================================
    // Authority
    // ========================================================================

    #[test]
    fn test_proxy_ignores_input() {
        let (world, _) = create_test_world();
        let mut controller = create_controller(Vec3::ZERO, ControllerConfig::default());
        controller.set_authority(Authority::Proxy);

        let mut command = forward();
        command.buttons.press(CommandButtons::JUMP);
        for _ in 0..10 {
            tick(&mut controller, &world, &command);
        }

        assert_eq!(controller.wish_velocity(), Vec3::ZERO);
        assert!(controller.body().position().x.abs() < 1e-3);
        assert!(controller.is_grounded(), "Proxies still categorize ground");

        let mirrored = ReplicatedState {
            wish_velocity: Vec3::new(50.0, 0.0, 0.0),
            ..Default::default()
        };
        controller.set_replicated(mirrored);
        tick(&mut controller, &world, &command);
        assert_eq!(controller.replicated(), mirrored);
        assert_eq!(controller.animation_state().wish_velocity, Vec3::new(50.0, 0.0, 0.0));
    }
}
