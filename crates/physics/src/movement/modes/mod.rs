//! Movement modes.
//!
//! A character always has exactly one active [`MoveMode`]. Every physics tick
//! each mode scores itself against the current state and the highest score
//! takes over (see [`ModeSet`](super::selector::ModeSet)). The active mode
//! turns input into a wish velocity, shapes the body's velocity towards it,
//! and decides how the body is set up for the physics step.
//!
//! Modes talk to the body, the world and the shared motion state through a
//! [`MoveContext`].

mod ladder;
mod swim;
mod walk;

pub use ladder::LadderMode;
pub use swim::SwimMode;
pub use walk::WalkMode;

use std::fmt;

use glam::{Quat, Vec3};

use crate::body::{BodyIntegrator, BodyProperties};
use crate::collision::{TraceProvider, TraceResult};

use super::config::ControllerConfig;
use super::ground::{reground_target, GroundTransition, JUMP_SUPPRESSION};
use super::math::{is_nearly_zero, SmoothDamped};
use super::state::{BodyDims, CommandButtons, EyeAngles, MotionState};
use super::step;
use super::velocity::{apply_default_policy, jump_velocity, shape_velocity};

/// Scores below this never take over.
pub const SCORE_SENTINEL: i32 = -50;

/// Score a mode reports when it cannot apply at all.
pub const SCORE_DISQUALIFIED: i32 = -100;

/// Identity of a movement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Walk,
    Swim,
    Ladder,
    /// A mode defined outside this crate.
    Custom(&'static str),
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walk => f.write_str("walk"),
            Self::Swim => f.write_str("swim"),
            Self::Ladder => f.write_str("ladder"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// What an animation system needs to pose the character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub velocity: Vec3,
    pub wish_velocity: Vec3,
    /// On the ground or holding on to something.
    pub grounded: bool,
    pub swimming: bool,
    pub climbing: bool,
    /// Crouch blend: up to 0.5 as headroom runs out, 1 and above while ducking.
    pub duck: f32,
    /// Rotation the body should turn to, when the mode dictates one.
    pub facing: Option<Quat>,
}

impl AnimationState {
    /// Headroom below which the crouch blend starts.
    const DUCK_HEADROOM: f32 = 25.0;

    pub fn from_state(state: &MotionState) -> Self {
        let squeeze = (1.0 - state.headroom / Self::DUCK_HEADROOM).clamp(0.0, 1.0) * 0.5;
        let duck = if state.is_ducking() {
            squeeze * 3.0 + 1.0
        } else {
            squeeze
        };

        Self {
            velocity: state.velocity,
            wish_velocity: state.wish_velocity(),
            grounded: state.is_grounded() || state.is_climbing,
            swimming: state.is_swimming,
            climbing: state.is_climbing,
            duck,
            facing: None,
        }
    }
}

/// Everything a mode may touch during one of its hooks.
pub struct MoveContext<'a> {
    pub body: &'a mut dyn BodyIntegrator,
    pub world: &'a dyn TraceProvider,
    pub state: &'a mut MotionState,
    pub config: &'a ControllerConfig,
    pub delta_time: f32,
}

impl MoveContext<'_> {
    /// Current body dimensions.
    pub fn dims(&self) -> BodyDims {
        self.state.body_dims(self.config)
    }

    /// Whether `button` is held this update.
    pub fn button_down(&self, button: u16) -> bool {
        self.state.buttons.down(button)
    }

    /// Keep the body off the ground for at least `seconds`.
    pub fn prevent_grounding(&mut self, seconds: f32) -> GroundTransition {
        self.state.ground.prevent(seconds)
    }

    /// Launch the body with `velocity`.
    ///
    /// Grounding is suppressed briefly so the next ground check doesn't pull
    /// the body straight back down.
    pub fn jump(&mut self, velocity: Vec3) {
        self.prevent_grounding(JUMP_SUPPRESSION);
        let launched = jump_velocity(self.body.velocity(), velocity);
        self.body.set_velocity(launched);
        self.state.time_since_jump = 0.0;
    }

    /// Step up onto an obstacle no taller than `max_height`.
    pub fn try_step(&mut self, max_height: f32, standable: &dyn Fn(&TraceResult) -> bool) -> bool {
        let dims = self.dims();
        step::try_step(
            &mut *self.body,
            &mut *self.state,
            self.world,
            dims,
            max_height,
            self.delta_time,
            standable,
        )
    }

    /// Pull a grounded body back down onto ground up to `max_distance` below.
    pub fn reground(&mut self, max_distance: f32) -> bool {
        if !self.state.is_grounded() || self.body.is_sleeping() {
            return false;
        }

        let position = self.body.position();
        let Some(target) = reground_target(self.world, position, self.dims(), max_distance) else {
            return false;
        };

        if position == target {
            return false;
        }

        self.body.set_position(target);
        if position.z - target.z > 0.01 {
            let v = self.body.velocity();
            self.body.set_velocity(v.truncate().extend(0.0));
        }
        true
    }

    /// Steer the body towards the current wish velocity.
    pub fn shape_towards_wish(&mut self) {
        let shaped = shape_velocity(
            self.body.velocity(),
            self.state.ground.velocity,
            self.state.wish_velocity(),
            self.state.is_grounded(),
            self.state.ground.friction(),
        );
        self.body.set_velocity(shaped);
    }
}

/// A way of moving.
///
/// Most hooks have a default, so a mode only spells out what makes it
/// different. Modes that never ground the body keep the defaults for
/// [`allow_grounding`](Self::allow_grounding) and friends.
pub trait MoveMode: fmt::Debug {
    fn kind(&self) -> ModeKind;

    /// How much this mode wants to be active. Highest wins.
    fn score(&self, state: &MotionState) -> i32;

    /// Whether the ground resolver runs while this mode is active.
    fn allow_grounding(&self) -> bool {
        false
    }

    /// Whether falls are tracked while this mode is active.
    fn allow_falling(&self) -> bool {
        false
    }

    fn is_standable_surface(&self, _trace: &TraceResult) -> bool {
        false
    }

    /// Set gravity and damping for the coming physics step.
    fn configure_body(&self, state: &MotionState, config: &ControllerConfig, props: &mut BodyProperties) {
        apply_default_policy(props, state, config);
    }

    /// Push the body's velocity towards the wish velocity.
    fn add_velocity(&mut self, ctx: &mut MoveContext<'_>) {
        ctx.shape_towards_wish();
    }

    fn pre_physics_step(&mut self, _ctx: &mut MoveContext<'_>) {}

    fn post_physics_step(&mut self, _ctx: &mut MoveContext<'_>) {}

    fn on_enter(&mut self, _ctx: &mut MoveContext<'_>) {}

    /// Called on the outgoing mode with the mode about to take over.
    fn on_exit(&mut self, _next: &dyn MoveMode, _ctx: &mut MoveContext<'_>) {}

    /// Turn view-space input into a wish velocity.
    fn update_move(&mut self, ctx: &mut MoveContext<'_>, eyes: EyeAngles, input: Vec3) -> Vec3;

    /// Observe the surroundings once per fixed update. Runs for every mode,
    /// active or not, before scoring.
    fn sense(&mut self, _ctx: &mut MoveContext<'_>) {}

    /// Longest wish velocity this mode produces.
    fn max_wish_speed(&self, config: &ControllerConfig) -> f32 {
        config.max_input_speed()
    }

    fn animation_state(&self, state: &MotionState) -> AnimationState {
        AnimationState::from_state(state)
    }
}

/// Wish velocity smoothing shared by the built-in modes.
///
/// Input is turned into a world-space direction and eased towards the
/// walk, run or ducked speed using the acceleration or deceleration time.
#[derive(Debug, Clone, Copy, Default)]
pub struct WishSmoother {
    smoothed: SmoothDamped,
}

impl WishSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Vec3 {
        self.smoothed.current
    }

    /// # Arguments
    ///
    /// * `ctx` - Context for speeds, buttons and the duck state
    /// * `rotation` - Rotation from view space to world space
    /// * `input` - View-space input, clamped to length 1
    pub fn update(&mut self, ctx: &MoveContext<'_>, rotation: Quat, input: Vec3) -> Vec3 {
        let config = ctx.config;
        let input = input.clamp_length_max(1.0);
        let mut world_input = rotation * input;

        let mut running = ctx.button_down(CommandButtons::RUN);
        if config.run_by_default {
            running = !running;
        }

        let target_speed = if ctx.state.is_ducking() {
            config.ducked_speed
        } else if running {
            config.run_speed
        } else {
            config.walk_speed
        };

        if is_nearly_zero(world_input, 0.1) {
            world_input = Vec3::ZERO;
        } else {
            // Keep the current speed but turn to the new direction at once
            let speed = self.smoothed.current.length();
            self.smoothed.current = world_input.normalize_or_zero() * speed;
        }

        self.smoothed.target = world_input * target_speed;
        self.smoothed.smooth_time = if self.smoothed.target.length() > self.smoothed.current.length() {
            config.acceleration_time
        } else {
            config.deceleration_time
        };
        self.smoothed.update(ctx.delta_time);

        if is_nearly_zero(self.smoothed.current, 0.01) {
            self.smoothed.current = Vec3::ZERO;
        }
        self.smoothed.current
    }
}
