//! Character movement.
//!
//! This module implements mode-driven character movement with:
//!
//! - Pluggable movement modes scored and selected every physics tick
//! - Ground detection on static, kinematic and simulated surfaces
//! - Stair stepping and sticking to the ground on the way down
//! - Velocity shaping with ground friction and weak air control
//! - Jumping, ducking and fall tracking
//!
//! # Design
//!
//! Movement is driven by the [`CharacterController`], which owns the body and
//! a [`ModeSet`]. The controller never integrates motion itself: the host
//! supplies the physics step and the controller runs the active mode's work
//! before and after it.

mod config;
mod controller;
mod error;
mod events;
mod ground;
mod math;
mod modes;
mod selector;
mod state;
mod step;
mod velocity;

pub use config::{BodyConfig, ConfigError, ControllerConfig, LadderConfig, SwimConfig, WalkConfig};
pub use controller::{Authority, CharacterController};
pub use error::ControllerError;
pub use events::{ControllerEvent, ControllerListener, EventQueue};
pub use ground::{
    categorize, refresh_ground_velocity, reground_target, GroundState, GroundSupport, GroundTransition,
    JUMP_SUPPRESSION, LAUNCH_SUPPRESSION, MODE_SUPPRESSION,
};
pub use math::{add_clamped, clamp_length, SmoothDamped};
pub use modes::{
    AnimationState, LadderMode, ModeKind, MoveContext, MoveMode, SwimMode, WalkMode, WishSmoother,
    SCORE_DISQUALIFIED, SCORE_SENTINEL,
};
pub use selector::{choose, ModeSet, ModeSwitch};
pub use state::{
    wrap_angle, BodyDims, CommandButtons, EyeAngles, FallTracker, MotionState, MoveCommand, ReplicatedState,
};
pub use step::{find_step, restore_step, try_step};
pub use velocity::{apply_default_policy, base_body_properties, jump_velocity, shape_velocity};
