//! Controller state and input structures.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::TraceShape;

use super::config::ControllerConfig;
use super::ground::GroundState;

/// View angles in radians.
///
/// - Pitch: looking up/down, positive looks down
/// - Yaw: turning left/right around world up, zero faces `+X`
/// - Roll: tilting head (usually 0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl EyeAngles {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Full view rotation.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.yaw)
            * Quat::from_rotation_y(self.pitch)
            * Quat::from_rotation_x(self.roll)
    }

    /// Rotation around world up only.
    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_rotation_z(self.yaw)
    }

    /// Look direction including pitch.
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    pub fn pitch_degrees(&self) -> f32 {
        self.pitch.to_degrees()
    }

    /// Apply a look delta, clamping pitch and wrapping yaw to `-PI..=PI`.
    pub fn apply_delta(&mut self, pitch_delta: f32, yaw_delta: f32, pitch_limit_degrees: f32) {
        let limit = pitch_limit_degrees.to_radians();
        self.pitch = (self.pitch + pitch_delta).clamp(-limit, limit);
        self.yaw = wrap_angle(self.yaw + yaw_delta);
    }
}

/// Wrap an angle in radians to `-PI..=PI`.
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// The part of the state mirrored to observers of a character.
///
/// A proxy controller receives this instead of reading input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplicatedState {
    pub wish_velocity: Vec3,
    pub eye_angles: EyeAngles,
    pub is_ducking: bool,
}

/// Button state flags for move commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandButtons(pub u16);

impl CommandButtons {
    /// Jump button.
    pub const JUMP: u16 = 1 << 0;

    /// Duck button.
    pub const DUCK: u16 = 1 << 1;

    /// Alternate move speed (run, or walk with run-by-default).
    pub const RUN: u16 = 1 << 2;

    /// Use/interact button.
    pub const USE: u16 = 1 << 3;

    /// Check if a button is held.
    #[inline]
    pub fn down(self, button: u16) -> bool {
        (self.0 & button) != 0
    }

    /// Press a button.
    #[inline]
    pub fn press(&mut self, button: u16) {
        self.0 |= button;
    }

    /// Release a button.
    #[inline]
    pub fn release(&mut self, button: u16) {
        self.0 &= !button;
    }

    /// Buttons held now that were not held in `previous`.
    #[inline]
    pub fn pressed_since(self, previous: Self) -> Self {
        Self(self.0 & !previous.0)
    }
}

/// Input for a single fixed update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Analog move in view space: `x` forward, `y` left, `z` up.
    pub analog_move: Vec3,

    /// View angle delta this update (radians): (pitch_delta, yaw_delta).
    pub view_delta: (f32, f32),

    /// Button states.
    pub buttons: CommandButtons,
}

impl MoveCommand {
    /// Check if jump is held.
    #[inline]
    pub fn wants_jump(&self) -> bool {
        self.buttons.down(CommandButtons::JUMP)
    }

    #[inline]
    pub fn wants_duck(&self) -> bool {
        self.buttons.down(CommandButtons::DUCK)
    }
}

/// Horizontal size and current height of the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDims {
    pub radius: f32,
    pub height: f32,
}

impl BodyDims {
    /// Box used for ground, step and headroom probes.
    ///
    /// Half-width is `radius * 0.5 * scale`; it stands on its origin and is
    /// `height * height_scale` tall.
    pub fn body_box(&self, scale: f32, height_scale: f32) -> TraceShape {
        TraceShape::upright_box(self.radius * 0.5 * scale, self.height * height_scale)
    }
}

/// Height lost since the highest point of the current fall.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FallTracker {
    pub was_falling: bool,
    /// Highest feet height since leaving the ground.
    pub peak_height: f32,
    pub distance: f32,
    /// Velocity at the last airborne update.
    pub last_velocity: Vec3,
}

/// Complete motion state for a character, apart from the body itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub replicated: ReplicatedState,

    /// Body velocity minus ground velocity, refreshed after each physics step.
    pub velocity: Vec3,

    pub ground: GroundState,

    /// Position a step teleported to this tick, restored after integration.
    pub step: Option<Vec3>,

    pub is_swimming: bool,
    pub is_climbing: bool,

    /// Free space above the head, up to the probe distance.
    pub headroom: f32,

    pub fall: FallTracker,

    pub time_since_jump: f32,

    /// Buttons held at the last fixed update.
    pub buttons: CommandButtons,
    pub previous_buttons: CommandButtons,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            replicated: ReplicatedState::default(),
            velocity: Vec3::ZERO,
            ground: GroundState::default(),
            step: None,
            is_swimming: false,
            is_climbing: false,
            headroom: 0.0,
            fall: FallTracker::default(),
            // Allow a jump straight away
            time_since_jump: f32::MAX,
            buttons: CommandButtons::default(),
            previous_buttons: CommandButtons::default(),
        }
    }
}

impl MotionState {
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.ground.is_grounded()
    }

    #[inline]
    pub fn wish_velocity(&self) -> Vec3 {
        self.replicated.wish_velocity
    }

    #[inline]
    pub fn eye_angles(&self) -> EyeAngles {
        self.replicated.eye_angles
    }

    #[inline]
    pub fn is_ducking(&self) -> bool {
        self.replicated.is_ducking
    }

    /// Body dimensions for the current duck state.
    pub fn body_dims(&self, config: &ControllerConfig) -> BodyDims {
        BodyDims {
            radius: config.body.radius,
            height: if self.is_ducking() {
                config.body.duck_height
            } else {
                config.body.height
            },
        }
    }

    /// Buttons that went down at the last fixed update.
    pub fn pressed(&self, button: u16) -> bool {
        self.buttons.pressed_since(self.previous_buttons).down(button)
    }
}
