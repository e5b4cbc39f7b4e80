//! Player input handling.
//!
//! This module converts raw input (keyboard, mouse) into move commands for
//! the character controller.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stride_physics::movement::{CommandButtons, MoveCommand};

/// Radians of view rotation per pixel of mouse motion at sensitivity 1.
const RADIANS_PER_PIXEL: f32 = 0.001;

/// Raw player input for a single tick.
///
/// This is the input format received from the client input system.
/// It gets converted to [`MoveCommand`] for the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Movement keys pressed.
    pub movement: MovementInput,

    /// Mouse delta this tick (pixels, `+y` is down).
    pub mouse_delta: (f32, f32),

    /// Action buttons pressed.
    pub actions: ActionInput,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub jump: bool,
    pub duck: bool,
    pub run: bool,
    pub use_item: bool,
}

impl PlayerInput {
    /// Input that only holds the forward key.
    pub fn forward() -> Self {
        Self {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Convert to a move command.
    ///
    /// # Arguments
    ///
    /// * `mouse_sensitivity` - Mouse sensitivity multiplier
    pub fn to_command(&self, mouse_sensitivity: f32) -> MoveCommand {
        let mut cmd = MoveCommand::default();

        // View space: x forward, y left
        let mut analog = Vec3::ZERO;
        if self.movement.forward {
            analog.x += 1.0;
        }
        if self.movement.backward {
            analog.x -= 1.0;
        }
        if self.movement.left {
            analog.y += 1.0;
        }
        if self.movement.right {
            analog.y -= 1.0;
        }
        cmd.analog_move = analog.clamp_length_max(1.0);

        // Mouse down looks down, mouse right turns right (clockwise from above)
        let sensitivity_radians = mouse_sensitivity * RADIANS_PER_PIXEL;
        cmd.view_delta = (
            self.mouse_delta.1 * sensitivity_radians,
            -self.mouse_delta.0 * sensitivity_radians,
        );

        if self.actions.jump {
            cmd.buttons.press(CommandButtons::JUMP);
        }
        if self.actions.duck {
            cmd.buttons.press(CommandButtons::DUCK);
        }
        if self.actions.run {
            cmd.buttons.press(CommandButtons::RUN);
        }
        if self.actions.use_item {
            cmd.buttons.press(CommandButtons::USE);
        }

        cmd
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        self.movement.forward || self.movement.backward || self.movement.left || self.movement.right
    }
}
