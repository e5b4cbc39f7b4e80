//! Player entity and state.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stride_physics::body::{BodyIntegrator, SimBody};
use stride_physics::movement::{
    CharacterController, ControllerError, ControllerEvent, EyeAngles, ModeKind,
};

use crate::config::SimulationConfig;
use crate::level::SpawnPoint;

/// Unique identifier for entities.
pub type EntityId = u32;

/// Running totals of what a player's controller reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementStats {
    pub jumps: u32,
    pub landings: u32,
    /// Largest fall distance seen on landing.
    pub longest_fall: f32,
    pub mode_switches: u32,
    pub ground_contacts: u32,
}

impl MovementStats {
    /// Fold one controller event into the totals.
    pub fn record(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Jumped => self.jumps += 1,
            ControllerEvent::Landed { distance, .. } => {
                self.landings += 1;
                self.longest_fall = self.longest_fall.max(*distance);
            }
            ControllerEvent::ModeBegin(_) => self.mode_switches += 1,
            ControllerEvent::Grounded => self.ground_contacts += 1,
            ControllerEvent::ModeEnd(_) | ControllerEvent::Ungrounded => {}
        }
    }
}

/// A player in the game.
#[derive(Debug)]
pub struct Player {
    /// Unique player ID.
    pub id: EntityId,

    /// Player name/handle.
    pub name: String,

    /// Movement controller driving this player's body.
    pub controller: CharacterController<SimBody>,

    pub stats: MovementStats,
}

impl Player {
    /// Create a new player at the given spawn point.
    pub fn new(
        id: EntityId,
        name: String,
        spawn: SpawnPoint,
        config: &SimulationConfig,
    ) -> Result<Self, ControllerError> {
        let body = SimBody::new(spawn.position).with_gravity(Vec3::NEG_Z * config.controller.gravity);
        let mut controller =
            CharacterController::new(body, config.controller.clone(), config.build_modes())?;
        controller.set_eye_angles(EyeAngles::new(0.0, spawn.facing, 0.0));

        Ok(Self {
            id,
            name,
            controller,
            stats: MovementStats::default(),
        })
    }

    /// Get the player's current feet position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.controller.body().position()
    }

    /// Get the player's eye position (for camera).
    #[inline]
    pub fn eye_position(&self) -> Vec3 {
        self.controller.eye_position()
    }

    /// Get the direction the player is looking.
    #[inline]
    pub fn look_direction(&self) -> Vec3 {
        self.controller.eye_angles().forward()
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.controller.velocity()
    }

    /// Check if the player is on the ground.
    #[inline]
    pub fn on_ground(&self) -> bool {
        self.controller.is_grounded()
    }

    #[inline]
    pub fn mode(&self) -> ModeKind {
        self.controller.active_mode()
    }

    /// Move the player to a spawn point, facing its direction.
    pub fn respawn(&mut self, spawn: SpawnPoint) {
        self.controller.teleport(spawn.position);
        self.controller.set_eye_angles(EyeAngles::new(0.0, spawn.facing, 0.0));
    }

    /// Take the controller's pending events, folding them into the stats.
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        let events = self.controller.drain_events();
        for event in &events {
            self.stats.record(event);
        }
        events
    }
}
