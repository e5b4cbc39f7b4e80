//! Game simulation - the fixed-step host loop.
//!
//! The simulation owns the level and the players and advances them in lock
//! step. Each tick moves the level's kinematic brushes, then gives every
//! player a fixed update followed by one physics step around the body
//! integrator. Given the same inputs two simulations produce identical
//! results.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stride_physics::movement::{ControllerError, ControllerEvent, EyeAngles};

use crate::config::SimulationConfig;
use crate::input::PlayerInput;
use crate::level::{Level, SpawnPoint};
use crate::player::{EntityId, Player};

/// What a frame reader (renderer, recorder) needs about one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub eye_position: Vec3,
    pub eye_angles: EyeAngles,
    pub mode: String,
    pub grounded: bool,
}

/// The main game simulation.
///
/// This contains all game state and advances it deterministically based on
/// player inputs.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    /// All players in the game.
    pub players: Vec<Player>,

    /// Next entity ID to assign.
    next_entity_id: EntityId,
}

impl Simulation {
    /// Create a new simulation with the given configuration and level.
    pub fn new(config: SimulationConfig, level: Level) -> Self {
        Self {
            frame: 0,
            config,
            level,
            players: Vec::new(),
            next_entity_id: 1,
        }
    }

    /// Create a simulation with default configuration and the test course.
    pub fn test() -> Self {
        Self::new(SimulationConfig::default(), Level::test_course())
    }

    /// Add a player to the simulation at the next free spawn point.
    ///
    /// Returns the player's ID.
    pub fn add_player(&mut self, name: &str) -> Result<EntityId, ControllerError> {
        let spawn_index = self.players.len() % self.level.player_spawn_count().max(1);
        let spawn = self
            .level
            .get_player_spawn(spawn_index)
            .copied()
            .unwrap_or_else(|| SpawnPoint::new(Vec3::ZERO, 0.0));

        let id = self.next_entity_id;
        let player = Player::new(id, name.to_string(), spawn, &self.config)?;
        self.next_entity_id += 1;

        log::info!("player {} '{}' joined at {:?}", id, name, spawn.position);
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player from the simulation.
    pub fn remove_player(&mut self, player_id: EntityId) {
        self.players.retain(|p| p.id != player_id);
    }

    /// Get a player by ID.
    pub fn get_player(&self, player_id: EntityId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Get a mutable reference to a player by ID.
    pub fn get_player_mut(&mut self, player_id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Advance the simulation by one tick.
    ///
    /// Returns the controller events raised this tick, tagged with the player
    /// that raised them.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Player inputs indexed by player position in the `players` array
    pub fn tick(&mut self, inputs: &[PlayerInput]) -> Vec<(EntityId, ControllerEvent)> {
        let delta_time = self.config.delta_time();
        let mut events = Vec::new();

        self.level.advance(delta_time);
        let world = &self.level.collision;

        for (i, player) in self.players.iter_mut().enumerate() {
            // Missing input means nothing held
            let command = inputs
                .get(i)
                .map(|input| input.to_command(self.config.mouse_sensitivity))
                .unwrap_or_default();

            player.controller.fixed_update(&command, world, delta_time);
            player
                .controller
                .physics_tick(world, delta_time, |body| body.integrate(world, delta_time));

            for event in player.drain_events() {
                log::debug!("frame {} player {}: {:?}", self.frame, player.id, event);
                events.push((player.id, event));
            }
        }

        self.frame += 1;
        events
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }

    /// Capture every player's presentable state.
    pub fn snapshot(&self) -> Vec<PlayerSnapshot> {
        self.players
            .iter()
            .map(|p| PlayerSnapshot {
                id: p.id,
                position: p.position(),
                velocity: p.velocity(),
                eye_position: p.eye_position(),
                eye_angles: p.controller.eye_angles(),
                mode: p.mode().to_string(),
                grounded: p.on_ground(),
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
