//! Stride Game Host
//!
//! This crate hosts the movement core in a small deterministic game loop:
//!
//! - Simulation configuration loaded from TOML
//! - Player input mapping to move commands
//! - A test course with stairs, water, a ladder and a turntable
//! - Scripted tours that drive a player through the course
//!
//! # Architecture
//!
//! All state updates are driven by player input and a fixed timestep.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Game Simulation                        │
//! │  ┌─────────┐    ┌──────────────┐    ┌──────────────────────┐ │
//! │  │ Input   │───►│ Controller   │───►│ Body integrator      │ │
//! │  │ Commands│    │ (fixed       │    │ (physics step around │ │
//! │  └─────────┘    │  update)     │    │  pre/post hooks)     │ │
//! │                 └──────────────┘    └──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod input;
pub mod level;
pub mod player;
pub mod simulation;
pub mod tour;

// Re-export main types
pub use config::{SimulationConfig, SimulationConfigError};
pub use input::PlayerInput;
pub use level::{Level, SpawnPoint};
pub use player::{EntityId, MovementStats, Player};
pub use simulation::{PlayerSnapshot, Simulation};
pub use tour::{run_tour, LegReport, TourLeg, TourReport};

// Re-export physics types for convenience
pub use stride_physics::{
    CharacterController, CollisionWorld, ContentFlags, ControllerConfig, ControllerEvent, ModeKind, MoveCommand,
    TraceResult, TraceShape,
};
