//! Stride Movement Core
//!
//! A character-movement core for fixed-tick simulations. It turns look and
//! move input plus world geometry queries into the velocity, orientation and
//! locomotion state of a physical body, with movement modes (walking,
//! swimming, climbing) that hand control to one another.
//!
//! # Architecture
//!
//! The crate is split into three systems:
//!
//! - **Collision**: Sweeps boxes and capsules through the world, returns hit information
//! - **Body**: The rigid body a controller drives, behind [`BodyIntegrator`]
//! - **Movement**: Mode selection, ground and step resolution, velocity shaping
//!
//! # Coordinates
//!
//! `+Z` is up. Positions are the feet of the body. Config angles are degrees,
//! view angles are radians.

pub mod body;
pub mod collision;
pub mod movement;

// Re-export commonly used types
pub use body::{BodyIntegrator, BodyProperties, BodyShape, SimBody};
pub use collision::{
    BrushMotion, CollisionWorld, ContentFlags, ObjectId, SurfaceMaterial, TraceProvider, TraceResult, TraceShape,
    Volume,
};
pub use movement::{
    Authority, CharacterController, CommandButtons, ControllerConfig, ControllerError, ControllerEvent, EyeAngles,
    ModeKind, MoveCommand, MoveMode,
};
