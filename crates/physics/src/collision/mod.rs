//! Collision queries for character movement.
//!
//! The movement core only talks to the world through [`TraceProvider`]:
//! sweep a shape between two points, and ask how a struck object is moving.
//! [`CollisionWorld`] is the parry3d-backed implementation used by the game
//! crate and the tests.
//!
//! # Key Types
//!
//! - [`TraceProvider`]: The query contract
//! - [`TraceResult`]: Output from a collision trace
//! - [`TraceShape`]: Shape used for tracing (box or capsule)
//! - [`Volume`]: Non-solid tagged region (water, ladder)
//!
//! # Tracing Algorithm
//!
//! Traces sweep a shape through the world and return:
//! - How far the shape traveled (fraction 0.0-1.0 and distance)
//! - The final position
//! - Surface normal, material and object at impact (if any)
//! - Whether the shape started embedded in solid geometry

mod flags;
mod trace;
mod volume;
mod world;

pub use flags::ContentFlags;
pub use trace::{
    ColliderInfo, ObjectId, SurfaceKind, SurfaceMaterial, SurfaceMotion, TraceProvider,
    TraceResult, TraceShape,
};
pub use volume::{inverse_lerp, TouchingVolume, Volume, VolumeId};
pub use world::{BrushMotion, CollisionBrush, CollisionWorld, SOLID_TOLERANCE};
