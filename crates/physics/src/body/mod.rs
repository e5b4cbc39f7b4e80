//! The physical body a character controller drives.
//!
//! The controller never integrates motion itself. It reads and writes the
//! body through [`BodyIntegrator`], and a physics step supplied by the host
//! moves the body between the controller's pre- and post-step hooks.
//! [`SimBody`] is a small reference integrator built on the collision world.

mod shape;
mod sim;
mod slide;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::TouchingVolume;

pub use shape::BodyShape;
pub use sim::{SimBody, DEFAULT_GRAVITY};
pub use slide::{clip_velocity, slide_move};

/// Physical properties the controller re-applies to the body every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyProperties {
    /// Whether world gravity acts on the body.
    pub gravity: bool,
    /// Linear velocity damping (1/seconds).
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub mass: f32,
    /// Height of the center of mass above the feet.
    pub mass_center_height: f32,
    /// Friction of the feet against whatever they rest on.
    ///
    /// Zero while the controller wants to slide freely, large while braking.
    pub feet_friction: f32,
    /// Collision radius of the body.
    pub radius: f32,
    /// Collision height of the body (changes while ducking).
    pub height: f32,
}

impl Default for BodyProperties {
    fn default() -> Self {
        Self {
            gravity: true,
            linear_damping: 0.0,
            angular_damping: 1.0,
            mass: 500.0,
            mass_center_height: 36.0,
            feet_friction: 0.0,
            radius: 16.0,
            height: 72.0,
        }
    }
}

/// Access to the rigid body that carries a character.
pub trait BodyIntegrator {
    /// World position of the body's feet.
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);

    fn properties(&self) -> &BodyProperties;
    fn set_properties(&mut self, properties: BodyProperties);

    /// Whether the body is at rest and skipped by the physics step.
    fn is_sleeping(&self) -> bool;
    /// Clear any rest state so the next physics step moves the body.
    fn wake(&mut self);

    /// Tagged volumes the body overlapped after the last physics step.
    fn touching_volumes(&self) -> &[TouchingVolume];
}
