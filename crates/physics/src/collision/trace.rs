//! Trace results, shapes and the trace provider contract.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::ContentFlags;

/// Identifier of a collidable object in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Broad family of a surface, for gameplay that cares (footsteps, decals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceKind {
    #[default]
    Default,
    Concrete,
    Metal,
    Wood,
    Dirt,
    Ice,
}

/// Physical material of a struck surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub kind: SurfaceKind,
    /// Friction coefficient of the material.
    pub friction: f32,
}

impl SurfaceMaterial {
    pub const DEFAULT: Self = Self { kind: SurfaceKind::Default, friction: 0.8 };
    pub const CONCRETE: Self = Self { kind: SurfaceKind::Concrete, friction: 0.9 };
    pub const METAL: Self = Self { kind: SurfaceKind::Metal, friction: 0.6 };
    pub const WOOD: Self = Self { kind: SurfaceKind::Wood, friction: 0.7 };
    pub const DIRT: Self = Self { kind: SurfaceKind::Dirt, friction: 1.0 };
    pub const ICE: Self = Self { kind: SurfaceKind::Ice, friction: 0.02 };
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-collider overrides reported alongside a hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderInfo {
    /// Explicit friction that replaces the material's friction when set.
    pub friction: Option<f32>,
    /// Whether the collider can move.
    pub is_dynamic: bool,
}

/// How a surface is moving at a given point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceMotion {
    /// Linear velocity of the surface at the queried point.
    pub velocity: Vec3,
    /// Rotation rate around world up (radians/second).
    pub yaw_rate: f32,
    /// Mass of the surface if it is a simulated rigid body.
    ///
    /// `None` for kinematic movers, which carry characters at full velocity.
    pub mass: Option<f32>,
}

/// Result of sweeping a shape through the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    /// How far along the sweep we got before hitting something.
    ///
    /// - `1.0` = traveled the full distance (no collision)
    /// - `0.0` = hit something immediately at start
    pub fraction: f32,

    /// Distance traveled before the hit (`fraction * sweep length`).
    pub distance: f32,

    /// Where the sweep started.
    pub start_position: Vec3,

    /// Final position of the shape after the sweep.
    pub end_position: Vec3,

    /// Surface normal at the impact point, pointing away from the surface.
    pub normal: Option<Vec3>,

    /// The sweep started already overlapping solid geometry.
    pub started_solid: bool,

    /// Material of the struck surface.
    pub surface: SurfaceMaterial,

    /// Object that was struck.
    pub object: Option<ObjectId>,

    /// Collider overrides of the struck object.
    pub collider: Option<ColliderInfo>,
}

impl Default for TraceResult {
    fn default() -> Self {
        Self::no_hit(Vec3::ZERO, Vec3::ZERO)
    }
}

impl TraceResult {
    /// A sweep that traveled the full distance.
    pub fn no_hit(start: Vec3, end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            distance: (end - start).length(),
            start_position: start,
            end_position: end,
            normal: None,
            started_solid: false,
            surface: SurfaceMaterial::DEFAULT,
            object: None,
            collider: None,
        }
    }

    /// A sweep that struck `object` part way.
    pub fn hit(start: Vec3, end: Vec3, fraction: f32, normal: Vec3, object: ObjectId) -> Self {
        let end_position = start + (end - start) * fraction;
        Self {
            fraction,
            distance: (end_position - start).length(),
            start_position: start,
            end_position,
            normal: Some(normal),
            started_solid: false,
            surface: SurfaceMaterial::DEFAULT,
            object: Some(object),
            collider: None,
        }
    }

    /// A sweep that could not start because the shape was already embedded.
    pub fn start_solid(start: Vec3) -> Self {
        Self {
            fraction: 0.0,
            distance: 0.0,
            start_position: start,
            end_position: start,
            normal: Some(Vec3::Z),
            started_solid: true,
            surface: SurfaceMaterial::DEFAULT,
            object: None,
            collider: None,
        }
    }

    /// Check if this sweep hit something.
    #[inline]
    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0
    }

    /// Get the hit normal, defaulting to up if none.
    #[inline]
    pub fn normal_or_up(&self) -> Vec3 {
        self.normal.unwrap_or(Vec3::Z)
    }
}

/// Shape used for collision sweeps.
///
/// Every shape is anchored at its bottom-center: a sweep "at" a position puts
/// the feet of the shape on that position, matching how character positions
/// are stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraceShape {
    /// A vertical (Z-aligned) capsule.
    Capsule {
        /// Radius of the capsule cylinder and end caps.
        radius: f32,
        /// Total height from bottom of lower cap to top of upper cap.
        height: f32,
    },

    /// An axis-aligned box.
    Box {
        /// Half-size in each axis (x, y, z).
        half_extents: Vec3,
    },
}

impl TraceShape {
    /// Axis-aligned box with a square footprint, standing on its origin.
    pub fn upright_box(half_width: f32, height: f32) -> Self {
        Self::Box {
            half_extents: Vec3::new(half_width, half_width, height * 0.5),
        }
    }

    /// Get the effective horizontal radius of this shape.
    pub fn radius(&self) -> f32 {
        match self {
            Self::Capsule { radius, .. } => *radius,
            Self::Box { half_extents } => half_extents.x.max(half_extents.y),
        }
    }

    /// Get the height of this shape.
    pub fn height(&self) -> f32 {
        match self {
            Self::Capsule { height, .. } => *height,
            Self::Box { half_extents } => half_extents.z * 2.0,
        }
    }

    /// Smallest half-size of the shape, used to pick a sampling step.
    pub fn min_half_extent(&self) -> f32 {
        match self {
            Self::Capsule { radius, height } => radius.min(height * 0.5),
            Self::Box { half_extents } => half_extents.min_element(),
        }
    }

    /// Bounds of the shape relative to its anchor (bottom-center).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let r = self.radius();
        (Vec3::new(-r, -r, 0.0), Vec3::new(r, r, self.height()))
    }
}

/// Geometric queries the movement core needs from the world.
///
/// Implementations must answer synchronously. A query that cannot be
/// answered should report "no hit" / `None` rather than block.
pub trait TraceProvider {
    /// Sweep `shape` from `from` to `to`, colliding with geometry in `filter`.
    fn sweep(&self, shape: TraceShape, from: Vec3, to: Vec3, filter: ContentFlags) -> TraceResult;

    /// Motion of `object` at `point`, or `None` if the object no longer exists.
    fn surface_motion(&self, object: ObjectId, point: Vec3) -> Option<SurfaceMotion>;
}

impl<T: TraceProvider + ?Sized> TraceProvider for &T {
    fn sweep(&self, shape: TraceShape, from: Vec3, to: Vec3, filter: ContentFlags) -> TraceResult {
        (**self).sweep(shape, from, to, filter)
    }

    fn surface_motion(&self, object: ObjectId, point: Vec3) -> Option<SurfaceMotion> {
        (**self).surface_motion(object, point)
    }
}
