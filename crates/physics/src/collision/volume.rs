//! Non-solid tagged volumes (water, ladders, triggers).
//!
//! Volumes never block sweeps. Bodies report the volumes they overlap and
//! movement modes pick out the ones carrying the tags they care about.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Real, Vector};
use parry3d::na::{Quaternion, Translation3, UnitQuaternion};
use parry3d::query::intersection_test;
use parry3d::shape::Cuboid;
use serde::{Deserialize, Serialize};

use super::flags::ContentFlags;
use super::trace::TraceShape;

/// Identifier of a volume in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeId(pub u32);

/// An oriented box carrying content tags.
///
/// The rotation gives the volume its own axes: for a ladder, local `+X` is
/// the direction a climber faces to look at the ladder and local `+Z` is
/// the climb direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: VolumeId,
    pub tags: ContentFlags,
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
}

/// A volume as reported by a body that currently overlaps it.
pub type TouchingVolume = Volume;

impl Volume {
    /// Axis-aligned volume.
    pub fn new(id: VolumeId, tags: ContentFlags, center: Vec3, half_extents: Vec3) -> Self {
        Self {
            id,
            tags,
            center,
            half_extents,
            rotation: Quat::IDENTITY,
        }
    }

    /// Same volume with a rotation applied.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn has_any(&self, tags: ContentFlags) -> bool {
        self.tags.intersects(tags)
    }

    /// Local `+X` of the volume in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Local `+Z` of the volume in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Closest point on or inside the volume to `point`.
    ///
    /// Points inside the volume are returned unchanged.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let inverse = self.rotation.inverse();
        let local = inverse * (point - self.center);
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        self.center + self.rotation * clamped
    }

    /// Whether `shape` placed at `position` (bottom-center) overlaps this volume.
    pub fn overlaps(&self, shape: TraceShape, position: Vec3) -> bool {
        let (min, max) = shape.bounds();
        let half = (max - min) * 0.5;
        let body_center = position + Vec3::new(0.0, 0.0, half.z);
        let body = Cuboid::new(Vector::new(half.x, half.y, half.z));
        let body_iso = Isometry::translation(body_center.x, body_center.y, body_center.z);

        let volume = Cuboid::new(Vector::new(
            self.half_extents.x,
            self.half_extents.y,
            self.half_extents.z,
        ));

        // A malformed shape pair simply doesn't count as touching.
        intersection_test(&body_iso, &body, &self.isometry(), &volume).unwrap_or(false)
    }

    fn isometry(&self) -> Isometry<Real> {
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
            self.rotation.w,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ));
        Isometry::from_parts(
            Translation3::new(self.center.x, self.center.y, self.center.z),
            rotation,
        )
    }
}

/// Fraction of the segment `a -> b` at which `point` projects, clamped to `0..=1`.
pub fn inverse_lerp(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return 0.0;
    }
    ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0)
}
