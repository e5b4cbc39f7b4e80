//! The pair of colliders a body carries.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec3;

use crate::collision::{CollisionWorld, ContentFlags, TouchingVolume, TraceProvider, TraceResult, TraceShape};

/// Where the capsule's lower cap starts, as a fraction of its radius below
/// half the body height.
const CAPSULE_OVERLAP: f32 = 0.2;

/// A capsule around the upper body standing on a box around the feet.
///
/// The feet box is what rests on the ground. The capsule is wider than the
/// box and rounds off the torso against walls and ledges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyShape {
    pub feet: TraceShape,
    pub upper: TraceShape,
    /// Height of the capsule's lowest point above the feet.
    pub upper_base: f32,
}

impl BodyShape {
    /// Colliders for a body of the given radius and height.
    ///
    /// The feet box is `radius` wide and half the body tall. The capsule has
    /// radius `radius·√2/2` and reaches the top of the body.
    pub fn new(radius: f32, height: f32) -> Self {
        let half_height = height * 0.5;
        let capsule_radius = radius * FRAC_1_SQRT_2;

        let base = (half_height - capsule_radius * CAPSULE_OVERLAP)
            .min(height - 2.0 * capsule_radius)
            .max(0.0);

        Self {
            feet: TraceShape::upright_box(radius * 0.5, half_height),
            upper: TraceShape::Capsule {
                radius: capsule_radius,
                height: height - base,
            },
            upper_base: base,
        }
    }

    fn lift(&self) -> Vec3 {
        Vec3::Z * self.upper_base
    }

    /// Sweep both colliders and report whichever is stopped first.
    ///
    /// Positions in the result are feet positions.
    pub fn sweep<W: TraceProvider + ?Sized>(&self, world: &W, from: Vec3, to: Vec3, mask: ContentFlags) -> TraceResult {
        let feet = world.sweep(self.feet, from, to, mask);
        if feet.started_solid {
            return feet;
        }

        let lift = self.lift();
        let mut upper = world.sweep(self.upper, from + lift, to + lift, mask);
        if !upper.started_solid && upper.fraction >= feet.fraction {
            return feet;
        }
        upper.start_position -= lift;
        upper.end_position -= lift;
        upper
    }

    /// Whether either collider overlaps solid geometry with feet at `position`.
    pub fn is_embedded(&self, world: &CollisionWorld, position: Vec3, mask: ContentFlags) -> bool {
        world.point_in_solid(position, self.feet, mask)
            || world.point_in_solid(position + self.lift(), self.upper, mask)
    }

    /// Push the feet and then the capsule out of solid geometry.
    pub fn push_out(&self, world: &CollisionWorld, position: Vec3, mask: ContentFlags) -> Vec3 {
        let lift = self.lift();
        let position = world.resolve_penetration(position, self.feet, mask);
        world.resolve_penetration(position + lift, self.upper, mask) - lift
    }

    /// Volumes overlapped by either collider, each listed once.
    pub fn touching_volumes(&self, world: &CollisionWorld, position: Vec3, out: &mut Vec<TouchingVolume>) {
        world.touching_volumes(self.feet, position, out);

        let mut upper = Vec::new();
        world.touching_volumes(self.upper, position + self.lift(), &mut upper);
        for volume in upper {
            if !out.iter().any(|v| v.id == volume.id) {
                out.push(volume);
            }
        }
    }
}
