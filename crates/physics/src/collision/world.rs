//! Collision world containing all solid geometry and tagged volumes.
//!
//! The collision world stores all collidable geometry and answers sweep
//! queries for the movement core through [`TraceProvider`].

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Real, Vector};
use parry3d::na::{Translation3, UnitQuaternion};
use parry3d::query::contact;
use parry3d::shape::SharedShape;

use super::flags::ContentFlags;
use super::trace::{
    ColliderInfo, ObjectId, SurfaceMaterial, SurfaceMotion, TraceProvider, TraceResult, TraceShape,
};
use super::volume::{Volume, VolumeId};

/// Penetration deeper than this counts as overlapping solid geometry.
///
/// Shapes resting exactly on a surface report a contact at (or a hair
/// below) zero distance; those must not count as "started solid".
pub const SOLID_TOLERANCE: f32 = 0.01;

/// Bisection iterations after a sampled sweep finds a blocked segment.
const SEARCH_ITERATIONS: usize = 16;

/// How a brush moves over time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BrushMotion {
    /// Never moves.
    #[default]
    Static,
    /// Moved by script at a fixed rate, carries characters at full speed.
    Kinematic { velocity: Vec3, yaw_rate: f32 },
    /// A simulated rigid body with the given mass.
    Dynamic { velocity: Vec3, mass: f32 },
}

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct CollisionBrush {
    /// Unique identifier for this brush.
    pub id: ObjectId,
    /// The collision shape.
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
    /// Content flags (solid, player clip, etc.).
    pub contents: ContentFlags,
    /// Material reported to traces that strike this brush.
    pub surface: SurfaceMaterial,
    /// Explicit friction overriding the material's.
    pub friction: Option<f32>,
    pub motion: BrushMotion,
}

impl CollisionBrush {
    fn collider_info(&self) -> ColliderInfo {
        ColliderInfo {
            friction: self.friction,
            is_dynamic: !matches!(self.motion, BrushMotion::Static),
        }
    }

    fn origin(&self) -> Vec3 {
        let t = self.transform.translation.vector;
        Vec3::new(t.x, t.y, t.z)
    }
}

/// The collision world containing all geometry.
///
/// Supports:
/// - Box brushes (axis-aligned, optionally moving or spinning)
/// - Tagged volumes that never block sweeps
#[derive(Debug, Default)]
pub struct CollisionWorld {
    /// World brushes (walls, floors, platforms).
    brushes: Vec<CollisionBrush>,
    volumes: Vec<Volume>,
    /// Next brush ID to assign.
    next_id: u32,
    next_volume_id: u32,
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis-aligned box to the world.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `contents` - Content flags for collision filtering
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: ContentFlags) -> ObjectId {
        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        let transform = Isometry::translation(center.x, center.y, center.z);
        self.push_brush(shape, transform, contents)
    }

    /// Add a non-solid tagged volume.
    pub fn add_volume(
        &mut self,
        tags: ContentFlags,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
    ) -> VolumeId {
        let id = VolumeId(self.next_volume_id);
        self.next_volume_id += 1;
        self.volumes
            .push(Volume::new(id, tags, center, half_extents).with_rotation(rotation));
        id
    }

    /// Set the material of a brush. Returns `false` if the brush doesn't exist.
    pub fn set_surface(&mut self, id: ObjectId, surface: SurfaceMaterial) -> bool {
        self.brush_mut(id).map(|b| b.surface = surface).is_some()
    }

    /// Override (or clear) the friction of a brush.
    pub fn set_friction(&mut self, id: ObjectId, friction: Option<f32>) -> bool {
        self.brush_mut(id).map(|b| b.friction = friction).is_some()
    }

    pub fn set_motion(&mut self, id: ObjectId, motion: BrushMotion) -> bool {
        self.brush_mut(id).map(|b| b.motion = motion).is_some()
    }

    /// Remove a brush. Later queries about it report it as gone.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.brushes.len();
        self.brushes.retain(|b| b.id != id);
        self.brushes.len() != before
    }

    /// Get the number of collision brushes.
    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    pub fn brush(&self, id: ObjectId) -> Option<&CollisionBrush> {
        self.brushes.iter().find(|b| b.id == id)
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// Current world-space origin of a brush.
    pub fn brush_origin(&self, id: ObjectId) -> Option<Vec3> {
        self.brush(id).map(CollisionBrush::origin)
    }

    /// Move every non-static brush along its motion for `delta_time` seconds.
    ///
    /// Rotating brushes spin around their own origin.
    pub fn advance(&mut self, delta_time: f32) {
        for brush in &mut self.brushes {
            let (velocity, yaw_rate) = match brush.motion {
                BrushMotion::Static => continue,
                BrushMotion::Kinematic { velocity, yaw_rate } => (velocity, yaw_rate),
                BrushMotion::Dynamic { velocity, .. } => (velocity, 0.0),
            };

            let step = velocity * delta_time;
            brush.transform.translation.vector += Vector::new(step.x, step.y, step.z);
            if yaw_rate != 0.0 {
                let spin = UnitQuaternion::from_axis_angle(&Vector::z_axis(), yaw_rate * delta_time);
                brush.transform.rotation = spin * brush.transform.rotation;
            }
        }
    }

    /// Collect the volumes overlapped by `shape` placed at `position`.
    pub fn touching_volumes(&self, shape: TraceShape, position: Vec3, out: &mut Vec<Volume>) {
        out.clear();
        out.extend(self.volumes.iter().filter(|v| v.overlaps(shape, position)).copied());
    }

    /// Trace a shape through the world.
    ///
    /// This is the primary collision query. It sweeps the given shape from
    /// `start` to `end` and returns information about what was hit.
    ///
    /// # Arguments
    ///
    /// * `start` - Starting position (bottom-center of shape)
    /// * `end` - Desired end position
    /// * `shape` - The shape to trace (box or capsule)
    /// * `mask` - Content flags to collide with
    pub fn trace(&self, start: Vec3, end: Vec3, shape: TraceShape, mask: ContentFlags) -> TraceResult {
        let test_shape = create_parry_shape(shape);

        if let Some(brush) = self.deepest_overlap(start, &test_shape, shape, mask) {
            return self.attribute(TraceResult::start_solid(start), brush);
        }

        let delta = end - start;
        let distance = delta.length();

        // No movement - the start position is clear
        if distance < 0.0001 {
            return TraceResult::no_hit(start, end);
        }

        // March in steps no longer than the shape's smallest half-size so
        // consecutive samples overlap and thin geometry can't be skipped.
        let step = shape.min_half_extent().max(0.5);
        let samples = (distance / step).ceil().max(1.0) as usize;

        let mut lo = 0.0_f32;
        let mut blocked = None;
        for i in 1..=samples {
            let t = i as f32 / samples as f32;
            if self.deepest_overlap(start + delta * t, &test_shape, shape, mask).is_some() {
                blocked = Some(t);
                break;
            }
            lo = t;
        }

        let Some(mut hi) = blocked else {
            return TraceResult::no_hit(start, end);
        };

        // Binary search to find collision point
        for _ in 0..SEARCH_ITERATIONS {
            let mid = (lo + hi) * 0.5;
            if self.deepest_overlap(start + delta * mid, &test_shape, shape, mask).is_some() {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let penetration_test = start + delta * hi;
        let Some(brush) = self.deepest_overlap(penetration_test, &test_shape, shape, mask) else {
            return TraceResult::no_hit(start, end);
        };

        let normal = self
            .contact_normal(penetration_test, &test_shape, shape, brush)
            .unwrap_or_else(|| -delta / distance);

        let result = TraceResult::hit(start, end, lo, normal, brush.id);
        self.attribute(result, brush)
    }

    /// Check if a shape at a position is inside solid geometry.
    pub fn point_in_solid(&self, position: Vec3, shape: TraceShape, mask: ContentFlags) -> bool {
        let test_shape = create_parry_shape(shape);
        self.deepest_overlap(position, &test_shape, shape, mask).is_some()
    }

    /// Resolve collision by pushing shape out of solid geometry.
    ///
    /// Returns the corrected position.
    pub fn resolve_penetration(&self, position: Vec3, shape: TraceShape, mask: ContentFlags) -> Vec3 {
        let test_shape = create_parry_shape(shape);
        let test_transform = shape_transform(position, shape);

        let mut correction = Vec3::ZERO;

        for brush in self.brushes.iter().filter(|b| mask.intersects(b.contents)) {
            if let Ok(Some(c)) = contact(
                &test_transform,
                test_shape.as_ref(),
                &brush.transform,
                brush.shape.as_ref(),
                0.0,
            ) {
                // normal2 points out of the brush, towards the shape
                let normal = Vec3::new(c.normal2.x, c.normal2.y, c.normal2.z);
                let depth = -c.dist;
                if depth > 0.0 {
                    correction += normal * (depth + SOLID_TOLERANCE * 0.5);
                }
            }
        }

        position + correction
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn push_brush(
        &mut self,
        shape: SharedShape,
        transform: Isometry<Real>,
        contents: ContentFlags,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        self.brushes.push(CollisionBrush {
            id,
            shape,
            transform,
            contents,
            surface: SurfaceMaterial::DEFAULT,
            friction: None,
            motion: BrushMotion::Static,
        });

        id
    }

    fn brush_mut(&mut self, id: ObjectId) -> Option<&mut CollisionBrush> {
        self.brushes.iter_mut().find(|b| b.id == id)
    }

    /// Brush penetrated deepest by the shape at `position`, if any exceeds
    /// the solid tolerance.
    fn deepest_overlap(
        &self,
        position: Vec3,
        test_shape: &SharedShape,
        shape: TraceShape,
        mask: ContentFlags,
    ) -> Option<&CollisionBrush> {
        let test_transform = shape_transform(position, shape);
        let mut deepest: Option<(f32, &CollisionBrush)> = None;

        for brush in self.brushes.iter().filter(|b| mask.intersects(b.contents)) {
            let Ok(Some(c)) = contact(
                &test_transform,
                test_shape.as_ref(),
                &brush.transform,
                brush.shape.as_ref(),
                0.0,
            ) else {
                continue;
            };

            let depth = -c.dist;
            if depth > SOLID_TOLERANCE && deepest.map_or(true, |(d, _)| depth > d) {
                deepest = Some((depth, brush));
            }
        }

        deepest.map(|(_, brush)| brush)
    }

    fn contact_normal(
        &self,
        position: Vec3,
        test_shape: &SharedShape,
        shape: TraceShape,
        brush: &CollisionBrush,
    ) -> Option<Vec3> {
        let c = contact(
            &shape_transform(position, shape),
            test_shape.as_ref(),
            &brush.transform,
            brush.shape.as_ref(),
            0.0,
        )
        .ok()??;
        Some(Vec3::new(c.normal2.x, c.normal2.y, c.normal2.z))
    }

    fn attribute(&self, mut result: TraceResult, brush: &CollisionBrush) -> TraceResult {
        result.object = Some(brush.id);
        result.surface = brush.surface;
        result.collider = Some(brush.collider_info());
        result
    }
}

impl TraceProvider for CollisionWorld {
    fn sweep(&self, shape: TraceShape, from: Vec3, to: Vec3, filter: ContentFlags) -> TraceResult {
        self.trace(from, to, shape, filter)
    }

    fn surface_motion(&self, object: ObjectId, point: Vec3) -> Option<SurfaceMotion> {
        let brush = self.brush(object)?;
        let motion = match brush.motion {
            BrushMotion::Static => SurfaceMotion::default(),
            BrushMotion::Kinematic { velocity, yaw_rate } => {
                // v + w x r with w along +Z
                let r = point - brush.origin();
                let spin = Vec3::new(-yaw_rate * r.y, yaw_rate * r.x, 0.0);
                SurfaceMotion {
                    velocity: velocity + spin,
                    yaw_rate,
                    mass: None,
                }
            }
            BrushMotion::Dynamic { velocity, mass } => SurfaceMotion {
                velocity,
                yaw_rate: 0.0,
                mass: Some(mass),
            },
        };
        Some(motion)
    }
}

/// Create a parry3d shape from our TraceShape.
fn create_parry_shape(shape: TraceShape) -> SharedShape {
    match shape {
        TraceShape::Capsule { radius, height } => {
            // Parry capsule is defined by half-height of the cylinder part
            let cylinder_half_height = (height - 2.0 * radius).max(0.0) / 2.0;
            SharedShape::capsule_z(cylinder_half_height, radius)
        }
        TraceShape::Box { half_extents } => {
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
    }
}

/// Create transform for a shape at a position.
fn shape_transform(position: Vec3, shape: TraceShape) -> Isometry<Real> {
    // Position is at the bottom-center of the shape
    let offset_z = shape.height() * 0.5;
    Isometry::from_parts(
        Translation3::new(position.x, position.y, position.z + offset_z),
        UnitQuaternion::identity(),
    )
}

// ============================================================================
// Tests
// ============================================================================
