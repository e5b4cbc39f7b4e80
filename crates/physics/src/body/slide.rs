//! Collision response for the reference body.
//!
//! The body sweeps along its velocity and, on contact, keeps only the part of
//! the velocity that runs along every surface struck so far this step. Two
//! opposing surfaces leave the crease between them.

use glam::Vec3;

use crate::collision::{ContentFlags, TraceProvider};

use super::shape::BodyShape;

/// Surfaces remembered during one step.
const MAX_CONTACTS: usize = 5;

/// Sweeps per step.
const MAX_SWEEPS: usize = 4;

/// Pushes clipped velocity slightly off the surface so the next sweep does
/// not start touching it.
const OVERBOUNCE: f32 = 1.001;

/// Velocity heading into a contact by less than this still counts as along it.
const CONTACT_SLACK: f32 = 0.01;

/// Remove the part of `velocity` that points into a surface with `normal`.
pub fn clip_velocity(velocity: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let into = velocity.dot(normal);
    let scale = if into < 0.0 { overbounce } else { 1.0 / overbounce };
    velocity - normal * (into * scale)
}

/// Velocity that slides along all of `contacts`, if there is one.
fn resolve_contacts(velocity: Vec3, initial: Vec3, contacts: &[Vec3]) -> Option<Vec3> {
    let clear_of = |v: Vec3, skip: usize| {
        contacts
            .iter()
            .enumerate()
            .all(|(j, n)| j == skip || v.dot(*n) >= -CONTACT_SLACK)
    };

    let along_one = contacts
        .iter()
        .enumerate()
        .map(|(i, n)| (i, clip_velocity(velocity, *n, OVERBOUNCE)))
        .find(|&(i, v)| clear_of(v, i))
        .map(|(_, v)| v);
    if along_one.is_some() {
        return along_one;
    }

    let [a, b, ..] = contacts else {
        return None;
    };
    let crease = a.cross(*b).normalize_or_zero();
    let v = crease * initial.dot(crease);
    (v.dot(*a) >= -CONTACT_SLACK && v.dot(*b) >= -CONTACT_SLACK).then_some(v)
}

/// Move `position` along `velocity` for `delta_time`, sliding along whatever
/// either collider of `shape` runs into.
///
/// Returns `true` when nothing was struck. A body that starts embedded, or is
/// boxed in, loses all its velocity.
pub fn slide_move<W: TraceProvider + ?Sized>(
    world: &W,
    position: &mut Vec3,
    velocity: &mut Vec3,
    shape: &BodyShape,
    mask: ContentFlags,
    delta_time: f32,
) -> bool {
    let initial = *velocity;
    let mut contacts = Vec::with_capacity(MAX_CONTACTS);
    let mut remaining = delta_time;

    for _ in 0..MAX_SWEEPS {
        if remaining <= 0.0 || velocity.length_squared() < 1e-4 {
            return false;
        }

        let trace = shape.sweep(world, *position, *position + *velocity * remaining, mask);
        if trace.started_solid {
            *velocity = Vec3::ZERO;
            return false;
        }

        *position = trace.end_position;
        if !trace.hit_something() {
            return contacts.is_empty();
        }
        remaining *= 1.0 - trace.fraction;

        if contacts.len() < MAX_CONTACTS {
            contacts.push(trace.normal_or_up());
        }

        match resolve_contacts(*velocity, initial, &contacts) {
            Some(v) => *velocity = v,
            None => {
                *velocity = Vec3::ZERO;
                return false;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionWorld;

    fn body() -> BodyShape {
        BodyShape::new(16.0, 72.0)
    }

    #[test]
    fn test_clip_velocity_against_wall() {
        let clipped = clip_velocity(Vec3::new(10.0, 5.0, 0.0), Vec3::NEG_X, 1.0);

        assert!(clipped.x.abs() < 0.01, "Into-wall part should be gone: {clipped:?}");
        assert!((clipped.y - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_clip_velocity_floor_keeps_horizontal() {
        let clipped = clip_velocity(Vec3::new(100.0, 0.0, -20.0), Vec3::Z, OVERBOUNCE);

        assert!((clipped.x - 100.0).abs() < 0.01);
        assert!(clipped.z >= 0.0 && clipped.z < 0.1);
    }

    #[test]
    fn test_opposing_walls_leave_crease() {
        // Corner of two walls meeting along Z
        let contacts = [Vec3::NEG_X, Vec3::NEG_Y];
        let initial = Vec3::new(100.0, 100.0, 50.0);
        let v = resolve_contacts(initial, initial, &contacts).expect("crease is open");

        assert!(v.x.abs() < 0.01 && v.y.abs() < 0.01, "Only the crease survives: {v:?}");
        assert!((v.z - 50.0).abs() < 0.01);

        // Nothing to slide along
        assert_eq!(resolve_contacts(Vec3::X, Vec3::X, &[]), None);
    }

    #[test]
    fn test_slide_move_no_collision() {
        let world = CollisionWorld::new();
        let mut position = Vec3::ZERO;
        let mut velocity = Vec3::new(5.0, 0.0, 0.0);

        let clear = slide_move(&world, &mut position, &mut velocity, &body(), ContentFlags::MASK_PLAYER_SOLID, 1.0);

        assert!(clear);
        assert!((position.x - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_slide_move_along_wall() {
        let mut world = CollisionWorld::new();
        // Near face at x=50
        world.add_box(
            Vec3::new(60.0, 0.0, 64.0),
            Vec3::new(10.0, 500.0, 64.0),
            ContentFlags::SOLID,
        );

        let mut position = Vec3::new(0.0, 0.0, 1.0);
        let mut velocity = Vec3::new(100.0, 50.0, 0.0);

        let clear = slide_move(&world, &mut position, &mut velocity, &body(), ContentFlags::MASK_PLAYER_SOLID, 1.0);

        assert!(!clear);
        // The capsule is the wider collider
        let stop = 50.0 - body().upper.radius();
        assert!((position.x - stop).abs() < 0.1, "Position x={} should stop at the wall", position.x);
        assert!(position.y > 40.0, "Position y={} should have slid", position.y);
        assert!(velocity.x.abs() < 0.5);
    }
}
