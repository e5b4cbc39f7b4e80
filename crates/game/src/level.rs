//! Level loading and management.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use stride_physics::collision::{BrushMotion, CollisionWorld, ContentFlags, ObjectId, SurfaceMaterial};

/// A game level containing collision geometry and spawn points.
#[derive(Debug)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world for physics.
    pub collision: CollisionWorld,

    /// Player spawn points.
    pub spawn_points: Vec<SpawnPoint>,
}

/// A spawn point for players.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Feet position in world space.
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,
}

impl SpawnPoint {
    pub fn new(position: Vec3, facing: f32) -> Self {
        Self { position, facing }
    }
}

/// Landmarks of [`Level::test_course`].
pub mod course {
    use glam::Vec3;

    /// Where the stairs begin along `+X`.
    pub const STAIRS_START: f32 = 200.0;
    pub const STEP_HEIGHT: f32 = 10.0;
    pub const STEP_DEPTH: f32 = 32.0;
    pub const STEP_COUNT: usize = 6;
    /// Far end of the landing at the top of the stairs.
    pub const LANDING_END: f32 = 700.0;

    /// Water tank along `-Y`, from the floor up to [`POOL_DEPTH`].
    pub const POOL_CENTER: Vec3 = Vec3::new(0.0, -450.0, 0.0);
    pub const POOL_HALF_SIZE: Vec3 = Vec3::new(128.0, 150.0, 0.0);
    pub const POOL_DEPTH: f32 = 100.0;

    /// Ladder along `-X`, up the face of a ledge.
    pub const LADDER_X: f32 = -300.0;
    pub const LEDGE_HEIGHT: f32 = 256.0;

    /// Turntable along `+Y`.
    pub const TURNTABLE_CENTER: Vec3 = Vec3::new(0.0, 450.0, 0.0);
    pub const TURNTABLE_HEIGHT: f32 = 8.0;
    pub const TURNTABLE_YAW_RATE: f32 = 0.5;
}

impl Level {
    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            collision: CollisionWorld::new(),
            spawn_points: Vec::new(),
        }
    }

    /// A small course that exercises every movement mode.
    ///
    /// From the spawn at the origin: stairs up to a landing along `+X`, a
    /// water tank along `-Y`, a ladder up a ledge along `-X` and a turntable
    /// along `+Y`. The floor top is at `z = 0`.
    pub fn test_course() -> Self {
        use course::*;

        let mut level = Self::new("test_course", "Test Course");
        let world = &mut level.collision;

        // Floor
        let floor = world.add_box(
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::new(2048.0, 2048.0, 8.0),
            ContentFlags::SOLID,
        );
        world.set_surface(floor, SurfaceMaterial::CONCRETE);

        // Stairs, each step a block running to the far end of the landing
        for i in 0..STEP_COUNT {
            let start = STAIRS_START + STEP_DEPTH * i as f32;
            let top = STEP_HEIGHT * (i + 1) as f32;
            let step = world.add_box(
                Vec3::new((start + LANDING_END) * 0.5, 0.0, top * 0.5),
                Vec3::new((LANDING_END - start) * 0.5, 128.0, top * 0.5),
                ContentFlags::SOLID,
            );
            world.set_surface(step, SurfaceMaterial::WOOD);
        }

        // Boundary wall behind the landing
        world.add_box(
            Vec3::new(LANDING_END + 8.0, 0.0, 128.0),
            Vec3::new(8.0, 512.0, 128.0),
            ContentFlags::SOLID,
        );

        // Water tank
        world.add_volume(
            ContentFlags::WATER,
            POOL_CENTER + Vec3::Z * (POOL_DEPTH * 0.5),
            POOL_HALF_SIZE + Vec3::Z * (POOL_DEPTH * 0.5),
            Quat::IDENTITY,
        );

        // Ledge with a ladder on its face
        world.add_box(
            Vec3::new(LADDER_X - 64.0, 0.0, LEDGE_HEIGHT * 0.5),
            Vec3::new(60.0, 64.0, LEDGE_HEIGHT * 0.5),
            ContentFlags::SOLID,
        );
        world.add_volume(
            ContentFlags::LADDER,
            Vec3::new(LADDER_X, 0.0, LEDGE_HEIGHT * 0.5),
            Vec3::new(4.0, 24.0, LEDGE_HEIGHT * 0.5),
            Quat::IDENTITY,
        );

        level.add_turntable(TURNTABLE_CENTER, 64.0, TURNTABLE_HEIGHT, TURNTABLE_YAW_RATE);

        level.spawn_points.push(SpawnPoint::new(Vec3::ZERO, 0.0));
        level
            .spawn_points
            .push(SpawnPoint::new(Vec3::new(0.0, 64.0, 0.0), std::f32::consts::FRAC_PI_2));

        level
    }

    /// Add a square platform spinning around world up.
    pub fn add_turntable(&mut self, center: Vec3, half_width: f32, height: f32, yaw_rate: f32) -> ObjectId {
        let id = self.collision.add_box(
            center + Vec3::Z * (height * 0.5),
            Vec3::new(half_width, half_width, height * 0.5),
            ContentFlags::SOLID,
        );
        self.collision.set_surface(id, SurfaceMaterial::METAL);
        self.collision.set_motion(
            id,
            BrushMotion::Kinematic {
                velocity: Vec3::ZERO,
                yaw_rate,
            },
        );
        id
    }

    /// Get a player spawn point.
    pub fn get_player_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }

    /// Get the number of player spawn points.
    pub fn player_spawn_count(&self) -> usize {
        self.spawn_points.len()
    }

    /// Move the kinematic parts of the level forward in time.
    pub fn advance(&mut self, delta_time: f32) {
        self.collision.advance(delta_time);
    }
}
