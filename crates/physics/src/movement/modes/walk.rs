//! Walking on the ground and falling through the air.

use glam::Vec3;

use crate::collision::TraceResult;
use crate::movement::config::WalkConfig;
use crate::movement::state::{EyeAngles, MotionState};

use super::{ModeKind, MoveContext, MoveMode, WishSmoother};

/// Walking, running and falling.
///
/// The fallback mode: it scores its priority regardless of state.
#[derive(Debug, Clone, Default)]
pub struct WalkMode {
    pub config: WalkConfig,
    smoother: WishSmoother,
}

impl WalkMode {
    pub fn new(config: WalkConfig) -> Self {
        Self {
            config,
            smoother: WishSmoother::new(),
        }
    }

    /// Whether a surface with `normal` is shallow enough to stand on.
    pub fn is_walkable(&self, normal: Vec3) -> bool {
        Vec3::Z.angle_between(normal).to_degrees() <= self.config.ground_angle
    }
}

impl MoveMode for WalkMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Walk
    }

    fn score(&self, _state: &MotionState) -> i32 {
        self.config.priority
    }

    fn allow_grounding(&self) -> bool {
        true
    }

    fn allow_falling(&self) -> bool {
        true
    }

    fn is_standable_surface(&self, trace: &TraceResult) -> bool {
        self.is_walkable(trace.normal_or_up())
    }

    fn add_velocity(&mut self, ctx: &mut MoveContext<'_>) {
        ctx.state.replicated.wish_velocity.z = 0.0;
        ctx.shape_towards_wish();
    }

    fn pre_physics_step(&mut self, ctx: &mut MoveContext<'_>) {
        if self.config.step_up_height > 0.0 {
            let standable = |trace: &TraceResult| self.is_standable_surface(trace);
            ctx.try_step(self.config.step_up_height, &standable);
        }
    }

    fn post_physics_step(&mut self, ctx: &mut MoveContext<'_>) {
        ctx.reground(self.config.step_down_height);
    }

    fn update_move(&mut self, ctx: &mut MoveContext<'_>, eyes: EyeAngles, input: Vec3) -> Vec3 {
        let level = EyeAngles { pitch: 0.0, ..eyes };
        self.smoother.update(ctx, level.rotation(), input)
    }
}
