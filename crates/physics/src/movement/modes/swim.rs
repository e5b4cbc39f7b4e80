//! Swimming in water volumes.
//!
//! The water level comes from the volumes the body touches, measured as a
//! fraction of the way from the feet to the top of the head.

use glam::Vec3;

use crate::body::BodyProperties;
use crate::collision::{inverse_lerp, ContentFlags};
use crate::movement::config::{ControllerConfig, SwimConfig};
use crate::movement::state::{CommandButtons, EyeAngles, MotionState};

use super::{ModeKind, MoveContext, MoveMode, WishSmoother, SCORE_DISQUALIFIED};

/// Swimming through water volumes.
///
/// Takes over once the body is submerged past the swim level. Gravity is off
/// while swimming and jump swims upwards.
#[derive(Debug, Clone, Default)]
pub struct SwimMode {
    pub config: SwimConfig,
    water_level: f32,
    smoother: WishSmoother,
}

impl SwimMode {
    pub fn new(config: SwimConfig) -> Self {
        Self {
            config,
            water_level: 0.0,
            smoother: WishSmoother::new(),
        }
    }

    /// Fraction of the body below the water surface, in hundredths.
    pub fn water_level(&self) -> f32 {
        self.water_level
    }
}

impl MoveMode for SwimMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Swim
    }

    fn score(&self, _state: &MotionState) -> i32 {
        if self.water_level > self.config.swim_level {
            self.config.priority
        } else {
            SCORE_DISQUALIFIED
        }
    }

    fn configure_body(&self, _state: &MotionState, _config: &ControllerConfig, props: &mut BodyProperties) {
        props.gravity = false;
        props.linear_damping = self.config.damping;
        props.angular_damping = 1.0;
    }

    fn on_enter(&mut self, ctx: &mut MoveContext<'_>) {
        ctx.state.is_swimming = true;
    }

    fn on_exit(&mut self, _next: &dyn MoveMode, ctx: &mut MoveContext<'_>) {
        ctx.state.is_swimming = false;
        if ctx.button_down(CommandButtons::JUMP) {
            ctx.jump(Vec3::Z * self.config.exit_jump_speed);
        }
    }

    fn update_move(&mut self, ctx: &mut MoveContext<'_>, eyes: EyeAngles, mut input: Vec3) -> Vec3 {
        if ctx.button_down(CommandButtons::JUMP) {
            input += Vec3::Z;
        }
        self.smoother.update(ctx, eyes.rotation(), input)
    }

    fn sense(&mut self, ctx: &mut MoveContext<'_>) {
        let feet = ctx.body.position();
        let head = feet + Vec3::Z * ctx.dims().height;

        self.water_level = ctx
            .body
            .touching_volumes()
            .iter()
            .filter(|volume| volume.has_any(ContentFlags::WATER))
            .map(|volume| {
                let level = inverse_lerp(volume.closest_point(head), feet, head);
                (level * 100.0).ceil() / 100.0
            })
            .fold(0.0, f32::max);
    }
}
