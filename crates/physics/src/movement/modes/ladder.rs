//! Climbing ladder volumes.

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::body::BodyProperties;
use crate::collision::{inverse_lerp, Volume, VolumeId};
use crate::movement::config::{ControllerConfig, LadderConfig};
use crate::movement::math::{add_clamped, clamp_length, closest_point_on_line, subtract_direction};
use crate::movement::state::{CommandButtons, EyeAngles, MotionState};

use super::{AnimationState, ModeKind, MoveContext, MoveMode, SCORE_DISQUALIFIED};

/// Fraction of the body that must be level with a ladder volume to grab it.
const GRAB_PROGRESS: f32 = 0.5;

/// Pull towards the ladder per unit of offset.
const PULL_STRENGTH: f32 = 5.0;

/// Offsets below this are left alone.
const PULL_TOLERANCE: f32 = 0.01;

/// Climbing ladder volumes.
///
/// Forward input climbs up, or down while looking down past the look-down
/// pitch. Jump pushes the body off the ladder.
#[derive(Debug, Clone)]
pub struct LadderMode {
    pub config: LadderConfig,
    /// The ladder being climbed, as last seen touching the body.
    climbing: Option<Volume>,
    /// Orientation facing the ladder with `+Z` as the climb direction.
    climbing_rotation: Quat,
}

impl Default for LadderMode {
    fn default() -> Self {
        Self::new(LadderConfig::default())
    }
}

impl LadderMode {
    pub fn new(config: LadderConfig) -> Self {
        Self {
            config,
            climbing: None,
            climbing_rotation: Quat::IDENTITY,
        }
    }

    pub fn climbing(&self) -> Option<VolumeId> {
        self.climbing.map(|v| v.id)
    }

    pub fn climbing_rotation(&self) -> Quat {
        self.climbing_rotation
    }

    /// Pick the ladder the body is holding on to.
    ///
    /// The current ladder is kept while it is still touched, unless another
    /// ladder reaches at least halfway up the body.
    fn scan(&mut self, touching: &[Volume], feet: Vec3, head: Vec3) {
        let current = self.climbing();
        let mut found = None;

        for volume in touching.iter().filter(|v| v.has_any(self.config.climbable)) {
            if Some(volume.id) == current {
                found = Some(*volume);
                continue;
            }

            let progress = inverse_lerp(volume.closest_point(head), feet, head);
            if progress >= GRAB_PROGRESS {
                found = Some(*volume);
                break;
            }
        }

        let changed = found.map(|v| v.id) != current;
        self.climbing = found;
        if !changed {
            return;
        }

        let Some(ladder) = found else {
            log::debug!("let go of ladder {current:?}");
            return;
        };

        log::debug!("grabbed ladder {:?}", ladder.id);
        self.climbing_rotation = ladder.rotation;
        if (ladder.center - feet).dot(ladder.forward()) < 0.0 {
            // Climbing from behind
            self.climbing_rotation *= Quat::from_rotation_z(PI);
        }
    }
}

impl MoveMode for LadderMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Ladder
    }

    fn score(&self, _state: &MotionState) -> i32 {
        if self.climbing.is_some() {
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
        ctx.state.is_climbing = true;
        ctx.body.set_velocity(Vec3::ZERO);
    }

    fn on_exit(&mut self, _next: &dyn MoveMode, ctx: &mut MoveContext<'_>) {
        ctx.state.is_climbing = false;
        let v = clamp_length(ctx.body.velocity(), ctx.config.run_speed);
        ctx.body.set_velocity(v);
    }

    fn post_physics_step(&mut self, ctx: &mut MoveContext<'_>) {
        let Some(ladder) = self.climbing else {
            return;
        };

        let position = ctx.body.position();
        let offset = closest_point_on_line(ladder.center, ladder.up(), position) - position;
        // Never pull through the ladder
        let correction = subtract_direction(offset, ladder.forward());

        let distance = correction.length();
        if distance > PULL_TOLERANCE {
            let v = add_clamped(ctx.body.velocity(), correction * PULL_STRENGTH, distance * 10.0);
            ctx.body.set_velocity(v);
        }
    }

    fn update_move(&mut self, ctx: &mut MoveContext<'_>, eyes: EyeAngles, input: Vec3) -> Vec3 {
        let mut climb = Vec3::new(0.0, 0.0, input.x);
        if eyes.pitch_degrees() > self.config.look_down_pitch {
            climb = -climb;
        }

        if ctx.button_down(CommandButtons::JUMP) {
            let away = self.climbing_rotation * Vec3::NEG_X;
            ctx.jump(away * self.config.jump_off_speed);
        }

        climb * (self.config.climb_scale * self.config.speed)
    }

    fn sense(&mut self, ctx: &mut MoveContext<'_>) {
        let feet = ctx.body.position();
        let head = feet + Vec3::Z * ctx.dims().height;
        self.scan(ctx.body.touching_volumes(), feet, head);
    }

    fn max_wish_speed(&self, _config: &ControllerConfig) -> f32 {
        self.config.climb_scale * self.config.speed
    }

    fn animation_state(&self, state: &MotionState) -> AnimationState {
        AnimationState {
            facing: Some(self.climbing_rotation),
            ..AnimationState::from_state(state)
        }
    }
}
