//! Controller and movement mode configuration.
//!
//! All values are engine units (a standing body is 72 units tall) and
//! seconds. Angles are degrees.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::ContentFlags;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("duck height {duck_height} must not exceed body height {height}")]
    DuckTallerThanBody { duck_height: f32, height: f32 },
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

/// Dimensions and mass of the character body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub radius: f32,
    pub height: f32,
    pub mass: f32,
    /// Height of the body while ducking.
    pub duck_height: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            radius: 16.0,
            height: 72.0,
            mass: 500.0,
            duck_height: 36.0,
        }
    }
}

impl BodyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("body.radius", self.radius, 1.0, 64.0)?;
        in_range("body.height", self.height, 1.0, 128.0)?;
        in_range("body.mass", self.mass, 1.0, 1000.0)?;
        positive("body.duck_height", self.duck_height)?;
        if self.duck_height > self.height {
            return Err(ConfigError::DuckTallerThanBody {
                duck_height: self.duck_height,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Configuration for the character controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub body: BodyConfig,

    // ========================================================================
    // Speeds
    // ========================================================================
    pub walk_speed: f32,
    pub run_speed: f32,
    pub ducked_speed: f32,

    /// Smoothing time when speeding up towards the wish speed (seconds).
    pub acceleration_time: f32,
    /// Smoothing time when slowing down (seconds).
    pub deceleration_time: f32,

    /// Upward speed of a jump. Zero disables jumping.
    pub jump_speed: f32,

    // ========================================================================
    // Physics
    // ========================================================================
    /// Extra braking applied on the ground when the wish speed is lower than
    /// the current speed (0..=1).
    pub brake_power: f32,

    /// Damping while airborne or moving (0..=1).
    pub air_friction: f32,

    /// Gravity for hosts that build the body from this config (units/second²).
    pub gravity: f32,

    // ========================================================================
    // Behaviour
    // ========================================================================
    /// Invert the run button: run unless it is held.
    pub run_by_default: bool,

    /// Turn the view with rotating ground.
    pub rotate_with_ground: bool,

    /// Eye position below the top of the body.
    pub eye_distance_from_top: f32,

    /// Maximum look pitch either way (degrees).
    pub pitch_limit: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            body: BodyConfig::default(),
            walk_speed: 110.0,
            run_speed: 320.0,
            ducked_speed: 70.0,
            acceleration_time: 0.0,
            deceleration_time: 0.0,
            jump_speed: 300.0,
            brake_power: 1.0,
            air_friction: 0.1,
            gravity: 800.0,
            run_by_default: false,
            rotate_with_ground: true,
            eye_distance_from_top: 8.0,
            pitch_limit: 89.0,
        }
    }
}

impl ControllerConfig {
    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.body.validate()?;
        non_negative("walk_speed", self.walk_speed)?;
        non_negative("run_speed", self.run_speed)?;
        non_negative("ducked_speed", self.ducked_speed)?;
        non_negative("acceleration_time", self.acceleration_time)?;
        non_negative("deceleration_time", self.deceleration_time)?;
        non_negative("jump_speed", self.jump_speed)?;
        in_range("brake_power", self.brake_power, 0.0, 1.0)?;
        in_range("air_friction", self.air_friction, 0.0, 1.0)?;
        non_negative("gravity", self.gravity)?;
        non_negative("eye_distance_from_top", self.eye_distance_from_top)?;
        in_range("pitch_limit", self.pitch_limit, 0.0, 90.0)?;
        Ok(())
    }

    /// Fastest speed input can ask for.
    pub fn max_input_speed(&self) -> f32 {
        self.walk_speed.max(self.run_speed).max(self.ducked_speed)
    }
}

/// Walking on standable ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub priority: i32,
    /// Steepest standable slope (degrees).
    pub ground_angle: f32,
    pub step_up_height: f32,
    pub step_down_height: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            priority: 0,
            ground_angle: 45.0,
            step_up_height: 18.0,
            step_down_height: 18.0,
        }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("walk.ground_angle", self.ground_angle, 0.0, 90.0)?;
        non_negative("walk.step_up_height", self.step_up_height)?;
        non_negative("walk.step_down_height", self.step_down_height)
    }
}

/// Swimming in water volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimConfig {
    pub priority: i32,
    /// Submersion fraction above which swimming takes over (0..=1).
    pub swim_level: f32,
    /// Linear damping while swimming.
    pub damping: f32,
    /// Upward speed granted when leaving the water with jump held.
    pub exit_jump_speed: f32,
}

impl Default for SwimConfig {
    fn default() -> Self {
        Self {
            priority: 10,
            swim_level: 0.7,
            damping: 3.3,
            exit_jump_speed: 300.0,
        }
    }
}

impl SwimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("swim.swim_level", self.swim_level, 0.0, 1.0)?;
        non_negative("swim.damping", self.damping)?;
        non_negative("swim.exit_jump_speed", self.exit_jump_speed)
    }
}

/// Climbing ladder volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    pub priority: i32,
    /// Climb speed multiplier (0..=2).
    pub speed: f32,
    /// Climb velocity for full forward input at speed 1.
    pub climb_scale: f32,
    /// Linear damping while climbing.
    pub damping: f32,
    /// Speed of the push away from the ladder when jumping off.
    pub jump_off_speed: f32,
    /// Pitch beyond which forward input climbs down (degrees).
    pub look_down_pitch: f32,
    /// Volume tags that can be climbed.
    pub climbable: ContentFlags,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            priority: 5,
            speed: 1.0,
            climb_scale: 1500.0,
            damping: 20.0,
            jump_off_speed: 200.0,
            look_down_pitch: 50.0,
            climbable: ContentFlags::LADDER,
        }
    }
}

impl LadderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("ladder.speed", self.speed, 0.0, 2.0)?;
        non_negative("ladder.climb_scale", self.climb_scale)?;
        non_negative("ladder.damping", self.damping)?;
        non_negative("ladder.jump_off_speed", self.jump_off_speed)?;
        in_range("ladder.look_down_pitch", self.look_down_pitch, 0.0, 90.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert_eq!(ControllerConfig::default().validate(), Ok(()));
        assert_eq!(WalkConfig::default().validate(), Ok(()));
        assert_eq!(SwimConfig::default().validate(), Ok(()));
        assert_eq!(LadderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = ControllerConfig {
            walk_speed: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "walk_speed",
                value: -1.0
            })
        );

        let config = ControllerConfig {
            brake_power: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "brake_power", .. })
        ));

        let swim = SwimConfig {
            swim_level: 1.5,
            ..Default::default()
        };
        assert!(swim.validate().is_err());
    }

    #[test]
    fn test_duck_height_must_fit() {
        let config = ControllerConfig {
            body: BodyConfig {
                duck_height: 80.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuckTallerThanBody { .. })
        ));
    }

    #[test]
    fn test_max_input_speed() {
        let config = ControllerConfig::default();
        assert_eq!(config.max_input_speed(), 320.0);
    }
}
