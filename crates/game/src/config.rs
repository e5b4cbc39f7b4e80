//! Simulation configuration.
//!
//! Everything tunable about a run lives in [`SimulationConfig`], which can be
//! loaded from a TOML file. Missing keys fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stride_physics::movement::{
    ConfigError, ControllerConfig, LadderConfig, LadderMode, MoveMode, SwimConfig, SwimMode, WalkConfig, WalkMode,
};
use thiserror::Error;

/// Failure to load or validate a [`SimulationConfig`].
#[derive(Debug, Error)]
pub enum SimulationConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid tick rate: {0} (must be 1..=1000)")]
    InvalidTickRate(u32),

    #[error("invalid mouse sensitivity: {0} (must be > 0)")]
    InvalidSensitivity(f32),

    #[error("invalid movement config: {0}")]
    Movement(#[from] ConfigError),
}

/// Game simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Character controller configuration.
    pub controller: ControllerConfig,

    pub walk: WalkConfig,
    pub swim: SwimConfig,
    pub ladder: LadderConfig,

    /// Mouse sensitivity.
    pub mouse_sensitivity: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            controller: ControllerConfig::default(),
            walk: WalkConfig::default(),
            swim: SwimConfig::default(),
            ladder: LadderConfig::default(),
            mouse_sensitivity: 2.0,
        }
    }
}

impl SimulationConfig {
    /// Load and validate a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimulationConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SimulationConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimulationConfigError> {
        if !(1..=1000).contains(&self.tick_rate) {
            return Err(SimulationConfigError::InvalidTickRate(self.tick_rate));
        }
        if self.mouse_sensitivity.is_nan() || self.mouse_sensitivity <= 0.0 {
            return Err(SimulationConfigError::InvalidSensitivity(self.mouse_sensitivity));
        }
        self.controller.validate()?;
        self.walk.validate()?;
        self.swim.validate()?;
        self.ladder.validate()?;
        Ok(())
    }

    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Movement modes for a new character, in selection order.
    pub fn build_modes(&self) -> Vec<Box<dyn MoveMode>> {
        vec![
            Box::new(WalkMode::new(self.walk.clone())),
            Box::new(SwimMode::new(self.swim.clone())),
            Box::new(LadderMode::new(self.ladder.clone())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.delta_time() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(config.build_modes().len(), 3);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = SimulationConfig::from_toml("").expect("empty config");
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let toml_str = r"
            tick_rate = 120
            mouse_sensitivity = 1.5

            [controller]
            walk_speed = 150.0
            run_by_default = true

            [controller.body]
            height = 64.0

            [swim]
            swim_level = 0.5

            [ladder]
            speed = 2.0
        ";
        let config = SimulationConfig::from_toml(toml_str).expect("valid config");

        assert_eq!(config.tick_rate, 120);
        assert_eq!(config.controller.walk_speed, 150.0);
        assert!(config.controller.run_by_default);
        assert_eq!(config.controller.body.height, 64.0);
        assert_eq!(config.controller.body.radius, 16.0, "unset keys keep defaults");
        assert_eq!(config.swim.swim_level, 0.5);
        assert_eq!(config.ladder.speed, 2.0);
        assert_eq!(config.walk, WalkConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = SimulationConfig::from_toml("tick_rate = 0").unwrap_err();
        assert!(matches!(err, SimulationConfigError::InvalidTickRate(0)));

        let err = SimulationConfig::from_toml("[controller]\nbrake_power = 3.0").unwrap_err();
        assert!(matches!(err, SimulationConfigError::Movement(_)));
        assert!(err.to_string().contains("brake_power"));

        let err = SimulationConfig::from_toml("tick_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, SimulationConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("stride_config_{}.toml", std::process::id()));
        std::fs::write(&path, "tick_rate = 30\n").expect("write temp config");

        let config = SimulationConfig::from_file(&path).expect("load config");
        std::fs::remove_file(&path).ok();
        assert_eq!(config.tick_rate, 30);

        let err = SimulationConfig::from_file("/nonexistent/stride.toml").unwrap_err();
        assert!(matches!(err, SimulationConfigError::Io(_)));
    }
}
