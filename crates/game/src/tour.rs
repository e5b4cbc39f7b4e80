//! Scripted runs through the test course.
//!
//! A tour is a list of legs. Each leg drops the player somewhere, holds one
//! input for a number of ticks and records what the controller went through.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;
use stride_physics::movement::{ControllerError, ControllerEvent, ModeKind};

use crate::config::SimulationConfig;
use crate::input::{ActionInput, PlayerInput};
use crate::level::{course, Level, SpawnPoint};
use crate::simulation::Simulation;

/// One scripted stretch of a tour.
#[derive(Debug, Clone, PartialEq)]
pub struct TourLeg {
    pub name: &'static str,
    /// Where the player is dropped before the leg starts.
    pub start: SpawnPoint,
    /// Input held for the whole leg.
    pub input: PlayerInput,
    pub ticks: u32,
}

impl TourLeg {
    pub fn new(name: &'static str, start: SpawnPoint, input: PlayerInput, ticks: u32) -> Self {
        Self {
            name,
            start,
            input,
            ticks,
        }
    }

    /// Legs that visit each feature of [`Level::test_course`].
    pub fn standard() -> Vec<Self> {
        let origin = Vec3::ZERO;
        let turntable_top = course::TURNTABLE_CENTER + Vec3::Z * course::TURNTABLE_HEIGHT;
        let jump = PlayerInput {
            actions: ActionInput {
                jump: true,
                ..Default::default()
            },
            ..Default::default()
        };

        vec![
            Self::new("stairs", SpawnPoint::new(origin, 0.0), PlayerInput::forward(), 300),
            Self::new("pool", SpawnPoint::new(origin, -FRAC_PI_2), PlayerInput::forward(), 240),
            Self::new("ladder", SpawnPoint::new(origin, PI), PlayerInput::forward(), 400),
            Self::new("turntable", SpawnPoint::new(turntable_top, 0.0), PlayerInput::default(), 120),
            Self::new("jump", SpawnPoint::new(origin, 0.0), jump, 90),
        ]
    }
}

/// What happened during one leg.
#[derive(Debug, Clone, PartialEq)]
pub struct LegReport {
    pub name: &'static str,
    pub end_position: Vec3,
    /// Highest feet height reached.
    pub peak_height: f32,
    /// Yaw change over the leg (radians).
    pub yaw_change: f32,
    /// Active modes in the order they were entered, starting with the first.
    pub modes: Vec<ModeKind>,
    pub events: Vec<ControllerEvent>,
    pub grounded_at_end: bool,
}

impl LegReport {
    pub fn visited(&self, mode: ModeKind) -> bool {
        self.modes.contains(&mode)
    }

    pub fn count(&self, matches: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(*e)).count()
    }
}

/// Reports for every leg of a tour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourReport {
    pub legs: Vec<LegReport>,
}

impl TourReport {
    pub fn leg(&self, name: &str) -> Option<&LegReport> {
        self.legs.iter().find(|l| l.name == name)
    }

    /// Every mode entered on any leg, first appearance first.
    pub fn modes_seen(&self) -> Vec<ModeKind> {
        let mut seen = Vec::new();
        for mode in self.legs.iter().flat_map(|l| &l.modes) {
            if !seen.contains(mode) {
                seen.push(*mode);
            }
        }
        seen
    }
}

/// Run `legs` with a single player on the test course.
pub fn run_tour(config: SimulationConfig, legs: &[TourLeg]) -> Result<TourReport, ControllerError> {
    let mut sim = Simulation::new(config, Level::test_course());
    let id = sim.add_player("tourist")?;
    let mut report = TourReport::default();

    for leg in legs {
        let Some(player) = sim.get_player_mut(id) else {
            break;
        };
        player.respawn(leg.start);
        // Events from settling at the previous leg's end
        player.drain_events();
        let start_yaw = player.controller.eye_angles().yaw;
        let mut modes = vec![player.mode()];
        let mut peak_height = leg.start.position.z;
        let mut events = Vec::new();

        log::info!("leg '{}': {} ticks from {:?}", leg.name, leg.ticks, leg.start.position);

        for _ in 0..leg.ticks {
            for (_, event) in sim.tick(std::slice::from_ref(&leg.input)) {
                if let ControllerEvent::ModeBegin(mode) = event {
                    modes.push(mode);
                }
                events.push(event);
            }
            if let Some(player) = sim.get_player(id) {
                peak_height = peak_height.max(player.position().z);
            }
        }

        let Some(player) = sim.get_player(id) else {
            break;
        };
        let yaw_change = stride_physics::movement::wrap_angle(player.controller.eye_angles().yaw - start_yaw);
        let leg_report = LegReport {
            name: leg.name,
            end_position: player.position(),
            peak_height,
            yaw_change,
            modes,
            events,
            grounded_at_end: player.on_ground(),
        };
        log::info!(
            "leg '{}' ended at {:?} in {} (peak {:.1}, {} events)",
            leg.name,
            leg_report.end_position,
            player.mode(),
            leg_report.peak_height,
            leg_report.events.len()
        );
        report.legs.push(leg_report);
    }

    Ok(report)
}
