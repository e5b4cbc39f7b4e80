//! Active mode selection.

use super::error::ControllerError;
use super::modes::{ModeKind, MoveContext, MoveMode, SCORE_SENTINEL};
use super::state::MotionState;

/// A switch from one mode to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    pub from: ModeKind,
    pub to: ModeKind,
}

/// Pick the mode that should take over, if any.
///
/// The candidate is the first mode with the highest score. It replaces the
/// active mode only when it scores strictly higher than the active mode and
/// no lower than [`SCORE_SENTINEL`], so ties keep the current mode.
pub fn choose(scores: &[i32], active: usize) -> Option<usize> {
    let active_score = *scores.get(active)?;

    let mut best = 0;
    for (index, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = index;
        }
    }

    let best_score = scores[best];
    (best != active && best_score > active_score && best_score >= SCORE_SENTINEL).then_some(best)
}

/// The movement modes of a character and which one is active.
#[derive(Debug)]
pub struct ModeSet {
    modes: Vec<Box<dyn MoveMode>>,
    active: usize,
}

impl ModeSet {
    /// The first mode starts out active.
    pub fn new(modes: Vec<Box<dyn MoveMode>>) -> Result<Self, ControllerError> {
        if modes.is_empty() {
            return Err(ControllerError::NoModes);
        }
        Ok(Self { modes, active: 0 })
    }

    pub fn active(&self) -> &dyn MoveMode {
        self.modes[self.active].as_ref()
    }

    pub fn active_mut(&mut self) -> &mut Box<dyn MoveMode> {
        &mut self.modes[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_kind(&self) -> ModeKind {
        self.active().kind()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// First mode of the given kind.
    pub fn find(&self, kind: ModeKind) -> Option<&dyn MoveMode> {
        self.modes.iter().find(|m| m.kind() == kind).map(|m| m.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn MoveMode>> {
        self.modes.iter_mut()
    }

    /// Score every mode against the same state.
    pub fn scores(&self, state: &MotionState) -> Vec<i32> {
        self.modes.iter().map(|m| m.score(state)).collect()
    }

    /// Re-score the modes and switch if another one should take over.
    ///
    /// The outgoing mode sees the incoming one in `on_exit`, the body is woken
    /// and then the incoming mode's `on_enter` runs.
    pub fn select(&mut self, ctx: &mut MoveContext<'_>) -> Option<ModeSwitch> {
        let scores = self.scores(ctx.state);
        let next = choose(&scores, self.active)?;
        let previous = self.active;

        let (outgoing, incoming) = if previous < next {
            let (left, right) = self.modes.split_at_mut(next);
            (&mut left[previous], &right[0])
        } else {
            let (left, right) = self.modes.split_at_mut(previous);
            (&mut right[0], &left[next])
        };
        outgoing.on_exit(&**incoming, ctx);

        self.active = next;
        ctx.body.wake();
        self.modes[next].on_enter(ctx);

        let switch = ModeSwitch {
            from: self.modes[previous].kind(),
            to: self.modes[next].kind(),
        };
        log::debug!(
            "mode {} -> {} (scores {:?})",
            switch.from,
            switch.to,
            scores
        );
        Some(switch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyIntegrator, SimBody};
    use crate::collision::CollisionWorld;
    use crate::movement::config::ControllerConfig;
    use crate::movement::modes::SCORE_DISQUALIFIED;
    use crate::movement::state::EyeAngles;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_choose_highest() {
        assert_eq!(choose(&[0, 10, 5], 0), Some(1));
        assert_eq!(choose(&[0, 10, 5], 1), None);
        assert_eq!(choose(&[0, -100, 5], 1), Some(2));
    }

    #[test]
    fn test_ties_keep_active_mode() {
        assert_eq!(choose(&[5, 5], 1), None);
        assert_eq!(choose(&[3, 7, 7], 2), None);
    }

    #[test]
    fn test_first_of_equal_candidates_wins() {
        assert_eq!(choose(&[0, 7, 7], 0), Some(1));
    }

    #[test]
    fn test_nothing_above_sentinel_keeps_active() {
        assert_eq!(choose(&[-100, -60, -100], 0), None);
        assert_eq!(choose(&[-100, -49], 0), Some(1));
        assert_eq!(choose(&[-100, -51], 0), None);
    }

    #[test]
    fn test_sentinel_score_still_applies() {
        assert_eq!(choose(&[-100, SCORE_SENTINEL], 0), Some(1));
        assert_eq!(choose(&[SCORE_SENTINEL - 1, SCORE_SENTINEL], 0), Some(1));
    }

    #[test]
    fn test_out_of_range_active_is_ignored() {
        assert_eq!(choose(&[1, 2], 5), None);
    }

    /// A mode with a settable score that records its hooks.
    #[derive(Debug)]
    struct Probe {
        name: &'static str,
        score: Rc<RefCell<i32>>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl MoveMode for Probe {
        fn kind(&self) -> ModeKind {
            ModeKind::Custom(self.name)
        }

        fn score(&self, _state: &MotionState) -> i32 {
            *self.score.borrow()
        }

        fn on_enter(&mut self, _ctx: &mut MoveContext<'_>) {
            self.log.borrow_mut().push(format!("enter {}", self.name));
        }

        fn on_exit(&mut self, next: &dyn MoveMode, _ctx: &mut MoveContext<'_>) {
            self.log
                .borrow_mut()
                .push(format!("exit {} for {}", self.name, next.kind()));
        }

        fn update_move(&mut self, _ctx: &mut MoveContext<'_>, _eyes: EyeAngles, _input: Vec3) -> Vec3 {
            Vec3::ZERO
        }
    }

    #[test]
    fn test_select_runs_exit_then_enter() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a_score = Rc::new(RefCell::new(0));
        let b_score = Rc::new(RefCell::new(SCORE_DISQUALIFIED));

        let mut set = ModeSet::new(vec![
            Box::new(Probe {
                name: "a",
                score: Rc::clone(&a_score),
                log: Rc::clone(&log),
            }),
            Box::new(Probe {
                name: "b",
                score: Rc::clone(&b_score),
                log: Rc::clone(&log),
            }),
        ])
        .expect("two modes");

        let world = CollisionWorld::new();
        let mut body = SimBody::new(Vec3::ZERO);
        let mut state = MotionState::default();
        let config = ControllerConfig::default();
        let mut ctx = MoveContext {
            body: &mut body,
            world: &world,
            state: &mut state,
            config: &config,
            delta_time: 1.0 / 60.0,
        };

        assert_eq!(set.select(&mut ctx), None);

        *b_score.borrow_mut() = 10;
        let switch = set.select(&mut ctx).expect("b takes over");
        assert_eq!(switch.from, ModeKind::Custom("a"));
        assert_eq!(switch.to, ModeKind::Custom("b"));
        assert_eq!(set.active_kind(), ModeKind::Custom("b"));
        assert_eq!(*log.borrow(), vec!["exit a for b", "enter b"]);

        // Back the other way once b drops out
        *b_score.borrow_mut() = SCORE_DISQUALIFIED;
        set.select(&mut ctx).expect("a takes over");
        assert_eq!(set.active_index(), 0);
        assert!(!body.is_sleeping());
    }

    #[test]
    fn test_empty_set_is_an_error() {
        assert_eq!(ModeSet::new(Vec::new()).err(), Some(ControllerError::NoModes));
    }
}
