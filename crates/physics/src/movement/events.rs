//! Controller lifecycle notifications.

use glam::Vec3;

use super::modes::ModeKind;

/// Something that happened to a character during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A mode became active.
    ModeBegin(ModeKind),
    /// A mode stopped being active.
    ModeEnd(ModeKind),
    /// The body found ground.
    Grounded,
    /// The body lost its ground.
    Ungrounded,
    Jumped,
    /// The body came down after a fall.
    Landed {
        /// Height lost since the fall began.
        distance: f32,
        /// Velocity just before touching down.
        impact_velocity: Vec3,
    },
}

/// Receives controller events as they happen.
pub trait ControllerListener {
    fn on_event(&mut self, event: &ControllerEvent);
}

impl<F: FnMut(&ControllerEvent)> ControllerListener for F {
    fn on_event(&mut self, event: &ControllerEvent) {
        self(event)
    }
}

/// Fans events out to listeners and keeps them for polling.
#[derive(Default)]
pub struct EventQueue {
    listeners: Vec<Box<dyn ControllerListener>>,
    pending: Vec<ControllerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn ControllerListener>) {
        self.listeners.push(listener);
    }

    /// Deliver `event` to every listener and queue it.
    pub fn emit(&mut self, event: ControllerEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
        self.pending.push(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[ControllerEvent] {
        &self.pending
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_and_polling_see_the_same_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut queue = EventQueue::new();
        queue.add_listener(Box::new(move |event: &ControllerEvent| {
            sink.borrow_mut().push(event.clone());
        }));

        queue.emit(ControllerEvent::Grounded);
        queue.emit(ControllerEvent::ModeBegin(ModeKind::Swim));

        let drained = queue.drain();
        assert_eq!(drained, *seen.borrow());
        assert_eq!(drained.len(), 2);
        assert!(queue.pending().is_empty());
    }
}
