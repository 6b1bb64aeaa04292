//! Input event vocabulary
//!
//! Device-independent events raised by whatever translates raw input. Nothing
//! here polls a device; these are payloads for the
//! [`EventQueue`](cinder_core::event::EventQueue).

use cinder_core::event::Event;
use glam::{IVec2, UVec2, Vec2};

/// Start or end of a directional movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveAction {
    BeginUp,
    EndUp,
    BeginDown,
    EndDown,
    BeginLeft,
    EndLeft,
    BeginRight,
    EndRight,
}

impl MoveAction {
    /// True for the `Begin*` half of an action pair.
    pub fn is_begin(self) -> bool {
        matches!(
            self,
            MoveAction::BeginUp
                | MoveAction::BeginDown
                | MoveAction::BeginLeft
                | MoveAction::BeginRight
        )
    }

    /// Unit direction of the action, y pointing up.
    pub fn direction(self) -> Vec2 {
        match self {
            MoveAction::BeginUp | MoveAction::EndUp => Vec2::Y,
            MoveAction::BeginDown | MoveAction::EndDown => Vec2::NEG_Y,
            MoveAction::BeginLeft | MoveAction::EndLeft => Vec2::NEG_X,
            MoveAction::BeginRight | MoveAction::EndRight => Vec2::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub action: MoveAction,
}

impl Event for Move {}

/// A click at window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Select {
    pub position: IVec2,
}

impl Event for Select {}

/// Zoom by a number of steps. Positive zooms in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewZoom {
    pub delta: i32,
}

impl Event for ViewZoom {}

/// View drag, as a fraction of the window size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDrag {
    pub delta: Vec2,
}

impl Event for ViewDrag {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResize {
    pub size: UVec2,
}

impl Event for WindowResize {}

/// Request or announcement of a pause state change.
///
/// The engine triggers this whenever its pause state changes, and flips its
/// state when gameplay raises one carrying a different value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamePaused {
    pub paused: bool,
}

impl Event for GamePaused {}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::event::EventQueue;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn move_actions_pair_up() {
        assert!(MoveAction::BeginLeft.is_begin());
        assert!(!MoveAction::EndLeft.is_begin());
        assert_eq!(
            MoveAction::BeginLeft.direction(),
            MoveAction::EndLeft.direction()
        );
        assert_eq!(MoveAction::BeginUp.direction(), Vec2::Y);
    }

    #[test]
    fn input_events_route_by_kind() {
        let mut events = EventQueue::new();
        let zooms = Rc::new(RefCell::new(Vec::new()));
        let sink = zooms.clone();
        events.add_listener::<ViewZoom, _>(move |zoom, _| sink.borrow_mut().push(zoom.delta));

        events.queue_event(ViewZoom { delta: 2 });
        events.queue_event(Select {
            position: IVec2::new(4, 5),
        });
        events.queue_event(ViewZoom { delta: -1 });
        let report = events.process(None);

        assert_eq!(*zooms.borrow(), vec![2, -1]);
        assert_eq!(report.dispatched, 3);
    }
}
