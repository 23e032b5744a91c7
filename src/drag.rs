//! Moving a borderless window by dragging its title strip.
//!
//! The controller never talks to a window directly. It receives a [`WindowState`] snapshot
//! with each [`PointerEvent`] and answers with the position the window should move to, if
//! any. [`DragController::handle`] does the sampling and applying through a
//! [`WindowSystem`] for callers that own a real window.

use crate::region::title_region;
use crate::vector::Vector2;

/// Mouse buttons, as far as dragging cares.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    /// Any other button code. Never starts or ends a drag.
    Other(u16),
}

impl PointerButton {
    pub fn is_primary(self) -> bool {
        self == PointerButton::Primary
    }
}

/// Input events consumed by the controller. Coordinates are window-local.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerEvent {
    Down { x: i32, y: i32, button: PointerButton },
    Up { button: PointerButton },
    Move { x: i32, y: i32 },
    Closed,
}

/// What the controller reads from the window on every event.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub size: Vector2<u32>,
    /// Top-left corner of the window in screen space.
    pub position: Vector2<i32>,
    /// Global cursor position in screen space.
    pub cursor: Vector2<i32>,
}

/// Window operations needed to drag a window around.
pub trait WindowSystem {
    fn size(&self) -> Vector2<u32>;

    fn position(&self) -> Vector2<i32>;

    /// Cursor position in screen space.
    fn cursor_position(&self) -> Vector2<i32>;

    fn set_position(&mut self, position: Vector2<i32>);

    fn snapshot(&self) -> WindowState {
        WindowState {
            size: self.size(),
            position: self.position(),
            cursor: self.cursor_position(),
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub grabbed: bool,
    /// Window top-left minus the global cursor at grab time.
    pub offset: Vector2<i32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

/// Per-window drag state machine. Feed it every polled event, in order.
#[derive(Default, Debug, Clone)]
pub struct DragController {
    session: DragSession,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        if self.session.grabbed {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    /// Advances the state machine and returns the new window position while dragging.
    pub fn on_event(&mut self, window: &WindowState, event: &PointerEvent) -> Option<Vector2<i32>> {
        match *event {
            PointerEvent::Down { x, y, button } => {
                if button.is_primary() && title_region(window.size).contains(Vector2::new(x, y)) {
                    self.session.offset = window.position - window.cursor;
                    if !self.session.grabbed {
                        log::debug!("window grabbed at ({}, {})", x, y);
                    }
                    self.session.grabbed = true;
                }
                None
            }
            PointerEvent::Up { button } => {
                // any primary release ends the grab, including ones that never started one
                if button.is_primary() {
                    if self.session.grabbed {
                        log::debug!("window released");
                    }
                    self.session.grabbed = false;
                }
                None
            }
            PointerEvent::Move { .. } if self.session.grabbed => {
                let target = window.cursor + self.session.offset;
                log::trace!("moving window to ({}, {})", target.x, target.y);
                Some(target)
            }
            PointerEvent::Move { .. } | PointerEvent::Closed => None,
        }
    }

    /// Samples `window`, advances the state machine and applies any reposition.
    /// Returns whether the window was moved.
    pub fn handle<W: WindowSystem + ?Sized>(&mut self, window: &mut W, event: &PointerEvent) -> bool {
        let state = window.snapshot();
        match self.on_event(&state, event) {
            Some(position) => {
                window.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Drops any grab in progress, e.g. when the window loses focus mid-drag.
    pub fn release(&mut self) {
        self.session.grabbed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(position: (i32, i32), cursor: (i32, i32)) -> WindowState {
        WindowState {
            size: Vector2::new(900, 400),
            position: position.into(),
            cursor: cursor.into(),
        }
    }

    fn down(x: i32, y: i32, button: PointerButton) -> PointerEvent {
        PointerEvent::Down { x, y, button }
    }

    const UP: PointerEvent = PointerEvent::Up { button: PointerButton::Primary };
    const MOVE: PointerEvent = PointerEvent::Move { x: 0, y: 0 };

    #[test]
    fn drag_moves_the_window_with_the_cursor() {
        let mut drag = DragController::new();
        assert_eq!(drag.state(), DragState::Idle);

        let grab = window((100, 100), (150, 105));
        assert_eq!(drag.on_event(&grab, &down(50, 5, PointerButton::Primary)), None);
        assert_eq!(drag.state(), DragState::Dragging);
        assert_eq!(drag.session().offset, Vector2::new(-50, -5));

        let moved = window((100, 100), (160, 110));
        assert_eq!(drag.on_event(&moved, &MOVE), Some(Vector2::new(110, 105)));

        assert_eq!(drag.on_event(&moved, &UP), None);
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.on_event(&window((110, 105), (170, 120)), &MOVE), None);
    }

    #[test]
    fn press_below_the_strip_is_ignored() {
        let mut drag = DragController::new();
        drag.on_event(&window((100, 100), (150, 125)), &down(50, 25, PointerButton::Primary));
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.on_event(&window((100, 100), (160, 130)), &MOVE), None);
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut drag = DragController::new();
        let w = window((100, 100), (110, 105));
        for button in [PointerButton::Secondary, PointerButton::Middle, PointerButton::Other(9)] {
            drag.on_event(&w, &down(10, 5, button));
            assert_eq!(drag.state(), DragState::Idle);
        }

        drag.on_event(&w, &down(10, 5, PointerButton::Primary));
        drag.on_event(&w, &PointerEvent::Up { button: PointerButton::Secondary });
        assert_eq!(drag.state(), DragState::Dragging);
    }

    #[test]
    fn unchanged_cursor_does_not_drift() {
        let mut drag = DragController::new();
        let w = window((-340, 2000), (-300, 2012));
        drag.on_event(&w, &down(40, 12, PointerButton::Primary));
        assert_eq!(drag.on_event(&w, &MOVE), Some(Vector2::new(-340, 2000)));
        assert_eq!(drag.on_event(&w, &MOVE), Some(Vector2::new(-340, 2000)));
    }

    #[test]
    fn move_ignores_local_coordinates() {
        let mut drag = DragController::new();
        let w = window((100, 100), (150, 105));
        drag.on_event(&w, &down(50, 5, PointerButton::Primary));

        let far = PointerEvent::Move { x: 800, y: 390 };
        assert_eq!(drag.on_event(&w, &far), Some(Vector2::new(100, 100)));
    }

    #[test]
    fn second_press_recomputes_offset() {
        let mut drag = DragController::new();
        drag.on_event(&window((100, 100), (150, 105)), &down(50, 5, PointerButton::Primary));
        drag.on_event(&window((100, 100), (110, 101)), &down(10, 1, PointerButton::Primary));
        assert_eq!(drag.state(), DragState::Dragging);
        assert_eq!(drag.session().offset, Vector2::new(-10, -1));
    }

    #[test]
    fn stray_release_keeps_idle() {
        let mut drag = DragController::new();
        assert_eq!(drag.on_event(&window((0, 0), (0, 0)), &UP), None);
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.on_event(&window((0, 0), (0, 0)), &PointerEvent::Closed), None);
    }

    #[test]
    fn release_ends_a_drag() {
        let mut drag = DragController::new();
        let w = window((0, 0), (5, 5));
        drag.on_event(&w, &down(5, 5, PointerButton::Primary));
        drag.release();
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.on_event(&w, &MOVE), None);
    }

    /// In-memory window that follows `set_position`.
    struct FakeWindow {
        state: WindowState,
        moves: usize,
    }

    impl WindowSystem for FakeWindow {
        fn size(&self) -> Vector2<u32> {
            self.state.size
        }

        fn position(&self) -> Vector2<i32> {
            self.state.position
        }

        fn cursor_position(&self) -> Vector2<i32> {
            self.state.cursor
        }

        fn set_position(&mut self, position: Vector2<i32>) {
            self.state.position = position;
            self.moves += 1;
        }
    }

    #[test]
    fn handle_applies_repositioning() {
        let mut fake = FakeWindow {
            state: window((100, 100), (150, 105)),
            moves: 0,
        };
        let mut drag = DragController::new();

        assert!(!drag.handle(&mut fake, &down(50, 5, PointerButton::Primary)));

        fake.state.cursor = Vector2::new(160, 110);
        assert!(drag.handle(&mut fake, &MOVE));
        assert_eq!(fake.state.position, Vector2::new(110, 105));

        // the cursor stays on the same spot of the window
        fake.state.cursor = Vector2::new(400, 300);
        assert!(drag.handle(&mut fake, &MOVE));
        assert_eq!(fake.state.position, Vector2::new(350, 295));

        assert!(!drag.handle(&mut fake, &UP));
        assert!(!drag.handle(&mut fake, &MOVE));
        assert_eq!(fake.moves, 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn button() -> impl Strategy<Value = PointerButton> {
            prop_oneof![
                3 => Just(PointerButton::Primary),
                1 => Just(PointerButton::Secondary),
                1 => Just(PointerButton::Middle),
                1 => any::<u16>().prop_map(PointerButton::Other),
            ]
        }

        fn event() -> impl Strategy<Value = PointerEvent> {
            prop_oneof![
                (-50i32..950, -50i32..60, button())
                    .prop_map(|(x, y, button)| PointerEvent::Down { x, y, button }),
                button().prop_map(|button| PointerEvent::Up { button }),
                (-50i32..950, -50i32..450).prop_map(|(x, y)| PointerEvent::Move { x, y }),
                Just(PointerEvent::Closed),
            ]
        }

        fn cursor() -> impl Strategy<Value = (i32, i32)> {
            (-5000i32..5000, -5000i32..5000)
        }

        proptest! {
            /// One command per move received while dragging, and none otherwise
            #[test]
            fn commands_match_moves_while_dragging(
                steps in prop::collection::vec((event(), cursor()), 0..64),
            ) {
                let mut drag = DragController::new();
                let mut expected = 0usize;
                let mut emitted = 0usize;
                for (event, cursor) in steps {
                    let was_dragging = drag.state() == DragState::Dragging;
                    let out = drag.on_event(&window((100, 100), cursor), &event);
                    if was_dragging && matches!(event, PointerEvent::Move { .. }) {
                        expected += 1;
                    }
                    if out.is_some() {
                        emitted += 1;
                    }
                }
                prop_assert_eq!(emitted, expected);
            }

            /// Primary presses start a drag exactly when they land in the title strip
            #[test]
            fn only_title_presses_grab(x in -50i32..950, y in -50i32..60, c in cursor()) {
                let mut drag = DragController::new();
                let w = window((100, 100), c);
                drag.on_event(&w, &PointerEvent::Down { x, y, button: PointerButton::Primary });
                let inside = (0..900).contains(&x) && (0..20).contains(&y);
                prop_assert_eq!(drag.state() == DragState::Dragging, inside);
                prop_assert_eq!(drag.on_event(&w, &MOVE).is_some(), inside);
            }

            /// Grab then move without cursor motion returns the window where it was
            #[test]
            fn no_drift(wx in -5000i32..5000, wy in -5000i32..5000, c in cursor()) {
                let mut drag = DragController::new();
                let w = window((wx, wy), c);
                drag.on_event(&w, &PointerEvent::Down { x: 1, y: 1, button: PointerButton::Primary });
                prop_assert_eq!(drag.on_event(&w, &MOVE), Some(Vector2::new(wx, wy)));
            }
        }
    }
}
