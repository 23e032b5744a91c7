//! Translation of winit window events into drag controller input.

use enigo::{Enigo, Mouse, Settings};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::window::Window;

use crate::drag::{PointerButton, PointerEvent, WindowSystem};
use crate::vector::Vector2;

impl From<MouseButton> for PointerButton {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            MouseButton::Middle => PointerButton::Middle,
            MouseButton::Other(code) => PointerButton::Other(code),
        }
    }
}

/// Remembers where the cursor is inside the window. winit reports button presses
/// without a position, so the last `CursorMoved` is used for them.
#[derive(Default, Debug, Clone)]
pub struct PointerTracker {
    cursor: Option<Vector2<i32>>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known window-local cursor position, if the cursor has moved over the window yet.
    pub fn cursor(&self) -> Option<Vector2<i32>> {
        self.cursor
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> PointerEvent {
        let cursor = Vector2::new(position.x.floor() as i32, position.y.floor() as i32);
        self.cursor = Some(cursor);
        PointerEvent::Move {
            x: cursor.x,
            y: cursor.y,
        }
    }

    /// Presses are dropped until a position is known; releases always go through.
    pub fn mouse_input(&self, state: ElementState, button: MouseButton) -> Option<PointerEvent> {
        let button = PointerButton::from(button);
        match state {
            ElementState::Pressed => {
                let cursor = self.cursor?;
                Some(PointerEvent::Down {
                    x: cursor.x,
                    y: cursor.y,
                    button,
                })
            }
            ElementState::Released => Some(PointerEvent::Up { button }),
        }
    }

    pub fn translate(&mut self, event: &WindowEvent<'_>) -> Option<PointerEvent> {
        match *event {
            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(position)),
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(state, button),
            WindowEvent::CloseRequested => Some(PointerEvent::Closed),
            _ => None,
        }
    }
}

/// Where the pointer is in screen space, independent of any window.
pub trait CursorSource {
    fn screen_position(&self) -> Option<Vector2<i32>>;
}

/// The OS pointer, queried through enigo.
pub struct ScreenCursor {
    enigo: Option<Enigo>,
}

impl ScreenCursor {
    pub fn new() -> Self {
        let enigo = match Enigo::new(&Settings::default()) {
            Ok(enigo) => Some(enigo),
            Err(e) => {
                log::warn!("screen cursor unavailable, dragging follows window events: {}", e);
                None
            }
        };
        ScreenCursor { enigo }
    }
}

impl Default for ScreenCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorSource for ScreenCursor {
    fn screen_position(&self) -> Option<Vector2<i32>> {
        let enigo = self.enigo.as_ref()?;
        match enigo.location() {
            Ok((x, y)) => Some(Vector2::new(x, y)),
            Err(e) => {
                log::debug!("failed to query the screen cursor: {}", e);
                None
            }
        }
    }
}

/// The cursor in screen space. A real screen reading wins; otherwise it is rebuilt from the
/// window's inner position and the local cursor, which lags behind while the window moves.
pub fn global_cursor(
    screen: Option<Vector2<i32>>,
    inner_position: Option<Vector2<i32>>,
    local: Vector2<i32>,
) -> Vector2<i32> {
    screen.unwrap_or_else(|| inner_position.unwrap_or_default() + local)
}

/// [`WindowSystem`] over a winit window. The global cursor is sampled once, when the
/// adapter is built for an event.
pub struct WinitWindow<'a> {
    window: &'a Window,
    cursor: Vector2<i32>,
}

impl<'a> WinitWindow<'a> {
    pub fn new(window: &'a Window, tracker: &PointerTracker, screen: &dyn CursorSource) -> Self {
        let screen = screen.screen_position().map(|p| to_physical(window, p));
        let inner = match window.inner_position() {
            Ok(p) => Some(Vector2::from(p)),
            Err(e) => {
                log::warn!("window position unavailable: {}", e);
                None
            }
        };
        WinitWindow {
            window,
            cursor: global_cursor(screen, inner, tracker.cursor().unwrap_or_default()),
        }
    }
}

/// macOS reports the pointer in points; winit positions are in pixels.
#[cfg(target_os = "macos")]
fn to_physical(window: &Window, p: Vector2<i32>) -> Vector2<i32> {
    let scale = window.scale_factor();
    Vector2::new((f64::from(p.x) * scale) as i32, (f64::from(p.y) * scale) as i32)
}

#[cfg(not(target_os = "macos"))]
fn to_physical(_window: &Window, p: Vector2<i32>) -> Vector2<i32> {
    p
}

impl WindowSystem for WinitWindow<'_> {
    fn size(&self) -> Vector2<u32> {
        self.window.inner_size().into()
    }

    fn position(&self) -> Vector2<i32> {
        match self.window.outer_position() {
            Ok(p) => p.into(),
            Err(e) => {
                log::warn!("window position unavailable: {}", e);
                Vector2::default()
            }
        }
    }

    fn cursor_position(&self) -> Vector2<i32> {
        self.cursor
    }

    fn set_position(&mut self, position: Vector2<i32>) {
        self.window
            .set_outer_position(PhysicalPosition::<i32>::from(position));
    }
}
