//! Borderless, UI-only desktop windows for imgui-rs.
//!
//! A [`UiWindow`] opens an undecorated winit window, renders one imgui UI into it with
//! Vulkano and lets the user move it by dragging the top [`TITLE_BAR_HEIGHT`] pixels.
//!
//! ```no_run
//! use imgui_frameless::{begin_main_window, default_flags, FrameConfig, UiWindow};
//!
//! let window = UiWindow::new(FrameConfig::default().with_title("tool")).unwrap();
//! window
//!     .run(|run, ui| {
//!         if let Some(_panel) = begin_main_window(ui, "tool", default_flags(), run) {
//!             ui.text("Hello");
//!         }
//!     })
//!     .unwrap();
//! ```
//!
//! The drag logic lives in [`DragController`] and works with any [`WindowSystem`].

mod clipboard;
mod config;
mod console;
mod drag;
mod error;
mod frame;
mod gpu;
mod input;
mod region;
mod render;
mod ui;
mod vector;

pub use config::FrameConfig;
pub use console::hide_console;
pub use drag::{DragController, DragSession, DragState, PointerButton, PointerEvent, WindowState, WindowSystem};
pub use error::{BackendError, ConfigError, FrameError, RenderError};
pub use frame::UiWindow;
pub use gpu::construct_window_frame;
pub use input::{global_cursor, CursorSource, PointerTracker, ScreenCursor, WinitWindow};
pub use region::{title_region, Rect, TITLE_BAR_HEIGHT};
pub use render::{Allocators, Renderer, Texture};
pub use ui::{begin_main_window, default_flags, UiLayer};
pub use vector::{Integral, Vector2};
