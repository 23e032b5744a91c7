//! The imgui side of a UI window: context, winit platform glue and the full-window panel.

use std::time::Instant;

use imgui::{Condition, Context, DrawData, FontConfig, FontSource, Ui, WindowFlags, WindowToken};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use winit::{event::Event, window::Window};

use crate::clipboard;
use crate::config::FrameConfig;
use crate::error::{BackendContext, BackendError};

/// Flags for a panel that fills its window: no moving, resizing, collapsing or ini state.
pub fn default_flags() -> WindowFlags {
    WindowFlags::NO_SAVED_SETTINGS | WindowFlags::NO_COLLAPSE | WindowFlags::NO_MOVE | WindowFlags::NO_RESIZE
}

/// Begins an imgui window pinned to the top-left corner and sized to the whole display.
///
/// `opened` is cleared when the user closes the panel.
pub fn begin_main_window<'ui>(
    ui: &'ui Ui,
    title: &str,
    flags: WindowFlags,
    opened: &mut bool,
) -> Option<WindowToken<'ui>> {
    ui.window(title)
        .position([0.0, 0.0], Condition::Always)
        .size(ui.io().display_size, Condition::Always)
        .flags(flags)
        .opened(opened)
        .begin()
}

pub struct UiLayer {
    context: Context,
    platform: WinitPlatform,
    last_frame: Instant,
}

impl UiLayer {
    pub fn init(window: &Window, config: &FrameConfig) -> UiLayer {
        let mut context = Context::create();
        context.set_ini_filename(None);

        if let Some(backend) = clipboard::init() {
            context.set_clipboard_backend(backend);
        }

        let mut platform = WinitPlatform::init(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Rounded);

        let hidpi_factor = platform.hidpi_factor();
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                size_pixels: (f64::from(config.font_size) * hidpi_factor) as f32,
                ..FontConfig::default()
            }),
        }]);
        context.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

        UiLayer {
            context,
            platform,
            last_frame: Instant::now(),
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn handle_event<T>(&mut self, window: &Window, event: &Event<'_, T>) {
        self.platform.handle_event(self.context.io_mut(), window, event);
    }

    /// Advances the imgui clock and syncs display size and cursor state with the window.
    pub fn update(&mut self, window: &Window) -> Result<(), BackendError> {
        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        self.platform
            .prepare_frame(self.context.io_mut(), window)
            .backend("preparing the UI frame")
    }

    /// Runs `build` inside a new imgui frame and returns the resulting draw data.
    pub fn frame<F: FnOnce(&Ui)>(&mut self, window: &Window, build: F) -> &DrawData {
        let ui = self.context.frame();
        build(ui);
        self.platform.prepare_render(ui, window);
        self.context.render()
    }

    pub fn shutdown(self) {
        log::debug!("shutting down the UI context");
        drop(self.context);
    }
}
