//! A borderless window hosting one imgui UI, moved by dragging its top strip.

use std::sync::Arc;
use std::time::Instant;

use imgui::Ui;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::Window,
};

use crate::config::FrameConfig;
use crate::console::hide_console;
use crate::drag::{DragController, WindowSystem};
use crate::error::FrameError;
use crate::gpu::Gpu;
use crate::input::{PointerTracker, ScreenCursor, WinitWindow};
use crate::render::Renderer;
use crate::ui::UiLayer;

pub struct UiWindow {
    event_loop: EventLoop<()>,
    gpu: Gpu,
    ui: UiLayer,
    renderer: Renderer,
    drag: DragController,
    tracker: PointerTracker,
    screen: ScreenCursor,
    config: FrameConfig,
}

/// What the run loop has to do after a window event went through close and drag handling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowEventOutcome {
    pub close: bool,
    pub resized: bool,
}

/// Close handling, then the drag controller. `window` is only built for pointer events.
pub(crate) fn dispatch_window_event<W, M>(
    event: &WindowEvent<'_>,
    drag: &mut DragController,
    tracker: &mut PointerTracker,
    window: M,
) -> WindowEventOutcome
where
    W: WindowSystem,
    M: FnOnce(&PointerTracker) -> W,
{
    let mut outcome = WindowEventOutcome::default();
    match event {
        WindowEvent::CloseRequested => outcome.close = true,
        WindowEvent::Resized(_) => outcome.resized = true,
        WindowEvent::Focused(false) => drag.release(),
        _ => {}
    }
    if let Some(pointer) = tracker.translate(event) {
        drag.handle(&mut window(tracker), &pointer);
    }
    outcome
}

impl UiWindow {
    pub fn new(config: FrameConfig) -> Result<UiWindow, FrameError> {
        config.validate()?;
        if config.hide_console {
            hide_console();
        }

        let event_loop = EventLoop::new();
        let gpu = Gpu::new(&event_loop, &config)?;
        let mut ui = UiLayer::init(gpu.window(), &config);
        let renderer = Renderer::init(
            ui.context_mut(),
            Arc::clone(&gpu.device),
            Arc::clone(&gpu.queue),
            gpu.format,
            config.gamma,
            None,
        )?;

        Ok(UiWindow {
            event_loop,
            gpu,
            ui,
            renderer,
            drag: DragController::new(),
            tracker: PointerTracker::new(),
            screen: ScreenCursor::new(),
            config,
        })
    }

    pub fn window(&self) -> &Window {
        self.gpu.window()
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Register user textures here before running.
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn run<F>(self, run_ui: F) -> Result<(), FrameError>
    where
        F: FnMut(&mut bool, &Ui),
    {
        self.run_with_events(|_| {}, run_ui)
    }

    /// Pumps events until the window is closed or `run_ui` clears its `run` flag.
    ///
    /// Each event goes to imgui, then close handling, then the drag controller, then
    /// `on_event`. Once per frame `run_ui` builds the UI, which is then rendered and
    /// presented. Frames are paced to the configured rate.
    pub fn run_with_events<E, F>(self, mut on_event: E, mut run_ui: F) -> Result<(), FrameError>
    where
        E: FnMut(&Event<'_, ()>),
        F: FnMut(&mut bool, &Ui),
    {
        let UiWindow {
            mut event_loop,
            mut gpu,
            mut ui,
            mut renderer,
            mut drag,
            mut tracker,
            screen,
            config,
        } = self;

        let window = Arc::clone(gpu.window());
        let frame_time = config.frame_time();
        let mut last_redraw = Instant::now();
        let mut failure: Option<FrameError> = None;

        event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            ui.handle_event(&window, &event);

            match &event {
                Event::WindowEvent {
                    event: window_event,
                    window_id,
                } if *window_id == window.id() => {
                    let outcome = dispatch_window_event(window_event, &mut drag, &mut tracker, |tracker| {
                        WinitWindow::new(&window, tracker, &screen)
                    });
                    if outcome.close {
                        *control_flow = ControlFlow::Exit;
                    }
                    if outcome.resized {
                        gpu.invalidate_swapchain();
                    }
                }
                Event::MainEventsCleared => match ui.update(&window) {
                    Ok(()) => window.request_redraw(),
                    Err(e) => {
                        failure = Some(FrameError::from(e));
                        *control_flow = ControlFlow::Exit;
                    }
                },
                Event::RedrawEventsCleared => {
                    let since_last = last_redraw.elapsed();
                    if since_last < frame_time {
                        std::thread::sleep(frame_time - since_last);
                    }
                    last_redraw = Instant::now();

                    let mut run = true;
                    let draw_data = ui.frame(&window, |frame| run_ui(&mut run, frame));
                    if !run {
                        *control_flow = ControlFlow::Exit;
                    }
                    if let Err(e) = gpu.draw_frame(&mut renderer, draw_data) {
                        failure = Some(e);
                        *control_flow = ControlFlow::Exit;
                    }
                }
                _ => {}
            }

            on_event(&event);
        });

        ui.shutdown();
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragState;
    use crate::vector::Vector2;
    use std::cell::Cell;
    use winit::dpi::{PhysicalPosition, PhysicalSize};
    use winit::event::{DeviceId, ElementState, ModifiersState, MouseButton};

    /// Window at a fixed screen cursor that records where it was moved to.
    struct FakeWindow<'a> {
        position: &'a Cell<Vector2<i32>>,
        cursor: Vector2<i32>,
    }

    impl WindowSystem for FakeWindow<'_> {
        fn size(&self) -> Vector2<u32> {
            Vector2::new(900, 400)
        }

        fn position(&self) -> Vector2<i32> {
            self.position.get()
        }

        fn cursor_position(&self) -> Vector2<i32> {
            self.cursor
        }

        fn set_position(&mut self, position: Vector2<i32>) {
            self.position.set(position);
        }
    }

    fn device() -> DeviceId {
        unsafe { DeviceId::dummy() }
    }

    #[allow(deprecated)]
    fn cursor_moved(x: f64, y: f64) -> WindowEvent<'static> {
        WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(x, y),
            modifiers: ModifiersState::empty(),
        }
    }

    #[allow(deprecated)]
    fn left(state: ElementState) -> WindowEvent<'static> {
        WindowEvent::MouseInput {
            device_id: device(),
            state,
            button: MouseButton::Left,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Press at (50, 5) with the window at (100, 100).
    fn grabbed(position: &Cell<Vector2<i32>>) -> (DragController, PointerTracker) {
        let mut drag = DragController::new();
        let mut tracker = PointerTracker::new();
        for event in [cursor_moved(50.0, 5.0), left(ElementState::Pressed)] {
            dispatch_window_event(&event, &mut drag, &mut tracker, |_| FakeWindow {
                position,
                cursor: Vector2::new(150, 105),
            });
        }
        assert_eq!(drag.state(), DragState::Dragging);
        (drag, tracker)
    }

    #[test]
    fn drags_follow_the_screen_cursor() {
        let position = Cell::new(Vector2::new(100, 100));
        let (mut drag, mut tracker) = grabbed(&position);

        let outcome = dispatch_window_event(&cursor_moved(60.0, 5.0), &mut drag, &mut tracker, |_| {
            FakeWindow { position: &position, cursor: Vector2::new(170, 105) }
        });
        assert_eq!(outcome, WindowEventOutcome::default());
        assert_eq!(position.get(), Vector2::new(120, 100));
    }

    #[test]
    fn close_is_reported_before_the_drag_sees_it() {
        let position = Cell::new(Vector2::new(100, 100));
        let (mut drag, mut tracker) = grabbed(&position);

        let outcome = dispatch_window_event(&WindowEvent::CloseRequested, &mut drag, &mut tracker, |_| {
            FakeWindow { position: &position, cursor: Vector2::new(400, 400) }
        });
        assert_eq!(outcome, WindowEventOutcome { close: true, ..Default::default() });
        assert_eq!(position.get(), Vector2::new(100, 100));
    }

    #[test]
    fn focus_loss_releases_the_grab() {
        let position = Cell::new(Vector2::new(100, 100));
        let (mut drag, mut tracker) = grabbed(&position);

        let outcome = dispatch_window_event(&WindowEvent::Focused(false), &mut drag, &mut tracker, |_| {
            FakeWindow { position: &position, cursor: Vector2::new(170, 105) }
        });
        assert_eq!(outcome, WindowEventOutcome::default());
        assert_eq!(drag.state(), DragState::Idle);

        dispatch_window_event(&cursor_moved(60.0, 5.0), &mut drag, &mut tracker, |_| {
            FakeWindow { position: &position, cursor: Vector2::new(170, 105) }
        });
        assert_eq!(position.get(), Vector2::new(100, 100));
    }

    #[test]
    fn non_pointer_events_never_build_a_window() {
        let mut drag = DragController::new();
        let mut tracker = PointerTracker::new();
        let outcome = dispatch_window_event(
            &WindowEvent::Resized(PhysicalSize::new(640, 480)),
            &mut drag,
            &mut tracker,
            |_| -> FakeWindow<'static> { panic!("resize is not a pointer event") },
        );
        assert_eq!(outcome, WindowEventOutcome { resized: true, ..Default::default() });
    }

    #[test]
    fn presses_before_any_motion_do_not_grab() {
        let position = Cell::new(Vector2::new(100, 100));
        let mut drag = DragController::new();
        let mut tracker = PointerTracker::new();
        dispatch_window_event(&left(ElementState::Pressed), &mut drag, &mut tracker, |_| {
            FakeWindow { position: &position, cursor: Vector2::new(100, 100) }
        });
        assert_eq!(drag.state(), DragState::Idle);
    }
}
