use imgui_frameless::{begin_main_window, default_flags, FrameConfig, UiWindow};
use winit::event::{Event, WindowEvent};

fn main() {
    env_logger::init();

    let config = FrameConfig::default().with_title("Hello world");
    let panel_title = config.panel_title.clone();
    let window = UiWindow::new(config).expect("Failed to create the window");

    let result = window.run_with_events(
        |event| {
            if let Event::WindowEvent {
                event: WindowEvent::Moved(position),
                ..
            } = event
            {
                log::info!("window moved to ({}, {})", position.x, position.y);
            }
        },
        move |run, ui| {
            if let Some(_panel) = begin_main_window(ui, &panel_title, default_flags(), run) {
                ui.text("Hello world!");
                ui.text("Drag the strip at the top to move this window.");
                ui.separator();
                let mouse_pos = ui.io().mouse_pos;
                ui.text(format!(
                    "Mouse Position: ({:.1},{:.1})",
                    mouse_pos[0], mouse_pos[1]
                ));
            }
        },
    );

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
