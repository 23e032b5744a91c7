use clipboard::{ClipboardContext, ClipboardProvider};
use imgui::ClipboardBackend;

/// System clipboard access for imgui text widgets.
pub struct ClipboardSupport(ClipboardContext);

pub fn init() -> Option<ClipboardSupport> {
    match ClipboardContext::new() {
        Ok(ctx) => Some(ClipboardSupport(ctx)),
        Err(e) => {
            log::warn!("clipboard unavailable: {}", e);
            None
        }
    }
}

impl ClipboardBackend for ClipboardSupport {
    fn get(&mut self) -> Option<String> {
        self.0.get_contents().ok()
    }

    fn set(&mut self, text: &str) {
        if let Err(e) = self.0.set_contents(text.to_owned()) {
            log::warn!("failed to set clipboard contents: {}", e);
        }
    }
}
