use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::vector::Vector2;

/// Everything needed to open a UI window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub title: String,
    /// Inner size in physical pixels.
    pub size: Vector2<u32>,
    pub target_fps: u32,
    /// Unscaled font size; multiplied by the HiDPI factor at startup.
    pub font_size: f32,
    /// Output gamma applied by the fragment shader. `None` means 1.0.
    pub gamma: Option<f32>,
    /// Hide the console window the process was started with. Windows only.
    pub hide_console: bool,
    /// Title of the full-window imgui panel.
    pub panel_title: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            title: "imgui-frameless".to_owned(),
            size: Vector2::new(900, 400),
            target_fps: 60,
            font_size: 13.0,
            gamma: None,
            hide_console: false,
            panel_title: "main".to_owned(),
        }
    }
}

impl FrameConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Vector2::new(width, height);
        self
    }

    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_hide_console(mut self, hide: bool) -> Self {
        self.hide_console = hide;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.x == 0 || self.size.y == 0 {
            return Err(ConfigError::EmptyWindow(self.size.x, self.size.y));
        }
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        Ok(())
    }

    pub(crate) fn frame_time(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_small_tool_window() {
        let config = FrameConfig::default();
        assert_eq!(config.size, Vector2::new(900, 400));
        assert_eq!(config.target_fps, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_fields() {
        let config = FrameConfig::default()
            .with_title("tool")
            .with_size(320, 240)
            .with_target_fps(30)
            .with_hide_console(true);
        assert_eq!(config.title, "tool");
        assert_eq!(config.size, Vector2::new(320, 240));
        assert_eq!(config.frame_time(), std::time::Duration::from_secs_f64(1.0 / 30.0));
        assert!(config.hide_console);
    }

    #[test]
    fn rejects_empty_windows() {
        let config = FrameConfig::default().with_size(0, 400);
        assert_eq!(config.validate(), Err(ConfigError::EmptyWindow(0, 400)));

        let config = FrameConfig::default().with_target_fps(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroFrameRate));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: FrameConfig =
            serde_json::from_str(r#"{"title":"x","size":{"x":640,"y":480}}"#).unwrap();
        assert_eq!(config.title, "x");
        assert_eq!(config.size, Vector2::new(640, 480));
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.panel_title, "main");
    }
}
