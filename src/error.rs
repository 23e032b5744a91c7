use imgui::TextureId;
use thiserror::Error;
use vulkano::image::ImageDimensions;

/// A failure reported by vulkano, vulkano-win or winit, tagged with what was being done.
#[derive(Debug, Error)]
#[error("{context}")]
pub struct BackendError {
    context: &'static str,
    #[source]
    source: Box<dyn std::error::Error>,
}

impl BackendError {
    pub(crate) fn new<E: std::error::Error + 'static>(context: &'static str, source: E) -> Self {
        BackendError {
            context,
            source: Box::new(source),
        }
    }

    pub fn context(&self) -> &'static str {
        self.context
    }
}

pub(crate) trait BackendContext<T> {
    fn backend(self, context: &'static str) -> Result<T, BackendError>;
}

impl<T, E: std::error::Error + 'static> BackendContext<T> for Result<T, E> {
    fn backend(self, context: &'static str) -> Result<T, BackendError> {
        self.map_err(|e| BackendError::new(context, e))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window size must be non-zero, got {0}x{1}")]
    EmptyWindow(u32, u32),
    #[error("target frame rate must be non-zero")]
    ZeroFrameRate,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("the texture id could not be found: {0:?}")]
    BadTexture(TextureId),
    #[error("image dimensions not supported (must be Dim2d): {0:?}")]
    BadImageDimensions(ImageDimensions),
    #[error("invalid UI pipeline: missing {0}")]
    Pipeline(&'static str),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid window configuration")]
    Config(#[from] ConfigError),
    #[error("no physical device can present to the window")]
    NoSuitableDevice,
    #[error("the window surface does not support {0}")]
    Unsupported(&'static str),
    #[error("failed to set up the UI renderer")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
