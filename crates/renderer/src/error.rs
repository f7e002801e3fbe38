use thiserror::Error;

/// Errors from rasterization and image encoding.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid canvas size {width}x{height}")]
    CanvasSize { width: u32, height: u32 },

    #[error("Invalid color '{0}'")]
    Color(String),

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
