/// Error type shared by the resource registries and frame submission.
/// Every variant is a caller or content bug; nothing here is raised from
/// inside the per-pixel loop.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("no free {kind} handle (capacity {capacity})")]
    ResourceExhausted { kind: &'static str, capacity: usize },

    #[error("invalid {kind} handle {id}")]
    InvalidHandle { kind: &'static str, id: u32 },

    #[error("{kind} size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("unsupported texel format: {0} bytes per texel")]
    UnsupportedTexelFormat(usize),

    #[error("texture {id} is not a {expected} texture")]
    TexelFormatMismatch { id: u32, expected: &'static str },

    #[error("too many lights for one draw call: {count} (max {max})")]
    TooManyLights { count: usize, max: usize },

    #[error("unknown vertex shader type {0}")]
    UnknownVertexShader(u8),

    #[error("unknown pixel shader type {0}")]
    UnknownPixelShader(u8),

    #[error("unknown render threads mode {0}")]
    UnknownThreadsMode(i32),

    #[error("pixel shader {shader} requires texture slot {slot}")]
    MissingTexture { shader: &'static str, slot: usize },

    #[error("index {index} out of range for vertex count {vertex_count}")]
    IndexOutOfRange { index: i32, vertex_count: usize },

    #[error("bin ({bin_x}, {bin_y}) exceeded its capacity of {capacity} triangles")]
    BinCapacityExceeded {
        bin_x: usize,
        bin_y: usize,
        capacity: usize,
    },

    #[error("output buffer holds {actual} pixels, frame needs {expected}")]
    OutputSizeMismatch { expected: usize, actual: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl From<rayon::ThreadPoolBuildError> for RenderError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        RenderError::ThreadPool(err.to_string())
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
