/// Software rasterization pipeline
/// Draw calls flow through vertex shading, clipping and binning on the
/// director thread; bins are rasterized in parallel by the worker pool.
pub mod binning;
pub mod buffers;
pub mod clipping;
pub mod dither;
pub mod draw_call;
pub mod error;
pub mod framebuffer;
pub mod light;
pub mod pixel_shader;
pub mod rasterizer;
pub mod renderer;
pub mod resources;
pub mod shading;
pub mod texture;
pub mod vertex;
pub mod worker_pool;

pub use binning::{BinGrid, PixelRect, RasterTriangle, DEFAULT_BIN_SIZE};
pub use clipping::{ClipPlane, Clipper};
pub use dither::{DitherBuffer, DitheringMode};
pub use draw_call::{
    DrawCall, DrawCallTexture, LightingType, PixelShaderType, TextureSamplingType, UniformRef,
    VertexShaderType,
};
pub use error::{RenderError, RenderResult};
pub use framebuffer::{FrameBuffers, PixelTarget};
pub use light::{RenderLight, RenderLightIdList, MAX_LIGHTS_PER_DRAW_CALL};
pub use renderer::{FrameSettings, RenderInitSettings, SoftwareRenderer};
pub use resources::{
    AttributeBufferId, IndexBufferId, ObjectTextureId, RenderLightId, UniformBufferId,
    VertexBufferId,
};
pub use texture::{ObjectTexture, PALETTE_INDEX_TRANSPARENT, PALETTE_LENGTH};
pub use vertex::{ClipTriangle, RenderTransform};
pub use worker_pool::{RenderThreadsMode, WorkerPool};
