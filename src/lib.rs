/// Palette Raster - multi-threaded software rasterizer for 8-bit paletted scenes
/// Built with compartmentalized benchmarkable components
pub mod camera;
pub mod perf;
pub mod rendering;
pub mod scene;

pub use camera::{Camera, RenderCamera};
pub use perf::{CounterSnapshot, FunctionCounters, ProfilerData, FUNCTION_COUNTERS};
pub use rendering::{
    DrawCall, FrameSettings, PixelShaderType, RenderError, RenderInitSettings, RenderResult,
    RenderThreadsMode, SoftwareRenderer,
};
pub use scene::{DemoScene, SceneConfig};
