/// Headless demo: renders an orbiting camera over a generated scene and logs
/// the per-frame profiler summary.
use log::info;
use mimalloc::MiMalloc;
use palette_raster::*;
use std::time::Instant;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const FRAME_COUNT: usize = 240;
const ORBIT_PERIOD: usize = 120;

fn main() -> Result<(), RenderError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SceneConfig::default();
    let mut renderer = SoftwareRenderer::new(RenderInitSettings {
        width: config.width,
        height: config.height,
        render_threads_mode: RenderThreadsMode::Max,
        ..RenderInitSettings::default()
    })?;
    let mut scene = DemoScene::build(&mut renderer, &config)?;
    scene.frame_settings.render_threads_mode = RenderThreadsMode::Max;
    scene.frame_settings.dithering_mode = rendering::DitheringMode::Modern;

    let mut output = vec![0u32; config.width * config.height];

    #[cfg(feature = "profiling")]
    let mut hardware = perf::profiling::hardware::PerfCounters::new();
    #[cfg(feature = "profiling")]
    {
        FUNCTION_COUNTERS.reset();
        hardware.reset_all();
        hardware.enable_all();
    }

    let start = Instant::now();
    let mut totals = ProfilerData::default();
    for frame in 0..FRAME_COUNT {
        let open = (frame % ORBIT_PERIOD) as f32 / ORBIT_PERIOD as f32;
        scene.set_door_open(&mut renderer, open)?;

        let camera = scene.orbit_camera(frame, ORBIT_PERIOD).build();
        renderer.submit_frame(&camera, &scene.draw_calls, &scene.frame_settings, &mut output)?;

        let data = renderer.profiler_data();
        totals.presented_triangle_count += data.presented_triangle_count;
        totals.total_color_writes += data.total_color_writes;
        if frame % 60 == 0 {
            info!(
                "frame {:4}: {} draw calls, {} triangles, {} coverage tests, {} depth tests, {} writes",
                frame,
                data.draw_call_count,
                data.presented_triangle_count,
                data.total_coverage_tests,
                data.total_depth_tests,
                data.total_color_writes
            );
        }
    }
    let elapsed = start.elapsed();

    #[cfg(feature = "profiling")]
    {
        hardware.disable_all();
        FUNCTION_COUNTERS.snapshot().log_report();
        hardware.read_all().log_report();
    }

    let data = renderer.profiler_data();
    info!(
        "{} frames at {}x{} on {} threads in {:.2}ms ({:.2}ms/frame)",
        FRAME_COUNT,
        data.width,
        data.height,
        data.thread_count,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / FRAME_COUNT as f64
    );
    info!(
        "{} textures ({} bytes), {} lights, {} triangles and {} color writes in total",
        data.texture_count,
        data.texture_byte_count,
        data.total_light_count,
        totals.presented_triangle_count,
        totals.total_color_writes
    );

    Ok(())
}
