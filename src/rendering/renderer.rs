/// Software renderer facade.
///
/// Owns every resource registry and the per-frame pipeline state. A frame is
/// processed one draw call at a time: the director thread validates, vertex
/// shades, clips and bins the draw call, then the worker pool rasterizes its
/// bins in parallel before the next draw call starts.
use super::binning::{BinGrid, DEFAULT_BIN_SIZE};
use super::buffers::{AttributeBuffer, IndexBuffer, UniformBuffer, VertexBuffer};
use super::clipping::Clipper;
use super::dither::{DitherBuffer, DitheringMode};
use super::draw_call::{DrawCall, LightingType, VertexShaderType};
use super::error::{RenderError, RenderResult};
use super::framebuffer::FrameBuffers;
use super::light::{RenderLight, ResolvedLights};
use super::pixel_shader::{BoundTexture, PixelShaderInputs};
use super::rasterizer::{DrawLighting, RasterContext};
use super::resources::{
    AttributeBufferId, IndexBufferId, ObjectTextureId, RenderLightId, ResourceTable,
    UniformBufferId, VertexBufferId,
};
use super::shading::ShadingTables;
use super::texture::{ObjectTexture, PalettedTextureView};
use super::vertex::{shade_triangles, validate_indices, RenderTransform, VertexTransformSet};
use super::worker_pool::{RenderThreadsMode, WorkerPool};
use crate::camera::RenderCamera;
use crate::perf::{FrameCounters, ProfilerData};
use crate::{count_add, count_call, perf_scope};
use bytemuck::Pod;
use glam::Vec3;
use log::{debug, info, trace};
use std::sync::atomic::Ordering;

/// Construction-time configuration.
#[derive(Clone, Debug)]
pub struct RenderInitSettings {
    pub width: usize,
    pub height: usize,
    pub render_threads_mode: RenderThreadsMode,
    pub dithering_mode: DitheringMode,
    /// Bin edge length in pixels.
    pub bin_size: usize,
    /// Fail a draw call instead of growing a bin past this many triangles.
    pub max_triangles_per_bin: Option<usize>,
    pub max_buffers: usize,
    pub max_textures: usize,
    pub max_lights: usize,
}

impl Default for RenderInitSettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            render_threads_mode: RenderThreadsMode::default(),
            dithering_mode: DitheringMode::None,
            bin_size: DEFAULT_BIN_SIZE,
            max_triangles_per_bin: None,
            max_buffers: 8192,
            max_textures: 4096,
            max_lights: 256,
        }
    }
}

/// Per-frame configuration.
#[derive(Clone, Debug)]
pub struct FrameSettings {
    /// Light floor for per-pixel lighting, in [0, 1].
    pub ambient_percent: f32,
    /// 256 x 1 true-color texture.
    pub palette_texture: ObjectTextureId,
    /// 256 x light-level-count palette-index texture.
    pub light_table_texture: ObjectTextureId,
    /// Palette-index texture whose first texel replaces off-screen reflections.
    pub sky_color_texture: ObjectTextureId,
    pub width: usize,
    pub height: usize,
    pub render_threads_mode: RenderThreadsMode,
    pub dithering_mode: DitheringMode,
}

impl FrameSettings {
    pub fn new(
        palette_texture: ObjectTextureId,
        light_table_texture: ObjectTextureId,
        sky_color_texture: ObjectTextureId,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            ambient_percent: 1.0,
            palette_texture,
            light_table_texture,
            sky_color_texture,
            width,
            height,
            render_threads_mode: RenderThreadsMode::default(),
            dithering_mode: DitheringMode::None,
        }
    }
}

/// Draw call with every handle resolved and validated.
struct PreparedDrawCall<'a> {
    vertices: &'a VertexBuffer,
    attributes: &'a AttributeBuffer,
    indices: &'a IndexBuffer,
    transforms: VertexTransformSet,
    texture0: BoundTexture<'a>,
    texture1: Option<BoundTexture<'a>>,
    lighting: DrawLighting,
    call: &'a DrawCall,
}

pub struct SoftwareRenderer {
    vertex_buffers: ResourceTable<VertexBufferId, VertexBuffer>,
    attribute_buffers: ResourceTable<AttributeBufferId, AttributeBuffer>,
    index_buffers: ResourceTable<IndexBufferId, IndexBuffer>,
    uniform_buffers: ResourceTable<UniformBufferId, UniformBuffer>,
    object_textures: ResourceTable<ObjectTextureId, ObjectTexture>,
    lights: ResourceTable<RenderLightId, RenderLight>,

    frame_buffers: FrameBuffers,
    bins: BinGrid,
    clipper: Clipper,
    dither: DitherBuffer,
    workers: WorkerPool,
    counters: FrameCounters,
    profiler_data: ProfilerData,
}

impl SoftwareRenderer {
    pub fn new(settings: RenderInitSettings) -> RenderResult<Self> {
        if settings.width == 0 || settings.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: settings.width,
                height: settings.height,
            });
        }

        let workers = WorkerPool::new(settings.render_threads_mode)?;
        info!(
            "software renderer {}x{}, bin size {}, {} workers",
            settings.width,
            settings.height,
            settings.bin_size,
            workers.thread_count()
        );

        Ok(Self {
            vertex_buffers: ResourceTable::new(settings.max_buffers),
            attribute_buffers: ResourceTable::new(settings.max_buffers),
            index_buffers: ResourceTable::new(settings.max_buffers),
            uniform_buffers: ResourceTable::new(settings.max_buffers),
            object_textures: ResourceTable::new(settings.max_textures),
            lights: ResourceTable::new(settings.max_lights),
            frame_buffers: FrameBuffers::new(settings.width, settings.height),
            bins: BinGrid::new(
                settings.width,
                settings.height,
                settings.bin_size,
                settings.max_triangles_per_bin,
            ),
            clipper: Clipper::new(),
            dither: DitherBuffer::new(settings.width, settings.height, settings.dithering_mode),
            workers,
            counters: FrameCounters::default(),
            profiler_data: ProfilerData::default(),
        })
    }

    /// Change the frame size. Only valid between frames.
    pub fn resize(&mut self, width: usize, height: usize) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        if width == self.frame_buffers.width && height == self.frame_buffers.height {
            return Ok(());
        }

        info!(
            "resize {}x{} -> {}x{}",
            self.frame_buffers.width, self.frame_buffers.height, width, height
        );
        self.frame_buffers.resize(width, height);
        self.bins.resize(width, height);
        self.dither.update(width, height, self.dither.mode);
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.frame_buffers.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.frame_buffers.height
    }

    #[inline]
    pub fn thread_count(&self) -> usize {
        self.workers.thread_count()
    }

    // --- Vertex buffers ---

    pub fn try_create_vertex_buffer(
        &mut self,
        vertex_count: usize,
        components_per_vertex: usize,
    ) -> RenderResult<VertexBufferId> {
        check_components("vertex components", components_per_vertex, 3)?;
        self.vertex_buffers
            .insert(VertexBuffer::new(vertex_count, components_per_vertex))
    }

    pub fn populate_vertex_buffer(&mut self, id: VertexBufferId, values: &[f32]) -> RenderResult<()> {
        self.vertex_buffers.get_mut(id)?.populate(values)
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> RenderResult<&[f32]> {
        Ok(&self.vertex_buffers.get(id)?.data)
    }

    pub fn free_vertex_buffer(&mut self, id: VertexBufferId) -> RenderResult<()> {
        self.vertex_buffers.remove(id).map(drop)
    }

    // --- Attribute buffers ---

    pub fn try_create_attribute_buffer(
        &mut self,
        vertex_count: usize,
        components_per_vertex: usize,
    ) -> RenderResult<AttributeBufferId> {
        check_components("attribute components", components_per_vertex, 2)?;
        self.attribute_buffers
            .insert(AttributeBuffer::new(vertex_count, components_per_vertex))
    }

    pub fn populate_attribute_buffer(
        &mut self,
        id: AttributeBufferId,
        values: &[f32],
    ) -> RenderResult<()> {
        self.attribute_buffers.get_mut(id)?.populate(values)
    }

    pub fn attribute_buffer(&self, id: AttributeBufferId) -> RenderResult<&[f32]> {
        Ok(&self.attribute_buffers.get(id)?.data)
    }

    pub fn free_attribute_buffer(&mut self, id: AttributeBufferId) -> RenderResult<()> {
        self.attribute_buffers.remove(id).map(drop)
    }

    // --- Index buffers ---

    pub fn try_create_index_buffer(&mut self, index_count: usize) -> RenderResult<IndexBufferId> {
        self.index_buffers.insert(IndexBuffer::new(index_count))
    }

    pub fn populate_index_buffer(&mut self, id: IndexBufferId, values: &[i32]) -> RenderResult<()> {
        self.index_buffers.get_mut(id)?.populate(values)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> RenderResult<&[i32]> {
        Ok(&self.index_buffers.get(id)?.indices)
    }

    pub fn free_index_buffer(&mut self, id: IndexBufferId) -> RenderResult<()> {
        self.index_buffers.remove(id).map(drop)
    }

    // --- Uniform buffers ---

    pub fn try_create_uniform_buffer(
        &mut self,
        element_count: usize,
        element_size: usize,
    ) -> RenderResult<UniformBufferId> {
        self.uniform_buffers
            .insert(UniformBuffer::new(element_count, element_size))
    }

    pub fn populate_uniform_buffer<T: Pod>(
        &mut self,
        id: UniformBufferId,
        values: &[T],
    ) -> RenderResult<()> {
        self.uniform_buffers.get_mut(id)?.populate(values)
    }

    pub fn populate_uniform_at_index<T: Pod>(
        &mut self,
        id: UniformBufferId,
        index: usize,
        value: &T,
    ) -> RenderResult<()> {
        self.uniform_buffers
            .get_mut(id)?
            .populate_at_index(index, value)
    }

    pub fn uniform_element<T: Pod>(&self, id: UniformBufferId, index: usize) -> RenderResult<T> {
        self.uniform_buffers.get(id)?.get(index)
    }

    pub fn free_uniform_buffer(&mut self, id: UniformBufferId) -> RenderResult<()> {
        self.uniform_buffers.remove(id).map(drop)
    }

    // --- Object textures ---

    pub fn try_create_object_texture(
        &mut self,
        width: usize,
        height: usize,
        bytes_per_texel: usize,
    ) -> RenderResult<ObjectTextureId> {
        let texture = ObjectTexture::new(width, height, bytes_per_texel)?;
        self.object_textures.insert(texture)
    }

    pub fn populate_object_texture8(
        &mut self,
        id: ObjectTextureId,
        texels: &[u8],
    ) -> RenderResult<()> {
        self.object_textures.get_mut(id)?.populate8(id.0, texels)
    }

    pub fn populate_object_texture32(
        &mut self,
        id: ObjectTextureId,
        texels: &[u32],
    ) -> RenderResult<()> {
        self.object_textures.get_mut(id)?.populate32(id.0, texels)
    }

    pub fn object_texture(&self, id: ObjectTextureId) -> RenderResult<&ObjectTexture> {
        self.object_textures.get(id)
    }

    /// `(width, height)` of a texture.
    pub fn object_texture_dims(&self, id: ObjectTextureId) -> RenderResult<(usize, usize)> {
        let texture = self.object_textures.get(id)?;
        Ok((texture.width, texture.height))
    }

    pub fn free_object_texture(&mut self, id: ObjectTextureId) -> RenderResult<()> {
        self.object_textures.remove(id).map(drop)
    }

    // --- Lights ---

    pub fn try_create_light(&mut self) -> RenderResult<RenderLightId> {
        self.lights.insert(RenderLight::default())
    }

    pub fn set_light_position(&mut self, id: RenderLightId, position: Vec3) -> RenderResult<()> {
        self.lights.get_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_light_radius(
        &mut self,
        id: RenderLightId,
        start_radius: f32,
        end_radius: f32,
    ) -> RenderResult<()> {
        let light = self.lights.get_mut(id)?;
        light.start_radius = start_radius;
        light.end_radius = end_radius;
        Ok(())
    }

    pub fn light(&self, id: RenderLightId) -> RenderResult<&RenderLight> {
        self.lights.get(id)
    }

    pub fn free_light(&mut self, id: RenderLightId) -> RenderResult<()> {
        self.lights.remove(id).map(drop)
    }

    // --- Frame ---

    /// Depth of every pixel after the last frame (NDC z, +inf where nothing was drawn).
    pub fn depth_buffer(&self) -> &[f32] {
        self.frame_buffers.depth()
    }

    /// Shaded palette index of every pixel after the last frame.
    pub fn palette_index_buffer(&self) -> &[u8] {
        self.frame_buffers.palette_indices()
    }

    pub fn profiler_data(&self) -> ProfilerData {
        self.profiler_data
    }

    /// Render `draw_calls` in order into `output` (`width * height` ARGB pixels).
    /// Pixels no draw call covers keep their previous contents.
    pub fn submit_frame(
        &mut self,
        camera: &RenderCamera,
        draw_calls: &[DrawCall],
        settings: &FrameSettings,
        output: &mut [u32],
    ) -> RenderResult<()> {
        perf_scope!("submit_frame");

        self.resize(settings.width, settings.height)?;
        self.workers.set_mode(settings.render_threads_mode)?;
        self.dither
            .update(settings.width, settings.height, settings.dithering_mode);

        let expected = settings.width * settings.height;
        if output.len() != expected {
            return Err(RenderError::OutputSizeMismatch {
                expected,
                actual: output.len(),
            });
        }

        let vertex_buffers = &self.vertex_buffers;
        let attribute_buffers = &self.attribute_buffers;
        let index_buffers = &self.index_buffers;
        let uniform_buffers = &self.uniform_buffers;
        let object_textures = &self.object_textures;
        let lights = &self.lights;
        let frame_buffers = &mut self.frame_buffers;
        let bins = &mut self.bins;
        let clipper = &mut self.clipper;
        let dither = &self.dither;
        let workers = &self.workers;
        let counters = &self.counters;

        let shading = ShadingTables::from_textures(
            settings.palette_texture,
            object_textures.get(settings.palette_texture)?,
            settings.light_table_texture,
            object_textures.get(settings.light_table_texture)?,
        )?;
        let sky_palette_index = object_textures
            .get(settings.sky_color_texture)?
            .texels8()
            .and_then(|texels| texels.first().copied())
            .ok_or(RenderError::TexelFormatMismatch {
                id: settings.sky_color_texture.0,
                expected: "8-bit",
            })?;

        // Resolve every handle up front so a bad draw call fails before any pixel
        // of this frame is written.
        let prepared = draw_calls
            .iter()
            .map(|call| {
                prepare_draw_call(
                    call,
                    camera,
                    settings.ambient_percent,
                    vertex_buffers,
                    attribute_buffers,
                    index_buffers,
                    uniform_buffers,
                    object_textures,
                    lights,
                )
            })
            .collect::<RenderResult<Vec<_>>>()?;

        counters.reset();
        frame_buffers.clear();
        count_call!(crate::perf::FUNCTION_COUNTERS.frame_buffer_clears);

        let horizon_screen_y = camera.horizon_screen_y(settings.height);

        for (draw_index, draw) in prepared.iter().enumerate() {
            bins.clear();

            let mut bin_error = None;
            shade_triangles(
                draw.vertices,
                draw.attributes,
                draw.indices,
                &draw.transforms,
                |triangle| {
                    count_call!(crate::perf::FUNCTION_COUNTERS.triangles_shaded);
                    let clipped = clipper.clip(triangle);
                    #[cfg(feature = "profiling")]
                    if clipped.len() != 1 || clipped[0] != *triangle {
                        count_call!(crate::perf::FUNCTION_COUNTERS.triangles_clipped);
                    }
                    for piece in clipped {
                        match bins.insert(piece) {
                            Ok(true) => {
                                count_call!(crate::perf::FUNCTION_COUNTERS.triangles_binned);
                                counters.presented_triangles.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(false) => {
                                count_call!(crate::perf::FUNCTION_COUNTERS.triangles_culled);
                            }
                            Err(err) => {
                                bin_error.get_or_insert(err);
                            }
                        }
                    }
                },
            );
            if let Some(err) = bin_error {
                bins.clear();
                return Err(err);
            }

            if draw.call.pixel_shader.reads_other_pixels() {
                frame_buffers.snapshot_palette_indices();
                count_call!(crate::perf::FUNCTION_COUNTERS.palette_snapshots);
            }

            let occupied: Vec<usize> = bins.occupied_bins().collect();
            count_add!(crate::perf::FUNCTION_COUNTERS.bins_rasterized, occupied.len() as u64);

            let tiles = frame_buffers.tiles(output)?;
            let context = RasterContext {
                camera,
                shader: PixelShaderInputs {
                    shader: draw.call.pixel_shader,
                    param: draw.call.pixel_shader_param,
                    texture0: draw.texture0,
                    texture1: draw.texture1,
                    shading,
                    frame_width: settings.width,
                    frame_height: settings.height,
                    horizon_screen_y,
                    palette_snapshot: tiles.snapshot(),
                    sky_palette_index,
                },
                lighting: draw.lighting,
                dither,
                enable_depth_read: draw.call.enable_depth_read,
                enable_depth_write: draw.call.enable_depth_write,
            };

            let bins_ref = &*bins;
            let tiles_ref = &tiles;
            workers.run(&occupied, |bin_index| {
                let bin = &bins_ref.bins()[bin_index];
                // Safety: bins never overlap, and each bin index is assigned to
                // exactly one worker.
                let mut tile = unsafe { tiles_ref.tile(bin.rect) };
                let stats = context.rasterize_bin(bins_ref.triangles(), &bin.entries, &mut tile);
                counters.add_pixels(stats.coverage_tests, stats.depth_tests, stats.color_writes);
            });

            counters.draw_calls.fetch_add(1, Ordering::Relaxed);
            trace!(
                "draw call {}: {:?} {} triangles, {} bins",
                draw_index,
                draw.call.pixel_shader,
                bins.triangles().len(),
                occupied.len()
            );
        }

        self.profiler_data = ProfilerData {
            width: settings.width,
            height: settings.height,
            thread_count: workers.thread_count(),
            texture_count: object_textures.len(),
            texture_byte_count: object_textures.values().map(ObjectTexture::byte_count).sum(),
            total_light_count: lights.len(),
            ..ProfilerData::from_counters(counters)
        };
        let profiler_data = &self.profiler_data;
        debug!(
            "frame: {} draw calls, {} triangles, {} color writes",
            profiler_data.draw_call_count,
            profiler_data.presented_triangle_count,
            profiler_data.total_color_writes
        );

        Ok(())
    }
}

fn check_components(kind: &'static str, actual: usize, minimum: usize) -> RenderResult<()> {
    if actual < minimum {
        return Err(RenderError::SizeMismatch {
            kind,
            expected: minimum,
            actual,
        });
    }
    Ok(())
}

fn bind_texture<'a>(
    textures: &'a ResourceTable<ObjectTextureId, ObjectTexture>,
    call: &DrawCall,
    slot: usize,
) -> RenderResult<Option<BoundTexture<'a>>> {
    let Some(binding) = call.textures[slot] else {
        return Ok(None);
    };
    let texture = textures.get(binding.id)?;
    let view = PalettedTextureView::from_texture(texture).ok_or(RenderError::TexelFormatMismatch {
        id: binding.id.0,
        expected: "8-bit",
    })?;
    Ok(Some(BoundTexture {
        view,
        sampling: binding.sampling,
    }))
}

#[allow(clippy::too_many_arguments)]
fn prepare_draw_call<'a>(
    call: &'a DrawCall,
    camera: &RenderCamera,
    ambient_percent: f32,
    vertex_buffers: &'a ResourceTable<VertexBufferId, VertexBuffer>,
    attribute_buffers: &'a ResourceTable<AttributeBufferId, AttributeBuffer>,
    index_buffers: &'a ResourceTable<IndexBufferId, IndexBuffer>,
    uniform_buffers: &ResourceTable<UniformBufferId, UniformBuffer>,
    object_textures: &'a ResourceTable<ObjectTextureId, ObjectTexture>,
    lights: &ResourceTable<RenderLightId, RenderLight>,
) -> RenderResult<PreparedDrawCall<'a>> {
    let vertices = vertex_buffers.get(call.vertex_buffer)?;
    let attributes = attribute_buffers.get(call.attribute_buffer)?;
    let indices = index_buffers.get(call.index_buffer)?;
    validate_indices(vertices, attributes, indices)?;

    let transform: RenderTransform = uniform_buffers
        .get(call.transform.buffer)?
        .get(call.transform.index)?;
    let pivot = match (call.vertex_shader, call.pre_scale_translation) {
        (VertexShaderType::RaisingDoor, Some(uniform)) => {
            uniform_buffers.get(uniform.buffer)?.get::<Vec3>(uniform.index)?
        }
        _ => Vec3::ZERO,
    };
    let transforms =
        VertexTransformSet::new(camera.view_projection, &transform, pivot, call.vertex_shader);

    let shader_name = call.pixel_shader.name();
    let texture0 = bind_texture(object_textures, call, 0)?.ok_or(RenderError::MissingTexture {
        shader: shader_name,
        slot: 0,
    })?;
    let texture1 = bind_texture(object_textures, call, 1)?;
    if call.pixel_shader.requires_second_texture() && texture1.is_none() {
        return Err(RenderError::MissingTexture {
            shader: shader_name,
            slot: 1,
        });
    }

    let lighting = match call.lighting {
        LightingType::PerMesh(percent) => DrawLighting::PerMesh(percent),
        LightingType::PerPixel(ids) => {
            let mut resolved = ResolvedLights::default();
            for &id in ids.as_slice() {
                resolved.lights[resolved.count] = *lights.get(id)?;
                resolved.count += 1;
            }
            DrawLighting::PerPixel {
                lights: resolved,
                ambient_percent,
            }
        }
    };

    Ok(PreparedDrawCall {
        vertices,
        attributes,
        indices,
        transforms,
        texture0,
        texture1,
        lighting,
        call,
    })
}
