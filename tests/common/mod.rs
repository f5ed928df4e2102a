// Shared fixtures for the integration tests: small frames, identity palettes
// and meshes given directly in world (or NDC) coordinates.
#![allow(dead_code)]

use glam::{Mat4, Vec3};
use palette_raster::camera::{Camera, RenderCamera};
use palette_raster::rendering::*;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 48;

/// Camera whose view-projection is the identity, so world positions are NDC.
pub fn ndc_camera() -> RenderCamera {
    let mut camera = Camera::new(Vec3::ZERO, WIDTH as f32 / HEIGHT as f32).build();
    camera.view_projection = Mat4::IDENTITY;
    camera.inverse_view_projection = Mat4::IDENTITY;
    camera
}

/// Encodes each palette index in the low byte of an opaque color.
pub fn color_of(index: u8) -> u32 {
    0xFF00_0000 | index as u32
}

pub struct Fixture {
    pub renderer: SoftwareRenderer,
    pub settings: FrameSettings,
    pub transforms: UniformBufferId,
}

impl Fixture {
    /// Renderer with an identity palette and a light table whose row `l` maps
    /// index `i` to `i + 10 * l`.
    pub fn new(light_levels: usize) -> Self {
        Self::with_settings(light_levels, RenderInitSettings::default())
    }

    pub fn with_settings(light_levels: usize, init: RenderInitSettings) -> Self {
        let mut renderer = SoftwareRenderer::new(RenderInitSettings {
            width: WIDTH,
            height: HEIGHT,
            render_threads_mode: RenderThreadsMode::Max,
            ..init
        })
        .unwrap();

        let palette = renderer.try_create_object_texture(PALETTE_LENGTH, 1, 4).unwrap();
        let colors: Vec<u32> = (0..PALETTE_LENGTH).map(|i| color_of(i as u8)).collect();
        renderer.populate_object_texture32(palette, &colors).unwrap();

        let light_table = renderer
            .try_create_object_texture(PALETTE_LENGTH, light_levels, 1)
            .unwrap();
        let mut table = vec![0u8; PALETTE_LENGTH * light_levels];
        for level in 0..light_levels {
            for index in 0..PALETTE_LENGTH {
                table[level * PALETTE_LENGTH + index] = (index + 10 * level).min(255) as u8;
            }
        }
        renderer.populate_object_texture8(light_table, &table).unwrap();

        let sky = renderer.try_create_object_texture(1, 1, 1).unwrap();
        renderer.populate_object_texture8(sky, &[77]).unwrap();

        let transforms = renderer
            .try_create_uniform_buffer(1, std::mem::size_of::<RenderTransform>())
            .unwrap();
        renderer
            .populate_uniform_at_index(transforms, 0, &RenderTransform::IDENTITY)
            .unwrap();

        let settings = FrameSettings::new(palette, light_table, sky, WIDTH, HEIGHT);
        Self {
            renderer,
            settings,
            transforms,
        }
    }

    pub fn texture(&mut self, width: usize, height: usize, texels: &[u8]) -> ObjectTextureId {
        let id = self.renderer.try_create_object_texture(width, height, 1).unwrap();
        self.renderer.populate_object_texture8(id, texels).unwrap();
        id
    }

    /// Axis-aligned quad from `min` to `max` at depth `z`, facing the camera,
    /// with texture coordinates spanning [0, 1].
    pub fn quad(&mut self, min: [f32; 2], max: [f32; 2], z: f32, texture: ObjectTextureId) -> DrawCall {
        let positions = [
            min[0], min[1], z, //
            max[0], min[1], z, //
            max[0], max[1], z, //
            min[0], max[1], z,
        ];
        let tex_coords = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        self.mesh(&positions, &tex_coords, &[0, 1, 2, 0, 2, 3], texture)
    }

    pub fn mesh(
        &mut self,
        positions: &[f32],
        tex_coords: &[f32],
        indices: &[i32],
        texture: ObjectTextureId,
    ) -> DrawCall {
        let vertex_count = positions.len() / 3;
        let vb = self.renderer.try_create_vertex_buffer(vertex_count, 3).unwrap();
        self.renderer.populate_vertex_buffer(vb, positions).unwrap();
        let ab = self.renderer.try_create_attribute_buffer(vertex_count, 2).unwrap();
        self.renderer.populate_attribute_buffer(ab, tex_coords).unwrap();
        let ib = self.renderer.try_create_index_buffer(indices.len()).unwrap();
        self.renderer.populate_index_buffer(ib, indices).unwrap();
        DrawCall::new(
            vb,
            ab,
            ib,
            texture,
            UniformRef {
                buffer: self.transforms,
                index: 0,
            },
        )
    }

    pub fn render(&mut self, camera: &RenderCamera, draw_calls: &[DrawCall], output: &mut [u32]) -> RenderResult<()> {
        self.renderer
            .submit_frame(camera, draw_calls, &self.settings, output)
    }
}
