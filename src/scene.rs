/// Procedural demo scene
/// Uploads a palette, light table and a seeded set of textured meshes into a
/// renderer and produces the draw calls that show them.
use crate::camera::Camera;
use crate::rendering::{
    DrawCall, FrameSettings, LightingType, ObjectTextureId, PixelShaderType,
    RenderLightIdList, RenderResult, RenderTransform, SoftwareRenderer, TextureSamplingType,
    UniformBufferId, UniformRef, VertexShaderType, PALETTE_LENGTH,
};
use crate::rendering::pixel_shader::{PALETTE_INDEX_PUDDLE_EVEN_ROW, PALETTE_INDEX_PUDDLE_ODD_ROW};
use glam::{Mat4, Vec3};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Scene generation parameters
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub seed: u64,
    /// Free-standing alpha-tested panels scattered over the ground.
    pub panel_count: usize,
    /// Point lights over the ground.
    pub light_count: usize,
    /// Half extent of the ground quad in world units.
    pub ground_half_size: f32,
    pub texture_size: usize,
    pub light_level_count: usize,
    pub width: usize,
    pub height: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            panel_count: 48,
            light_count: 4,
            ground_half_size: 24.0,
            texture_size: 32,
            light_level_count: 16,
            width: 320,
            height: 200,
        }
    }
}

/// Mesh buffers for one uploaded model.
#[derive(Copy, Clone, Debug)]
struct MeshIds {
    vertex_buffer: crate::rendering::VertexBufferId,
    attribute_buffer: crate::rendering::AttributeBufferId,
    index_buffer: crate::rendering::IndexBufferId,
}

pub struct DemoScene {
    pub draw_calls: Vec<DrawCall>,
    pub frame_settings: FrameSettings,
    transforms: UniformBufferId,
    door_transform_index: usize,
    door_position: Vec3,
}

impl DemoScene {
    pub fn build(renderer: &mut SoftwareRenderer, config: &SceneConfig) -> RenderResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let palette = upload_palette(renderer)?;
        let light_table = upload_light_table(renderer, config.light_level_count)?;
        let sky = renderer.try_create_object_texture(1, 1, 1)?;
        renderer.populate_object_texture8(sky, &[200])?;

        let checker = upload_checker(renderer, config.texture_size, 40, 90)?;
        let puddle = upload_puddle(renderer, config.texture_size)?;

        // Ground, door, puddle, then panels.
        let object_count = 3 + config.panel_count;
        let transforms = renderer
            .try_create_uniform_buffer(object_count, std::mem::size_of::<RenderTransform>())?;
        let pivots = renderer.try_create_uniform_buffer(1, std::mem::size_of::<Vec3>())?;

        let quad = upload_quad(renderer, false)?;
        let double_sided = upload_quad(renderer, true)?;
        let ground = upload_ground(renderer, config.ground_half_size)?;

        let mut light_ids = RenderLightIdList::default();
        for _ in 0..config.light_count.min(crate::rendering::MAX_LIGHTS_PER_DRAW_CALL) {
            let light = renderer.try_create_light()?;
            let x = rng.gen_range(-config.ground_half_size..config.ground_half_size);
            let z = rng.gen_range(-config.ground_half_size..config.ground_half_size);
            renderer.set_light_position(light, Vec3::new(x, 1.5, z))?;
            renderer.set_light_radius(light, 2.0, rng.gen_range(6.0..12.0))?;
            light_ids.push(light)?;
        }

        let mut draw_calls = Vec::with_capacity(object_count);

        renderer.populate_uniform_at_index(transforms, 0, &RenderTransform::IDENTITY)?;
        let mut ground_call = mesh_call(ground, checker, transforms, 0);
        ground_call.lighting = LightingType::PerPixel(light_ids);
        draw_calls.push(ground_call);

        let door_position = Vec3::new(0.0, 0.0, -4.0);
        renderer.populate_uniform_at_index(
            transforms,
            1,
            &RenderTransform::from_translation(door_position),
        )?;
        renderer.populate_uniform_at_index(pivots, 0, &Vec3::new(0.0, 2.0, 0.0))?;
        let mut door_call = mesh_call(double_sided, checker, transforms, 1);
        door_call.vertex_shader = VertexShaderType::RaisingDoor;
        door_call.pre_scale_translation = Some(UniformRef {
            buffer: pivots,
            index: 0,
        });
        door_call.lighting = LightingType::PerMesh(0.8);
        draw_calls.push(door_call);

        let puddle_transform = RenderTransform {
            translation: Mat4::from_translation(Vec3::new(3.0, 0.01, 2.0)),
            rotation: Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            scale: Mat4::from_scale(Vec3::splat(1.5)),
        };
        renderer.populate_uniform_at_index(transforms, 2, &puddle_transform)?;
        let mut puddle_call = mesh_call(quad, puddle, transforms, 2);
        puddle_call.pixel_shader = PixelShaderType::AlphaTestedWithHorizonMirror;
        puddle_call.enable_depth_write = false;
        draw_calls.push(puddle_call);

        for i in 0..config.panel_count {
            let index = 3 + i;
            let limit = config.ground_half_size * 0.9;
            let position = Vec3::new(rng.gen_range(-limit..limit), 0.0, rng.gen_range(-limit..limit));
            let transform = RenderTransform {
                translation: Mat4::from_translation(position),
                rotation: Mat4::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU)),
                scale: Mat4::from_scale(Vec3::new(rng.gen_range(0.5..1.5), rng.gen_range(0.5..2.0), 1.0)),
            };
            renderer.populate_uniform_at_index(transforms, index, &transform)?;

            let texture = upload_checker(
                renderer,
                config.texture_size,
                rng.gen_range(16..128),
                rng.gen_range(128..240),
            )?;
            let mut call = mesh_call(double_sided, texture, transforms, index);
            call.pixel_shader = match rng.gen_range(0..4) {
                0 => PixelShaderType::Opaque,
                1 => PixelShaderType::AlphaTestedWithVariableTexCoordVMin,
                _ => PixelShaderType::AlphaTested,
            };
            call.pixel_shader_param = rng.gen_range(0.0..0.5);
            call.lighting = LightingType::PerMesh(rng.gen_range(0.3..1.0));
            if rng.gen_bool(0.1) {
                if let Some(texture) = call.textures[0].as_mut() {
                    texture.sampling = TextureSamplingType::ScreenSpaceRepeatY;
                }
            }
            draw_calls.push(call);
        }

        info!(
            "demo scene: {} draw calls, {} lights, seed {:#x}",
            draw_calls.len(),
            light_ids.len(),
            config.seed
        );

        let mut frame_settings =
            FrameSettings::new(palette, light_table, sky, config.width, config.height);
        frame_settings.ambient_percent = 0.25;

        Ok(Self {
            draw_calls,
            frame_settings,
            transforms,
            door_transform_index: 1,
            door_position,
        })
    }

    /// Camera orbiting the scene center; one revolution every `period` frames.
    pub fn orbit_camera(&self, frame: usize, period: usize) -> Camera {
        let angle = (frame % period.max(1)) as f32 / period.max(1) as f32 * std::f32::consts::TAU;
        let aspect = self.frame_settings.width as f32 / self.frame_settings.height as f32;
        let mut camera = Camera::new(Vec3::new(angle.sin() * 14.0, 3.0, angle.cos() * 14.0), aspect);
        camera.look_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        camera
    }

    /// Raise the door to `open` (0 = closed, 1 = fully open).
    pub fn set_door_open(&self, renderer: &mut SoftwareRenderer, open: f32) -> RenderResult<()> {
        let transform = RenderTransform {
            scale: Mat4::from_scale(Vec3::new(1.0, (1.0 - open).clamp(0.0, 1.0), 1.0)),
            ..RenderTransform::from_translation(self.door_position)
        };
        renderer.populate_uniform_at_index(self.transforms, self.door_transform_index, &transform)
    }
}

fn mesh_call(mesh: MeshIds, texture: ObjectTextureId, transforms: UniformBufferId, index: usize) -> DrawCall {
    DrawCall::new(
        mesh.vertex_buffer,
        mesh.attribute_buffer,
        mesh.index_buffer,
        texture,
        UniformRef {
            buffer: transforms,
            index,
        },
    )
}

fn upload_mesh(
    renderer: &mut SoftwareRenderer,
    positions: &[f32],
    tex_coords: &[f32],
    indices: &[i32],
) -> RenderResult<MeshIds> {
    let vertex_count = positions.len() / 3;
    let vertex_buffer = renderer.try_create_vertex_buffer(vertex_count, 3)?;
    renderer.populate_vertex_buffer(vertex_buffer, positions)?;
    let attribute_buffer = renderer.try_create_attribute_buffer(vertex_count, 2)?;
    renderer.populate_attribute_buffer(attribute_buffer, tex_coords)?;
    let index_buffer = renderer.try_create_index_buffer(indices.len())?;
    renderer.populate_index_buffer(index_buffer, indices)?;
    Ok(MeshIds {
        vertex_buffer,
        attribute_buffer,
        index_buffer,
    })
}

/// Unit-wide, two-unit-tall quad standing on the XZ plane and facing +Z.
fn upload_quad(renderer: &mut SoftwareRenderer, double_sided: bool) -> RenderResult<MeshIds> {
    let positions = [
        -0.5, 0.0, 0.0, //
        0.5, 0.0, 0.0, //
        0.5, 2.0, 0.0, //
        -0.5, 2.0, 0.0,
    ];
    let tex_coords = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
    let front = [0, 1, 2, 0, 2, 3];
    let both = [0, 1, 2, 0, 2, 3, 0, 2, 1, 0, 3, 2];
    let indices: &[i32] = if double_sided { &both } else { &front };
    upload_mesh(renderer, &positions, &tex_coords, indices)
}

fn upload_ground(renderer: &mut SoftwareRenderer, half_size: f32) -> RenderResult<MeshIds> {
    let s = half_size;
    let positions = [
        -s, 0.0, s, //
        s, 0.0, s, //
        s, 0.0, -s, //
        -s, 0.0, -s,
    ];
    let tex_coords = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
    upload_mesh(renderer, &positions, &tex_coords, &[0, 1, 2, 0, 2, 3])
}

/// Ramp palette: index 0 is black, the rest sweep through three channels.
fn upload_palette(renderer: &mut SoftwareRenderer) -> RenderResult<ObjectTextureId> {
    let colors: Vec<u32> = (0..PALETTE_LENGTH as u32)
        .map(|i| {
            let r = i;
            let g = (i * 3) & 0xFF;
            let b = 255 - i;
            0xFF00_0000 | (r << 16) | (g << 8) | b
        })
        .collect();
    let id = renderer.try_create_object_texture(PALETTE_LENGTH, 1, 4)?;
    renderer.populate_object_texture32(id, &colors)?;
    Ok(id)
}

/// Brightest row is the identity; each darker row scales indices toward 1.
fn upload_light_table(
    renderer: &mut SoftwareRenderer,
    light_level_count: usize,
) -> RenderResult<ObjectTextureId> {
    let levels = light_level_count.max(1);
    let mut table = vec![0u8; levels * PALETTE_LENGTH];
    for level in 0..levels {
        for index in 1..PALETTE_LENGTH {
            let scaled = index * (levels - level) / levels;
            table[level * PALETTE_LENGTH + index] = scaled.max(1) as u8;
        }
    }
    let id = renderer.try_create_object_texture(PALETTE_LENGTH, levels, 1)?;
    renderer.populate_object_texture8(id, &table)?;
    Ok(id)
}

/// Checkerboard with a transparent one-texel border.
fn upload_checker(
    renderer: &mut SoftwareRenderer,
    size: usize,
    dark: u8,
    light: u8,
) -> RenderResult<ObjectTextureId> {
    let size = size.max(2);
    let texels: Vec<u8> = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                0
            } else if ((x / 4) + (y / 4)) % 2 == 0 {
                dark
            } else {
                light
            }
        })
        .collect();
    let id = renderer.try_create_object_texture(size, size, 1)?;
    renderer.populate_object_texture8(id, &texels)?;
    Ok(id)
}

/// Round puddle of reflective texels.
fn upload_puddle(renderer: &mut SoftwareRenderer, size: usize) -> RenderResult<ObjectTextureId> {
    let size = size.max(2);
    let center = size as f32 * 0.5;
    let texels: Vec<u8> = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            if dx * dx + dy * dy > center * center {
                0
            } else if y % 2 == 0 {
                PALETTE_INDEX_PUDDLE_EVEN_ROW
            } else {
                PALETTE_INDEX_PUDDLE_ODD_ROW
            }
        })
        .collect();
    let id = renderer.try_create_object_texture(size, size, 1)?;
    renderer.populate_object_texture8(id, &texels)?;
    Ok(id)
}
