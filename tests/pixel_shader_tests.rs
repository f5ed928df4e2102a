// Pixel shader variants, lighting and dithering observed through full frames.
mod common;

use common::*;
use glam::{Mat4, Vec3};
use palette_raster::rendering::pixel_shader::PALETTE_INDEX_PUDDLE_EVEN_ROW;
use palette_raster::rendering::shading::color_brightness;
use palette_raster::rendering::*;

const BACKGROUND: u32 = 0;

fn pixel(output: &[u32], x: usize, y: usize) -> u32 {
    output[y * WIDTH + x]
}

#[test]
fn test_alpha_tested_discards_transparent_texels() {
    let mut fixture = Fixture::new(1);
    let texture = fixture.texture(2, 1, &[0, 9]);
    let mut call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, texture);
    call.pixel_shader = PixelShaderType::AlphaTested;

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[call], &mut output).unwrap();

    for y in 0..HEIGHT {
        assert_eq!(pixel(&output, WIDTH / 4, y), BACKGROUND);
        assert_eq!(pixel(&output, 3 * WIDTH / 4, y), color_of(9));
    }
    // Discarded pixels keep their depth.
    assert!(fixture.renderer.depth_buffer()[WIDTH / 4].is_infinite());
}

#[test]
fn test_variable_u_minimum_clamps_sampling() {
    let mut fixture = Fixture::new(1);
    let texture = fixture.texture(2, 1, &[0, 9]);
    let mut call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, texture);
    call.pixel_shader = PixelShaderType::AlphaTestedWithVariableTexCoordUMin;
    call.pixel_shader_param = 0.75;

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[call], &mut output).unwrap();
    assert!(output.iter().all(|&c| c == color_of(9)));
}

#[test]
fn test_per_mesh_light_selects_light_table_row() {
    let mut fixture = Fixture::new(2);
    let texture = fixture.texture(1, 1, &[9]);
    let mut bright = fixture.quad([-1.0, -1.0], [0.0, 1.0], 0.5, texture);
    bright.lighting = LightingType::PerMesh(1.0);
    let mut dark = fixture.quad([0.0, -1.0], [1.0, 1.0], 0.5, texture);
    dark.lighting = LightingType::PerMesh(0.0);

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[bright, dark], &mut output).unwrap();

    assert_eq!(pixel(&output, 5, 20), color_of(9));
    assert_eq!(pixel(&output, WIDTH - 5, 20), color_of(19));
}

#[test]
fn test_per_pixel_lights_and_ambient() {
    let mut fixture = Fixture::new(4);
    let texture = fixture.texture(1, 1, &[9]);

    let light = fixture.renderer.try_create_light().unwrap();
    fixture
        .renderer
        .set_light_position(light, Vec3::new(-0.5, 0.0, 0.5))
        .unwrap();
    fixture.renderer.set_light_radius(light, 0.3, 0.4).unwrap();

    let mut call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, texture);
    call.lighting = LightingType::PerPixel(RenderLightIdList::from_slice(&[light]).unwrap());
    fixture.settings.ambient_percent = 0.3;

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[call], &mut output).unwrap();

    // Under the light: full intensity, brightest row.
    assert_eq!(pixel(&output, WIDTH / 4, HEIGHT / 2), color_of(9));
    // Far from it: ambient 0.3 of 4 levels -> level 2.
    assert_eq!(pixel(&output, WIDTH - 2, 1), color_of(29));

    let data = fixture.renderer.profiler_data();
    assert_eq!(data.total_light_count, 1);
}

#[test]
fn test_classic_dithering_darkens_a_checkerboard() {
    let mut fixture = Fixture::new(4);
    let texture = fixture.texture(1, 1, &[9]);
    let mut call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, texture);
    call.lighting = LightingType::PerMesh(0.3);
    fixture.settings.dithering_mode = DitheringMode::Classic;

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[call], &mut output).unwrap();

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let expected = if (x + y) % 2 == 0 { 39 } else { 29 };
            assert_eq!(pixel(&output, x, y), color_of(expected), "({}, {})", x, y);
        }
    }
}

#[test]
fn test_full_light_is_never_dithered() {
    let mut fixture = Fixture::new(4);
    let texture = fixture.texture(1, 1, &[9]);
    let call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, texture);
    fixture.settings.dithering_mode = DitheringMode::Modern;

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[call], &mut output).unwrap();
    assert!(output.iter().all(|&c| c == color_of(9)));
}

#[test]
fn test_palette_index_lookup_remaps_texels() {
    let mut fixture = Fixture::new(1);
    let texture = fixture.texture(1, 1, &[5]);
    let mut row = [0u8; PALETTE_LENGTH];
    row[5] = 123;
    let lookup = fixture.texture(PALETTE_LENGTH, 1, &row);

    let mut call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, texture);
    call.pixel_shader = PixelShaderType::AlphaTestedWithPaletteIndexLookup;
    call.textures[1] = Some(DrawCallTexture::new(lookup));

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[call], &mut output).unwrap();
    assert!(output.iter().all(|&c| c == color_of(123)));
}

#[test]
fn test_previous_brightness_limit_only_draws_over_dark_pixels() {
    let mut fixture = Fixture::new(1);
    let background = fixture.texture(2, 1, &[200, 10]);
    let overlay = fixture.texture(1, 1, &[60]);

    let first = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.5, background);
    let mut second = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.2, overlay);
    let bright = color_brightness(color_of(200));
    let dark = color_brightness(color_of(10));
    assert!(bright > dark);
    second.pixel_shader = PixelShaderType::AlphaTestedWithPreviousBrightnessLimit;
    second.pixel_shader_param = (bright + dark) * 0.5;

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[first, second], &mut output).unwrap();

    assert_eq!(pixel(&output, WIDTH / 4, 10), color_of(200));
    assert_eq!(pixel(&output, 3 * WIDTH / 4, 10), color_of(60));
}

#[test]
fn test_horizon_mirror_reflects_pixels_above_the_horizon() {
    let mut fixture = Fixture::new(1);
    let sky_band = fixture.texture(1, 1, &[50]);
    let puddle = fixture.texture(1, 1, &[PALETTE_INDEX_PUDDLE_EVEN_ROW]);

    let upper = fixture.quad([-1.0, 0.0], [1.0, 1.0], 0.5, sky_band);
    let mut lower = fixture.quad([-1.0, -1.0], [1.0, 0.0], 0.5, puddle);
    lower.pixel_shader = PixelShaderType::AlphaTestedWithHorizonMirror;

    let camera = ndc_camera();
    assert!((camera.horizon_screen_y(HEIGHT) - HEIGHT as f32 * 0.5).abs() < 1e-3);

    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&camera, &[upper, lower], &mut output).unwrap();
    assert!(output.iter().all(|&c| c == color_of(50)));

    // Horizon raised so every reflection leaves the screen: sky fallback.
    let mut raised = camera;
    raised.horizon_ndc.y = 0.5;
    let upper = fixture.quad([-1.0, 0.0], [1.0, 1.0], 0.5, sky_band);
    let mut lower = fixture.quad([-1.0, -1.0], [1.0, 0.0], 0.5, puddle);
    lower.pixel_shader = PixelShaderType::AlphaTestedWithHorizonMirror;
    fixture.render(&raised, &[upper, lower], &mut output).unwrap();
    assert_eq!(pixel(&output, 3, HEIGHT - 1), color_of(77));
    assert_eq!(pixel(&output, 3, 0), color_of(50));
}

#[test]
fn test_raising_door_scales_about_its_pivot() {
    let mut fixture = Fixture::new(1);
    let texture = fixture.texture(1, 1, &[9]);
    let door_transforms = fixture
        .renderer
        .try_create_uniform_buffer(2, std::mem::size_of::<RenderTransform>())
        .unwrap();
    let pivots = fixture
        .renderer
        .try_create_uniform_buffer(1, std::mem::size_of::<Vec3>())
        .unwrap();
    fixture
        .renderer
        .populate_uniform_buffer(
            door_transforms,
            &[
                RenderTransform {
                    scale: Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)),
                    ..RenderTransform::IDENTITY
                },
                RenderTransform {
                    scale: Mat4::from_scale(Vec3::new(1.0, 0.5, 1.0)),
                    ..RenderTransform::IDENTITY
                },
            ],
        )
        .unwrap();
    fixture
        .renderer
        .populate_uniform_at_index(pivots, 0, &Vec3::new(0.0, 0.5, 0.0))
        .unwrap();

    let mut door = fixture.quad([-0.5, -0.5], [0.5, 0.5], 0.5, texture);
    door.vertex_shader = VertexShaderType::RaisingDoor;
    door.pre_scale_translation = Some(UniformRef {
        buffer: pivots,
        index: 0,
    });
    door.transform = UniformRef {
        buffer: door_transforms,
        index: 0,
    };

    // Fully raised: collapses onto the pivot row and draws nothing.
    let mut output = vec![BACKGROUND; WIDTH * HEIGHT];
    fixture.render(&ndc_camera(), &[door.clone()], &mut output).unwrap();
    assert!(output.iter().all(|&c| c == BACKGROUND));
    assert_eq!(fixture.renderer.profiler_data().presented_triangle_count, 0);

    // Half raised: only the upper half (ndc y in [0, 0.5]) remains.
    door.transform.index = 1;
    fixture.render(&ndc_camera(), &[door], &mut output).unwrap();
    let column = WIDTH / 2;
    let row_of = |ndc_y: f32| ((1.0 - ndc_y) * 0.5 * HEIGHT as f32) as usize;
    assert_eq!(pixel(&output, column, row_of(0.25)), color_of(9));
    assert_eq!(pixel(&output, column, row_of(-0.25)), BACKGROUND);
}
