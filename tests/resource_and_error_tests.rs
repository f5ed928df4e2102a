// Registry lifecycles and the error paths of frame submission.
mod common;

use common::*;
use glam::Vec3;
use palette_raster::rendering::*;

#[test]
fn test_buffer_contents_round_trip() {
    let mut fixture = Fixture::new(1);
    let renderer = &mut fixture.renderer;

    let vb = renderer.try_create_vertex_buffer(2, 3).unwrap();
    renderer.populate_vertex_buffer(vb, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    assert_eq!(renderer.vertex_buffer(vb).unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let ab = renderer.try_create_attribute_buffer(2, 2).unwrap();
    renderer.populate_attribute_buffer(ab, &[0.0, 0.5, 1.0, 0.25]).unwrap();
    assert_eq!(renderer.attribute_buffer(ab).unwrap(), &[0.0, 0.5, 1.0, 0.25]);

    let ib = renderer.try_create_index_buffer(3).unwrap();
    renderer.populate_index_buffer(ib, &[0, 1, 1]).unwrap();
    assert_eq!(renderer.index_buffer(ib).unwrap(), &[0, 1, 1]);

    let ub = renderer.try_create_uniform_buffer(2, std::mem::size_of::<Vec3>()).unwrap();
    renderer
        .populate_uniform_buffer(ub, &[Vec3::X, Vec3::new(1.0, 2.0, 3.0)])
        .unwrap();
    renderer.populate_uniform_at_index(ub, 0, &Vec3::Z).unwrap();
    assert_eq!(renderer.uniform_element::<Vec3>(ub, 0).unwrap(), Vec3::Z);
    assert_eq!(renderer.uniform_element::<Vec3>(ub, 1).unwrap(), Vec3::new(1.0, 2.0, 3.0));

    let texture = renderer.try_create_object_texture(3, 2, 1).unwrap();
    renderer.populate_object_texture8(texture, &[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(renderer.object_texture_dims(texture).unwrap(), (3, 2));
    assert_eq!(
        renderer.object_texture(texture).unwrap().texels8().unwrap(),
        &[1, 2, 3, 4, 5, 6]
    );

    let light = renderer.try_create_light().unwrap();
    renderer.set_light_position(light, Vec3::new(1.0, 2.0, 3.0)).unwrap();
    renderer.set_light_radius(light, 1.5, 4.0).unwrap();
    let stored = renderer.light(light).unwrap();
    assert_eq!(stored.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!((stored.start_radius, stored.end_radius), (1.5, 4.0));
}

#[test]
fn test_freed_handles_are_invalid_and_reallocation_is_zeroed() {
    let mut fixture = Fixture::new(1);
    let renderer = &mut fixture.renderer;

    let vb = renderer.try_create_vertex_buffer(2, 3).unwrap();
    renderer.populate_vertex_buffer(vb, &[9.0; 6]).unwrap();
    renderer.free_vertex_buffer(vb).unwrap();
    assert!(matches!(
        renderer.vertex_buffer(vb),
        Err(RenderError::InvalidHandle { .. })
    ));
    assert!(matches!(
        renderer.free_vertex_buffer(vb),
        Err(RenderError::InvalidHandle { .. })
    ));

    let again = renderer.try_create_vertex_buffer(2, 3).unwrap();
    assert!(renderer.vertex_buffer(again).unwrap().iter().all(|&v| v == 0.0));

    let texture = renderer.try_create_object_texture(2, 2, 1).unwrap();
    renderer.populate_object_texture8(texture, &[7; 4]).unwrap();
    renderer.free_object_texture(texture).unwrap();
    let texture = renderer.try_create_object_texture(2, 2, 1).unwrap();
    assert_eq!(renderer.object_texture(texture).unwrap().texels8().unwrap(), &[0; 4]);

    let light = renderer.try_create_light().unwrap();
    renderer.free_light(light).unwrap();
    assert!(renderer.set_light_position(light, Vec3::ONE).is_err());
}

#[test]
fn test_registry_capacity_is_enforced() {
    let mut fixture = Fixture::with_settings(
        1,
        RenderInitSettings {
            max_lights: 2,
            ..RenderInitSettings::default()
        },
    );
    let renderer = &mut fixture.renderer;
    let first = renderer.try_create_light().unwrap();
    renderer.try_create_light().unwrap();
    assert!(matches!(
        renderer.try_create_light(),
        Err(RenderError::ResourceExhausted { capacity: 2, .. })
    ));
    renderer.free_light(first).unwrap();
    assert!(renderer.try_create_light().is_ok());
}

#[test]
fn test_populate_with_wrong_length_fails() {
    let mut fixture = Fixture::new(1);
    let renderer = &mut fixture.renderer;

    let vb = renderer.try_create_vertex_buffer(3, 3).unwrap();
    assert!(matches!(
        renderer.populate_vertex_buffer(vb, &[0.0; 8]),
        Err(RenderError::SizeMismatch { expected: 9, actual: 8, .. })
    ));
    let ib = renderer.try_create_index_buffer(3).unwrap();
    assert!(matches!(
        renderer.populate_index_buffer(ib, &[0, 1]),
        Err(RenderError::SizeMismatch { .. })
    ));
    let ub = renderer.try_create_uniform_buffer(1, 12).unwrap();
    assert!(matches!(
        renderer.populate_uniform_buffer(ub, &[RenderTransform::IDENTITY]),
        Err(RenderError::SizeMismatch { .. })
    ));
    assert!(matches!(
        renderer.try_create_object_texture(4, 4, 3),
        Err(RenderError::UnsupportedTexelFormat(3))
    ));
    assert!(matches!(
        renderer.try_create_vertex_buffer(3, 2),
        Err(RenderError::SizeMismatch { .. })
    ));
}

#[test]
fn test_unknown_shader_ids_are_rejected() {
    assert_eq!(PixelShaderType::try_from(2).unwrap(), PixelShaderType::AlphaTested);
    assert_eq!(
        PixelShaderType::try_from(200),
        Err(RenderError::UnknownPixelShader(200))
    );
    assert_eq!(
        VertexShaderType::try_from(1).unwrap(),
        VertexShaderType::RaisingDoor
    );
    assert_eq!(
        VertexShaderType::try_from(3),
        Err(RenderError::UnknownVertexShader(3))
    );
}

#[test]
fn test_output_size_mismatch() {
    let mut fixture = Fixture::new(1);
    let texture = fixture.texture(1, 1, &[3]);
    let call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.0, texture);
    let mut output = vec![0u32; WIDTH * HEIGHT - 1];
    assert_eq!(
        fixture.render(&ndc_camera(), &[call], &mut output),
        Err(RenderError::OutputSizeMismatch {
            expected: WIDTH * HEIGHT,
            actual: WIDTH * HEIGHT - 1,
        })
    );
}

#[test]
fn test_bin_capacity_overflow_fails_the_draw_call() {
    let mut fixture = Fixture::with_settings(
        1,
        RenderInitSettings {
            max_triangles_per_bin: Some(1),
            ..RenderInitSettings::default()
        },
    );
    let texture = fixture.texture(1, 1, &[3]);
    // Both triangles of a full-screen quad land in every bin.
    let call = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.0, texture);
    let mut output = vec![0u32; WIDTH * HEIGHT];
    let result = fixture.render(&ndc_camera(), &[call], &mut output);
    assert!(matches!(
        result,
        Err(RenderError::BinCapacityExceeded { capacity: 1, .. })
    ));
    assert!(output.iter().all(|&c| c == 0));
}

#[test]
fn test_invalid_draw_calls_fail_before_any_pixel_is_written() {
    let mut fixture = Fixture::new(1);
    let texture = fixture.texture(1, 1, &[3]);
    let good = fixture.quad([-1.0, -1.0], [1.0, 1.0], 0.0, texture);
    let camera = ndc_camera();
    let mut output = vec![0u32; WIDTH * HEIGHT];

    // Out-of-range index.
    let mut bad_indices = good.clone();
    bad_indices.index_buffer = fixture.renderer.try_create_index_buffer(3).unwrap();
    fixture
        .renderer
        .populate_index_buffer(bad_indices.index_buffer, &[0, 1, 99])
        .unwrap();
    assert!(matches!(
        fixture.render(&camera, &[good.clone(), bad_indices], &mut output),
        Err(RenderError::IndexOutOfRange { index: 99, .. })
    ));
    assert!(output.iter().all(|&c| c == 0));

    // Shader that needs a second texture.
    let mut layered = good.clone();
    layered.pixel_shader = PixelShaderType::OpaqueWithAlphaTestLayer;
    assert!(matches!(
        fixture.render(&camera, &[layered], &mut output),
        Err(RenderError::MissingTexture { slot: 1, .. })
    ));

    // 32-bit texture bound as a diffuse texture.
    let mut wrong_format = good.clone();
    wrong_format.textures[0] = Some(DrawCallTexture::new(fixture.settings.palette_texture));
    assert!(matches!(
        fixture.render(&camera, &[wrong_format], &mut output),
        Err(RenderError::TexelFormatMismatch { .. })
    ));

    // Freed texture.
    fixture.renderer.free_object_texture(texture).unwrap();
    assert!(matches!(
        fixture.render(&camera, &[good], &mut output),
        Err(RenderError::InvalidHandle { .. })
    ));
    assert!(output.iter().all(|&c| c == 0));
}

#[test]
fn test_too_many_lights_for_one_draw_call() {
    let ids: Vec<RenderLightId> = (0..MAX_LIGHTS_PER_DRAW_CALL as u32 + 1)
        .map(RenderLightId)
        .collect();
    assert!(matches!(
        RenderLightIdList::from_slice(&ids),
        Err(RenderError::TooManyLights { .. })
    ));
    assert!(RenderLightIdList::from_slice(&ids[..MAX_LIGHTS_PER_DRAW_CALL]).is_ok());
}
