/// Vertex stage: indexed triangle fetch and clip-space transform.
///
/// Triangles are processed in fixed-size structure-of-arrays batches that live on
/// the stack, so the matrix columns are broadcast once per batch and each
/// component row is a straight loop the compiler can vectorize.
use super::buffers::{AttributeBuffer, IndexBuffer, VertexBuffer};
use super::draw_call::VertexShaderType;
use super::error::{RenderError, RenderResult};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Triangles per batch (8 lanes of f32 matches an AVX2 register).
pub const TRIANGLE_BATCH_SIZE: usize = 8;

/// Model transform stored in uniform buffers.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderTransform {
    pub translation: Mat4,
    pub rotation: Mat4,
    pub scale: Mat4,
}

impl Default for RenderTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RenderTransform {
    pub const IDENTITY: Self = Self {
        translation: Mat4::IDENTITY,
        rotation: Mat4::IDENTITY,
        scale: Mat4::IDENTITY,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation: Mat4::from_translation(translation),
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn model(&self) -> Mat4 {
        self.translation * self.rotation * self.scale
    }
}

/// A triangle after vertex shading: clip-space positions and untouched
/// texture coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipTriangle {
    pub positions: [Vec4; 3],
    pub tex_coords: [Vec2; 3],
}

/// Per-draw-call matrices consumed by the vertex stage.
#[derive(Copy, Clone, Debug)]
pub struct VertexTransformSet {
    /// `view_projection * model` for the basic and entity paths.
    pub model_view_projection: Mat4,
    /// `view_projection * translation * rotation` for the raising-door path.
    pub view_projection_no_scale: Mat4,
    pub scale: Mat4,
    pub pre_scale_translation: Vec3,
    pub shader: VertexShaderType,
}

impl VertexTransformSet {
    pub fn new(
        view_projection: Mat4,
        transform: &RenderTransform,
        pre_scale_translation: Vec3,
        shader: VertexShaderType,
    ) -> Self {
        Self {
            model_view_projection: view_projection * transform.model(),
            view_projection_no_scale: view_projection * transform.translation * transform.rotation,
            scale: transform.scale,
            pre_scale_translation,
            shader,
        }
    }

    /// Single-vertex reference path; the batched path must agree with it.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec4 {
        match self.shader {
            VertexShaderType::Basic | VertexShaderType::Entity => {
                self.model_view_projection * p.extend(1.0)
            }
            VertexShaderType::RaisingDoor => {
                let pivot = self.pre_scale_translation;
                let scaled = self.scale.transform_point3(p - pivot) + pivot;
                self.view_projection_no_scale * scaled.extend(1.0)
            }
        }
    }
}

/// Structure-of-arrays scratch for one batch of triangle corners.
struct CornerBatch {
    x: [f32; TRIANGLE_BATCH_SIZE],
    y: [f32; TRIANGLE_BATCH_SIZE],
    z: [f32; TRIANGLE_BATCH_SIZE],
}

impl CornerBatch {
    #[inline(always)]
    fn zeroed() -> Self {
        Self {
            x: [0.0; TRIANGLE_BATCH_SIZE],
            y: [0.0; TRIANGLE_BATCH_SIZE],
            z: [0.0; TRIANGLE_BATCH_SIZE],
        }
    }
}

/// Multiply every lane by `m` (w = 1). Columns are broadcast once.
#[inline(always)]
fn transform_lanes(m: &Mat4, input: &CornerBatch, out: &mut [Vec4; TRIANGLE_BATCH_SIZE], lanes: usize) {
    let c0 = m.x_axis;
    let c1 = m.y_axis;
    let c2 = m.z_axis;
    let c3 = m.w_axis;

    let mut ox = [0.0f32; TRIANGLE_BATCH_SIZE];
    let mut oy = [0.0f32; TRIANGLE_BATCH_SIZE];
    let mut oz = [0.0f32; TRIANGLE_BATCH_SIZE];
    let mut ow = [0.0f32; TRIANGLE_BATCH_SIZE];

    for i in 0..TRIANGLE_BATCH_SIZE {
        let (x, y, z) = (input.x[i], input.y[i], input.z[i]);
        ox[i] = c0.x * x + c1.x * y + c2.x * z + c3.x;
        oy[i] = c0.y * x + c1.y * y + c2.y * z + c3.y;
        oz[i] = c0.z * x + c1.z * y + c2.z * z + c3.z;
        ow[i] = c0.w * x + c1.w * y + c2.w * z + c3.w;
    }

    for i in 0..lanes {
        out[i] = Vec4::new(ox[i], oy[i], oz[i], ow[i]);
    }
}

/// Raising-door pre-pass: `scale * (p - pivot) + pivot`, applied in place.
#[inline(always)]
fn scale_about_pivot(scale: &Mat4, pivot: Vec3, batch: &mut CornerBatch) {
    let s0 = scale.x_axis;
    let s1 = scale.y_axis;
    let s2 = scale.z_axis;
    let s3 = scale.w_axis;

    for i in 0..TRIANGLE_BATCH_SIZE {
        let x = batch.x[i] - pivot.x;
        let y = batch.y[i] - pivot.y;
        let z = batch.z[i] - pivot.z;
        batch.x[i] = s0.x * x + s1.x * y + s2.x * z + s3.x + pivot.x;
        batch.y[i] = s0.y * x + s1.y * y + s2.y * z + s3.y + pivot.y;
        batch.z[i] = s0.z * x + s1.z * y + s2.z * z + s3.z + pivot.z;
    }
}

/// Check every index against the vertex and attribute buffers before the
/// batched loop reads them unchecked.
pub fn validate_indices(
    vertices: &VertexBuffer,
    attributes: &AttributeBuffer,
    indices: &IndexBuffer,
) -> RenderResult<()> {
    let vertex_count = vertices.vertex_count.min(attributes.vertex_count);
    for &index in &indices.indices {
        if index < 0 || index as usize >= vertex_count {
            return Err(RenderError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// Transform every triangle of an indexed mesh, handing each finished
/// `ClipTriangle` to `emit` in index-buffer order.
///
/// Indices must already have passed `validate_indices`.
pub fn shade_triangles<F: FnMut(&ClipTriangle)>(
    vertices: &VertexBuffer,
    attributes: &AttributeBuffer,
    indices: &IndexBuffer,
    transforms: &VertexTransformSet,
    mut emit: F,
) {
    let triangle_count = indices.triangle_count();
    let matrix = match transforms.shader {
        VertexShaderType::Basic | VertexShaderType::Entity => transforms.model_view_projection,
        VertexShaderType::RaisingDoor => transforms.view_projection_no_scale,
    };

    let mut start = 0;
    while start < triangle_count {
        let lanes = (triangle_count - start).min(TRIANGLE_BATCH_SIZE);

        let mut corners = [CornerBatch::zeroed(), CornerBatch::zeroed(), CornerBatch::zeroed()];
        let mut tex_coords = [[Vec2::ZERO; 3]; TRIANGLE_BATCH_SIZE];

        for lane in 0..lanes {
            let base = (start + lane) * 3;
            for corner in 0..3 {
                let index = indices.indices[base + corner] as usize;
                let [x, y, z] = vertices.position(index);
                corners[corner].x[lane] = x;
                corners[corner].y[lane] = y;
                corners[corner].z[lane] = z;
                let [u, v] = attributes.tex_coord(index);
                tex_coords[lane][corner] = Vec2::new(u, v);
            }
        }

        let mut clip = [[Vec4::ZERO; TRIANGLE_BATCH_SIZE]; 3];
        for corner in 0..3 {
            if transforms.shader == VertexShaderType::RaisingDoor {
                scale_about_pivot(
                    &transforms.scale,
                    transforms.pre_scale_translation,
                    &mut corners[corner],
                );
            }
            transform_lanes(&matrix, &corners[corner], &mut clip[corner], lanes);
        }

        for lane in 0..lanes {
            emit(&ClipTriangle {
                positions: [clip[0][lane], clip[1][lane], clip[2][lane]],
                tex_coords: tex_coords[lane],
            });
        }

        start += lanes;
        crate::count_call!(crate::perf::FUNCTION_COUNTERS.vertex_batches);
    }
}
