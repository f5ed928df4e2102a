/// Geometry and uniform buffers owned by the renderer.
///
/// Buffers are allocated with a declared element count and zero-filled; the
/// populate calls must supply exactly that many elements.
use super::error::{RenderError, RenderResult};
use bytemuck::Pod;

/// Vertex positions, `components_per_vertex` floats per vertex (3 for meshes).
pub struct VertexBuffer {
    pub vertex_count: usize,
    pub components_per_vertex: usize,
    pub data: Vec<f32>,
}

impl VertexBuffer {
    pub fn new(vertex_count: usize, components_per_vertex: usize) -> Self {
        Self {
            vertex_count,
            components_per_vertex,
            data: vec![0.0; vertex_count * components_per_vertex],
        }
    }

    pub fn populate(&mut self, values: &[f32]) -> RenderResult<()> {
        copy_exact("vertex buffer", &mut self.data, values)
    }

    /// Position of vertex `i`. Callers validate `i` against `vertex_count` first.
    #[inline(always)]
    pub fn position(&self, i: usize) -> [f32; 3] {
        let base = i * self.components_per_vertex;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }
}

/// Per-vertex attributes; currently texture coordinates (2 floats per vertex).
pub struct AttributeBuffer {
    pub vertex_count: usize,
    pub components_per_vertex: usize,
    pub data: Vec<f32>,
}

impl AttributeBuffer {
    pub fn new(vertex_count: usize, components_per_vertex: usize) -> Self {
        Self {
            vertex_count,
            components_per_vertex,
            data: vec![0.0; vertex_count * components_per_vertex],
        }
    }

    pub fn populate(&mut self, values: &[f32]) -> RenderResult<()> {
        copy_exact("attribute buffer", &mut self.data, values)
    }

    #[inline(always)]
    pub fn tex_coord(&self, i: usize) -> [f32; 2] {
        let base = i * self.components_per_vertex;
        [self.data[base], self.data[base + 1]]
    }
}

/// Triangle list indices. Every three indices form one triangle.
pub struct IndexBuffer {
    pub indices: Vec<i32>,
}

impl IndexBuffer {
    pub fn new(index_count: usize) -> Self {
        Self {
            indices: vec![0; index_count],
        }
    }

    pub fn populate(&mut self, values: &[i32]) -> RenderResult<()> {
        copy_exact("index buffer", &mut self.indices, values)
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Array of fixed-size plain-old-data blocks (transforms, translations, ...).
/// Stored as bytes so one buffer type serves every uniform layout.
pub struct UniformBuffer {
    pub element_count: usize,
    pub element_size: usize,
    pub bytes: Vec<u8>,
}

impl UniformBuffer {
    pub fn new(element_count: usize, element_size: usize) -> Self {
        Self {
            element_count,
            element_size,
            bytes: vec![0; element_count * element_size],
        }
    }

    fn check_layout<T: Pod>(&self) -> RenderResult<()> {
        let size = std::mem::size_of::<T>();
        if size != self.element_size {
            return Err(RenderError::SizeMismatch {
                kind: "uniform element bytes",
                expected: self.element_size,
                actual: size,
            });
        }
        Ok(())
    }

    pub fn populate<T: Pod>(&mut self, values: &[T]) -> RenderResult<()> {
        self.check_layout::<T>()?;
        if values.len() != self.element_count {
            return Err(RenderError::SizeMismatch {
                kind: "uniform buffer",
                expected: self.element_count,
                actual: values.len(),
            });
        }
        self.bytes.copy_from_slice(bytemuck::cast_slice(values));
        Ok(())
    }

    pub fn populate_at_index<T: Pod>(&mut self, index: usize, value: &T) -> RenderResult<()> {
        self.check_layout::<T>()?;
        if index >= self.element_count {
            return Err(RenderError::SizeMismatch {
                kind: "uniform index",
                expected: self.element_count,
                actual: index + 1,
            });
        }
        let start = index * self.element_size;
        self.bytes[start..start + self.element_size].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    /// Read element `index` as `T`. The byte storage has no alignment guarantee,
    /// so the element is copied out.
    pub fn get<T: Pod>(&self, index: usize) -> RenderResult<T> {
        self.check_layout::<T>()?;
        if index >= self.element_count {
            return Err(RenderError::SizeMismatch {
                kind: "uniform index",
                expected: self.element_count,
                actual: index + 1,
            });
        }
        let start = index * self.element_size;
        Ok(bytemuck::pod_read_unaligned(
            &self.bytes[start..start + self.element_size],
        ))
    }
}

fn copy_exact<T: Copy>(kind: &'static str, dst: &mut [T], src: &[T]) -> RenderResult<()> {
    if dst.len() != src.len() {
        return Err(RenderError::SizeMismatch {
            kind,
            expected: dst.len(),
            actual: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}
