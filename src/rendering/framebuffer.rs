/// Frame buffers for software rendering.
/// Stores depth and palette-index information; final colors go straight into the
/// caller's output slice.
///
/// Memory layout:
/// - Hot metadata (width, height) stored first for bounds checking
/// - Buffers are stored as separate Vecs to allow independent access patterns
use super::binning::PixelRect;
use super::error::{RenderError, RenderResult};
use std::marker::PhantomData;

/// Per-pixel access used by the rasterizer. Indices are global
/// `y * width + x` offsets; implementors only promise access inside `rect()`.
pub trait PixelTarget {
    fn width(&self) -> usize;
    fn full_height(&self) -> usize;
    fn rect(&self) -> PixelRect;

    fn depth(&self, index: usize) -> f32;
    fn set_depth(&mut self, index: usize, depth: f32);
    fn palette_index(&self, index: usize) -> u8;
    fn color(&self, index: usize) -> u32;
    /// Store the shaded palette index and its resolved color.
    fn write(&mut self, index: usize, palette_index: u8, color: u32);
}

pub struct FrameBuffers {
    pub width: usize,
    pub height: usize,
    depth: Vec<f32>,
    palette_indices: Vec<u8>,
    /// Copy of `palette_indices` taken before a draw call that reads other pixels.
    palette_snapshot: Vec<u8>,
}

impl FrameBuffers {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth: vec![f32::INFINITY; size],
            palette_indices: vec![0; size],
            palette_snapshot: vec![0; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth.resize(size, f32::INFINITY);
        self.palette_indices.resize(size, 0);
        self.palette_snapshot.resize(size, 0);
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Frame start: depth to +inf, palette indices to 0. Color is left to the caller.
    pub fn clear(&mut self) {
        self.depth.fill(f32::INFINITY);
        self.palette_indices.fill(0);
    }

    pub fn snapshot_palette_indices(&mut self) {
        self.palette_snapshot.copy_from_slice(&self.palette_indices);
    }

    #[inline]
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    #[inline]
    pub fn palette_indices(&self) -> &[u8] {
        &self.palette_indices
    }

    /// Split the buffers into per-bin tiles sharing the same backing memory.
    pub fn tiles<'a>(&'a mut self, output: &'a mut [u32]) -> RenderResult<FrameTiles<'a>> {
        let expected = self.pixel_count();
        if output.len() != expected {
            return Err(RenderError::OutputSizeMismatch {
                expected,
                actual: output.len(),
            });
        }

        Ok(FrameTiles {
            width: self.width,
            height: self.height,
            depth_ptr: self.depth.as_mut_ptr(),
            index_ptr: self.palette_indices.as_mut_ptr(),
            color_ptr: output.as_mut_ptr(),
            snapshot: &self.palette_snapshot,
            _buffers: PhantomData,
        })
    }
}

/// Shared handle to the frame's buffers for the duration of one draw call.
pub struct FrameTiles<'a> {
    pub width: usize,
    pub height: usize,
    depth_ptr: *mut f32,
    index_ptr: *mut u8,
    color_ptr: *mut u32,
    snapshot: &'a [u8],
    _buffers: PhantomData<&'a mut [u32]>,
}

// Safety: FrameTiles only hands out FrameTiles for caller-supplied rectangles;
// the rasterizer only creates tiles for non-overlapping bins.
unsafe impl Send for FrameTiles<'_> {}
unsafe impl Sync for FrameTiles<'_> {}

impl<'a> FrameTiles<'a> {
    /// View of one rectangle of the frame.
    ///
    /// # Safety
    /// Tiles alive at the same time must not overlap.
    #[inline]
    pub unsafe fn tile(&self, rect: PixelRect) -> FrameTile<'a> {
        debug_assert!(rect.x1 <= self.width && rect.y1 <= self.height);
        FrameTile {
            width: self.width,
            full_height: self.height,
            rect,
            depth_ptr: self.depth_ptr,
            index_ptr: self.index_ptr,
            color_ptr: self.color_ptr,
            _buffers: PhantomData,
        }
    }

    /// Palette indices as they were before the current draw call.
    #[inline]
    pub fn snapshot(&self) -> &'a [u8] {
        self.snapshot
    }
}

/// View into a rectangular tile of the frame.
/// Tiles partition both X and Y. Internally they use raw pointers into the
/// backing buffers; tiles used in parallel never overlap.
pub struct FrameTile<'a> {
    pub width: usize,
    pub full_height: usize,
    pub rect: PixelRect,
    depth_ptr: *mut f32,
    index_ptr: *mut u8,
    color_ptr: *mut u32,
    _buffers: PhantomData<&'a mut [u32]>,
}

// Safety: a FrameTile only touches pixels inside `rect`, and tiles processed in
// parallel are created for disjoint bins.
unsafe impl Send for FrameTile<'_> {}

impl FrameTile<'_> {
    #[inline(always)]
    fn check(&self, index: usize) {
        debug_assert!(self.rect.contains(index % self.width, index / self.width));
    }
}

impl PixelTarget for FrameTile<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn full_height(&self) -> usize {
        self.full_height
    }

    #[inline]
    fn rect(&self) -> PixelRect {
        self.rect
    }

    #[inline(always)]
    fn depth(&self, index: usize) -> f32 {
        self.check(index);
        unsafe { *self.depth_ptr.add(index) }
    }

    #[inline(always)]
    fn set_depth(&mut self, index: usize, depth: f32) {
        self.check(index);
        unsafe {
            *self.depth_ptr.add(index) = depth;
        }
    }

    #[inline(always)]
    fn palette_index(&self, index: usize) -> u8 {
        self.check(index);
        unsafe { *self.index_ptr.add(index) }
    }

    #[inline(always)]
    fn color(&self, index: usize) -> u32 {
        self.check(index);
        unsafe { *self.color_ptr.add(index) }
    }

    #[inline(always)]
    fn write(&mut self, index: usize, palette_index: u8, color: u32) {
        self.check(index);
        unsafe {
            *self.index_ptr.add(index) = palette_index;
            *self.color_ptr.add(index) = color;
        }
    }
}
