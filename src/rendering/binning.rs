/// Screen-space binning of clipped triangles.
///
/// Key Design Principles:
/// 1. Bins are fixed square tiles that partition the frame without overlap, so a
///    worker that owns a bin owns every pixel in it.
/// 2. Triangles are set up once (NDC, snapped screen positions, attributes over w)
///    into a shared list; bins only hold indices plus a bin-clamped rectangle.
/// 3. Bins are cleared before every draw call and keep their allocations.
use super::error::{RenderError, RenderResult};
use super::vertex::ClipTriangle;
use glam::{Vec2, Vec4};

/// Default bin edge length in pixels.
pub const DEFAULT_BIN_SIZE: usize = 64;

/// Fractional bits of snapped screen coordinates.
pub const SUBPIXEL_BITS: u32 = 8;
pub const SUBPIXEL_SCALE: f32 = (1u32 << SUBPIXEL_BITS) as f32;
const SUBPIXEL_HALF: i64 = 1 << (SUBPIXEL_BITS - 1);

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelRect {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[inline]
    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Edge function on snapped coordinates. Positive for `c` on the inner side of
/// `a -> b` for front-facing triangles.
#[inline(always)]
pub fn edge_function(a: [i64; 2], b: [i64; 2], c: [i64; 2]) -> i64 {
    (c[0] - a[0]) * (b[1] - a[1]) - (c[1] - a[1]) * (b[0] - a[0])
}

/// Top-left fill rule: a pixel center exactly on edge `a -> b` belongs to the
/// triangle only for top or left edges.
#[inline(always)]
pub fn is_top_left(a: [i64; 2], b: [i64; 2]) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dy == 0 && dx < 0) || dy > 0
}

/// Snapped center of pixel `(x, y)`.
#[inline(always)]
pub fn pixel_center_fixed(x: usize, y: usize) -> [i64; 2] {
    [
        ((x as i64) << SUBPIXEL_BITS) + SUBPIXEL_HALF,
        ((y as i64) << SUBPIXEL_BITS) + SUBPIXEL_HALF,
    ]
}

/// First pixel whose center is at or after snapped coordinate `v`, clamped to `[0, limit]`.
#[inline(always)]
fn first_pixel_at_or_after(v: i64, limit: usize) -> usize {
    let one = 1i64 << SUBPIXEL_BITS;
    (v - SUBPIXEL_HALF + one - 1).div_euclid(one).clamp(0, limit as i64) as usize
}

/// First pixel whose center is after snapped coordinate `v`, clamped to `[0, limit]`.
#[inline(always)]
fn first_pixel_after(v: i64, limit: usize) -> usize {
    let one = 1i64 << SUBPIXEL_BITS;
    ((v - SUBPIXEL_HALF).div_euclid(one) + 1).clamp(0, limit as i64) as usize
}

/// Triangle set up for rasterization.
#[derive(Copy, Clone, Debug)]
pub struct RasterTriangle {
    pub clip: [Vec4; 3],
    pub ndc_z: [f32; 3],
    pub screen: [Vec2; 3],
    /// Screen positions snapped to `SUBPIXEL_BITS`.
    pub screen_fixed: [[i64; 2]; 3],
    /// Twice the signed area in snapped units; always positive once binned.
    pub area_fixed: i64,
    pub inv_w: [f32; 3],
    pub uv_over_w: [Vec2; 3],
    pub bounds: PixelRect,
    /// Edges that own pixel centers lying exactly on them, in `w0, w1, w2` order.
    pub top_left: [bool; 3],
}

impl RasterTriangle {
    /// Perspective divide, viewport mapping, back-face cull and bounds.
    /// Returns `None` for culled, degenerate or off-screen triangles.
    pub fn setup(triangle: &ClipTriangle, width: usize, height: usize) -> Option<Self> {
        let mut ndc_z = [0.0f32; 3];
        let mut screen = [Vec2::ZERO; 3];
        let mut screen_fixed = [[0i64; 2]; 3];
        let mut inv_w = [0.0f32; 3];
        let mut uv_over_w = [Vec2::ZERO; 3];

        let (w_f, h_f) = (width as f32, height as f32);
        for i in 0..3 {
            let clip = triangle.positions[i];
            if clip.w <= 0.0 {
                return None;
            }
            let rw = 1.0 / clip.w;
            let ndc_x = clip.x * rw;
            let ndc_y = clip.y * rw;
            ndc_z[i] = clip.z * rw;
            screen[i] = Vec2::new((ndc_x + 1.0) * 0.5 * w_f, (1.0 - ndc_y) * 0.5 * h_f);
            screen_fixed[i] = [
                (screen[i].x * SUBPIXEL_SCALE).round() as i64,
                (screen[i].y * SUBPIXEL_SCALE).round() as i64,
            ];
            inv_w[i] = rw;
            uv_over_w[i] = triangle.tex_coords[i] * rw;
        }

        let area_fixed = edge_function(screen_fixed[0], screen_fixed[1], screen_fixed[2]);
        if area_fixed <= 0 {
            return None;
        }

        // Bounds come from the snapped positions coverage is tested against.
        let [s0, s1, s2] = screen_fixed;
        let min_x = s0[0].min(s1[0]).min(s2[0]);
        let min_y = s0[1].min(s1[1]).min(s2[1]);
        let max_x = s0[0].max(s1[0]).max(s2[0]);
        let max_y = s0[1].max(s1[1]).max(s2[1]);
        let bounds = PixelRect {
            x0: first_pixel_at_or_after(min_x, width),
            y0: first_pixel_at_or_after(min_y, height),
            x1: first_pixel_after(max_x, width),
            y1: first_pixel_after(max_y, height),
        };
        if bounds.is_empty() {
            return None;
        }

        let top_left = [
            is_top_left(screen_fixed[1], screen_fixed[2]),
            is_top_left(screen_fixed[2], screen_fixed[0]),
            is_top_left(screen_fixed[0], screen_fixed[1]),
        ];

        Some(Self {
            clip: triangle.positions,
            ndc_z,
            screen,
            screen_fixed,
            area_fixed,
            inv_w,
            uv_over_w,
            bounds,
            top_left,
        })
    }

    /// Edge values for the center of pixel `(x, y)`, or `None` if not covered.
    #[inline(always)]
    pub fn coverage(&self, x: usize, y: usize) -> Option<[i64; 3]> {
        let p = pixel_center_fixed(x, y);
        let [s0, s1, s2] = self.screen_fixed;
        let w = [
            edge_function(s1, s2, p),
            edge_function(s2, s0, p),
            edge_function(s0, s1, p),
        ];
        for i in 0..3 {
            if w[i] < 0 || (w[i] == 0 && !self.top_left[i]) {
                return None;
            }
        }
        Some(w)
    }
}

/// Reference from a bin to a shared triangle plus the part of its bounds
/// inside the bin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BinEntry {
    pub triangle: u32,
    pub rect: PixelRect,
}

pub struct RasterizerBin {
    pub bin_x: usize,
    pub bin_y: usize,
    pub rect: PixelRect,
    pub entries: Vec<BinEntry>,
}

/// Grid of bins covering the frame plus the triangles of the current draw call.
pub struct BinGrid {
    pub width: usize,
    pub height: usize,
    pub bin_size: usize,
    pub bins_x: usize,
    pub bins_y: usize,
    pub max_triangles_per_bin: Option<usize>,
    bins: Vec<RasterizerBin>,
    triangles: Vec<RasterTriangle>,
}

impl BinGrid {
    pub fn new(
        width: usize,
        height: usize,
        bin_size: usize,
        max_triangles_per_bin: Option<usize>,
    ) -> Self {
        let bin_size = bin_size.max(1);
        let mut grid = Self {
            width: 0,
            height: 0,
            bin_size,
            bins_x: 0,
            bins_y: 0,
            max_triangles_per_bin,
            bins: Vec::new(),
            triangles: Vec::new(),
        };
        grid.resize(width, height);
        grid
    }

    /// Rebuild the bin layout for a new frame size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.bins_x = width.div_ceil(self.bin_size);
        self.bins_y = height.div_ceil(self.bin_size);
        self.triangles.clear();
        self.bins.clear();
        for bin_y in 0..self.bins_y {
            for bin_x in 0..self.bins_x {
                let x0 = bin_x * self.bin_size;
                let y0 = bin_y * self.bin_size;
                self.bins.push(RasterizerBin {
                    bin_x,
                    bin_y,
                    rect: PixelRect {
                        x0,
                        y0,
                        x1: (x0 + self.bin_size).min(width),
                        y1: (y0 + self.bin_size).min(height),
                    },
                    entries: Vec::new(),
                });
            }
        }
    }

    /// Clear all bins (reuse allocations).
    pub fn clear(&mut self) {
        self.triangles.clear();
        for bin in &mut self.bins {
            bin.entries.clear();
        }
    }

    /// Set up `triangle` and append it to every bin its bounds touch.
    /// Returns false if it was culled.
    pub fn insert(&mut self, triangle: &ClipTriangle) -> RenderResult<bool> {
        let Some(raster) = RasterTriangle::setup(triangle, self.width, self.height) else {
            return Ok(false);
        };

        let index = self.triangles.len() as u32;
        let bounds = raster.bounds;
        self.triangles.push(raster);

        let start_x = bounds.x0 / self.bin_size;
        let start_y = bounds.y0 / self.bin_size;
        let end_x = (bounds.x1 - 1) / self.bin_size;
        let end_y = (bounds.y1 - 1) / self.bin_size;

        for bin_y in start_y..=end_y.min(self.bins_y - 1) {
            for bin_x in start_x..=end_x.min(self.bins_x - 1) {
                let bin = &mut self.bins[bin_y * self.bins_x + bin_x];
                if let Some(capacity) = self.max_triangles_per_bin {
                    if bin.entries.len() >= capacity {
                        return Err(RenderError::BinCapacityExceeded {
                            bin_x,
                            bin_y,
                            capacity,
                        });
                    }
                }
                bin.entries.push(BinEntry {
                    triangle: index,
                    rect: bounds.intersect(&bin.rect),
                });
            }
        }

        Ok(true)
    }

    #[inline]
    pub fn bin(&self, bin_x: usize, bin_y: usize) -> &RasterizerBin {
        &self.bins[bin_y * self.bins_x + bin_x]
    }

    #[inline]
    pub fn bins(&self) -> &[RasterizerBin] {
        &self.bins
    }

    #[inline]
    pub fn triangles(&self) -> &[RasterTriangle] {
        &self.triangles
    }

    /// Indices of bins with at least one triangle this draw call.
    pub fn occupied_bins(&self) -> impl Iterator<Item = usize> + '_ {
        self.bins
            .iter()
            .enumerate()
            .filter(|(_, bin)| !bin.entries.is_empty())
            .map(|(i, _)| i)
    }
}
