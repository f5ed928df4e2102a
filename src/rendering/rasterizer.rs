/// Per-bin triangle rasterization.
/// Walks each binned triangle's clamped rectangle, tests pixel centers against
/// the three edge functions, then runs depth, lighting, dithering and the pixel
/// shader for covered pixels.
use super::binning::{BinEntry, RasterTriangle};
use super::dither::DitherBuffer;
use super::framebuffer::PixelTarget;
use super::light::ResolvedLights;
use super::pixel_shader::{Fragment, PixelShaderInputs};
use crate::camera::RenderCamera;
use crate::count_add;
use glam::Vec3;

/// Light source for one draw call, resolved before rasterization.
#[derive(Copy, Clone, Debug)]
pub enum DrawLighting {
    PerMesh(f32),
    PerPixel {
        lights: ResolvedLights,
        ambient_percent: f32,
    },
}

/// Everything a worker needs to rasterize one draw call's bins.
#[derive(Copy, Clone)]
pub struct RasterContext<'a> {
    pub camera: &'a RenderCamera,
    pub shader: PixelShaderInputs<'a>,
    pub lighting: DrawLighting,
    pub dither: &'a DitherBuffer,
    pub enable_depth_read: bool,
    pub enable_depth_write: bool,
}

/// Work counters for one bin.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BinStats {
    pub coverage_tests: u64,
    pub depth_tests: u64,
    pub color_writes: u64,
}

impl BinStats {
    #[inline]
    pub fn accumulate(&mut self, other: BinStats) {
        self.coverage_tests += other.coverage_tests;
        self.depth_tests += other.depth_tests;
        self.color_writes += other.color_writes;
    }
}

impl RasterContext<'_> {
    #[inline(always)]
    fn light_intensity(&self, x: usize, y: usize, depth: f32) -> f32 {
        match self.lighting {
            DrawLighting::PerMesh(percent) => percent.clamp(0.0, 1.0),
            DrawLighting::PerPixel {
                lights,
                ambient_percent,
            } => {
                let width = self.shader.frame_width as f32;
                let height = self.shader.frame_height as f32;
                let ndc = Vec3::new(
                    ((x as f32 + 0.5) / width) * 2.0 - 1.0,
                    1.0 - ((y as f32 + 0.5) / height) * 2.0,
                    depth,
                );
                let world = self.camera.ndc_to_world(ndc);
                lights.intensity_at(world, ambient_percent)
            }
        }
    }

    /// Rasterize every entry of one bin into `target`.
    pub fn rasterize_bin<T: PixelTarget>(
        &self,
        triangles: &[RasterTriangle],
        entries: &[BinEntry],
        target: &mut T,
    ) -> BinStats {
        let mut stats = BinStats::default();
        for entry in entries {
            let triangle = &triangles[entry.triangle as usize];
            stats.accumulate(self.rasterize_triangle(triangle, entry, target));
        }
        count_add!(
            crate::perf::FUNCTION_COUNTERS.triangles_rasterized,
            entries.len() as u64
        );
        stats
    }

    #[inline]
    fn rasterize_triangle<T: PixelTarget>(
        &self,
        tri: &RasterTriangle,
        entry: &BinEntry,
        target: &mut T,
    ) -> BinStats {
        let mut stats = BinStats::default();
        let width = target.width();
        let rect = entry.rect;
        let inv_area = 1.0 / tri.area_fixed as f32;
        let shading = &self.shader.shading;

        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                stats.coverage_tests += 1;
                let Some(w) = tri.coverage(x, y) else {
                    continue;
                };

                let l0 = w[0] as f32 * inv_area;
                let l1 = w[1] as f32 * inv_area;
                let l2 = w[2] as f32 * inv_area;

                let depth = l0 * tri.ndc_z[0] + l1 * tri.ndc_z[1] + l2 * tri.ndc_z[2];
                let index = y * width + x;

                if self.enable_depth_read {
                    stats.depth_tests += 1;
                    if !(depth < target.depth(index)) {
                        continue;
                    }
                }

                // Perspective-correct texture coordinates.
                let inv_w = l0 * tri.inv_w[0] + l1 * tri.inv_w[1] + l2 * tri.inv_w[2];
                let uv = (tri.uv_over_w[0] * l0 + tri.uv_over_w[1] * l1 + tri.uv_over_w[2] * l2)
                    / inv_w;

                let intensity = self.light_intensity(x, y, depth);
                let (mut light_level, fraction) = shading.light_level(intensity);
                if intensity < 1.0 && self.dither.should_dither(x, y, fraction) {
                    light_level = (light_level + 1).min(shading.darkest_level());
                }

                let fragment = Fragment {
                    x,
                    y,
                    u: uv.x,
                    v: uv.y,
                    light_level,
                };
                let Some(palette_index) = self.shader.shade(&fragment, target, index) else {
                    continue;
                };

                target.write(index, palette_index, shading.resolve(palette_index));
                stats.color_writes += 1;
                if self.enable_depth_write {
                    target.set_depth(index, depth);
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::rendering::binning::{BinGrid, PixelRect};
    use crate::rendering::dither::DitheringMode;
    use crate::rendering::draw_call::{PixelShaderType, TextureSamplingType};
    use crate::rendering::pixel_shader::BoundTexture;
    use crate::rendering::shading::ShadingTables;
    use crate::rendering::texture::{PalettedTextureView, PALETTE_LENGTH};
    use crate::rendering::vertex::ClipTriangle;
    use glam::{Vec2, Vec4};

    struct TestTarget {
        width: usize,
        height: usize,
        depth: Vec<f32>,
        indices: Vec<u8>,
        colors: Vec<u32>,
        writes: Vec<u32>,
    }

    impl TestTarget {
        fn new(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                depth: vec![f32::INFINITY; width * height],
                indices: vec![0; width * height],
                colors: vec![0; width * height],
                writes: vec![0; width * height],
            }
        }
    }

    impl PixelTarget for TestTarget {
        fn width(&self) -> usize {
            self.width
        }
        fn full_height(&self) -> usize {
            self.height
        }
        fn rect(&self) -> PixelRect {
            PixelRect {
                x0: 0,
                y0: 0,
                x1: self.width,
                y1: self.height,
            }
        }
        fn depth(&self, index: usize) -> f32 {
            self.depth[index]
        }
        fn set_depth(&mut self, index: usize, depth: f32) {
            self.depth[index] = depth;
        }
        fn palette_index(&self, index: usize) -> u8 {
            self.indices[index]
        }
        fn color(&self, index: usize) -> u32 {
            self.colors[index]
        }
        fn write(&mut self, index: usize, palette_index: u8, color: u32) {
            self.indices[index] = palette_index;
            self.colors[index] = color;
            self.writes[index] += 1;
        }
    }

    fn raster_all(
        triangles: &[ClipTriangle],
        depth_read: bool,
        target: &mut TestTarget,
    ) -> BinStats {
        let palette: Vec<u32> = (0..PALETTE_LENGTH as u32).collect();
        let light_table: Vec<u8> = (0..PALETTE_LENGTH).map(|i| i as u8).collect();
        let texels = [5u8];
        let camera = Camera::new(Vec3::ZERO, 1.0).build();
        let dither = DitherBuffer::new(target.width, target.height, DitheringMode::None);

        let context = RasterContext {
            camera: &camera,
            shader: PixelShaderInputs {
                shader: PixelShaderType::Opaque,
                param: 0.0,
                texture0: BoundTexture {
                    view: PalettedTextureView {
                        width: 1,
                        height: 1,
                        texels: &texels,
                    },
                    sampling: TextureSamplingType::Default,
                },
                texture1: None,
                shading: ShadingTables {
                    palette: &palette,
                    light_table: &light_table,
                    light_level_count: 1,
                },
                frame_width: target.width,
                frame_height: target.height,
                horizon_screen_y: 0.0,
                palette_snapshot: &[],
                sky_palette_index: 0,
            },
            lighting: DrawLighting::PerMesh(1.0),
            dither: &dither,
            enable_depth_read: depth_read,
            enable_depth_write: true,
        };

        let mut grid = BinGrid::new(target.width, target.height, 4, None);
        for tri in triangles {
            grid.insert(tri).unwrap();
        }
        let mut stats = BinStats::default();
        for bin in grid.bins() {
            stats.accumulate(context.rasterize_bin(grid.triangles(), &bin.entries, target));
        }
        stats
    }

    fn tri(points: [[f32; 3]; 3]) -> ClipTriangle {
        ClipTriangle {
            positions: points.map(|[x, y, z]| Vec4::new(x, y, z, 1.0)),
            tex_coords: [Vec2::ZERO; 3],
        }
    }

    #[test]
    fn shared_diagonal_is_drawn_exactly_once() {
        // Full-screen quad split along the diagonal that crosses pixel centers.
        let mut target = TestTarget::new(8, 8);
        let a = tri([[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [-1.0, 1.0, 0.0]]);
        let b = tri([[1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]]);
        let stats = raster_all(&[a, b], false, &mut target);

        assert!(target.writes.iter().all(|&w| w == 1), "{:?}", target.writes);
        assert_eq!(stats.color_writes, 64);
    }

    #[test]
    fn shared_vertical_edge_snapped_onto_centers_leaves_no_gap() {
        // Step the shared edge until its screen x passes the center of column 2
        // while its snapped position still lands on it.
        let mut edge = -0.375f32;
        loop {
            edge = f32::from_bits(edge.to_bits() - 1);
            if (edge + 1.0) * 0.5 * 8.0 > 2.5 {
                break;
            }
        }

        let mut target = TestTarget::new(8, 8);
        let left = [
            tri([[-1.0, -1.0, 0.0], [edge, -1.0, 0.0], [edge, 1.0, 0.0]]),
            tri([[-1.0, -1.0, 0.0], [edge, 1.0, 0.0], [-1.0, 1.0, 0.0]]),
        ];
        let right = [
            tri([[edge, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]]),
            tri([[edge, -1.0, 0.0], [1.0, 1.0, 0.0], [edge, 1.0, 0.0]]),
        ];
        let stats = raster_all(&[left[0], left[1], right[0], right[1]], false, &mut target);

        let column: Vec<u32> = (0..8).map(|y| target.writes[y * 8 + 2]).collect();
        assert_eq!(column, vec![1; 8]);
        assert!(target.writes.iter().all(|&w| w == 1), "{:?}", target.writes);
        assert_eq!(stats.color_writes, 64);
    }

    #[test]
    fn nearer_triangle_wins_regardless_of_order() {
        let near = tri([[-1.0, -1.0, 0.1], [3.0, -1.0, 0.1], [-1.0, 3.0, 0.1]]);
        let far = tri([[-1.0, -1.0, 0.5], [3.0, -1.0, 0.5], [-1.0, 3.0, 0.5]]);

        let mut first = TestTarget::new(8, 8);
        raster_all(&[near, far], true, &mut first);
        let mut second = TestTarget::new(8, 8);
        raster_all(&[far, near], true, &mut second);

        assert!(first.depth.iter().all(|&d| (d - 0.1).abs() < 1e-6));
        assert_eq!(first.depth, second.depth);
        assert_eq!(first.colors, second.colors);
    }

    #[test]
    fn pixel_centers_outside_are_not_tested_or_written() {
        // Tiny triangle away from every pixel center.
        let mut target = TestTarget::new(8, 8);
        let sliver = tri([[-0.99, -0.99, 0.0], [-0.98, -0.99, 0.0], [-0.99, -0.98, 0.0]]);
        let stats = raster_all(&[sliver], true, &mut target);
        assert_eq!(stats.color_writes, 0);
    }
}
