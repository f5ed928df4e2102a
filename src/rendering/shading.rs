/// Palette shading utilities.
/// Kept separate from the rasterizer so lighting models
/// can evolve independently of the rasterization pipeline.
///
/// Shading never blends colors: a light intensity becomes a light level, and the
/// light table maps (level, palette index) to another palette index.
use super::error::{RenderError, RenderResult};
use super::resources::ObjectTextureId;
use super::texture::{ObjectTexture, PALETTE_LENGTH};

/// Read-only palette and light table for one frame.
#[derive(Copy, Clone)]
pub struct ShadingTables<'a> {
    /// 256 ARGB colors.
    pub palette: &'a [u32],
    /// `light_level_count` rows of 256 palette indices, brightest row first.
    pub light_table: &'a [u8],
    pub light_level_count: usize,
}

impl<'a> ShadingTables<'a> {
    pub fn from_textures(
        palette_id: ObjectTextureId,
        palette: &'a ObjectTexture,
        light_table_id: ObjectTextureId,
        light_table: &'a ObjectTexture,
    ) -> RenderResult<Self> {
        let palette_texels = palette.texels32().ok_or(RenderError::TexelFormatMismatch {
            id: palette_id.0,
            expected: "32-bit",
        })?;
        if palette_texels.len() != PALETTE_LENGTH {
            return Err(RenderError::SizeMismatch {
                kind: "palette",
                expected: PALETTE_LENGTH,
                actual: palette_texels.len(),
            });
        }

        let table_texels = light_table
            .texels8()
            .ok_or(RenderError::TexelFormatMismatch {
                id: light_table_id.0,
                expected: "8-bit",
            })?;
        if light_table.width != PALETTE_LENGTH {
            return Err(RenderError::SizeMismatch {
                kind: "light table row",
                expected: PALETTE_LENGTH,
                actual: light_table.width,
            });
        }

        Ok(Self {
            palette: palette_texels,
            light_table: table_texels,
            light_level_count: light_table.height,
        })
    }

    #[inline(always)]
    pub fn darkest_level(&self) -> usize {
        self.light_level_count - 1
    }

    /// Light level (0 = brightest) and the fractional part used by dithering.
    #[inline(always)]
    pub fn light_level(&self, intensity: f32) -> (usize, f32) {
        let value = intensity * self.light_level_count as f32;
        let whole = value.floor();
        let fraction = value - whole;
        let clamped = (whole.max(0.0) as usize).min(self.darkest_level());
        (self.darkest_level() - clamped, fraction)
    }

    /// Clamp a signed level into the table.
    #[inline(always)]
    pub fn clamp_level(&self, level: i32) -> usize {
        level.clamp(0, self.darkest_level() as i32) as usize
    }

    #[inline(always)]
    pub fn shade(&self, level: usize, palette_index: u8) -> u8 {
        self.light_table[level * PALETTE_LENGTH + palette_index as usize]
    }

    #[inline(always)]
    pub fn resolve(&self, palette_index: u8) -> u32 {
        self.palette[palette_index as usize]
    }
}

/// Perceived brightness of an ARGB color in [0, 1].
#[inline(always)]
pub fn color_brightness(color: u32) -> f32 {
    let r = (color >> 16) & 0xFF;
    let g = (color >> 8) & 0xFF;
    let b = color & 0xFF;
    (r + g + b) as f32 / (3.0 * 255.0)
}
