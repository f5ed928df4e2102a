/// Pixel shader variants.
///
/// Each variant turns one covered fragment into the palette index to store, or
/// `None` to leave the pixel untouched. Dispatch is a runtime `match`; every
/// variant reads its inputs from `PixelShaderInputs` and the existing pixel
/// through the `PixelTarget`.
use super::draw_call::{PixelShaderType, TextureSamplingType};
use super::framebuffer::PixelTarget;
use super::shading::{color_brightness, ShadingTables};
use super::texture::{PalettedTextureView, PALETTE_INDEX_TRANSPARENT};

// Palette indices with special meaning in light-level textures.
pub const PALETTE_INDEX_LIGHT_LEVEL_LOWEST: u8 = 1;
pub const PALETTE_INDEX_LIGHT_LEVEL_HIGHEST: u8 = 13;
/// Texel value that means "no change" for light-level color textures.
pub const PALETTE_INDEX_LIGHT_LEVEL_NEUTRAL: u8 = 7;
pub const PALETTE_INDEX_LIGHT_LEVEL_SRC1: u8 = 14;
pub const PALETTE_INDEX_LIGHT_LEVEL_SRC2: u8 = 15;
pub const PALETTE_INDEX_LIGHT_LEVEL_DST1: u8 = 158;
pub const PALETTE_INDEX_LIGHT_LEVEL_DST2: u8 = 159;

// Reflective puddle texels.
pub const PALETTE_INDEX_PUDDLE_EVEN_ROW: u8 = 30;
pub const PALETTE_INDEX_PUDDLE_ODD_ROW: u8 = 103;

#[inline(always)]
pub fn is_light_level_texel(texel: u8) -> bool {
    (PALETTE_INDEX_LIGHT_LEVEL_LOWEST..=PALETTE_INDEX_LIGHT_LEVEL_HIGHEST).contains(&texel)
}

#[inline(always)]
pub fn is_puddle_texel(texel: u8) -> bool {
    texel == PALETTE_INDEX_PUDDLE_EVEN_ROW || texel == PALETTE_INDEX_PUDDLE_ODD_ROW
}

/// A texture slot bound for the current draw call.
#[derive(Copy, Clone)]
pub struct BoundTexture<'a> {
    pub view: PalettedTextureView<'a>,
    pub sampling: TextureSamplingType,
}

impl BoundTexture<'_> {
    #[inline(always)]
    fn sample(&self, frag: &Fragment, frame_width: usize, frame_height: usize, param: f32) -> u8 {
        match self.sampling {
            TextureSamplingType::Default => self.view.sample_clamped(frag.u, frag.v),
            TextureSamplingType::ScreenSpaceRepeatY => {
                let u = (frag.x as f32 + 0.5) / frame_width as f32;
                let v = ((frag.y as f32 + 0.5) / frame_height as f32 + param).fract();
                self.view.sample_clamped(u, v)
            }
        }
    }
}

/// Per-draw-call shader state shared by every fragment.
#[derive(Copy, Clone)]
pub struct PixelShaderInputs<'a> {
    pub shader: PixelShaderType,
    pub param: f32,
    pub texture0: BoundTexture<'a>,
    pub texture1: Option<BoundTexture<'a>>,
    pub shading: ShadingTables<'a>,
    pub frame_width: usize,
    pub frame_height: usize,
    /// Screen row of the horizon, with fraction.
    pub horizon_screen_y: f32,
    /// Palette indices from before this draw call.
    pub palette_snapshot: &'a [u8],
    /// Fallback palette index for reflections that leave the screen.
    pub sky_palette_index: u8,
}

/// One covered pixel after interpolation and lighting.
#[derive(Copy, Clone, Debug)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    pub u: f32,
    pub v: f32,
    /// Light level after dithering (0 = brightest).
    pub light_level: usize,
}

impl<'a> PixelShaderInputs<'a> {
    #[inline(always)]
    fn sample0(&self, frag: &Fragment) -> u8 {
        self.texture0
            .sample(frag, self.frame_width, self.frame_height, self.param)
    }

    #[inline(always)]
    fn sample0_at(&self, u: f32, v: f32) -> u8 {
        // Coordinate-minimum shaders only use the default sampling path.
        self.texture0.view.sample_clamped(u, v)
    }

    /// Run the shader for `frag`. `index` is the pixel's offset in `target`.
    #[inline(always)]
    pub fn shade<T: PixelTarget>(&self, frag: &Fragment, target: &T, index: usize) -> Option<u8> {
        let shading = &self.shading;
        match self.shader {
            PixelShaderType::Opaque => Some(shading.shade(frag.light_level, self.sample0(frag))),

            PixelShaderType::OpaqueWithAlphaTestLayer => {
                let layer = self.texture1.map_or(PALETTE_INDEX_TRANSPARENT, |t| {
                    t.sample(frag, self.frame_width, self.frame_height, self.param)
                });
                let texel = if layer != PALETTE_INDEX_TRANSPARENT {
                    layer
                } else {
                    self.sample0(frag)
                };
                Some(shading.shade(frag.light_level, texel))
            }

            PixelShaderType::AlphaTested => {
                let texel = self.sample0(frag);
                alpha_test(texel).map(|t| shading.shade(frag.light_level, t))
            }

            PixelShaderType::AlphaTestedWithVariableTexCoordUMin => {
                let texel = self.sample0_at(frag.u.max(self.param), frag.v);
                alpha_test(texel).map(|t| shading.shade(frag.light_level, t))
            }

            PixelShaderType::AlphaTestedWithVariableTexCoordVMin => {
                let texel = self.sample0_at(frag.u, frag.v.max(self.param));
                alpha_test(texel).map(|t| shading.shade(frag.light_level, t))
            }

            PixelShaderType::AlphaTestedWithPaletteIndexLookup => {
                let texel = alpha_test(self.sample0(frag))?;
                let remapped = match self.texture1 {
                    Some(lookup) => lookup.view.texel(texel as usize, 0),
                    None => texel,
                };
                Some(shading.shade(frag.light_level, remapped))
            }

            PixelShaderType::AlphaTestedWithLightLevelColor => {
                let texel = alpha_test(self.sample0(frag))?;
                if is_light_level_texel(texel) {
                    let offset = texel as i32 - PALETTE_INDEX_LIGHT_LEVEL_NEUTRAL as i32;
                    let level = shading.clamp_level(frag.light_level as i32 + offset);
                    Some(shading.shade(level, target.palette_index(index)))
                } else {
                    Some(light_level_special(texel).unwrap_or_else(|| {
                        shading.shade(frag.light_level, texel)
                    }))
                }
            }

            PixelShaderType::AlphaTestedWithLightLevelOpacity => {
                let texel = alpha_test(self.sample0(frag))?;
                if is_light_level_texel(texel) {
                    let level = shading
                        .clamp_level((texel - PALETTE_INDEX_LIGHT_LEVEL_LOWEST) as i32);
                    Some(shading.shade(level, target.palette_index(index)))
                } else {
                    Some(light_level_special(texel).unwrap_or_else(|| {
                        shading.shade(frag.light_level, texel)
                    }))
                }
            }

            PixelShaderType::AlphaTestedWithPreviousBrightnessLimit => {
                if color_brightness(target.color(index)) > self.param {
                    return None;
                }
                let texel = self.sample0(frag);
                alpha_test(texel).map(|t| shading.shade(frag.light_level, t))
            }

            PixelShaderType::AlphaTestedWithHorizonMirror => {
                let texel = alpha_test(self.sample0(frag))?;
                if !is_puddle_texel(texel) {
                    return Some(shading.shade(frag.light_level, texel));
                }

                let pixel_center_y = frag.y as f32 + 0.5;
                let mirrored_y = (2.0 * self.horizon_screen_y - pixel_center_y).floor();
                if mirrored_y >= 0.0 && (mirrored_y as usize) < self.frame_height {
                    let mirrored_index = mirrored_y as usize * self.frame_width + frag.x;
                    Some(self.palette_snapshot[mirrored_index])
                } else {
                    Some(self.sky_palette_index)
                }
            }
        }
    }
}

#[inline(always)]
fn alpha_test(texel: u8) -> Option<u8> {
    (texel != PALETTE_INDEX_TRANSPARENT).then_some(texel)
}

/// Light-level textures remap two extra texels to fixed palette entries.
#[inline(always)]
fn light_level_special(texel: u8) -> Option<u8> {
    match texel {
        PALETTE_INDEX_LIGHT_LEVEL_SRC1 => Some(PALETTE_INDEX_LIGHT_LEVEL_DST1),
        PALETTE_INDEX_LIGHT_LEVEL_SRC2 => Some(PALETTE_INDEX_LIGHT_LEVEL_DST2),
        _ => None,
    }
}
