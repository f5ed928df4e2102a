/// Screen-space dither masks.
/// Masks are precomputed for the current resolution so the pixel loop does a
/// single lookup.
use log::debug;

/// 2x2 ordered (Bayer) thresholds.
const BAYER_2X2: [[u8; 2]; 2] = [[0, 2], [3, 1]];

/// Number of modern masks, one per quarter of the light level fraction.
pub const DITHERING_MODERN_MASK_COUNT: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DitheringMode {
    #[default]
    None,
    /// Checkerboard applied to the lower half of each light level.
    Classic,
    /// Four ordered masks keyed by the light level fraction.
    Modern,
}

pub struct DitherBuffer {
    pub width: usize,
    pub height: usize,
    pub mode: DitheringMode,
    /// `mask_count` booleans per pixel.
    masks: Vec<bool>,
    mask_count: usize,
}

impl DitherBuffer {
    pub fn new(width: usize, height: usize, mode: DitheringMode) -> Self {
        let mask_count = match mode {
            DitheringMode::None => 0,
            DitheringMode::Classic => 1,
            DitheringMode::Modern => DITHERING_MODERN_MASK_COUNT,
        };

        let mut masks = vec![false; width * height * mask_count];
        for y in 0..height {
            for x in 0..width {
                let base = (y * width + x) * mask_count;
                match mode {
                    DitheringMode::None => {}
                    DitheringMode::Classic => masks[base] = (x + y) % 2 == 0,
                    DitheringMode::Modern => {
                        let threshold = BAYER_2X2[y % 2][x % 2] as usize;
                        for k in 0..DITHERING_MODERN_MASK_COUNT {
                            masks[base + k] = threshold + k < DITHERING_MODERN_MASK_COUNT - 1;
                        }
                    }
                }
            }
        }

        debug!("dither buffer {}x{} {:?}", width, height, mode);
        Self {
            width,
            height,
            mode,
            masks,
            mask_count,
        }
    }

    /// Rebuild if the resolution or mode changed.
    pub fn update(&mut self, width: usize, height: usize, mode: DitheringMode) {
        if self.width != width || self.height != height || self.mode != mode {
            *self = Self::new(width, height, mode);
        }
    }

    /// Whether the pixel should drop one light level.
    #[inline(always)]
    pub fn should_dither(&self, x: usize, y: usize, fraction: f32) -> bool {
        match self.mode {
            DitheringMode::None => false,
            DitheringMode::Classic => fraction <= 0.5 && self.masks[y * self.width + x],
            DitheringMode::Modern => {
                let k = ((fraction * DITHERING_MODERN_MASK_COUNT as f32) as usize)
                    .min(DITHERING_MODERN_MASK_COUNT - 1);
                self.masks[(y * self.width + x) * self.mask_count + k]
            }
        }
    }
}
