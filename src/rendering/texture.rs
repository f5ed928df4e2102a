/// Object textures: 8-bit palette indices or 32-bit ARGB colors.
/// Texels are stored row-major with no padding so sampling is a single
/// multiply-add into a flat slice.
use super::error::{RenderError, RenderResult};

/// Palette index that alpha-tested shaders treat as "no pixel".
pub const PALETTE_INDEX_TRANSPARENT: u8 = 0;

/// Entries in a palette and columns in a light table row.
pub const PALETTE_LENGTH: usize = 256;

#[derive(Clone, Debug)]
pub enum TextureTexels {
    Paletted(Vec<u8>),
    TrueColor(Vec<u32>),
}

#[derive(Clone, Debug)]
pub struct ObjectTexture {
    pub width: usize,
    pub height: usize,
    pub texels: TextureTexels,
}

impl ObjectTexture {
    /// Create a zero-filled texture. `bytes_per_texel` must be 1 (palette
    /// indices) or 4 (ARGB).
    pub fn new(width: usize, height: usize, bytes_per_texel: usize) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }

        let count = width * height;
        let texels = match bytes_per_texel {
            1 => TextureTexels::Paletted(vec![0; count]),
            4 => TextureTexels::TrueColor(vec![0; count]),
            other => return Err(RenderError::UnsupportedTexelFormat(other)),
        };

        Ok(Self {
            width,
            height,
            texels,
        })
    }

    #[inline]
    pub fn bytes_per_texel(&self) -> usize {
        match self.texels {
            TextureTexels::Paletted(_) => 1,
            TextureTexels::TrueColor(_) => 4,
        }
    }

    #[inline]
    pub fn byte_count(&self) -> usize {
        self.width * self.height * self.bytes_per_texel()
    }

    #[inline]
    pub fn texels8(&self) -> Option<&[u8]> {
        match &self.texels {
            TextureTexels::Paletted(t) => Some(t),
            TextureTexels::TrueColor(_) => None,
        }
    }

    #[inline]
    pub fn texels32(&self) -> Option<&[u32]> {
        match &self.texels {
            TextureTexels::Paletted(_) => None,
            TextureTexels::TrueColor(t) => Some(t),
        }
    }

    pub fn populate8(&mut self, id: u32, values: &[u8]) -> RenderResult<()> {
        match &mut self.texels {
            TextureTexels::Paletted(t) => copy_texels(t, values),
            TextureTexels::TrueColor(_) => Err(RenderError::TexelFormatMismatch {
                id,
                expected: "8-bit",
            }),
        }
    }

    pub fn populate32(&mut self, id: u32, values: &[u32]) -> RenderResult<()> {
        match &mut self.texels {
            TextureTexels::TrueColor(t) => copy_texels(t, values),
            TextureTexels::Paletted(_) => Err(RenderError::TexelFormatMismatch {
                id,
                expected: "32-bit",
            }),
        }
    }
}

fn copy_texels<T: Copy>(dst: &mut [T], src: &[T]) -> RenderResult<()> {
    if dst.len() != src.len() {
        return Err(RenderError::SizeMismatch {
            kind: "texture",
            expected: dst.len(),
            actual: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

/// Borrowed view of an 8-bit texture used inside the pixel loop.
#[derive(Copy, Clone)]
pub struct PalettedTextureView<'a> {
    pub width: usize,
    pub height: usize,
    pub texels: &'a [u8],
}

impl<'a> PalettedTextureView<'a> {
    pub fn from_texture(texture: &'a ObjectTexture) -> Option<Self> {
        texture.texels8().map(|texels| Self {
            width: texture.width,
            height: texture.height,
            texels,
        })
    }

    /// Sample with texture coordinates clamped to [0, 1).
    #[inline(always)]
    pub fn sample_clamped(&self, u: f32, v: f32) -> u8 {
        let x = ((u * self.width as f32) as isize).clamp(0, self.width as isize - 1) as usize;
        let y = ((v * self.height as f32) as isize).clamp(0, self.height as isize - 1) as usize;
        self.texels[y * self.width + x]
    }

    /// Direct texel fetch for lookup rows (palette index remaps).
    #[inline(always)]
    pub fn texel(&self, x: usize, y: usize) -> u8 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_texel_size() {
        assert_eq!(
            ObjectTexture::new(4, 4, 2).unwrap_err(),
            RenderError::UnsupportedTexelFormat(2)
        );
        assert!(ObjectTexture::new(0, 4, 1).is_err());
    }

    #[test]
    fn clamped_sampling_stays_in_bounds() {
        let mut texture = ObjectTexture::new(2, 2, 1).unwrap();
        texture.populate8(0, &[1, 2, 3, 4]).unwrap();
        let view = PalettedTextureView::from_texture(&texture).unwrap();

        assert_eq!(view.sample_clamped(0.0, 0.0), 1);
        assert_eq!(view.sample_clamped(0.99, 0.0), 2);
        assert_eq!(view.sample_clamped(0.0, 0.99), 3);
        assert_eq!(view.sample_clamped(1.5, 1.5), 4);
        assert_eq!(view.sample_clamped(-0.5, -3.0), 1);
    }

    #[test]
    fn format_mismatch_on_populate() {
        let mut texture = ObjectTexture::new(1, 1, 4).unwrap();
        assert!(texture.populate8(7, &[0]).is_err());
        texture.populate32(7, &[0xFF00FF00]).unwrap();
        assert_eq!(texture.byte_count(), 4);
        assert_eq!(texture.texels32().unwrap()[0], 0xFF00FF00);
    }
}
