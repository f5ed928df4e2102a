/// Draw call description submitted by the caller each frame.
use super::error::RenderError;
use super::light::RenderLightIdList;
use super::resources::{
    AttributeBufferId, IndexBufferId, ObjectTextureId, UniformBufferId, VertexBufferId,
};

/// Vertex transform variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VertexShaderType {
    /// Model-view-projection.
    Basic = 0,
    /// Scale about a pivot before the model transform (raising/lowering doors).
    RaisingDoor = 1,
    /// Same math as `Basic`; entities take their own path.
    Entity = 2,
}

impl TryFrom<u8> for VertexShaderType {
    type Error = RenderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Basic),
            1 => Ok(Self::RaisingDoor),
            2 => Ok(Self::Entity),
            other => Err(RenderError::UnknownVertexShader(other)),
        }
    }
}

/// Per-pixel shading variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PixelShaderType {
    Opaque = 0,
    OpaqueWithAlphaTestLayer = 1,
    AlphaTested = 2,
    AlphaTestedWithVariableTexCoordUMin = 3,
    AlphaTestedWithVariableTexCoordVMin = 4,
    AlphaTestedWithPaletteIndexLookup = 5,
    AlphaTestedWithLightLevelColor = 6,
    AlphaTestedWithLightLevelOpacity = 7,
    AlphaTestedWithPreviousBrightnessLimit = 8,
    AlphaTestedWithHorizonMirror = 9,
}

impl PixelShaderType {
    pub const ALL: [PixelShaderType; 10] = [
        Self::Opaque,
        Self::OpaqueWithAlphaTestLayer,
        Self::AlphaTested,
        Self::AlphaTestedWithVariableTexCoordUMin,
        Self::AlphaTestedWithVariableTexCoordVMin,
        Self::AlphaTestedWithPaletteIndexLookup,
        Self::AlphaTestedWithLightLevelColor,
        Self::AlphaTestedWithLightLevelOpacity,
        Self::AlphaTestedWithPreviousBrightnessLimit,
        Self::AlphaTestedWithHorizonMirror,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Opaque => "Opaque",
            Self::OpaqueWithAlphaTestLayer => "OpaqueWithAlphaTestLayer",
            Self::AlphaTested => "AlphaTested",
            Self::AlphaTestedWithVariableTexCoordUMin => "AlphaTestedWithVariableTexCoordUMin",
            Self::AlphaTestedWithVariableTexCoordVMin => "AlphaTestedWithVariableTexCoordVMin",
            Self::AlphaTestedWithPaletteIndexLookup => "AlphaTestedWithPaletteIndexLookup",
            Self::AlphaTestedWithLightLevelColor => "AlphaTestedWithLightLevelColor",
            Self::AlphaTestedWithLightLevelOpacity => "AlphaTestedWithLightLevelOpacity",
            Self::AlphaTestedWithPreviousBrightnessLimit => {
                "AlphaTestedWithPreviousBrightnessLimit"
            }
            Self::AlphaTestedWithHorizonMirror => "AlphaTestedWithHorizonMirror",
        }
    }

    /// Whether the variant needs the second texture slot.
    pub fn requires_second_texture(self) -> bool {
        matches!(
            self,
            Self::OpaqueWithAlphaTestLayer | Self::AlphaTestedWithPaletteIndexLookup
        )
    }

    /// Whether the variant reads pixels outside the one it writes.
    pub fn reads_other_pixels(self) -> bool {
        matches!(self, Self::AlphaTestedWithHorizonMirror)
    }
}

impl TryFrom<u8> for PixelShaderType {
    type Error = RenderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(RenderError::UnknownPixelShader(value))
    }
}

/// How a texture slot turns interpolated coordinates into texels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextureSamplingType {
    /// Perspective-correct texture coordinates clamped to [0, 1).
    #[default]
    Default,
    /// Screen-space coordinates, repeating vertically and scrolled by the
    /// shader parameter (animated chasm floors and walls).
    ScreenSpaceRepeatY,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LightingType {
    /// Constant light percent for the whole mesh.
    PerMesh(f32),
    /// Ambient floor plus point lights, evaluated per pixel.
    PerPixel(RenderLightIdList),
}

/// Reference to one element of a uniform buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UniformRef {
    pub buffer: UniformBufferId,
    pub index: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawCallTexture {
    pub id: ObjectTextureId,
    pub sampling: TextureSamplingType,
}

impl DrawCallTexture {
    pub fn new(id: ObjectTextureId) -> Self {
        Self {
            id,
            sampling: TextureSamplingType::Default,
        }
    }
}

/// One mesh + material + transform submission.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub vertex_buffer: VertexBufferId,
    pub attribute_buffer: AttributeBufferId,
    pub index_buffer: IndexBufferId,
    pub textures: [Option<DrawCallTexture>; 2],
    /// `RenderTransform` element used for this mesh.
    pub transform: UniformRef,
    /// `Vec3` pivot for `VertexShaderType::RaisingDoor`.
    pub pre_scale_translation: Option<UniformRef>,
    pub vertex_shader: VertexShaderType,
    pub pixel_shader: PixelShaderType,
    /// Meaning depends on the pixel shader (coordinate minimum, brightness limit,
    /// screen-space animation offset).
    pub pixel_shader_param: f32,
    pub lighting: LightingType,
    pub enable_depth_read: bool,
    pub enable_depth_write: bool,
}

impl DrawCall {
    /// An opaque, fully lit draw call with depth read and write enabled.
    pub fn new(
        vertex_buffer: VertexBufferId,
        attribute_buffer: AttributeBufferId,
        index_buffer: IndexBufferId,
        texture: ObjectTextureId,
        transform: UniformRef,
    ) -> Self {
        Self {
            vertex_buffer,
            attribute_buffer,
            index_buffer,
            textures: [Some(DrawCallTexture::new(texture)), None],
            transform,
            pre_scale_translation: None,
            vertex_shader: VertexShaderType::Basic,
            pixel_shader: PixelShaderType::Opaque,
            pixel_shader_param: 0.0,
            lighting: LightingType::PerMesh(1.0),
            enable_depth_read: true,
            enable_depth_write: true,
        }
    }
}
