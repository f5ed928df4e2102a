/// Point lights and the per-draw-call light id list.
use super::error::{RenderError, RenderResult};
use super::resources::RenderLightId;
use glam::Vec3;

/// Upper bound on lights contributing to one draw call.
pub const MAX_LIGHTS_PER_DRAW_CALL: usize = 8;

/// World-space point light with linear falloff between two radii.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderLight {
    pub position: Vec3,
    pub start_radius: f32,
    pub end_radius: f32,
}

impl Default for RenderLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            start_radius: 0.0,
            end_radius: 0.0,
        }
    }
}

impl RenderLight {
    /// Contribution in [0, 1] at `point`: full inside the start radius, fading
    /// linearly to zero at the end radius.
    #[inline(always)]
    pub fn intensity_at(&self, point: Vec3) -> f32 {
        let distance = self.position.distance(point);
        if distance <= self.start_radius {
            1.0
        } else if distance >= self.end_radius {
            0.0
        } else {
            let span = self.end_radius - self.start_radius;
            1.0 - ((distance - self.start_radius) / span)
        }
    }
}

/// Fixed-capacity list of light handles carried by a draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderLightIdList {
    ids: [RenderLightId; MAX_LIGHTS_PER_DRAW_CALL],
    count: usize,
}

impl Default for RenderLightIdList {
    fn default() -> Self {
        Self {
            ids: [RenderLightId(0); MAX_LIGHTS_PER_DRAW_CALL],
            count: 0,
        }
    }
}

impl RenderLightIdList {
    pub fn from_slice(ids: &[RenderLightId]) -> RenderResult<Self> {
        if ids.len() > MAX_LIGHTS_PER_DRAW_CALL {
            return Err(RenderError::TooManyLights {
                count: ids.len(),
                max: MAX_LIGHTS_PER_DRAW_CALL,
            });
        }
        let mut list = Self::default();
        list.ids[..ids.len()].copy_from_slice(ids);
        list.count = ids.len();
        Ok(list)
    }

    pub fn push(&mut self, id: RenderLightId) -> RenderResult<()> {
        if self.count == MAX_LIGHTS_PER_DRAW_CALL {
            return Err(RenderError::TooManyLights {
                count: self.count + 1,
                max: MAX_LIGHTS_PER_DRAW_CALL,
            });
        }
        self.ids[self.count] = id;
        self.count += 1;
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[RenderLightId] {
        &self.ids[..self.count]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Resolved lights for one draw call, copied out of the registry before
/// rasterization so workers never touch the light table.
#[derive(Copy, Clone, Debug, Default)]
pub struct ResolvedLights {
    pub lights: [RenderLight; MAX_LIGHTS_PER_DRAW_CALL],
    pub count: usize,
}

impl ResolvedLights {
    /// Ambient floor plus the sum of all light contributions, clamped to [0, 1].
    #[inline(always)]
    pub fn intensity_at(&self, point: Vec3, ambient_percent: f32) -> f32 {
        let mut sum = ambient_percent;
        for light in &self.lights[..self.count] {
            sum += light.intensity_at(point);
            if sum >= 1.0 {
                return 1.0;
            }
        }
        sum.clamp(0.0, 1.0)
    }
}
