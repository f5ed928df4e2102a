/// Camera description and the per-frame derived camera data.
/// `Camera` is the mutable input; `RenderCamera` is computed from it once per
/// frame and then only read by every pipeline stage.
use glam::{Mat4, Quat, Vec3, Vec4};

/// Default clip planes.
pub const NEAR_PLANE: f32 = 0.01;
pub const FAR_PLANE: f32 = 5000.0;

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians)
    /// Vertical field of view (radians).
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,
    /// Vertical stretch for non-square pixels. 1.0 leaves the projection alone.
    pub tall_pixel_ratio: f32,
}

impl Camera {
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 60.0f32.to_radians(),
            near: NEAR_PLANE,
            far: FAR_PLANE,
            aspect_ratio,
            tall_pixel_ratio: 1.0,
        }
    }

    /// Update camera orientation to look at a specific target point.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view_matrix = Mat4::look_at_rh(self.position, target, up);
        let rotation_quat = Quat::from_mat4(&view_matrix.inverse());
        let (yaw, pitch, _roll) = rotation_quat.to_euler(glam::EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Get rotation quaternion
    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }

    /// Derive the immutable per-frame camera.
    pub fn build(&self) -> RenderCamera {
        let rotation = self.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;

        let view = Mat4::look_at_rh(self.position, self.position + forward, up);

        // OpenGL-style clip volume: -w <= x, y, z <= w.
        let mut projection = Mat4::perspective_rh_gl(self.fov_y, self.aspect_ratio, self.near, self.far);
        projection.y_axis.y *= self.tall_pixel_ratio;

        let view_projection = projection * view;

        // Side planes through the eye. Directions run along the frustum edges in the
        // center row/column; normals point into the frustum.
        let tan_y = (self.fov_y * 0.5).tan() / self.tall_pixel_ratio;
        let tan_x = tan_y * self.aspect_ratio;
        let left_dir = (forward - right * tan_x).normalize();
        let right_dir = (forward + right * tan_x).normalize();
        let bottom_dir = (forward - up * tan_y).normalize();
        let top_dir = (forward + up * tan_y).normalize();

        let frustum = FrustumSides {
            left: FrustumPlane {
                direction: left_dir,
                normal: left_dir.cross(up).normalize(),
            },
            right: FrustumPlane {
                direction: right_dir,
                normal: up.cross(right_dir).normalize(),
            },
            bottom: FrustumPlane {
                direction: bottom_dir,
                normal: right.cross(bottom_dir).normalize(),
            },
            top: FrustumPlane {
                direction: top_dir,
                normal: top_dir.cross(right).normalize(),
            },
        };

        // Any point at eye height along the horizontal forward direction projects
        // onto the horizon line.
        let flat_forward = Vec3::new(forward.x, 0.0, forward.z);
        let horizon_dir = if flat_forward.length_squared() > 1e-12 {
            flat_forward.normalize()
        } else {
            forward
        };
        let horizon_clip = view_projection * (self.position + horizon_dir).extend(1.0);
        let horizon_ndc = if horizon_clip.w.abs() > f32::EPSILON {
            horizon_clip.truncate() / horizon_clip.w
        } else {
            Vec3::ZERO
        };

        RenderCamera {
            position: self.position,
            forward,
            right,
            up,
            view,
            projection,
            view_projection,
            inverse_view: view.inverse(),
            inverse_projection: projection.inverse(),
            inverse_view_projection: view_projection.inverse(),
            frustum,
            horizon_ndc,
            near: self.near,
            far: self.far,
        }
    }
}

/// One side plane of the view frustum, passing through the eye.
#[derive(Copy, Clone, Debug)]
pub struct FrustumPlane {
    pub direction: Vec3,
    /// Unit normal pointing into the frustum.
    pub normal: Vec3,
}

#[derive(Copy, Clone, Debug)]
pub struct FrustumSides {
    pub left: FrustumPlane,
    pub right: FrustumPlane,
    pub bottom: FrustumPlane,
    pub top: FrustumPlane,
}

/// Per-frame camera data shared read-only by every pipeline stage.
#[derive(Copy, Clone, Debug)]
pub struct RenderCamera {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub inverse_view: Mat4,
    pub inverse_projection: Mat4,
    pub inverse_view_projection: Mat4,
    pub frustum: FrustumSides,
    /// Horizon point in normalized device coordinates.
    pub horizon_ndc: Vec3,
    pub near: f32,
    pub far: f32,
}

impl RenderCamera {
    /// Screen-space row (with fraction) of the horizon for a frame of `height` pixels.
    #[inline]
    pub fn horizon_screen_y(&self, height: usize) -> f32 {
        (1.0 - self.horizon_ndc.y) * 0.5 * height as f32
    }

    /// Project a world point to clip space.
    #[inline]
    pub fn world_to_clip(&self, point: Vec3) -> Vec4 {
        self.view_projection * point.extend(1.0)
    }

    /// Reconstruct the world point under an NDC position.
    #[inline(always)]
    pub fn ndc_to_world(&self, ndc: Vec3) -> Vec3 {
        let world = self.inverse_view_projection * ndc.extend(1.0);
        world.truncate() / world.w
    }
}
