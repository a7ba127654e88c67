//! Perspective camera with a cached projection matrix.
//!
//! The projection is only rebuilt when [`Camera::update_projection_matrix`] is
//! called, so changing `fov_y`, `near`, `far` or the aspect ratio has no effect
//! on rendering until the owner commits the change.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3};

/// Uniform buffer layout for camera data shared by every scene pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// World-space eye position (w unused).
    pub camera_pos: [f32; 4],
}

/// A perspective camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Orientation as a unit quaternion. Identity looks down -Z.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
    aspect_ratio: f32,
    projection: Mat4,
}

impl Camera {
    /// Create a perspective camera and compute its projection.
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y,
            near,
            far,
            aspect_ratio,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Width / height of the projection.
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Set the aspect ratio from viewport dimensions.
    ///
    /// Non-positive or non-finite ratios are ignored so the projection can
    /// never be built from a degenerate viewport. The cached matrix is not
    /// touched; call [`update_projection_matrix`](Self::update_projection_matrix).
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        let ratio = width / height;
        if ratio.is_finite() && ratio > 0.0 {
            self.aspect_ratio = ratio;
        }
    }

    /// Rebuild the cached projection from the current parameters (reverse-Z).
    pub fn update_projection_matrix(&mut self) {
        // Reverse-Z: swapping near/far maps the near plane to depth 1.
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near);
    }

    /// The cached projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Orient the camera towards `target`, keeping world +Y as up.
    ///
    /// Does nothing when `target` coincides with the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize();
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Convert the camera to a uniform suitable for GPU upload.
    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            camera_pos: self.position.extend(1.0).to_array(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 250.0)
    }
}
