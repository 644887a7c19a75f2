//! Camera system for 3D rendering
//!
//! The camera carries explicit orthographic frustum bounds that the
//! pixel-grid aligner shifts every frame. Perspective projection only uses
//! `fov`, `aspect` and the clip planes; it ignores the bounds.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Projection model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Projection bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    /// Canonical bounds for an aspect ratio: `-aspect..aspect` by `-1..1`
    #[must_use]
    pub const fn centered(aspect: f32, near: f32, far: f32) -> Self {
        Self {
            left: -aspect,
            right: aspect,
            top: 1.0,
            bottom: -1.0,
            near,
            far,
        }
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Centre of the bounds; zero for canonical bounds
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Whether these are exactly the canonical bounds for `aspect`
    #[must_use]
    pub fn is_centered(&self, aspect: f32) -> bool {
        self.left == -aspect && self.right == aspect && self.top == 1.0 && self.bottom == -1.0
    }
}

/// Camera for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// World orientation; the camera looks down its local -Z
    pub rotation: Quat,
    /// Projection model
    pub projection: Projection,
    /// Projection bounds, mutated by pixel alignment
    pub frustum: Frustum,
    /// Zoom factor; bounds are divided by it
    pub zoom: f32,
    /// Vertical field of view in radians (perspective only)
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
}

impl Camera {
    /// Create a new camera with default settings
    pub fn new() -> Self {
        let aspect = 16.0 / 9.0;
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective,
            frustum: Frustum::centered(aspect, 0.1, 1000.0),
            zoom: 1.0,
            fov: 75.0_f32.to_radians(),
            aspect,
        }
    }

    /// Create a camera at a specific position looking at a target
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut camera = Self::new();
        camera.position = position;
        camera.point_at(target, up);
        camera
    }

    /// Re-orient the camera towards `target`
    pub fn point_at(&mut self, target: Vec3, up: Vec3) {
        if (target - self.position).length_squared() <= f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.rotation = rotation.normalize();
    }

    /// Local +X in world space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Local +Y in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Viewing direction
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        let zoom = self.zoom.max(f32::EPSILON);
        let half_width = self.frustum.width() / (2.0 * zoom);
        let half_height = self.frustum.height() / (2.0 * zoom);
        let center = self.frustum.center();
        let near = self.frustum.near;
        let far = self.frustum.far;

        match self.projection {
            Projection::Orthographic => Mat4::orthographic_rh(
                center.x - half_width,
                center.x + half_width,
                center.y - half_height,
                center.y + half_height,
                near,
                far,
            ),
            Projection::Perspective => Mat4::perspective_rh(self.fov, self.aspect, near, far),
        }
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
        self.frustum.left = -self.aspect;
        self.frustum.right = self.aspect;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_axes() {
        let camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((camera.right() - Vec3::X).length() < 1e-5);
        assert!((camera.up() - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_view_matrix_moves_position_to_origin() {
        let camera = Camera::look_at(Vec3::new(30.0, 30.0, 100.0), Vec3::ZERO, Vec3::Y);
        let origin = camera.view_matrix().transform_point3(camera.position);
        assert!(origin.length() < 1e-3);
    }

    #[test]
    fn test_set_aspect_resets_horizontal_bounds() {
        let mut camera = Camera::new();
        camera.set_aspect(800, 400);
        assert!((camera.aspect - 2.0).abs() < f32::EPSILON);
        assert!(camera.frustum.is_centered(2.0));
    }

    #[test]
    fn test_frustum_center_shift_moves_orthographic_image() {
        let mut camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.projection = Projection::Orthographic;
        camera.set_aspect(100, 100);
        let base = camera.view_projection_matrix().project_point3(Vec3::ZERO);

        camera.frustum.left -= 0.1;
        camera.frustum.right -= 0.1;
        let shifted = camera.view_projection_matrix().project_point3(Vec3::ZERO);

        // Moving the window left moves content right in NDC
        assert!((shifted.x - base.x - 0.1).abs() < 1e-5);
        assert!((shifted.y - base.y).abs() < 1e-6);
    }

    #[test]
    fn test_perspective_ignores_frustum_bounds() {
        let mut camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.set_aspect(100, 100);
        let base = camera.projection_matrix();

        camera.frustum.left -= 0.1;
        camera.frustum.right -= 0.1;
        camera.frustum.top += 0.3;
        assert_eq!(camera.projection_matrix(), base);
    }

    #[test]
    fn test_orthographic_uses_zoom() {
        let mut camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.projection = Projection::Orthographic;
        camera.set_aspect(100, 100);
        camera.zoom = 0.5;

        let edge = camera
            .view_projection_matrix()
            .project_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!((edge.x - 1.0).abs() < 1e-5);
    }
}
