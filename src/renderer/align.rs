//! Pixel-grid camera alignment
//!
//! When the scene is rendered at a reduced resolution, panning the camera
//! slides the low-resolution grid across world content and the image
//! shimmers. Snapping the projection bounds so the camera always sits on a
//! whole grid pixel keeps the grid fixed in world space.

use glam::Vec2;

use super::{Camera, Projection};

/// Logical pixel counts of the low-resolution render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
}

impl PixelGrid {
    /// Grid for a render target of `width` x `height` native pixels
    #[must_use]
    pub const fn from_target(width: u32, height: u32, pixel_size: u32) -> Self {
        let pixel_size = if pixel_size == 0 { 1 } else { pixel_size };
        Self {
            width: width / pixel_size,
            height: height / pixel_size,
        }
    }

    /// True when either dimension is zero (e.g. a minimized window)
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Shift the camera frustum so the camera sits on a whole grid pixel.
///
/// Returns the fractional pixel offset that was cancelled, or `None` when
/// alignment is impossible this frame; the frustum is untouched then.
///
/// Only orthographic cameras have a fixed world size per pixel. A
/// perspective camera gets its canonical bounds back and `None`.
pub fn pixel_align_frustum(camera: &mut Camera, aspect: f32, grid: PixelGrid) -> Option<Vec2> {
    if grid.is_degenerate() || !aspect.is_finite() || aspect <= 0.0 {
        return None;
    }
    if camera.projection != Projection::Orthographic {
        reset_frustum(camera, aspect);
        return None;
    }
    if !camera.zoom.is_finite() || camera.zoom <= 0.0 {
        return None;
    }

    let world_width = camera.frustum.width() / camera.zoom;
    let world_height = camera.frustum.height() / camera.zoom;
    let pixel = Vec2::new(
        world_width / grid.width as f32,
        world_height / grid.height as f32,
    );
    if !(pixel.x > 0.0 && pixel.y > 0.0) {
        return None;
    }

    let along = Vec2::new(
        camera.position.dot(camera.right()),
        camera.position.dot(camera.up()),
    );
    let in_pixels = along / pixel;
    // Halves round towards +inf
    let fract = in_pixels - (in_pixels + 0.5).floor();
    let offset = fract * pixel;

    camera.frustum.left = -aspect - offset.x;
    camera.frustum.right = aspect - offset.x;
    camera.frustum.top = 1.0 - offset.y;
    camera.frustum.bottom = -1.0 - offset.y;

    Some(fract)
}

/// Restore canonical bounds. Returns true if the camera was modified.
pub fn reset_frustum(camera: &mut Camera, aspect: f32) -> bool {
    if camera.frustum.is_centered(aspect) {
        return false;
    }
    camera.frustum.left = -aspect;
    camera.frustum.right = aspect;
    camera.frustum.top = 1.0;
    camera.frustum.bottom = -1.0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn square_camera() -> Camera {
        let mut camera = Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.projection = Projection::Orthographic;
        camera.set_aspect(100, 100);
        camera
    }

    /// Horizontal screen position of `point` in grid pixels
    fn screen_x(camera: &Camera, point: Vec3, grid: PixelGrid) -> f32 {
        let ndc = camera.view_projection_matrix().project_point3(point);
        (ndc.x + 1.0) * 0.5 * grid.width as f32
    }

    /// Distance between two sub-pixel phases, wrapping at 1
    fn phase_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(1.0);
        d.min(1.0 - d)
    }

    #[test]
    fn test_grid_from_target() {
        let grid = PixelGrid::from_target(1280, 720, 6);
        assert_eq!(grid, PixelGrid { width: 213, height: 120 });
        assert_eq!(PixelGrid::from_target(10, 10, 0).width, 10);
        assert!(PixelGrid::from_target(5, 100, 6).is_degenerate());
    }

    #[test]
    fn test_integer_pixel_position_has_zero_offset() {
        let mut camera = square_camera();
        // 2 world units over 100 pixels
        camera.position = Vec3::new(3.0 * 0.02, 2.0 * 0.02, 10.0);
        let fract = pixel_align_frustum(&mut camera, 1.0, PixelGrid { width: 100, height: 100 })
            .expect("alignment should run");
        assert!(fract.x.abs() < 1e-4, "fract.x = {}", fract.x);
        assert!(fract.y.abs() < 1e-4, "fract.y = {}", fract.y);
        assert!((camera.frustum.left + 1.0).abs() < 1e-5);
        assert!((camera.frustum.top - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_fractional_offset_is_cancelled() {
        let mut camera = square_camera();
        camera.position = Vec3::new(0.25 * 0.02, 0.0, 10.0);
        let fract = pixel_align_frustum(&mut camera, 1.0, PixelGrid { width: 100, height: 100 })
            .unwrap();
        assert!((fract.x - 0.25).abs() < 1e-4);
        assert!((camera.frustum.left - (-1.0 - 0.25 * 0.02)).abs() < 1e-6);
        assert!((camera.frustum.right - (1.0 - 0.25 * 0.02)).abs() < 1e-6);
    }

    #[test]
    fn test_size_invariant_under_translation() {
        let mut camera = square_camera();
        let grid = PixelGrid { width: 213, height: 120 };
        camera.set_aspect(1280, 720);
        let aspect = camera.aspect;
        let width = camera.frustum.width();
        let height = camera.frustum.height();

        for i in 0..200 {
            let t = i as f32 * 0.137;
            camera.position = Vec3::new(t.sin() * 40.0, t * 0.3, 10.0 + t.cos() * 5.0);
            pixel_align_frustum(&mut camera, aspect, grid).unwrap();
            assert!((camera.frustum.width() - width).abs() < 1e-4);
            assert!((camera.frustum.height() - height).abs() < 1e-4);
        }
    }

    #[test]
    fn test_offset_stays_within_half_pixel() {
        let mut camera = square_camera();
        let grid = PixelGrid { width: 100, height: 100 };
        for i in 0..50 {
            camera.position = Vec3::new(i as f32 * 0.0137, i as f32 * -0.029, 10.0);
            let fract = pixel_align_frustum(&mut camera, 1.0, grid).unwrap();
            assert!(fract.x.abs() <= 0.5 + 1e-4);
            assert!(fract.y.abs() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn test_zero_grid_leaves_frustum_unchanged() {
        let mut camera = square_camera();
        camera.position = Vec3::new(0.123, 0.456, 10.0);
        let before = camera.frustum;

        let narrow = PixelGrid {
            width: 0,
            height: 100,
        };
        let flat = PixelGrid {
            width: 100,
            height: 0,
        };
        assert!(pixel_align_frustum(&mut camera, 1.0, narrow).is_none());
        assert!(pixel_align_frustum(&mut camera, 1.0, flat).is_none());
        assert_eq!(camera.frustum, before);
    }

    #[test]
    fn test_invalid_aspect_or_zoom_is_skipped() {
        let mut camera = square_camera();
        let grid = PixelGrid { width: 100, height: 100 };
        assert!(pixel_align_frustum(&mut camera, f32::NAN, grid).is_none());
        camera.zoom = 0.0;
        assert!(pixel_align_frustum(&mut camera, 1.0, grid).is_none());
    }

    #[test]
    fn test_negative_half_pixel_rounds_up() {
        let mut camera = Camera::new();
        camera.projection = Projection::Orthographic;
        camera.set_aspect(100, 100);
        // 2 world units over 128 pixels: one pixel is exactly 1/64
        camera.position = Vec3::new(-0.5 / 64.0, 0.5 / 64.0, 5.0);
        let grid = PixelGrid { width: 128, height: 128 };

        let fract = pixel_align_frustum(&mut camera, 1.0, grid).unwrap();
        assert_eq!(fract.x, -0.5);
        assert_eq!(fract.y, -0.5);
    }

    #[test]
    fn test_sub_pixel_phase_is_stable_while_panning() {
        let mut camera = square_camera();
        camera.set_aspect(1280, 720);
        camera.zoom = 0.05;
        let aspect = camera.aspect;
        let grid = PixelGrid { width: 213, height: 120 };
        let point = Vec3::new(1.234, 0.567, 0.0);

        pixel_align_frustum(&mut camera, aspect, grid).unwrap();
        let phase = screen_x(&camera, point, grid).fract();

        for _ in 0..200 {
            camera.position.x += 0.004;
            pixel_align_frustum(&mut camera, aspect, grid).unwrap();
            let x = screen_x(&camera, point, grid);
            assert!(
                phase_distance(x, phase) < 1e-3,
                "phase drifted to {} from {phase}",
                x.rem_euclid(1.0)
            );
        }
    }

    #[test]
    fn test_perspective_keeps_bounds_centered() {
        let eye = Vec3::new(0.0, 30.0, 100.0);
        let mut camera = Camera::look_at(eye, Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
        camera.set_aspect(1280, 720);
        let aspect = camera.aspect;
        let grid = PixelGrid { width: 213, height: 120 };
        let point = Vec3::new(5.0, 12.0, 0.0);

        camera.frustum.left -= 0.3;
        assert!(pixel_align_frustum(&mut camera, aspect, grid).is_none());
        assert!(camera.frustum.is_centered(aspect));

        // Small pans move the image smoothly instead of jumping
        let mut last = screen_x(&camera, point, grid);
        for _ in 0..200 {
            camera.position.x += 0.004;
            assert!(pixel_align_frustum(&mut camera, aspect, grid).is_none());
            let x = screen_x(&camera, point, grid);
            assert!((x - last).abs() < 0.05, "screen step {}", (x - last).abs());
            last = x;
        }
    }

    #[test]
    fn test_reset_restores_canonical_bounds() {
        let mut camera = square_camera();
        camera.position = Vec3::new(0.011, 0.0, 10.0);
        pixel_align_frustum(&mut camera, 1.0, PixelGrid { width: 100, height: 100 });
        assert!(!camera.frustum.is_centered(1.0));

        assert!(reset_frustum(&mut camera, 1.0));
        assert!(camera.frustum.is_centered(1.0));
        assert!(!reset_frustum(&mut camera, 1.0));
    }
}
