//! Orbit camera controller
//!
//! Left-drag rotates around the target, the wheel dolly-zooms. Angles use
//! the usual spherical convention: `polar` from +Y, `azimuth` around Y
//! starting at +Z.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use winit::event::MouseButton;

use super::Input;
use crate::core::stop_go_eased;
use crate::renderer::Camera;

/// Seconds the auto-pan rests between moves
const PAN_DOWNTIME: f32 = 1.0;
/// Seconds per auto-pan move, rest included
const PAN_PERIOD: f32 = 3.0;

/// Orbit controller state
#[derive(Debug, Clone)]
pub struct OrbitController {
    /// Point the camera orbits, without the auto-pan offset
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Upper polar limit; keeps the camera above the horizon
    pub max_polar: f32,
    /// Radians per screen height of drag
    pub rotate_speed: f32,
    /// Distance factor per wheel line
    pub zoom_step: f32,
    /// World units per auto-pan move
    pub pan_step: f32,
    /// Moves before the auto-pan turns around
    pub pan_steps: u32,
    pan_time: f32,
    pan_offset: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 10.0, 0.0),
            distance: 100.0,
            azimuth: 0.0,
            polar: PI / 3.0,
            min_distance: 40.0,
            max_distance: 200.0,
            max_polar: 0.495 * PI,
            rotate_speed: TAU,
            zoom_step: 0.95,
            pan_step: 4.0,
            pan_steps: 4,
            pan_time: 0.0,
            pan_offset: 0.0,
        }
    }
}

impl OrbitController {
    /// Controller reproducing the view from `position` towards `target`
    #[must_use]
    pub fn looking_from(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length();
        let mut controller = Self {
            target,
            ..Self::default()
        };
        if distance > f32::EPSILON {
            controller.distance = distance;
            controller.azimuth = offset.x.atan2(offset.z);
            controller.polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        }
        controller.clamp();
        controller
    }

    /// Apply this frame's input and auto-pan.
    ///
    /// `viewport_height` converts pixel drags into angles.
    pub fn update(&mut self, input: &Input, viewport_height: u32, delta_time: f32, auto_pan: bool) {
        let drag = input.drag_delta(MouseButton::Left);
        let height = viewport_height.max(1) as f32;
        self.azimuth -= drag.x / height * self.rotate_speed;
        self.polar -= drag.y / height * self.rotate_speed;

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            self.distance *= self.zoom_step.powf(scroll);
        }

        if auto_pan && delta_time.is_finite() && delta_time > 0.0 {
            self.pan_time += delta_time;
            self.pan_offset = self.pan_step * ping_pong(
                stop_go_eased(self.pan_time, PAN_DOWNTIME, PAN_PERIOD),
                self.pan_steps as f32,
            );
        }

        self.clamp();
    }

    fn clamp(&mut self) {
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        self.polar = self.polar.clamp(0.0, self.max_polar);
        self.azimuth = self.azimuth.rem_euclid(TAU);
    }

    /// Current orbit centre, auto-pan included
    #[must_use]
    pub fn focus(&self) -> Vec3 {
        self.target + Vec3::X * self.pan_offset
    }

    /// Camera position for the current angles
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        self.focus()
            + Vec3::new(sin_polar * sin_azimuth, cos_polar, sin_polar * cos_azimuth) * self.distance
    }

    /// Place and orient the camera
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position();
        camera.point_at(self.focus(), Vec3::Y);
    }
}

/// Map a monotonically growing value onto `0..=span..=0` repeatedly
fn ping_pong(value: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let phase = value.rem_euclid(2.0 * span);
    span - (phase - span).abs()
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use winit::event::ElementState;

    use super::*;

    #[test]
    fn test_looking_from_round_trips_position() {
        let controller =
            OrbitController::looking_from(Vec3::new(30.0, 30.0, 100.0), Vec3::new(0.0, 10.0, 0.0));
        assert!((controller.position() - Vec3::new(30.0, 30.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_distance_is_clamped() {
        let mut controller = OrbitController::default();
        let mut input = Input::new();
        input.process_scroll(200.0);
        controller.update(&input, 720, 0.016, false);
        assert_eq!(controller.distance, controller.min_distance);

        input.update();
        input.process_scroll(-500.0);
        controller.update(&input, 720, 0.016, false);
        assert_eq!(controller.distance, controller.max_distance);
    }

    #[test]
    fn test_polar_stays_above_horizon() {
        let mut controller = OrbitController::default();
        let mut input = Input::new();
        input.process_mouse_motion(Vec2::ZERO);
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_motion(Vec2::new(0.0, -5000.0));
        controller.update(&input, 720, 0.016, false);

        assert!((controller.polar - 0.495 * PI).abs() < 1e-6);
        assert!(controller.position().y > controller.target.y);
    }

    #[test]
    fn test_auto_pan_moves_target_along_x() {
        let mut controller = OrbitController::default();
        let input = Input::new();
        let start = controller.focus();

        // Still resting during the first downtime
        controller.update(&input, 720, 0.5, true);
        assert_eq!(controller.focus(), start);

        for _ in 0..10 {
            controller.update(&input, 720, 0.5, true);
        }
        let moved = controller.focus() - start;
        assert!(moved.x > 0.0);
        assert_eq!(moved.y, 0.0);
        assert_eq!(moved.z, 0.0);
    }

    #[test]
    fn test_auto_pan_off_holds_position() {
        let mut controller = OrbitController::default();
        let input = Input::new();
        for _ in 0..6 {
            controller.update(&input, 720, 0.5, true);
        }
        let focus = controller.focus();
        controller.update(&input, 720, 5.0, false);
        assert_eq!(controller.focus(), focus);
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(ping_pong(0.0, 4.0), 0.0);
        assert_eq!(ping_pong(3.0, 4.0), 3.0);
        assert_eq!(ping_pong(4.0, 4.0), 4.0);
        assert_eq!(ping_pong(6.0, 4.0), 2.0);
        assert_eq!(ping_pong(8.0, 4.0), 0.0);
    }
}
