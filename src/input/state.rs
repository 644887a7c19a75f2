//! Input handling

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Input state manager
#[derive(Debug, Default)]
pub struct Input {
    /// Currently pressed keys
    pressed_keys: HashSet<KeyCode>,
    /// Keys that were just pressed this frame
    just_pressed_keys: HashSet<KeyCode>,
    /// Currently pressed mouse buttons
    pressed_mouse_buttons: HashSet<MouseButton>,
    /// Last cursor position, once one is known
    mouse_position: Option<Vec2>,
    /// Mouse movement delta this frame
    mouse_delta: Vec2,
    /// Scroll wheel delta this frame, in lines
    scroll_delta: f32,
}

impl Input {
    /// Create a new input manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to clear per-frame state
    pub fn update(&mut self) {
        self.just_pressed_keys.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Forget held keys and buttons, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.pressed_mouse_buttons.clear();
    }

    /// Process a keyboard event
    pub fn process_keyboard(&mut self, key_code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.pressed_keys.insert(key_code) {
                    self.just_pressed_keys.insert(key_code);
                }
            }
            ElementState::Released => {
                self.pressed_keys.remove(&key_code);
            }
        }
    }

    /// Process a mouse button event
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pressed_mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.pressed_mouse_buttons.remove(&button);
            }
        }
    }

    /// Process cursor movement; the first position only sets the origin
    pub fn process_mouse_motion(&mut self, position: Vec2) {
        if let Some(previous) = self.mouse_position {
            self.mouse_delta += position - previous;
        }
        self.mouse_position = Some(position);
    }

    /// Process scroll wheel
    pub fn process_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Check if a key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a key was just pressed this frame
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Check if a mouse button is currently pressed
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_mouse_buttons.contains(&button)
    }

    /// Cursor movement this frame while `button` is held
    pub fn drag_delta(&self, button: MouseButton) -> Vec2 {
        if self.is_mouse_button_pressed(button) {
            self.mouse_delta
        } else {
            Vec2::ZERO
        }
    }

    /// Get mouse movement delta this frame
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Get scroll wheel delta this frame
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_motion_sets_origin() {
        let mut input = Input::new();
        input.process_mouse_motion(Vec2::new(500.0, 300.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        input.process_mouse_motion(Vec2::new(510.0, 295.0));
        assert_eq!(input.mouse_delta(), Vec2::new(10.0, -5.0));
    }

    #[test]
    fn test_drag_requires_button() {
        let mut input = Input::new();
        input.process_mouse_motion(Vec2::ZERO);
        input.process_mouse_motion(Vec2::new(4.0, 0.0));
        assert_eq!(input.drag_delta(MouseButton::Left), Vec2::ZERO);

        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.drag_delta(MouseButton::Left), Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_per_frame_reset() {
        let mut input = Input::new();
        input.process_keyboard(KeyCode::F1, ElementState::Pressed);
        input.process_scroll(2.0);
        assert!(input.is_key_just_pressed(KeyCode::F1));

        input.update();
        assert!(!input.is_key_just_pressed(KeyCode::F1));
        assert!(input.is_key_pressed(KeyCode::F1));
        assert_eq!(input.scroll_delta(), 0.0);

        // Key repeat does not re-trigger
        input.process_keyboard(KeyCode::F1, ElementState::Pressed);
        assert!(!input.is_key_just_pressed(KeyCode::F1));
    }
}
