//! Keyboard and mouse state for the demo.
//!
//! Tracks which keys are held, which went down this frame, and the raw mouse
//! motion accumulated since the last frame. Mouse motion comes from device
//! events so it keeps flowing while the cursor is grabbed.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::Movement;

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_delta: Vec2,
}

impl Input {
    /// Create a new input tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key went down this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key is currently held down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Mouse motion accumulated since the last [`begin_frame`](Self::begin_frame).
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Camera movement requested by the held keys.
    pub fn movement(&self) -> Movement {
        Movement {
            forward: self.key_held(KeyCode::KeyW),
            backward: self.key_held(KeyCode::KeyS),
            left: self.key_held(KeyCode::KeyA),
            right: self.key_held(KeyCode::KeyD),
            up: self.key_held(KeyCode::Space),
            down: self.key_held(KeyCode::ShiftLeft) || self.key_held(KeyCode::ShiftRight),
        }
    }

    /// Record a key going down. Repeats of a held key are ignored.
    pub fn press(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    /// Record a key going up.
    pub fn release(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    /// Add raw mouse motion in pixels.
    pub fn add_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta += Vec2::new(dx as f32, dy as f32);
    }

    /// Forget everything held, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.keys_held.clear();
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Clear per-frame state. Call once the frame has consumed the input.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                match event.state {
                    ElementState::Pressed => self.press(key),
                    ElementState::Released => self.release(key),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(!input.key_held(KeyCode::Space));

        input.press(KeyCode::Space);
        assert!(input.key_held(KeyCode::Space));
        assert!(input.key_pressed(KeyCode::Space));

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        // Key repeat does not count as a new press
        input.press(KeyCode::Space);
        assert!(!input.key_pressed(KeyCode::Space));

        input.release(KeyCode::Space);
        assert!(!input.key_held(KeyCode::Space));
    }

    #[test]
    fn test_movement_mapping() {
        let mut input = Input::new();
        input.press(KeyCode::KeyW);
        input.press(KeyCode::KeyD);
        input.press(KeyCode::ShiftRight);

        let movement = input.movement();
        assert!(movement.forward);
        assert!(movement.right);
        assert!(movement.down);
        assert!(!movement.backward && !movement.left && !movement.up);
    }

    #[test]
    fn test_mouse_motion_accumulates() {
        let mut input = Input::new();
        input.add_mouse_motion(3.0, -1.0);
        input.add_mouse_motion(2.0, 4.0);
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 3.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = Input::new();
        input.press(KeyCode::KeyA);
        input.add_mouse_motion(1.0, 1.0);
        input.clear();
        assert!(!input.key_held(KeyCode::KeyA));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
