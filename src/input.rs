use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels per wheel "line" for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 120.0;

/// Held / pressed-this-frame / released-this-frame tracking for one kind of button.
#[derive(Debug)]
struct ButtonSet<T> {
    down: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for ButtonSet<T> {
    fn default() -> Self {
        Self {
            down: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> ButtonSet<T> {
    fn apply(&mut self, button: T, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat keeps `down` set; only the first press counts.
                if self.down.insert(button) {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                self.down.remove(&button);
                self.released.insert(button);
            }
        }
    }

    fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }
}

/// Keyboard, mouse and wheel state for the current frame.
///
/// Window events are folded in as they arrive; [`Input::begin_frame`] drops
/// the per-frame edges once the frame has consumed them.
#[derive(Debug, Default)]
pub struct Input {
    keys: ButtonSet<KeyCode>,
    mouse: ButtonSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys.end_frame();
        self.mouse.end_frame();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.keys.apply(key, event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse.apply(*button, *state),
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_position;
                self.mouse_position = new_pos;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / PIXELS_PER_LINE
                    }
                };
            }
            _ => {}
        }
    }

    /// Feed a key transition directly, bypassing winit.
    pub fn key_event(&mut self, key: KeyCode, state: ElementState) {
        self.keys.apply(key, state);
    }

    /// Feed a wheel movement in lines, bypassing winit.
    pub fn scroll_event(&mut self, lines: Vec2) {
        self.scroll_delta += lines;
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys.down.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed.contains(&key)
    }

    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys.released.contains(&key)
    }

    pub fn shift_down(&self) -> bool {
        self.key_down(KeyCode::ShiftLeft) || self.key_down(KeyCode::ShiftRight)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse.down.contains(&button)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse.pressed.contains(&button)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement delta this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame, in lines. Positive y scrolls up.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_an_edge_and_down_is_a_level() {
        let mut input = Input::new();
        input.key_event(KeyCode::Digit1, ElementState::Pressed);
        assert!(input.key_pressed(KeyCode::Digit1));
        assert!(input.key_down(KeyCode::Digit1));

        input.begin_frame();
        // Repeat events while held do not produce a second press.
        input.key_event(KeyCode::Digit1, ElementState::Pressed);
        assert!(!input.key_pressed(KeyCode::Digit1));
        assert!(input.key_down(KeyCode::Digit1));

        input.key_event(KeyCode::Digit1, ElementState::Released);
        assert!(input.key_released(KeyCode::Digit1));
        assert!(!input.key_down(KeyCode::Digit1));
    }

    #[test]
    fn either_shift_counts() {
        let mut input = Input::new();
        assert!(!input.shift_down());
        input.key_event(KeyCode::ShiftRight, ElementState::Pressed);
        assert!(input.shift_down());
    }

    #[test]
    fn scroll_accumulates_until_frame_end() {
        let mut input = Input::new();
        input.scroll_event(Vec2::new(0.0, 1.0));
        input.scroll_event(Vec2::new(0.0, 2.0));
        assert_eq!(input.scroll_delta().y, 3.0);
        input.begin_frame();
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
    }
}
