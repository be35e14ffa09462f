use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Raw hardware state for a single frame, fed by the winit event loop.
/// `keys_pressed`/`keys_released` carry this frame's edges and are cleared
/// at end of frame; `keys_held` persists for the duration of the press.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys_held: HashSet<KeyCode>,
    pub keys_pressed: HashSet<KeyCode>,
    pub keys_released: HashSet<KeyCode>,

    /// Raw pointer motion accumulated this frame (device delta, pixels).
    pub mouse_delta: [f32; 2],
    /// Scroll wheel movement this frame (lines).
    pub scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_frame_state(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_delta = [0.0, 0.0];
        self.scroll_delta = 0.0;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Register a key-down event. Key-repeat events while held do not
    /// re-enter `keys_pressed`.
    pub fn key_down(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
        self.keys_released.insert(key);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_key_down_is_a_single_press() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyH);
        input.key_down(KeyCode::KeyH);
        assert!(input.is_key_pressed(KeyCode::KeyH));
        assert_eq!(input.keys_pressed.len(), 1);
    }

    #[test]
    fn held_survives_frame_clear_but_press_does_not() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyW);
        input.clear_frame_state();
        assert!(input.is_key_held(KeyCode::KeyW));
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn release_clears_held() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyB);
        input.key_up(KeyCode::KeyB);
        assert!(!input.is_key_held(KeyCode::KeyB));
        assert!(input.is_key_released(KeyCode::KeyB));
    }
}
