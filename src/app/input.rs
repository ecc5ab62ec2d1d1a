//! Platform-agnostic input state.
//!
//! Window adapters (see `app::winit`) translate their events into these types,
//! so the viewer and the orbit controls never depend on a GUI library.

use glam::Vec2;
use rustc_hash::FxHashSet;

/// Keys the viewer reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Digit(u8),
    G,
    R,
    Escape,
}

/// Mouse button enumeration
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Button state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Per-frame input snapshot.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pressed_keys: FxHashSet<Key>,
    just_pressed_keys: FxHashSet<Key>,
    pressed_mouse: FxHashSet<MouseButton>,

    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    screen_size: Vec2,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame state (just-pressed keys and deltas).
    pub fn end_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn inject_key(&mut self, key: Key, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if self.pressed_keys.insert(key) {
                    self.just_pressed_keys.insert(key);
                }
            }
            ButtonState::Released => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    pub fn inject_mouse_button(&mut self, button: MouseButton, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                self.pressed_mouse.insert(button);
            }
            ButtonState::Released => {
                self.pressed_mouse.remove(&button);
            }
        }
    }

    /// The first position only establishes the origin; deltas start after it.
    pub fn inject_mouse_position(&mut self, x: f32, y: f32) {
        let new_pos = Vec2::new(x, y);
        if let Some(previous) = self.mouse_position {
            self.mouse_delta += new_pos - previous;
        }
        self.mouse_position = Some(new_pos);
    }

    pub fn inject_scroll(&mut self, delta_x: f32, delta_y: f32) {
        self.scroll_delta += Vec2::new(delta_x, delta_y);
    }

    pub fn inject_resize(&mut self, width: u32, height: u32) {
        self.screen_size = Vec2::new(width as f32, height as f32);
    }

    #[must_use]
    pub fn key_down(&self, key: Key) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Keys pressed since the last [`end_frame`](Self::end_frame).
    pub fn keys_down(&self) -> impl Iterator<Item = Key> + '_ {
        self.just_pressed_keys.iter().copied()
    }

    #[must_use]
    pub fn mouse_button(&self, button: MouseButton) -> bool {
        self.pressed_mouse.contains(&button)
    }

    #[must_use]
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    #[must_use]
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    #[must_use]
    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }
}
