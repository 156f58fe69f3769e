//! Input model
//!
//! The platform delivers a held-key map plus discrete events. Events are
//! queued by callbacks and consumed in order by the next tick.

use serde::{Deserialize, Serialize};

/// Gameplay keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Sprint,
    Jump,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Key::Forward),
            "KeyS" | "ArrowDown" => Some(Key::Back),
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "ShiftLeft" | "ShiftRight" => Some(Key::Sprint),
            "Space" => Some(Key::Jump),
            _ => None,
        }
    }
}

/// Which gameplay keys are currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump: bool,
}

impl KeyState {
    pub fn set(&mut self, key: Key, down: bool) {
        match key {
            Key::Forward => self.forward = down,
            Key::Back => self.back = down,
            Key::Left => self.left = down,
            Key::Right => self.right = down,
            Key::Sprint => self.sprint = down,
            Key::Jump => self.jump = down,
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        match key {
            Key::Forward => self.forward,
            Key::Back => self.back,
            Key::Left => self.left,
            Key::Right => self.right,
            Key::Sprint => self.sprint,
            Key::Jump => self.jump,
        }
    }

    /// Release everything (focus loss, round reset)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Movement intent in camera space: x = strafe right, y = forward
    pub fn move_axis(&self) -> (f32, f32) {
        let strafe = self.right as i32 - self.left as i32;
        let forward = self.forward as i32 - self.back as i32;
        (strafe as f32, forward as f32)
    }
}

/// Discrete input events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Primary mouse button pressed
    FireDown,
    /// Platform granted aim capture (pointer lock)
    CaptureAcquired,
    /// Platform revoked aim capture
    CaptureLost,
    /// Platform refused a capture request after accepting it
    CaptureFailed,
    EscapePressed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Forward));
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code("ShiftRight"), Some(Key::Sprint));
        assert_eq!(Key::from_code("Space"), Some(Key::Jump));
        assert_eq!(Key::from_code("KeyQ"), None);
    }

    #[test]
    fn test_move_axis_cancels_opposites() {
        let mut keys = KeyState::default();
        keys.set(Key::Forward, true);
        keys.set(Key::Left, true);
        assert_eq!(keys.move_axis(), (-1.0, 1.0));

        keys.set(Key::Back, true);
        keys.set(Key::Right, true);
        assert_eq!(keys.move_axis(), (0.0, 0.0));

        keys.clear();
        assert!(!keys.is_down(Key::Forward));
    }
}
