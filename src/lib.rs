//! Balloon Shooter - first-person balloon popping arcade game
//!
//! Core modules:
//! - `sim`: Gameplay simulation (session clock, player motion, balloons, weapons)
//! - `tuning`: Data-driven game balance
//! - `audio`: Sound cue catalog and Web Audio synthesis

pub mod audio;
pub mod sim;
pub mod tuning;

pub use sim::{Game, GameEvent, Phase, Snapshot, TickInput};
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, drift vectors are per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena half extent on X and Z (all arenas are 100 x 100)
    pub const ARENA_HALF_EXTENT: f32 = 50.0;
    /// Lowest altitude a balloon may drift to
    pub const ARENA_FLOOR: f32 = 2.0;
    /// Highest altitude a balloon may drift to
    pub const ARENA_CEILING: f32 = 30.0;
    /// How far inside each wall balloons enter
    pub const EDGE_SPAWN_INSET: f32 = 5.0;

    /// Balloon hit sphere radius
    pub const BALLOON_RADIUS: f32 = 1.0;
    /// Number of balloon colors
    pub const BALLOON_COLORS: u8 = 7;

    /// Player collision sphere radius
    pub const PLAYER_RADIUS: f32 = 0.5;
    /// Camera height above the player body center
    pub const EYE_HEIGHT: f32 = 1.1;
    /// Where the player body starts (slightly above ground to let physics settle)
    pub const PLAYER_START: [f32; 3] = [0.0, 3.0, 0.0];
}

/// Uniform sample in `[-half, half)` from a unit sample
#[inline]
pub fn centered(unit: f32, half: f32) -> f32 {
    (unit - 0.5) * 2.0 * half
}

/// Horizontal part of a vector (Y zeroed)
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_range() {
        assert_eq!(centered(0.0, 45.0), -45.0);
        assert_eq!(centered(0.5, 45.0), 0.0);
        assert!(centered(0.999, 45.0) < 45.0);
    }

    #[test]
    fn test_horizontal() {
        assert_eq!(horizontal(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 0.0, 3.0));
    }
}
