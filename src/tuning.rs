//! Data-driven game balance
//!
//! Every gameplay knob lives here with the values the game ships with.
//! A JSON document can override any subset of them; missing fields keep
//! their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::weapon::{WeaponConfig, WeaponKind};

/// Errors produced while loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(&'static str),
}

/// Longest round the clock supports
pub const MAX_ROUND_SECONDS: u32 = 60;

/// Round clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Countdown length in seconds, at most `MAX_ROUND_SECONDS`
    pub round_seconds: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            round_seconds: MAX_ROUND_SECONDS,
        }
    }
}

/// Points awarded per pop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    /// Points for one balloon before the weapon multiplier
    pub base_score: u32,
    /// Flat bonus per extra balloon resolved by one penetrating shot.
    /// Three pops pay 2x this, not 3x.
    pub penetration_bonus_per_extra: u32,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            base_score: 10,
            penetration_bonus_per_extra: 5,
        }
    }
}

/// Balloon population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Balloons placed when a round starts
    pub initial_count: usize,
    /// Cap on simultaneously live balloons
    pub max_live: usize,
    /// Interval between edge spawns while playing
    pub spawn_interval_ms: u64,
    /// Delay before a popped balloon is replaced
    pub respawn_delay_ms: u64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            initial_count: 15,
            max_live: 20,
            spawn_interval_ms: 2000,
            respawn_delay_ms: 1000,
        }
    }
}

/// Player movement and jumping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub base_speed: f32,
    pub sprint_speed: f32,
    /// Vertical velocity of the main jump impulse
    pub jump_force: f32,
    /// Small upward velocity applied before the main impulse
    pub unstick_velocity: f32,
    /// Delay between the unstick pulse and the main impulse
    pub jump_impulse_delay_ms: u64,
    pub jump_cooldown_ms: u64,
    /// Jump lock duration after which a grounded player may force a jump
    pub emergency_jump_ms: u64,
    /// Minimum contact normal Y that counts as standing on something
    pub ground_normal_threshold: f32,
    /// Height under which a settling body counts as grounded
    pub near_ground_height: f32,
    /// Height under which the body is considered resting on the floor
    pub rest_height: f32,
    pub watchdog_interval_ms: u64,
    /// Time since the last jump before the watchdog may reset jump state
    pub watchdog_quiet_ms: u64,
    pub gravity: f32,
    pub restitution: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base_speed: 5.5,
            sprint_speed: 9.0,
            jump_force: 12.0,
            unstick_velocity: 0.5,
            jump_impulse_delay_ms: 10,
            jump_cooldown_ms: 250,
            emergency_jump_ms: 1000,
            ground_normal_threshold: 0.5,
            near_ground_height: 0.6,
            rest_height: 0.55,
            watchdog_interval_ms: 1000,
            watchdog_quiet_ms: 500,
            gravity: -20.0,
            restitution: 0.1,
        }
    }
}

/// Aim capture (pointer lock) handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockTuning {
    /// A capture loss must persist longer than this to pause the game
    pub loss_debounce_ms: u64,
    /// Delay before the second lock attempt on resume
    pub retry_delay_ms: u64,
}

impl Default for LockTuning {
    fn default() -> Self {
        Self {
            loss_debounce_ms: 500,
            retry_delay_ms: 200,
        }
    }
}

/// Weapon catalog
///
/// Each entry deserializes as a partial override of the built-in
/// `WeaponConfig::for_kind` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WeaponTableOverride")]
pub struct WeaponTable {
    pub pistol: WeaponConfig,
    pub rifle: WeaponConfig,
    pub sniper: WeaponConfig,
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            pistol: WeaponConfig::for_kind(WeaponKind::Pistol),
            rifle: WeaponConfig::for_kind(WeaponKind::Rifle),
            sniper: WeaponConfig::for_kind(WeaponKind::Sniper),
        }
    }
}

/// Weapon fields present in a tuning document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WeaponOverride {
    fire_cooldown_ms: Option<u64>,
    score_multiplier: Option<f32>,
    spread_angle: Option<f32>,
    spread_rays: Option<u32>,
    max_penetration: Option<u32>,
    recoil_amount: Option<f32>,
    recoil_recovery: Option<f32>,
}

impl WeaponOverride {
    fn apply(self, kind: WeaponKind) -> WeaponConfig {
        let base = WeaponConfig::for_kind(kind);
        WeaponConfig {
            fire_cooldown_ms: self.fire_cooldown_ms.unwrap_or(base.fire_cooldown_ms),
            score_multiplier: self.score_multiplier.unwrap_or(base.score_multiplier),
            spread_angle: self.spread_angle.unwrap_or(base.spread_angle),
            spread_rays: self.spread_rays.unwrap_or(base.spread_rays),
            max_penetration: self.max_penetration.unwrap_or(base.max_penetration),
            recoil_amount: self.recoil_amount.unwrap_or(base.recoil_amount),
            recoil_recovery: self.recoil_recovery.unwrap_or(base.recoil_recovery),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WeaponTableOverride {
    pistol: WeaponOverride,
    rifle: WeaponOverride,
    sniper: WeaponOverride,
}

impl From<WeaponTableOverride> for WeaponTable {
    fn from(table: WeaponTableOverride) -> Self {
        Self {
            pistol: table.pistol.apply(WeaponKind::Pistol),
            rifle: table.rifle.apply(WeaponKind::Rifle),
            sniper: table.sniper.apply(WeaponKind::Sniper),
        }
    }
}

impl WeaponTable {
    pub fn get(&self, kind: WeaponKind) -> &WeaponConfig {
        match kind {
            WeaponKind::Pistol => &self.pistol,
            WeaponKind::Rifle => &self.rifle,
            WeaponKind::Sniper => &self.sniper,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub session: SessionTuning,
    pub score: ScoreTuning,
    pub spawning: SpawnTuning,
    pub player: PlayerTuning,
    pub lock: LockTuning,
    pub weapons: WeaponTable,
}

impl Tuning {
    /// Parse a (partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall timers or break the round clock
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.session.round_seconds == 0 {
            return Err(TuningError::Invalid("session.round_seconds must be positive"));
        }
        if self.session.round_seconds > MAX_ROUND_SECONDS {
            return Err(TuningError::Invalid("session.round_seconds must be at most 60"));
        }
        if self.spawning.spawn_interval_ms == 0 {
            return Err(TuningError::Invalid("spawning.spawn_interval_ms must be positive"));
        }
        if self.player.watchdog_interval_ms == 0 {
            return Err(TuningError::Invalid("player.watchdog_interval_ms must be positive"));
        }
        if self.spawning.initial_count > self.spawning.max_live {
            return Err(TuningError::Invalid(
                "spawning.initial_count exceeds spawning.max_live",
            ));
        }
        for kind in WeaponKind::ALL {
            let weapon = self.weapons.get(kind);
            if weapon.max_penetration == 0 {
                return Err(TuningError::Invalid("weapon max_penetration must be at least 1"));
            }
            if !(0.0..1.0).contains(&weapon.recoil_recovery) {
                return Err(TuningError::Invalid("weapon recoil_recovery must be in [0, 1)"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "session": { "round_seconds": 30 } }"#).unwrap();
        assert_eq!(tuning.session.round_seconds, 30);
        assert_eq!(tuning.spawning.max_live, 20);
        assert_eq!(tuning.weapons.sniper.max_penetration, 3);
    }

    #[test]
    fn test_rejects_zero_spawn_interval() {
        let err = Tuning::from_json(r#"{ "spawning": { "spawn_interval_ms": 0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_partial_weapon_override() {
        let tuning = Tuning::from_json(r#"{ "weapons": { "sniper": { "max_penetration": 5 } } }"#)
            .unwrap();
        assert_eq!(tuning.weapons.sniper.max_penetration, 5);
        let stock = WeaponConfig::for_kind(WeaponKind::Sniper);
        assert_eq!(tuning.weapons.sniper.fire_cooldown_ms, stock.fire_cooldown_ms);
        assert_eq!(tuning.weapons.sniper.score_multiplier, stock.score_multiplier);
        assert_eq!(tuning.weapons.rifle, WeaponConfig::for_kind(WeaponKind::Rifle));
    }

    #[test]
    fn test_rejects_round_longer_than_clock() {
        let err = Tuning::from_json(r#"{ "session": { "round_seconds": 120 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
        assert!(Tuning::from_json(r#"{ "session": { "round_seconds": 60 } }"#).is_ok());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip_preserves_values() {
        let mut tuning = Tuning::default();
        tuning.score.base_score = 25;
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
