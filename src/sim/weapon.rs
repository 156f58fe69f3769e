//! Weapon catalog and per-round weapon state
//!
//! `WeaponConfig` is static balance data keyed by `WeaponKind`; `Weapon` is
//! the live state for the selected weapon (fire cooldown, recoil, muzzle
//! flash). Recoil only feeds the weapon pose the presentation layer draws.
//! It never bends the aim rays.

use serde::{Deserialize, Serialize};

/// Selectable weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Tactical pistol: quick, precise, single target
    #[default]
    Pistol,
    /// AK-47: fastest fire rate, slight spread
    Rifle,
    /// AWP: slow, precise, penetrates up to three balloons
    Sniper,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [WeaponKind::Pistol, WeaponKind::Rifle, WeaponKind::Sniper];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::Rifle => "rifle",
            WeaponKind::Sniper => "sniper",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pistol" => Some(WeaponKind::Pistol),
            "rifle" | "ak47" | "ak-47" => Some(WeaponKind::Rifle),
            "sniper" | "awp" => Some(WeaponKind::Sniper),
            _ => None,
        }
    }

    /// Display name
    pub fn title(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Tactical Pistol",
            WeaponKind::Rifle => "AK-47 Assault Rifle",
            WeaponKind::Sniper => "AWP Sniper Rifle",
        }
    }
}

/// Static balance data for one weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponConfig {
    /// Minimum time between shots
    pub fire_cooldown_ms: u64,
    /// Score multiplier applied to each pop
    pub score_multiplier: f32,
    /// Maximum spread ray deviation on each axis (radians)
    pub spread_angle: f32,
    /// Extra rays fired alongside the primary ray
    pub spread_rays: u32,
    /// Balloons one shot may resolve (1 = nearest only)
    pub max_penetration: u32,
    /// Recoil magnitude right after a shot
    pub recoil_amount: f32,
    /// Per-tick recoil decay factor
    pub recoil_recovery: f32,
}

impl WeaponConfig {
    pub fn for_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Pistol => Self {
                fire_cooldown_ms: 150,
                score_multiplier: 1.0,
                spread_angle: 0.0,
                spread_rays: 0,
                max_penetration: 1,
                recoil_amount: 0.08,
                recoil_recovery: 0.75,
            },
            WeaponKind::Rifle => Self {
                fire_cooldown_ms: 120,
                score_multiplier: 1.5,
                spread_angle: 0.012,
                spread_rays: 1,
                max_penetration: 1,
                recoil_amount: 0.15,
                recoil_recovery: 0.7,
            },
            WeaponKind::Sniper => Self {
                fire_cooldown_ms: 1200,
                score_multiplier: 2.0,
                spread_angle: 0.004,
                spread_rays: 3,
                max_penetration: 3,
                recoil_amount: 0.25,
                recoil_recovery: 0.6,
            },
        }
    }

    /// Points for one pop at the given base score
    pub fn points_for(&self, base_score: u32) -> u64 {
        (base_score as f32 * self.score_multiplier).round().max(0.0) as u64
    }
}

/// Recoil below this snaps to zero
pub const RECOIL_EPSILON: f32 = 0.001;
/// How long the muzzle flash stays visible after a shot
pub const MUZZLE_FLASH_MS: f32 = 150.0;

/// Live state of the selected weapon
#[derive(Debug, Clone)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub config: WeaponConfig,
    cooldown_ms: f32,
    recoil: f32,
    flash_ms: f32,
}

impl Weapon {
    pub fn new(kind: WeaponKind, config: WeaponConfig) -> Self {
        Self {
            kind,
            config,
            cooldown_ms: 0.0,
            recoil: 0.0,
            flash_ms: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_ms <= 0.0
    }

    pub fn recoil(&self) -> f32 {
        self.recoil
    }

    pub fn muzzle_flash(&self) -> bool {
        self.flash_ms > 0.0
    }

    /// Consume a trigger pull; false while cooling down
    pub fn try_fire(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.cooldown_ms = self.config.fire_cooldown_ms as f32;
        self.recoil = self.config.recoil_amount;
        self.flash_ms = MUZZLE_FLASH_MS;
        true
    }

    /// Per-tick cooldown countdown and recoil decay
    pub fn update(&mut self, dt_ms: f32) {
        self.cooldown_ms = (self.cooldown_ms - dt_ms).max(0.0);
        self.flash_ms = (self.flash_ms - dt_ms).max(0.0);

        if self.recoil > 0.0 {
            self.recoil *= self.config.recoil_recovery;
            if self.recoil < RECOIL_EPSILON {
                self.recoil = 0.0;
            }
        }
    }

    /// Drop pending cooldown and visual effects
    pub fn reset(&mut self) {
        self.cooldown_ms = 0.0;
        self.recoil = 0.0;
        self.flash_ms = 0.0;
    }
}
