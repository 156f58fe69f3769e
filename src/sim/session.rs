//! Round clock and session phase machine
//!
//! `Session` is the single source of truth for score, remaining time and the
//! current phase. It is handed explicitly to whatever needs it; nothing in
//! the crate keeps game state in globals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::arena::ArenaKind;
use super::weapon::WeaponKind;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Title screen
    #[default]
    Idle,
    /// Choosing a weapon
    WeaponSelect,
    /// Choosing an arena
    MapSelect,
    /// Round in progress
    Playing,
    /// Round suspended
    Paused,
    /// Countdown expired or round forced to end
    GameOver,
}

impl Phase {
    /// Whether `self -> to` is a legal edge of the phase machine
    pub fn can_transition(self, to: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, to),
            (Idle, WeaponSelect)
                | (WeaponSelect, MapSelect)
                | (WeaponSelect, Idle)
                | (MapSelect, Playing)
                | (MapSelect, WeaponSelect)
                | (Playing, Paused)
                | (Playing, GameOver)
                | (Paused, Playing)
                | (Paused, WeaponSelect)
                | (Paused, MapSelect)
                | (Paused, Idle)
                | (GameOver, WeaponSelect)
                | (GameOver, MapSelect)
                | (GameOver, Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::WeaponSelect => "WeaponSelect",
            Phase::MapSelect => "MapSelect",
            Phase::Playing => "Playing",
            Phase::Paused => "Paused",
            Phase::GameOver => "GameOver",
        }
    }
}

/// Rejected phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal phase transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}

/// Result of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Not playing; the clock did not move
    Ignored,
    /// Seconds left after this tick
    Running(u32),
    /// This tick reached zero and ended the round
    Expired,
}

/// One play-through
#[derive(Debug, Clone)]
pub struct Session {
    score: u64,
    time_remaining: u32,
    phase: Phase,
    weapon: WeaponKind,
    arena: ArenaKind,
    round_seconds: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(60)
    }
}

impl Session {
    pub fn new(round_seconds: u32) -> Self {
        Self {
            score: 0,
            time_remaining: round_seconds,
            phase: Phase::Idle,
            weapon: WeaponKind::default(),
            arena: ArenaKind::default(),
            round_seconds,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn weapon(&self) -> WeaponKind {
        self.weapon
    }

    pub fn arena(&self) -> ArenaKind {
        self.arena
    }

    pub fn round_seconds(&self) -> u32 {
        self.round_seconds
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    fn transition(&mut self, to: Phase) -> Result<(), TransitionError> {
        let from = self.phase;
        if !from.can_transition(to) {
            log::warn!("Rejected phase transition {:?} -> {:?}", from, to);
            return Err(TransitionError { from, to });
        }
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.phase = to;
        Ok(())
    }

    fn reset_round(&mut self) {
        self.score = 0;
        self.time_remaining = self.round_seconds;
    }

    /// Reject `to` unless the session is currently in `from`
    fn require(&self, from: Phase, to: Phase) -> Result<(), TransitionError> {
        if self.phase != from {
            log::warn!("{:?} -> {:?} only allowed from {:?}", self.phase, to, from);
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }
        Ok(())
    }

    /// Title screen -> weapon selection
    pub fn start_game(&mut self) -> Result<(), TransitionError> {
        self.require(Phase::Idle, Phase::WeaponSelect)?;
        self.transition(Phase::WeaponSelect)
    }

    pub fn select_weapon(&mut self, weapon: WeaponKind) -> Result<(), TransitionError> {
        self.require(Phase::WeaponSelect, Phase::MapSelect)?;
        self.transition(Phase::MapSelect)?;
        self.weapon = weapon;
        Ok(())
    }

    /// Weapon selection -> title screen
    pub fn cancel_weapon_select(&mut self) -> Result<(), TransitionError> {
        self.require(Phase::WeaponSelect, Phase::Idle)?;
        self.transition(Phase::Idle)
    }

    /// Arena chosen: a fresh round starts
    pub fn select_arena(&mut self, arena: ArenaKind) -> Result<(), TransitionError> {
        self.require(Phase::MapSelect, Phase::Playing)?;
        self.transition(Phase::Playing)?;
        self.arena = arena;
        self.reset_round();
        Ok(())
    }

    /// Arena selection -> weapon selection
    pub fn back_to_weapon_select(&mut self) -> Result<(), TransitionError> {
        self.require(Phase::MapSelect, Phase::WeaponSelect)?;
        self.transition(Phase::WeaponSelect)
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.transition(Phase::Paused)
    }

    pub fn resume(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Paused {
            return Err(TransitionError {
                from: self.phase,
                to: Phase::Playing,
            });
        }
        self.transition(Phase::Playing)
    }

    /// Paused: replay immediately. Game over: back to weapon selection.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        let to = match self.phase {
            Phase::GameOver => Phase::WeaponSelect,
            _ => Phase::Playing,
        };
        if self.phase != Phase::Paused && self.phase != Phase::GameOver {
            return Err(TransitionError { from: self.phase, to });
        }
        self.transition(to)?;
        self.reset_round();
        Ok(())
    }

    pub fn change_weapon(&mut self) -> Result<(), TransitionError> {
        self.leave_round(Phase::WeaponSelect)
    }

    pub fn change_map(&mut self) -> Result<(), TransitionError> {
        self.leave_round(Phase::MapSelect)
    }

    pub fn quit(&mut self) -> Result<(), TransitionError> {
        self.leave_round(Phase::Idle)
    }

    fn leave_round(&mut self, to: Phase) -> Result<(), TransitionError> {
        if self.phase != Phase::Paused && self.phase != Phase::GameOver {
            return Err(TransitionError { from: self.phase, to });
        }
        self.transition(to)?;
        self.reset_round();
        Ok(())
    }

    /// End the round early (external trigger)
    pub fn force_game_over(&mut self) -> Result<(), TransitionError> {
        self.transition(Phase::GameOver)
    }

    /// Advance the round clock by one second
    pub fn tick_second(&mut self) -> CountdownTick {
        if self.phase != Phase::Playing {
            return CountdownTick::Ignored;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.phase = Phase::GameOver;
            log::info!("Time up! Final score: {}", self.score);
            CountdownTick::Expired
        } else {
            CountdownTick::Running(self.time_remaining)
        }
    }

    /// Add points; only counts while playing
    pub fn award(&mut self, points: u64) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.score = self.score.saturating_add(points);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> Session {
        let mut session = Session::default();
        session.start_game().unwrap();
        session.select_weapon(WeaponKind::Pistol).unwrap();
        session.select_arena(ArenaKind::Desert).unwrap();
        session
    }

    #[test]
    fn test_menu_flow_reaches_playing() {
        let session = playing();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_remaining(), 60);
    }

    #[test]
    fn test_idle_cannot_jump_to_playing() {
        let mut session = Session::default();
        let err = session.select_arena(ArenaKind::City).unwrap_err();
        assert_eq!(err.from, Phase::Idle);
        assert_eq!(err.to, Phase::Playing);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_countdown_expires_exactly_once() {
        let mut session = playing();
        for expected in (1..60).rev() {
            assert_eq!(session.tick_second(), CountdownTick::Running(expected));
        }
        assert_eq!(session.tick_second(), CountdownTick::Expired);
        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(session.time_remaining(), 0);
        assert_eq!(session.tick_second(), CountdownTick::Ignored);
        assert_eq!(session.time_remaining(), 0);
    }

    #[test]
    fn test_countdown_frozen_while_paused() {
        let mut session = playing();
        session.tick_second();
        session.pause().unwrap();
        assert_eq!(session.tick_second(), CountdownTick::Ignored);
        assert_eq!(session.time_remaining(), 59);
    }

    #[test]
    fn test_award_only_while_playing() {
        let mut session = playing();
        assert!(session.award(10));
        session.pause().unwrap();
        assert!(!session.award(10));
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_restart_from_pause_resets_round() {
        let mut session = playing();
        session.award(30);
        session.tick_second();
        session.pause().unwrap();
        session.restart().unwrap();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_remaining(), 60);
    }

    #[test]
    fn test_game_over_exits() {
        let mut session = playing();
        session.force_game_over().unwrap();
        assert!(session.resume().is_err());

        session.restart().unwrap();
        assert_eq!(session.phase(), Phase::WeaponSelect);

        let mut session = playing();
        session.force_game_over().unwrap();
        session.change_map().unwrap();
        assert_eq!(session.phase(), Phase::MapSelect);

        let mut session = playing();
        session.force_game_over().unwrap();
        session.quit().unwrap();
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_quit_rejected_while_playing() {
        let mut session = playing();
        assert!(session.quit().is_err());
        assert_eq!(session.phase(), Phase::Playing);
    }

    #[test]
    fn test_menu_actions_rejected_mid_round() {
        let mut session = playing();
        session.award(10);
        session.pause().unwrap();

        assert!(session.start_game().is_err());
        assert!(session.select_weapon(WeaponKind::Sniper).is_err());
        assert!(session.cancel_weapon_select().is_err());
        assert!(session.back_to_weapon_select().is_err());
        assert!(session.select_arena(ArenaKind::City).is_err());
        assert_eq!(session.phase(), Phase::Paused);
        assert_eq!(session.score(), 10);
        assert_eq!(session.weapon(), WeaponKind::Pistol);
        assert_eq!(session.arena(), ArenaKind::Desert);

        session.force_game_over().unwrap_err();
        session.resume().unwrap();
        session.force_game_over().unwrap();
        let err = session.select_weapon(WeaponKind::Rifle).unwrap_err();
        assert_eq!(err.from, Phase::GameOver);
        assert!(session.cancel_weapon_select().is_err());
        assert_eq!(session.phase(), Phase::GameOver);
    }

    #[test]
    fn test_selection_back_edges() {
        let mut session = Session::default();
        session.start_game().unwrap();
        session.cancel_weapon_select().unwrap();
        assert_eq!(session.phase(), Phase::Idle);

        session.start_game().unwrap();
        session.select_weapon(WeaponKind::Sniper).unwrap();
        session.back_to_weapon_select().unwrap();
        assert_eq!(session.phase(), Phase::WeaponSelect);
        assert_eq!(session.weapon(), WeaponKind::Sniper);
    }
}
