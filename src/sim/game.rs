//! Game session orchestrator
//!
//! `Game` owns every gameplay component and runs them in a fixed order each
//! tick:
//!
//! 1. queued input events
//! 2. aim capture coordinator
//! 3. player motion
//! 4. balloon drift
//! 5. shot resolution
//! 6. play timers (countdown, spawns, respawns, jump impulse, watchdog)
//! 7. weapon cooldown and recoil
//!
//! Steps 3-7 only run while `Playing`.

use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::arena::ArenaKind;
use super::hit::resolve_shot;
use super::input::{InputEvent, Key, KeyState};
use super::lock::{AimCapture, AlwaysCapture, LockCoordinator, LockSignal};
use super::player::{CameraPose, JumpKind, PlayerController};
use super::ray::build_aim_rays;
use super::session::{CountdownTick, Phase, Session, TransitionError};
use super::target::{TargetId, TargetPopulation};
use super::timer::{TimerKind, Timers};
use super::weapon::{Weapon, WeaponKind};
use crate::audio::{AudioSink, Silent, SoundEffect};
use crate::tuning::Tuning;

/// Per-tick input that is not an event
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Camera orientation as reported by the input device
    pub camera_rotation: Quat,
}

/// Things that happened during a tick, for presentation and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    WeaponFired {
        weapon: WeaponKind,
    },
    TargetPopped {
        id: TargetId,
        position: Vec3,
        color_index: u8,
        points: u64,
        /// Presentation stagger for penetrating shots
        delay_ms: u64,
    },
    TargetSpawned {
        id: TargetId,
    },
    ScoreChanged {
        score: u64,
        gained: u64,
    },
    Jumped {
        emergency: bool,
    },
    GameOver {
        score: u64,
    },
}

/// Balloon as presentation sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetView {
    pub id: TargetId,
    pub position: Vec3,
    pub color_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub time_remaining: u32,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeaponView {
    pub kind: WeaponKind,
    pub recoil: f32,
    pub muzzle_flash: bool,
}

/// Everything presentation needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub camera: CameraPose,
    pub targets: Vec<TargetView>,
    pub hud: Hud,
    pub weapon: WeaponView,
}

pub struct Game {
    tuning: Tuning,
    session: Session,
    player: PlayerController,
    population: TargetPopulation,
    weapon: Weapon,
    timers: Timers,
    lock: LockCoordinator,
    capture: Box<dyn AimCapture>,
    audio: Box<dyn AudioSink>,
    keys: KeyState,
    camera_rotation: Quat,
    queued: Vec<InputEvent>,
    events: Vec<GameEvent>,
    fire_requested: bool,
    /// Sub-millisecond remainder of the tick clock
    ms_carry: f32,
    rng: Pcg32,
}

impl Game {
    pub fn new(
        tuning: Tuning,
        seed: u64,
        capture: Box<dyn AimCapture>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let kind = WeaponKind::default();
        let arena = ArenaKind::default();
        Self {
            session: Session::new(tuning.session.round_seconds),
            player: PlayerController::new(tuning.player.clone()),
            population: TargetPopulation::new(arena.bounds(), tuning.spawning.clone(), seed),
            weapon: Weapon::new(kind, tuning.weapons.get(kind).clone()),
            timers: Timers::new(),
            lock: LockCoordinator::new(tuning.lock.clone()),
            capture,
            audio,
            keys: KeyState::default(),
            camera_rotation: Quat::IDENTITY,
            queued: Vec::new(),
            events: Vec::new(),
            fire_requested: false,
            ms_carry: 0.0,
            rng: Pcg32::seed_from_u64(seed.wrapping_add(0x9e37_79b9_7f4a_7c15)),
            tuning,
        }
    }

    /// Game without a capture device or audio output
    pub fn headless(tuning: Tuning, seed: u64) -> Self {
        Self::new(tuning, seed, Box::new(AlwaysCapture), Box::new(Silent))
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn population(&self) -> &TargetPopulation {
        &self.population
    }

    /// Direct access for scripted layouts
    pub fn population_mut(&mut self) -> &mut TargetPopulation {
        &mut self.population
    }

    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    pub fn lock(&self) -> &LockCoordinator {
        &self.lock
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    // === Menu actions ===

    pub fn start_game(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.start_game()?;
        self.phase_changed(before);
        Ok(())
    }

    pub fn select_weapon(&mut self, kind: WeaponKind) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.select_weapon(kind)?;
        self.weapon = Weapon::new(kind, self.tuning.weapons.get(kind).clone());
        log::info!("Selected {}", kind.title());
        self.phase_changed(before);
        Ok(())
    }

    pub fn cancel_weapon_select(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.cancel_weapon_select()?;
        self.phase_changed(before);
        Ok(())
    }

    pub fn back_to_weapon_select(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.back_to_weapon_select()?;
        self.phase_changed(before);
        Ok(())
    }

    /// Choose the arena and start a round
    pub fn select_arena(&mut self, arena: ArenaKind) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.select_arena(arena)?;
        log::info!("Round started in {}", arena.title());
        self.begin_round();
        self.request_capture();
        self.phase_changed(before);
        Ok(())
    }

    /// Ask the platform for aim capture while playing without it
    pub fn request_capture(&mut self) {
        if !self.session.is_playing() || self.lock.is_captured() {
            return;
        }
        if let Err(e) = self.capture.request_lock() {
            log::warn!("Aim capture request failed: {e}");
        }
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.pause()?;
        self.lock.release(self.capture.as_mut(), false);
        self.keys.clear();
        self.phase_changed(before);
        Ok(())
    }

    /// Ask to continue a paused round
    ///
    /// The session stays `Paused` until the platform reports
    /// `CaptureAcquired`; a refused request is retried once.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        if self.phase() != Phase::Paused {
            return Err(TransitionError {
                from: self.phase(),
                to: Phase::Playing,
            });
        }
        self.lock.begin_resume(self.capture.as_mut());
        Ok(())
    }

    fn finish_resume(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.resume()?;
        self.phase_changed(before);
        Ok(())
    }

    /// Paused: start the round over. Game over: back to weapon select.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.restart()?;
        if self.session.is_playing() {
            self.begin_round();
            self.request_capture();
        } else {
            self.end_round();
        }
        self.phase_changed(before);
        Ok(())
    }

    pub fn change_weapon(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.change_weapon()?;
        self.end_round();
        self.phase_changed(before);
        Ok(())
    }

    pub fn change_map(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.change_map()?;
        self.end_round();
        self.phase_changed(before);
        Ok(())
    }

    pub fn quit(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.quit()?;
        self.end_round();
        self.phase_changed(before);
        Ok(())
    }

    pub fn force_game_over(&mut self) -> Result<(), TransitionError> {
        let before = self.phase();
        self.session.force_game_over()?;
        self.finish_game_over(before);
        Ok(())
    }

    // === Round lifecycle ===

    fn begin_round(&mut self) {
        self.timers.reset();
        self.lock.reset();
        self.keys.clear();
        self.fire_requested = false;
        self.ms_carry = 0.0;

        self.population.set_bounds(self.session.arena().bounds());
        self.population.populate_initial();
        self.player.reset(&mut self.timers);
        self.weapon.reset();

        self.timers.schedule_repeating(TimerKind::Countdown, 1000);
        self.timers
            .schedule_repeating(TimerKind::SpawnInterval, self.tuning.spawning.spawn_interval_ms);
    }

    fn end_round(&mut self) {
        self.player.cancel_timers(&mut self.timers);
        self.timers.cancel_all();
        self.lock.reset();
        self.population.clear();
        self.keys.clear();
        self.fire_requested = false;
        self.lock.release(self.capture.as_mut(), true);
    }

    fn finish_game_over(&mut self, before: Phase) {
        self.player.cancel_timers(&mut self.timers);
        self.timers.cancel_all();
        self.keys.clear();
        self.fire_requested = false;
        self.lock.release(self.capture.as_mut(), true);
        log::info!("Game over with {} points", self.session.score());
        self.events.push(GameEvent::GameOver {
            score: self.session.score(),
        });
        self.phase_changed(before);
    }

    fn phase_changed(&mut self, before: Phase) {
        let after = self.phase();
        if before != after {
            log::debug!("Phase {} -> {}", before.as_str(), after.as_str());
            self.events.push(GameEvent::PhaseChanged {
                from: before,
                to: after,
            });
        }
    }

    // === Input ===

    /// Queue an input event for the next tick
    pub fn handle_event(&mut self, event: InputEvent) {
        self.queued.push(event);
    }

    fn apply_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                let was_down = self.keys.is_down(key);
                self.keys.set(key, true);
                if key == Key::Jump && !was_down && self.session.is_playing() {
                    let now = self.timers.now_ms();
                    if let Some(kind) = self.player.request_jump(now, &mut self.timers) {
                        self.events.push(GameEvent::Jumped {
                            emergency: kind == JumpKind::Emergency,
                        });
                    }
                }
            }
            InputEvent::KeyUp(key) => self.keys.set(key, false),
            InputEvent::FireDown => {
                if self.session.is_playing() && self.lock.is_captured() {
                    self.fire_requested = true;
                }
            }
            InputEvent::CaptureAcquired => self.lock.on_capture_acquired(),
            InputEvent::CaptureFailed => self.lock.on_capture_failed(),
            InputEvent::CaptureLost => {
                let phase = self.phase();
                self.lock.on_capture_lost(phase);
            }
            InputEvent::EscapePressed => {
                // Escape skips the loss debounce
                if self.session.is_playing() {
                    if let Err(e) = self.pause() {
                        log::warn!("Escape pause rejected: {e}");
                    }
                }
            }
        }
    }

    // === Simulation ===

    /// Advance one fixed step of `dt` seconds
    pub fn tick(&mut self, dt: f32, input: &TickInput) {
        self.camera_rotation = input.camera_rotation;

        self.ms_carry += dt * 1000.0;
        let dt_ms = self.ms_carry.floor().max(0.0);
        self.ms_carry -= dt_ms;
        let dt_ms = dt_ms as u64;

        for event in std::mem::take(&mut self.queued) {
            self.apply_event(event);
        }

        let phase = self.phase();
        match self.lock.update(dt_ms, phase, self.capture.as_mut()) {
            Some(LockSignal::Pause) if self.session.is_playing() => {
                if let Err(e) = self.pause() {
                    log::warn!("Pause after capture loss rejected: {e}");
                }
            }
            Some(LockSignal::Resume) => {
                if let Err(e) = self.finish_resume() {
                    log::warn!("Resume after capture grant rejected: {e}");
                }
            }
            _ => {}
        }

        if !self.session.is_playing() {
            self.fire_requested = false;
            return;
        }

        self.player.update(&self.keys, self.camera_rotation, dt);
        self.population.update();

        if std::mem::take(&mut self.fire_requested) {
            self.fire();
        }

        self.run_timers(dt_ms);

        if self.session.is_playing() {
            self.weapon.update(dt_ms as f32);
        }
    }

    fn fire(&mut self) {
        if !self.weapon.try_fire() {
            return;
        }
        let kind = self.weapon.kind;
        self.audio.notify(SoundEffect::WeaponFired(kind));
        self.events.push(GameEvent::WeaponFired { weapon: kind });

        let camera = self.player.camera(self.camera_rotation);
        let config = &self.weapon.config;
        let rays = build_aim_rays(
            camera.position,
            camera.rotation,
            config.spread_angle,
            config.spread_rays,
            &mut self.rng,
        );
        let outcome = resolve_shot(
            &rays,
            &mut self.population,
            config,
            &self.tuning,
            &mut self.timers,
        );
        if outcome.is_miss() {
            return;
        }

        for popped in &outcome.popped {
            self.audio.notify(SoundEffect::TargetPopped);
            self.events.push(GameEvent::TargetPopped {
                id: popped.id,
                position: popped.position,
                color_index: popped.color_index,
                points: popped.points,
                delay_ms: popped.delay_ms,
            });
        }

        let gained = outcome.points();
        if self.session.award(gained) {
            self.events.push(GameEvent::ScoreChanged {
                score: self.session.score(),
                gained,
            });
        }
    }

    fn run_timers(&mut self, dt_ms: u64) {
        for fired in self.timers.advance(dt_ms) {
            // Game over cancels everything still queued behind it
            if !self.session.is_playing() {
                break;
            }
            match fired.kind {
                TimerKind::Countdown => {
                    if let CountdownTick::Expired = self.session.tick_second() {
                        self.finish_game_over(Phase::Playing);
                    }
                }
                TimerKind::SpawnInterval | TimerKind::PendingRespawn => {
                    if let Some(id) = self.population.spawn_edge() {
                        self.events.push(GameEvent::TargetSpawned { id });
                    }
                }
                TimerKind::JumpImpulse => self.player.apply_jump_impulse(),
                TimerKind::GroundWatchdog => self.player.run_watchdog(fired.at_ms),
                TimerKind::LockRetry => {}
            }
        }
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            camera: self.player.camera(self.camera_rotation),
            targets: self
                .population
                .targets()
                .iter()
                .map(|t| TargetView {
                    id: t.id,
                    position: t.position,
                    color_index: t.color_index,
                })
                .collect(),
            hud: Hud {
                score: self.session.score(),
                time_remaining: self.session.time_remaining(),
                phase: self.phase(),
            },
            weapon: WeaponView {
                kind: self.weapon.kind,
                recoil: self.weapon.recoil(),
                muzzle_flash: self.weapon.muzzle_flash(),
            },
        }
    }
}
