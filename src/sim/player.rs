//! Player motion controller
//!
//! Turns held keys and the camera heading into body velocity, tracks ground
//! contact from several independent signals and runs the jump logic. The
//! camera orientation belongs to the input device; this module only reads it
//! to rotate movement and to build the camera pose.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::input::KeyState;
use super::physics::{ArcadeBody, PhysicsBody};
use super::timer::{TimerId, TimerKind, Timers};
use crate::consts::*;
use crate::horizontal;
use crate::tuning::PlayerTuning;

/// Camera position and orientation for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl CameraPose {
    /// Rotation from yaw (around +Y) and pitch (around the camera's right axis)
    pub fn look_rotation(yaw: f32, pitch: f32) -> Quat {
        Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0)
    }
}

/// Which jump path fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// Grounded, jump-ready and past the cooldown
    Normal,
    /// Resting on the floor but jump-locked for too long
    Emergency,
}

#[derive(Debug, Clone, Copy)]
struct PendingJump {
    timer: TimerId,
    kind: JumpKind,
    pressed_ms: u64,
}

/// Owns the player body and its movement state
pub struct PlayerController {
    body: Box<dyn PhysicsBody>,
    tuning: PlayerTuning,
    is_grounded: bool,
    can_jump: bool,
    is_sprinting: bool,
    last_jump_ms: Option<u64>,
    pending_jump: Option<PendingJump>,
    watchdog: Option<TimerId>,
}

impl PlayerController {
    /// Controller over the built-in arcade body
    pub fn new(tuning: PlayerTuning) -> Self {
        let body = ArcadeBody::new(
            Vec3::from_array(PLAYER_START),
            PLAYER_RADIUS,
            tuning.gravity,
            tuning.restitution,
        )
        .with_walls(super::arena::Bounds::standard());
        Self::with_body(Box::new(body), tuning)
    }

    /// Controller over any physics backend
    pub fn with_body(body: Box<dyn PhysicsBody>, tuning: PlayerTuning) -> Self {
        Self {
            body,
            tuning,
            is_grounded: false,
            can_jump: true,
            is_sprinting: false,
            last_jump_ms: None,
            pending_jump: None,
            watchdog: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.velocity()
    }

    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    pub fn can_jump(&self) -> bool {
        self.can_jump
    }

    pub fn is_sprinting(&self) -> bool {
        self.is_sprinting
    }

    pub fn last_jump_ms(&self) -> Option<u64> {
        self.last_jump_ms
    }

    /// Camera pose derived from the body position
    pub fn camera(&self, rotation: Quat) -> CameraPose {
        CameraPose {
            position: self.body.position() + Vec3::Y * EYE_HEIGHT,
            rotation,
        }
    }

    /// Put the body back at the start and arm the ground watchdog
    pub fn reset(&mut self, timers: &mut Timers) {
        self.body.set_position(Vec3::from_array(PLAYER_START));
        self.body.set_velocity(Vec3::ZERO);
        self.body.drain_contacts();
        self.is_grounded = false;
        self.can_jump = true;
        self.is_sprinting = false;
        self.last_jump_ms = None;
        self.cancel_timers(timers);
        self.watchdog = Some(
            timers.schedule_repeating(TimerKind::GroundWatchdog, self.tuning.watchdog_interval_ms),
        );
    }

    pub fn cancel_timers(&mut self, timers: &mut Timers) {
        if let Some(pending) = self.pending_jump.take() {
            timers.cancel(pending.timer);
        }
        if let Some(id) = self.watchdog.take() {
            timers.cancel(id);
        }
    }

    /// Integrate one tick of movement
    pub fn update(&mut self, keys: &KeyState, rotation: Quat, dt: f32) {
        self.is_sprinting = keys.sprint;

        let speed = if self.is_sprinting {
            self.tuning.sprint_speed
        } else {
            self.tuning.base_speed
        };
        let move_dir = self.move_direction(keys, rotation) * speed;
        let vertical = self.body.velocity().y;
        self.body
            .set_velocity(Vec3::new(move_dir.x, vertical, move_dir.z));

        self.body.step(dt);

        for contact in self.body.drain_contacts() {
            if contact.normal.y > self.tuning.ground_normal_threshold {
                self.is_grounded = true;
                self.can_jump = true;
                self.last_jump_ms = None;
            }
        }

        let velocity = self.body.velocity();
        if velocity.y.abs() < 0.2 || self.body.query_grounded() {
            self.is_grounded = true;
        }
        if velocity.y > 2.0 {
            self.is_grounded = false;
        }

        if self.body.position().y <= self.tuning.near_ground_height && velocity.y <= 0.1 {
            self.is_grounded = true;
            self.can_jump = true;
        }
    }

    /// World-space horizontal unit direction from held keys and camera yaw
    fn move_direction(&self, keys: &KeyState, rotation: Quat) -> Vec3 {
        let (strafe, forward) = keys.move_axis();
        if strafe == 0.0 && forward == 0.0 {
            return Vec3::ZERO;
        }
        let heading = horizontal(rotation * Vec3::NEG_Z).normalize_or(Vec3::NEG_Z);
        let right = Vec3::new(-heading.z, 0.0, heading.x);
        (right * strafe + heading * forward).normalize_or_zero()
    }

    fn resting_on_floor(&self) -> bool {
        self.body.position().y <= self.tuning.rest_height
    }

    fn ms_since_jump(&self, now_ms: u64) -> Option<u64> {
        self.last_jump_ms.map(|t| now_ms.saturating_sub(t))
    }

    /// Handle a jump key press
    ///
    /// Applies the unstick pulse now and schedules the main impulse.
    pub fn request_jump(&mut self, now_ms: u64, timers: &mut Timers) -> Option<JumpKind> {
        if self.pending_jump.is_some() {
            return None;
        }

        let since = self.ms_since_jump(now_ms);
        let cooled = since.is_none_or(|ms| ms > self.tuning.jump_cooldown_ms);
        let stuck = since.is_none_or(|ms| ms > self.tuning.emergency_jump_ms);

        let kind = if self.is_grounded && self.can_jump && cooled {
            JumpKind::Normal
        } else if self.resting_on_floor() && stuck {
            log::debug!("Emergency jump (grounded={}, can_jump={})", self.is_grounded, self.can_jump);
            JumpKind::Emergency
        } else {
            return None;
        };

        let v = self.body.velocity();
        self.body
            .set_velocity(Vec3::new(v.x, self.tuning.unstick_velocity, v.z));
        let timer = timers.schedule_once(TimerKind::JumpImpulse, self.tuning.jump_impulse_delay_ms);
        self.pending_jump = Some(PendingJump {
            timer,
            kind,
            pressed_ms: now_ms,
        });
        Some(kind)
    }

    /// Main jump impulse, fired by the `JumpImpulse` timer
    pub fn apply_jump_impulse(&mut self) {
        let Some(pending) = self.pending_jump.take() else {
            return;
        };
        let v = self.body.velocity();
        self.body
            .set_velocity(Vec3::new(v.x, self.tuning.jump_force, v.z));
        self.is_grounded = false;
        if pending.kind == JumpKind::Normal {
            self.can_jump = false;
        }
        self.last_jump_ms = Some(pending.pressed_ms);
    }

    /// Periodic reset guarding against missed ground contacts
    pub fn run_watchdog(&mut self, now_ms: u64) {
        let quiet = self
            .ms_since_jump(now_ms)
            .is_none_or(|ms| ms > self.tuning.watchdog_quiet_ms);
        if self.resting_on_floor() && quiet && !(self.is_grounded && self.can_jump) {
            log::debug!("Ground watchdog reset jump state");
            self.is_grounded = true;
            self.can_jump = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::input::Key;
    use crate::sim::physics::Contact;

    const DT: f32 = 1.0 / 60.0;
    const DT_MS: u64 = 16;

    fn settled() -> (PlayerController, Timers) {
        let mut timers = Timers::new();
        let mut player = PlayerController::new(PlayerTuning::default());
        player.reset(&mut timers);
        let keys = KeyState::default();
        for _ in 0..120 {
            player.update(&keys, Quat::IDENTITY, DT);
        }
        (player, timers)
    }

    /// Run ticks, routing timers the way the game loop does
    fn run(player: &mut PlayerController, timers: &mut Timers, keys: &KeyState, ticks: usize) {
        for _ in 0..ticks {
            player.update(keys, Quat::IDENTITY, DT);
            for fired in timers.advance(DT_MS) {
                match fired.kind {
                    TimerKind::JumpImpulse => player.apply_jump_impulse(),
                    TimerKind::GroundWatchdog => player.run_watchdog(fired.at_ms),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_settles_grounded() {
        let (player, _) = settled();
        assert!(player.is_grounded());
        assert!(player.can_jump());
        assert!((player.position().y - PLAYER_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn test_forward_follows_camera_yaw() {
        let (mut player, _) = settled();
        let mut keys = KeyState::default();
        keys.set(Key::Forward, true);

        // Facing -Z
        player.update(&keys, Quat::IDENTITY, DT);
        let v = player.velocity();
        assert!((v.z + 5.5).abs() < 1e-3 && v.x.abs() < 1e-3);

        // Quarter turn left: facing -X
        let rotation = CameraPose::look_rotation(std::f32::consts::FRAC_PI_2, 0.0);
        player.update(&keys, rotation, DT);
        let v = player.velocity();
        assert!((v.x + 5.5).abs() < 1e-3 && v.z.abs() < 1e-3);
    }

    #[test]
    fn test_pitch_does_not_slow_walking() {
        let (mut player, _) = settled();
        let mut keys = KeyState::default();
        keys.set(Key::Forward, true);
        keys.set(Key::Sprint, true);
        let rotation = CameraPose::look_rotation(0.0, 1.2);
        player.update(&keys, rotation, DT);
        let v = player.velocity();
        assert!((horizontal(v).length() - 9.0).abs() < 1e-3);
        assert!(player.is_sprinting());
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let (mut player, _) = settled();
        let mut keys = KeyState::default();
        keys.set(Key::Forward, true);
        keys.set(Key::Right, true);
        player.update(&keys, Quat::IDENTITY, DT);
        assert!((horizontal(player.velocity()).length() - 5.5).abs() < 1e-3);
    }

    #[test]
    fn test_two_phase_jump() {
        let (mut player, mut timers) = settled();
        let now = timers.now_ms();
        assert_eq!(player.request_jump(now, &mut timers), Some(JumpKind::Normal));
        assert!((player.velocity().y - 0.5).abs() < 1e-5);
        assert_eq!(timers.pending_of(TimerKind::JumpImpulse), 1);

        // A second press while the impulse is pending is ignored
        assert_eq!(player.request_jump(now, &mut timers), None);

        let keys = KeyState::default();
        run(&mut player, &mut timers, &keys, 1);
        assert!(!player.is_grounded());
        assert!(!player.can_jump());
        assert_eq!(player.last_jump_ms(), Some(now));

        run(&mut player, &mut timers, &keys, 10);
        assert!(player.position().y > 1.0);
    }

    #[test]
    fn test_lands_and_jumps_again() {
        let (mut player, mut timers) = settled();
        let keys = KeyState::default();
        player.request_jump(timers.now_ms(), &mut timers);
        run(&mut player, &mut timers, &keys, 120);
        assert!(player.is_grounded());
        assert!(player.can_jump());
        assert!(player.request_jump(timers.now_ms(), &mut timers).is_some());
    }

    #[test]
    fn test_emergency_jump_when_stuck() {
        let (mut player, mut timers) = settled();
        player.is_grounded = false;
        player.can_jump = false;
        player.last_jump_ms = Some(0);
        player.body.set_position(Vec3::new(0.0, 0.5, 0.0));

        assert_eq!(player.request_jump(1500, &mut timers), Some(JumpKind::Emergency));
    }

    #[test]
    fn test_no_emergency_jump_within_lock_window() {
        let (mut player, mut timers) = settled();
        player.is_grounded = false;
        player.can_jump = false;
        player.last_jump_ms = Some(1000);
        assert_eq!(player.request_jump(1500, &mut timers), None);
    }

    #[test]
    fn test_watchdog_restores_jump_state() {
        let (mut player, _) = settled();
        player.is_grounded = false;
        player.can_jump = false;
        player.last_jump_ms = Some(0);

        player.run_watchdog(400);
        assert!(!player.can_jump());

        player.run_watchdog(1000);
        assert!(player.is_grounded());
        assert!(player.can_jump());
    }

    /// Backend that never reports contacts or grounding
    struct SilentBody(ArcadeBody);

    impl PhysicsBody for SilentBody {
        fn position(&self) -> Vec3 {
            self.0.position()
        }
        fn velocity(&self) -> Vec3 {
            self.0.velocity()
        }
        fn set_velocity(&mut self, velocity: Vec3) {
            self.0.set_velocity(velocity)
        }
        fn set_position(&mut self, position: Vec3) {
            self.0.set_position(position)
        }
        fn step(&mut self, dt: f32) {
            self.0.step(dt)
        }
        fn drain_contacts(&mut self) -> Vec<Contact> {
            self.0.drain_contacts();
            Vec::new()
        }
        fn query_grounded(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_fallbacks_work_without_contacts() {
        let body = SilentBody(ArcadeBody::new(Vec3::new(0.0, 3.0, 0.0), 0.5, -20.0, 0.1));
        let mut player = PlayerController::with_body(Box::new(body), PlayerTuning::default());
        let mut timers = Timers::new();
        let keys = KeyState::default();
        run(&mut player, &mut timers, &keys, 120);
        assert!(player.is_grounded());
        assert!(player.request_jump(timers.now_ms(), &mut timers).is_some());
    }
}
