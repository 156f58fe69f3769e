//! Aim capture (pointer lock) coordination
//!
//! Mirrors the platform's capture flag and decides when a capture change
//! should pause or resume the round. Browsers drop pointer lock for many
//! reasons that are not the player leaving (focus flicker, permission
//! prompts, our own release on game over), so involuntary losses are
//! debounced and our own releases are flagged in advance.
//!
//! The coordinator keeps its own clock. It advances in every phase so the
//! debounce and the resume retry work while the play timers are frozen.

use thiserror::Error;

use super::session::Phase;
use super::timer::{TimerId, TimerKind, Timers};
use crate::tuning::LockTuning;

/// Why a capture request failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("aim capture is not supported here")]
    Unsupported,
    #[error("aim capture request rejected: {0}")]
    Rejected(String),
}

/// Platform aim-capture device
pub trait AimCapture {
    /// Ask the platform to capture the pointer. Success means the request was
    /// accepted; the capture itself is reported later as an input event.
    fn request_lock(&mut self) -> Result<(), LockError>;
    fn request_unlock(&mut self);
}

/// Device that grants every request; used headless and in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCapture;

impl AimCapture for AlwaysCapture {
    fn request_lock(&mut self) -> Result<(), LockError> {
        Ok(())
    }

    fn request_unlock(&mut self) {}
}

/// What the game should do after a coordinator update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockSignal {
    /// Capture loss outlived the debounce
    Pause,
    /// Capture came back for a pending resume
    Resume,
}

#[derive(Debug, Clone, Default)]
pub struct LockCoordinator {
    tuning: LockTuning,
    captured: bool,
    captured_once: bool,
    /// Resume requested and waiting for the platform to grant capture
    resume_in_flight: bool,
    /// The delayed retry of the current resume was already spent
    retried: bool,
    /// Capture granted for the pending resume; reported on the next update
    granted: bool,
    /// We released capture ourselves; the loss that follows is expected
    releasing: bool,
    lost_at: Option<u64>,
    retry: Option<TimerId>,
    timers: Timers,
}

impl LockCoordinator {
    pub fn new(tuning: LockTuning) -> Self {
        Self {
            tuning,
            ..Default::default()
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn captured_once(&self) -> bool {
        self.captured_once
    }

    pub fn resume_in_flight(&self) -> bool {
        self.resume_in_flight
    }

    pub fn loss_pending(&self) -> bool {
        self.lost_at.is_some()
    }

    pub fn retry_pending(&self) -> bool {
        self.retry.is_some()
    }

    pub fn on_capture_acquired(&mut self) {
        self.captured = true;
        self.captured_once = true;
        self.releasing = false;
        self.lost_at = None;
        self.cancel_retry();
        if self.resume_in_flight {
            self.granted = true;
        }
        self.resume_in_flight = false;
    }

    pub fn on_capture_lost(&mut self, phase: Phase) {
        self.captured = false;
        let expected = std::mem::take(&mut self.releasing);
        if phase == Phase::Playing && self.captured_once && !self.resume_in_flight && !expected {
            log::debug!("Aim capture lost, debouncing");
            self.lost_at = Some(self.timers.now_ms());
        }
    }

    /// The platform refused a lock request after accepting it
    pub fn on_capture_failed(&mut self) {
        if !self.resume_in_flight {
            log::debug!("Aim capture refused outside a resume");
            return;
        }
        self.attempt_failed("platform refused the request");
    }

    fn attempt_failed(&mut self, reason: &str) {
        if self.retry.is_some() {
            return;
        }
        if self.retried {
            log::warn!("Aim capture retry failed, staying paused: {reason}");
            self.resume_in_flight = false;
            return;
        }
        log::warn!("Aim capture request failed, retrying: {reason}");
        self.retry = Some(
            self.timers
                .schedule_once(TimerKind::LockRetry, self.tuning.retry_delay_ms),
        );
    }

    /// Advance the coordinator clock
    pub fn update(
        &mut self,
        dt_ms: u64,
        phase: Phase,
        device: &mut dyn AimCapture,
    ) -> Option<LockSignal> {
        let mut signal = None;

        for fired in self.timers.advance(dt_ms) {
            if fired.kind != TimerKind::LockRetry || self.retry != Some(fired.id) {
                continue;
            }
            self.retry = None;
            self.retried = true;
            if phase != Phase::Paused {
                self.resume_in_flight = false;
                continue;
            }
            match device.request_lock() {
                Ok(()) => log::info!("Aim capture retry requested"),
                Err(e) => self.attempt_failed(&e.to_string()),
            }
        }

        if std::mem::take(&mut self.granted) && phase == Phase::Paused {
            log::info!("Aim capture granted, resuming");
            signal = Some(LockSignal::Resume);
        }

        if let Some(lost_at) = self.lost_at {
            if phase != Phase::Playing {
                self.lost_at = None;
            } else if self.timers.now_ms() - lost_at > self.tuning.loss_debounce_ms {
                log::info!("Aim capture lost for over {} ms, pausing", self.tuning.loss_debounce_ms);
                self.lost_at = None;
                signal = Some(LockSignal::Pause);
            }
        }

        signal
    }

    /// Ask for capture so a paused round can continue
    ///
    /// The round resumes only once capture is reported back. A failed
    /// request is retried once after the retry delay.
    pub fn begin_resume(&mut self, device: &mut dyn AimCapture) {
        if self.resume_in_flight {
            return;
        }
        self.resume_in_flight = true;
        self.retried = false;
        self.granted = false;
        self.lost_at = None;
        if let Err(e) = device.request_lock() {
            self.attempt_failed(&e.to_string());
        }
    }

    /// Release capture on purpose (escape, pause menu, game over)
    ///
    /// With `expected` set, the loss event that follows is not treated as
    /// involuntary.
    pub fn release(&mut self, device: &mut dyn AimCapture, expected: bool) {
        self.releasing = expected;
        self.resume_in_flight = false;
        self.granted = false;
        self.lost_at = None;
        self.cancel_retry();
        device.request_unlock();
    }

    /// New Playing session: forget capture history and pending work
    pub fn reset(&mut self) {
        self.captured_once = false;
        self.resume_in_flight = false;
        self.retried = false;
        self.granted = false;
        self.releasing = false;
        self.lost_at = None;
        self.retry = None;
        self.timers.cancel_all();
    }

    fn cancel_retry(&mut self) {
        if let Some(id) = self.retry.take() {
            self.timers.cancel(id);
        }
    }
}
