//! Audio cues
//!
//! The simulation only announces which cue to play through `AudioSink`.
//! In the browser, `AudioManager` synthesises each cue with Web Audio
//! oscillators - no sample files needed. Playback failures never reach the
//! game.

use crate::sim::weapon::WeaponKind;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Trigger pulled and a shot went out
    WeaponFired(WeaponKind),
    /// A balloon burst
    TargetPopped,
}

/// Fire-and-forget audio output
pub trait AudioSink {
    fn notify(&mut self, effect: SoundEffect);
}

/// Sink that drops every cue (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioSink for Silent {
    fn notify(&mut self, _effect: SoundEffect) {}
}

/// Sink that records cues in order
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub played: Vec<SoundEffect>,
}

impl AudioSink for Recorder {
    fn notify(&mut self, effect: SoundEffect) {
        self.played.push(effect);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect};
    use crate::sim::weapon::WeaponKind;

    /// One oscillator voice: exponential pitch and gain sweep
    struct Voice {
        wave: OscillatorType,
        from_hz: f32,
        to_hz: f32,
        gain: f32,
        seconds: f64,
    }

    /// Overall output level applied to every voice
    const MASTER_VOLUME: f32 = 0.8;

    /// Web Audio synthesiser
    pub struct AudioManager {
        ctx: Option<AudioContext>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        fn play(&self, effect: SoundEffect) {
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let voices: &[Voice] = match effect {
                SoundEffect::WeaponFired(WeaponKind::Pistol) => &[Voice {
                    wave: OscillatorType::Square,
                    from_hz: 220.0,
                    to_hz: 50.0,
                    gain: 0.3,
                    seconds: 0.15,
                }],
                SoundEffect::WeaponFired(WeaponKind::Rifle) => &[Voice {
                    wave: OscillatorType::Sawtooth,
                    from_hz: 180.0,
                    to_hz: 40.0,
                    gain: 0.4,
                    seconds: 0.2,
                }],
                // Deep boom: low sine body plus a square crack
                SoundEffect::WeaponFired(WeaponKind::Sniper) => &[
                    Voice {
                        wave: OscillatorType::Sine,
                        from_hz: 80.0,
                        to_hz: 20.0,
                        gain: 0.6,
                        seconds: 0.4,
                    },
                    Voice {
                        wave: OscillatorType::Square,
                        from_hz: 120.0,
                        to_hz: 30.0,
                        gain: 0.3,
                        seconds: 0.3,
                    },
                ],
                SoundEffect::TargetPopped => &[Voice {
                    wave: OscillatorType::Sine,
                    from_hz: 800.0,
                    to_hz: 300.0,
                    gain: 0.3,
                    seconds: 0.1,
                }],
            };

            for voice in voices {
                if self.sweep(ctx, voice, MASTER_VOLUME).is_none() {
                    log::warn!("Failed to play {:?}", effect);
                }
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            wave: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(wave);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some((osc, gain))
        }

        fn sweep(&self, ctx: &AudioContext, voice: &Voice, vol: f32) -> Option<()> {
            let (osc, gain) = self.create_osc(ctx, voice.wave)?;
            let t = ctx.current_time();
            let end = t + voice.seconds;

            osc.frequency().set_value_at_time(voice.from_hz, t).ok()?;
            osc.frequency()
                .exponential_ramp_to_value_at_time(voice.to_hz, end)
                .ok()?;
            gain.gain().set_value_at_time(voice.gain * vol, t).ok()?;
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, end)
                .ok()?;

            osc.start().ok()?;
            osc.stop_with_when(end).ok()
        }
    }

    impl AudioSink for AudioManager {
        fn notify(&mut self, effect: SoundEffect) {
            self.play(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let mut sink = Recorder::default();
        sink.notify(SoundEffect::WeaponFired(WeaponKind::Sniper));
        sink.notify(SoundEffect::TargetPopped);
        assert_eq!(
            sink.played,
            vec![SoundEffect::WeaponFired(WeaponKind::Sniper), SoundEffect::TargetPopped]
        );
    }
}
