//! ADSR envelope state machine.
//!
//! The envelope is edge-triggered: each [`Envelope::update`] call compares the
//! gate against the previous call's gate and moves between stages, then
//! computes the amplitude for the current stage. Output is always in [0, 1].

use serde::{Deserialize, Serialize};

use super::prelude::lerp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnvelopeState {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
    /// Silenced; the pre-mute stage is kept for [`Envelope::unmute`].
    Muted,
}

/// Immutable envelope settings, copied by value into every voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Seconds from 0 to full level.
    pub attack: f32,
    /// Seconds from full level down to `sustain`.
    pub decay: f32,
    /// Held level, 0.0..=1.0.
    pub sustain: f32,
    /// Seconds from the release-start level down to 0.
    pub release: f32,
    /// Whether a gate-off may cut Attack or Decay short.
    pub can_interrupt: bool,
}

impl EnvelopeConfig {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            can_interrupt: false,
        }
        .sanitized()
    }

    pub fn with_interrupt(mut self, can_interrupt: bool) -> Self {
        self.can_interrupt = can_interrupt;
        self
    }

    /// Clamps times to be non-negative and the sustain level into [0, 1].
    /// Non-finite values fall back to the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let time = |v: f32, fallback: f32| if v.is_finite() { v.max(0.0) } else { fallback };
        Self {
            attack: time(self.attack, defaults.attack),
            decay: time(self.decay, defaults.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                defaults.sustain
            },
            release: time(self.release, defaults.release),
            can_interrupt: self.can_interrupt,
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 1.0,
            decay: 1.0,
            sustain: 0.5,
            release: 1.0,
            can_interrupt: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    config: EnvelopeConfig,
    state: EnvelopeState,
    previous_state: EnvelopeState,
    elapsed: f32,
    amplitude: f32,
    release_start: f32,
    was_on: bool,
    /// Gate went low during a non-interruptible Attack/Decay.
    release_pending: bool,
}

impl Envelope {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self {
            config: config.sanitized(),
            state: EnvelopeState::Idle,
            previous_state: EnvelopeState::Idle,
            elapsed: 0.0,
            amplitude: 0.0,
            release_start: 0.0,
            was_on: false,
            release_pending: false,
        }
    }

    /// Advances the envelope by `dt` seconds and returns the amplitude for this tick.
    pub fn update(&mut self, note_on: bool, dt: f32) -> f32 {
        if self.state == EnvelopeState::Muted {
            return 0.0;
        }

        if note_on != self.was_on {
            if note_on {
                self.elapsed = 0.0;
                self.release_pending = false;
                self.state = EnvelopeState::Attack;
            } else {
                self.gate_off();
            }
        }

        match self.state {
            EnvelopeState::Idle | EnvelopeState::Muted => {
                self.amplitude = 0.0;
            }
            EnvelopeState::Attack => {
                self.amplitude = if self.config.attack > 0.0 {
                    (self.elapsed / self.config.attack).min(1.0)
                } else {
                    1.0
                };
                if self.elapsed >= self.config.attack {
                    self.state = EnvelopeState::Decay;
                    self.elapsed = 0.0;
                }
            }
            EnvelopeState::Decay => {
                let progress = if self.config.decay > 0.0 {
                    self.elapsed / self.config.decay
                } else {
                    1.0
                };
                self.amplitude = lerp(1.0, self.config.sustain, progress);
                if self.elapsed >= self.config.decay {
                    self.state = EnvelopeState::Sustain;
                    self.elapsed = 0.0;
                    if std::mem::take(&mut self.release_pending) && !note_on {
                        self.begin_release();
                    }
                }
            }
            EnvelopeState::Sustain => {
                self.amplitude = self.config.sustain;
            }
            EnvelopeState::Release => {
                let progress = if self.config.release > 0.0 {
                    self.elapsed / self.config.release
                } else {
                    1.0
                };
                self.amplitude = lerp(self.release_start, 0.0, progress);
                if self.elapsed >= self.config.release {
                    self.state = EnvelopeState::Idle;
                    self.elapsed = 0.0;
                    self.amplitude = 0.0;
                }
            }
        }

        if self.state != EnvelopeState::Idle {
            self.elapsed += dt;
        }
        self.was_on = note_on;

        self.amplitude.clamp(0.0, 1.0)
    }

    /// A gate-off during a non-interruptible Attack or Decay is remembered and
    /// released as soon as Sustain is reached, without waiting for another edge.
    fn gate_off(&mut self) {
        match self.state {
            EnvelopeState::Idle | EnvelopeState::Muted => {}
            EnvelopeState::Attack | EnvelopeState::Decay if !self.config.can_interrupt => {
                self.release_pending = true;
            }
            _ => self.begin_release(),
        }
    }

    fn begin_release(&mut self) {
        self.release_start = self.amplitude;
        self.elapsed = 0.0;
        self.state = EnvelopeState::Release;
    }

    /// Forces silence while remembering the current stage. Idempotent.
    pub fn mute(&mut self) {
        if self.state != EnvelopeState::Muted {
            self.previous_state = self.state;
            self.state = EnvelopeState::Muted;
            self.amplitude = 0.0;
        }
    }

    /// Restores the stage saved by [`Envelope::mute`]. Elapsed time is untouched.
    pub fn unmute(&mut self) {
        if self.state == EnvelopeState::Muted && self.previous_state != EnvelopeState::Muted {
            self.state = self.previous_state;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == EnvelopeState::Idle
    }

    pub fn is_muted(&self) -> bool {
        self.state == EnvelopeState::Muted
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude.clamp(0.0, 1.0)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Replaces the stage timings without disturbing the running stage.
    pub fn set_config(&mut self, config: EnvelopeConfig) {
        self.config = config.sanitized();
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(EnvelopeConfig::default())
    }
}
