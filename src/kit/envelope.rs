//! Amplitude and frequency curves: the linear ADSR note envelope and the
//! exponential decays used by percussion.

use serde::{Deserialize, Serialize};

use crate::dsp::param::AudioParam;
use crate::error::{GraphError, KitError};

/// Envelope stages over a fixed total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

/// Four-stage linear envelope over a fixed total duration (seconds).
///
/// Attack ramps 0→1, decay ramps 1→sustain level, sustain holds until
/// `release` seconds before the end, release ramps to 0 at `total`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvelopeSpec {
    pub attack: f64,
    pub decay: f64,
    pub sustain_level: f64,
    pub release: f64,
    pub total: f64,
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        EnvelopeSpec {
            attack: 0.2,
            decay: 0.3,
            sustain_level: 0.7,
            release: 0.2,
            total: 1.0,
        }
    }
}

impl EnvelopeSpec {
    pub fn validate(&self) -> Result<(), KitError> {
        let times = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
            ("total", self.total),
        ];
        for (name, value) in times {
            if !value.is_finite() || value < 0.0 {
                return Err(KitError::InvalidEnvelope(format!(
                    "{name} must be a non-negative time, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain_level) {
            return Err(KitError::InvalidEnvelope(format!(
                "sustain level must be within [0, 1], got {}",
                self.sustain_level
            )));
        }
        if self.attack + self.decay + self.release > self.total + 1e-12 {
            return Err(KitError::InvalidEnvelope(format!(
                "attack + decay + release ({}) exceeds total duration {}",
                self.attack + self.decay + self.release,
                self.total
            )));
        }
        Ok(())
    }

    /// Time spent holding the sustain level.
    pub fn sustain_time(&self) -> f64 {
        (self.total - self.attack - self.decay - self.release).max(0.0)
    }

    fn release_start(&self) -> f64 {
        self.total - self.release
    }

    pub fn stage_at(&self, t: f64) -> Stage {
        if t < 0.0 {
            Stage::Idle
        } else if t < self.attack {
            Stage::Attack
        } else if t < self.attack + self.decay {
            Stage::Decay
        } else if t < self.release_start() {
            Stage::Sustain
        } else if t < self.total {
            Stage::Release
        } else {
            Stage::Done
        }
    }

    /// Amplitude at `t` seconds after the trigger.
    pub fn level_at(&self, t: f64) -> f64 {
        match self.stage_at(t) {
            Stage::Idle | Stage::Done => 0.0,
            Stage::Attack => t / self.attack,
            Stage::Decay => 1.0 - (1.0 - self.sustain_level) * (t - self.attack) / self.decay,
            Stage::Sustain => self.sustain_level,
            Stage::Release => {
                self.sustain_level * (1.0 - (t - self.release_start()) / self.release)
            }
        }
    }

    /// Write the envelope onto `param` as one set and four linear ramps.
    pub fn schedule(&self, param: &mut AudioParam, start: f64) {
        param
            .set_value_at_time(0.0, start)
            .linear_ramp_to_value_at_time(1.0, start + self.attack)
            .linear_ramp_to_value_at_time(self.sustain_level, start + self.attack + self.decay)
            .linear_ramp_to_value_at_time(self.sustain_level, start + self.release_start())
            .linear_ramp_to_value_at_time(0.0, start + self.total);
    }
}

/// Exponential decay from `from` to a non-zero floor `to` over `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpDecay {
    pub from: f64,
    pub to: f64,
    pub duration: f64,
}

impl ExpDecay {
    pub const fn new(from: f64, to: f64, duration: f64) -> Self {
        ExpDecay { from, to, duration }
    }

    pub fn validate(&self) -> Result<(), KitError> {
        if !(self.from > 0.0 && self.to > 0.0) {
            return Err(KitError::InvalidDecay(format!(
                "exponential endpoints must be positive, got {} → {}",
                self.from, self.to
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(KitError::InvalidDecay(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    pub fn value_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            self.from
        } else if t >= self.duration {
            self.to
        } else {
            self.from * (self.to / self.from).powf(t / self.duration)
        }
    }

    pub fn schedule(&self, param: &mut AudioParam, start: f64) -> Result<(), GraphError> {
        param
            .set_value_at_time(self.from, start)
            .exponential_ramp_to_value_at_time(self.to, start + self.duration)?;
        Ok(())
    }
}
