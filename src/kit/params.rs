//! Per-sound synthesis parameters.

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::KitError;

use super::envelope::{EnvelopeSpec, ExpDecay};
use super::notes::Note;

/// Where the hi-hat sample is fetched from when none is configured.
pub const DEFAULT_HIHAT_URL: &str =
    "https://unpkg.com/@teropa/drumkit@1.1.0/src/assets/hatOpen2.mp3";

fn positive(what: &str, value: f64) -> Result<(), KitError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KitError::InvalidConfig(format!("{what} must be positive, got {value}")))
    }
}

/// Sinusoidal frequency modulation added to a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vibrato {
    pub rate_hz: f64,
    /// Peak deviation in Hz.
    pub depth_hz: f64,
}

impl Default for Vibrato {
    fn default() -> Self {
        Vibrato {
            rate_hz: 10.0,
            depth_hz: 1.5,
        }
    }
}

/// Shared voice settings for every catalog note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteTemplate {
    pub waveform: Waveform,
    pub vibrato: Vibrato,
    pub envelope: EnvelopeSpec,
}

impl Default for NoteTemplate {
    fn default() -> Self {
        NoteTemplate {
            waveform: Waveform::Square,
            vibrato: Vibrato::default(),
            envelope: EnvelopeSpec::default(),
        }
    }
}

impl NoteTemplate {
    pub fn validate(&self) -> Result<(), KitError> {
        positive("vibrato rate", self.vibrato.rate_hz)?;
        if !(self.vibrato.depth_hz.is_finite() && self.vibrato.depth_hz >= 0.0) {
            return Err(KitError::InvalidConfig(format!(
                "vibrato depth must be non-negative, got {}",
                self.vibrato.depth_hz
            )));
        }
        self.envelope.validate()
    }

    pub fn for_note(&self, note: &Note) -> NoteSpec {
        NoteSpec {
            frequency: note.frequency,
            waveform: self.waveform,
            vibrato: self.vibrato,
            envelope: self.envelope,
        }
    }
}

/// Everything needed to play one note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSpec {
    pub frequency: f64,
    pub waveform: Waveform,
    pub vibrato: Vibrato,
    pub envelope: EnvelopeSpec,
}

impl NoteSpec {
    pub fn for_note(note: &Note) -> Self {
        NoteTemplate::default().for_note(note)
    }

    /// Carrier frequency at `t`, including vibrato.
    pub fn frequency_at(&self, t: f64) -> f64 {
        let phase = 2.0 * std::f64::consts::PI * self.vibrato.rate_hz * t;
        self.frequency + self.vibrato.depth_hz * phase.sin()
    }

    pub fn duration(&self) -> f64 {
        self.envelope.total
    }
}

/// High-passed noise burst layered with a decaying tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnareSpec {
    pub noise_decay: ExpDecay,
    pub highpass_hz: f64,
    pub tone_waveform: Waveform,
    pub tone_hz: f64,
    pub tone_decay: ExpDecay,
    pub duration: f64,
}

impl Default for SnareSpec {
    fn default() -> Self {
        SnareSpec {
            noise_decay: ExpDecay::new(1.0, 0.01, 0.2),
            highpass_hz: 1500.0,
            tone_waveform: Waveform::Triangle,
            tone_hz: 230.0,
            tone_decay: ExpDecay::new(1.0, 0.01, 0.2),
            duration: 0.2,
        }
    }
}

impl SnareSpec {
    pub fn validate(&self) -> Result<(), KitError> {
        self.noise_decay.validate()?;
        self.tone_decay.validate()?;
        positive("snare high-pass cutoff", self.highpass_hz)?;
        positive("snare tone frequency", self.tone_hz)?;
        positive("snare duration", self.duration)
    }
}

/// A single oscillator with an exponential pitch sweep and amplitude decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KickSpec {
    pub waveform: Waveform,
    pub pitch: ExpDecay,
    pub amplitude: ExpDecay,
    pub duration: f64,
}

impl Default for KickSpec {
    fn default() -> Self {
        KickSpec {
            waveform: Waveform::Sine,
            pitch: ExpDecay::new(150.0, 0.001, 0.5),
            amplitude: ExpDecay::new(2.0, 0.001, 0.5),
            duration: 0.5,
        }
    }
}

impl KickSpec {
    pub fn validate(&self) -> Result<(), KitError> {
        self.pitch.validate()?;
        self.amplitude.validate()?;
        positive("kick duration", self.duration)
    }
}

/// A pre-recorded sample played back faster than recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HiHatSpec {
    pub url: String,
    pub playback_rate: f64,
}

impl Default for HiHatSpec {
    fn default() -> Self {
        HiHatSpec {
            url: DEFAULT_HIHAT_URL.to_string(),
            playback_rate: 2.0,
        }
    }
}

impl HiHatSpec {
    pub fn validate(&self) -> Result<(), KitError> {
        positive("hi-hat playback rate", self.playback_rate)
    }
}

/// Shape of the shared white-noise buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoiseSpec {
    pub seconds: f64,
    pub channels: usize,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        NoiseSpec {
            seconds: 1.0,
            channels: 1,
        }
    }
}

impl NoiseSpec {
    pub fn validate(&self) -> Result<(), KitError> {
        positive("noise length", self.seconds)?;
        if self.channels == 0 {
            return Err(KitError::InvalidConfig("noise needs at least one channel".into()));
        }
        Ok(())
    }
}
