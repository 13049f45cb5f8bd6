//! Kit configuration, loaded from JSON.
//!
//! Every field is optional; missing fields fall back to the standard kit.
//!
//! ```json
//! {
//!   "sampleRate": 48000,
//!   "masterGain": 0.1,
//!   "seed": 7,
//!   "kick": { "duration": 0.4 },
//!   "note": { "waveform": "sawtooth", "vibrato": { "depthHz": 3.0 } }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::mixer::DEFAULT_MASTER_GAIN;
use crate::error::KitError;
use crate::kit::params::{HiHatSpec, KickSpec, NoiseSpec, NoteTemplate, SnareSpec};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KitConfig {
    pub sample_rate: u32,
    pub master_gain: f64,
    /// Seed for the white-noise buffer; random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub noise: NoiseSpec,
    pub note: NoteTemplate,
    pub snare: SnareSpec,
    pub kick: KickSpec,
    pub hihat: HiHatSpec,
}

impl Default for KitConfig {
    fn default() -> Self {
        KitConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            master_gain: DEFAULT_MASTER_GAIN,
            seed: None,
            noise: NoiseSpec::default(),
            note: NoteTemplate::default(),
            snare: SnareSpec::default(),
            kick: KickSpec::default(),
            hihat: HiHatSpec::default(),
        }
    }
}

impl KitConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, KitError> {
        let config: KitConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, KitError> {
        debug!(path = %path.display(), "loading kit config");
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), KitError> {
        if self.sample_rate < 3000 {
            return Err(KitError::InvalidConfig(format!(
                "sample rate {} is too low",
                self.sample_rate
            )));
        }
        if !(self.master_gain.is_finite() && self.master_gain >= 0.0) {
            return Err(KitError::InvalidConfig(format!(
                "master gain must be non-negative, got {}",
                self.master_gain
            )));
        }
        self.noise.validate()?;
        self.note.validate()?;
        self.snare.validate()?;
        self.kick.validate()?;
        self.hihat.validate()
    }
}
