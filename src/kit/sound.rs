use std::fmt;
use std::str::FromStr;

use crate::error::KitError;

use super::notes::{NOTES, Note, find_note};

/// Every playable sound, one per pad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sound {
    WhiteNoise,
    Snare,
    Kick,
    HiHat,
    Note(&'static Note),
}

impl Sound {
    pub const PERCUSSION: [Sound; 4] = [Sound::WhiteNoise, Sound::Snare, Sound::Kick, Sound::HiHat];

    /// Percussion pads first, then the note catalog in order.
    pub fn all() -> impl Iterator<Item = Sound> {
        Self::PERCUSSION
            .into_iter()
            .chain(NOTES.iter().map(Sound::Note))
    }

    pub fn parse(id: &str) -> Result<Sound, KitError> {
        let id = id.trim();
        match id.to_ascii_lowercase().as_str() {
            "white-noise" | "noise" => Ok(Sound::WhiteNoise),
            "snare" => Ok(Sound::Snare),
            "kick" => Ok(Sound::Kick),
            "hi-hat" | "hihat" => Ok(Sound::HiHat),
            other => find_note(other)
                .map(Sound::Note)
                .ok_or_else(|| KitError::UnknownSound(id.to_string())),
        }
    }

    /// Stable identifier, accepted by [`Sound::parse`].
    pub fn id(&self) -> &'static str {
        match self {
            Sound::WhiteNoise => "white-noise",
            Sound::Snare => "snare",
            Sound::Kick => "kick",
            Sound::HiHat => "hi-hat",
            Sound::Note(note) => note.name,
        }
    }

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Sound::WhiteNoise => "White Noise",
            Sound::Snare => "Snare",
            Sound::Kick => "Kick",
            Sound::HiHat => "Hi Hat",
            Sound::Note(note) => note.name,
        }
    }

    /// Needs a decoded sample before it can play.
    pub fn is_sampled(&self) -> bool {
        matches!(self, Sound::HiHat)
    }
}

impl FromStr for Sound {
    type Err = KitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sound::parse(s)
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A sound scheduled at an offset (seconds) within a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub sound: Sound,
    pub time: f64,
}

impl Trigger {
    pub fn new(sound: Sound, time: f64) -> Self {
        Trigger { sound, time }
    }

    /// One trigger per sound, `spacing` seconds apart.
    pub fn sequence(sounds: &[Sound], spacing: f64) -> Vec<Trigger> {
        sounds
            .iter()
            .enumerate()
            .map(|(i, &sound)| Trigger::new(sound, i as f64 * spacing))
            .collect()
    }
}
