pub mod config;
pub mod dsp;
pub mod error;
pub mod kit;
#[cfg(feature = "playback")]
pub mod playback;
#[cfg(feature = "samples")]
pub mod samples;

use crate::config::KitConfig;
use crate::dsp::buffer::SampleBuffer;
use crate::error::KitError;
use crate::kit::{DrumMachine, NOTES, Sound, Trigger};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the drumpad_core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn machine(sample_rate: u32, seed: Option<u64>) -> Result<DrumMachine, KitError> {
    let mut config = KitConfig::default().with_sample_rate(sample_rate);
    config.seed = seed;
    DrumMachine::new(config)
}

/// Render one pad press with master gain applied.
pub fn render_sound(id: &str, sample_rate: u32, seed: Option<u64>) -> Result<Vec<f64>, KitError> {
    let sound = Sound::parse(id)?;
    machine(sample_rate, seed)?.render_session(&[Trigger::new(sound, 0.0)])
}

/// Render a hi-hat press from mono samples decoded by the caller.
pub fn render_hihat(
    decoded: &[f32],
    decoded_rate: u32,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<Vec<f64>, KitError> {
    if decoded.is_empty() || decoded_rate == 0 {
        return Err(KitError::SampleNotLoaded);
    }
    let mut machine = machine(sample_rate, seed)?;
    machine.set_hihat_sample(SampleBuffer::from_interleaved_f32(decoded, 1, decoded_rate));
    machine.render_session(&[Trigger::new(Sound::HiHat, 0.0)])
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: ids of every pad, percussion first.
#[wasm_bindgen]
pub fn sound_ids() -> Vec<String> {
    Sound::all().map(|s| s.id().to_string()).collect()
}

/// WASM-exposed: the note catalog as `[{ name, frequency }]`.
#[wasm_bindgen]
pub fn note_catalog() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&NOTES[..]).map_err(to_js)
}

/// WASM-exposed: render a pad press to mono f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_sound_samples(
    id: &str,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<Vec<f32>, JsValue> {
    let samples = render_sound(id, sample_rate, seed).map_err(to_js)?;
    Ok(samples.iter().map(|&s| s as f32).collect())
}

/// WASM-exposed: render a pad press to a WAV byte array.
#[wasm_bindgen]
pub fn render_sound_wav(id: &str, sample_rate: u32, seed: Option<u64>) -> Result<Vec<u8>, JsValue> {
    let samples = render_sound(id, sample_rate, seed).map_err(to_js)?;
    Ok(dsp::renderer::render_wav(&samples, sample_rate))
}

/// WASM-exposed: render the hi-hat from a buffer the page decoded with
/// `decodeAudioData` (channel 0 and its sample rate).
#[wasm_bindgen]
pub fn render_hihat_samples(
    decoded: &[f32],
    decoded_rate: u32,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<Vec<f32>, JsValue> {
    let samples = render_hihat(decoded, decoded_rate, sample_rate, seed).map_err(to_js)?;
    Ok(samples.iter().map(|&s| s as f32).collect())
}
