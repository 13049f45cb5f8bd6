//! DSP Engine: Pure Rust audio graph rendering.
//!
//! Stands in for the platform audio graph: automatable params, oscillators,
//! gain, biquad filters and buffer sources wired into a one-shot graph and
//! rendered offline. The same code feeds the browser (via WASM), WAV export
//! and live playback.

pub mod buffer;
pub mod filter;
pub mod graph;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod param;
pub mod renderer;
