//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A band-limited oscillator driven by a per-sample frequency.
///
/// The frequency is supplied on every call so that scheduled sweeps and
/// vibrato modulation can change it sample by sample.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Generate the next sample at `frequency` Hz.
    pub fn next_sample(&mut self, frequency: f64) -> f64 {
        let inc = frequency / self.sample_rate;
        let dt = inc.abs();
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0 - poly_blep(self.phase, dt),
            Waveform::Square => self.square(dt),
            Waveform::Triangle => self.triangle(),
        };

        self.phase = (self.phase + inc).rem_euclid(1.0);
        sample
    }

    fn square(&self, dt: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, dt);
        value -= poly_blep((self.phase + 0.5) % 1.0, dt);
        value
    }

    /// Piecewise linear: -1→+1 over the first half-cycle, +1→-1 over the second.
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) correction.
///
/// `t` is the phase [0, 1), `dt` the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(waveform: Waveform, freq: f64, n: usize) -> Vec<f64> {
        let mut osc = Oscillator::new(waveform, 44100.0);
        (0..n).map(|_| osc.next_sample(freq)).collect()
    }

    #[test]
    fn sine_zero_at_start() {
        let s = run(Waveform::Sine, 440.0, 1)[0];
        assert!(s.abs() < 1e-10, "Sine should start near 0, got {s}");
    }

    #[test]
    fn waveform_ranges() {
        for (waveform, bound) in [
            (Waveform::Sine, 1.0),
            (Waveform::Triangle, 1.0),
            (Waveform::Square, 1.5),
            (Waveform::Sawtooth, 1.5),
        ] {
            for s in run(waveform, 440.0, 44100) {
                assert!(s.abs() <= bound, "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn square_sign_follows_phase() {
        // 100 Hz at 44.1 kHz: first half-cycle (~220 samples) is positive.
        let samples = run(Waveform::Square, 100.0, 441);
        assert!(samples[100] > 0.9, "got {}", samples[100]);
        assert!(samples[300] < -0.9, "got {}", samples[300]);
    }

    #[test]
    fn near_zero_frequency_is_stable() {
        let samples = run(Waveform::Sine, 0.001, 1000);
        assert!(samples.iter().all(|s| s.is_finite() && s.abs() < 0.01));
    }

    #[test]
    fn negative_frequency_wraps_phase() {
        let samples = run(Waveform::Triangle, -440.0, 2000);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn waveform_serde_lowercase() {
        let w: Waveform = serde_json::from_str("\"triangle\"").unwrap();
        assert_eq!(w, Waveform::Triangle);
        assert_eq!(serde_json::to_string(&Waveform::Square).unwrap(), "\"square\"");
    }
}
