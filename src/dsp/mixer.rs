//! Mixer: sums one-shot voices at sample offsets with master gain.

/// Gain of the primary gain control that every sound feeds.
pub const DEFAULT_MASTER_GAIN: f64 = 0.05;

/// A summing mixer that accumulates independently rendered voices.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: DEFAULT_MASTER_GAIN,
            buffer: Vec::new(),
        }
    }

    /// Add a whole voice starting at `offset`, growing the buffer to fit.
    pub fn add_voice(&mut self, offset: usize, voice: &[f64]) {
        let end = offset + voice.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0.0);
        }
        for (dst, &s) in self.buffer[offset..end].iter_mut().zip(voice) {
            *dst += s;
        }
    }

    /// The mixed output, with master gain and soft clipping applied.
    pub fn output(&self) -> Vec<f64> {
        self.buffer
            .iter()
            .map(|&s| soft_clip(s * self.master_gain))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
pub fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
