//! Sample buffers: raw sample values at a sample rate and channel count.

/// Decoded or generated audio, stored per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f64>>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    /// Silent buffer of `frames` samples per channel.
    pub fn silent(channels: usize, frames: usize, sample_rate: u32) -> Self {
        SampleBuffer {
            channels: vec![vec![0.0; frames]; channels.max(1)],
            sample_rate,
        }
    }

    pub fn mono(data: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer {
            channels: vec![data],
            sample_rate,
        }
    }

    /// Build from separate channel vectors. Shorter channels are padded with
    /// silence so every channel has the same length.
    pub fn from_channels(mut channels: Vec<Vec<f64>>, sample_rate: u32) -> Self {
        if channels.is_empty() {
            channels.push(Vec::new());
        }
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for ch in channels.iter_mut() {
            ch.resize(frames, 0.0);
        }
        SampleBuffer {
            channels,
            sample_rate,
        }
    }

    /// Create from interleaved 16-bit signed PCM.
    pub fn from_interleaved_i16(pcm: &[i16], channels: usize, sample_rate: u32) -> Self {
        Self::from_interleaved(pcm.iter().map(|&s| s as f64 / 32768.0), channels, sample_rate)
    }

    /// Create from interleaved f32 samples.
    pub fn from_interleaved_f32(samples: &[f32], channels: usize, sample_rate: u32) -> Self {
        Self::from_interleaved(samples.iter().map(|&s| s as f64), channels, sample_rate)
    }

    fn from_interleaved(
        samples: impl Iterator<Item = f64>,
        channels: usize,
        sample_rate: u32,
    ) -> Self {
        let channels = channels.max(1);
        let mut out = vec![Vec::new(); channels];
        for (i, s) in samples.enumerate() {
            out[i % channels].push(s);
        }
        Self::from_channels(out, sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds at the buffer's own sample rate.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f64]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }

    /// Average of all channels at a frame.
    fn frame_mono(&self, idx: usize) -> f64 {
        let sum: f64 = self.channels.iter().map(|ch| ch[idx]).sum();
        sum / self.channels.len() as f64
    }

    /// Read the mono downmix with linear interpolation at a fractional frame.
    pub fn read_interpolated(&self, position: f64) -> f64 {
        let len = self.len();
        if len == 0 || position < 0.0 {
            return 0.0;
        }

        let idx = position as usize;
        if idx >= len - 1 {
            return if idx < len { self.frame_mono(idx) } else { 0.0 };
        }

        let frac = position - idx as f64;
        self.frame_mono(idx) * (1.0 - frac) + self.frame_mono(idx + 1) * frac
    }
}
