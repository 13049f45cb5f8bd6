//! Live output: rendered one-shots are handed to the audio thread and
//! summed there, so a new pad press never waits for an earlier one.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{error, info};

use crate::dsp::mixer::soft_clip;
use crate::error::PlaybackError;

/// A rendered one-shot being played back.
#[derive(Debug)]
struct Voice {
    samples: Vec<f32>,
    position: usize,
}

/// Sums voices on the audio thread. Kept apart from the stream so the
/// mixing can be driven without a device.
struct VoiceMixer {
    incoming: Receiver<Voice>,
    active: Vec<Voice>,
    master_gain: f32,
    playing: Arc<AtomicUsize>,
}

impl VoiceMixer {
    /// Fill an interleaved output block, copying the mono mix to every channel.
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        while let Ok(voice) = self.incoming.try_recv() {
            self.active.push(voice);
        }

        for frame in data.chunks_mut(channels.max(1)) {
            let mut sum = 0.0_f32;
            for voice in &mut self.active {
                if let Some(&s) = voice.samples.get(voice.position) {
                    sum += s;
                    voice.position += 1;
                }
            }
            let out = soft_clip(f64::from(sum * self.master_gain)) as f32;
            frame.fill(out);
        }

        let before = self.active.len();
        self.active.retain(|v| v.position < v.samples.len());
        let finished = before - self.active.len();
        if finished > 0 {
            self.playing.fetch_sub(finished, Ordering::Relaxed);
        }
    }
}

/// Plays rendered voices on the default output device.
pub struct LivePlayer {
    _stream: Stream,
    sender: Sender<Voice>,
    playing: Arc<AtomicUsize>,
    sample_rate: u32,
    channels: usize,
}

impl LivePlayer {
    /// Open the default output device. Voices are summed, scaled by
    /// `master_gain` and soft clipped.
    pub fn open(master_gain: f64) -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
        let config = device.default_output_config()?;
        if config.sample_format() != SampleFormat::F32 {
            return Err(PlaybackError::UnsupportedFormat(config.sample_format()));
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels,
            "opened output device"
        );

        let (sender, incoming) = unbounded();
        let playing = Arc::new(AtomicUsize::new(0));
        let mut mixer = VoiceMixer {
            incoming,
            active: Vec::new(),
            master_gain: master_gain as f32,
            playing: Arc::clone(&playing),
        };

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| mixer.fill(data, channels),
            |err| error!(error = %err, "output stream error"),
            None,
        )?;
        stream.play()?;

        Ok(LivePlayer {
            _stream: stream,
            sender,
            playing,
            sample_rate,
            channels,
        })
    }

    /// Device rate; render voices at this rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Queue a rendered voice. Returns its length in seconds.
    pub fn play(&self, samples: &[f64]) -> Result<f64, PlaybackError> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        let voice = Voice {
            samples: samples.iter().map(|&s| s as f32).collect(),
            position: 0,
        };
        self.playing.fetch_add(1, Ordering::Relaxed);
        if self.sender.send(voice).is_err() {
            self.playing.fetch_sub(1, Ordering::Relaxed);
            return Err(PlaybackError::Disconnected);
        }
        Ok(samples.len() as f64 / self.sample_rate as f64)
    }

    /// Voices queued or still sounding.
    pub fn active_voices(&self) -> usize {
        self.playing.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer(gain: f32) -> (Sender<Voice>, VoiceMixer, Arc<AtomicUsize>) {
        let (tx, rx) = unbounded();
        let playing = Arc::new(AtomicUsize::new(0));
        let m = VoiceMixer {
            incoming: rx,
            active: Vec::new(),
            master_gain: gain,
            playing: Arc::clone(&playing),
        };
        (tx, m, playing)
    }

    fn voice(samples: &[f32]) -> Voice {
        Voice {
            samples: samples.to_vec(),
            position: 0,
        }
    }

    #[test]
    fn silent_without_voices() {
        let (_tx, mut m, _) = mixer(1.0);
        let mut data = [1.0_f32; 8];
        m.fill(&mut data, 2);
        assert!(data.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn voices_sum_and_copy_to_channels() {
        let (tx, mut m, playing) = mixer(1.0);
        playing.store(2, Ordering::Relaxed);
        tx.send(voice(&[0.1, 0.2])).unwrap();
        tx.send(voice(&[0.1, 0.1, 0.1])).unwrap();

        let mut data = [0.0_f32; 8];
        m.fill(&mut data, 2);
        let expect = [0.2_f32, 0.3, 0.1, 0.0].map(|s| (s as f64).tanh() as f32);
        for (i, frame) in data.chunks(2).enumerate() {
            assert!((frame[0] - expect[i]).abs() < 1e-6, "frame {i}");
            assert_eq!(frame[0], frame[1]);
        }
        assert!(m.active.is_empty());
        assert_eq!(playing.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn voice_spans_blocks() {
        let (tx, mut m, playing) = mixer(0.5);
        playing.store(1, Ordering::Relaxed);
        tx.send(voice(&[1.0, 1.0, 1.0])).unwrap();

        let mut block = [0.0_f32; 2];
        m.fill(&mut block, 1);
        assert_eq!(m.active.len(), 1);
        assert_eq!(playing.load(Ordering::Relaxed), 1);

        m.fill(&mut block, 1);
        assert!((block[0] - 0.5_f64.tanh() as f32).abs() < 1e-6);
        assert_eq!(block[1], 0.0);
        assert_eq!(playing.load(Ordering::Relaxed), 0);
    }
}
