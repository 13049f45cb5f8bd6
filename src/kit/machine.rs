//! Drum machine: builds a fresh audio graph for every trigger.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::config::KitConfig;
use crate::dsp::buffer::SampleBuffer;
use crate::dsp::filter::FilterType;
use crate::dsp::graph::{AudioGraph, ParamName};
use crate::dsp::mixer::Mixer;
use crate::dsp::noise::white_noise;
use crate::dsp::oscillator::Waveform;
use crate::dsp::renderer::render_wav;
use crate::error::KitError;

use super::notes::Note;
use super::sound::{Sound, Trigger};

/// Latest trigger offset a session accepts, in seconds.
pub const MAX_TRIGGER_TIME: f64 = 3600.0;

/// The playable kit: configuration plus the buffers its sounds read from.
///
/// Buffers are immutable and shared between triggers; everything that
/// changes during playback lives in the per-trigger graph.
#[derive(Debug, Clone)]
pub struct DrumMachine {
    config: KitConfig,
    noise: Arc<SampleBuffer>,
    hihat: Option<Arc<SampleBuffer>>,
}

impl DrumMachine {
    pub fn new(config: KitConfig) -> Result<Self, KitError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let noise = white_noise(
            config.sample_rate,
            config.noise.seconds,
            config.noise.channels,
            &mut rng,
        );
        Ok(DrumMachine {
            config,
            noise: Arc::new(noise),
            hihat: None,
        })
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn noise_buffer(&self) -> &SampleBuffer {
        &self.noise
    }

    pub fn set_hihat_sample(&mut self, buffer: SampleBuffer) {
        debug!(
            frames = buffer.len(),
            sample_rate = buffer.sample_rate,
            "hi-hat sample loaded"
        );
        self.hihat = Some(Arc::new(buffer));
    }

    pub fn has_hihat_sample(&self) -> bool {
        self.hihat.is_some()
    }

    /// Build the one-shot graph for a single trigger of `sound`.
    pub fn build(&self, sound: Sound) -> Result<AudioGraph, KitError> {
        debug!(sound = sound.id(), "building graph");
        let mut graph = AudioGraph::new(self.config.sample_rate as f64);
        match sound {
            Sound::WhiteNoise => self.wire_white_noise(&mut graph)?,
            Sound::Snare => self.wire_snare(&mut graph)?,
            Sound::Kick => self.wire_kick(&mut graph)?,
            Sound::HiHat => self.wire_hihat(&mut graph)?,
            Sound::Note(note) => self.wire_note(&mut graph, note)?,
        }
        Ok(graph)
    }

    /// Render one trigger before master gain.
    pub fn trigger(&self, sound: Sound) -> Result<Vec<f64>, KitError> {
        Ok(self.build(sound)?.render_to_end()?)
    }

    /// Render every trigger into its own graph and mix them at their offsets.
    pub fn render_session(&self, triggers: &[Trigger]) -> Result<Vec<f64>, KitError> {
        let sample_rate = self.config.sample_rate as f64;
        let mut mixer = Mixer::new();
        mixer.master_gain = self.config.master_gain;
        for trigger in triggers {
            if !(trigger.time.is_finite() && trigger.time <= MAX_TRIGGER_TIME) {
                return Err(KitError::InvalidConfig(format!(
                    "trigger time must be finite and at most {MAX_TRIGGER_TIME} s, got {}",
                    trigger.time
                )));
            }
            let voice = self.trigger(trigger.sound)?;
            let offset = (trigger.time.max(0.0) * sample_rate).round() as usize;
            mixer.add_voice(offset, &voice);
        }
        Ok(mixer.output())
    }

    pub fn render_session_wav(&self, triggers: &[Trigger]) -> Result<Vec<u8>, KitError> {
        let mono = self.render_session(triggers)?;
        Ok(render_wav(&mono, self.config.sample_rate))
    }

    fn wire_white_noise(&self, graph: &mut AudioGraph) -> Result<(), KitError> {
        let source = graph.add_buffer_source(Arc::clone(&self.noise));
        graph.connect(source, graph.destination())?;
        graph.start(source, 0.0)?;
        Ok(())
    }

    // noise → decay → high-pass ─┐
    // tone  → decay ─────────────┴→ out
    fn wire_snare(&self, graph: &mut AudioGraph) -> Result<(), KitError> {
        let spec = &self.config.snare;
        let out = graph.destination();

        let noise = graph.add_buffer_source(Arc::clone(&self.noise));
        let noise_gain = graph.add_gain();
        spec.noise_decay.schedule(graph.param_mut(noise_gain, ParamName::Gain)?, 0.0)?;
        let highpass = graph.add_filter(FilterType::Highpass, spec.highpass_hz);
        graph.connect(noise, noise_gain)?;
        graph.connect(noise_gain, highpass)?;
        graph.connect(highpass, out)?;

        let tone = graph.add_oscillator(spec.tone_waveform);
        graph
            .param_mut(tone, ParamName::Frequency)?
            .set_value_at_time(spec.tone_hz, 0.0);
        let tone_gain = graph.add_gain();
        spec.tone_decay.schedule(graph.param_mut(tone_gain, ParamName::Gain)?, 0.0)?;
        graph.connect(tone, tone_gain)?;
        graph.connect(tone_gain, out)?;

        for source in [noise, tone] {
            graph.start(source, 0.0)?;
            graph.stop(source, spec.duration)?;
        }
        Ok(())
    }

    fn wire_kick(&self, graph: &mut AudioGraph) -> Result<(), KitError> {
        let spec = &self.config.kick;

        let osc = graph.add_oscillator(spec.waveform);
        spec.pitch.schedule(graph.param_mut(osc, ParamName::Frequency)?, 0.0)?;
        let gain = graph.add_gain();
        spec.amplitude.schedule(graph.param_mut(gain, ParamName::Gain)?, 0.0)?;

        graph.connect(osc, gain)?;
        graph.connect(gain, graph.destination())?;
        graph.start(osc, 0.0)?;
        graph.stop(osc, spec.duration)?;
        Ok(())
    }

    fn wire_hihat(&self, graph: &mut AudioGraph) -> Result<(), KitError> {
        let sample = self.hihat.as_ref().ok_or(KitError::SampleNotLoaded)?;
        let source = graph.add_buffer_source(Arc::clone(sample));
        graph
            .param_mut(source, ParamName::PlaybackRate)?
            .set_value_at_time(self.config.hihat.playback_rate, 0.0);
        graph.connect(source, graph.destination())?;
        graph.start(source, 0.0)?;
        Ok(())
    }

    // vibrato → depth ┐ (frequency)
    //         carrier → envelope → out
    fn wire_note(&self, graph: &mut AudioGraph, note: &Note) -> Result<(), KitError> {
        let spec = self.config.note.for_note(note);

        let carrier = graph.add_oscillator(spec.waveform);
        graph
            .param_mut(carrier, ParamName::Frequency)?
            .set_value_at_time(spec.frequency, 0.0);

        let vibrato = graph.add_oscillator(Waveform::Sine);
        graph
            .param_mut(vibrato, ParamName::Frequency)?
            .set_value_at_time(spec.vibrato.rate_hz, 0.0);
        let depth = graph.add_gain();
        graph
            .param_mut(depth, ParamName::Gain)?
            .set_value_at_time(spec.vibrato.depth_hz, 0.0);
        graph.connect(vibrato, depth)?;
        graph.connect_param(depth, carrier, ParamName::Frequency)?;

        let envelope = graph.add_gain();
        spec.envelope.schedule(graph.param_mut(envelope, ParamName::Gain)?, 0.0);
        graph.connect(carrier, envelope)?;
        graph.connect(envelope, graph.destination())?;

        for source in [carrier, vibrato] {
            graph.start(source, 0.0)?;
            graph.stop(source, spec.duration())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::mixer::soft_clip;
    use crate::kit::notes::find_note;

    const SR: u32 = 22050;

    fn machine() -> DrumMachine {
        DrumMachine::new(KitConfig::default().with_sample_rate(SR).with_seed(11)).unwrap()
    }

    fn note(name: &str) -> Sound {
        Sound::Note(find_note(name).unwrap())
    }

    fn peak(samples: &[f64]) -> f64 {
        samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()))
    }

    fn window(samples: &[f64], from: f64, to: f64) -> &[f64] {
        let sr = SR as f64;
        &samples[(from * sr) as usize..(to * sr) as usize]
    }

    #[test]
    fn noise_buffer_is_one_second_in_range() {
        let m = machine();
        let noise = m.noise_buffer();
        assert_eq!(noise.len(), SR as usize);
        assert!(noise.channel(0).unwrap().iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn white_noise_plays_buffer_unshaped() {
        let m = machine();
        let out = m.trigger(Sound::WhiteNoise).unwrap();
        assert_eq!(out.len(), SR as usize);
        assert_eq!(out.as_slice(), m.noise_buffer().channel(0).unwrap());
    }

    #[test]
    fn kick_sweeps_and_decays() {
        let m = machine();
        let out = m.trigger(Sound::Kick).unwrap();
        assert_eq!(out.len(), (0.5 * SR as f64) as usize);

        let early = peak(window(&out, 0.0, 0.05));
        let late = peak(window(&out, 0.4, 0.5));
        assert!(early > 0.5, "kick should start loud, got {early}");
        assert!(late < early / 10.0, "kick should decay: {early} → {late}");
        // Amplitude starts at 2.0.
        assert!(early <= 2.0 + 1e-9);

        // Pitch sweep: more zero crossings early than late.
        let crossings = |s: &[f64]| s.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        assert!(crossings(window(&out, 0.0, 0.1)) > crossings(window(&out, 0.1, 0.2)));
    }

    #[test]
    fn snare_lasts_its_duration() {
        let m = machine();
        let out = m.trigger(Sound::Snare).unwrap();
        let expected = (0.2 * SR as f64).round() as usize;
        assert!(out.len().abs_diff(expected) <= 1, "got {} frames", out.len());
        assert!(peak(window(&out, 0.0, 0.02)) > 0.3);
        assert!(peak(window(&out, 0.15, 0.19)) < 0.1);
    }

    #[test]
    fn snare_layers_filtered_noise_and_tone() {
        let m = machine();
        let out = m.trigger(Sound::Snare).unwrap();
        let graph = m.build(Sound::Snare).unwrap();
        assert_eq!(graph.node_count(), 1 + 3 + 2);
        // Layered output differs from a pure triangle.
        let tone_only: Vec<f64> = {
            let mut g = AudioGraph::new(SR as f64);
            let osc = g.add_oscillator(Waveform::Triangle);
            g.param_mut(osc, ParamName::Frequency).unwrap().set_value_at_time(230.0, 0.0);
            let gain = g.add_gain();
            m.config().snare.tone_decay
                .schedule(g.param_mut(gain, ParamName::Gain).unwrap(), 0.0)
                .unwrap();
            g.connect(osc, gain).unwrap();
            g.connect(gain, g.destination()).unwrap();
            g.start(osc, 0.0).unwrap();
            g.stop(osc, 0.2).unwrap();
            g.render_to_end().unwrap()
        };
        assert_eq!(out.len(), tone_only.len());
        let residual: Vec<f64> = out.iter().zip(&tone_only).map(|(a, b)| a - b).collect();
        assert!(peak(&residual) > 0.05, "noise layer should be audible");
    }

    #[test]
    fn hihat_requires_sample() {
        let m = machine();
        assert!(matches!(m.trigger(Sound::HiHat), Err(KitError::SampleNotLoaded)));
    }

    #[test]
    fn hihat_plays_at_double_speed() {
        let mut m = machine();
        m.set_hihat_sample(SampleBuffer::mono(vec![0.5; SR as usize], SR));
        assert!(m.has_hihat_sample());
        let out = m.trigger(Sound::HiHat).unwrap();
        assert_eq!(out.len(), SR as usize / 2);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-12));
    }

    #[test]
    fn hihat_resampled_from_own_rate() {
        let mut m = machine();
        m.set_hihat_sample(SampleBuffer::mono(vec![0.5; 44100], 44100));
        // One second at 44.1 kHz, played at 2x, lasts half a second.
        assert_eq!(m.trigger(Sound::HiHat).unwrap().len(), SR as usize / 2);
    }

    #[test]
    fn c4_end_to_end() {
        let m = machine();
        let out = m.trigger(note("c-4")).unwrap();
        assert_eq!(out.len(), SR as usize, "notes last one second");

        // Square carrier near 261.626 Hz: count rising edges over the sustain.
        let sustain = window(&out, 0.5, 0.8);
        let edges = sustain.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        let expected = 261.626 * 0.3;
        assert!((edges as f64 - expected).abs() <= 2.0, "expected ~{expected} cycles, got {edges}");

        // Square wave amplitude follows the envelope.
        let attack_peak = peak(window(&out, 0.0, 0.05));
        let top = peak(window(&out, 0.18, 0.22));
        let held = peak(window(&out, 0.55, 0.75));
        let tail = peak(window(&out, 0.97, 1.0));
        assert!(attack_peak < 0.3, "attack ramps from zero, got {attack_peak}");
        assert!(top > 0.95, "attack reaches full level, got {top}");
        assert!((held - 0.7).abs() < 0.05, "sustain holds 0.7, got {held}");
        assert!(tail < 0.12, "release fades out, got {tail}");
    }

    #[test]
    fn vibrato_depth_wired_to_carrier() {
        // With a sine carrier the vibrato shows up as phase drift relative
        // to an unmodulated oscillator.
        let mut config = KitConfig::default().with_sample_rate(SR).with_seed(1);
        config.note.waveform = Waveform::Sine;
        config.note.vibrato.depth_hz = 0.0;
        let flat = DrumMachine::new(config.clone()).unwrap().trigger(note("a-4")).unwrap();
        config.note.vibrato.depth_hz = 1.5;
        let wobbly = DrumMachine::new(config).unwrap().trigger(note("a-4")).unwrap();

        let diff = peak(&flat.iter().zip(&wobbly).map(|(a, b)| a - b).collect::<Vec<_>>());
        assert!(diff > 0.05, "vibrato should modulate the carrier, got {diff}");
        // 1.5 Hz peak deviation at 10 Hz drifts the phase by at most 0.3 rad.
        assert!(diff < 0.35, "vibrato should stay shallow, got {diff}");
    }

    /// Instantaneous frequency from interpolated rising zero crossings,
    /// as `(time, hz)` at the midpoint of each period.
    fn crossing_frequencies(samples: &[f64], from: f64, to: f64) -> Vec<(f64, f64)> {
        let sr = SR as f64;
        let crossings: Vec<f64> = samples
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0] < 0.0 && w[1] >= 0.0)
            .map(|(i, w)| (i as f64 + w[0] / (w[0] - w[1])) / sr)
            .filter(|t| (from..=to).contains(t))
            .collect();
        crossings
            .windows(2)
            .map(|c| ((c[0] + c[1]) / 2.0, 1.0 / (c[1] - c[0])))
            .collect()
    }

    #[test]
    fn vibrato_rate_follows_lfo() {
        let mut config = KitConfig::default().with_sample_rate(SR).with_seed(1);
        config.note.waveform = Waveform::Sine;
        config.note.vibrato.depth_hz = 100.0;
        let a4 = find_note("a-4").unwrap();
        let expected = config.note.for_note(a4);
        let out = DrumMachine::new(config).unwrap().trigger(Sound::Note(a4)).unwrap();

        let measured = crossing_frequencies(&out, 0.07, 0.93);
        for &(t, hz) in &measured {
            let want = expected.frequency_at(t);
            assert!((hz - want).abs() < 2.0, "at {t:.4}s expected {want:.1} Hz, got {hz:.1}");
        }
        let (lo, hi) = measured
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &(_, hz)| (lo.min(hz), hi.max(hz)));
        assert!(lo < 345.0 && hi > 535.0, "deviation should reach 100 Hz, got {lo:.1}..{hi:.1}");

        // Frequency crosses the carrier pitch twice per vibrato cycle.
        let flips = measured
            .windows(2)
            .filter(|w| (w[0].1 - 440.0).signum() != (w[1].1 - 440.0).signum())
            .count();
        let span = measured[measured.len() - 1].0 - measured[0].0;
        let rate = flips as f64 / 2.0 / span;
        assert!((rate - 10.0).abs() < 0.6, "vibrato rate ~10 Hz, got {rate:.2} ({flips} flips)");
    }

    #[test]
    fn session_rejects_unplayable_offsets() {
        let m = machine();
        for time in [f64::INFINITY, f64::NAN, 1e300, MAX_TRIGGER_TIME + 1.0] {
            let result = m.render_session(&[Trigger::new(Sound::Kick, time)]);
            assert!(matches!(result, Err(KitError::InvalidConfig(_))), "time {time}");
        }
        let spaced = Trigger::sequence(&[Sound::Kick, Sound::Kick], f64::INFINITY);
        assert!(m.render_session(&spaced).is_err());
    }

    #[test]
    fn every_note_renders_one_second() {
        let m = machine();
        for sound in Sound::all().filter(|s| matches!(s, Sound::Note(_))) {
            let graph = m.build(sound).unwrap();
            assert_eq!(graph.duration(), Some(1.0), "{sound}");
        }
    }

    #[test]
    fn overlapping_triggers_are_independent() {
        let m = machine();
        let kick = m.trigger(Sound::Kick).unwrap();
        let offset = (0.1 * SR as f64).round() as usize;

        let session = m
            .render_session(&[Trigger::new(Sound::Kick, 0.0), Trigger::new(Sound::Kick, 0.1)])
            .unwrap();
        assert_eq!(session.len(), offset + kick.len());

        let gain = m.config().master_gain;
        for (i, &s) in session.iter().enumerate() {
            let first = kick.get(i).copied().unwrap_or(0.0);
            let second = i.checked_sub(offset).and_then(|j| kick.get(j)).copied().unwrap_or(0.0);
            let expected = soft_clip(gain * (first + second));
            assert!((s - expected).abs() < 1e-12, "frame {i}: {s} vs {expected}");
        }
    }

    #[test]
    fn repeated_triggers_render_identically() {
        let m = machine();
        for sound in [Sound::Snare, Sound::Kick, note("e-5")] {
            assert_eq!(m.trigger(sound).unwrap(), m.trigger(sound).unwrap(), "{sound}");
        }
    }

    #[test]
    fn session_wav_has_audio() {
        let m = machine();
        let wav = m
            .render_session_wav(&Trigger::sequence(&[Sound::Kick, Sound::Snare], 0.25))
            .unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        // The kick outlasts the snare that starts a quarter second later.
        let frames = (wav.len() - 44) / 4;
        assert_eq!(frames, m.trigger(Sound::Kick).unwrap().len());
        assert!(wav[44..].iter().any(|&b| b != 0));
    }

    #[test]
    fn zero_floor_config_rejected() {
        let mut config = KitConfig::default();
        config.snare.noise_decay.to = 0.0;
        assert!(matches!(DrumMachine::new(config), Err(KitError::InvalidDecay(_))));
    }
}
