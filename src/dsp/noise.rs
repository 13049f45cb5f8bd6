//! White noise buffers.

use rand::Rng;

use super::buffer::SampleBuffer;

/// Fill a buffer of `sample_rate × seconds` frames with uniform values in [-1, 1].
pub fn white_noise<R: Rng + ?Sized>(
    sample_rate: u32,
    seconds: f64,
    channels: usize,
    rng: &mut R,
) -> SampleBuffer {
    let frames = (sample_rate as f64 * seconds.max(0.0)).round() as usize;
    let mut buffer = SampleBuffer::silent(channels, frames, sample_rate);
    for ch in 0..buffer.channel_count() {
        if let Some(data) = buffer.channel_mut(ch) {
            for s in data.iter_mut() {
                *s = rng.gen_range(-1.0..=1.0);
            }
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn one_second_at_sample_rate() {
        let mut rng = StdRng::seed_from_u64(7);
        let buf = white_noise(44100, 1.0, 1, &mut rng);
        assert_eq!(buf.len(), 44100);
        assert_eq!(buf.channel_count(), 1);
    }

    #[test]
    fn values_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(42);
        let buf = white_noise(48000, 1.0, 2, &mut rng);
        for ch in 0..2 {
            let data = buf.channel(ch).unwrap();
            assert!(data.iter().all(|s| (-1.0..=1.0).contains(s)));
        }
    }

    #[test]
    fn noise_is_roughly_zero_mean_and_spread() {
        let mut rng = StdRng::seed_from_u64(1);
        let buf = white_noise(44100, 1.0, 1, &mut rng);
        let data = buf.channel(0).unwrap();
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        assert!(mean.abs() < 0.02, "mean should be ~0, got {mean}");
        assert!(data.iter().any(|&s| s > 0.9));
        assert!(data.iter().any(|&s| s < -0.9));
    }

    #[test]
    fn same_seed_same_noise() {
        let a = white_noise(8000, 0.1, 1, &mut StdRng::seed_from_u64(3));
        let b = white_noise(8000, 0.1, 1, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
