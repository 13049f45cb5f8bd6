//! WAV renderer: turns rendered mono output into WAV bytes.

/// Convert mono f64 output to interleaved stereo i16 PCM.
pub fn to_pcm_i16_stereo(mono: &[f64]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &s in mono {
        let sample = (s * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        stereo.push(sample); // L
        stereo.push(sample); // R
    }
    stereo
}

/// Render mono output to a WAV file as bytes (16-bit stereo PCM).
pub fn render_wav(mono: &[f64], sample_rate: u32) -> Vec<u8> {
    encode_wav(&to_pcm_i16_stereo(mono), sample_rate, 2)
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
