//! Decode WAV or MP3 bytes into a [`SampleBuffer`].

use std::io::Cursor;

use crate::dsp::buffer::SampleBuffer;
use crate::error::SampleError;

/// Decode an audio asset, picking the decoder from the file's magic bytes.
pub fn decode(bytes: &[u8]) -> Result<SampleBuffer, SampleError> {
    let buffer = if bytes.starts_with(b"RIFF") {
        decode_wav(bytes)?
    } else {
        decode_mp3(bytes)?
    };
    if buffer.is_empty() {
        return Err(SampleError::Empty);
    }
    Ok(buffer)
}

pub fn decode_wav(bytes: &[u8]) -> Result<SampleBuffer, SampleError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = (spec.channels as usize).max(1);

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mut per_channel = vec![Vec::new(); channels];
    for (i, s) in samples.into_iter().enumerate() {
        per_channel[i % channels].push(s);
    }
    Ok(SampleBuffer::from_channels(per_channel, spec.sample_rate))
}

pub fn decode_mp3(bytes: &[u8]) -> Result<SampleBuffer, SampleError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut pcm: Vec<i16> = Vec::new();
    let mut format: Option<(usize, u32)> = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if format.is_none() {
                    format = Some((frame.channels, frame.sample_rate as u32));
                }
                pcm.extend_from_slice(&frame.data);
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let (channels, sample_rate) = format.ok_or(SampleError::Empty)?;
    Ok(SampleBuffer::from_interleaved_i16(&pcm, channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(
        spec: hound::WavSpec,
        write: impl FnOnce(&mut hound::WavWriter<&mut Cursor<Vec<u8>>>),
    ) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_int_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            for s in [0_i16, 16384, -16384, 32767] {
                w.write_sample(s).unwrap();
            }
        });

        let buf = decode(&bytes).unwrap();
        assert_eq!(buf.sample_rate, 22050);
        assert_eq!(buf.len(), 4);
        let data = buf.channel(0).unwrap();
        assert!((data[1] - 0.5).abs() < 1e-4);
        assert!((data[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn decodes_stereo_float_wav() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            for s in [0.25_f32, -0.25, 0.5, -0.5] {
                w.write_sample(s).unwrap();
            }
        });

        let buf = decode(&bytes).unwrap();
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.channel(0).unwrap(), &[0.25, 0.5]);
        assert_eq!(buf.channel(1).unwrap(), &[-0.25, -0.5]);
    }

    #[test]
    fn empty_wav_is_error() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |_| {});
        assert!(matches!(decode(&bytes), Err(SampleError::Empty)));
    }

    #[test]
    fn garbage_is_error() {
        assert!(decode(b"definitely not audio").is_err());
        assert!(decode(&[]).is_err());
        assert!(matches!(decode(b"RIFF....junk"), Err(SampleError::Wav(_))));
    }
}
