//! WAV reading and writing for the offline host.

use std::path::Path;

use anyhow::Context;
use hound::{SampleFormat, WavReader, WavWriter};

/// Reads a WAV file as stereo f32, duplicating mono into both channels and
/// ignoring channels past the second. Returns `(left, right, sample_rate)`.
pub fn read_wav_stereo(path: impl AsRef<Path>) -> anyhow::Result<(Vec<f32>, Vec<f32>, u32)> {
    let path = path.as_ref();
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("decoding {}", path.display()))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("decoding {}", path.display()))?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let frames = interleaved.len() / channels;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in interleaved.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(if channels > 1 { frame[1] } else { frame[0] });
    }

    Ok((left, right, spec.sample_rate))
}

/// Writes stereo f32 samples as a 32-bit float WAV file.
pub fn write_wav_stereo(
    path: impl AsRef<Path>,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for (l, r) in left.iter().zip(right.iter()) {
        writer.write_sample(*l)?;
        writer.write_sample(*r)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

/// Peak absolute value of a slice.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Root-mean-square of a slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Linear amplitude to dBFS, floored at -120 dB.
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 1e-6 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let left: Vec<f32> = (0..64).map(|i| (i as f32 / 64.0) - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        write_wav_stereo(&path, &left, &right, 48_000).unwrap();

        let (l, r, sr) = read_wav_stereo(&path).unwrap();
        assert_eq!(sr, 48_000);
        assert_eq!(l.len(), 64);
        for i in 0..64 {
            assert!((l[i] - left[i]).abs() < 1e-6);
            assert!((r[i] - right[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn mono_is_duplicated_to_both_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..16 {
            writer.write_sample(i as f32 / 16.0).unwrap();
        }
        writer.finalize().unwrap();

        let (l, r, _) = read_wav_stereo(&path).unwrap();
        assert_eq!(l, r);
        assert_eq!(l.len(), 16);
    }

    #[test]
    fn level_helpers() {
        assert_eq!(peak(&[0.1, -0.7, 0.3]), 0.7);
        assert!((rms(&[0.5, -0.5]) - 0.5).abs() < 1e-6);
        assert_eq!(linear_to_db(0.0), -120.0);
        assert!((linear_to_db(1.0)).abs() < 1e-6);
    }
}
