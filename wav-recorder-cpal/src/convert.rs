//! Sample conversion from the device's float stream to mono little-endian PCM.

use wav_recorder_core::RecorderError;

/// Integer PCM layout written to the WAV data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEncoding {
    /// 8-bit unsigned, offset 128.
    U8,
    I16,
    /// 24-bit signed, packed into three bytes.
    I24,
    I32,
}

impl PcmEncoding {
    pub fn for_bit_depth(bit_depth: u16) -> Result<Self, RecorderError> {
        match bit_depth {
            8 => Ok(Self::U8),
            16 => Ok(Self::I16),
            24 => Ok(Self::I24),
            32 => Ok(Self::I32),
            other => Err(RecorderError::ConfigurationFailed(format!(
                "unsupported bit depth: {}",
                other
            ))),
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 => 2,
            Self::I24 => 3,
            Self::I32 => 4,
        }
    }

    /// Convert float samples in [-1.0, 1.0] to PCM bytes. Out-of-range
    /// samples are clamped.
    pub fn encode(&self, samples: &[f32]) -> Vec<u8> {
        let mut pcm = Vec::with_capacity(samples.len() * self.bytes_per_sample());
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            match self {
                Self::U8 => pcm.push(((clamped * 127.0) as i16 + 128) as u8),
                Self::I16 => pcm.extend_from_slice(&((clamped * i16::MAX as f32) as i16).to_le_bytes()),
                Self::I24 => {
                    let value = (clamped * 8_388_607.0) as i32;
                    pcm.extend_from_slice(&value.to_le_bytes()[..3]);
                }
                Self::I32 => {
                    let value = (clamped as f64 * i32::MAX as f64) as i32;
                    pcm.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        pcm
    }
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in samples.chunks_exact(channels) {
        mono.push(frame.iter().sum::<f32>() * scale);
    }
    mono
}

/// Resample mono audio by linear interpolation between neighbouring samples.
///
/// Used when the device cannot run at the requested rate. The output holds
/// `len * target_rate / source_rate` samples; positions past the last input
/// sample hold its value.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || source_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let output_len = (samples.len() as u64 * target_rate as u64 / source_rate as u64) as usize;
    let step = source_rate as f64 / target_rate as f64;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let position = i as f64 * step;
            let index = (position as usize).min(last);
            let fraction = (position - index as f64).min(1.0) as f32;
            let current = samples[index];
            let next = samples[(index + 1).min(last)];
            current + (next - current) * fraction
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_for_supported_depths() {
        assert_eq!(PcmEncoding::for_bit_depth(16).unwrap(), PcmEncoding::I16);
        assert_eq!(PcmEncoding::for_bit_depth(24).unwrap().bytes_per_sample(), 3);
        assert!(matches!(
            PcmEncoding::for_bit_depth(12),
            Err(RecorderError::ConfigurationFailed(_))
        ));
    }

    #[test]
    fn encode_int16() {
        let pcm = PcmEncoding::I16.encode(&[0.0, 1.0, -1.0]);
        assert_eq!(pcm.len(), 6);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 0);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), i16::MAX);
        // -1.0 → -32767 (not -32768 due to clamping math)
        assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), -i16::MAX);
    }

    #[test]
    fn encode_clamps_out_of_range() {
        let pcm = PcmEncoding::I16.encode(&[2.0, -3.5]);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -i16::MAX);
    }

    #[test]
    fn encode_unsigned_8bit_is_offset() {
        assert_eq!(PcmEncoding::U8.encode(&[0.0, 1.0, -1.0]), vec![128, 255, 1]);
    }

    #[test]
    fn encode_packed_24bit() {
        let pcm = PcmEncoding::I24.encode(&[1.0, -1.0]);
        assert_eq!(pcm, vec![0xFF, 0xFF, 0x7F, 0x01, 0x00, 0x80]);
    }

    #[test]
    fn encode_int32() {
        let pcm = PcmEncoding::I32.encode(&[1.0]);
        assert_eq!(i32::from_le_bytes([pcm[0], pcm[1], pcm[2], pcm[3]]), i32::MAX);
    }

    #[test]
    fn downmix_stereo_to_mono() {
        let mono = downmix_to_mono(&[0.2, 0.8, 0.4, 0.6], 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn resample_same_rate_is_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_downsample_3x() {
        let samples: Vec<f32> = (0..48).map(|i| i as f32).collect();
        let out = resample(&samples, 48000, 16000);
        assert_eq!(out.len(), 16);
        assert!((out[1] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn resample_upsample_interpolates_and_holds_last() {
        let out = resample(&[0.0, 1.0], 8000, 16000);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn resample_to_zero_rate_is_empty() {
        assert!(resample(&[0.1, 0.2], 16000, 0).is_empty());
    }
}
