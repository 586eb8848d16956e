//! Captured voice clips: RIFF/WAVE parsing and the transient on-disk copy.

use std::path::Path;

use crate::speech::TranscriptionError;

/// A 16-bit PCM clip down-mixed to mono. The original upload bytes are
/// kept so the clip can be written out unchanged.
#[derive(Debug, Clone)]
pub struct WavClip {
    pub sample_rate: u32,
    pub channels: u16,
    samples: Vec<i16>,
    raw: Vec<u8>,
}

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

fn invalid(msg: impl Into<String>) -> TranscriptionError {
    TranscriptionError::InvalidAudio(msg.into())
}

fn u16_le(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn u32_le(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

impl WavClip {
    pub fn parse(bytes: &[u8]) -> Result<Self, TranscriptionError> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("not a RIFF/WAVE file"));
        }

        let mut fmt: Option<(u16, u16, u32, u16)> = None;
        let mut data: Option<&[u8]> = None;
        let mut pos = 12;

        while pos + 8 <= bytes.len() {
            let id = &bytes[pos..pos + 4];
            let size = u32_le(bytes, pos + 4) as usize;
            let body_start = pos + 8;
            let body_end = body_start.saturating_add(size).min(bytes.len());
            let body = &bytes[body_start..body_end];

            match id {
                b"fmt " => {
                    if body.len() < 16 {
                        return Err(invalid("truncated fmt chunk"));
                    }
                    fmt = Some((u16_le(body, 0), u16_le(body, 2), u32_le(body, 4), u16_le(body, 14)));
                }
                b"data" => data = Some(body),
                _ => {}
            }

            // chunks are word aligned
            pos = body_start.saturating_add(size).saturating_add(size & 1);
        }

        let (format, channels, sample_rate, bits) = fmt.ok_or_else(|| invalid("missing fmt chunk"))?;
        let data = data.ok_or_else(|| invalid("missing data chunk"))?;

        if format != WAVE_FORMAT_PCM && format != WAVE_FORMAT_EXTENSIBLE {
            return Err(invalid(format!("unsupported WAVE format tag {format:#06x}")));
        }
        if bits != 16 {
            return Err(invalid(format!("unsupported sample width: {bits} bits")));
        }
        if channels == 0 || sample_rate == 0 {
            return Err(invalid("zero channels or sample rate"));
        }

        let frame = 2 * channels as usize;
        let samples = data
            .chunks_exact(frame)
            .map(|f| {
                let sum: i32 = f.chunks_exact(2).map(|s| i16::from_le_bytes([s[0], s[1]]) as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect();

        Ok(Self { sample_rate, channels, samples, raw: bytes.to_vec() })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Mono samples as big-endian linear PCM (`audio/l16`).
    pub fn to_l16_be(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    /// Write the clip as uploaded to `path`, replacing any previous clip.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<(), TranscriptionError> {
        tokio::fs::write(path, &self.raw).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PCM WAV file for tests.
    pub(crate) fn wav_bytes(channels: u16, sample_rate: u32, bits: u16, samples: &[i16]) -> Vec<u8> {
        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let block_align = channels * bits / 8;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    #[test]
    fn test_parse_mono() {
        let clip = WavClip::parse(&wav_bytes(1, 16_000, 16, &[1, -2, 300])).unwrap();
        assert_eq!(clip.sample_rate, 16_000);
        assert_eq!(clip.samples(), &[1, -2, 300]);
        assert_eq!(clip.to_l16_be(), vec![0x00, 0x01, 0xFF, 0xFE, 0x01, 0x2C]);
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let clip = WavClip::parse(&wav_bytes(2, 44_100, 16, &[100, 300, -50, -150])).unwrap();
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.samples(), &[200, -100]);
        assert!((clip.duration_secs() - 2.0 / 44_100.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_wave_and_8_bit() {
        assert!(matches!(WavClip::parse(b"OggS\0\0\0\0\0\0\0\0"), Err(TranscriptionError::InvalidAudio(_))));
        let err = WavClip::parse(&wav_bytes(1, 8_000, 8, &[])).unwrap_err();
        assert!(err.to_string().contains("8 bits"));
    }

    #[tokio::test]
    async fn test_persist_writes_original_bytes() {
        let bytes = wav_bytes(1, 16_000, 16, &[5, 6, 7]);
        let clip = WavClip::parse(&bytes).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio_query.wav");

        clip.persist(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
