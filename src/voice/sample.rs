use anyhow::{bail, Context, Result};
use std::io::Cursor;

/// Accumulates microphone PCM for a voice-clone sample
///
/// Frames are 16-bit interleaved PCM; the finished sample is a WAV file in
/// memory, ready for upload.
#[derive(Debug, Clone)]
pub struct VoiceSampleRecorder {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
}

impl VoiceSampleRecorder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: &[i16]) {
        self.samples.extend_from_slice(frame);
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encode everything captured so far as a 16-bit PCM WAV file
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        if self.samples.is_empty() {
            bail!("no audio captured");
        }

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write WAV sample")?;
            }
            writer.finalize().context("Failed to finalize WAV")?;
        }

        Ok(cursor.into_inner())
    }
}
