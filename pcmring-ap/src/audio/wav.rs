//! WAV file input and output using hound
//!
//! Input WAV data is split into interleaved frames of a fixed size. Output
//! frames of any layout are interleaved on write; `dbl` has no WAV mapping.

use crate::audio::types::{AudioFormat, AudioFrame, SampleFormat};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Map a WAV spec onto an interleaved audio format
///
/// 24-bit integer input is widened to `s32`.
pub fn format_for_spec(spec: &hound::WavSpec) -> Result<AudioFormat> {
    let sample_format = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 8) => SampleFormat::U8,
        (hound::SampleFormat::Int, 16) => SampleFormat::S16,
        (hound::SampleFormat::Int, 24) | (hound::SampleFormat::Int, 32) => SampleFormat::S32,
        (hound::SampleFormat::Float, 32) => SampleFormat::Flt,
        (kind, bits) => {
            return Err(Error::UnsupportedFormat(format!(
                "{:?} WAV with {} bits per sample",
                kind, bits
            )))
        }
    };
    AudioFormat::new(sample_format, spec.sample_rate, spec.channels)
}

/// Map an audio format onto the WAV spec used to write it
pub fn spec_for_format(format: &AudioFormat) -> Result<hound::WavSpec> {
    let (sample_format, bits_per_sample) = match format.sample_format.packed() {
        SampleFormat::U8 => (hound::SampleFormat::Int, 8),
        SampleFormat::S16 => (hound::SampleFormat::Int, 16),
        SampleFormat::S32 => (hound::SampleFormat::Int, 32),
        SampleFormat::Flt => (hound::SampleFormat::Float, 32),
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "Sample format {} cannot be written to WAV",
                other
            )))
        }
    };
    Ok(hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample,
        sample_format,
    })
}

/// Read a whole WAV file as frames of `frame_samples` samples per channel
///
/// The last frame may be shorter.
pub fn read_wav(path: &Path, frame_samples: usize) -> Result<(AudioFormat, Vec<AudioFrame>)> {
    if frame_samples == 0 {
        return Err(Error::InvalidArgument(
            "Input frame must hold at least one sample".to_string(),
        ));
    }

    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let format = format_for_spec(&spec)?;

    debug!(
        "Reading WAV {}: {} ({} samples per channel)",
        path.display(),
        format,
        reader.duration()
    );

    let mut bytes = Vec::with_capacity(format.plane_size(reader.duration() as usize));
    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => {
            for sample in reader.samples::<f32>() {
                bytes.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        (_, 8) => {
            // hound yields 8-bit samples as signed values
            for sample in reader.samples::<i32>() {
                bytes.push((sample? + 128) as u8);
            }
        }
        (_, 16) => {
            for sample in reader.samples::<i32>() {
                bytes.extend_from_slice(&(sample? as i16).to_le_bytes());
            }
        }
        (_, bits) => {
            let shift = 32 - u32::from(bits);
            for sample in reader.samples::<i32>() {
                bytes.extend_from_slice(&(sample? << shift).to_le_bytes());
            }
        }
    }

    let chunk = format.checked_plane_size(frame_samples).ok_or_else(|| {
        Error::InvalidArgument(format!("Input frame of {} samples is too large", frame_samples))
    })?;
    let frames = bytes
        .chunks(chunk)
        .map(|c| AudioFrame::from_planes(format, vec![c.to_vec()]))
        .collect::<Result<Vec<_>>>()?;

    Ok((format, frames))
}

/// Streams audio frames into a WAV file
pub struct WavSink {
    writer: hound::WavWriter<BufWriter<File>>,
    format: AudioFormat,
    samples_written: u64,
}

impl WavSink {
    /// Create the output file for frames of `format`
    pub fn create(path: &Path, format: AudioFormat) -> Result<Self> {
        let spec = spec_for_format(&format)?;
        let writer = hound::WavWriter::create(path, spec)?;
        debug!("Writing WAV {}: {}", path.display(), format);
        Ok(Self {
            writer,
            format,
            samples_written: 0,
        })
    }

    /// Samples per channel written so far
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.format() != self.format {
            return Err(Error::InvalidArgument(format!(
                "Frame format {} does not match WAV output format {}",
                frame.format(),
                self.format
            )));
        }

        let sample_format = self.format.sample_format;
        let bps = sample_format.bytes_per_sample();
        let planes = frame.planes();

        for i in 0..frame.sample_count() {
            for c in 0..self.format.channels as usize {
                // Byte offset of channel c of sample i
                let (plane, start) = if sample_format.is_planar() {
                    (&planes[c], i * bps)
                } else {
                    (&planes[0], (i * self.format.channels as usize + c) * bps)
                };
                self.write_sample(&plane[start..start + bps])?;
            }
        }

        self.samples_written += frame.sample_count() as u64;
        Ok(())
    }

    fn write_sample(&mut self, b: &[u8]) -> Result<()> {
        match self.format.sample_format.packed() {
            SampleFormat::U8 => self.writer.write_sample((i16::from(b[0]) - 128) as i8)?,
            SampleFormat::S16 => self.writer.write_sample(i16::from_le_bytes([b[0], b[1]]))?,
            SampleFormat::S32 => self
                .writer
                .write_sample(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))?,
            _ => self
                .writer
                .write_sample(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))?,
        }
        Ok(())
    }

    /// Write the WAV header and close the file
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
