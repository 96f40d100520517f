//! Sample format and channel conversion
//!
//! All conversion goes through planar `f32`: frames are decoded into one
//! `Vec<f32>` per channel, remixed, and encoded back into byte planes.
//! Integer formats map to `[-1.0, 1.0]`; `u8` is offset binary around 128.

use crate::audio::types::{AudioFormat, AudioFrame, SampleFormat};
use crate::error::{Error, Result};

const S16_SCALE: f32 = 32768.0;
const S32_SCALE: f64 = 2_147_483_648.0;
const U8_SCALE: f32 = 128.0;

fn decode_sample(format: SampleFormat, bytes: &[u8]) -> f32 {
    match format.packed() {
        SampleFormat::U8 => (bytes[0] as f32 - U8_SCALE) / U8_SCALE,
        SampleFormat::S16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / S16_SCALE,
        SampleFormat::S32 => {
            let v = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            (v as f64 / S32_SCALE) as f32
        }
        SampleFormat::Flt => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            f64::from_le_bytes(raw) as f32
        }
    }
}

fn encode_sample(format: SampleFormat, value: f32, out: &mut Vec<u8>) {
    match format.packed() {
        SampleFormat::U8 => {
            let v = (value.clamp(-1.0, 1.0) * U8_SCALE).round() + U8_SCALE;
            out.push(v.clamp(0.0, 255.0) as u8);
        }
        SampleFormat::S16 => {
            let v = (value.clamp(-1.0, 1.0) * S16_SCALE).round();
            out.extend_from_slice(&(v.clamp(-32768.0, 32767.0) as i16).to_le_bytes());
        }
        SampleFormat::S32 => {
            let v = (value.clamp(-1.0, 1.0) as f64 * S32_SCALE).round();
            out.extend_from_slice(&(v.clamp(-S32_SCALE, S32_SCALE - 1.0) as i32).to_le_bytes());
        }
        SampleFormat::Flt => out.extend_from_slice(&value.to_le_bytes()),
        _ => out.extend_from_slice(&(value as f64).to_le_bytes()),
    }
}

/// Decode a frame into planar `f32`, one vector per channel
pub fn to_planar_f32(frame: &AudioFrame) -> Vec<Vec<f32>> {
    let format = frame.format();
    let channels = format.channels as usize;
    let bps = format.sample_format.bytes_per_sample();
    let samples = frame.sample_count();

    if format.sample_format.is_planar() {
        frame
            .planes()
            .iter()
            .map(|plane| {
                plane
                    .chunks_exact(bps)
                    .take(samples)
                    .map(|b| decode_sample(format.sample_format, b))
                    .collect()
            })
            .collect()
    } else {
        let mut out = vec![Vec::with_capacity(samples); channels];
        for (i, bytes) in frame.planes()[0].chunks_exact(bps).take(samples * channels).enumerate() {
            out[i % channels].push(decode_sample(format.sample_format, bytes));
        }
        out
    }
}

/// Encode planar `f32` into byte planes laid out for `format`
///
/// # Errors
/// * `InvalidArgument` - channel count differs from the format or channels differ in length
pub fn encode_planes(format: AudioFormat, channels: &[Vec<f32>]) -> Result<Vec<Vec<u8>>> {
    if channels.len() != format.channels as usize {
        return Err(Error::InvalidArgument(format!(
            "Expected {} channels for {}, got {}",
            format.channels,
            format,
            channels.len()
        )));
    }
    let samples = channels[0].len();
    if channels.iter().any(|c| c.len() != samples) {
        return Err(Error::InvalidArgument(
            "Channels must hold the same number of samples".to_string(),
        ));
    }

    let sample_format = format.sample_format;
    if sample_format.is_planar() {
        Ok(channels
            .iter()
            .map(|channel| {
                let mut plane = Vec::with_capacity(format.plane_size(samples));
                for &value in channel {
                    encode_sample(sample_format, value, &mut plane);
                }
                plane
            })
            .collect())
    } else {
        let mut plane = Vec::with_capacity(format.plane_size(samples));
        for i in 0..samples {
            for channel in channels {
                encode_sample(sample_format, channel[i], &mut plane);
            }
        }
        Ok(vec![plane])
    }
}

/// Encode planar `f32` into a frame of `format`
pub fn from_planar_f32(format: AudioFormat, channels: &[Vec<f32>]) -> Result<AudioFrame> {
    AudioFrame::from_planes(format, encode_planes(format, channels)?)
}

/// Build a frame from interleaved `f32` samples
pub fn from_interleaved_f32(format: AudioFormat, samples: &[f32]) -> Result<AudioFrame> {
    from_planar_f32(format, &deinterleave(samples, format.channels))
}

/// Change the channel count of planar audio
///
/// - same count: unchanged
/// - to mono: average of all source channels
/// - from mono: source replicated into every channel
/// - otherwise: channel `c` copied from source `c`, silence where the source has none
pub fn remix(channels: Vec<Vec<f32>>, target: usize) -> Vec<Vec<f32>> {
    let source = channels.len();
    if source == target || source == 0 {
        return channels;
    }

    let samples = channels[0].len();

    if target == 1 {
        let scale = 1.0 / source as f32;
        let mixed = (0..samples)
            .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
            .collect();
        return vec![mixed];
    }

    if source == 1 {
        return vec![channels[0].clone(); target];
    }

    (0..target)
        .map(|c| channels.get(c).cloned().unwrap_or_else(|| vec![0.0; samples]))
        .collect()
}

/// De-interleave samples into one vector per channel
pub fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let channels = channels.max(1) as usize;
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (c, &s) in frame.iter().enumerate() {
            planar[c].push(s);
        }
    }

    planar
}

/// Interleave planar samples
pub fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    if planar.is_empty() {
        return Vec::new();
    }

    let frames = planar[0].len();
    let mut out = Vec::with_capacity(frames * planar.len());

    for i in 0..frames {
        for channel in planar {
            out.push(channel[i]);
        }
    }

    out
}
