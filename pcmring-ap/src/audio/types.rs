//! Core audio data types
//!
//! Defines sample formats, audio formats, and byte-plane audio frames used
//! throughout the resampling pipeline.
//!
//! **Layout:**
//! - Interleaved formats hold one plane: `[c0, c1, ..., c0, c1, ...]`
//! - Planar formats hold one plane per channel
//! - Multi-byte samples are little-endian

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// PCM sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// unsigned 8 bits
    U8,
    /// signed 16 bits
    S16,
    /// signed 32 bits
    S32,
    /// float
    Flt,
    /// double
    Dbl,
    /// unsigned 8 bits, planar
    U8p,
    /// signed 16 bits, planar
    S16p,
    /// signed 32 bits, planar
    S32p,
    /// float, planar
    Fltp,
    /// double, planar
    Dblp,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 10] = [
        SampleFormat::U8,
        SampleFormat::S16,
        SampleFormat::S32,
        SampleFormat::Flt,
        SampleFormat::Dbl,
        SampleFormat::U8p,
        SampleFormat::S16p,
        SampleFormat::S32p,
        SampleFormat::Fltp,
        SampleFormat::Dblp,
    ];

    /// Size of one sample in bytes
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::U8p => 1,
            SampleFormat::S16 | SampleFormat::S16p => 2,
            SampleFormat::S32 | SampleFormat::S32p => 4,
            SampleFormat::Flt | SampleFormat::Fltp => 4,
            SampleFormat::Dbl | SampleFormat::Dblp => 8,
        }
    }

    pub fn is_planar(self) -> bool {
        matches!(
            self,
            SampleFormat::U8p
                | SampleFormat::S16p
                | SampleFormat::S32p
                | SampleFormat::Fltp
                | SampleFormat::Dblp
        )
    }

    /// Same encoding with interleaved layout
    pub fn packed(self) -> Self {
        match self {
            SampleFormat::U8p => SampleFormat::U8,
            SampleFormat::S16p => SampleFormat::S16,
            SampleFormat::S32p => SampleFormat::S32,
            SampleFormat::Fltp => SampleFormat::Flt,
            SampleFormat::Dblp => SampleFormat::Dbl,
            other => other,
        }
    }

    /// Same encoding with planar layout
    pub fn planar(self) -> Self {
        match self {
            SampleFormat::U8 => SampleFormat::U8p,
            SampleFormat::S16 => SampleFormat::S16p,
            SampleFormat::S32 => SampleFormat::S32p,
            SampleFormat::Flt => SampleFormat::Fltp,
            SampleFormat::Dbl => SampleFormat::Dblp,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::Flt => "flt",
            SampleFormat::Dbl => "dbl",
            SampleFormat::U8p => "u8p",
            SampleFormat::S16p => "s16p",
            SampleFormat::S32p => "s32p",
            SampleFormat::Fltp => "fltp",
            SampleFormat::Dblp => "dblp",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        SampleFormat::ALL
            .into_iter()
            .find(|format| format.name() == lower)
            .ok_or_else(|| Error::UnsupportedFormat(format!("Unknown sample format '{}'", s)))
    }
}

/// Sample format, sample rate and channel count of a PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_format: SampleFormat,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    /// Create a validated audio format
    ///
    /// # Errors
    /// * `InvalidArgument` - zero sample rate or zero channels
    pub fn new(sample_format: SampleFormat, sample_rate: u32, channels: u16) -> Result<Self> {
        let format = Self {
            sample_format,
            sample_rate,
            channels,
        };
        format.validate()?;
        Ok(format)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidArgument(format!(
                "Invalid sample rate 0 in audio format {}",
                self
            )));
        }
        if self.channels == 0 {
            return Err(Error::InvalidArgument(format!(
                "Invalid channel count 0 in audio format {}",
                self
            )));
        }
        Ok(())
    }

    /// Number of byte planes a frame of this format carries
    pub fn planes(&self) -> usize {
        if self.sample_format.is_planar() {
            self.channels as usize
        } else {
            1
        }
    }

    /// Bytes one plane needs for `samples` samples per channel
    ///
    /// Only for sample counts of audio already held in memory; use
    /// `checked_plane_size` for counts that come from the caller.
    pub fn plane_size(&self, samples: usize) -> usize {
        samples * self.plane_stride()
    }

    /// Bytes one plane needs for `samples` samples per channel, `None` on overflow
    pub fn checked_plane_size(&self, samples: usize) -> Option<usize> {
        samples.checked_mul(self.plane_stride())
    }

    /// Bytes one sample frame (all channels) occupies in a single plane
    pub fn plane_stride(&self) -> usize {
        let per_plane_channels = if self.sample_format.is_planar() {
            1
        } else {
            self.channels as usize
        };
        per_plane_channels * self.sample_format.bytes_per_sample()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}Hz {}ch",
            self.sample_format, self.sample_rate, self.channels
        )
    }
}

/// A block of PCM audio held as byte planes
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    format: AudioFormat,
    sample_count: usize,
    planes: Vec<Vec<u8>>,
}

impl AudioFrame {
    /// Create a silent frame holding `sample_count` samples per channel
    pub fn silent(format: AudioFormat, sample_count: usize) -> Self {
        let fill = match format.sample_format.packed() {
            SampleFormat::U8 => 0x80,
            _ => 0,
        };
        let planes = (0..format.planes())
            .map(|_| vec![fill; format.plane_size(sample_count)])
            .collect();

        Self {
            format,
            sample_count,
            planes,
        }
    }

    /// Create a frame from existing byte planes
    ///
    /// # Errors
    /// * `InvalidArgument` - plane count or plane sizes do not match the format
    pub fn from_planes(format: AudioFormat, planes: Vec<Vec<u8>>) -> Result<Self> {
        format.validate()?;
        if planes.len() != format.planes() {
            return Err(Error::InvalidArgument(format!(
                "Audio format {} needs {} planes, got {}",
                format,
                format.planes(),
                planes.len()
            )));
        }

        let stride = format.plane_stride();
        let plane_len = planes[0].len();
        if plane_len % stride != 0 || planes.iter().any(|p| p.len() != plane_len) {
            return Err(Error::InvalidArgument(format!(
                "Plane sizes do not hold whole samples of {}",
                format
            )));
        }

        Ok(Self {
            format,
            sample_count: plane_len / stride,
            planes,
        })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(Vec::as_slice)
    }

    pub fn planes(&self) -> &[Vec<u8>] {
        &self.planes
    }

    pub fn into_planes(self) -> Vec<Vec<u8>> {
        self.planes
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / self.format.sample_rate as f64
    }
}
