//! Audio resampling session
//!
//! Converts PCM audio between sample formats, channel counts and sample rates
//! and reframes the result into fixed-size output frames.
//!
//! Rate conversion uses rubato's `FastFixedIn`, which consumes a fixed number
//! of input samples per call. Input that does not fill a whole chunk is
//! carried over to the next `resample()` call. Converted bytes go into a
//! `PlanarRingBuffer` (one plane per output plane) and are drained one output
//! frame at a time, so callers always receive frames of exactly
//! `frame_samples` samples per channel until `flush()`.

use crate::audio::convert::{encode_planes, remix, to_planar_f32};
use crate::audio::ring_buffer::PlanarRingBuffer;
use crate::audio::types::{AudioFormat, AudioFrame};
use crate::error::{Error, Result};
use pcmring_common::config::{ResamplerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_RING_CAPACITY_BYTES};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::{debug, trace, warn};

/// Tunables for a resampling session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResamplerOptions {
    /// Ring buffer capacity per plane in bytes
    pub ring_capacity_bytes: usize,

    /// Input samples per channel fed to the rate converter per call
    pub chunk_size: usize,
}

impl Default for ResamplerOptions {
    fn default() -> Self {
        Self {
            ring_capacity_bytes: DEFAULT_RING_CAPACITY_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl From<&ResamplerConfig> for ResamplerOptions {
    fn from(config: &ResamplerConfig) -> Self {
        Self {
            ring_capacity_bytes: config.ring_capacity_bytes,
            chunk_size: config.chunk_size,
        }
    }
}

/// Converts audio frames from one audio format to another
pub struct AudioResampler {
    src: AudioFormat,
    dst: AudioFormat,

    /// Samples per channel in every full output frame
    frame_samples: usize,

    /// Bytes per plane in one full output frame
    frame_plane_size: usize,

    /// Rate converter, `None` when input and output rates match
    converter: Option<FastFixedIn<f32>>,

    /// Remixed input waiting for a full converter chunk (one vector per output channel)
    pending: Vec<Vec<f32>>,

    /// Converter output still to discard from the head of the stream
    delay_remaining: usize,

    /// Samples per channel fed to the converter since the last flush
    input_total: u64,

    /// Samples per channel kept from the converter since the last flush
    output_total: u64,

    /// Converted bytes waiting for a full output frame
    buffer: PlanarRingBuffer,

    frames_emitted: u64,
}

impl std::fmt::Debug for AudioResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioResampler")
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("frame_samples", &self.frame_samples)
            .field("rate_conversion", &self.converter.is_some())
            .field("pending_samples", &self.pending_samples())
            .field("buffer", &self.buffer)
            .field("frames_emitted", &self.frames_emitted)
            .finish()
    }
}

impl AudioResampler {
    /// Open a resampling session
    ///
    /// Frames passed to `resample()` must be in `src` format; returned frames
    /// are in `dst` format with `frame_samples` samples per channel.
    ///
    /// # Errors
    /// * `InvalidArgument` - invalid formats, `frame_samples == 0`, zero chunk size,
    ///   or a ring buffer too small to hold one output frame
    /// * `Resample` - the rate converter could not be constructed
    pub fn open(
        src: AudioFormat,
        dst: AudioFormat,
        frame_samples: usize,
        options: ResamplerOptions,
    ) -> Result<Self> {
        src.validate()
            .map_err(|e| Error::InvalidArgument(format!("Invalid input audio format: {}", e)))?;
        dst.validate()
            .map_err(|e| Error::InvalidArgument(format!("Invalid output audio format: {}", e)))?;

        if frame_samples == 0 {
            return Err(Error::InvalidArgument(
                "Output frame must hold at least one sample".to_string(),
            ));
        }
        if options.chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "Rate converter chunk size must be greater than 0".to_string(),
            ));
        }

        let frame_plane_size = dst.checked_plane_size(frame_samples).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Output frame of {} samples is too large",
                frame_samples
            ))
        })?;
        if options.ring_capacity_bytes < frame_plane_size {
            return Err(Error::InvalidArgument(format!(
                "Ring buffer capacity {} bytes cannot hold one output frame of {} bytes",
                options.ring_capacity_bytes, frame_plane_size
            )));
        }

        let channels = dst.channels as usize;
        let converter = if src.sample_rate != dst.sample_rate {
            Some(Self::create_converter(
                src.sample_rate,
                dst.sample_rate,
                channels,
                options.chunk_size,
            )?)
        } else {
            None
        };

        let delay_remaining = converter.as_ref().map_or(0, |c| c.output_delay());
        let buffer = PlanarRingBuffer::new(dst.planes(), options.ring_capacity_bytes)?;

        debug!(
            "Opened audio resampler: {} -> {}, frame_samples={}, chunk_size={}, rate_conversion={}, delay={}",
            src,
            dst,
            frame_samples,
            options.chunk_size,
            converter.is_some(),
            delay_remaining
        );

        Ok(Self {
            src,
            dst,
            frame_samples,
            frame_plane_size,
            converter,
            pending: vec![Vec::new(); channels],
            delay_remaining,
            input_total: 0,
            output_total: 0,
            buffer,
            frames_emitted: 0,
        })
    }

    /// Create a rubato resampler
    ///
    /// Uses FastFixedIn for efficiency (good quality/performance tradeoff).
    fn create_converter(
        input_rate: u32,
        output_rate: u32,
        channels: usize,
        chunk_size: usize,
    ) -> Result<FastFixedIn<f32>> {
        FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0, // max_relative_ratio (no runtime changes)
            PolynomialDegree::Septic,
            chunk_size,
            channels,
        )
        .map_err(|e| Error::Resample(format!("Failed to create resampler: {}", e)))
    }

    pub fn input_format(&self) -> AudioFormat {
        self.src
    }

    pub fn output_format(&self) -> AudioFormat {
        self.dst
    }

    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Total full and final frames returned since open
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Output samples per channel waiting in the ring buffer
    pub fn buffered_samples(&self) -> usize {
        self.buffer.available_to_read() / self.dst.plane_stride()
    }

    /// Input samples per channel waiting for a full converter chunk
    pub fn pending_samples(&self) -> usize {
        self.pending.first().map_or(0, Vec::len)
    }

    /// Resample one input frame
    ///
    /// Returns every output frame that could be completed, possibly none.
    /// Leftover samples stay buffered for the next call.
    ///
    /// # Errors
    /// * `InvalidArgument` - the frame is not in the input format
    /// * `Resample` - the rate converter failed
    pub fn resample(&mut self, frame: &AudioFrame) -> Result<Vec<AudioFrame>> {
        if frame.format() != self.src {
            return Err(Error::InvalidArgument(format!(
                "Frame format {} does not match resampler input format {}",
                frame.format(),
                self.src
            )));
        }

        let remixed = remix(to_planar_f32(frame), self.dst.channels as usize);
        let converted = self.convert_rate(remixed)?;

        let mut frames = Vec::new();
        self.push_converted(&converted, &mut frames)?;
        Ok(frames)
    }

    /// Drain everything still held by the session
    ///
    /// Carried input is pushed through the rate converter and the converter
    /// is fed silence until its delayed output is out. All full frames are
    /// returned, followed by one shorter final frame if samples remain.
    /// The session is empty afterwards and can be reused.
    pub fn flush(&mut self) -> Result<Vec<AudioFrame>> {
        let mut frames = Vec::new();

        let channels = self.pending.len();
        let carried = std::mem::replace(&mut self.pending, vec![Vec::new(); channels]);

        let tail = match self.converter.as_mut() {
            Some(converter) => {
                // input_total already counts the carried samples
                let expected =
                    expected_output(self.input_total, self.src.sample_rate, self.dst.sample_rate);
                let has_carried = carried.first().map_or(false, |c| !c.is_empty());
                let mut carried = has_carried.then_some(carried);

                // Each chunk yields chunk * ratio samples on average
                let ratio = self.dst.sample_rate as f64 / self.src.sample_rate as f64;
                let per_call = converter.input_frames_next() as f64 * ratio;
                let outstanding = expected.saturating_sub(self.output_total) as usize
                    + self.delay_remaining;
                let mut calls_left = (outstanding as f64 / per_call).ceil() as usize + 2;

                let mut tail = vec![Vec::new(); channels];
                while self.output_total < expected {
                    if calls_left == 0 {
                        return Err(Error::Resample(format!(
                            "Rate converter stopped {} samples short of the stream end",
                            expected - self.output_total
                        )));
                    }
                    calls_left -= 1;

                    let mut out = match carried.take() {
                        Some(input) => converter.process_partial(Some(&input[..]), None),
                        None => converter.process_partial(None::<&[Vec<f32>]>, None),
                    }
                    .map_err(|e| Error::Resample(format!("Resampling failed: {}", e)))?;

                    trim_delay(&mut out, &mut self.delay_remaining);
                    let keep = out[0].len().min((expected - self.output_total) as usize);
                    for (t, channel) in tail.iter_mut().zip(&out) {
                        t.extend_from_slice(&channel[..keep]);
                    }
                    self.output_total += keep as u64;
                }

                converter.reset();
                self.delay_remaining = converter.output_delay();
                Some(tail)
            }
            None => None,
        };
        self.input_total = 0;
        self.output_total = 0;

        if let Some(tail) = tail {
            self.push_converted(&tail, &mut frames)?;
        }

        self.drain_frames(&mut frames)?;

        let remaining = (0..self.buffer.plane_count())
            .map(|plane| self.buffer.available_in(plane))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .min()
            .unwrap_or(0);
        let remaining = remaining - remaining % self.dst.plane_stride();

        if remaining > 0 {
            let planes = self.read_planes(remaining)?;
            let frame = AudioFrame::from_planes(self.dst, planes)?;
            trace!("Emitting final frame with {} samples", frame.sample_count());
            self.frames_emitted += 1;
            frames.push(frame);
        }

        self.buffer.reset();
        debug!(
            "Flushed audio resampler: {} frames returned, {} total",
            frames.len(),
            self.frames_emitted
        );
        Ok(frames)
    }

    /// Discard all buffered and carried audio
    pub fn reset(&mut self) {
        for channel in self.pending.iter_mut() {
            channel.clear();
        }
        if let Some(converter) = self.converter.as_mut() {
            converter.reset();
            self.delay_remaining = converter.output_delay();
        }
        self.input_total = 0;
        self.output_total = 0;
        self.buffer.reset();
    }

    /// Run remixed input through the rate converter in whole chunks
    fn convert_rate(&mut self, input: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
        let Some(converter) = self.converter.as_mut() else {
            return Ok(input);
        };

        self.input_total += input.first().map_or(0, Vec::len) as u64;
        for (pending, channel) in self.pending.iter_mut().zip(input) {
            pending.extend(channel);
        }

        let mut output = vec![Vec::new(); self.pending.len()];
        loop {
            let needed = converter.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }

            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|c| c.drain(..needed).collect())
                .collect();

            let mut converted = converter
                .process(&chunk, None)
                .map_err(|e| Error::Resample(format!("Resampling failed: {}", e)))?;

            trim_delay(&mut converted, &mut self.delay_remaining);
            self.output_total += converted.first().map_or(0, Vec::len) as u64;
            for (out, channel) in output.iter_mut().zip(converted) {
                out.extend(channel);
            }
        }

        Ok(output)
    }

    /// Encode converted audio and feed it through the ring buffer
    ///
    /// When the buffer saturates, completed frames are drained and the
    /// write resumes where it stopped.
    fn push_converted(&mut self, channels: &[Vec<f32>], frames: &mut Vec<AudioFrame>) -> Result<()> {
        if channels.first().map_or(true, Vec::is_empty) {
            return Ok(());
        }

        let planes = encode_planes(self.dst, channels)?;
        let total = planes[0].len();
        let mut offsets = vec![0usize; planes.len()];

        while offsets.iter().any(|&o| o < total) {
            let mut progressed = false;
            for (plane, data) in planes.iter().enumerate() {
                let offset = offsets[plane];
                let written = self.buffer.write(plane, data, offset, total - offset)?;
                offsets[plane] += written;
                progressed |= written > 0;
            }

            if !self.buffer.is_lock_step() {
                warn!(
                    "Ring buffer planes out of lock-step after write (plane 0 holds {} bytes)",
                    self.buffer.available_to_read()
                );
            }

            let drained = self.drain_frames(frames)?;
            if !progressed && drained == 0 {
                return Err(Error::Resample(format!(
                    "Ring buffer stalled with {} of {} bytes unwritten",
                    total - offsets[0],
                    total
                )));
            }
        }

        Ok(())
    }

    /// Pop every complete output frame from the ring buffer
    fn drain_frames(&mut self, frames: &mut Vec<AudioFrame>) -> Result<usize> {
        let mut drained = 0;

        while self.frame_ready()? {
            let planes = self.read_planes(self.frame_plane_size)?;
            let frame = AudioFrame::from_planes(self.dst, planes)?;
            self.frames_emitted += 1;
            trace!(
                "Emitting frame {} ({} samples, {} bytes per plane)",
                self.frames_emitted,
                frame.sample_count(),
                self.frame_plane_size
            );
            frames.push(frame);
            drained += 1;
        }

        Ok(drained)
    }

    /// True when every plane holds at least one full frame
    fn frame_ready(&self) -> Result<bool> {
        if self.buffer.available_to_read() < self.frame_plane_size {
            return Ok(false);
        }
        for plane in 1..self.buffer.plane_count() {
            if self.buffer.available_in(plane)? < self.frame_plane_size {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn read_planes(&self, size: usize) -> Result<Vec<Vec<u8>>> {
        (0..self.buffer.plane_count())
            .map(|plane| {
                let mut data = vec![0u8; size];
                let read = self.buffer.read_slice(plane, &mut data)?;
                data.truncate(read);
                Ok(data)
            })
            .collect()
    }
}

/// Output samples per channel a stream of `input` samples converts to
fn expected_output(input: u64, input_rate: u32, output_rate: u32) -> u64 {
    let scaled = u128::from(input) * u128::from(output_rate);
    scaled.div_ceil(u128::from(input_rate)) as u64
}

/// Drop up to `remaining` samples from the front of every channel
fn trim_delay(channels: &mut [Vec<f32>], remaining: &mut usize) {
    let skip = channels.first().map_or(0, |c| c.len().min(*remaining));
    if skip == 0 {
        return;
    }
    for channel in channels.iter_mut() {
        channel.drain(..skip);
    }
    *remaining -= skip;
}
