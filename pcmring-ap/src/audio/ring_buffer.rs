//! Multi-Plane Ring Buffer for Resampled Audio
//!
//! Accumulates resampled audio bytes per plane until a full output frame's
//! worth of samples exists. Planar audio uses one plane per channel;
//! interleaved audio uses a single plane.
//!
//! ## Design
//!
//! ```text
//! rate converter output (variable size) → write(plane, ..)
//!                                              ↓
//!                                      PlanarRingBuffer
//!                                      - one fixed-capacity byte ring per plane
//!                                      - never overwrites unread bytes
//!                                              ↓
//!                               read(plane, ..) one frame at a time
//! ```
//!
//! ## Thread Safety
//!
//! One `Mutex` guards all planes. Every `write`, `read` and `reset` holds it
//! for the whole call, so a producer thread and a consumer thread can share
//! the buffer through an `Arc` without further coordination.
//!
//! `available_to_read()` does not take the lock. It reads an atomic mirror of
//! plane 0's unread count (Relaxed: advisory only) and may be stale as soon as
//! it returns. Only the return value of `read` is authoritative.
//!
//! Planes are assumed to be kept in lock-step by the caller (equal lengths
//! written and read per logical sample). Nothing here enforces it;
//! `is_lock_step()` lets callers check.

use crate::error::{Error, Result};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Default capacity per plane in bytes
pub const DEFAULT_CAPACITY: usize = 1024;

/// Smallest capacity a plane may have
pub const MIN_CAPACITY: usize = 2;

/// One plane's storage and cursors
///
/// `unread + free == storage.len()` and both cursors stay below
/// `storage.len()`.
struct Plane {
    storage: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
    unread: usize,
    free: usize,
}

impl Plane {
    fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
            unread: 0,
            free: capacity,
        }
    }

    fn reset(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.unread = 0;
        self.free = self.storage.len();
    }

    /// Copy as much of `data` as fits, splitting at the end of storage
    fn write(&mut self, data: &[u8]) -> usize {
        let length = data.len().min(self.free);
        if length == 0 {
            return 0;
        }

        let capacity = self.storage.len();
        let tail = capacity - self.write_pos;

        if tail > length {
            self.storage[self.write_pos..self.write_pos + length].copy_from_slice(&data[..length]);
            self.write_pos += length;
        } else {
            let (first, second) = data[..length].split_at(tail);
            self.storage[self.write_pos..].copy_from_slice(first);
            self.storage[..second.len()].copy_from_slice(second);
            self.write_pos = second.len();
        }

        self.unread += length;
        self.free -= length;
        debug_assert_eq!(self.unread + self.free, capacity);
        length
    }

    /// Copy as many unread bytes as fit into `dest`, splitting at the end of storage
    fn read(&mut self, dest: &mut [u8]) -> usize {
        let length = dest.len().min(self.unread);
        if length == 0 {
            return 0;
        }

        let capacity = self.storage.len();
        let tail = capacity - self.read_pos;

        if tail > length {
            dest[..length].copy_from_slice(&self.storage[self.read_pos..self.read_pos + length]);
            self.read_pos += length;
        } else {
            let (first, second) = dest[..length].split_at_mut(tail);
            first.copy_from_slice(&self.storage[self.read_pos..]);
            second.copy_from_slice(&self.storage[..second.len()]);
            self.read_pos = second.len();
        }

        self.unread -= length;
        self.free += length;
        debug_assert_eq!(self.unread + self.free, capacity);
        length
    }
}

/// Fixed-capacity circular byte buffer replicated per audio plane
pub struct PlanarRingBuffer {
    /// All planes behind a single lock
    planes: Mutex<Vec<Plane>>,

    /// Number of planes (fixed at construction)
    plane_count: usize,

    /// Capacity of every plane in bytes (fixed at construction)
    capacity: usize,

    /// Mirror of plane 0's unread count, updated under the lock
    /// Ordering: Relaxed (advisory value only)
    plane0_unread: AtomicUsize,
}

impl std::fmt::Debug for PlanarRingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanarRingBuffer")
            .field("plane_count", &self.plane_count)
            .field("capacity", &self.capacity)
            .field("available_to_read", &self.available_to_read())
            .finish()
    }
}

impl PlanarRingBuffer {
    /// Create a ring buffer with `plane_count` planes of `capacity` bytes each
    ///
    /// # Errors
    /// * `InvalidArgument` - `capacity < 2` or `plane_count == 0`
    pub fn new(plane_count: usize, capacity: usize) -> Result<Self> {
        if capacity < MIN_CAPACITY {
            return Err(Error::InvalidArgument(format!(
                "Buffer should have at least the capacity of {} bytes, got {}",
                MIN_CAPACITY, capacity
            )));
        }
        if plane_count == 0 {
            return Err(Error::InvalidArgument(
                "Buffer should have at least one plane".to_string(),
            ));
        }

        debug!(
            "Creating planar ring buffer: planes={}, capacity={} bytes per plane",
            plane_count, capacity
        );

        let planes = (0..plane_count).map(|_| Plane::new(capacity)).collect();

        Ok(Self {
            planes: Mutex::new(planes),
            plane_count,
            capacity,
            plane0_unread: AtomicUsize::new(0),
        })
    }

    /// Create a ring buffer with the default capacity of 1024 bytes per plane
    pub fn with_default_capacity(plane_count: usize) -> Result<Self> {
        Self::new(plane_count, DEFAULT_CAPACITY)
    }

    /// Number of planes
    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    /// Capacity of each plane in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rewind every plane to empty
    ///
    /// Storage is retained and not cleared; stale bytes are unreachable.
    pub fn reset(&self) {
        let mut planes = self.lock();
        for plane in planes.iter_mut() {
            plane.reset();
        }
        self.plane0_unread.store(0, Ordering::Relaxed);
        trace!("Planar ring buffer reset");
    }

    /// Unread bytes in plane 0
    ///
    /// Advisory only: another thread may fill or drain the buffer right after
    /// this returns. Planes other than 0 are not consulted.
    pub fn available_to_read(&self) -> usize {
        self.plane0_unread.load(Ordering::Relaxed)
    }

    /// Unread bytes in a specific plane
    pub fn available_in(&self, plane: usize) -> Result<usize> {
        self.check_plane(plane)?;
        Ok(self.lock()[plane].unread)
    }

    /// Free bytes in a specific plane
    pub fn free_in(&self, plane: usize) -> Result<usize> {
        self.check_plane(plane)?;
        Ok(self.lock()[plane].free)
    }

    /// True when every plane holds the same number of unread bytes
    pub fn is_lock_step(&self) -> bool {
        let planes = self.lock();
        let first = planes[0].unread;
        planes.iter().all(|p| p.unread == first)
    }

    /// Write as much of `data[offset..offset + length]` as fits into `plane`
    ///
    /// Returns the number of bytes actually written: 0 when the plane is
    /// full, fewer than `length` when free space runs out. Bytes that do not
    /// fit are not retried.
    ///
    /// # Errors
    /// * `IndexOutOfRange` - the window lies outside `data`
    /// * `PlaneOutOfRange` - `plane >= plane_count()`
    pub fn write(&self, plane: usize, data: &[u8], offset: usize, length: usize) -> Result<usize> {
        let window = checked_window(data.len(), offset, length)?;
        self.check_plane(plane)?;

        let mut planes = self.lock();
        let written = planes[plane].write(&data[window]);
        if plane == 0 {
            self.plane0_unread.store(planes[0].unread, Ordering::Relaxed);
        }
        Ok(written)
    }

    /// Write as much of `data` as fits into `plane`
    pub fn write_slice(&self, plane: usize, data: &[u8]) -> Result<usize> {
        self.write(plane, data, 0, data.len())
    }

    /// Read up to `length` unread bytes of `plane` into `dest[offset..]`
    ///
    /// Returns the number of bytes actually read, 0 when the plane is empty.
    ///
    /// # Errors
    /// * `IndexOutOfRange` - the window lies outside `dest`
    /// * `PlaneOutOfRange` - `plane >= plane_count()`
    pub fn read(&self, plane: usize, dest: &mut [u8], offset: usize, length: usize) -> Result<usize> {
        let window = checked_window(dest.len(), offset, length)?;
        self.check_plane(plane)?;

        let mut planes = self.lock();
        let read = planes[plane].read(&mut dest[window]);
        if plane == 0 {
            self.plane0_unread.store(planes[0].unread, Ordering::Relaxed);
        }
        Ok(read)
    }

    /// Read up to `dest.len()` unread bytes of `plane` into `dest`
    pub fn read_slice(&self, plane: usize, dest: &mut [u8]) -> Result<usize> {
        let len = dest.len();
        self.read(plane, dest, 0, len)
    }

    fn check_plane(&self, plane: usize) -> Result<()> {
        if plane < self.plane_count {
            Ok(())
        } else {
            Err(Error::PlaneOutOfRange {
                plane,
                planes: self.plane_count,
            })
        }
    }

    // Plane state is consistent between calls, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, Vec<Plane>> {
        self.planes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn checked_window(len: usize, offset: usize, length: usize) -> Result<Range<usize>> {
    match offset.checked_add(length) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(Error::IndexOutOfRange {
            offset,
            length,
            len,
        }),
    }
}
