//! Integration tests for PlanarRingBuffer
//!
//! Covers cross-thread use: one producer thread and one consumer thread
//! sharing a buffer through an Arc with no other coordination.

use std::sync::Arc;
use std::thread;

use pcmring_ap::PlanarRingBuffer;

const TOTAL_BYTES: usize = 64 * 1024;

fn pattern(i: usize) -> u8 {
    (i * 31 % 251) as u8
}

#[test]
fn test_producer_consumer_threads_preserve_order() {
    let buffer = Arc::new(PlanarRingBuffer::new(1, 97).unwrap());

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            let data: Vec<u8> = (0..TOTAL_BYTES).map(pattern).collect();
            let mut offset = 0;
            while offset < data.len() {
                let length = (data.len() - offset).min(41);
                offset += buffer.write(0, &data, offset, length).unwrap();
                if offset < data.len() {
                    thread::yield_now();
                }
            }
        })
    };

    let consumer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            let mut received = Vec::with_capacity(TOTAL_BYTES);
            let mut chunk = [0u8; 53];
            while received.len() < TOTAL_BYTES {
                let read = buffer.read_slice(0, &mut chunk).unwrap();
                if read == 0 {
                    thread::yield_now();
                    continue;
                }
                received.extend_from_slice(&chunk[..read]);
            }
            received
        })
    };

    producer.join().unwrap();
    let received = consumer.join().unwrap();

    assert_eq!(received.len(), TOTAL_BYTES);
    assert!(received.iter().enumerate().all(|(i, &b)| b == pattern(i)));
    assert_eq!(buffer.available_to_read(), 0);
}

#[test]
fn test_planes_stay_in_lock_step_under_paired_transfers() {
    let buffer = Arc::new(PlanarRingBuffer::new(3, 32).unwrap());

    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for round in 0..200u32 {
                let data = [round as u8; 8];
                for plane in 0..3 {
                    let mut written = 0;
                    while written < data.len() {
                        written += buffer.write(plane, &data, written, data.len() - written).unwrap();
                        thread::yield_now();
                    }
                }
            }
        })
    };

    let mut totals = [0usize; 3];
    let mut out = [0u8; 8];
    while totals.iter().any(|&t| t < 200 * 8) {
        for (plane, total) in totals.iter_mut().enumerate() {
            let read = buffer.read_slice(plane, &mut out).unwrap();
            *total += read;
        }
        thread::yield_now();
    }

    producer.join().unwrap();
    assert!(buffer.is_lock_step());
    assert_eq!(totals, [1600, 1600, 1600]);
}

#[test]
fn test_available_to_read_is_only_a_hint() {
    let buffer = PlanarRingBuffer::new(1, 16).unwrap();
    buffer.write_slice(0, &[1, 2, 3, 4]).unwrap();

    let hint = buffer.available_to_read();
    let mut out = [0u8; 16];
    let read = buffer.read_slice(0, &mut out).unwrap();

    // Single-threaded the hint is exact
    assert_eq!(hint, read);
}
