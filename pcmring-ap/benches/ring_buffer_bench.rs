//! Ring Buffer Throughput Benchmark
//!
//! Measures planar ring buffer write/read throughput, including transfers
//! that split at the end of storage.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pcmring_ap::PlanarRingBuffer;

fn bench_ring_buffer_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("planar_ring_buffer");
    let frame = vec![0x5Au8; 4096];
    group.throughput(Throughput::Bytes(frame.len() as u64));

    group.bench_function("write_read_aligned", |b| {
        let buffer = PlanarRingBuffer::new(1, 16 * 1024).unwrap();
        let mut out = vec![0u8; 4096];

        b.iter(|| {
            let written = buffer.write_slice(0, black_box(&frame)).unwrap();
            let read = buffer.read_slice(0, &mut out).unwrap();
            black_box((written, read));
        });
    });

    group.bench_function("write_read_wrapping", |b| {
        // 4096-byte transfers against a 10000-byte ring split regularly
        let buffer = PlanarRingBuffer::new(1, 10_000).unwrap();
        let mut out = vec![0u8; 4096];

        b.iter(|| {
            let written = buffer.write_slice(0, black_box(&frame)).unwrap();
            let read = buffer.read_slice(0, &mut out).unwrap();
            black_box((written, read));
        });
    });

    group.bench_function("write_read_8_planes", |b| {
        let buffer = PlanarRingBuffer::new(8, 16 * 1024).unwrap();
        let mut out = vec![0u8; 512];

        b.iter(|| {
            for plane in 0..8 {
                buffer.write(plane, black_box(&frame), 0, 512).unwrap();
            }
            for plane in 0..8 {
                black_box(buffer.read_slice(plane, &mut out).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_ring_buffer_operations);
criterion_main!(benches);
