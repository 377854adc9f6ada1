use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fbblit_common::allocate::allocate_align_64;
use fbblit_cpu::rect::{overlapped_blit_uncached, standard_blit};
use fbblit_cpu::twopass::{allocate_staging, uncached_memmove};
use std::hint::black_box;

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
use pprof::criterion::{Output, PProfProfiler};

const WIDTH: usize = 1920;
const HEIGHT: usize = 1080;
const STRIDE: usize = WIDTH * 4;

fn criterion_benchmark(c: &mut Criterion) {
    // Ordinary memory standing in for the framebuffer; padded for the fetch over-read.
    let mut surface = allocate_align_64(STRIDE * HEIGHT + 128).unwrap();
    let base = surface.as_mut_ptr();
    unsafe {
        for x in 0..STRIDE * HEIGHT {
            base.add(x).write(x as u8);
        }
    }
    let mut staging = allocate_staging().unwrap();

    let mut group = c.benchmark_group("uncached memmove");
    for size in [256usize, 2048, 2051, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("forward", size), &size, |b, &size| {
            b.iter(|| unsafe {
                uncached_memmove(black_box(base), black_box(base.add(5)), size, &mut staging)
            })
        });
        group.bench_with_input(BenchmarkId::new("backward", size), &size, |b, &size| {
            b.iter(|| unsafe {
                uncached_memmove(black_box(base.add(5)), black_box(base), size, &mut staging)
            })
        });
    }
    group.finish();

    // Scroll a 32bpp 1080p surface up by 16 rows, as a terminal would.
    let width_bytes = STRIDE;
    let height = HEIGHT - 16;
    let mut group = c.benchmark_group("scroll 1080p 32bpp");
    group.throughput(Throughput::Bytes((width_bytes * height) as u64));
    group.bench_function("overlapped_blit_uncached", |b| {
        b.iter(|| unsafe {
            overlapped_blit_uncached(
                width_bytes,
                height,
                black_box(base),
                STRIDE,
                black_box(base.add(16 * STRIDE)),
                STRIDE,
                &mut staging,
            )
        })
    });
    group.bench_function("standard_blit", |b| {
        b.iter(|| unsafe {
            standard_blit(
                width_bytes,
                height,
                black_box(base),
                STRIDE,
                black_box(base.add(16 * STRIDE)),
                STRIDE,
            )
        })
    });
    group.finish();
}

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}

#[cfg(not(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
)))]
criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
