use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fbblit_common::allocate::allocate_align_64;
use fbblit_cpu::line::{aligned, combine, copy_line};
use safe_allocator_api::RawAlloc;
use std::hint::black_box;

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
use pprof::criterion::{Output, PProfProfiler};

/// One 1080p scanline at 32bpp, plus room for offsets.
const LINE_BYTES: usize = 1920 * 4;

type LineKernel = unsafe fn(*mut u8, *const u8, usize);

fn bench_kernel(
    b: &mut criterion::Bencher,
    kernel: LineKernel,
    input: &RawAlloc,
    output: &mut RawAlloc,
    (src_offset, dst_offset): (usize, usize),
    len: usize,
) {
    b.iter(|| unsafe {
        kernel(
            black_box(output.as_mut_ptr().add(dst_offset)),
            black_box(input.as_ptr().add(src_offset)),
            black_box(len),
        )
    });
}

fn bench_memmove(
    b: &mut criterion::Bencher,
    input: &RawAlloc,
    output: &mut RawAlloc,
    (src_offset, dst_offset): (usize, usize),
    len: usize,
) {
    b.iter(|| unsafe {
        core::ptr::copy(
            black_box(input.as_ptr().add(src_offset)),
            black_box(output.as_mut_ptr().add(dst_offset)),
            black_box(len),
        )
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut input = allocate_align_64(LINE_BYTES + 64).unwrap();
    let mut output = allocate_align_64(LINE_BYTES + 64).unwrap();
    unsafe {
        for x in 0..LINE_BYTES + 64 {
            input.as_mut_ptr().add(x).write(x as u8);
        }
    }

    let cases: [(&str, LineKernel, (usize, usize)); 4] = [
        ("aligned u64", aligned::copy_line, (0, 0)),
        ("aligned u32", aligned::copy_line, (4, 0)),
        ("source aligned", combine::source_aligned, (0, 2)),
        ("destination aligned", combine::destination_aligned, (2, 0)),
    ];

    for len in [16, 128, 1280, LINE_BYTES] {
        let mut group = c.benchmark_group(format!("line copy {len} bytes"));
        group.throughput(Throughput::Bytes(len as u64));

        for (name, kernel, offsets) in cases {
            group.bench_with_input(BenchmarkId::new(name, len), &len, |b, _| {
                bench_kernel(b, kernel, &input, &mut output, offsets, len)
            });
        }

        group.bench_with_input(BenchmarkId::new("copy_line odd", len), &len, |b, _| {
            bench_kernel(b, copy_line, &input, &mut output, (5, 0), len)
        });
        group.bench_with_input(BenchmarkId::new("ptr::copy 2 -> 0", len), &len, |b, _| {
            bench_memmove(b, &input, &mut output, (2, 0), len)
        });

        group.finish();
    }
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
