//! Microbenchmarks for the ring buffer read policies and allpass core.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use vs_dsp::{Delay, StaticAllpass, StaticModAllpass};

const BLOCK: usize = 256;

fn bench_delay_block(c: &mut Criterion) {
    let mut delay = Delay::<4096>::default();
    let input = [0.25f32; BLOCK];
    let mut output = [0.0f32; BLOCK];
    c.bench_function("delay_process_block_256", |b| {
        b.iter(|| {
            delay.process_block(black_box(&input), &mut output);
            black_box(output[BLOCK - 1])
        })
    });
}

fn bench_smooth_reads(c: &mut Criterion) {
    // Park the write head at 3000 so the raw policy's window is valid.
    let mut delay = Delay::<4096>::default();
    for n in 0..(4096 + 3000) {
        delay.write(n as f32 * 1e-4);
    }
    c.bench_function("read_offset_smooth_safe", |b| {
        b.iter(|| black_box(delay.read_offset_smooth_safe(black_box(1234.5))))
    });
    c.bench_function("read_offset_smooth_wrap", |b| {
        b.iter(|| black_box(delay.read_offset_smooth_wrap(black_box(1234.5))))
    });
    c.bench_function("read_offset_smooth_raw", |b| {
        b.iter(|| black_box(delay.read_offset_smooth_raw(black_box(1234.5))))
    });
}

fn bench_allpass(c: &mut Criterion) {
    let mut ap = StaticAllpass::<2048>::default();
    ap.set_gain(0.6);
    let input = [0.25f32; BLOCK];
    let mut output = [0.0f32; BLOCK];
    c.bench_function("allpass_process_block_256", |b| {
        b.iter(|| {
            ap.process_block(black_box(&input), &mut output);
            black_box(output[BLOCK - 1])
        })
    });

    let mut modulated = StaticModAllpass::<2048>::default();
    modulated.set_gain(0.35);
    modulated.set_sample_depth(50.0);
    modulated.set_modulation_rate(0.7 / 48_000.0);
    c.bench_function("mod_allpass_process_block_256", |b| {
        b.iter(|| {
            modulated.process_block(black_box(&input), &mut output);
            black_box(output[BLOCK - 1])
        })
    });
}

criterion_group!(benches, bench_delay_block, bench_smooth_reads, bench_allpass);
criterion_main!(benches);
