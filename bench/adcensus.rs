use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adcensus_disparity::prelude::*;
use image::{Rgb, RgbImage};
use imageproc::noise::gaussian_noise;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;
const SHIFT: u32 = 12;

/// Blocky colour texture, blocks are wide enough for the cross arms to grow.
fn texture(x: u32, y: u32) -> Rgb<u8> {
    let (bx, by) = (x / 6, y / 5);
    let mut h = bx.wrapping_mul(374_761_393) ^ by.wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    Rgb([h as u8, (h >> 8) as u8, (h >> 16) as u8])
}

fn adcensus_bench(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();

    // Build a noisy synthetic pair
    let left = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| texture(x, y));
    let right = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| texture(x + SHIFT, y));
    let frame = StereoFrame {
        left: gaussian_noise(&left, 0.0, 3.0, 1),
        right: gaussian_noise(&right, 0.0, 3.0, 2)
    };

    // Build disparity alg
    let mut disp = AdCensus::with_size(
        WIDTH as usize,
        HEIGHT as usize,
        Params::with_disparity(0, 32)
    ).unwrap();

    let mut out = vec![INVALID_DISPARITY; (WIDTH * HEIGHT) as usize];

    // Benchmark the matcher alone and through the generic interface
    c.bench_function("adcensus synthetic_160x120", |b| b.iter(|| {
        disp.match_images(
            black_box(frame.left.as_raw()),
            black_box(frame.right.as_raw()),
            &mut out
        )
    }));
    c.bench_function("adcensus compute synthetic_160x120", |b| b.iter(|| disp.compute(&frame)));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = adcensus_bench
}
criterion_main!(benches);
