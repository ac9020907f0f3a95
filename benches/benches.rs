use std::time::Duration;

use baseline_jpeg::EnabledFeatures;
use criterion::{criterion_group, criterion_main, Criterion};

#[path = "../tests/common/mod.rs"]
mod common;

use common::{encode_jpeg, make_plane, ComponentSpec};

/// 4:2:0 color image with enough texture to exercise every AC category
fn color_420_image(width: u32, height: u32) -> Vec<u8> {
    let y = make_plane(width, height, |x, y| ((x * x * 7 + y * 13 + x * y) % 256) as u8);
    let cb = make_plane(width / 2, height / 2, |x, _| (64 + x % 128) as u8);
    let cr = make_plane(width / 2, height / 2, |_, y| (192 - y % 128) as u8);

    encode_jpeg(
        width,
        height,
        &[
            ComponentSpec::new(2, 2, 2, y),
            ComponentSpec::new(1, 1, 4, cb),
            ComponentSpec::new(1, 1, 4, cr),
        ],
    )
}

fn gray_image(width: u32, height: u32) -> Vec<u8> {
    encode_jpeg(
        width,
        height,
        &[ComponentSpec::new(
            1,
            1,
            1,
            make_plane(width, height, |x, y| ((x * 3 + y * 5) % 256) as u8),
        )],
    )
}

fn end_to_end_benches(c: &mut Criterion) {
    let color = color_420_image(512, 512);
    let gray = gray_image(512, 512);
    let features = EnabledFeatures::default();

    c.bench_function("decode 420 color", |b| {
        b.iter(|| baseline_jpeg::decode_jpeg(&color, &features))
    });

    c.bench_function("decode grayscale", |b| {
        b.iter(|| baseline_jpeg::decode_jpeg(&gray, &features))
    });

    c.bench_function("decode and write pnm", |b| {
        b.iter(|| {
            let mut output = Vec::with_capacity(512 * 512 * 3 + 20);
            baseline_jpeg::convert_jpeg_to_pnm(&color, &mut output, &features)
        })
    });
}

criterion_group! {
   name = group1;
   config = Criterion::default().warm_up_time(Duration::from_secs(5));
   targets = end_to_end_benches
}

criterion_main!(group1);
