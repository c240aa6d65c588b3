use criterion::{black_box, criterion_group, criterion_main, Criterion};
use harris_corners_core::{
    corner_response, smooth_tensor, suppress_non_maxima, CornerMeasure, GaussianKernel,
    HarrisDetector, HarrisParams, ImageView, PixelFormat, StructureTensor,
};

/// Checkerboard with `cell`-pixel squares: a corner every `cell` pixels.
fn make_checkerboard(w: usize, h: usize, cell: usize) -> Vec<u8> {
    let mut px = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                px[y * w + x] = 220;
            } else {
                px[y * w + x] = 30;
            }
        }
    }
    px
}

fn to_rgb24(gray: &[u8]) -> Vec<u8> {
    gray.iter().flat_map(|&g| [g, g, g]).collect()
}

fn make_tensor(w: usize, h: usize) -> StructureTensor {
    let mut t = StructureTensor::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = ((x * 31 + y * 17) % 251) as f32;
            t.xx.set(x, y, v * 40.0);
            t.yy.set(x, y, (251.0 - v) * 40.0);
            t.xy.set(x, y, (v - 125.0) * 10.0);
        }
    }
    t
}

fn bench_detect(c: &mut Criterion) {
    let (w, h) = (640, 480);
    let gray = make_checkerboard(w, h, 40);
    let rgb = to_rgb24(&gray);
    let gray_view = ImageView::packed(w, h, PixelFormat::Indexed8, &gray).expect("view");
    let rgb_view = ImageView::packed(w, h, PixelFormat::Rgb24, &rgb).expect("view");

    let harris = HarrisDetector::new(HarrisParams::default()).expect("detector");
    let noble = HarrisDetector::new(HarrisParams {
        measure: CornerMeasure::Noble,
        threshold: 500.0,
        ..HarrisParams::default()
    })
    .expect("detector");

    c.bench_function("detect_harris_gray_640x480", |b| {
        b.iter(|| {
            let corners = harris.detect(black_box(&gray_view)).expect("detect");
            black_box(corners.len())
        })
    });

    c.bench_function("detect_harris_rgb24_640x480", |b| {
        b.iter(|| {
            let corners = harris.detect(black_box(&rgb_view)).expect("detect");
            black_box(corners.len())
        })
    });

    c.bench_function("detect_noble_gray_640x480", |b| {
        b.iter(|| {
            let corners = noble.detect(black_box(&gray_view)).expect("detect");
            black_box(corners.len())
        })
    });
}

fn bench_stages(c: &mut Criterion) {
    let (w, h) = (640, 480);
    let tensor = make_tensor(w, h);
    let kernel = GaussianKernel::new(1.2, 7).expect("kernel");

    c.bench_function("smooth_tensor_7tap_640x480", |b| {
        b.iter_batched(
            || tensor.clone(),
            |mut t| {
                smooth_tensor(&mut t, Some(black_box(&kernel)));
                black_box(t.xx.data[w * 10 + 10])
            },
            criterion::BatchSize::LargeInput,
        )
    });

    let response = corner_response(&tensor, CornerMeasure::Harris, 0.04, 200_000.0);

    c.bench_function("corner_response_harris_640x480", |b| {
        b.iter(|| {
            let m = corner_response(black_box(&tensor), CornerMeasure::Harris, 0.04, 200_000.0);
            black_box(m.data.len())
        })
    });

    c.bench_function("suppress_r3_640x480", |b| {
        b.iter(|| {
            let corners = suppress_non_maxima(black_box(&response), 3);
            black_box(corners.len())
        })
    });
}

criterion_group!(detect, bench_detect, bench_stages);
criterion_main!(detect);
