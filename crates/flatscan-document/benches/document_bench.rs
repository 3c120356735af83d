// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page processing in the flatscan-document crate.
// Covers the whole per-page pipeline plus its two heaviest stages on small
// synthetic pages.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use flatscan_core::PipelineConfig;
use flatscan_document::{BoundaryDetector, binarize, process_page};
use image::{DynamicImage, GrayImage, Luma};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 300x400 dark desk with a light page from (40, 50) to (260, 350) and a few
/// dark text lines on it.
fn synthetic_page() -> DynamicImage {
    let (width, height) = (300u32, 400u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([30u8]));
    for y in 50..350 {
        for x in 40..260 {
            let text = y % 24 < 3 && (60..240).contains(&x);
            img.put_pixel(x, y, Luma([if text { 50u8 } else { 235u8 }]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full detect + rectify + binarize on one page with default settings.
fn bench_process_page(c: &mut Criterion) {
    let page = synthetic_page();
    let config = PipelineConfig::default();

    c.bench_function("process_page (300x400)", |b| {
        b.iter(|| black_box(process_page(black_box(&page), &config)));
    });
}

/// Outline detection alone: blur, Canny, contours, polygon fit.
fn bench_detection(c: &mut Criterion) {
    let page = synthetic_page();
    let detector = BoundaryDetector::default();

    c.bench_function("find_document_quad (300x400)", |b| {
        b.iter(|| black_box(detector.find_document_quad(black_box(&page))));
    });
}

/// Upscale + Gaussian adaptive threshold with the default 91-pixel block.
fn bench_binarize(c: &mut Criterion) {
    let page = synthetic_page();

    c.bench_function("binarize 2x (300x400)", |b| {
        b.iter(|| black_box(binarize(black_box(&page), 2.0, 91, 30.0)));
    });
}

criterion_group!(benches, bench_process_page, bench_detection, bench_binarize);
criterion_main!(benches);
