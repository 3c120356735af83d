// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan binarization — upscale, convert to intensity, and apply a
// Gaussian-weighted adaptive threshold for a black-on-white scanned look.

use flatscan_core::config::{validate_block_size, validate_upscale};
use flatscan_core::error::Result;
use flatscan_core::PipelineConfig;
use image::{DynamicImage, GrayImage, Luma};
use tracing::{debug, instrument};

use super::detect::kernel_sigma;
use crate::image::processor::upscale;

/// Turns a (rectified) page into a binary image.
#[derive(Debug, Clone, Copy)]
pub struct ScanBinarizer {
    upscale_factor: f32,
    block_size: u32,
    offset: f32,
}

impl Default for ScanBinarizer {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl ScanBinarizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            upscale_factor: config.upscale_factor,
            block_size: config.block_size,
            offset: config.threshold_offset,
        }
    }

    /// Binarize `image` with this binarizer's settings.
    pub fn binarize(&self, image: &DynamicImage) -> Result<GrayImage> {
        binarize(image, self.upscale_factor, self.block_size, self.offset)
    }
}

/// Upscale `image` by `upscale_factor`, convert it to intensity, and
/// threshold every pixel against its local Gaussian-weighted mean.
///
/// A pixel becomes white (255) when it is brighter than the mean of its
/// `block_size x block_size` neighbourhood minus `c`, and black (0)
/// otherwise, so ink stays dark on a white page. A larger `block_size`
/// smooths over uneven lighting at the cost of local adaptivity; a larger
/// `c` pushes more pixels to background.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn binarize(
    image: &DynamicImage,
    upscale_factor: f32,
    block_size: u32,
    c: f32,
) -> Result<GrayImage> {
    validate_upscale(upscale_factor)?;
    validate_block_size(block_size)?;

    let upscaled = upscale(image, upscale_factor);
    let gray = upscaled.to_luma8();
    debug!(
        up_w = gray.width(),
        up_h = gray.height(),
        "Upscaled and converted to grayscale"
    );

    let binary = adaptive_threshold_gaussian(&gray, block_size, c);
    debug!("Binarization complete");
    Ok(binary)
}

/// Normalised 1-D Gaussian weights for a window of `size` taps.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = kernel_sigma(size);
    let radius = (size / 2) as f32;
    let mut weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Adaptive threshold against a separable Gaussian local mean.
///
/// Borders replicate the edge pixel. The local mean is rounded to a whole
/// intensity level before the offset is subtracted.
fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    let kernel = gaussian_kernel(block_size);
    let radius = (block_size / 2) as isize;
    let pixels = gray.as_raw();

    let clamp_index = |i: isize, len: usize| i.clamp(0, len as isize - 1) as usize;

    // Horizontal pass.
    let mut horizontal = vec![0f32; w * h];
    for y in 0..h {
        let row = &pixels[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - radius, w);
                acc += weight * row[sx] as f32;
            }
            horizontal[y * w + x] = acc;
        }
    }

    // Vertical pass and comparison.
    let mut output = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut mean = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - radius, h);
                mean += weight * horizontal[sy * w + x];
            }
            let threshold = mean.round() - c;
            let value = pixels[y * w + x] as f32;
            let binary = if value > threshold { 255u8 } else { 0u8 };
            output.put_pixel(x as u32, y as u32, Luma([binary]));
        }
    }

    output
}
