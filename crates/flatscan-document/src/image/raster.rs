// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw raster buffers — the buffer-in contract for page images handed over
// by an external loader.

use flatscan_core::error::{FlatscanError, Result};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

/// Build a page image from interleaved 8-bit samples.
///
/// `channels` is 1 (gray), 2 (gray + alpha), 3 (RGB) or 4 (RGBA). `data`
/// must hold exactly `width * height * channels` bytes in row-major order.
/// Zero-area rasters are rejected.
pub fn raster_from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(FlatscanError::Input(format!(
            "page raster has zero area ({}x{})",
            width, height
        )));
    }

    let expected = width as usize * height as usize * channels as usize;
    if data.len() != expected {
        return Err(FlatscanError::Input(format!(
            "page raster holds {} bytes, expected {} for {}x{}x{}",
            data.len(),
            expected,
            width,
            height,
            channels
        )));
    }

    let image = match channels {
        1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        other => {
            return Err(FlatscanError::Input(format!(
                "unsupported channel count {}",
                other
            )));
        }
    };

    image.ok_or_else(|| FlatscanError::Input("page raster buffer is too small".into()))
}
