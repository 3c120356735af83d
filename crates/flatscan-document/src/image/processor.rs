// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, resample, flatten alpha, and save page images.
// Operates on in-memory images using the `image` crate.

use flatscan_core::error::{FlatscanError, Result};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use tracing::{debug, info, instrument, warn};

/// Image processing pipeline operating on a single in-memory page image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::open("page-1.jpg")?
///     .flatten_alpha()
///     .resize_exact(1700, 2200)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            FlatscanError::Input(format!(
                "failed to open image {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            FlatscanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to exactly `width` x `height` with bicubic
    /// (Catmull-Rom) filtering. A no-op when the size already matches.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if (width, height) == (self.width(), self.height()) {
            return self;
        }
        debug!(
            from_w = self.width(),
            from_h = self.height(),
            width,
            height,
            "Resampling image"
        );
        Self {
            image: self.image.resize_exact(width, height, FilterType::CatmullRom),
        }
    }

    /// Scale both dimensions by `factor`.
    pub fn upscale(self, factor: f32) -> Self {
        Self {
            image: upscale(&self.image, factor),
        }
    }

    /// Drop the alpha channel: RGBA becomes RGB and gray+alpha becomes gray.
    pub fn flatten_alpha(self) -> Self {
        let image = self.image;
        let image = match image.color() {
            ColorType::La8 | ColorType::La16 => DynamicImage::ImageLuma8(image.to_luma8()),
            color if color.has_alpha() => DynamicImage::ImageRgb8(image.to_rgb8()),
            _ => image,
        };
        Self { image }
    }

    /// Rotate clockwise by a multiple of 90 degrees. Rotation is lossless;
    /// 90 and 270 swap width and height. Other angles leave the image as is.
    pub fn rotate(self, degrees: i64) -> Self {
        let image = match degrees.rem_euclid(360) {
            90 => self.image.rotate90(),
            180 => self.image.rotate180(),
            270 => self.image.rotate270(),
            0 => self.image,
            other => {
                warn!(degrees = other, "Rotation is not a quarter turn; ignored");
                self.image
            }
        };
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            FlatscanError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Dimensions of `(width, height)` scaled by `factor`, rounded, at least 1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Resize `image` by `factor` in both dimensions with bicubic (Catmull-Rom)
/// filtering. Returns a copy when the size would not change.
pub fn upscale(image: &DynamicImage, factor: f32) -> DynamicImage {
    let (width, height) = scaled_dimensions(image.width(), image.height(), factor);
    if (width, height) == (image.width(), image.height()) {
        return image.clone();
    }
    image.resize_exact(width, height, FilterType::CatmullRom)
}
