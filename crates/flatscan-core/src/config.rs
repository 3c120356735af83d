// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline and front-end configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlatscanError, Result};

/// Lowest rendering resolution accepted on the configuration surface.
pub const MIN_DPI: u32 = 72;
/// Highest rendering resolution accepted on the configuration surface.
pub const MAX_DPI: u32 = 600;

/// Immutable parameters for processing a single page.
///
/// Only `area_threshold_ratio` and `upscale_factor` are reachable from the
/// outside (through [`EnhancerConfig`]); the rest are fixed defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Fraction of the image area a document outline must exceed.
    pub area_threshold_ratio: f64,
    /// Resize factor applied before thresholding.
    pub upscale_factor: f32,
    /// Side of the adaptive-threshold neighbourhood. Odd, greater than 1.
    pub block_size: u32,
    /// Constant `C` subtracted from the local mean.
    pub threshold_offset: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the Gaussian pre-blur kernel. Odd.
    pub blur_kernel_size: u32,
    /// Radius (L-infinity) used to close hairline gaps in the edge map.
    /// Zero leaves the edge map untouched.
    pub edge_dilation: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            area_threshold_ratio: 0.4,
            upscale_factor: 2.0,
            block_size: 91,
            threshold_offset: 30.0,
            canny_low: 10.0,
            canny_high: 50.0,
            blur_kernel_size: 5,
            edge_dilation: 1,
        }
    }
}

impl PipelineConfig {
    /// Check every parameter against the range the pipeline can work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.area_threshold_ratio) {
            return Err(FlatscanError::InvalidConfig(format!(
                "area threshold ratio must be within 0..=1, got {}",
                self.area_threshold_ratio
            )));
        }
        validate_upscale(self.upscale_factor)?;
        validate_block_size(self.block_size)?;
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(FlatscanError::InvalidConfig(format!(
                "blur kernel size must be odd, got {}",
                self.blur_kernel_size
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(FlatscanError::InvalidConfig(format!(
                "canny low threshold {} exceeds high threshold {}",
                self.canny_low, self.canny_high
            )));
        }
        Ok(())
    }
}

/// Reject upscale factors the resize step cannot honour.
pub fn validate_upscale(factor: f32) -> Result<()> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(FlatscanError::InvalidConfig(format!(
            "upscale factor must be a positive number, got {}",
            factor
        )));
    }
    Ok(())
}

/// Adaptive thresholding needs an odd window with a centre pixel and neighbours.
pub fn validate_block_size(block_size: u32) -> Result<()> {
    if block_size <= 1 || block_size % 2 == 0 {
        return Err(FlatscanError::InvalidConfig(format!(
            "block size must be odd and greater than 1, got {}",
            block_size
        )));
    }
    Ok(())
}

/// Settings exposed to callers (CLI flags or a JSON file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    /// Minimum share of the page image the document outline must cover.
    pub area_threshold_ratio: f64,
    /// Resolution used when extracting page rasters from a PDF.
    pub dpi: u32,
    /// Resize factor applied before thresholding.
    pub upscale_factor: f32,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            area_threshold_ratio: pipeline.area_threshold_ratio,
            dpi: 200,
            upscale_factor: pipeline.upscale_factor,
        }
    }
}

impl EnhancerConfig {
    /// Read settings from a JSON file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the exposed settings, including the derived pipeline parameters.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(FlatscanError::InvalidConfig(format!(
                "dpi must be within {}..={}, got {}",
                MIN_DPI, MAX_DPI, self.dpi
            )));
        }
        self.pipeline().validate()
    }

    /// Per-page parameters with every internal constant at its default.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            area_threshold_ratio: self.area_threshold_ratio,
            upscale_factor: self.upscale_factor,
            ..PipelineConfig::default()
        }
    }

    /// Pixel density of the binarized pages, used to size output pages.
    pub fn output_dpi(&self) -> f32 {
        self.dpi as f32 * self.upscale_factor
    }
}
