// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and input classification.

use std::path::{Path, PathBuf};

use clap::Parser;
use flatscan_core::EnhancerConfig;
use flatscan_core::error::{FlatscanError, Result};

#[derive(Parser, Debug)]
#[command(
    name = "flatscan",
    version,
    about = "Straighten photographed document pages into a clean black-and-white PDF"
)]
pub struct Cli {
    /// A scanned PDF, or one or more page images (PNG, JPEG, TIFF, BMP).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Where to write the output PDF.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Resolution used to extract PDF pages (72-600).
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Minimum share of the image the page outline must cover (0-1).
    #[arg(long)]
    pub area_threshold: Option<f64>,

    /// Resize factor applied before thresholding.
    #[arg(long)]
    pub upscale: Option<f32>,

    /// JSON settings file; flags given on the command line take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also save every binary page as a PNG in this directory.
    #[arg(long)]
    pub pages_dir: Option<PathBuf>,

    /// Write a JSON report of what happened to each page.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Settings from `--config` (or defaults) with flag overrides applied.
    pub fn resolve_config(&self) -> Result<EnhancerConfig> {
        let mut config = match &self.config {
            Some(path) => EnhancerConfig::load(path)?,
            None => EnhancerConfig::default(),
        };

        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(ratio) = self.area_threshold {
            config.area_threshold_ratio = ratio;
        }
        if let Some(factor) = self.upscale {
            config.upscale_factor = factor;
        }

        config.validate()?;
        Ok(config)
    }
}

/// How the inputs are read.
#[derive(Debug, PartialEq, Eq)]
pub enum InputKind {
    /// A single PDF whose pages are extracted.
    Pdf(PathBuf),
    /// Image files, one page each.
    Images(Vec<PathBuf>),
}

/// Decide whether `inputs` name one PDF or a set of page images.
pub fn classify_inputs(inputs: &[PathBuf]) -> Result<InputKind> {
    match inputs {
        [] => Err(FlatscanError::NoInput),
        [single] if is_pdf(single) => Ok(InputKind::Pdf(single.clone())),
        many if many.iter().any(|p| is_pdf(p)) => Err(FlatscanError::Input(
            "a PDF must be the only input; pass page images to combine several files".into(),
        )),
        images => Ok(InputKind::Images(images.to_vec())),
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
