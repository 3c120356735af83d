// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page pipeline — detect the document outline, flatten it, and binarize,
// falling back to the full page whenever the geometry can't be used.

use flatscan_core::error::{FlatscanError, Result};
use flatscan_core::{DetectionOutcome, PipelineConfig, Quadrilateral};
use image::{DynamicImage, GrayImage};
use tracing::{debug, info, instrument, warn};

use super::binarize::ScanBinarizer;
use super::detect::BoundaryDetector;
use super::rectify::rectify;

/// One binarized page together with what happened to it on the way.
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    /// Zero-based position of the page in its document.
    pub index: usize,
    pub outcome: DetectionOutcome,
    /// Single-channel page, every pixel 0 or 255.
    pub image: GrayImage,
}

/// Per-page processing with a fixed configuration.
///
/// Holds no state between pages: `process` is a pure function of the image
/// and the configuration, so pages may be handed to separate workers.
#[derive(Debug, Clone)]
pub struct PagePipeline {
    config: PipelineConfig,
    detector: BoundaryDetector,
    binarizer: ScanBinarizer,
}

impl PagePipeline {
    /// Validate `config` and build the pipeline stages from it.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: BoundaryDetector::new(&config),
            binarizer: ScanBinarizer::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one page through detection, rectification and binarization.
    ///
    /// A missing or unusable outline never fails the page: the original
    /// image is binarized instead. Only a zero-area image is rejected.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn process(&self, index: usize, image: &DynamicImage) -> Result<ProcessedPage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FlatscanError::Input(format!(
                "page {} has zero area ({}x{})",
                index + 1,
                image.width(),
                image.height()
            )));
        }

        let detected = self.detector.find_document_quad(image);
        let (outcome, rectified) = self.rectify_or_fallback(image, detected)?;
        let source = rectified.as_ref().unwrap_or(image);

        let binary = self.binarizer.binarize(source)?;
        debug!(
            out_w = binary.width(),
            out_h = binary.height(),
            rectified = outcome.is_rectified(),
            "Page processed"
        );

        Ok(ProcessedPage {
            index,
            outcome,
            image: binary,
        })
    }

    /// Process an ordered batch of pages one after another.
    ///
    /// Output order matches input order. The first hard failure aborts the
    /// batch; an empty batch is [`FlatscanError::EmptyResult`].
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn process_pages(&self, pages: &[DynamicImage]) -> Result<Vec<ProcessedPage>> {
        if pages.is_empty() {
            return Err(FlatscanError::EmptyResult);
        }

        let processed = pages
            .iter()
            .enumerate()
            .map(|(index, page)| self.process(index, page))
            .collect::<Result<Vec<_>>>()?;

        let rectified = processed.iter().filter(|p| p.outcome.is_rectified()).count();
        info!(
            pages = processed.len(),
            rectified,
            unrectified = processed.len() - rectified,
            "Batch processed"
        );
        Ok(processed)
    }

    /// Warp the page when an outline was found; otherwise keep the original.
    fn rectify_or_fallback(
        &self,
        image: &DynamicImage,
        detected: Option<Quadrilateral>,
    ) -> Result<(DetectionOutcome, Option<DynamicImage>)> {
        let Some(quad) = detected else {
            info!("No document outline found; binarizing the full page");
            return Ok((DetectionOutcome::NotFound, None));
        };

        match rectify(image, &quad) {
            Ok(warped) => {
                let outcome = DetectionOutcome::Rectified {
                    quad,
                    width: warped.width(),
                    height: warped.height(),
                };
                Ok((outcome, Some(warped)))
            }
            Err(FlatscanError::DegenerateGeometry { width, height }) => {
                warn!(
                    width,
                    height,
                    ?quad,
                    "Document outline collapses to a degenerate page; binarizing the full page"
                );
                Ok((DetectionOutcome::Degenerate { quad }, None))
            }
            Err(err) => Err(err),
        }
    }
}

/// Process a single page with `config` and return the binary image.
pub fn process_page(image: &DynamicImage, config: &PipelineConfig) -> Result<GrayImage> {
    let pipeline = PagePipeline::new(*config)?;
    Ok(pipeline.process(0, image)?.image)
}
