// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement — document-level driver: load pages from a PDF or image
// files, run them through the page pipeline, and assemble the scanned PDF.

use std::path::{Path, PathBuf};

use flatscan_core::error::{FlatscanError, Result};
use flatscan_core::{DetectionOutcome, EnhancerConfig};
use image::{DynamicImage, GrayImage};
use tracing::{debug, info, instrument};

use super::pipeline::{PagePipeline, ProcessedPage};
use crate::image::processor::ImageProcessor;
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::PdfWriter;

/// Turns photographed or scanned pages into a clean black-and-white PDF.
///
/// ```ignore
/// let enhancer = ScanEnhancer::new(EnhancerConfig::default())?;
/// let scanned = enhancer.enhance_pdf(&std::fs::read("receipts.pdf")?)?;
/// scanned.write_pdf("receipts-scanned.pdf")?;
/// ```
pub struct ScanEnhancer {
    config: EnhancerConfig,
    pipeline: PagePipeline,
}

/// Result of enhancing a document: the processed pages and the PDF built
/// from them.
pub struct EnhancedDocument {
    pub pages: Vec<ProcessedPage>,
    pub pdf: Vec<u8>,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Validate `config` and prepare the page pipeline.
    pub fn new(config: EnhancerConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = PagePipeline::new(config.pipeline())?;
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    // -- Loading --------------------------------------------------------------

    /// Extract the page images of a PDF at the configured DPI.
    pub fn load_pdf_pages(&self, data: &[u8]) -> Result<Vec<DynamicImage>> {
        PdfReader::from_bytes(data)?.page_images(self.config.dpi)
    }

    /// Decode image files as pages, in the order given.
    ///
    /// Returns [`FlatscanError::NoInput`] when `paths` is empty.
    pub fn load_image_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<DynamicImage>> {
        if paths.is_empty() {
            return Err(FlatscanError::NoInput);
        }
        paths
            .iter()
            .map(|path| Ok(ImageProcessor::open(path)?.flatten_alpha().into_dynamic()))
            .collect()
    }

    // -- Enhancement ----------------------------------------------------------

    /// Run every page through the pipeline and assemble the output PDF.
    ///
    /// An empty page list is [`FlatscanError::EmptyResult`].
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn enhance_pages(&self, pages: Vec<DynamicImage>) -> Result<EnhancedDocument> {
        info!(
            dpi = self.config.dpi,
            upscale = self.config.upscale_factor,
            area_threshold = self.config.area_threshold_ratio,
            "Enhancing document"
        );

        let processed = self.pipeline.process_pages(&pages)?;
        drop(pages);

        let images: Vec<GrayImage> = processed.iter().map(|page| page.image.clone()).collect();
        let mut writer = PdfWriter::new(self.config.output_dpi());
        writer.set_title("Flatscan Scan");
        let pdf = writer.create_from_pages(&images)?;

        let summary = OutcomeSummary::from_pages(&processed);
        info!(
            pages = processed.len(),
            rectified = summary.rectified,
            not_found = summary.not_found,
            degenerate = summary.degenerate,
            pdf_bytes = pdf.len(),
            "Document enhanced"
        );

        Ok(EnhancedDocument {
            pages: processed,
            pdf,
        })
    }

    /// Enhance a PDF held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn enhance_pdf(&self, data: &[u8]) -> Result<EnhancedDocument> {
        let pages = self.load_pdf_pages(data)?;
        self.enhance_pages(pages)
    }

    /// Enhance a set of image files, one page per file.
    pub fn enhance_image_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<EnhancedDocument> {
        let pages = self.load_image_files(paths)?;
        self.enhance_pages(pages)
    }
}

impl EnhancedDocument {
    /// Per-page detection outcomes, in page order.
    pub fn outcomes(&self) -> impl Iterator<Item = &DetectionOutcome> {
        self.pages.iter().map(|page| &page.outcome)
    }

    /// Write the assembled PDF to `path`.
    pub fn write_pdf(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.pdf)?;
        info!("Wrote scanned PDF to {}", path.as_ref().display());
        Ok(())
    }

    /// Save each binary page as `page-NNN.png` under `dir`, creating it if
    /// needed. Returns the written paths in page order.
    pub fn save_pages(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let path = dir.join(format!("page-{:03}.png", page.index + 1));
            ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(page.image.clone())).save(&path)?;
            written.push(path);
        }
        debug!(pages = written.len(), dir = %dir.display(), "Binary pages saved");
        Ok(written)
    }
}

/// Counts of each detection outcome across a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub rectified: usize,
    pub not_found: usize,
    pub degenerate: usize,
}

impl OutcomeSummary {
    pub fn from_pages(pages: &[ProcessedPage]) -> Self {
        pages.iter().fold(Self::default(), |mut summary, page| {
            match page.outcome {
                DetectionOutcome::Rectified { .. } => summary.rectified += 1,
                DetectionOutcome::NotFound => summary.not_found += 1,
                DetectionOutcome::Degenerate { .. } => summary.degenerate += 1,
            }
            summary
        })
    }
}
