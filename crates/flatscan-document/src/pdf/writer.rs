// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — assemble binarized page images into a multi-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use flatscan_core::error::{FlatscanError, Result};
use image::GrayImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

const MM_PER_INCH: f32 = 25.4;

/// Writes page images into a PDF, one image per page.
///
/// Every page is sized to its image at `dpi`, so a page rendered at the
/// effective output resolution prints at the physical size of the source.
pub struct PdfWriter {
    /// Pixels per inch used to size pages.
    dpi: f32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    /// Create a writer that places images at `dpi` pixels per inch.
    pub fn new(dpi: f32) -> Self {
        Self { dpi, title: None }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Physical page size of a `width` x `height` image at this writer's DPI.
    pub fn page_size(&self, width: u32, height: u32) -> (Mm, Mm) {
        (
            Mm(width as f32 / self.dpi * MM_PER_INCH),
            Mm(height as f32 / self.dpi * MM_PER_INCH),
        )
    }

    /// Create a PDF with one page per image, in order.
    ///
    /// Returns [`FlatscanError::EmptyResult`] when `pages` is empty.
    #[instrument(skip(self, pages), fields(pages = pages.len(), dpi = self.dpi))]
    pub fn create_from_pages(&self, pages: &[GrayImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(FlatscanError::EmptyResult);
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(FlatscanError::InvalidConfig(format!(
                "output resolution must be positive, got {} dpi",
                self.dpi
            )));
        }

        let title = self.title.as_deref().unwrap_or("Flatscan Document");
        info!(title, "Creating scanned PDF");

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let (width, height) = page.dimensions();
            if width == 0 || height == 0 {
                return Err(FlatscanError::Input(format!(
                    "page {} has zero area ({}x{})",
                    index + 1,
                    width,
                    height
                )));
            }

            let raw = RawImage {
                pixels: RawImageData::U8(page.as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::R8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Anchor at the lower-left corner; the image fills the page.
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            let (page_w, page_h) = self.page_size(width, height);
            debug!(
                page = index + 1,
                width,
                height,
                page_w_mm = page_w.0,
                page_h_mm = page_h.0,
                "Page placed"
            );
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }

        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    /// Create a PDF from `pages` and write it directly to a file.
    pub fn write_pages_to_file(&self, pages: &[GrayImage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_from_pages(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote {} page PDF to {}", pages.len(), path.as_ref().display());
        Ok(())
    }
}
