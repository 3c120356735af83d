// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatscan-document — Page processing for Flatscan.
//
// Finds the document outline in a photographed page, flattens it with a
// perspective warp, binarizes it for a scanned look, and moves pages in and
// out of PDF files.

pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary entry points so callers can use `flatscan_document::PagePipeline` etc.
pub use crate::image::processor::ImageProcessor;
pub use crate::image::raster::raster_from_raw;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use scan::binarize::{ScanBinarizer, binarize};
pub use scan::detect::{BoundaryDetector, find_document_quad};
pub use scan::enhance::{EnhancedDocument, ScanEnhancer};
pub use scan::pipeline::{PagePipeline, ProcessedPage, process_page};
pub use scan::rectify::rectify;
