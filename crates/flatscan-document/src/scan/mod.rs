// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — outline detection, perspective rectification,
// adaptive binarization, and document-level scan-to-PDF conversion.

pub mod binarize;
pub mod detect;
pub mod enhance;
pub mod geometry;
pub mod pipeline;
pub mod rectify;

pub use binarize::{ScanBinarizer, binarize};
pub use detect::{BoundaryDetector, find_document_quad};
pub use enhance::{EnhancedDocument, OutcomeSummary, ScanEnhancer};
pub use geometry::{compute_destination_size, order_rect};
pub use pipeline::{PagePipeline, ProcessedPage, process_page};
pub use rectify::rectify;
