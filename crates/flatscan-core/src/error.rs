// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatscan.

use thiserror::Error;

/// Top-level error type for all Flatscan operations.
///
/// Only whole-batch problems are meant to reach the caller. A page whose
/// document boundary cannot be found is not an error at all, and
/// [`FlatscanError::DegenerateGeometry`] is absorbed by the page pipeline,
/// which falls back to the unrectified image.
#[derive(Debug, Error)]
pub enum FlatscanError {
    // -- Input / output documents --
    #[error("no input document supplied")]
    NoInput,

    #[error("failed to read input document: {0}")]
    Input(String),

    #[error("no pages were produced for the output document")]
    EmptyResult,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Geometry --
    #[error("degenerate document outline: destination size {width}x{height}")]
    DegenerateGeometry { width: u32, height: u32 },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlatscanError>;
