// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for the command line.
//
// Every technical error is mapped to a short message and a concrete
// suggestion. The severity decides whether the user has to change the input
// or the invocation.

use crate::error::FlatscanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user must change something (path, flag, config value).
    ActionRequired,
    /// Retrying with the same input will fail the same way.
    Permanent,
    /// Something outside the input went wrong; trying again may help.
    Transient,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `FlatscanError` into a `HumanError`.
pub fn humanize_error(err: &FlatscanError) -> HumanError {
    match err {
        FlatscanError::NoInput => HumanError {
            message: "No document was given.".into(),
            suggestion: "Pass a PDF file or one or more page images as input.".into(),
            severity: Severity::ActionRequired,
        },

        FlatscanError::Input(detail) => {
            if detail.contains("no embedded page image") {
                HumanError {
                    message: "This PDF has pages without a scanned image.".into(),
                    suggestion: "Only scanned PDFs can be processed. Export the pages as images and pass those instead.".into(),
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "The input document couldn't be read.".into(),
                    suggestion: format!("Check that the file is a valid PDF or image. ({detail})"),
                    severity: Severity::Permanent,
                }
            }
        }

        FlatscanError::EmptyResult => HumanError {
            message: "No pages were produced.".into(),
            suggestion: "The input document appears to have no pages.".into(),
            severity: Severity::Permanent,
        },

        FlatscanError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first, or try a different file.".into(),
            severity: Severity::Permanent,
        },

        FlatscanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        FlatscanError::DegenerateGeometry { .. } => HumanError {
            message: "The page outline that was found is too thin to straighten.".into(),
            suggestion: "Try a higher --area-threshold so small outlines are ignored.".into(),
            severity: Severity::ActionRequired,
        },

        FlatscanError::InvalidConfig(detail) => HumanError {
            message: "A setting is out of range.".into(),
            suggestion: format!("Fix the flag or config file value and run again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        FlatscanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission denied while reading or writing a file.".into(),
                    suggestion: "Check the file permissions, or write the output to a different directory.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        FlatscanError::Serialization(_) => HumanError {
            message: "The config file isn't valid JSON.".into(),
            suggestion: "Check the file for typos; unknown or missing fields fall back to defaults.".into(),
            severity: Severity::ActionRequired,
        },
    }
}
