// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometric and per-page result types.

use serde::{Deserialize, Serialize};

/// A point in image space (pixels, origin at the top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point2D {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for (f32, f32) {
    fn from(point: Point2D) -> Self {
        (point.x, point.y)
    }
}

/// Four corners of a document outline.
///
/// Once ordered, `corners` is `[top_left, top_right, bottom_right,
/// bottom_left]`. The transform math downstream relies on that order; a
/// mis-ordered quad produces a sheared or mirrored page, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub corners: [Point2D; 4],
}

impl Quadrilateral {
    pub fn new(corners: [Point2D; 4]) -> Self {
        Self { corners }
    }

    pub fn top_left(&self) -> Point2D {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point2D {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point2D {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point2D {
        self.corners[3]
    }

    /// Corners as plain tuples, in stored order.
    pub fn to_tuples(&self) -> [(f32, f32); 4] {
        self.corners.map(Into::into)
    }
}

/// What the page pipeline did with a page before binarizing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// A document outline was found and the page was flattened to
    /// `width` x `height` pixels.
    Rectified {
        quad: Quadrilateral,
        width: u32,
        height: u32,
    },
    /// No qualifying outline; the original image was binarized.
    NotFound,
    /// An outline was found but it collapses to a zero-sized page; the
    /// original image was binarized instead.
    Degenerate { quad: Quadrilateral },
}

impl DetectionOutcome {
    pub fn is_rectified(&self) -> bool {
        matches!(self, Self::Rectified { .. })
    }
}
