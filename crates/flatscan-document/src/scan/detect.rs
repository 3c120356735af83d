// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection — edge map, external contours, and a
// largest-first search for the first four-sided outline big enough to be
// the page.

use flatscan_core::{PipelineConfig, Point2D, Quadrilateral};
use image::{DynamicImage, GrayImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::dilate;
use imageproc::point::Point;
use tracing::{debug, instrument, trace};

use super::geometry::{distance, order_rect, polygon_area, to_points};

/// Douglas–Peucker tolerance as a fraction of the contour perimeter.
const APPROX_TOLERANCE_RATIO: f64 = 0.02;

/// Gaussian sigma for a square kernel of side `kernel_size`.
///
/// Uses the usual rule of thumb for deriving sigma from an aperture, so a
/// 5x5 kernel blurs with sigma 1.1 and a 91x91 window with sigma 14.
pub fn kernel_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Searches page images for the outline of a document.
///
/// This is a heuristic: torn or occluded edges, low contrast against the
/// background, or a page covering less than the area threshold all end in
/// `None`, and the caller is expected to fall back to the whole image.
#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    area_threshold_ratio: f64,
    blur_sigma: f32,
    canny_low: f32,
    canny_high: f32,
    edge_dilation: u8,
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl BoundaryDetector {
    /// Build a detector from the page pipeline parameters.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            area_threshold_ratio: config.area_threshold_ratio,
            blur_sigma: kernel_sigma(config.blur_kernel_size),
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            edge_dilation: config.edge_dilation,
        }
    }

    /// Override the minimum share of the image the outline must cover.
    pub fn with_area_threshold(mut self, ratio: f64) -> Self {
        self.area_threshold_ratio = ratio;
        self
    }

    /// Binary edge map: blur, Canny, then close hairline gaps.
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);
        if self.edge_dilation == 0 {
            edges
        } else {
            dilate(&edges, Norm::LInf, self.edge_dilation)
        }
    }

    /// Find the document outline, ordered top-left, top-right, bottom-right,
    /// bottom-left.
    ///
    /// External contours are scanned from the largest enclosed area down.
    /// The first one that simplifies to exactly four vertices and covers more
    /// than the area threshold wins; later candidates are never compared.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn find_document_quad(&self, image: &DynamicImage) -> Option<Quadrilateral> {
        // Edges come from brightness alone; hue-only boundaries are not seen.
        let gray = image.to_luma8();
        let image_area = gray.width() as f64 * gray.height() as f64;
        let min_area = self.area_threshold_ratio * image_area;

        let edges = self.edge_map(&gray);
        let candidates = external_contours_by_area(&edges);
        debug!(contours = candidates.len(), min_area, "External contours extracted");

        for (rank, (area, pixels)) in candidates.iter().enumerate() {
            let Some(corners) = simplify_to_quad(pixels) else {
                continue;
            };
            let quad_area = polygon_area(&corners);
            trace!(rank, contour_area = area, quad_area, "Four-sided candidate");
            if quad_area > min_area {
                let quad = order_rect(corners);
                debug!(
                    rank,
                    quad_area,
                    top_left = ?quad.top_left(),
                    top_right = ?quad.top_right(),
                    bottom_right = ?quad.bottom_right(),
                    bottom_left = ?quad.bottom_left(),
                    "Document outline found"
                );
                return Some(quad);
            }
        }

        debug!("No four-sided outline above the area threshold");
        None
    }
}

/// Find the document outline using default detector settings and the given
/// area threshold.
pub fn find_document_quad(image: &DynamicImage, area_threshold_ratio: f64) -> Option<Quadrilateral> {
    BoundaryDetector::default()
        .with_area_threshold(area_threshold_ratio)
        .find_document_quad(image)
}

/// Outer borders with no enclosing contour, paired with their enclosed area
/// and sorted largest first. The sort is stable so equal areas keep scan order.
fn external_contours_by_area(edges: &GrayImage) -> Vec<(f64, Vec<Point<i32>>)> {
    let mut contours: Vec<(f64, Vec<Point<i32>>)> = find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| (polygon_area(&to_points(&c.points)), c.points))
        .collect();
    contours.sort_by(|a, b| b.0.total_cmp(&a.0));
    contours
}

/// Simplify a closed contour and return its corners if it has exactly four.
///
/// The contour is split at two far-apart points before simplifying. On a
/// convex outline the point farthest from a given point is a vertex, so both
/// anchors are corners rather than wherever the border trace happened to
/// start. The four vertices are then snapped to the intersections of lines
/// fitted to the sides.
fn simplify_to_quad(pixels: &[Point<i32>]) -> Option<[Point2D; 4]> {
    if pixels.len() < 4 {
        return None;
    }
    let epsilon = APPROX_TOLERANCE_RATIO * arc_length(pixels, true);
    if epsilon <= 0.0 {
        return None;
    }

    let first = farthest_from(pixels, pixels[0]);
    let second = farthest_from(pixels, pixels[first]);
    if first == second {
        return None;
    }

    let (forward, backward) = split_closed(pixels, first, second);
    let mut vertices = approximate_polygon_dp(&forward, epsilon, false);
    let closing = approximate_polygon_dp(&backward, epsilon, false);
    // Both halves share the anchors: drop the repeated ends of the second.
    vertices.extend_from_slice(&closing[1..closing.len() - 1]);

    let vertices = drop_flat_vertices(vertices, epsilon);
    let corners: [Point2D; 4] = to_points(&vertices).try_into().ok()?;
    Some(refine_corners(pixels, corners, epsilon))
}

/// Share of each side, at either end, left out of the line fit.
const SIDE_FIT_MARGIN: f32 = 0.1;

/// Move each corner to the intersection of lines fitted to its two sides.
///
/// Blur and Canny round the corners of the edge map, so simplified vertices
/// sit a few pixels inside the true corner. The straight middle of each side
/// is unaffected. A corner keeps its simplified position when its sides are
/// near-parallel or the intersection lands farther than `epsilon` away.
fn refine_corners(pixels: &[Point<i32>], corners: [Point2D; 4], epsilon: f64) -> [Point2D; 4] {
    let sides: Vec<FittedLine> = (0..4)
        .map(|i| fit_side(pixels, corners[i], corners[(i + 1) % 4], epsilon as f32))
        .collect();

    let mut refined = corners;
    for i in 0..4 {
        let incoming = &sides[(i + 3) % 4];
        let outgoing = &sides[i];
        if let Some(corner) = incoming.intersect(outgoing)
            && distance(corner, corners[i]) <= epsilon as f32
        {
            refined[i] = corner;
        }
    }
    refined
}

/// A line through `origin` along the unit vector `direction`.
#[derive(Debug, Clone, Copy)]
struct FittedLine {
    origin: Point2D,
    direction: Point2D,
}

impl FittedLine {
    fn through(a: Point2D, b: Point2D) -> Self {
        let length = distance(a, b).max(f32::EPSILON);
        Self {
            origin: a,
            direction: Point2D::new((b.x - a.x) / length, (b.y - a.y) / length),
        }
    }

    fn intersect(&self, other: &FittedLine) -> Option<Point2D> {
        let (d1, d2) = (self.direction, other.direction);
        let cross = d1.x * d2.y - d1.y * d2.x;
        // Sides within about 3 degrees of parallel.
        if cross.abs() < 0.05 {
            return None;
        }
        let (ox, oy) = (other.origin.x - self.origin.x, other.origin.y - self.origin.y);
        let t = (ox * d2.y - oy * d2.x) / cross;
        Some(Point2D::new(
            self.origin.x + t * d1.x,
            self.origin.y + t * d1.y,
        ))
    }
}

/// Total-least-squares line through the contour points along the middle of
/// the side from `a` to `b`. Falls back to the segment itself when too few
/// points qualify.
fn fit_side(pixels: &[Point<i32>], a: Point2D, b: Point2D, epsilon: f32) -> FittedLine {
    let chord = FittedLine::through(a, b);
    let length = distance(a, b);
    if length <= 0.0 {
        return chord;
    }

    let (d, o) = (chord.direction, chord.origin);
    let support: Vec<Point2D> = to_points(pixels)
        .into_iter()
        .filter(|p| {
            let (vx, vy) = (p.x - o.x, p.y - o.y);
            let along = (vx * d.x + vy * d.y) / length;
            let across = (vx * d.y - vy * d.x).abs();
            across <= epsilon && (SIDE_FIT_MARGIN..=1.0 - SIDE_FIT_MARGIN).contains(&along)
        })
        .collect();
    if support.len() < 2 {
        return chord;
    }

    let n = support.len() as f32;
    let mx = support.iter().map(|p| p.x).sum::<f32>() / n;
    let my = support.iter().map(|p| p.y).sum::<f32>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
    for p in &support {
        let (dx, dy) = (p.x - mx, p.y - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    FittedLine {
        origin: Point2D::new(mx, my),
        direction: Point2D::new(angle.cos(), angle.sin()),
    }
}

/// Index of the contour point farthest from `origin`.
fn farthest_from(pixels: &[Point<i32>], origin: Point<i32>) -> usize {
    let squared = |p: &Point<i32>| {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        dx * dx + dy * dy
    };
    pixels
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| squared(p))
        .map_or(0, |(index, _)| index)
}

/// The two arcs of a closed contour between indices `a` and `b`, each
/// including both ends: `a..=b` and `b..=a` wrapping past the last point.
fn split_closed(pixels: &[Point<i32>], a: usize, b: usize) -> (Vec<Point<i32>>, Vec<Point<i32>>) {
    let n = pixels.len();
    let walk = |from: usize, to: usize| {
        let len = (to + n - from) % n + 1;
        (0..len).map(|k| pixels[(from + k) % n]).collect::<Vec<_>>()
    };
    (walk(a, b), walk(b, a))
}

/// Remove vertices lying within `epsilon` of the line through their
/// neighbours. Only the split anchors can end up like this.
fn drop_flat_vertices(mut vertices: Vec<Point<i32>>, epsilon: f64) -> Vec<Point<i32>> {
    let mut i = 0;
    while vertices.len() > 3 && i < vertices.len() {
        let n = vertices.len();
        let prev = vertices[(i + n - 1) % n];
        let next = vertices[(i + 1) % n];
        if distance_to_line(vertices[i], prev, next) <= epsilon {
            vertices.remove(i);
            i = 0;
        } else {
            i += 1;
        }
    }
    vertices
}

fn distance_to_line(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    ((px - ax) * dy - (py - ay) * dx).abs() / length
}
