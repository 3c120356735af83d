// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry helpers for document outlines — distances, corner ordering,
// destination sizing, and polygon area.

use flatscan_core::{Point2D, Quadrilateral};
use imageproc::point::Point;

/// Euclidean distance between two points.
pub fn distance(p1: Point2D, p2: Point2D) -> f32 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// Order four points as `[top_left, top_right, bottom_right, bottom_left]`.
///
/// The point with the smallest `x + y` is the top-left corner and the one
/// with the largest is the bottom-right. Of the two left over, the one with
/// the smaller `y - x` is the top-right corner. Ties on the sum go to the
/// smaller `y - x` for top-left and the larger for bottom-right, then to the
/// smaller `x`, so the result depends only on the points and not on the
/// order they are given in. Re-ordering an ordered quad is a no-op.
///
/// This is a heuristic. It holds up under moderate rotation but can swap
/// corners of a near-square outline rotated close to 45 degrees, where the
/// sums and differences of neighbouring corners almost coincide.
pub fn order_rect(points: [Point2D; 4]) -> Quadrilateral {
    let sum = |p: &Point2D| p.x + p.y;
    let diff = |p: &Point2D| p.y - p.x;

    let mut by_sum = points;
    by_sum.sort_by(|a, b| {
        sum(a)
            .total_cmp(&sum(b))
            .then(diff(a).total_cmp(&diff(b)))
            .then(a.x.total_cmp(&b.x))
    });

    let mut middle = [by_sum[1], by_sum[2]];
    middle.sort_by(|a, b| {
        diff(a)
            .total_cmp(&diff(b))
            .then(sum(a).total_cmp(&sum(b)))
            .then(a.x.total_cmp(&b.x))
    });
    let [top_right, bottom_left] = middle;

    Quadrilateral::new([by_sum[0], top_right, by_sum[3], bottom_left])
}

/// Size of the flattened page for an ordered quad.
///
/// Width is the longer of the top and bottom edges, height the longer of the
/// left and right edges, both truncated to whole pixels.
pub fn compute_destination_size(quad: &Quadrilateral) -> (u32, u32) {
    let width_bottom = distance(quad.bottom_right(), quad.bottom_left());
    let width_top = distance(quad.top_right(), quad.top_left());
    let height_right = distance(quad.top_right(), quad.bottom_right());
    let height_left = distance(quad.top_left(), quad.bottom_left());

    // `as` saturates: negative or NaN lengths become 0.
    let width = width_bottom.max(width_top) as u32;
    let height = height_right.max(height_left) as u32;
    (width, height)
}

/// Area of a simple polygon via the shoelace formula.
///
/// Vertices may be in either winding order; the result is always positive.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    area.abs() / 2.0
}

/// Convert contour pixels into floating-point image coordinates.
pub fn to_points(pixels: &[Point<i32>]) -> Vec<Point2D> {
    pixels
        .iter()
        .map(|p| Point2D::new(p.x as f32, p.y as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn distance_three_four_five() {
        assert!((distance(pt(0.0, 0.0), pt(3.0, 4.0)) - 5.0).abs() < 1e-6);
        assert_eq!(distance(pt(2.0, 2.0), pt(2.0, 2.0)), 0.0);
    }

    #[test]
    fn order_rect_shuffled_rectangle() {
        let quad = order_rect([
            pt(100.0, 200.0),
            pt(0.0, 0.0),
            pt(0.0, 200.0),
            pt(100.0, 0.0),
        ]);
        assert_eq!(
            quad.corners,
            [pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 200.0), pt(0.0, 200.0)]
        );
    }

    #[test]
    fn order_rect_is_idempotent() {
        let inputs = [
            [pt(12.0, 30.0), pt(310.0, 8.0), pt(330.0, 420.0), pt(5.0, 400.0)],
            [pt(330.0, 420.0), pt(5.0, 400.0), pt(310.0, 8.0), pt(12.0, 30.0)],
            [pt(50.0, 10.0), pt(90.0, 50.0), pt(50.0, 90.0), pt(10.0, 50.0)],
        ];
        for points in inputs {
            let once = order_rect(points);
            let twice = order_rect(once.corners);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn order_rect_ignores_input_position_on_ties() {
        // A square rotated by exactly 45 degrees: both sums tie pairwise.
        let diamond = [pt(50.0, 10.0), pt(90.0, 50.0), pt(50.0, 90.0), pt(10.0, 50.0)];
        let expected = [pt(50.0, 10.0), pt(90.0, 50.0), pt(50.0, 90.0), pt(10.0, 50.0)];

        for shift in 0..4 {
            let mut rotated = diamond;
            rotated.rotate_left(shift);
            assert_eq!(order_rect(rotated).corners, expected, "shift {}", shift);

            rotated.reverse();
            assert_eq!(order_rect(rotated).corners, expected, "reversed shift {}", shift);
        }
    }

    #[test]
    fn order_rect_moderate_rotation() {
        // Rectangle rotated by roughly 15 degrees clockwise.
        let quad = order_rect([
            pt(339.0, 187.0),
            pt(148.0, 56.0),
            pt(42.0, 242.0),
            pt(233.0, 372.0),
        ]);
        assert_eq!(quad.top_left(), pt(148.0, 56.0));
        assert_eq!(quad.top_right(), pt(339.0, 187.0));
        assert_eq!(quad.bottom_right(), pt(233.0, 372.0));
        assert_eq!(quad.bottom_left(), pt(42.0, 242.0));
    }

    #[test]
    fn destination_size_axis_aligned() {
        let quad = order_rect([
            pt(0.0, 0.0),
            pt(100.0, 0.0),
            pt(100.0, 200.0),
            pt(0.0, 200.0),
        ]);
        assert_eq!(compute_destination_size(&quad), (100, 200));
    }

    #[test]
    fn destination_size_takes_longer_edges() {
        // Trapezoid: bottom edge longer than top, right edge longer than left.
        let quad = Quadrilateral::new([
            pt(10.0, 0.0),
            pt(90.0, 0.0),
            pt(100.0, 60.5),
            pt(0.0, 50.0),
        ]);
        let (width, height) = compute_destination_size(&quad);
        assert_eq!(width, 100);
        assert_eq!(height, 61);
    }

    #[test]
    fn destination_size_collapsed_quad_is_zero() {
        let p = pt(5.0, 5.0);
        let quad = Quadrilateral::new([p, p, p, p]);
        assert_eq!(compute_destination_size(&quad), (0, 0));
    }

    #[test]
    fn polygon_area_either_winding() {
        let cw = [pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 5.0), pt(0.0, 5.0)];
        let mut ccw = cw;
        ccw.reverse();
        assert!((polygon_area(&cw) - 50.0).abs() < 1e-9);
        assert!((polygon_area(&ccw) - 50.0).abs() < 1e-9);
        assert_eq!(polygon_area(&cw[..2]), 0.0);
    }
}
