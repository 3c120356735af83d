// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — flatten a document outline into an
// axis-aligned page with a four-point projective transform.

use flatscan_core::error::{FlatscanError, Result};
use flatscan_core::Quadrilateral;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument};

use super::geometry::{compute_destination_size, order_rect};

/// Projective transform taking an ordered quad onto the rectangle
/// `(0, 0)`, `(width - 1, 0)`, `(width - 1, height - 1)`, `(0, height - 1)`.
///
/// Returns `None` when the four correspondences do not determine a
/// transform (collapsed source or destination).
pub fn perspective_transform(quad: &Quadrilateral, width: u32, height: u32) -> Option<Projection> {
    let right = width.saturating_sub(1) as f32;
    let bottom = height.saturating_sub(1) as f32;
    let dest = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
    Projection::from_control_points(quad.to_tuples(), dest)
}

/// Warp the region inside `quad` into a flat, top-down page.
///
/// The quad is re-ordered first, so callers may pass corners in any order.
/// The output is exactly [`compute_destination_size`] pixels. Grayscale
/// input stays single-channel; anything else is warped as RGB. Source
/// positions outside the image come out black.
///
/// A quad whose destination is narrower or shorter than two pixels cannot
/// be mapped and yields [`FlatscanError::DegenerateGeometry`].
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn rectify(image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
    let ordered = order_rect(quad.corners);
    let (width, height) = compute_destination_size(&ordered);
    if width < 2 || height < 2 {
        return Err(FlatscanError::DegenerateGeometry { width, height });
    }

    let projection = perspective_transform(&ordered, width, height)
        .ok_or(FlatscanError::DegenerateGeometry { width, height })?;

    let warped = match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::new(width, height);
            warp_into(gray, &projection, Interpolation::Bicubic, Luma([0u8]), &mut out);
            DynamicImage::ImageLuma8(out)
        }
        other => {
            let rgb = other.to_rgb8();
            let mut out = RgbImage::new(width, height);
            warp_into(&rgb, &projection, Interpolation::Bicubic, Rgb([0u8, 0, 0]), &mut out);
            DynamicImage::ImageRgb8(out)
        }
    };

    debug!(out_w = width, out_h = height, "Perspective correction applied");
    Ok(warped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatscan_core::Point2D;
    use image::{Rgba, RgbaImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    fn quad(points: [(f32, f32); 4]) -> Quadrilateral {
        Quadrilateral::new(points.map(Point2D::from))
    }

    fn bright_share(img: &GrayImage) -> f64 {
        let bright = img.pixels().filter(|p| p.0[0] > 128).count();
        bright as f64 / (img.width() * img.height()) as f64
    }

    #[test]
    fn output_matches_destination_size() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 400, Luma([180u8])));
        let quads = [
            quad([(50.0, 60.0), (349.0, 60.0), (349.0, 339.0), (50.0, 339.0)]),
            quad([(120.0, 40.0), (370.0, 110.0), (300.0, 380.0), (30.0, 300.0)]),
            quad([(300.0, 380.0), (30.0, 300.0), (120.0, 40.0), (370.0, 110.0)]),
        ];
        for q in quads {
            let expected = compute_destination_size(&order_rect(q.corners));
            let out = rectify(&img, &q).unwrap();
            assert_eq!((out.width(), out.height()), expected);
        }
    }

    #[test]
    fn axis_aligned_page_is_cropped() {
        let mut gray = GrayImage::from_pixel(400, 500, Luma([30u8]));
        for y in 60..440 {
            for x in 50..350 {
                gray.put_pixel(x, y, Luma([240u8]));
            }
        }
        let q = quad([(50.0, 60.0), (349.0, 60.0), (349.0, 439.0), (50.0, 439.0)]);
        let out = rectify(&DynamicImage::ImageLuma8(gray), &q).unwrap();

        assert_eq!((out.width(), out.height()), (299, 379));
        let out = out.as_luma8().expect("grayscale input stays grayscale");
        assert!(bright_share(out) > 0.98);
        assert!(out.get_pixel(150, 190).0[0] > 230);
    }

    #[test]
    fn rotated_page_is_flattened() {
        let corners = [(134.0, 69.0), (559.0, 183.0), (466.0, 531.0), (41.0, 417.0)];
        let polygon: Vec<Point<i32>> = corners
            .iter()
            .map(|&(x, y)| Point::new(x as i32, y as i32))
            .collect();
        let mut gray = GrayImage::from_pixel(600, 600, Luma([20u8]));
        draw_polygon_mut(&mut gray, &polygon, Luma([230u8]));

        let out = rectify(&DynamicImage::ImageLuma8(gray), &quad(corners)).unwrap();
        let out = out.to_luma8();

        // The skewed page fills the output; only a thin rim may catch background.
        assert!(bright_share(&out) > 0.95, "bright share {}", bright_share(&out));
        assert!((out.width() as i32 - 440).abs() <= 2);
        assert!((out.height() as i32 - 360).abs() <= 2);
    }

    #[test]
    fn colour_input_warped_as_rgb() {
        let rgba = RgbaImage::from_pixel(120, 80, Rgba([200, 100, 50, 128]));
        let q = quad([(10.0, 10.0), (109.0, 10.0), (109.0, 69.0), (10.0, 69.0)]);
        let out = rectify(&DynamicImage::ImageRgba8(rgba), &q).unwrap();

        let rgb = out.as_rgb8().expect("colour input becomes RGB");
        assert_eq!(rgb.dimensions(), (99, 59));
        let [r, g, b] = rgb.get_pixel(50, 30).0;
        assert!(r.abs_diff(200) <= 1 && g.abs_diff(100) <= 1 && b.abs_diff(50) <= 1);
    }

    #[test]
    fn collapsed_quad_is_degenerate() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(50, 50));
        let q = quad([(5.0, 5.0); 4]);
        assert!(matches!(
            rectify(&img, &q),
            Err(FlatscanError::DegenerateGeometry { width: 0, height: 0 })
        ));
    }

    #[test]
    fn sliver_quad_is_degenerate() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(200, 50));
        let q = quad([(0.0, 0.0), (100.0, 0.0), (100.0, 1.0), (0.0, 1.0)]);
        assert!(matches!(
            rectify(&img, &q),
            Err(FlatscanError::DegenerateGeometry { width: 100, height: 1 })
        ));
    }
}
