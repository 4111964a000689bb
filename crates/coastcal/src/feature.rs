//! Dark-line feature extraction.
//!
//! Coastline pixels are the ones darker than a threshold. No thinning is
//! done: thick strokes simply produce a denser cloud, which the nearest
//! neighbour search in ICP tolerates.

use crate::{CalibrationError, FeatureParams, Threshold};
use coastcal_core::{otsu_threshold, GrayImageView, Histogram, PixelBoundingBox, PixelPoint};
use log::debug;

/// Foreground pixels of a raster, as an unordered point cloud.
#[derive(Clone, Debug)]
pub struct FeatureCloud {
    pub points: Vec<PixelPoint>,
    /// Tight box around every foreground pixel, computed before any
    /// subsampling.
    pub bbox: PixelBoundingBox,
    /// Luma values strictly below `cut` were classified as foreground.
    pub cut: u8,
    /// Number of foreground pixels found, before subsampling.
    pub foreground: usize,
}

/// Collect foreground pixel coordinates inside `roi` (the full image when
/// `None`).
///
/// Pixels outside the region are never examined.
pub fn extract_feature(
    img: &GrayImageView<'_>,
    roi: Option<PixelBoundingBox>,
    params: &FeatureParams,
) -> Result<FeatureCloud, CalibrationError> {
    let region = match roi {
        Some(bb) if !bb.is_valid() => return Err(CalibrationError::InvalidPixelBbox(bb)),
        Some(bb) => bb,
        None => img.bounds(),
    };
    let (x0, y0, x1, y1) = region
        .clamp_to_image(img.width, img.height)
        .ok_or(CalibrationError::EmptyFeature)?;

    let cut = resolve_cut(img, (x0, y0, x1, y1), params.threshold);

    let mut points = Vec::new();
    for y in y0..y1 {
        let row = &img.row(y)[x0..x1];
        for (dx, &v) in row.iter().enumerate() {
            if v < cut {
                points.push(PixelPoint::new((x0 + dx) as f64, y as f64));
            }
        }
    }

    let bbox = PixelBoundingBox::enclosing(&points).ok_or(CalibrationError::EmptyFeature)?;
    let foreground = points.len();
    if let Some(max) = params.max_points.filter(|&m| m > 0) {
        points = stride_subsample(points, max);
    }

    debug!(
        "feature extraction: cut={} foreground={} kept={} bbox={:?}",
        cut,
        foreground,
        points.len(),
        bbox.to_array()
    );

    Ok(FeatureCloud {
        points,
        bbox,
        cut,
        foreground,
    })
}

fn resolve_cut(
    img: &GrayImageView<'_>,
    (x0, y0, x1, y1): (usize, usize, usize, usize),
    threshold: Threshold,
) -> u8 {
    match threshold {
        Threshold::Fixed(v) => v,
        Threshold::Otsu => {
            let mut hist = Histogram::default();
            for y in y0..y1 {
                for &v in &img.row(y)[x0..x1] {
                    hist.add(v);
                }
            }
            // A single-valued region has no dark class at all.
            otsu_threshold(&hist).map_or(0, |t| t.saturating_add(1))
        }
    }
}

/// Keep `max` points at evenly spaced indices, first and last included.
fn stride_subsample(points: Vec<PixelPoint>, max: usize) -> Vec<PixelPoint> {
    let n = points.len();
    if n <= max {
        return points;
    }
    if max == 1 {
        return vec![points[0]];
    }
    (0..max).map(|i| points[i * (n - 1) / (max - 1)]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canvas {
        width: usize,
        height: usize,
        data: Vec<u8>,
    }

    impl Canvas {
        fn blank(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                data: vec![255; width * height],
            }
        }

        fn fill(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, v: u8) {
            for y in y0..y1 {
                for x in x0..x1 {
                    self.data[y * self.width + x] = v;
                }
            }
        }

        fn view(&self) -> GrayImageView<'_> {
            GrayImageView::new(self.width, self.height, &self.data).expect("view")
        }
    }

    #[test]
    fn blank_image_has_no_feature() {
        let canvas = Canvas::blank(32, 24);
        let err = extract_feature(&canvas.view(), None, &FeatureParams::default()).unwrap_err();
        assert!(matches!(err, CalibrationError::EmptyFeature));

        let otsu = FeatureParams {
            threshold: Threshold::Otsu,
            ..FeatureParams::default()
        };
        let err = extract_feature(&canvas.view(), None, &otsu).unwrap_err();
        assert!(matches!(err, CalibrationError::EmptyFeature));
    }

    #[test]
    fn dark_pixels_become_points_with_tight_box() {
        let mut canvas = Canvas::blank(40, 30);
        canvas.fill(5, 10, 15, 12, 0);
        canvas.fill(30, 25, 31, 26, 100);
        let cloud = extract_feature(&canvas.view(), None, &FeatureParams::default()).expect("cloud");

        assert_eq!(cloud.foreground, 10 * 2 + 1);
        assert_eq!(cloud.points.len(), cloud.foreground);
        assert_eq!(cloud.bbox, PixelBoundingBox::new(5, 10, 31, 26));
        assert_eq!(cloud.points[0], PixelPoint::new(5.0, 10.0));
        assert_eq!(*cloud.points.last().unwrap(), PixelPoint::new(30.0, 25.0));
    }

    #[test]
    fn threshold_is_strict() {
        let mut canvas = Canvas::blank(8, 8);
        canvas.fill(0, 0, 1, 1, 128);
        canvas.fill(2, 2, 3, 3, 127);
        let cloud = extract_feature(&canvas.view(), None, &FeatureParams::default()).expect("cloud");
        assert_eq!(cloud.points, vec![PixelPoint::new(2.0, 2.0)]);
    }

    #[test]
    fn roi_ignores_pixels_outside() {
        let mut canvas = Canvas::blank(50, 50);
        canvas.fill(40, 40, 45, 45, 0);
        canvas.fill(2, 2, 4, 4, 0);

        let roi = PixelBoundingBox::new(0, 0, 20, 20);
        let cloud =
            extract_feature(&canvas.view(), Some(roi), &FeatureParams::default()).expect("cloud");
        assert_eq!(cloud.foreground, 4);
        assert!(cloud.points.iter().all(|p| p.x < 20.0 && p.y < 20.0));

        let empty_roi = PixelBoundingBox::new(10, 10, 30, 30);
        let err = extract_feature(&canvas.view(), Some(empty_roi), &FeatureParams::default())
            .unwrap_err();
        assert!(matches!(err, CalibrationError::EmptyFeature));
    }

    #[test]
    fn roi_outside_image_or_inverted() {
        let mut canvas = Canvas::blank(20, 20);
        canvas.fill(0, 0, 20, 20, 0);

        let outside = PixelBoundingBox::new(100, 100, 120, 140);
        let err = extract_feature(&canvas.view(), Some(outside), &FeatureParams::default())
            .unwrap_err();
        assert!(matches!(err, CalibrationError::EmptyFeature));

        let inverted = PixelBoundingBox::new(10, 0, 5, 10);
        let err = extract_feature(&canvas.view(), Some(inverted), &FeatureParams::default())
            .unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidPixelBbox(b) if b == inverted));
    }

    #[test]
    fn otsu_separates_gray_line_from_gray_background() {
        let mut canvas = Canvas::blank(30, 30);
        canvas.fill(0, 0, 30, 30, 200);
        canvas.fill(10, 0, 13, 30, 150);
        let fixed = extract_feature(&canvas.view(), None, &FeatureParams::default());
        assert!(matches!(fixed, Err(CalibrationError::EmptyFeature)));

        let otsu = FeatureParams {
            threshold: Threshold::Otsu,
            ..FeatureParams::default()
        };
        let cloud = extract_feature(&canvas.view(), None, &otsu).expect("cloud");
        assert_eq!(cloud.foreground, 3 * 30);
        assert_eq!(cloud.bbox, PixelBoundingBox::new(10, 0, 13, 30));
    }

    #[test]
    fn max_points_strides_deterministically() {
        let mut canvas = Canvas::blank(100, 10);
        canvas.fill(0, 5, 100, 6, 0);
        let params = FeatureParams {
            max_points: Some(11),
            ..FeatureParams::default()
        };
        let cloud = extract_feature(&canvas.view(), None, &params).expect("cloud");
        assert_eq!(cloud.foreground, 100);
        assert_eq!(cloud.points.len(), 11);
        assert_eq!(cloud.points[0].x, 0.0);
        assert_eq!(cloud.points[10].x, 99.0);
        assert_eq!(cloud.bbox, PixelBoundingBox::new(0, 5, 100, 6));

        let again = extract_feature(&canvas.view(), None, &params).expect("cloud");
        assert_eq!(cloud.points, again.points);
    }
}
