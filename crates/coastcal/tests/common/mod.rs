#![allow(dead_code)]

use coastcal::core::Affine2;
use coastcal::GeoPoint;
use image::{Rgb, RgbImage};

pub const CANVAS: u32 = 900;
pub const STROKE_RADIUS: f64 = 4.0;

/// Ground-truth transform of the synthetic map, north up.
pub fn truth_north_up() -> Affine2 {
    Affine2::from_rows([[60.0, 5.0, 450.0], [2.0, -70.0, 4300.0]])
}

/// Same map drawn with latitude growing downwards.
pub fn truth_south_up() -> Affine2 {
    Affine2::from_rows([[60.0, 5.0, 450.0], [2.0, 70.0, -3400.0]])
}

/// Sinusoidal coastline: 200 vertices, lon in [-8, 2], lat around 55.
pub fn wavy_coastline() -> Vec<GeoPoint> {
    let n = 200;
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let lon = -8.0 + 10.0 * t;
            let lat = 55.0 + 3.0 * (5.0 * std::f64::consts::PI * t).sin();
            GeoPoint::new(lon, lat)
        })
        .collect()
}

/// Points off the polyline used to score the recovered transform.
pub fn holdout_points() -> [GeoPoint; 4] {
    [
        GeoPoint::new(-7.1, 54.2),
        GeoPoint::new(-1.3, 52.9),
        GeoPoint::new(1.9, 56.0),
        GeoPoint::new(-0.5, 51.0),
    ]
}

/// White RGB canvas with `coastline` drawn through `truth` as a black
/// stroke, 8 px wide.
pub fn draw_coastline(coastline: &[GeoPoint], truth: &Affine2) -> RgbImage {
    let mut img = RgbImage::from_pixel(CANVAS, CANVAS, Rgb([255, 255, 255]));
    let projected: Vec<_> = coastline.iter().map(|g| truth.apply(g.to_point())).collect();
    for seg in projected.windows(2) {
        let (p, q) = (seg[0], seg[1]);
        let steps = ((q - p).norm() * 4.0).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            stamp_disc(&mut img, p.x + t * (q.x - p.x), p.y + t * (q.y - p.y));
        }
    }
    img
}

fn stamp_disc(img: &mut RgbImage, cx: f64, cy: f64) {
    let r = STROKE_RADIUS;
    let (w, h) = (img.width() as i64, img.height() as i64);
    for y in (cy - r).floor() as i64..=(cy + r).ceil() as i64 {
        for x in (cx - r).floor() as i64..=(cx + r).ceil() as i64 {
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x as u32, y as u32, Rgb([0, 0, 0]));
            }
        }
    }
}

/// RMS pixel distance between two transforms over `points`.
pub fn rms_between(a: &Affine2, b: &Affine2, points: &[GeoPoint]) -> f64 {
    let sum: f64 = points
        .iter()
        .map(|g| (a.apply(g.to_point()) - b.apply(g.to_point())).norm_squared())
        .sum();
    (sum / points.len() as f64).sqrt()
}
