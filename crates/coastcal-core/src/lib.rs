//! Core types and utilities for coastline-based map calibration.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete image decoder; raster input is borrowed through
//! [`GrayImageView`].

mod affine;
mod geometry;
mod image;
mod logger;
mod threshold;

pub use affine::{Affine2, AffineFitError};
pub use geometry::{GeoBoundingBox, GeoPoint, PixelBoundingBox, PixelPoint};
pub use image::GrayImageView;
pub use threshold::{otsu_threshold, Histogram};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};
