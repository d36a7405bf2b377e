// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic edges bucketed by scanline band.

use crate::geometry::{BoxI, PointFx};
use crate::math::FIXED_SHIFT;
use alloc::vec::Vec;
use core::ops::Range;

/// A polyline whose points are sorted by ascending y.
///
/// The `sign` records the direction of the original geometry: `1` if it went
/// downwards and `-1` if it went upwards. It is the winding contribution of the
/// vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeVector {
    /// Winding direction, either `1` or `-1`.
    pub sign: i32,
    /// Index of the first point in [`EdgeStorage::points`].
    pub start: u32,
    /// Index one past the last point in [`EdgeStorage::points`].
    pub end: u32,
}

impl EdgeVector {
    /// The point range of this vector.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Number of line segments of this vector.
    #[inline]
    pub fn segment_count(&self) -> usize {
        (self.end - self.start) as usize - 1
    }
}

/// Edges of one geometry, ready to be rasterized band by band.
///
/// Edge vectors are bucketed by the band that contains their first point, so a
/// rasterizer working on band `n` only has to look at the buckets of bands up
/// to `n` to find every vector entering the band.
#[derive(Debug, Clone, Default)]
pub struct EdgeStorage {
    pub(crate) points: Vec<PointFx>,
    pub(crate) vectors: Vec<EdgeVector>,
    /// `vectors[band_offsets[i]..band_offsets[i + 1]]` start in band `band_start + i`.
    pub(crate) band_offsets: Vec<u32>,
    pub(crate) band_start: usize,
    pub(crate) band_height: u32,
    pub(crate) bounding_box: BoxI,
}

impl EdgeStorage {
    /// Creates a storage without edges for bands of `band_height` pixels.
    pub fn empty(band_height: u32) -> Self {
        Self {
            band_height,
            ..Self::default()
        }
    }

    /// Returns `true` if the storage produces no coverage.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty() || self.bounding_box.y0 >= self.bounding_box.y1
    }

    /// Bounding box of all points in 24.8 fixed point.
    pub fn bounding_box(&self) -> BoxI {
        self.bounding_box
    }

    /// The topmost y coordinate in 24.8 fixed point.
    pub fn fixed_y0(&self) -> i32 {
        self.bounding_box.y0
    }

    /// Height of the bands the vectors are bucketed by, in pixels.
    pub fn band_height(&self) -> u32 {
        self.band_height
    }

    /// Bands that have at least one bucket, empty or not.
    pub fn band_range(&self) -> Range<usize> {
        let count = self.band_offsets.len().saturating_sub(1);
        self.band_start..self.band_start + count
    }

    /// Vectors starting in `band`.
    pub fn band_vectors(&self, band: usize) -> &[EdgeVector] {
        let range = self.band_range();
        if !range.contains(&band) {
            return &[];
        }
        let i = band - range.start;
        &self.vectors[self.band_offsets[i] as usize..self.band_offsets[i + 1] as usize]
    }

    /// All vectors, sorted by band.
    pub fn vectors(&self) -> &[EdgeVector] {
        &self.vectors
    }

    /// All points referenced by the vectors.
    pub fn points(&self) -> &[PointFx] {
        &self.points
    }

    /// Points of a single vector.
    #[inline]
    pub fn vector_points(&self, vector: &EdgeVector) -> &[PointFx] {
        &self.points[vector.range()]
    }

    /// The band a fixed-point y coordinate falls into.
    #[inline]
    pub fn band_of(&self, fixed_y: i32) -> usize {
        band_of(fixed_y, self.band_height)
    }
}

/// The band a fixed-point y coordinate falls into, for bands of `band_height` pixels.
#[inline]
pub fn band_of(fixed_y: i32, band_height: u32) -> usize {
    ((fixed_y.max(0) >> FIXED_SHIFT) as u32 / band_height) as usize
}
