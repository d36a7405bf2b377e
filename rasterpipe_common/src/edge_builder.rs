// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of flattened geometry into clipped, monotonic, band-bucketed edges.

use crate::edge::{band_of, EdgeStorage, EdgeVector};
use crate::error::{Error, Result};
use crate::geometry::{BoxI, Point, PointFx, Transform};
use crate::path::Path;
use alloc::vec::Vec;

/// Builds an [`EdgeStorage`] from polygons and paths.
///
/// Geometry is clipped against the clip box while it's added:
/// - Parts above or below the clip box are dropped.
/// - Parts left of the clip box are replaced by vertical lines at its left edge,
///   which keeps the winding of everything to the right intact.
/// - Parts right of the clip box are replaced by vertical lines at its right edge.
///   Their coverage ends up in cells past the last visible pixel.
///
/// Horizontal segments contribute no coverage and are dropped.
#[derive(Debug)]
pub struct EdgeBuilder {
    clip_box: BoxI,
    band_height: u32,
    point_limit: Option<usize>,
    points: Vec<PointFx>,
    vectors: Vec<EdgeVector>,
    bounding_box: BoxI,
    /// Points of the vector being built, in traversal order.
    current: Vec<PointFx>,
    current_sign: i32,
}

impl EdgeBuilder {
    /// Creates a builder clipping to `clip_box`, given in 24.8 fixed point.
    ///
    /// # Panics
    ///
    /// Panics if `band_height` is zero.
    pub fn new(clip_box: BoxI, band_height: u32) -> Self {
        assert!(band_height > 0, "band height must be non-zero");
        Self {
            clip_box,
            band_height,
            point_limit: None,
            points: Vec::new(),
            vectors: Vec::new(),
            bounding_box: BoxI::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN),
            current: Vec::new(),
            current_sign: 0,
        }
    }

    /// Limits the number of points the storage may hold.
    ///
    /// Exceeding the limit makes the builder fail with [`Error::OutOfMemory`].
    pub fn with_point_limit(mut self, limit: Option<usize>) -> Self {
        self.point_limit = limit;
        self
    }

    /// The clip box in 24.8 fixed point.
    pub fn clip_box(&self) -> BoxI {
        self.clip_box
    }

    /// Adds a polygon given in fixed-point coordinates.
    ///
    /// Open polygons are closed implicitly, a fill always covers a closed area.
    pub fn add_polygon(&mut self, points: &[PointFx]) -> Result<()> {
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return Ok(());
        };

        for w in points.windows(2) {
            self.add_line(w[0], w[1])?;
        }
        self.add_line(last, first)?;
        self.flush_vector()
    }

    /// Adds every contour of `path` after applying `transform`.
    pub fn add_path(&mut self, path: &Path, transform: &Transform) -> Result<()> {
        if !path.is_finite() {
            return Err(Error::InvalidGeometry);
        }

        let mut fixed = Vec::new();
        for (points, _closed) in path.contours() {
            fixed.clear();
            fixed.try_reserve(points.len())?;
            fixed.extend(
                points
                    .iter()
                    .map(|p| PointFx::from_point(transform.apply(*p))),
            );
            self.add_polygon(&fixed)?;
        }
        Ok(())
    }

    /// Adds a polygon given in user space.
    pub fn add_points(&mut self, points: &[Point], transform: &Transform) -> Result<()> {
        if !points.iter().all(|p| p.is_finite()) {
            return Err(Error::InvalidGeometry);
        }

        let mut fixed = Vec::new();
        fixed.try_reserve(points.len())?;
        fixed.extend(
            points
                .iter()
                .map(|p| PointFx::from_point(transform.apply(*p))),
        );
        self.add_polygon(&fixed)
    }

    /// Finalizes the storage, bucketing vectors by the band of their first point.
    pub fn finish(mut self) -> Result<EdgeStorage> {
        self.flush_vector()?;

        if self.vectors.is_empty() || self.bounding_box.y0 >= self.bounding_box.y1 {
            return Ok(EdgeStorage::empty(self.band_height));
        }

        let band_height = self.band_height;
        let points = &self.points;
        let first_y = |v: &EdgeVector| points[v.start as usize].y;
        self.vectors
            .sort_by_key(|v| band_of(first_y(v), band_height));

        let band_start = band_of(self.bounding_box.y0, band_height);
        let band_end = band_of(self.bounding_box.y1 - 1, band_height) + 1;

        let mut band_offsets = Vec::new();
        band_offsets.try_reserve(band_end - band_start + 1)?;
        band_offsets.push(0);
        let mut index = 0;
        for band in band_start..band_end {
            while index < self.vectors.len()
                && band_of(first_y(&self.vectors[index]), band_height) == band
            {
                index += 1;
            }
            band_offsets.push(index as u32);
        }
        debug_assert_eq!(index, self.vectors.len());

        log::trace!(
            "built {} edge vectors with {} points over bands {}..{}",
            self.vectors.len(),
            self.points.len(),
            band_start,
            band_end
        );

        Ok(EdgeStorage {
            points: self.points,
            vectors: self.vectors,
            band_offsets,
            band_start,
            band_height,
            bounding_box: self.bounding_box,
        })
    }

    fn add_line(&mut self, p0: PointFx, p1: PointFx) -> Result<()> {
        if p0.y == p1.y {
            return self.flush_vector();
        }

        let clip = self.clip_box;
        let (top, bottom) = if p0.y < p1.y { (p0, p1) } else { (p1, p0) };
        if bottom.y <= clip.y0 || top.y >= clip.y1 {
            return self.flush_vector();
        }

        // Clip in y. The clipped points are computed on the line from `top` to
        // `bottom` regardless of the direction, so that both directions give
        // the same geometry.
        let mut a = p0;
        let mut b = p1;
        if top.y < clip.y0 {
            let p = PointFx::new(x_at_y(top, bottom, clip.y0), clip.y0);
            if p0.y < p1.y {
                a = p;
            } else {
                b = p;
            }
        }
        if bottom.y > clip.y1 {
            let p = PointFx::new(x_at_y(top, bottom, clip.y1), clip.y1);
            if p0.y < p1.y {
                b = p;
            } else {
                a = p;
            }
        }

        // Split at the vertical clip lines, clamping the parts outside.
        let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
        let mut splits = [a; 4];
        let mut count = 0;
        splits[count] = a;
        count += 1;
        for cx in [clip.x0, clip.x1] {
            if left.x < cx && cx < right.x {
                let y = y_at_x(left, right, cx);
                splits[count] = PointFx::new(cx, y);
                count += 1;
            }
        }
        // The split points were pushed in left-to-right order; reverse them if
        // the line goes right-to-left.
        if a.x > b.x && count == 3 {
            splits.swap(1, 2);
        }
        splits[count] = b;
        count += 1;

        for w in splits[..count].windows(2) {
            let mut s0 = w[0];
            let mut s1 = w[1];
            s0.x = s0.x.clamp(clip.x0, clip.x1);
            s1.x = s1.x.clamp(clip.x0, clip.x1);
            self.push_segment(s0, s1)?;
        }
        Ok(())
    }

    fn push_segment(&mut self, a: PointFx, b: PointFx) -> Result<()> {
        if a.y == b.y {
            return Ok(());
        }

        let sign = if a.y < b.y { 1 } else { -1 };
        let continues = sign == self.current_sign && self.current.last() == Some(&a);
        if !continues {
            self.flush_vector()?;
            self.current.try_reserve(2)?;
            self.current.push(a);
            self.current_sign = sign;
        }
        self.current.try_reserve(1)?;
        self.current.push(b);
        Ok(())
    }

    fn flush_vector(&mut self) -> Result<()> {
        if self.current.len() < 2 {
            self.current.clear();
            return Ok(());
        }

        if let Some(limit) = self.point_limit {
            if self.points.len() + self.current.len() > limit {
                self.current.clear();
                return Err(Error::OutOfMemory);
            }
        }

        if self.current_sign < 0 {
            self.current.reverse();
        }

        self.points.try_reserve(self.current.len())?;
        self.vectors.try_reserve(1)?;

        let start = self.points.len() as u32;
        for p in self.current.drain(..) {
            let bb = &mut self.bounding_box;
            bb.x0 = bb.x0.min(p.x);
            bb.y0 = bb.y0.min(p.y);
            bb.x1 = bb.x1.max(p.x);
            bb.y1 = bb.y1.max(p.y);
            self.points.push(p);
        }

        self.vectors.push(EdgeVector {
            sign: self.current_sign,
            start,
            end: self.points.len() as u32,
        });
        Ok(())
    }
}

/// X coordinate of the line `top -> bottom` at `y`, rounded towards negative infinity.
fn x_at_y(top: PointFx, bottom: PointFx, y: i32) -> i32 {
    let dy = i64::from(bottom.y - top.y);
    let dx = i64::from(bottom.x) - i64::from(top.x);
    let t = i64::from(y - top.y);
    (i64::from(top.x) + (t * dx).div_euclid(dy)) as i32
}

/// Y coordinate of the line `left -> right` at `x`, rounded towards negative infinity.
fn y_at_x(left: PointFx, right: PointFx, x: i32) -> i32 {
    let dx = i64::from(right.x - left.x);
    let dy = i64::from(right.y) - i64::from(left.y);
    let t = i64::from(x - left.x);
    (i64::from(left.y) + (t * dy).div_euclid(dx)) as i32
}
