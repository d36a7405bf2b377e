// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattened paths made of line segments only.
//!
//! Curves are expected to be flattened by the caller before they reach the renderer.

use crate::geometry::{Point, Rect, Transform};
use alloc::vec::Vec;

/// A contiguous run of points in a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contour {
    start: usize,
    end: usize,
    closed: bool,
}

/// A path consisting of polylines.
///
/// Every contour is filled as if it was closed, the `closed` flag only records
/// how the contour was built.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Path {
    points: Vec<Point>,
    contours: Vec<Contour>,
}

impl Path {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path containing a single closed polygon.
    pub fn from_polygon(points: &[Point]) -> Self {
        let mut path = Self::new();
        if let Some((first, rest)) = points.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            path.close();
        }
        path
    }

    /// Creates a path containing a rectangle.
    pub fn from_rect(rect: &Rect) -> Self {
        Self::from_polygon(&rect.corners())
    }

    /// Starts a new contour.
    pub fn move_to(&mut self, p: impl Into<Point>) {
        let start = self.points.len();
        self.points.push(p.into());
        self.contours.push(Contour {
            start,
            end: start + 1,
            closed: false,
        });
    }

    /// Adds a line to the current contour, starting one at the origin if there is none.
    pub fn line_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        match self.contours.last_mut() {
            Some(contour) if !contour.closed => {
                self.points.push(p);
                contour.end += 1;
            }
            _ => {
                let from = self.current_point().unwrap_or_default();
                self.move_to(from);
                self.line_to(p);
            }
        }
    }

    /// Closes the current contour.
    pub fn close(&mut self) {
        if let Some(contour) = self.contours.last_mut() {
            contour.closed = true;
        }
    }

    /// The last point of the path.
    pub fn current_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Returns `true` if the path has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total number of points, used to estimate the cost of building edges.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if all coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// Iterates over contours as `(points, closed)` pairs.
    pub fn contours(&self) -> impl Iterator<Item = (&[Point], bool)> + '_ {
        self.contours
            .iter()
            .map(|c| (&self.points[c.start..c.end], c.closed))
    }

    /// Returns a copy of the path with every point transformed.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| transform.apply(*p)).collect(),
            contours: self.contours.clone(),
        }
    }
}
