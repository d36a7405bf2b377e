// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic geometric types in user space (`f64`), pixel space (`i32`) and fixed point (24.8).

use crate::math::{fixed_from_f64, FIXED_ONE};

/// A point in user space.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    /// The x coordinate.
    pub x: f64,
    /// The y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in user space, described by its edges.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rectangle from its origin and size.
    pub fn from_origin_size(origin: Point, width: f64, height: f64) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    /// Returns `true` if the rectangle has a non-positive area or non-finite edges.
    pub fn is_empty(&self) -> bool {
        !(self.x0 < self.x1 && self.y0 < self.y1)
    }

    /// Returns `true` if all edges are finite.
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// The four corners in clockwise order, starting at the top-left one.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x1, self.y1),
            Point::new(self.x0, self.y1),
        ]
    }

    /// Intersection of two rectangles. The result may be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }
}

/// An integer rectangle described by its origin and size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RectI {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl RectI {
    /// Creates a new rectangle.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Converts to an edge-based box, saturating on overflow.
    pub fn to_box(self) -> BoxI {
        BoxI::new(
            self.x,
            self.y,
            self.x.saturating_add(self.w),
            self.y.saturating_add(self.h),
        )
    }
}

/// An integer box; `x1` and `y1` are exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxI {
    /// Left edge (inclusive).
    pub x0: i32,
    /// Top edge (inclusive).
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl BoxI {
    /// Creates a new box.
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Returns `true` if the box covers no pixel.
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Width of the box, zero when empty.
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    /// Height of the box, zero when empty.
    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    /// Intersection of two boxes. The result may be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    /// The same box in 24.8 fixed point.
    pub fn to_fixed(&self) -> BoxI {
        Self::new(
            self.x0 * FIXED_ONE,
            self.y0 * FIXED_ONE,
            self.x1 * FIXED_ONE,
            self.y1 * FIXED_ONE,
        )
    }
}

/// A point in 24.8 fixed point.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointFx {
    /// The x coordinate.
    pub x: i32,
    /// The y coordinate.
    pub y: i32,
}

impl PointFx {
    /// Creates a new fixed-point point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a user-space point, rounding to the nearest 1/256 of a pixel.
    pub fn from_point(p: Point) -> Self {
        Self::new(fixed_from_f64(p.x), fixed_from_f64(p.y))
    }
}

/// A 2D affine transformation.
///
/// The coefficients `[a, b, c, d, e, f]` map `(x, y)` to
/// `(a * x + c * y + e, b * x + d * y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(pub [f64; 6]);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// A translation.
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// A non-uniform scale.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// A rotation by `angle` radians.
    pub fn rotate(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self([c, s, -s, c, 0.0, 0.0])
    }

    /// Returns the transform that applies `other` first and `self` second.
    pub fn concat(&self, other: &Self) -> Self {
        let [a, b, c, d, e, f] = other.0;
        let [a2, b2, c2, d2, e2, f2] = self.0;
        Self([
            a2 * a + c2 * b,
            b2 * a + d2 * b,
            a2 * c + c2 * d,
            b2 * c + d2 * d,
            a2 * e + c2 * f + e2,
            b2 * e + d2 * f + f2,
        ])
    }

    /// Transforms a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Returns the inverse transform, or `None` if the transform is singular.
    pub fn invert(&self) -> Option<Self> {
        let [a, b, c, d, e, f] = self.0;
        let det = a * d - b * c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = det.recip();
        Some(Self([
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * f - d * e) * inv,
            (b * e - a * f) * inv,
        ]))
    }

    /// Returns `true` if the transform maps axis-aligned rectangles to axis-aligned rectangles.
    pub fn is_axis_aligned(&self) -> bool {
        self.0[1] == 0.0 && self.0[2] == 0.0
    }

    /// Returns `true` if the transform is a pure translation.
    pub fn is_translation(&self) -> bool {
        self.is_axis_aligned() && self.0[0] == 1.0 && self.0[3] == 1.0
    }

    /// Transforms an axis-aligned rectangle, assuming [`Self::is_axis_aligned`].
    pub fn apply_rect(&self, r: &Rect) -> Rect {
        let p0 = self.apply(Point::new(r.x0, r.y0));
        let p1 = self.apply(Point::new(r.x1, r.y1));
        Rect::new(p0.x.min(p1.x), p0.y.min(p1.y), p0.x.max(p1.x), p0.y.max(p1.y))
    }
}
