// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors and fill styles.

use crate::geometry::Point;
use crate::image::Image;
use crate::math::div_255;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// A non-premultiplied color stored as `0xAARRGGBB`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba32(pub u32);

impl Rgba32 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    /// Creates a color from its components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// The alpha component.
    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The components as `[r, g, b, a]`.
    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
            (self.0 >> 24) as u8,
        ]
    }

    /// Returns the premultiplied color as a `0xAARRGGBB` word.
    pub const fn premultiply(self) -> u32 {
        let a = self.0 >> 24;
        let r = div_255(((self.0 >> 16) & 0xFF) * a);
        let g = div_255(((self.0 >> 8) & 0xFF) * a);
        let b = div_255((self.0 & 0xFF) * a);
        a << 24 | r << 16 | g << 8 | b
    }
}

/// How a gradient or a pattern is extended outside of its natural bounds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendMode {
    /// Repeat the edge color or pixel.
    #[default]
    Pad,
    /// Repeat the whole gradient or pattern.
    Repeat,
    /// Repeat the gradient or pattern, mirroring every other copy.
    Reflect,
}

/// A color stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position of the stop in `[0, 1]`.
    pub offset: f64,
    /// The color at the stop.
    pub color: Rgba32,
}

impl GradientStop {
    /// Creates a new stop.
    pub const fn new(offset: f64, color: Rgba32) -> Self {
        Self { offset, color }
    }
}

/// The geometry of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientKind {
    /// A gradient along the line from `start` to `end`.
    Linear {
        /// Where offset 0 lies.
        start: Point,
        /// Where offset 1 lies.
        end: Point,
    },
    /// A gradient radiating from `focal`, reaching offset 1 on the circle
    /// of `radius` around `center`.
    Radial {
        /// Center of the end circle.
        center: Point,
        /// Where offset 0 lies.
        focal: Point,
        /// Radius of the end circle.
        radius: f64,
    },
    /// A gradient sweeping once around `center`, starting at `angle`.
    Conic {
        /// Center of the sweep.
        center: Point,
        /// Direction of offset 0 in radians, measured from the positive x axis
        /// towards the positive y axis.
        angle: f64,
    },
}

/// A gradient style.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    /// The gradient geometry.
    pub kind: GradientKind,
    /// Color stops, sorted by offset.
    pub stops: Vec<GradientStop>,
    /// How the gradient extends beyond `[0, 1]`.
    pub extend: ExtendMode,
}

impl Gradient {
    /// Creates a linear gradient.
    pub fn linear(start: Point, end: Point, stops: &[GradientStop]) -> Self {
        Self {
            kind: GradientKind::Linear { start, end },
            stops: stops.to_vec(),
            extend: ExtendMode::Pad,
        }
    }

    /// Creates a radial gradient centered on its focal point.
    pub fn radial(center: Point, radius: f64, stops: &[GradientStop]) -> Self {
        Self::focal_radial(center, center, radius, stops)
    }

    /// Creates a radial gradient whose offset 0 lies at `focal`.
    ///
    /// A focal point outside of the circle is moved just inside of it.
    pub fn focal_radial(center: Point, focal: Point, radius: f64, stops: &[GradientStop]) -> Self {
        Self {
            kind: GradientKind::Radial {
                center,
                focal,
                radius,
            },
            stops: stops.to_vec(),
            extend: ExtendMode::Pad,
        }
    }

    /// Creates a conic gradient.
    pub fn conic(center: Point, angle: f64, stops: &[GradientStop]) -> Self {
        Self {
            kind: GradientKind::Conic { center, angle },
            stops: stops.to_vec(),
            extend: ExtendMode::Pad,
        }
    }

    /// Sets the extend mode.
    pub fn with_extend(mut self, extend: ExtendMode) -> Self {
        self.extend = extend;
        self
    }

    /// Returns `true` if every stop is opaque.
    pub fn is_opaque(&self) -> bool {
        !self.stops.is_empty() && self.stops.iter().all(|s| s.color.alpha() == 255)
    }
}

/// How an image is sampled when its transform isn't an integer translation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternQuality {
    /// The pixel whose area contains the sample.
    #[default]
    Nearest,
    /// Weighted average of the four closest pixels.
    Bilinear,
}

/// An image used as a style.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// The image. It is shared with every command that renders it.
    pub image: Arc<Image>,
    /// Position of the image's top-left corner in user space.
    pub offset: (i32, i32),
    /// How the image repeats.
    pub extend: ExtendMode,
    /// How the image is sampled.
    pub quality: PatternQuality,
}

impl Pattern {
    /// Creates a pattern placed at `offset`.
    pub fn new(image: Arc<Image>, offset: (i32, i32)) -> Self {
        Self {
            image,
            offset,
            extend: ExtendMode::Pad,
            quality: PatternQuality::Nearest,
        }
    }

    /// Sets the extend mode.
    pub fn with_extend(mut self, extend: ExtendMode) -> Self {
        self.extend = extend;
        self
    }

    /// Sets the sampling quality.
    pub fn with_quality(mut self, quality: PatternQuality) -> Self {
        self.quality = quality;
        self
    }
}

/// A fill style.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    /// A solid color.
    Solid(Rgba32),
    /// A gradient.
    Gradient(Gradient),
    /// An image.
    Pattern(Pattern),
}

impl Default for Style {
    fn default() -> Self {
        Self::Solid(Rgba32::BLACK)
    }
}

impl From<Rgba32> for Style {
    fn from(color: Rgba32) -> Self {
        Self::Solid(color)
    }
}

impl From<Gradient> for Style {
    fn from(gradient: Gradient) -> Self {
        Self::Gradient(gradient)
    }
}

impl From<Pattern> for Style {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}
