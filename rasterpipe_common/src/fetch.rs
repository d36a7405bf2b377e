// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fetching source pixels from styles.
//!
//! A style is resolved once into [`FetchData`], which is then shared by every
//! command that uses it. The compositor only sees the produced premultiplied
//! pixels; it never looks into gradients or patterns.

use crate::geometry::{Point, Transform};
use crate::image::{Format, Image};
use crate::paint::{
    ExtendMode, Gradient, GradientKind, GradientStop, Pattern, PatternQuality, Rgba32, Style,
};
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::f64::consts::TAU;

/// Number of entries of a gradient lookup table.
pub const GRADIENT_LUT_SIZE: usize = 256;

/// How close a focal point may get to the end circle, relative to its radius.
const MAX_FOCAL_DISTANCE: f64 = 0.99;

/// Fetches a horizontal span of premultiplied `0xAARRGGBB` pixels starting at `(x, y)`.
pub type FetchFunc = fn(data: &FetchData, x: i32, y: i32, out: &mut [u32]);

/// The kind of source a fetch data produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// A single color.
    Solid,
    /// A linear gradient.
    Linear,
    /// A radial gradient, possibly with a focal point.
    Radial,
    /// A conic gradient.
    Conic,
    /// An image placed with an integer translation.
    PatternAligned,
    /// An image under an affine transform, sampling the nearest pixel.
    PatternAffineNearest,
    /// An image under an affine transform, sampling bilinearly.
    PatternAffineBilinear,
}

impl FetchKind {
    /// The fetch function for data of this kind.
    pub fn fetch_func(self) -> FetchFunc {
        match self {
            Self::Solid => fetch_solid,
            Self::Linear => fetch_linear,
            Self::Radial => fetch_radial,
            Self::Conic => fetch_conic,
            Self::PatternAligned => fetch_pattern_aligned,
            Self::PatternAffineNearest => fetch_pattern_nearest,
            Self::PatternAffineBilinear => fetch_pattern_bilinear,
        }
    }
}

/// A gradient resolved into a lookup table of premultiplied colors.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFetch {
    lut: Box<[u32; GRADIENT_LUT_SIZE]>,
    extend: ExtendMode,
    /// Maps device pixel centers to gradient space.
    inverse: Transform,
    kind: GradientKind,
    opaque: bool,
}

/// How a [`PatternFetch`] maps device pixels to image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PatternMapping {
    /// Device pixel `(x, y)` shows image pixel `(x - tx, y - ty)`.
    Aligned { tx: i32, ty: i32 },
    /// Device pixel centers are mapped to image space by `inverse`.
    Affine {
        inverse: Transform,
        quality: PatternQuality,
    },
}

/// An image resolved for fetching.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFetch {
    image: Arc<Image>,
    mapping: PatternMapping,
    extend: ExtendMode,
    opaque: bool,
}

/// A resolved style.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchData {
    /// A premultiplied solid color.
    Solid(u32),
    /// A gradient.
    Gradient(GradientFetch),
    /// An image.
    Pattern(PatternFetch),
}

impl FetchData {
    /// Resolves a style. `transform` maps style coordinates to device coordinates.
    ///
    /// Returns `None` for a gradient or a pattern whose transform can't be
    /// inverted; such a style renders nothing.
    pub fn new(style: &Style, transform: &Transform) -> Option<Self> {
        match style {
            Style::Solid(color) => Some(Self::Solid(color.premultiply())),
            Style::Gradient(gradient) => {
                GradientFetch::new(gradient, transform).map(Self::Gradient)
            }
            Style::Pattern(pattern) => PatternFetch::new(pattern, transform).map(Self::Pattern),
        }
    }

    /// Resolves an image placed at an integer position.
    pub fn from_image(image: Arc<Image>, tx: i32, ty: i32) -> Self {
        let opaque = image_is_opaque(&image);
        Self::Pattern(PatternFetch {
            image,
            mapping: PatternMapping::Aligned { tx, ty },
            extend: ExtendMode::Pad,
            opaque,
        })
    }

    /// The kind of source.
    pub fn kind(&self) -> FetchKind {
        match self {
            Self::Solid(_) => FetchKind::Solid,
            Self::Gradient(g) => match g.kind {
                GradientKind::Linear { .. } => FetchKind::Linear,
                GradientKind::Radial { .. } => FetchKind::Radial,
                GradientKind::Conic { .. } => FetchKind::Conic,
            },
            Self::Pattern(p) => match p.mapping {
                PatternMapping::Aligned { .. } => FetchKind::PatternAligned,
                PatternMapping::Affine {
                    quality: PatternQuality::Nearest,
                    ..
                } => FetchKind::PatternAffineNearest,
                PatternMapping::Affine {
                    quality: PatternQuality::Bilinear,
                    ..
                } => FetchKind::PatternAffineBilinear,
            },
        }
    }

    /// Returns `true` if every fetched pixel is opaque.
    pub fn is_opaque(&self) -> bool {
        match self {
            Self::Solid(c) => c >> 24 == 0xFF,
            Self::Gradient(g) => g.opaque,
            Self::Pattern(p) => p.opaque,
        }
    }

    /// Returns the solid color, if this is a solid source.
    pub fn solid(&self) -> Option<u32> {
        match self {
            Self::Solid(c) => Some(*c),
            _ => None,
        }
    }

    /// The fetch function matching this data.
    pub fn fetch_func(&self) -> FetchFunc {
        self.kind().fetch_func()
    }

    /// Fetches a span of pixels.
    pub fn fetch(&self, x: i32, y: i32, out: &mut [u32]) {
        (self.fetch_func())(self, x, y, out);
    }
}

impl GradientFetch {
    fn new(gradient: &Gradient, transform: &Transform) -> Option<Self> {
        let Some(inverse) = transform.invert() else {
            log::debug!("gradient transform is not invertible, nothing is rendered");
            return None;
        };
        let kind = match gradient.kind {
            GradientKind::Radial {
                center,
                focal,
                radius,
            } => GradientKind::Radial {
                center,
                focal: clamp_focal(center, focal, radius),
                radius,
            },
            kind => kind,
        };
        Some(Self {
            lut: Box::new(build_lut(&gradient.stops)),
            extend: gradient.extend,
            inverse,
            kind,
            opaque: gradient.is_opaque(),
        })
    }

    /// The center of device pixel `(x, y)` in gradient space.
    #[inline]
    fn point_at(&self, x: i32, y: i32) -> Point {
        self.inverse
            .apply(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5))
    }

    #[inline]
    fn color_at(&self, offset: f64) -> u32 {
        let t = match self.extend {
            ExtendMode::Pad => offset.clamp(0.0, 1.0),
            ExtendMode::Repeat => offset - offset.floor(),
            ExtendMode::Reflect => {
                let t = offset.rem_euclid(2.0);
                if t > 1.0 {
                    2.0 - t
                } else {
                    t
                }
            }
        };
        let index = (t * (GRADIENT_LUT_SIZE - 1) as f64 + 0.5) as usize;
        self.lut[index.min(GRADIENT_LUT_SIZE - 1)]
    }
}

/// Moves `focal` inside of the circle around `center`, so that every pixel
/// has a well defined offset.
fn clamp_focal(center: Point, focal: Point, radius: f64) -> Point {
    let dx = focal.x - center.x;
    let dy = focal.y - center.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let max = radius.abs() * MAX_FOCAL_DISTANCE;
    if dist <= max {
        focal
    } else {
        let scale = max / dist;
        Point::new(center.x + dx * scale, center.y + dy * scale)
    }
}

impl PatternFetch {
    fn new(pattern: &Pattern, transform: &Transform) -> Option<Self> {
        let [.., e, f] = transform.0;
        let (ox, oy) = pattern.offset;
        let mapping = if transform.is_translation() && e.fract() == 0.0 && f.fract() == 0.0 {
            PatternMapping::Aligned {
                tx: ox.saturating_add(e as i32),
                ty: oy.saturating_add(f as i32),
            }
        } else {
            let Some(inverse) = transform.invert() else {
                log::debug!("pattern transform is not invertible, nothing is rendered");
                return None;
            };
            PatternMapping::Affine {
                inverse: Transform::translate(-f64::from(ox), -f64::from(oy)).concat(&inverse),
                quality: pattern.quality,
            }
        };
        Some(Self {
            image: pattern.image.clone(),
            mapping,
            extend: pattern.extend,
            opaque: image_is_opaque(&pattern.image),
        })
    }

    /// The premultiplied image pixel at `(x, y)`, after extension.
    #[inline]
    fn texel(&self, x: i32, y: i32) -> u32 {
        let x = extend_coord(x, self.image.width() as i32, self.extend);
        let y = extend_coord(y, self.image.height() as i32, self.extend);
        let px = self.image.pixel(x as u32, y as u32);
        match self.image.format() {
            Format::Prgb32 => px,
            Format::Xrgb32 => px | 0xFF00_0000,
            Format::A8 => {
                let a = px >> 24;
                a << 24 | a << 16 | a << 8 | a
            }
        }
    }
}

fn image_is_opaque(image: &Image) -> bool {
    match image.format() {
        Format::Xrgb32 => true,
        Format::Prgb32 => image.data().chunks_exact(4).all(|px| px[3] == 0xFF),
        Format::A8 => image.data().iter().all(|a| *a == 0xFF),
    }
}

fn extend_coord(v: i32, size: i32, extend: ExtendMode) -> i32 {
    match extend {
        ExtendMode::Pad => v.clamp(0, size - 1),
        ExtendMode::Repeat => v.rem_euclid(size),
        ExtendMode::Reflect => {
            let v = v.rem_euclid(size * 2);
            if v >= size {
                size * 2 - 1 - v
            } else {
                v
            }
        }
    }
}

fn build_lut(stops: &[GradientStop]) -> [u32; GRADIENT_LUT_SIZE] {
    let mut lut = [0_u32; GRADIENT_LUT_SIZE];
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return lut;
    };

    for (i, entry) in lut.iter_mut().enumerate() {
        let t = i as f64 / (GRADIENT_LUT_SIZE - 1) as f64;
        let color = if t <= first.offset {
            first.color
        } else if t >= last.offset {
            last.color
        } else {
            // The stop pair surrounding `t`.
            let j = stops
                .windows(2)
                .position(|w| t >= w[0].offset && t <= w[1].offset)
                .unwrap_or(0);
            let (s0, s1) = (stops[j], stops[j + 1]);
            let span = s1.offset - s0.offset;
            let w = if span > 0.0 { (t - s0.offset) / span } else { 1.0 };
            lerp_color(s0.color, s1.color, w)
        };
        *entry = color.premultiply();
    }
    lut
}

fn lerp_color(c0: Rgba32, c1: Rgba32, w: f64) -> Rgba32 {
    let a = c0.to_array();
    let b = c1.to_array();
    let weight = (w * 256.0) as u32;
    let mix = |x: u8, y: u8| -> u8 {
        ((u32::from(x) * (256 - weight) + u32::from(y) * weight + 128) >> 8) as u8
    };
    Rgba32::new(
        mix(a[0], b[0]),
        mix(a[1], b[1]),
        mix(a[2], b[2]),
        mix(a[3], b[3]),
    )
}

fn fetch_solid(data: &FetchData, _x: i32, _y: i32, out: &mut [u32]) {
    out.fill(data.solid().unwrap_or(0));
}

fn fetch_linear(data: &FetchData, x: i32, y: i32, out: &mut [u32]) {
    let FetchData::Gradient(
        g @ GradientFetch {
            kind: GradientKind::Linear { start, end },
            ..
        },
    ) = data
    else {
        out.fill(0);
        return;
    };
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        out.fill(g.color_at(0.0));
        return;
    }
    // The offset is affine in device space, so only the start and the
    // step along the span are computed.
    let p = g.point_at(x, y);
    let t0 = ((p.x - start.x) * dx + (p.y - start.y) * dy) / len_sq;
    let [a, b, ..] = g.inverse.0;
    let step = (a * dx + b * dy) / len_sq;
    for (i, px) in out.iter_mut().enumerate() {
        *px = g.color_at(t0 + step * i as f64);
    }
}

fn fetch_radial(data: &FetchData, x: i32, y: i32, out: &mut [u32]) {
    let FetchData::Gradient(
        g @ GradientFetch {
            kind:
                GradientKind::Radial {
                    center,
                    focal,
                    radius,
                },
            ..
        },
    ) = data
    else {
        out.fill(0);
        return;
    };
    if *radius <= 0.0 {
        out.fill(g.color_at(1.0));
        return;
    }
    // Offset `t` solves `|p - focal - t * (center - focal)| = t * radius`.
    let cx = center.x - focal.x;
    let cy = center.y - focal.y;
    let a = cx * cx + cy * cy - radius * radius;
    for (i, px) in out.iter_mut().enumerate() {
        let p = g.point_at(x + i as i32, y);
        let px_x = p.x - focal.x;
        let px_y = p.y - focal.y;
        let b = px_x * cx + px_y * cy;
        let c = px_x * px_x + px_y * px_y;
        let disc = (b * b - a * c).max(0.0);
        *px = g.color_at((b - disc.sqrt()) / a);
    }
}

fn fetch_conic(data: &FetchData, x: i32, y: i32, out: &mut [u32]) {
    let FetchData::Gradient(
        g @ GradientFetch {
            kind: GradientKind::Conic { center, angle },
            ..
        },
    ) = data
    else {
        out.fill(0);
        return;
    };
    for (i, px) in out.iter_mut().enumerate() {
        let p = g.point_at(x + i as i32, y);
        let theta = (p.y - center.y).atan2(p.x - center.x) - *angle;
        *px = g.color_at((theta / TAU).rem_euclid(1.0));
    }
}

fn fetch_pattern_aligned(data: &FetchData, x: i32, y: i32, out: &mut [u32]) {
    let FetchData::Pattern(
        p @ PatternFetch {
            mapping: PatternMapping::Aligned { tx, ty },
            ..
        },
    ) = data
    else {
        out.fill(0);
        return;
    };
    let y = y.saturating_sub(*ty);
    for (i, px) in out.iter_mut().enumerate() {
        *px = p.texel(x.saturating_add(i as i32).saturating_sub(*tx), y);
    }
}

/// Calls `sample` with the image-space position of every pixel center of the
/// span, or fills `out` with transparent pixels for non-affine data.
#[inline(always)]
fn for_each_sample(
    data: &FetchData,
    x: i32,
    y: i32,
    out: &mut [u32],
    sample: impl Fn(&PatternFetch, Point) -> u32,
) {
    let FetchData::Pattern(
        p @ PatternFetch {
            mapping: PatternMapping::Affine { inverse, .. },
            ..
        },
    ) = data
    else {
        out.fill(0);
        return;
    };
    let start = inverse.apply(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
    let [a, b, ..] = inverse.0;
    for (i, px) in out.iter_mut().enumerate() {
        let i = i as f64;
        *px = sample(p, Point::new(start.x + a * i, start.y + b * i));
    }
}

fn fetch_pattern_nearest(data: &FetchData, x: i32, y: i32, out: &mut [u32]) {
    for_each_sample(data, x, y, out, |p, s| {
        p.texel(s.x.floor() as i32, s.y.floor() as i32)
    });
}

fn fetch_pattern_bilinear(data: &FetchData, x: i32, y: i32, out: &mut [u32]) {
    for_each_sample(data, x, y, out, |p, s| {
        // Texel centers lie at half-integer positions.
        let sx = s.x - 0.5;
        let sy = s.y - 0.5;
        let (x0, y0) = (sx.floor(), sy.floor());
        let wx = ((sx - x0) * 256.0) as u32;
        let wy = ((sy - y0) * 256.0) as u32;
        let (x0, y0) = (x0 as i32, y0 as i32);
        let (x1, y1) = (x0.saturating_add(1), y0.saturating_add(1));
        let weights = [
            (256 - wx) * (256 - wy),
            wx * (256 - wy),
            (256 - wx) * wy,
            wx * wy,
        ];
        let texels = [p.texel(x0, y0), p.texel(x1, y0), p.texel(x0, y1), p.texel(x1, y1)];
        let channel = |shift: u32| -> u32 {
            let sum: u32 = texels
                .iter()
                .zip(weights)
                .map(|(t, w)| ((t >> shift) & 0xFF) * w)
                .sum();
            ((sum + 0x8000) >> 16).min(255)
        };
        channel(24) << 24 | channel(16) << 16 | channel(8) << 8 | channel(0)
    });
}

/// Converts a premultiplied pixel back into a straight color, rounding to nearest.
pub fn unpremultiply(px: u32) -> Rgba32 {
    let a = px >> 24;
    if a == 0 {
        return Rgba32::TRANSPARENT;
    }
    let un = |c: u32| ((c * 255 + a / 2) / a).min(255);
    Rgba32(a << 24 | un((px >> 16) & 0xFF) << 16 | un((px >> 8) & 0xFF) << 8 | un(px & 0xFF))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;

    fn red_blue() -> [GradientStop; 2] {
        [
            GradientStop::new(0.0, Rgba32(0xFFFF_0000)),
            GradientStop::new(1.0, Rgba32(0xFF00_00FF)),
        ]
    }

    #[test]
    fn lut_endpoints_match_stops() {
        let lut = build_lut(&red_blue());
        assert_eq!(lut[0], 0xFFFF_0000);
        assert_eq!(lut[255], 0xFF00_00FF);
        assert!(lut.iter().all(|c| c >> 24 == 0xFF));
    }

    #[test]
    fn linear_gradient_pads() {
        let gradient = Gradient::linear(Point::new(0.0, 0.0), Point::new(10.0, 0.0), &red_blue());
        let data = FetchData::new(&Style::Gradient(gradient), &Transform::IDENTITY)
            .unwrap();
        assert_eq!(data.kind(), FetchKind::Linear);
        assert!(data.is_opaque());

        let mut out = [0; 16];
        data.fetch(-4, 0, &mut out);
        assert_eq!(out[0], 0xFFFF_0000);
        assert_eq!(out[15], 0xFF00_00FF);
        // Red decreases monotonically along the gradient.
        assert!(out.windows(2).all(|w| (w[0] >> 16) & 0xFF >= (w[1] >> 16) & 0xFF));
    }

    #[test]
    fn radial_gradient_reflects() {
        let gradient = Gradient::radial(Point::new(0.0, 0.0), 4.0, &red_blue())
            .with_extend(ExtendMode::Reflect);
        let data = FetchData::new(&Style::Gradient(gradient), &Transform::IDENTITY)
            .unwrap();
        let mut out = [0; 9];
        data.fetch(0, 0, &mut out);
        // The pixel at distance ~7.5 is reflected back towards the start color.
        assert!(out[7] & 0xFF < out[3] & 0xFF);
        assert!(out[3] & 0xFF > out[0] & 0xFF);
    }

    #[test]
    fn singular_transform_renders_nothing() {
        let gradient = Gradient::linear(Point::new(0.0, 0.0), Point::new(1.0, 0.0), &red_blue());
        let style = Style::Gradient(gradient);
        assert_eq!(FetchData::new(&style, &Transform::scale(0.0, 0.0)), None);
    }

    #[test]
    fn pattern_extends() {
        let mut image = Image::new(2, 1, Format::Prgb32).unwrap();
        image.set_pixel(0, 0, 0xFF11_1111);
        image.set_pixel(1, 0, 0x8022_2222);
        let data = FetchData::from_image(Arc::new(image.clone()), 1, 0);
        assert!(!data.is_opaque());

        let mut out = [0; 4];
        data.fetch(0, 0, &mut out);
        assert_eq!(out, [0xFF11_1111, 0xFF11_1111, 0x8022_2222, 0x8022_2222]);

        let pattern = Pattern::new(Arc::new(image), (0, 0)).with_extend(ExtendMode::Reflect);
        let data = FetchData::new(&Style::Pattern(pattern), &Transform::IDENTITY)
            .unwrap();
        data.fetch(0, 5, &mut out);
        assert_eq!(out, [0xFF11_1111, 0x8022_2222, 0x8022_2222, 0xFF11_1111]);
    }

    fn fetch_one(data: &FetchData, x: i32, y: i32) -> u32 {
        let mut out = [0; 1];
        data.fetch(x, y, &mut out);
        out[0]
    }

    #[test]
    fn focal_radial_starts_at_the_focal_point() {
        let gradient =
            Gradient::focal_radial(Point::new(0.0, 0.0), Point::new(-4.5, 0.5), 8.0, &red_blue());
        let data = FetchData::new(&Style::Gradient(gradient), &Transform::IDENTITY).unwrap();
        assert_eq!(data.kind(), FetchKind::Radial);

        assert_eq!(fetch_one(&data, -5, 0), 0xFFFF_0000);
        // Both pixels are 3 units away from the focal point, but the circle is
        // much closer on the left side.
        let near = fetch_one(&data, -8, 0) & 0xFF;
        let far = fetch_one(&data, -2, 0) & 0xFF;
        assert!(near > 0xD0, "{near}");
        assert!(far < 0x48, "{far}");
    }

    #[test]
    fn focal_point_is_moved_inside() {
        let focal = clamp_focal(Point::new(0.0, 0.0), Point::new(20.0, 0.0), 10.0);
        assert_eq!(focal, Point::new(10.0 * MAX_FOCAL_DISTANCE, 0.0));
        let inside = Point::new(1.0, 2.0);
        assert_eq!(clamp_focal(Point::new(0.0, 0.0), inside, 10.0), inside);
    }

    #[test]
    fn conic_gradient_sweeps_clockwise() {
        let gradient = Gradient::conic(Point::new(0.0, 0.0), 0.0, &red_blue());
        let data = FetchData::new(&Style::Gradient(gradient), &Transform::IDENTITY).unwrap();
        assert_eq!(data.kind(), FetchKind::Conic);

        // Right, below, left and above the center, in the direction of the sweep.
        let blue = [(14, 0), (0, 14), (-15, 0), (0, -15)].map(|(x, y)| fetch_one(&data, x, y) & 0xFF);
        assert!(blue.windows(2).all(|w| w[0] < w[1]), "{blue:?}");
        assert!(blue[0] < 0x08);
    }

    #[test]
    fn scaled_pattern_samples_the_nearest_pixel() {
        let mut image = Image::new(2, 1, Format::Prgb32).unwrap();
        image.set_pixel(0, 0, 0xFF11_1111);
        image.set_pixel(1, 0, 0xFF22_2222);
        let pattern = Pattern::new(Arc::new(image), (0, 0));
        let data = FetchData::new(&Style::Pattern(pattern), &Transform::scale(4.0, 4.0)).unwrap();
        assert_eq!(data.kind(), FetchKind::PatternAffineNearest);

        let mut out = [0; 8];
        data.fetch(0, 3, &mut out);
        assert_eq!(out[..4], [0xFF11_1111; 4]);
        assert_eq!(out[4..], [0xFF22_2222; 4]);
    }

    #[test]
    fn bilinear_pattern_interpolates() {
        let mut image = Image::new(2, 1, Format::Prgb32).unwrap();
        image.set_pixel(0, 0, 0xFF00_0000);
        image.set_pixel(1, 0, 0xFFFF_FFFF);
        let pattern = Pattern::new(Arc::new(image), (0, 0)).with_quality(PatternQuality::Bilinear);
        let data = FetchData::new(&Style::Pattern(pattern), &Transform::scale(2.0, 2.0)).unwrap();
        assert_eq!(data.kind(), FetchKind::PatternAffineBilinear);

        let mut out = [0; 4];
        data.fetch(0, 0, &mut out);
        assert_eq!(out, [0xFF00_0000, 0xFF40_4040, 0xFFBF_BFBF, 0xFFFF_FFFF]);
    }

    #[test]
    fn translated_pattern_stays_aligned() {
        let image = Arc::new(Image::new(2, 2, Format::Prgb32).unwrap());
        let pattern = Pattern::new(image.clone(), (1, 2));
        let data = FetchData::new(&Style::Pattern(pattern.clone()), &Transform::translate(3.0, 0.0))
            .unwrap();
        assert_eq!(data.kind(), FetchKind::PatternAligned);
        assert_eq!(data, FetchData::from_image(image, 4, 2));

        let data = FetchData::new(&Style::Pattern(pattern), &Transform::translate(0.5, 0.0)).unwrap();
        assert_eq!(data.kind(), FetchKind::PatternAffineNearest);
        assert_eq!(
            FetchData::new(
                &Style::Pattern(Pattern::new(Arc::new(Image::new(1, 1, Format::A8).unwrap()), (0, 0))),
                &Transform::scale(0.0, 1.0)
            ),
            None
        );
    }

    #[test]
    fn unpremultiply_round_trips_opaque() {
        assert_eq!(unpremultiply(0xFF12_3456), Rgba32(0xFF12_3456));
        assert_eq!(unpremultiply(0x8080_4000), Rgba32(0x80FF_8000));
    }
}
