// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.

use rasterpipe_cpu::common::geometry::Point;
use rasterpipe_cpu::common::image::{Format, Image};
use rasterpipe_cpu::common::path::Path;
use rasterpipe_cpu::{ContextCreateInfo, RasterContext};
use std::f64::consts::PI;

pub(crate) fn sync_info() -> ContextCreateInfo {
    ContextCreateInfo::default()
}

pub(crate) fn async_info(thread_count: u16, band_height: u32) -> ContextCreateInfo {
    ContextCreateInfo {
        thread_count,
        band_height,
        ..Default::default()
    }
}

pub(crate) fn get_ctx(width: u32, height: u32, format: Format, info: ContextCreateInfo) -> RasterContext {
    let image = Image::new(width, height, format).unwrap();
    RasterContext::new(image, info).unwrap()
}

/// Renders `draw` into a fresh image with each of the given options.
pub(crate) fn render_with(
    width: u32,
    height: u32,
    format: Format,
    infos: &[ContextCreateInfo],
    draw: impl Fn(&mut RasterContext),
) -> Vec<Image> {
    infos
        .iter()
        .map(|info| {
            let mut ctx = get_ctx(width, height, format, *info);
            draw(&mut ctx);
            ctx.flush().unwrap();
            ctx.into_target()
        })
        .collect()
}

pub(crate) fn assert_images_eq(a: &Image, b: &Image) {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());
    for y in 0..a.height() {
        for x in 0..a.width() {
            assert_eq!(
                a.pixel(x, y),
                b.pixel(x, y),
                "pixel ({x}, {y}) differs: {:08X} vs {:08X}",
                a.pixel(x, y),
                b.pixel(x, y)
            );
        }
    }
}

pub(crate) fn is_blank(image: &Image) -> bool {
    image.data().iter().all(|b| *b == 0)
}

pub(crate) fn triangle() -> Vec<Point> {
    vec![
        Point::new(4.5, 3.25),
        Point::new(58.0, 20.75),
        Point::new(17.25, 61.5),
    ]
}

/// A self-intersecting star, whose center is only filled by the non-zero rule.
pub(crate) fn star(cx: f64, cy: f64, r: f64) -> Vec<Point> {
    (0..5)
        .map(|i| {
            let a = -PI / 2.0 + f64::from(i) * 4.0 * PI / 5.0;
            Point::new(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

/// A regular polygon with `n` vertices.
pub(crate) fn circle(cx: f64, cy: f64, r: f64, n: u32) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let a = f64::from(i) * 2.0 * PI / f64::from(n);
            Point::new(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

/// A square with a square hole, the hole running in the same direction.
pub(crate) fn framed_square() -> Path {
    let mut path = Path::new();
    path.move_to((6.0, 6.0));
    path.line_to((42.0, 6.0));
    path.line_to((42.0, 42.0));
    path.line_to((6.0, 42.0));
    path.close();
    path.move_to((16.0, 16.0));
    path.line_to((32.0, 16.0));
    path.line_to((32.0, 32.0));
    path.line_to((16.0, 32.0));
    path.close();
    path
}
