// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for gradient and image sources.

use crate::util::{async_info, circle, get_ctx, is_blank, sync_info};
use rasterpipe_cpu::common::geometry::{Point, RectI, Transform};
use rasterpipe_cpu::common::image::{Format, Image};
use rasterpipe_cpu::common::paint::{
    ExtendMode, Gradient, GradientStop, Pattern, PatternQuality, Rgba32,
};
use rasterpipe_cpu::{CompOp, Error};
use std::sync::Arc;

fn checker() -> Arc<Image> {
    let mut image = Image::new(2, 2, Format::Prgb32).unwrap();
    image.set_pixel(0, 0, 0xFFFF_0000);
    image.set_pixel(1, 0, 0xFF00_FF00);
    image.set_pixel(0, 1, 0xFF00_00FF);
    image.set_pixel(1, 1, 0xFFFF_FFFF);
    Arc::new(image)
}

#[test]
fn linear_gradient_is_monotonic() {
    let mut ctx = get_ctx(64, 8, Format::Prgb32, sync_info());
    ctx.set_fill_style(Gradient::linear(
        Point::new(0.0, 0.0),
        Point::new(64.0, 0.0),
        &[
            GradientStop::new(0.0, Rgba32::BLACK),
            GradientStop::new(1.0, Rgba32::WHITE),
        ],
    ));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    let mut last = 0;
    for x in 0..64 {
        let px = image.pixel(x, 0);
        assert_eq!(px >> 24, 0xFF);
        let red = (px >> 16) & 0xFF;
        assert!(red >= last, "x = {x}");
        last = red;
        // Every row is the same.
        assert_eq!(image.pixel(x, 7), px);
    }
    assert!(image.pixel(0, 0) & 0xFF < 0x08);
    assert!(image.pixel(63, 0) & 0xFF > 0xF7);
}

#[test]
fn radial_gradient_pads_with_the_last_stop() {
    let mut ctx = get_ctx(32, 32, Format::Prgb32, sync_info());
    ctx.set_fill_style(Gradient::radial(
        Point::new(16.0, 16.0),
        8.0,
        &[
            GradientStop::new(0.0, Rgba32(0xFFFF_0000)),
            GradientStop::new(1.0, Rgba32(0xFF00_00FF)),
        ],
    ));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(0, 0), 0xFF00_00FF);
    assert_eq!(image.pixel(31, 16), 0xFF00_00FF);
    let center = image.pixel(15, 15);
    assert!((center >> 16) & 0xFF > 0xE0);
    assert!(center & 0xFF < 0x20);
}

#[test]
fn focal_radial_gradient() {
    let stops = [
        GradientStop::new(0.0, Rgba32(0xFFFF_0000)),
        GradientStop::new(1.0, Rgba32(0xFF00_00FF)),
    ];
    let mut ctx = get_ctx(32, 32, Format::Prgb32, sync_info());
    ctx.set_fill_style(Gradient::focal_radial(
        Point::new(16.0, 16.0),
        Point::new(8.5, 16.5),
        12.0,
        &stops,
    ));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(8, 16), 0xFFFF_0000);
    // Offsets grow faster towards the side of the circle closest to the focal point.
    let left = image.pixel(5, 16) & 0xFF;
    let right = image.pixel(11, 16) & 0xFF;
    assert!(left > right, "{left} <= {right}");
    assert_eq!(image.pixel(31, 16), 0xFF00_00FF);
}

#[test]
fn conic_gradient() {
    let mut ctx = get_ctx(32, 32, Format::Prgb32, sync_info());
    ctx.set_fill_style(Gradient::conic(
        Point::new(16.0, 16.0),
        0.0,
        &[
            GradientStop::new(0.0, Rgba32::BLACK),
            GradientStop::new(1.0, Rgba32::WHITE),
        ],
    ));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    let red = [(30, 16), (16, 30), (2, 16), (16, 2)].map(|(x, y)| (image.pixel(x, y) >> 16) & 0xFF);
    assert!(red.windows(2).all(|w| w[0] < w[1]), "{red:?}");
    // Every pixel is opaque, even at the center.
    assert!((0..32).all(|x| image.pixel(x, 16) >> 24 == 0xFF));
}

#[test]
fn conic_gradient_renders_the_same_on_workers() {
    let draw = |info| {
        let mut ctx = get_ctx(64, 64, Format::Prgb32, info);
        ctx.set_transform(Transform::rotate(0.3));
        ctx.set_fill_style(Gradient::conic(
            Point::new(40.0, 20.0),
            1.0,
            &[
                GradientStop::new(0.0, Rgba32(0xFF20_4060)),
                GradientStop::new(0.5, Rgba32(0x80FF_FFFF)),
                GradientStop::new(1.0, Rgba32(0xFF20_4060)),
            ],
        ));
        ctx.fill_polygon(&circle(30.0, 30.0, 28.0, 32)).unwrap();
        ctx.flush().unwrap();
        ctx.into_target()
    };

    assert_eq!(draw(sync_info()), draw(async_info(3, 8)));
}

#[test]
fn gradient_follows_the_transform() {
    let stops = [
        GradientStop::new(0.0, Rgba32::BLACK),
        GradientStop::new(1.0, Rgba32::WHITE),
    ];
    let mut a = get_ctx(32, 32, Format::Prgb32, sync_info());
    a.set_fill_style(Gradient::linear(Point::new(8.0, 0.0), Point::new(24.0, 0.0), &stops));
    a.fill_all().unwrap();
    a.flush().unwrap();

    let mut b = get_ctx(32, 32, Format::Prgb32, sync_info());
    b.set_transform(Transform::translate(8.0, 0.0));
    b.set_fill_style(Gradient::linear(Point::new(0.0, 0.0), Point::new(16.0, 0.0), &stops));
    b.reset_transform();
    b.fill_all().unwrap();
    b.flush().unwrap();

    // Styles are resolved with the transform that is current when filling.
    let mut c = get_ctx(32, 32, Format::Prgb32, sync_info());
    c.set_fill_style(Gradient::linear(Point::new(0.0, 0.0), Point::new(16.0, 0.0), &stops));
    c.set_transform(Transform::translate(8.0, 0.0));
    c.fill_rect_i(&RectI::new(-8, 0, 40, 32)).unwrap();
    c.flush().unwrap();

    assert_eq!(a.target(), c.target());
    assert_ne!(a.target(), b.target());
}

#[test]
fn repeating_pattern() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    let image = checker();
    ctx.set_fill_style(Pattern::new(image.clone(), (0, 0)).with_extend(ExtendMode::Repeat));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let target = ctx.target();
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(target.pixel(x, y), image.pixel(x % 2, y % 2), "({x}, {y})");
        }
    }
}

#[test]
fn padded_pattern_with_offset() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    ctx.set_fill_style(Pattern::new(checker(), (3, 4)));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let target = ctx.target();
    assert_eq!(target.pixel(0, 0), 0xFFFF_0000);
    assert_eq!(target.pixel(4, 4), 0xFF00_FF00);
    assert_eq!(target.pixel(7, 7), 0xFFFF_FFFF);
    assert_eq!(target.pixel(0, 7), 0xFF00_00FF);
}

#[test]
fn patterns_render_the_same_on_workers() {
    let draw = |info| {
        let mut ctx = get_ctx(64, 64, Format::Prgb32, info);
        ctx.set_fill_style(Pattern::new(checker(), (1, 1)).with_extend(ExtendMode::Reflect));
        ctx.set_global_alpha(0.8);
        ctx.fill_polygon(&circle(30.0, 34.0, 25.0, 40)).unwrap();
        ctx.flush().unwrap();
        ctx.into_target()
    };

    assert_eq!(draw(sync_info()), draw(async_info(4, 8)));
}

#[test]
fn scaled_pattern() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    ctx.set_transform(Transform::scale(4.0, 4.0));
    ctx.set_fill_style(Pattern::new(checker(), (0, 0)));
    ctx.fill_rect_i(&RectI::new(0, 0, 2, 2)).unwrap();
    ctx.flush().unwrap();

    let target = ctx.target();
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(target.pixel(x, y), checker().pixel(x / 4, y / 4), "({x}, {y})");
        }
    }
}

#[test]
fn bilinear_pattern_blends_neighbors() {
    let mut ctx = get_ctx(4, 2, Format::Prgb32, sync_info());
    ctx.set_transform(Transform::scale(2.0, 2.0));
    ctx.set_fill_style(Pattern::new(checker(), (0, 0)).with_quality(PatternQuality::Bilinear));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    let target = ctx.target();
    // Pixel centers at a quarter of a texel are weighted 3:1.
    assert_eq!(target.pixel(0, 0), 0xFFFF_0000);
    let mixed = target.pixel(1, 0);
    assert_eq!(mixed >> 24, 0xFF);
    assert!((mixed >> 16) & 0xFF > 0xB0 && (mixed >> 8) & 0xFF > 0x30, "{mixed:08X}");
    assert_eq!(target.pixel(3, 0), 0xFF00_FF00);
}

#[test]
fn transformed_patterns_render_the_same_on_workers() {
    for quality in [PatternQuality::Nearest, PatternQuality::Bilinear] {
        let draw = |info| {
            let mut ctx = get_ctx(64, 64, Format::Prgb32, info);
            ctx.set_transform(Transform::rotate(0.5).concat(&Transform::scale(3.0, 2.0)));
            ctx.set_fill_style(
                Pattern::new(checker(), (2, 1))
                    .with_extend(ExtendMode::Repeat)
                    .with_quality(quality),
            );
            ctx.fill_rect_i(&RectI::new(0, 0, 16, 24)).unwrap();
            ctx.flush().unwrap();
            ctx.into_target()
        };

        assert_eq!(draw(sync_info()), draw(async_info(4, 8)));
    }
}

#[test]
fn singular_pattern_transform_renders_nothing() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    ctx.set_fill_style(Pattern::new(checker(), (0, 0)));
    ctx.set_transform(Transform::scale(0.0, 1.0));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();
    assert!(is_blank(ctx.target()));
    assert_eq!(ctx.live_fetch_data(), 0);
}

#[test]
fn blit_image() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    ctx.set_transform(Transform::translate(1.0, 0.0));
    ctx.blit_image(2, 3, checker()).unwrap();
    ctx.flush().unwrap();

    let target = ctx.target();
    assert_eq!(target.pixel(3, 3), 0xFFFF_0000);
    assert_eq!(target.pixel(4, 3), 0xFF00_FF00);
    assert_eq!(target.pixel(3, 4), 0xFF00_00FF);
    assert_eq!(target.pixel(4, 4), 0xFFFF_FFFF);
    assert_eq!(target.pixel(2, 3), 0);
    assert_eq!(target.pixel(5, 5), 0);
}

#[test]
fn blit_image_with_an_operator() {
    let mut ctx = get_ctx(4, 4, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFF80_8080));
    ctx.fill_all().unwrap();
    ctx.set_comp_op(CompOp::Plus);
    ctx.blit_image(0, 0, checker()).unwrap();
    ctx.flush().unwrap();

    assert_eq!(ctx.target().pixel(0, 0), 0xFFFF_8080);
    assert_eq!(ctx.target().pixel(1, 1), 0xFFFF_FFFF);
}

#[test]
fn blit_image_needs_a_translation() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    ctx.set_transform(Transform::scale(2.0, 2.0));
    assert!(matches!(
        ctx.blit_image(0, 0, checker()),
        Err(Error::InvalidArgument(_))
    ));
    ctx.set_transform(Transform::translate(0.5, 0.0));
    assert!(matches!(
        ctx.blit_image(0, 0, checker()),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(ctx.pending_commands(), 0);
}

#[test]
fn images_far_outside_the_target() {
    let mut ctx = get_ctx(8, 8, Format::Prgb32, sync_info());
    ctx.blit_image(i32::MAX - 1, 0, checker()).unwrap();
    ctx.blit_image(0, i32::MIN + 1, checker()).unwrap();
    ctx.fill_mask(i32::MAX - 1, 0, checker()).unwrap();
    ctx.set_transform(Transform::translate(-4.0, 0.0));
    ctx.blit_image(i32::MIN + 1, 0, checker()).unwrap();
    ctx.set_transform(Transform::translate(4.0, 0.0));
    ctx.fill_mask(i32::MAX - 2, 0, checker()).unwrap();
    ctx.flush().unwrap();
    assert!(is_blank(ctx.target()));
}
