// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for basic functionality.

use crate::util::{async_info, framed_square, get_ctx, is_blank, star, sync_info, triangle};
use rasterpipe_cpu::common::geometry::{Point, Rect, RectI, Transform};
use rasterpipe_cpu::common::image::Format;
use rasterpipe_cpu::common::paint::Rgba32;
use rasterpipe_cpu::FillRule;

#[test]
fn box_fill_is_exact() {
    let mut ctx = get_ctx(32, 32, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFFFF_0000));
    ctx.fill_rect_i(&RectI::new(10, 10, 10, 10)).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    for y in 0..32 {
        for x in 0..32 {
            let inside = (10..20).contains(&x) && (10..20).contains(&y);
            let expected = if inside { 0xFFFF_0000 } else { 0 };
            assert_eq!(image.pixel(x, y), expected, "({x}, {y})");
        }
    }
}

#[test]
fn zero_global_alpha_is_a_no_op() {
    let mut ctx = get_ctx(64, 64, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFF00_FF00));
    ctx.set_fill_rule(FillRule::EvenOdd);
    ctx.set_global_alpha(0.0);
    ctx.fill_polygon(&triangle()).unwrap();
    ctx.fill_all().unwrap();
    assert_eq!(ctx.pending_commands(), 0);
    ctx.flush().unwrap();

    assert!(is_blank(ctx.target()));
}

#[test]
fn fractional_rect_edges() {
    let mut ctx = get_ctx(4, 2, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFFFF_FFFF));
    ctx.fill_rect(&Rect::new(0.5, 0.0, 2.0, 1.0)).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(0, 0), 0x8080_8080);
    assert_eq!(image.pixel(1, 0), 0xFFFF_FFFF);
    assert_eq!(image.pixel(2, 0), 0);
    assert_eq!(image.pixel(0, 1), 0);
}

#[test]
fn partial_coverage_rounds_to_nearest() {
    for info in [sync_info(), async_info(2, 8)] {
        let mut ctx = get_ctx(4, 2, Format::A8, info);
        ctx.fill_polygon(&[
            Point::new(0.5, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(0.5, 1.0),
        ])
        .unwrap();
        ctx.fill_rect(&Rect::new(3.0, 0.0, 3.0 + 1.0 / 256.0, 1.0)).unwrap();
        ctx.flush().unwrap();

        let image = ctx.target();
        // Analytic and box coverage agree on half covered pixels.
        assert_eq!(image.pixel(0, 0) >> 24, 0x80);
        assert_eq!(image.pixel(1, 0) >> 24, 0xFF);
        // The smallest coverage is still visible.
        assert_eq!(image.pixel(3, 0) >> 24, 0x01);
    }
}

#[test]
fn aligned_rect_renders_like_integer_rect() {
    let mut a = get_ctx(16, 16, Format::Prgb32, sync_info());
    let mut b = get_ctx(16, 16, Format::Prgb32, sync_info());
    for ctx in [&mut a, &mut b] {
        ctx.set_fill_style(Rgba32(0x8040_2010));
    }
    a.fill_rect(&Rect::new(2.0, 3.0, 9.0, 12.0)).unwrap();
    b.fill_rect_i(&RectI::new(2, 3, 7, 9)).unwrap();
    a.flush().unwrap();
    b.flush().unwrap();

    assert_eq!(a.target(), b.target());
}

#[test]
fn polygon_interior_is_fully_covered() {
    let mut ctx = get_ctx(64, 64, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFF12_3456));
    ctx.fill_polygon(&triangle()).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(20, 20), 0xFF12_3456);
    assert_eq!(image.pixel(2, 2), 0);
    assert_eq!(image.pixel(60, 60), 0);

    // Edge pixels are partially covered and stay premultiplied.
    let mut partial = 0;
    for y in 0..64 {
        for x in 0..64 {
            let px = image.pixel(x, y);
            let a = px >> 24;
            if a != 0 && a != 0xFF {
                partial += 1;
                assert!((px >> 16) & 0xFF <= a);
            }
        }
    }
    assert!(partial > 0);
}

#[test]
fn fill_rules() {
    let render = |fill_rule, draw: &dyn Fn(&mut rasterpipe_cpu::RasterContext)| {
        let mut ctx = get_ctx(64, 64, Format::A8, sync_info());
        ctx.set_fill_rule(fill_rule);
        draw(&mut ctx);
        ctx.flush().unwrap();
        ctx.into_target()
    };
    let draw_star = |ctx: &mut rasterpipe_cpu::RasterContext| {
        ctx.fill_polygon(&star(32.0, 32.0, 28.0)).unwrap();
    };
    let draw_frame = |ctx: &mut rasterpipe_cpu::RasterContext| {
        ctx.fill_path(&framed_square()).unwrap();
    };

    // The center of the star is wound twice.
    assert_eq!(render(FillRule::NonZero, &draw_star).pixel(32, 32) >> 24, 0xFF);
    assert_eq!(render(FillRule::EvenOdd, &draw_star).pixel(32, 32) >> 24, 0);

    let non_zero = render(FillRule::NonZero, &draw_frame);
    let even_odd = render(FillRule::EvenOdd, &draw_frame);
    assert_eq!(non_zero.pixel(24, 24) >> 24, 0xFF);
    assert_eq!(even_odd.pixel(24, 24) >> 24, 0);
    assert_eq!(non_zero.pixel(8, 40) >> 24, 0xFF);
    assert_eq!(even_odd.pixel(8, 40) >> 24, 0xFF);
    assert_eq!(even_odd.pixel(50, 50) >> 24, 0);
}

#[test]
fn transform_translates_boxes() {
    let mut ctx = get_ctx(16, 16, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFFFF_FFFF));
    ctx.set_transform(Transform::translate(5.0, 6.0));
    ctx.fill_rect_i(&RectI::new(0, 0, 2, 2)).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(5, 6), 0xFFFF_FFFF);
    assert_eq!(image.pixel(6, 7), 0xFFFF_FFFF);
    assert_eq!(image.pixel(4, 6), 0);
    assert_eq!(image.pixel(7, 6), 0);
}

#[test]
fn transform_scales_rects() {
    let mut ctx = get_ctx(16, 16, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32(0xFFFF_FFFF));
    ctx.set_transform(Transform::scale(2.0, 2.0));
    ctx.fill_rect_i(&RectI::new(1, 1, 2, 2)).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(2, 2), 0xFFFF_FFFF);
    assert_eq!(image.pixel(5, 5), 0xFFFF_FFFF);
    assert_eq!(image.pixel(6, 6), 0);
    assert_eq!(image.pixel(1, 1), 0);
}

#[test]
fn rotated_rect_is_rasterized() {
    let mut ctx = get_ctx(32, 32, Format::A8, sync_info());
    ctx.set_transform(
        Transform::translate(16.0, 16.0).concat(&Transform::rotate(std::f64::consts::FRAC_PI_4)),
    );
    ctx.fill_rect(&Rect::new(-6.0, -6.0, 6.0, 6.0)).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    assert_eq!(image.pixel(16, 16) >> 24, 0xFF);
    // The corners of the diamond reach further than the unrotated square.
    assert_eq!(image.pixel(16, 9) >> 24, 0xFF);
    assert_eq!(image.pixel(10, 10) >> 24, 0);
}

#[test]
fn geometry_outside_the_target() {
    let mut ctx = get_ctx(16, 16, Format::Prgb32, sync_info());
    ctx.fill_rect_i(&RectI::new(20, 20, 4, 4)).unwrap();
    ctx.fill_rect(&Rect::new(-10.0, -10.0, -2.0, -2.0)).unwrap();
    ctx.fill_polygon(&star(100.0, 100.0, 10.0)).unwrap();
    assert_eq!(ctx.pending_commands(), 0);
    ctx.flush().unwrap();
    assert!(is_blank(ctx.target()));
}
