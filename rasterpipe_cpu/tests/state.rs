// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for saving and restoring the context state.

use crate::util::{async_info, get_ctx, sync_info, triangle};
use rasterpipe_cpu::common::geometry::{RectI, Transform};
use rasterpipe_cpu::common::image::Format;
use rasterpipe_cpu::common::paint::{Rgba32, Style};
use rasterpipe_cpu::{CompOp, Error, FillRule};

#[test]
fn save_and_restore() {
    let mut ctx = get_ctx(16, 16, Format::Prgb32, sync_info());
    ctx.set_comp_op(CompOp::Plus);
    ctx.set_fill_style(Rgba32(0xFF10_2030));
    ctx.save().unwrap();

    ctx.set_comp_op(CompOp::Xor);
    ctx.set_global_alpha(0.25);
    ctx.set_fill_rule(FillRule::EvenOdd);
    ctx.set_fill_style(Rgba32::WHITE);
    ctx.set_transform(Transform::translate(3.0, 4.0));
    ctx.clip_to_rect(&RectI::new(0, 0, 8, 8));
    ctx.restore().unwrap();

    assert_eq!(ctx.comp_op(), CompOp::Plus);
    assert_eq!(ctx.global_alpha(), 1.0);
    assert_eq!(ctx.fill_rule(), FillRule::NonZero);
    assert_eq!(ctx.fill_style(), &Style::Solid(Rgba32(0xFF10_2030)));
    assert_eq!(ctx.transform(), &Transform::IDENTITY);

    ctx.fill_all().unwrap();
    ctx.flush().unwrap();
    assert_eq!(ctx.target().pixel(15, 15), 0xFF10_2030);
}

#[test]
fn restore_without_save() {
    let mut ctx = get_ctx(4, 4, Format::Prgb32, sync_info());
    assert!(matches!(ctx.restore(), Err(Error::InvalidArgument(_))));
    ctx.save().unwrap();
    ctx.restore().unwrap();
    assert!(ctx.restore().is_err());
}

#[test]
fn global_alpha_is_clamped() {
    let mut ctx = get_ctx(4, 4, Format::Prgb32, sync_info());
    ctx.set_global_alpha(2.0);
    assert_eq!(ctx.global_alpha(), 1.0);
    ctx.set_global_alpha(-1.0);
    assert_eq!(ctx.global_alpha(), 0.0);
    ctx.set_global_alpha(f64::NAN);
    assert_eq!(ctx.global_alpha(), 0.0);
}

#[test]
fn clip_limits_every_fill() {
    for info in [sync_info(), async_info(2, 8)] {
        let mut ctx = get_ctx(64, 64, Format::Prgb32, info);
        ctx.set_fill_style(Rgba32::WHITE);
        ctx.clip_to_rect(&RectI::new(10, 12, 30, 20));
        ctx.fill_all().unwrap();
        ctx.fill_polygon(&triangle()).unwrap();
        ctx.flush().unwrap();

        let image = ctx.target();
        for y in 0..64 {
            for x in 0..64 {
                let inside = (10..40).contains(&x) && (12..32).contains(&y);
                let expected = if inside { 0xFFFF_FFFF } else { 0 };
                assert_eq!(image.pixel(x, y), expected, "({x}, {y})");
            }
        }
    }
}

#[test]
fn clips_intersect() {
    let mut ctx = get_ctx(16, 16, Format::A8, sync_info());
    ctx.clip_to_rect(&RectI::new(0, 0, 8, 8));
    ctx.clip_to_rect(&RectI::new(4, 4, 8, 8));
    ctx.fill_all().unwrap();
    ctx.flush().unwrap();

    assert_eq!(ctx.target().pixel(5, 5) >> 24, 0xFF);
    assert_eq!(ctx.target().pixel(3, 3), 0);
    assert_eq!(ctx.target().pixel(9, 9), 0);
}

#[test]
fn restore_clip() {
    let mut ctx = get_ctx(16, 16, Format::A8, sync_info());
    ctx.clip_to_rect(&RectI::new(0, 0, 8, 16));
    ctx.save().unwrap();
    ctx.clip_to_rect(&RectI::new(0, 0, 4, 4));
    ctx.restore_clip();
    ctx.fill_all().unwrap();
    ctx.restore().unwrap();
    ctx.restore_clip();
    ctx.set_global_alpha(0.5);
    ctx.fill_rect_i(&RectI::new(0, 0, 16, 1)).unwrap();
    ctx.flush().unwrap();

    let image = ctx.target();
    // Restored to the saved clip.
    assert_eq!(image.pixel(6, 10) >> 24, 0xFF);
    assert_eq!(image.pixel(10, 10), 0);
    // Restored to the whole target.
    assert_eq!(image.pixel(12, 0) >> 24, 0x80);
}

#[test]
fn apply_transform_concatenates() {
    let mut ctx = get_ctx(16, 16, Format::A8, sync_info());
    ctx.set_transform(Transform::translate(4.0, 0.0));
    ctx.apply_transform(&Transform::scale(2.0, 2.0));
    assert_eq!(ctx.transform(), &Transform([2.0, 0.0, 0.0, 2.0, 4.0, 0.0]));
    ctx.fill_rect_i(&RectI::new(1, 1, 1, 1)).unwrap();
    ctx.flush().unwrap();

    assert_eq!(ctx.target().pixel(6, 2) >> 24, 0xFF);
    assert_eq!(ctx.target().pixel(7, 3) >> 24, 0xFF);
    assert_eq!(ctx.target().pixel(5, 2), 0);
    assert_eq!(ctx.target().pixel(8, 2), 0);
}
