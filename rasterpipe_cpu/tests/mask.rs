// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for filling with an image mask.

use crate::util::{async_info, get_ctx, sync_info};
use rasterpipe_cpu::common::geometry::{RectI, Transform};
use rasterpipe_cpu::common::image::{Format, Image};
use rasterpipe_cpu::common::math::div_255;
use rasterpipe_cpu::common::paint::Rgba32;
use rasterpipe_cpu::Error;
use std::sync::Arc;

const RAMP: [u8; 4] = [0, 64, 128, 255];

fn ramp_mask() -> Arc<Image> {
    Arc::new(Image::from_data(4, 1, Format::A8, RAMP.to_vec()).unwrap())
}

#[test]
fn a8_mask_is_coverage() {
    let mut ctx = get_ctx(4, 2, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32::WHITE);
    ctx.fill_mask(0, 0, ramp_mask()).unwrap();
    ctx.flush().unwrap();

    for (x, m) in RAMP.iter().enumerate() {
        assert_eq!(ctx.target().pixel(x as u32, 0), u32::from(*m) * 0x0101_0101);
        assert_eq!(ctx.target().pixel(x as u32, 1), 0);
    }
}

#[test]
fn mask_with_global_alpha() {
    let mut ctx = get_ctx(4, 1, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32::WHITE);
    ctx.set_global_alpha(128.0 / 255.0);
    ctx.fill_mask(0, 0, ramp_mask()).unwrap();
    ctx.flush().unwrap();

    for (x, m) in RAMP.iter().enumerate() {
        let expected = div_255(u32::from(*m) * 128);
        assert_eq!(ctx.target().pixel(x as u32, 0), expected * 0x0101_0101, "x = {x}");
    }
}

#[test]
fn prgb_mask_uses_alpha() {
    let mut mask = Image::new(2, 1, Format::Prgb32).unwrap();
    mask.set_pixel(0, 0, 0x4020_1000);
    mask.set_pixel(1, 0, 0xFFFF_FFFF);
    let mut ctx = get_ctx(2, 1, Format::A8, sync_info());
    ctx.fill_mask(0, 0, Arc::new(mask)).unwrap();
    ctx.flush().unwrap();

    assert_eq!(ctx.target().pixel(0, 0) >> 24, 0x40);
    assert_eq!(ctx.target().pixel(1, 0) >> 24, 0xFF);
}

#[test]
fn mask_is_clipped() {
    let mut mask = Image::new(3, 3, Format::A8).unwrap();
    mask.fill(0x8000_0000);
    mask.set_pixel(1, 1, 0xFF00_0000);
    let mut ctx = get_ctx(4, 4, Format::Prgb32, sync_info());
    ctx.set_fill_style(Rgba32::WHITE);
    ctx.set_transform(Transform::translate(-1.0, 0.0));
    ctx.clip_to_rect(&RectI::new(0, 0, 4, 1));
    ctx.fill_mask(0, -1, Arc::new(mask)).unwrap();
    ctx.flush().unwrap();

    let target = ctx.target();
    assert_eq!(target.pixel(0, 0), 0xFFFF_FFFF);
    assert_eq!(target.pixel(1, 0), 0x8080_8080);
    assert_eq!(target.pixel(2, 0), 0);
    assert_eq!(target.pixel(0, 1), 0);
}

#[test]
fn mask_renders_the_same_on_workers() {
    let mut mask = Image::new(40, 40, Format::A8).unwrap();
    for y in 0..40 {
        for x in 0..40 {
            mask.set_pixel(x, y, ((x * 6 + y * 3) & 0xFF) << 24);
        }
    }
    let mask = Arc::new(mask);
    let draw = |info| {
        let mut ctx = get_ctx(48, 48, Format::Prgb32, info);
        ctx.set_fill_style(Rgba32(0xC0FF_8040));
        ctx.set_global_alpha(0.7);
        ctx.fill_mask(5, 3, mask.clone()).unwrap();
        ctx.flush().unwrap();
        ctx.into_target()
    };

    assert_eq!(draw(sync_info()), draw(async_info(3, 8)));
}

#[test]
fn xrgb_masks_are_rejected() {
    let mut ctx = get_ctx(4, 4, Format::Prgb32, sync_info());
    let mask = Arc::new(Image::new(2, 2, Format::Xrgb32).unwrap());
    assert!(matches!(
        ctx.fill_mask(0, 0, mask),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(ctx.pending_commands(), 0);
}
