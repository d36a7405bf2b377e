// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Destination pixel formats.

use rasterpipe_common::image::Format;

/// Loads and stores destination pixels as `0xAARRGGBB` words.
pub(crate) trait PixelFormat: Send + Sync + 'static {
    const FORMAT: Format;
    const BPP: usize;

    fn load(row: &[u8], x: usize) -> u32;
    fn store(row: &mut [u8], x: usize, px: u32);
}

/// 8-bit alpha. Only the alpha byte of a pixel word is used.
#[derive(Debug)]
pub(crate) struct A8;

impl PixelFormat for A8 {
    const FORMAT: Format = Format::A8;
    const BPP: usize = 1;

    #[inline(always)]
    fn load(row: &[u8], x: usize) -> u32 {
        u32::from(row[x]) << 24
    }

    #[inline(always)]
    fn store(row: &mut [u8], x: usize, px: u32) {
        row[x] = (px >> 24) as u8;
    }
}

/// 32-bit premultiplied ARGB.
#[derive(Debug)]
pub(crate) struct Prgb32;

impl PixelFormat for Prgb32 {
    const FORMAT: Format = Format::Prgb32;
    const BPP: usize = 4;

    #[inline(always)]
    fn load(row: &[u8], x: usize) -> u32 {
        let p: &[u8; 4] = bytemuck::from_bytes(&row[x * 4..x * 4 + 4]);
        u32::from_le_bytes(*p)
    }

    #[inline(always)]
    fn store(row: &mut [u8], x: usize, px: u32) {
        row[x * 4..x * 4 + 4].copy_from_slice(&px.to_le_bytes());
    }
}

/// 32-bit RGB with an alpha byte that always reads and writes as `0xFF`.
#[derive(Debug)]
pub(crate) struct Xrgb32;

impl PixelFormat for Xrgb32 {
    const FORMAT: Format = Format::Xrgb32;
    const BPP: usize = 4;

    #[inline(always)]
    fn load(row: &[u8], x: usize) -> u32 {
        Prgb32::load(row, x) | 0xFF00_0000
    }

    #[inline(always)]
    fn store(row: &mut [u8], x: usize, px: u32) {
        Prgb32::store(row, x, px | 0xFF00_0000);
    }
}
