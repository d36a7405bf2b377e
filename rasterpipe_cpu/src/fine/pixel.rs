// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A pixel whose alternative representations are computed on first use.
//!
//! Composition operators need different views of the same pixel: the packed
//! word, unpacked components, the alpha or the inverted alpha. Only the views
//! an operator asks for are computed, and a solid source keeps them for the
//! whole span.

use bitflags::bitflags;
use rasterpipe_common::math::div_255;

bitflags! {
    /// Views of a [`Pixel`] that have been computed.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub(crate) struct PixelFlags: u8 {
        /// Unpacked components are valid.
        const UC = 1 << 0;
        /// The inverted alpha is valid.
        const UI = 1 << 1;
        /// The pixel is a solid color shared by a whole span.
        const IMMUTABLE = 1 << 2;
    }
}

/// A premultiplied `0xAARRGGBB` pixel.
///
/// Unpacked components are stored as `[b, g, r, a]`, the byte order of the
/// packed word in memory.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pixel {
    flags: PixelFlags,
    pc: u32,
    uc: [u32; 4],
    ui: u32,
}

impl Pixel {
    /// A pixel loaded from the destination or produced by a fetch.
    #[inline(always)]
    pub(crate) fn new(pc: u32) -> Self {
        Self {
            flags: PixelFlags::empty(),
            pc,
            uc: [0; 4],
            ui: 0,
        }
    }

    /// A solid pixel shared by every pixel of a span.
    #[inline(always)]
    pub(crate) fn solid(pc: u32) -> Self {
        Self {
            flags: PixelFlags::IMMUTABLE,
            ..Self::new(pc)
        }
    }

    /// Returns `true` for solid pixels.
    #[inline(always)]
    pub(crate) fn is_immutable(&self) -> bool {
        self.flags.contains(PixelFlags::IMMUTABLE)
    }

    /// The packed word.
    #[inline(always)]
    pub(crate) fn pc(&self) -> u32 {
        self.pc
    }

    /// Unpacked components.
    #[inline(always)]
    pub(crate) fn uc(&mut self) -> [u32; 4] {
        if !self.flags.contains(PixelFlags::UC) {
            self.uc = unpack(self.pc);
            self.flags.insert(PixelFlags::UC);
        }
        self.uc
    }

    /// The alpha component.
    #[inline(always)]
    pub(crate) fn ua(&self) -> u32 {
        self.pc >> 24
    }

    /// `255 - alpha`.
    #[inline(always)]
    pub(crate) fn ui(&mut self) -> u32 {
        if !self.flags.contains(PixelFlags::UI) {
            self.ui = 255 - self.ua();
            self.flags.insert(PixelFlags::UI);
        }
        self.ui
    }

    /// Every component multiplied by `m / 255`.
    ///
    /// Keeps the immutability of `self`, a masked solid pixel is still shared.
    #[inline(always)]
    pub(crate) fn masked(&mut self, m: u32) -> Self {
        let uc = self.uc().map(|c| div_255(c * m));
        Self {
            flags: PixelFlags::UC | (self.flags & PixelFlags::IMMUTABLE),
            pc: pack(uc),
            uc,
            ui: 0,
        }
    }
}

/// Splits a packed word into `[b, g, r, a]`.
#[inline(always)]
pub(crate) fn unpack(px: u32) -> [u32; 4] {
    [px & 0xFF, (px >> 8) & 0xFF, (px >> 16) & 0xFF, px >> 24]
}

/// Packs `[b, g, r, a]`, clamping every component to `[0, 255]`.
#[inline(always)]
pub(crate) fn pack(c: [u32; 4]) -> u32 {
    c[0].min(255) | c[1].min(255) << 8 | c[2].min(255) << 16 | c[3].min(255) << 24
}

/// Packs signed `[b, g, r, a]`, clamping every component to `[0, 255]`.
#[inline(always)]
pub(crate) fn pack_i32(c: [i32; 4]) -> u32 {
    pack(c.map(|v| v.max(0) as u32))
}
