// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-point constants and integer helpers shared by the rasterizer and compositor.

/// Number of fractional bits of a fixed-point coordinate (24.8).
pub const FIXED_SHIFT: u32 = 8;
/// One pixel in fixed-point units.
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;
/// Mask extracting the fractional part of a fixed-point coordinate.
pub const FIXED_MASK: i32 = FIXED_ONE - 1;

/// The largest magnitude accepted for a fixed-point coordinate.
///
/// Coordinates are clamped to this range before clipping so that the products
/// computed by the rasterizer always fit in 64 bits.
pub const FIXED_LIMIT: i32 = 1 << 29;

/// Coverage precision used by the analytic rasterizer and the mask resolver.
pub struct A8Info;

impl A8Info {
    /// Coverage shift; full coverage is `1 << SHIFT`.
    pub const SHIFT: u32 = 8;
    /// Full coverage.
    pub const SCALE: i32 = 1 << Self::SHIFT;
    /// Mask of the coverage bits.
    pub const MASK: i32 = Self::SCALE - 1;
}

/// How many pixels a single bit of the occupancy bit set represents.
pub const PIXELS_PER_ONE_BIT: usize = 4;

/// A word of an occupancy bit set.
pub type BitWord = u64;
/// Number of bits in a [`BitWord`].
pub const BIT_WORD_SIZE: usize = BitWord::BITS as usize;

/// Number of [`BitWord`]s required to hold `bits` bits.
#[inline]
pub const fn bit_word_count(bits: usize) -> usize {
    bits.div_ceil(BIT_WORD_SIZE)
}

/// Rounds `x` up to the next multiple of `alignment`, which must be a power of two.
#[inline]
pub const fn align_up(x: usize, alignment: usize) -> usize {
    (x + alignment - 1) & !(alignment - 1)
}

/// Converts a floating-point coordinate into 24.8 fixed point.
///
/// NaN maps to zero; the caller is expected to reject non-finite input earlier.
#[inline]
pub fn fixed_from_f64(v: f64) -> i32 {
    let scaled = (v * f64::from(FIXED_ONE)).round();
    scaled.clamp(-f64::from(FIXED_LIMIT), f64::from(FIXED_LIMIT)) as i32
}

/// Divides by 255 with rounding, exactly, for `x` in `0..=65535`.
#[inline(always)]
pub const fn div_255(x: u32) -> u32 {
    ((x + 128) * 257) >> 16
}

/// Signed variant of [`div_255`], rounding half away from zero.
#[inline(always)]
pub const fn div_255_signed(x: i32) -> i32 {
    if x >= 0 {
        div_255(x as u32) as i32
    } else {
        -(div_255(x.unsigned_abs()) as i32)
    }
}

/// Integer square root of a 64-bit value.
pub fn isqrt(x: u64) -> u64 {
    if x < 2 {
        return x;
    }

    // Newton iteration starting from an overestimate.
    let mut r = 1_u64 << (64 - x.leading_zeros()).div_ceil(2);
    loop {
        let next = (r + x / r) / 2;
        if next >= r {
            return r;
        }
        r = next;
    }
}
