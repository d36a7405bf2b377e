// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning accumulated coverage into 8-bit masks.

use rasterpipe_common::math::{A8Info, BitWord, BIT_WORD_SIZE, PIXELS_PER_ONE_BIT};
use smallvec::SmallVec;

/// Shift between cell values and coverage in `[0, A8Info::SCALE]`.
pub(crate) const CELL_SHIFT: u32 = 9;

/// How overlapping areas of a shape are filled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Non-zero winding.
    #[default]
    NonZero,
    /// Even-odd.
    EvenOdd,
}

impl FillRule {
    /// The mask applied to biased coverage by [`calc_mask`].
    #[inline]
    pub(crate) const fn mask(self) -> u32 {
        match self {
            Self::NonZero => u32::MAX,
            Self::EvenOdd => (A8Info::SCALE as u32) * 2 - 1,
        }
    }
}

/// Value the running coverage starts at, so that both fill rules share [`calc_mask`].
pub(crate) const COVERAGE_BIAS: i32 = A8Info::SCALE << CELL_SHIFT;

/// Scales coverage in `[0, A8Info::SCALE]` by an alpha in `[0, 255]`, rounding
/// to nearest. Full coverage yields `alpha` exactly.
#[inline(always)]
pub(crate) const fn scale_coverage(m: u32, alpha: u32) -> u32 {
    (m * alpha + (A8Info::SCALE as u32 >> 1)) >> A8Info::SHIFT
}

/// Resolves biased coverage into a mask in `[0, 255]`, scaled by `global_alpha`.
#[inline(always)]
pub(crate) fn calc_mask(coverage: i32, fill_rule_mask: u32, global_alpha: u32) -> u32 {
    let masked = ((coverage >> CELL_SHIFT) as u32 & fill_rule_mask) as i32;
    let m = (masked - A8Info::SCALE).unsigned_abs().min(A8Info::SCALE as u32);
    scale_coverage(m, global_alpha)
}

/// How the pixels of a [`RowSpan`] are masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpanMask {
    /// One mask value for the whole span.
    Const(u8),
    /// Per-pixel values, stored in the mask buffer at the same x.
    Var,
}

/// A run of pixels produced by [`resolve_row`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowSpan {
    pub(crate) x0: u32,
    pub(crate) x1: u32,
    pub(crate) mask: SpanMask,
}

/// Spans of one row. Most rows need only a few.
pub(crate) type RowSpans = SmallVec<[RowSpan; 8]>;

/// Resolves one row of cells into spans, clearing every cell and bit it reads.
///
/// `cells` and `bits` are the row as returned by [`CellBuffer::row_mut`],
/// `words` the range of bit words that may be set. Variable
/// masks are written into `masks`, which must hold `width` values. Pixels at
/// or past `width` are read and cleared, but not emitted.
///
/// [`CellBuffer::row_mut`]: crate::cells::CellBuffer::row_mut
#[expect(
    clippy::too_many_arguments,
    reason = "all of them are needed in the innermost loop"
)]
pub(crate) fn resolve_row(
    cells: &mut [i32],
    bits: &mut [BitWord],
    words: core::ops::Range<usize>,
    width: u32,
    fill_rule_mask: u32,
    global_alpha: u32,
    masks: &mut [u8],
    spans: &mut RowSpans,
) {
    let mut coverage = COVERAGE_BIAS;
    let mut x = 0_u32;

    let push_const = |spans: &mut RowSpans, x0: u32, x1: u32, coverage: i32| {
        let x1 = x1.min(width);
        if x0 < x1 {
            let m = calc_mask(coverage, fill_rule_mask, global_alpha);
            if m != 0 {
                spans.push(RowSpan {
                    x0,
                    x1,
                    mask: SpanMask::Const(m as u8),
                });
            }
        }
    };

    for word_index in words {
        let mut word = core::mem::take(&mut bits[word_index]);
        while word != 0 {
            // A run of consecutive set bits.
            let start = word.trailing_zeros() as usize;
            let run = (word >> start).trailing_ones() as usize;
            word = if start + run >= BIT_WORD_SIZE {
                0
            } else {
                word & (BitWord::MAX << (start + run))
            };

            let group0 = word_index * BIT_WORD_SIZE + start;
            let x0 = (group0 * PIXELS_PER_ONE_BIT) as u32;
            let x1 = ((group0 + run) * PIXELS_PER_ONE_BIT) as u32;

            push_const(spans, x, x0, coverage);

            for px in x0..x1 {
                coverage += core::mem::take(&mut cells[px as usize]);
                if px < width {
                    masks[px as usize] = calc_mask(coverage, fill_rule_mask, global_alpha) as u8;
                }
            }

            let vx1 = x1.min(width);
            if x0 < vx1 {
                spans.push(RowSpan {
                    x0,
                    x1: vx1,
                    mask: SpanMask::Var,
                });
            }
            x = x1;
        }
    }

    // Closed geometry returns to the bias; anything else keeps its coverage.
    push_const(spans, x, width, coverage);
}
