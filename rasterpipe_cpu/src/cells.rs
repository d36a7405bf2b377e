// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-worker coverage cell storage for one band.

use alloc::vec::Vec;
use rasterpipe_common::error::Result;
use rasterpipe_common::math::{align_up, bit_word_count, BitWord, BIT_WORD_SIZE, PIXELS_PER_ONE_BIT};

/// Signed coverage accumulators plus a bit set of touched cell groups.
///
/// Every bit covers [`PIXELS_PER_ONE_BIT`] cells of a row. The rasterizer adds
/// into cells and sets bits, the resolver reads both and leaves them zeroed,
/// so the buffer is all zeros between two uses.
#[derive(Debug, Default)]
pub(crate) struct CellBuffer {
    width: u32,
    height: u32,
    /// Cells per row, a multiple of `PIXELS_PER_ONE_BIT`.
    cell_stride: usize,
    /// Bit words per row.
    bit_stride: usize,
    cells: Vec<i32>,
    bits: Vec<BitWord>,
    min_x: u32,
    max_x: u32,
}

impl CellBuffer {
    /// Creates a buffer for rows of `width` pixels, `height` rows at most.
    pub(crate) fn new(width: u32, height: u32) -> Result<Self> {
        // Geometry clamped to the right clip edge ends up at `width`, which
        // also writes into `width + 1`.
        let cell_stride = align_up(width as usize + 2, PIXELS_PER_ONE_BIT);
        let bit_stride = bit_word_count(cell_stride / PIXELS_PER_ONE_BIT);

        let mut cells = Vec::new();
        cells.try_reserve_exact(cell_stride * height as usize)?;
        cells.resize(cell_stride * height as usize, 0);

        let mut bits = Vec::new();
        bits.try_reserve_exact(bit_stride * height as usize)?;
        bits.resize(bit_stride * height as usize, 0);

        Ok(Self {
            width,
            height,
            cell_stride,
            bit_stride,
            cells,
            bits,
            min_x: u32::MAX,
            max_x: 0,
        })
    }

    /// Width of the destination in pixels.
    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    /// Maximum number of rows.
    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    /// Forgets the bounds recorded since the last call.
    #[inline]
    pub(crate) fn reset_bounds(&mut self) {
        self.min_x = u32::MAX;
        self.max_x = 0;
    }

    /// Returns `true` if any cell was touched since [`CellBuffer::reset_bounds`].
    #[inline]
    pub(crate) fn has_bounds(&self) -> bool {
        self.min_x <= self.max_x
    }

    /// The touched cell range, inclusive.
    #[inline]
    pub(crate) fn bounds(&self) -> (u32, u32) {
        (self.min_x, self.max_x)
    }

    /// Accumulates one edge piece in cell `x` of `row`.
    ///
    /// `cover` is the signed height of the piece and `area` is `cover`
    /// multiplied by the sum of the piece's horizontal offsets inside the cell.
    #[inline]
    pub(crate) fn accumulate(&mut self, row: u32, x: u32, cover: i32, area: i32) {
        debug_assert!(row < self.height);
        debug_assert!((x as usize) + 1 < self.cell_stride);

        let base = row as usize * self.cell_stride + x as usize;
        self.cells[base] += (cover << 9) - area;
        self.cells[base + 1] += area;

        let bits = &mut self.bits[row as usize * self.bit_stride..][..self.bit_stride];
        for cx in [x, x + 1] {
            let bit = cx as usize / PIXELS_PER_ONE_BIT;
            bits[bit / BIT_WORD_SIZE] |= 1 << (bit % BIT_WORD_SIZE);
        }

        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x + 1);
    }

    /// The cells and bit words of `row`.
    #[inline]
    pub(crate) fn row_mut(&mut self, row: u32) -> (&mut [i32], &mut [BitWord]) {
        let cells = &mut self.cells[row as usize * self.cell_stride..][..self.cell_stride];
        let bits = &mut self.bits[row as usize * self.bit_stride..][..self.bit_stride];
        (cells, bits)
    }

    /// Returns `true` if every cell and bit is zero.
    #[cfg(test)]
    pub(crate) fn is_clear(&self) -> bool {
        self.cells.iter().all(|c| *c == 0) && self.bits.iter().all(|b| *b == 0)
    }

    /// Running coverage sums of `row`, without the resolver's bias. Doesn't clear.
    #[cfg(test)]
    pub(crate) fn coverage_row(&self, row: u32) -> Vec<i32> {
        let cells = &self.cells[row as usize * self.cell_stride..][..self.cell_stride];
        let mut acc = 0;
        cells[..self.width as usize]
            .iter()
            .map(|c| {
                acc += *c;
                acc
            })
            .collect()
    }

    /// Zeroes all cells and bits.
    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        self.cells.fill(0);
        self.bits.fill(0);
        self.reset_bounds();
    }
}
