// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Analytic coverage rasterization of edge storages, one band at a time.
//!
//! Every row a segment crosses receives an exact contribution computed from
//! the segment's end points and the row alone. Suspending an edge at a band
//! boundary therefore only needs the index of the segment it stopped in, and
//! resuming it later produces the same cells as an uninterrupted pass.

use crate::cells::CellBuffer;
use alloc::vec::Vec;
use rasterpipe_common::edge::EdgeStorage;
use rasterpipe_common::error::{Error, Result};
use rasterpipe_common::geometry::PointFx;
use rasterpipe_common::math::{FIXED_MASK, FIXED_ONE, FIXED_SHIFT};

const NIL: u32 = u32::MAX;

/// Rasterization state of one edge vector that survives band boundaries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnalyticActiveEdge {
    /// Index of the first point of the segment being rasterized.
    point: u32,
    /// One past the last point of the vector.
    end: u32,
    /// Winding direction.
    sign: i32,
    /// Next edge of the same list, or `NIL`.
    next: u32,
}

/// A pool of active edges with a free list.
///
/// The pool belongs to one worker. Its capacity can be limited, in which case
/// running out of edges fails the way an exhausted arena would.
#[derive(Debug, Default)]
pub(crate) struct EdgePool {
    edges: Vec<AnalyticActiveEdge>,
    free: u32,
    live: usize,
    limit: Option<usize>,
}

impl EdgePool {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            edges: Vec::new(),
            free: NIL,
            live: 0,
            limit,
        }
    }

    fn alloc(&mut self, edge: AnalyticActiveEdge) -> Result<u32> {
        if self.limit.is_some_and(|limit| self.live >= limit) {
            return Err(Error::OutOfMemory);
        }

        let index = if self.free != NIL {
            let index = self.free;
            self.free = self.edges[index as usize].next;
            self.edges[index as usize] = edge;
            index
        } else {
            self.edges.try_reserve(1)?;
            self.edges.push(edge);
            (self.edges.len() - 1) as u32
        };
        self.live += 1;
        Ok(index)
    }

    fn release(&mut self, index: u32) {
        self.edges[index as usize].next = self.free;
        self.free = index;
        self.live -= 1;
    }

    /// Number of edges handed out and not yet released.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Drops all edges, keeping the allocation.
    pub(crate) fn reset(&mut self) {
        self.edges.clear();
        self.free = NIL;
        self.live = 0;
    }
}

/// Rasterization progress of one analytic command.
///
/// In the synchronous pipeline this lives on the stack for the whole command,
/// in the asynchronous one every worker keeps one per command slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnalyticState {
    /// The next band whose edge bucket hasn't been activated yet.
    next_bucket: usize,
    /// Head of the active edge list.
    active: u32,
}

impl Default for AnalyticState {
    fn default() -> Self {
        Self {
            next_bucket: 0,
            active: NIL,
        }
    }
}

impl AnalyticState {
    /// Starts rasterizing `storage`.
    pub(crate) fn new(storage: &EdgeStorage) -> Self {
        Self {
            next_bucket: storage.band_range().start,
            active: NIL,
        }
    }

    /// Returns `true` once every edge has been activated and fully consumed.
    pub(crate) fn is_done(&self, storage: &EdgeStorage) -> bool {
        self.active == NIL && self.next_bucket >= storage.band_range().end
    }

    /// Returns every active edge to the pool and marks the state as done.
    pub(crate) fn abandon(&mut self, storage: &EdgeStorage, pool: &mut EdgePool) {
        let mut index = self.active;
        while index != NIL {
            let next = pool.edges[index as usize].next;
            pool.release(index);
            index = next;
        }
        self.active = NIL;
        self.next_bucket = storage.band_range().end;
    }
}

/// The band a call to [`rasterize_band`] works on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BandInfo {
    /// Band index.
    pub(crate) index: usize,
    /// First pixel row of the band.
    pub(crate) y0: u32,
    /// One past the last pixel row of the band.
    pub(crate) y1: u32,
}

impl BandInfo {
    pub(crate) fn fixed_y0(&self) -> i32 {
        (self.y0 as i32) << FIXED_SHIFT
    }

    pub(crate) fn fixed_y1(&self) -> i32 {
        (self.y1 as i32) << FIXED_SHIFT
    }
}

/// Accumulates the coverage of `storage` within `band` into `cells`.
///
/// Rows are relative to the band: row 0 of `cells` is `band.y0`. Edges which
/// continue past the band are kept in `state` for the next call, edges that
/// end are returned to `pool`. Bands must be passed in increasing order, but
/// may be skipped.
///
/// On failure the edges already active stay in `state`, the caller decides
/// whether to abandon it.
pub(crate) fn rasterize_band(
    storage: &EdgeStorage,
    state: &mut AnalyticState,
    pool: &mut EdgePool,
    cells: &mut CellBuffer,
    band: BandInfo,
) -> Result<()> {
    debug_assert!(band.y1 - band.y0 <= cells.height());

    // Activate vectors starting in this band or in bands this state skipped.
    let bucket_end = storage.band_range().end.min(band.index + 1);
    while state.next_bucket < bucket_end {
        for vector in storage.band_vectors(state.next_bucket) {
            let index = pool.alloc(AnalyticActiveEdge {
                point: vector.start,
                end: vector.end,
                sign: vector.sign,
                next: state.active,
            })?;
            state.active = index;
        }
        state.next_bucket += 1;
    }

    let points = storage.points();
    let fy0 = band.fixed_y0();
    let fy1 = band.fixed_y1();

    let mut prev = NIL;
    let mut index = state.active;
    while index != NIL {
        let mut edge = pool.edges[index as usize];

        // Skip segments that end above the band.
        while edge.point + 1 < edge.end && points[edge.point as usize + 1].y <= fy0 {
            edge.point += 1;
        }

        // Rasterize segments until one continues below the band.
        let mut done = true;
        while edge.point + 1 < edge.end {
            let p0 = points[edge.point as usize];
            let p1 = points[edge.point as usize + 1];
            if p0.y >= fy1 {
                done = false;
                break;
            }
            rasterize_segment(cells, band, p0, p1, edge.sign);
            if p1.y > fy1 {
                done = false;
                break;
            }
            edge.point += 1;
        }

        let next = edge.next;
        if done {
            if prev == NIL {
                state.active = next;
            } else {
                pool.edges[prev as usize].next = next;
            }
            pool.release(index);
        } else {
            pool.edges[index as usize] = edge;
            prev = index;
        }
        index = next;
    }

    Ok(())
}

/// Rasterizes a whole edge storage into `cells`, starting at row `y0`.
///
/// Used when the cell buffer is tall enough to hold the entire geometry.
#[cfg(test)]
pub(crate) fn rasterize_all(storage: &EdgeStorage, cells: &mut CellBuffer, y0: u32) {
    for vector in storage.vectors() {
        rasterize_vector(storage, vector, cells, y0);
    }
}

#[cfg(test)]
fn rasterize_vector(
    storage: &EdgeStorage,
    vector: &rasterpipe_common::edge::EdgeVector,
    cells: &mut CellBuffer,
    y0: u32,
) {
    let band = BandInfo {
        index: 0,
        y0,
        y1: y0 + cells.height(),
    };
    for w in storage.vector_points(vector).windows(2) {
        rasterize_segment(cells, band, w[0], w[1], vector.sign);
    }
}

/// Accumulates the part of the segment `p0 -> p1` (with `p0.y < p1.y`) inside `band`.
fn rasterize_segment(cells: &mut CellBuffer, band: BandInfo, p0: PointFx, p1: PointFx, sign: i32) {
    debug_assert!(p0.y < p1.y);

    let ya = p0.y.max(band.fixed_y0());
    let yb = p1.y.min(band.fixed_y1());
    if ya >= yb {
        return;
    }

    let mut row_y = ya & !FIXED_MASK;
    while row_y < yb {
        let y_top = ya.max(row_y);
        let y_bottom = yb.min(row_y + FIXED_ONE);
        let xa = x_at(p0, p1, y_top);
        let xb = x_at(p0, p1, y_bottom);
        let row = ((row_y >> FIXED_SHIFT) as u32) - band.y0;
        rasterize_row_piece(cells, row, xa, y_top, xb, y_bottom, sign);
        row_y += FIXED_ONE;
    }
}

/// X of the segment at `y`, rounded towards negative infinity.
///
/// Depends on the segment and `y` only, which keeps suspended and
/// uninterrupted rasterization identical.
#[inline]
fn x_at(p0: PointFx, p1: PointFx, y: i32) -> i32 {
    if y <= p0.y {
        return p0.x;
    }
    if y >= p1.y {
        return p1.x;
    }
    let dx = i64::from(p1.x) - i64::from(p0.x);
    let dy = i64::from(p1.y - p0.y);
    (i64::from(p0.x) + (i64::from(y - p0.y) * dx).div_euclid(dy)) as i32
}

/// Accumulates a line piece contained in a single row, splitting it at pixel columns.
fn rasterize_row_piece(
    cells: &mut CellBuffer,
    row: u32,
    xa: i32,
    ya: i32,
    xb: i32,
    yb: i32,
    sign: i32,
) {
    let x_min = xa.min(xb);
    let x_max = xa.max(xb);
    let col0 = x_min >> FIXED_SHIFT;

    if x_max <= (col0 + 1) << FIXED_SHIFT {
        let base = col0 << FIXED_SHIFT;
        let cover = (yb - ya) * sign;
        let area = cover * ((xa - base) + (xb - base));
        cells.accumulate(row, col0 as u32, cover, area);
        return;
    }

    // Walk the columns from `xa` to `xb`, splitting y at every boundary.
    let dx = i64::from(xb - xa);
    let dy = i64::from(yb - ya);
    let y_at = |x: i32| -> i32 {
        let y = i64::from(ya) + (i64::from(x - xa) * dy).div_euclid(dx);
        y.clamp(i64::from(ya), i64::from(yb)) as i32
    };

    let col1 = (x_max - 1) >> FIXED_SHIFT;
    let (mut px, mut py) = (xa, ya);
    let emit = |cells: &mut CellBuffer, col: i32, x0: i32, y0: i32, x1: i32, y1: i32| {
        let base = col << FIXED_SHIFT;
        let cover = (y1 - y0) * sign;
        let area = cover * ((x0 - base) + (x1 - base));
        cells.accumulate(row, col as u32, cover, area);
    };

    if xa < xb {
        for col in col0..=col1 {
            let boundary = (col + 1) << FIXED_SHIFT;
            let (nx, ny) = if boundary < xb { (boundary, y_at(boundary)) } else { (xb, yb) };
            emit(cells, col, px, py, nx, ny);
            (px, py) = (nx, ny);
        }
    } else {
        for col in (col0..=col1).rev() {
            let boundary = col << FIXED_SHIFT;
            let (nx, ny) = if boundary > xb { (boundary, y_at(boundary)) } else { (xb, yb) };
            emit(cells, col, px, py, nx, ny);
            (px, py) = (nx, ny);
        }
    }
}
