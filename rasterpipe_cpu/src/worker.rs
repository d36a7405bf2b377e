// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Processing commands band by band.
//!
//! The same command procedures serve both pipelines. The synchronous one
//! takes a command and walks it down every band it touches before moving on
//! to the next command. The asynchronous one takes a band and walks every
//! command still pending in it, keeping the rasterization state of analytic
//! commands between the bands a worker claims.

use crate::batch::RenderBatch;
use crate::cells::CellBuffer;
use crate::command::{CommandSource, Payload, RenderCommand};
use crate::fine::pipe::{FillFunc, FillMaskFn};
use crate::fine::span::{MaskCommand, Source, SourceCtx};
use crate::rasterizer::{rasterize_band, AnalyticState, BandInfo, EdgePool};
use crate::region::Region;
use crate::resolver::scale_coverage;
use alloc::vec::Vec;
use rasterpipe_common::error::{ErrorFlags, Result};
use rasterpipe_common::fetch_pool::FetchDataPool;
use rasterpipe_common::geometry::BoxI;
use rasterpipe_common::image::{Format, Image};
use rasterpipe_common::math::{bit_word_count, BitWord, BIT_WORD_SIZE, FIXED_MASK, FIXED_SHIFT};
use smallvec::SmallVec;

/// Resources owned by one worker.
#[derive(Debug)]
pub(crate) struct WorkData {
    band_height: u32,
    cells: CellBuffer,
    edge_pool: EdgePool,
    error_flags: ErrorFlags,
    /// Fetched source pixels of one span.
    scratch: Vec<u32>,
    /// Mask values of one row.
    masks: Vec<u8>,
    /// Rasterization states of analytic commands, by state slot.
    states: Vec<Option<AnalyticState>>,
    /// One bit per command not completed by this worker yet.
    pending: Vec<BitWord>,
    bands_processed: usize,
}

impl WorkData {
    pub(crate) fn new(width: u32, band_height: u32, work_zone_limit: Option<usize>) -> Result<Self> {
        let mut masks = Vec::new();
        masks.try_reserve_exact(width as usize)?;
        masks.resize(width as usize, 0);

        Ok(Self {
            band_height,
            cells: CellBuffer::new(width, band_height)?,
            edge_pool: EdgePool::new(work_zone_limit),
            error_flags: ErrorFlags::NONE,
            scratch: Vec::new(),
            masks,
            states: Vec::new(),
            pending: Vec::new(),
            bands_processed: 0,
        })
    }

    /// Marks every command of `batch` as pending.
    ///
    /// Returns `false` if the worker can't take part in the batch.
    pub(crate) fn begin_batch(&mut self, batch: &RenderBatch) -> bool {
        self.edge_pool.reset();
        self.states.clear();
        self.pending.clear();
        self.bands_processed = 0;

        let count = batch.commands().len();
        let words = bit_word_count(count);
        if self.states.try_reserve(batch.state_slot_count()).is_err()
            || self.pending.try_reserve(words).is_err()
        {
            log::warn!("worker can't track {count} commands, skipping the batch");
            self.error_flags.insert(ErrorFlags::OUT_OF_MEMORY);
            return false;
        }
        self.states.resize(batch.state_slot_count(), None);
        self.pending.resize(words, BitWord::MAX);
        let tail = count % BIT_WORD_SIZE;
        if tail != 0 {
            self.pending[words - 1] = (1 << tail) - 1;
        }
        true
    }

    /// Returns the errors accumulated since the last call.
    pub(crate) fn finish_batch(&mut self) -> ErrorFlags {
        log::trace!(
            "worker processed {} bands, {} edges still pooled",
            self.bands_processed,
            self.edge_pool.live()
        );
        core::mem::take(&mut self.error_flags)
    }

    pub(crate) fn insert_error_flags(&mut self, flags: ErrorFlags) {
        self.error_flags |= flags;
    }

    /// Processes the pending commands of one band.
    ///
    /// Bands must be passed in increasing order.
    pub(crate) fn process_band(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        region: &mut Region<'_>,
    ) {
        self.bands_processed += 1;
        let commands = batch.commands();

        for word_index in 0..self.pending.len() {
            let mut bits = self.pending[word_index];
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;

                let command = commands.get(word_index * BIT_WORD_SIZE + bit);
                let done = match batch.command_y0(command) {
                    None => true,
                    // Not reached yet.
                    Some(y0) if y0 >= region.y1() => false,
                    Some(_) => self.process_pending(batch, fetch_pool, command, region),
                };
                if done {
                    self.pending[word_index] &= !(1 << bit);
                }
            }
        }
    }

    fn process_pending(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        command: &RenderCommand,
        region: &mut Region<'_>,
    ) -> bool {
        let Payload::FillAnalytic {
            edge_slot,
            state_slot,
            ..
        } = command.payload
        else {
            let mut unused = AnalyticState::default();
            return self.process_command(batch, fetch_pool, command, region, &mut unused);
        };

        let mut state = *self.states[state_slot]
            .get_or_insert_with(|| AnalyticState::new(batch.edges(edge_slot)));
        let done = self.process_command(batch, fetch_pool, command, region, &mut state);
        self.states[state_slot] = Some(state);
        done
    }

    /// Processes every command, each over all bands it touches.
    pub(crate) fn process_sync(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        regions: &mut [Region<'_>],
    ) {
        self.bands_processed += regions.len();
        for command in batch.commands().iter() {
            let Some(y0) = batch.command_y0(command) else {
                continue;
            };

            let mut state = match command.payload {
                Payload::FillAnalytic { edge_slot, .. } => AnalyticState::new(batch.edges(edge_slot)),
                _ => AnalyticState::default(),
            };
            let first = (y0 / self.band_height) as usize;
            let mut done = false;
            for region in regions.iter_mut().skip(first) {
                if self.process_command(batch, fetch_pool, command, region, &mut state) {
                    done = true;
                    break;
                }
            }
            if !done {
                if let Payload::FillAnalytic { edge_slot, .. } = command.payload {
                    state.abandon(batch.edges(edge_slot), &mut self.edge_pool);
                }
            }
        }
    }

    /// Processes `command` within the rows of `region`.
    ///
    /// Returns `true` if the command has nothing left to do in later bands.
    pub(crate) fn process_command(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        command: &RenderCommand,
        region: &mut Region<'_>,
        state: &mut AnalyticState,
    ) -> bool {
        let Self {
            cells,
            edge_pool,
            error_flags,
            scratch,
            masks,
            ..
        } = self;

        let source = match command.source {
            CommandSource::Solid(color) => Source::Solid(color),
            CommandSource::FetchData(id) => {
                let data = fetch_pool.get(id).data();
                let fetch = command.dispatch.fetch_func.unwrap_or_else(|| data.fetch_func());
                Source::Fetch(data, fetch)
            }
        };
        let mut src = SourceCtx::new(source, scratch);
        let band_y1 = region.y1();

        match (&command.payload, command.dispatch.fill_func) {
            (Payload::FillBoxA { bx }, FillFunc::BoxA(fill)) => {
                let clipped = bx.intersect(&band_box(region));
                if !clipped.is_empty() {
                    fill(region, clipped, command.alpha, &mut src);
                }
                bx.y1 as u32 <= band_y1
            }
            (Payload::FillBoxU { bx }, FillFunc::Mask(fill)) => {
                fill_box_u(region, *bx, command.alpha, fill, &mut src);
                bx.y1 <= (band_y1 as i32) << FIXED_SHIFT
            }
            (
                Payload::FillAnalytic {
                    edge_slot,
                    fill_rule,
                    ..
                },
                FillFunc::Analytic(fill),
            ) => {
                let edges = batch.edges(*edge_slot);
                if edges.is_empty() {
                    return true;
                }

                let band = BandInfo {
                    index: region.index,
                    y0: region.y0,
                    y1: band_y1,
                };
                if let Err(err) = rasterize_band(edges, state, edge_pool, cells, band) {
                    log::warn!("dropping the rest of an analytic fill in band {}: {err}", band.index);
                    error_flags.insert(ErrorFlags::OUT_OF_MEMORY);
                    state.abandon(edges, edge_pool);
                }
                // Consumes the cells even after a failure, they must be clear
                // for the next command.
                fill(
                    region,
                    cells,
                    masks,
                    fill_rule.mask(),
                    u32::from(command.alpha),
                    &mut src,
                );
                state.is_done(edges)
            }
            (Payload::FillBoxMaskA { bx, mask, offset }, FillFunc::Mask(fill)) => {
                fill_box_mask_a(region, *bx, mask, *offset, command.alpha, fill, masks, &mut src);
                bx.y1 as u32 <= band_y1
            }
            (payload, fill_func) => {
                unreachable!("{fill_func:?} can't process {payload:?}")
            }
        }
    }
}

fn band_box(region: &Region<'_>) -> BoxI {
    BoxI::new(0, region.y0 as i32, region.width as i32, region.y1() as i32)
}

/// Mask commands of one row of a fixed-point box.
///
/// `cy` is the vertical coverage of the row, the left and right pixels get
/// their horizontal coverage multiplied in.
fn box_u_row(fx0: i32, fx1: i32, cy: i32, alpha: u8) -> SmallVec<[MaskCommand<'static>; 3]> {
    let mask = |cx: i32| scale_coverage(((cx * cy) >> FIXED_SHIFT) as u32, u32::from(alpha)) as u8;

    let x0 = fx0 >> FIXED_SHIFT;
    let x1 = (fx1 + FIXED_MASK) >> FIXED_SHIFT;
    let cmask = |x0: i32, x1: i32, mask: u8| MaskCommand::CMask {
        x0: x0 as u32,
        x1: x1 as u32,
        mask,
    };

    let mut commands = SmallVec::new();
    if x1 - x0 == 1 {
        commands.push(cmask(x0, x1, mask(fx1 - fx0)));
        return commands;
    }
    commands.push(cmask(x0, x0 + 1, mask(((x0 + 1) << FIXED_SHIFT) - fx0)));
    if x1 - x0 > 2 {
        commands.push(cmask(x0 + 1, x1 - 1, mask(1 << FIXED_SHIFT)));
    }
    commands.push(cmask(x1 - 1, x1, mask(fx1 - ((x1 - 1) << FIXED_SHIFT))));
    commands
}

fn fill_box_u(
    region: &mut Region<'_>,
    bx: BoxI,
    alpha: u8,
    fill: FillMaskFn,
    src: &mut SourceCtx<'_>,
) {
    let fy0 = bx.y0.max((region.y0 as i32) << FIXED_SHIFT);
    let fy1 = bx.y1.min((region.y1() as i32) << FIXED_SHIFT);
    if fy0 >= fy1 {
        return;
    }

    for y in (fy0 >> FIXED_SHIFT)..((fy1 + FIXED_MASK) >> FIXED_SHIFT) {
        let cy = fy1.min((y + 1) << FIXED_SHIFT) - fy0.max(y << FIXED_SHIFT);
        let commands = box_u_row(bx.x0, bx.x1, cy, alpha);
        fill(region, y as u32, &commands, src);
    }
}

#[allow(clippy::too_many_arguments, reason = "mirrors the other fill procedures")]
fn fill_box_mask_a(
    region: &mut Region<'_>,
    bx: BoxI,
    mask: &Image,
    offset: (i32, i32),
    alpha: u8,
    fill: FillMaskFn,
    masks: &mut [u8],
    src: &mut SourceCtx<'_>,
) {
    let clipped = bx.intersect(&band_box(region));
    if clipped.is_empty() {
        return;
    }

    let len = clipped.width() as usize;
    let mx = (clipped.x0 - offset.0) as usize;
    for y in clipped.y0..clipped.y1 {
        let row = mask.row((y - offset.1) as u32);
        let row_masks: &[u8] = match mask.format() {
            Format::A8 => &row[mx..mx + len],
            Format::Prgb32 | Format::Xrgb32 => {
                for (i, m) in masks[..len].iter_mut().enumerate() {
                    *m = row[(mx + i) * 4 + 3];
                }
                &masks[..len]
            }
        };

        let x0 = clipped.x0 as u32;
        let command = if alpha == 255 {
            MaskCommand::VMaskA8WithGA { x0, masks: row_masks }
        } else {
            MaskCommand::VMaskA8WithoutGA {
                x0,
                masks: row_masks,
                ga: alpha,
            }
        };
        fill(region, y as u32, &[command], src);
    }
}
