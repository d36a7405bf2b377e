// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render commands and the chunked queues they are recorded into.

use crate::fine::pipe::DispatchData;
use crate::resolver::FillRule;
use alloc::sync::Arc;
use bitflags::bitflags;
use alloc::vec::Vec;
use rasterpipe_common::error::Result;
use rasterpipe_common::fetch_pool::FetchDataId;
use rasterpipe_common::geometry::BoxI;
use rasterpipe_common::image::Image;
use rasterpipe_common::math::FIXED_SHIFT;

/// Number of entries in one chunk of a [`RenderQueue`].
pub(crate) const RENDER_QUEUE_CAPACITY: usize = 256;

/// An append-only queue of fixed-capacity chunks.
///
/// Appending never moves entries that were already recorded.
#[derive(Debug)]
pub(crate) struct RenderQueue<T> {
    chunks: Vec<Vec<T>>,
    len: usize,
}

impl<T> Default for RenderQueue<T> {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }
}

impl<T> RenderQueue<T> {
    /// Appends an entry, linking a new chunk when the last one is full.
    pub(crate) fn push(&mut self, item: T) -> Result<()> {
        let chunk = self.len / RENDER_QUEUE_CAPACITY;
        if chunk == self.chunks.len() {
            let mut entries = Vec::new();
            entries.try_reserve_exact(RENDER_QUEUE_CAPACITY)?;
            self.chunks.try_reserve(1)?;
            self.chunks.push(entries);
        }
        self.chunks[chunk].push(item);
        self.len += 1;
        Ok(())
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> &T {
        &self.chunks[index / RENDER_QUEUE_CAPACITY][index % RENDER_QUEUE_CAPACITY]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.chunks.iter().flatten()
    }

    /// Removes all entries, keeping the first chunk's allocation.
    pub(crate) fn clear(&mut self) {
        self.chunks.truncate(1);
        if let Some(chunk) = self.chunks.first_mut() {
            chunk.clear();
        }
        self.len = 0;
    }
}

/// The source of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandSource {
    /// A premultiplied color stored inline.
    Solid(u32),
    /// Fetch data in the context's pool.
    FetchData(FetchDataId),
}

bitflags! {
    /// Flags of a [`RenderCommand`].
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct RenderCommandFlags: u8 {
        /// The command holds a reference to its fetch data, released when the
        /// batch is finalized.
        const RETAINS_FETCH_DATA = 1 << 0;
    }
}

/// What a command fills.
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    /// A pixel-aligned box.
    FillBoxA { bx: BoxI },
    /// A box in 24.8 fixed point.
    FillBoxU { bx: BoxI },
    /// Edges in an edge slot of the batch.
    FillAnalytic {
        edge_slot: usize,
        fill_rule: FillRule,
        /// Index of the command's rasterization state in every worker.
        state_slot: usize,
    },
    /// A pixel-aligned box masked by an image.
    ///
    /// The mask pixel of `(x, y)` is at `(x - offset.0, y - offset.1)`.
    FillBoxMaskA {
        bx: BoxI,
        mask: Arc<Image>,
        offset: (i32, i32),
    },
}

impl Payload {
    /// The first row the payload touches, if known without its edges.
    pub(crate) fn known_y0(&self) -> Option<u32> {
        match self {
            Self::FillBoxA { bx } | Self::FillBoxMaskA { bx, .. } => Some(bx.y0 as u32),
            Self::FillBoxU { bx } => Some((bx.y0 >> FIXED_SHIFT) as u32),
            Self::FillAnalytic { .. } => None,
        }
    }
}

/// A fill ready to be processed by workers.
#[derive(Debug, Clone)]
pub(crate) struct RenderCommand {
    pub(crate) payload: Payload,
    /// Global alpha in `[0, 255]`.
    pub(crate) alpha: u8,
    pub(crate) source: CommandSource,
    pub(crate) flags: RenderCommandFlags,
    pub(crate) dispatch: DispatchData,
}

impl RenderCommand {
    /// The fetch data this command must release when the batch is finalized.
    pub(crate) fn retained_fetch_data(&self) -> Option<FetchDataId> {
        match self.source {
            CommandSource::FetchData(id) if self.flags.contains(RenderCommandFlags::RETAINS_FETCH_DATA) => {
                Some(id)
            }
            _ => None,
        }
    }
}
