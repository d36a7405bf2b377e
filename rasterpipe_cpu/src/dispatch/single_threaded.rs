// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::batch::RenderBatch;
use crate::dispatch::Dispatcher;
use crate::region::Regions;
use crate::worker::WorkData;
use rasterpipe_common::error::{ErrorFlags, Result};
use rasterpipe_common::fetch_pool::FetchDataPool;
use rasterpipe_common::image::Image;

/// Renders batches on the calling thread.
///
/// Every command is rendered over all of its bands before the next one
/// starts, so the rasterization state of a command never outlives it.
#[derive(Debug)]
pub(crate) struct SingleThreadedDispatcher {
    /// Height of a band in rows.
    band_height: u32,
    /// The only worker.
    work: WorkData,
}

impl SingleThreadedDispatcher {
    pub(crate) fn new(width: u32, band_height: u32, work_zone_limit: Option<usize>) -> Result<Self> {
        Ok(Self {
            band_height,
            work: WorkData::new(width, band_height, work_zone_limit)?,
        })
    }
}

impl Dispatcher for SingleThreadedDispatcher {
    fn run_batch(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        target: &mut Image,
    ) -> ErrorFlags {
        let work = &mut self.work;
        work.insert_error_flags(batch.run_jobs());
        if work.begin_batch(batch) {
            let (width, height, stride) = (target.width(), target.height(), target.stride());
            let mut regions =
                Regions::new(width, height, stride, self.band_height, target.data_mut())
                    .into_regions();
            work.process_sync(batch, fetch_pool, &mut regions);
        }
        work.finish_batch()
    }
}
