// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(feature = "multithreading")]
pub(crate) mod multi_threaded;
pub(crate) mod single_threaded;

use crate::batch::RenderBatch;
use core::fmt::Debug;
use rasterpipe_common::error::ErrorFlags;
use rasterpipe_common::fetch_pool::FetchDataPool;
use rasterpipe_common::image::Image;

pub(crate) trait Dispatcher: Debug + Send + Sync {
    /// Runs the jobs and renders the commands of `batch` into `target`.
    ///
    /// Returns the errors accumulated by all workers. The batch is fully
    /// processed even if errors occur.
    fn run_batch(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        target: &mut Image,
    ) -> ErrorFlags;
}
