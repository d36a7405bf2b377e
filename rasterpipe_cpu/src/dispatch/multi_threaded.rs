// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::batch::RenderBatch;
use crate::dispatch::Dispatcher;
use crate::region::{Region, Regions};
use crate::worker::WorkData;
use alloc::format;
use core::fmt::{Debug, Formatter};
use rasterpipe_common::error::{Error, ErrorFlags, Result};
use rasterpipe_common::fetch_pool::FetchDataPool;
use rasterpipe_common::image::Image;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Barrier;
use thread_local::ThreadLocal;

/// Renders batches band by band on a pool of worker threads.
///
/// Every worker first claims jobs until none are left. Once all jobs are done,
/// workers claim bands from a queue that hands them out top to bottom and
/// process every pending command in each of them. The calling thread takes
/// part as one more worker and returns once the whole batch is done.
pub(crate) struct MultiThreadedDispatcher {
    thread_pool: ThreadPool,
    workers: ThreadLocal<RefCell<WorkData>>,
    num_threads: u16,
    width: u32,
    band_height: u32,
    work_zone_limit: Option<usize>,
}

impl MultiThreadedDispatcher {
    pub(crate) fn new(
        width: u32,
        band_height: u32,
        num_threads: u16,
        work_zone_limit: Option<usize>,
    ) -> Result<Self> {
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(usize::from(num_threads))
            .thread_name(|index| format!("rasterpipe-worker-{index}"))
            .build()
            .map_err(|err| Error::ThreadPool(err.to_string()))?;

        Ok(Self {
            thread_pool,
            workers: ThreadLocal::new(),
            num_threads,
            width,
            band_height,
            work_zone_limit,
        })
    }
}

impl Dispatcher for MultiThreadedDispatcher {
    fn run_batch(
        &mut self,
        batch: &RenderBatch,
        fetch_pool: &FetchDataPool,
        target: &mut Image,
    ) -> ErrorFlags {
        let (width, height, stride) = (target.width(), target.height(), target.stride());
        let (band_sender, band_receiver) = crossbeam_channel::unbounded::<Region<'_>>();
        for region in
            Regions::new(width, height, stride, self.band_height, target.data_mut()).into_regions()
        {
            // Can't fail, the receiver is alive.
            let _ = band_sender.send(region);
        }
        drop(band_sender);

        let next_job = AtomicUsize::new(0);
        // The pool threads and the calling thread.
        let participants = usize::from(self.num_threads) + 1;
        let jobs_done = Barrier::new(participants);
        let errors = AtomicU32::new(0);
        let workers = &self.workers;
        let (dispatcher_width, band_height, work_zone_limit) =
            (self.width, self.band_height, self.work_zone_limit);

        let work = |index: usize| {
            let mut flags = ErrorFlags::NONE;
            let jobs = batch.jobs();
            loop {
                let job_index = next_job.fetch_add(1, Ordering::Relaxed);
                if job_index >= jobs.len() {
                    break;
                }
                let job = jobs.get(job_index);
                flags |= job.run(batch.edge_slot(job.edge_slot));
            }
            // Edges of every analytic command are published past this point.
            jobs_done.wait();

            let worker = workers.get_or_try(|| {
                WorkData::new(dispatcher_width, band_height, work_zone_limit).map(RefCell::new)
            });
            let flags = match worker {
                Ok(worker) => {
                    let mut data = worker.borrow_mut();
                    data.insert_error_flags(flags);
                    if data.begin_batch(batch) {
                        while let Ok(mut region) = band_receiver.recv() {
                            data.process_band(batch, fetch_pool, &mut region);
                        }
                    }
                    data.finish_batch()
                }
                Err(err) => {
                    log::warn!("worker {index} couldn't allocate its buffers: {err}");
                    flags | ErrorFlags::OUT_OF_MEMORY
                }
            };
            errors.fetch_or(flags.bits(), Ordering::Relaxed);
        };

        let work = &work;
        self.thread_pool.in_place_scope(|scope| {
            for index in 0..participants - 1 {
                scope.spawn(move |_| work(index));
            }
            work(participants - 1);
        });

        ErrorFlags::from_bits_truncate(errors.into_inner())
    }
}

impl Debug for MultiThreadedDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("MultiThreadedDispatcher { .. }")
    }
}
