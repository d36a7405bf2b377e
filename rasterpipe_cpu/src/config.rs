// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use rasterpipe_common::error::{Error, Result};

/// Options for creating a [`RasterContext`](crate::RasterContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextCreateInfo {
    /// Number of worker threads.
    ///
    /// 0 renders every command on the calling thread as soon as the batch is
    /// flushed. Any other value renders batches band by band on that many
    /// pool threads, joined by the calling thread.
    pub thread_count: u16,
    /// Height of a band in rows, a power of two in `[1, 256]`.
    pub band_height: u32,
    /// Number of recorded commands after which the batch is flushed
    /// automatically.
    pub command_queue_limit: usize,
    /// Number of vertices above which edges are built by a worker instead of
    /// the recording thread. Only used when `thread_count` is not 0.
    pub job_threshold: usize,
    /// Maximum number of edge points one geometry may produce.
    pub edge_storage_limit: Option<usize>,
    /// Maximum number of active edges one worker may hold.
    pub work_zone_limit: Option<usize>,
}

impl Default for ContextCreateInfo {
    fn default() -> Self {
        Self {
            thread_count: 0,
            band_height: 32,
            command_queue_limit: 16_384,
            job_threshold: 64,
            edge_storage_limit: None,
            work_zone_limit: None,
        }
    }
}

impl ContextCreateInfo {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.band_height.is_power_of_two() || self.band_height > 256 {
            return Err(Error::InvalidArgument(
                "band height must be a power of two in [1, 256]",
            ));
        }
        if self.command_queue_limit == 0 {
            return Err(Error::InvalidArgument("command queue limit must not be 0"));
        }
        Ok(())
    }
}
