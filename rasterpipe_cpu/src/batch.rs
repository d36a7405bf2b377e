// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Everything recorded between two flushes.

use crate::command::{Payload, RenderCommand, RenderQueue};
use crate::job::RenderJob;
use alloc::vec::Vec;
use rasterpipe_common::edge::EdgeStorage;
use rasterpipe_common::error::{ErrorFlags, Result};
use rasterpipe_common::fetch_pool::FetchDataPool;
use rasterpipe_common::math::FIXED_SHIFT;
use std::sync::OnceLock;

/// Commands and jobs of one flush.
///
/// A batch is read-only while it's processed, except for the edge slots,
/// which are filled by jobs before any command is processed.
#[derive(Debug, Default)]
pub(crate) struct RenderBatch {
    commands: RenderQueue<RenderCommand>,
    jobs: RenderQueue<RenderJob>,
    edge_slots: Vec<OnceLock<EdgeStorage>>,
    state_slot_count: usize,
}

impl RenderBatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn commands(&self) -> &RenderQueue<RenderCommand> {
        &self.commands
    }

    pub(crate) fn jobs(&self) -> &RenderQueue<RenderJob> {
        &self.jobs
    }

    /// Number of analytic commands, each owning one rasterization state slot.
    pub(crate) fn state_slot_count(&self) -> usize {
        self.state_slot_count
    }

    /// Reserves an edge slot, filled right away if `storage` is given and by a
    /// job otherwise.
    pub(crate) fn add_edge_slot(&mut self, storage: Option<EdgeStorage>) -> Result<usize> {
        self.edge_slots.try_reserve(1)?;
        let slot = OnceLock::new();
        if let Some(storage) = storage {
            let _ = slot.set(storage);
        }
        self.edge_slots.push(slot);
        Ok(self.edge_slots.len() - 1)
    }

    /// Reserves a rasterization state slot for an analytic command.
    pub(crate) fn add_state_slot(&mut self) -> usize {
        self.state_slot_count += 1;
        self.state_slot_count - 1
    }

    pub(crate) fn push_command(&mut self, command: RenderCommand) -> Result<()> {
        self.commands.push(command)
    }

    pub(crate) fn push_job(&mut self, job: RenderJob) -> Result<()> {
        self.jobs.push(job)
    }

    pub(crate) fn edge_slot(&self, slot: usize) -> &OnceLock<EdgeStorage> {
        &self.edge_slots[slot]
    }

    /// The edges of `slot`.
    ///
    /// # Panics
    ///
    /// Panics if the job filling the slot hasn't run yet.
    pub(crate) fn edges(&self, slot: usize) -> &EdgeStorage {
        self.edge_slots[slot]
            .get()
            .expect("jobs run before commands are processed")
    }

    /// Runs all jobs on the calling thread.
    pub(crate) fn run_jobs(&self) -> ErrorFlags {
        let mut flags = ErrorFlags::NONE;
        for job in self.jobs.iter() {
            flags |= job.run(self.edge_slot(job.edge_slot));
        }
        flags
    }

    /// The first row `command` touches, or `None` if it touches no rows.
    pub(crate) fn command_y0(&self, command: &RenderCommand) -> Option<u32> {
        match &command.payload {
            Payload::FillAnalytic { edge_slot, .. } => {
                let edges = self.edges(*edge_slot);
                (!edges.is_empty()).then(|| (edges.fixed_y0() >> FIXED_SHIFT) as u32)
            }
            payload => payload.known_y0(),
        }
    }

    /// Releases the fetch data retained by commands and clears the batch.
    pub(crate) fn finalize(&mut self, fetch_pool: &mut FetchDataPool) {
        for command in self.commands.iter() {
            if let Some(id) = command.retained_fetch_data() {
                fetch_pool.release(id);
            }
        }
        self.commands.clear();
        self.jobs.clear();
        self.edge_slots.clear();
        self.state_slot_count = 0;
    }
}
