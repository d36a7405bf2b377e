// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types shared by the recording and rendering stages.

use bitflags::bitflags;
use thiserror::Error;

/// Errors that can occur while recording or rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An allocation failed or a configured memory budget was exhausted.
    ///
    /// When this is returned from a flush, the batch was still rendered, but some
    /// shapes may be missing or only partially filled.
    #[error("Out of memory")]
    OutOfMemory,
    /// The geometry contained non-finite coordinates.
    #[error("Geometry contains non-finite coordinates")]
    InvalidGeometry,
    /// An argument was rejected, for example an unsupported band height.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The worker thread pool could not be created.
    #[error("Couldn't create worker thread pool: {0}")]
    ThreadPool(String),
}

/// Result type used across the crates.
pub type Result<T, E = Error> = core::result::Result<T, E>;

bitflags! {
    /// Errors accumulated by a worker while processing a batch.
    ///
    /// Workers never abort a batch. Instead they record what went wrong and the
    /// context reports it once every band has been processed.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ErrorFlags: u32 {
        /// An allocation failed.
        const OUT_OF_MEMORY = 1 << 0;
        /// A job was given geometry it could not process.
        const INVALID_GEOMETRY = 1 << 1;
    }
}

impl ErrorFlags {
    /// No error was recorded.
    pub const NONE: Self = Self::empty();

    /// Converts the accumulated flags into the error reported to the caller.
    ///
    /// Out of memory takes precedence, as it is the only error that makes the
    /// rendered result incomplete.
    pub fn to_result(self) -> Result<()> {
        if self.contains(Self::OUT_OF_MEMORY) {
            Err(Error::OutOfMemory)
        } else if self.contains(Self::INVALID_GEOMETRY) {
            Err(Error::InvalidGeometry)
        } else {
            Ok(())
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
