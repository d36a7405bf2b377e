// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred geometry work.

use alloc::vec::Vec;
use rasterpipe_common::edge::EdgeStorage;
use rasterpipe_common::edge_builder::EdgeBuilder;
use rasterpipe_common::error::{Error, ErrorFlags, Result};
use rasterpipe_common::geometry::{BoxI, Point, Transform};
use rasterpipe_common::path::Path;
use std::sync::OnceLock;

/// The geometry a job builds edges from.
#[derive(Debug, Clone)]
pub(crate) enum JobGeometry {
    Polygon(Vec<Point>),
    Path(Path),
}

/// Builds the edges of one analytic command on a worker.
///
/// Jobs of a batch run before any of its commands are processed.
#[derive(Debug, Clone)]
pub(crate) struct RenderJob {
    pub(crate) geometry: JobGeometry,
    pub(crate) transform: Transform,
    /// Clip box in 24.8 fixed point.
    pub(crate) clip: BoxI,
    pub(crate) band_height: u32,
    pub(crate) point_limit: Option<usize>,
    /// The edge slot of the batch the result is stored into.
    pub(crate) edge_slot: usize,
}

impl RenderJob {
    /// Builds the edges and publishes them into `slot`.
    ///
    /// On failure the slot receives empty edges, so the dependent command
    /// doesn't render, and the error is returned as flags.
    pub(crate) fn run(&self, slot: &OnceLock<EdgeStorage>) -> ErrorFlags {
        let (storage, flags) = match self.build() {
            Ok(storage) => (storage, ErrorFlags::NONE),
            Err(err) => {
                log::warn!("building edges of slot {} failed: {err}", self.edge_slot);
                let flags = match err {
                    Error::InvalidGeometry => ErrorFlags::INVALID_GEOMETRY,
                    _ => ErrorFlags::OUT_OF_MEMORY,
                };
                (EdgeStorage::empty(self.band_height), flags)
            }
        };
        if slot.set(storage).is_err() {
            unreachable!("edge slot {} is filled by one job only", self.edge_slot);
        }
        flags
    }

    fn build(&self) -> Result<EdgeStorage> {
        let mut builder =
            EdgeBuilder::new(self.clip, self.band_height).with_point_limit(self.point_limit);
        match &self.geometry {
            JobGeometry::Polygon(points) => builder.add_points(points, &self.transform)?,
            JobGeometry::Path(path) => builder.add_path(path, &self.transform)?,
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{JobGeometry, RenderJob};
    use rasterpipe_common::error::ErrorFlags;
    use rasterpipe_common::geometry::{BoxI, Point, Transform};
    use std::sync::OnceLock;

    fn job(points: Vec<Point>, point_limit: Option<usize>) -> RenderJob {
        RenderJob {
            geometry: JobGeometry::Polygon(points),
            transform: Transform::IDENTITY,
            clip: BoxI::new(0, 0, 16, 16).to_fixed(),
            band_height: 4,
            point_limit,
            edge_slot: 0,
        }
    }

    fn triangle() -> Vec<Point> {
        vec![Point::new(1.0, 1.0), Point::new(12.0, 3.0), Point::new(4.0, 14.0)]
    }

    #[test]
    fn publishes_edges() {
        let slot = OnceLock::new();
        assert!(job(triangle(), None).run(&slot).is_empty());
        let storage = slot.get().unwrap();
        assert!(!storage.is_empty());
        assert_eq!(storage.band_range(), 0..4);
    }

    #[test]
    fn failure_publishes_empty_edges() {
        let slot = OnceLock::new();
        let flags = job(triangle(), Some(1)).run(&slot);
        assert!(flags.contains(ErrorFlags::OUT_OF_MEMORY));
        assert!(slot.get().unwrap().is_empty());

        let slot = OnceLock::new();
        let flags = job(vec![Point::new(f64::NAN, 0.0), Point::new(3.0, 3.0)], None).run(&slot);
        assert!(flags.contains(ErrorFlags::INVALID_GEOMETRY));
        assert!(slot.get().unwrap().is_empty());
    }
}
