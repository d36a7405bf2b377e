// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A CPU rasterizer and compositor built around an analytic coverage pipeline.
//!
//! Fills are recorded into a [`RasterContext`] as render commands and rendered
//! in batches. Geometry is turned into band-bucketed edges, rasterized into
//! exact area coverage one band of scanlines at a time, resolved with a fill
//! rule into 8-bit masks and composited into the target with one of the
//! [composition operators](CompOp).
//!
//! Batches are either rendered on the calling thread, one command after the
//! other, or by a pool of workers that split the target into bands and
//! process every command within the bands they claim. Both produce the same
//! pixels.
//!
//! # Example
//!
//! ```
//! use rasterpipe_cpu::{ContextCreateInfo, RasterContext};
//! use rasterpipe_cpu::common::geometry::{Point, RectI};
//! use rasterpipe_cpu::common::image::{Format, Image};
//! use rasterpipe_cpu::common::paint::Rgba32;
//!
//! let image = Image::new(64, 64, Format::Prgb32).unwrap();
//! let mut ctx = RasterContext::new(image, ContextCreateInfo::default()).unwrap();
//! ctx.set_fill_style(Rgba32(0xFF20_80FF));
//! ctx.fill_rect_i(&RectI::new(8, 8, 16, 16)).unwrap();
//! ctx.fill_polygon(&[
//!     Point::new(32.0, 4.0),
//!     Point::new(60.0, 56.0),
//!     Point::new(4.0, 56.0),
//! ])
//! .unwrap();
//! ctx.flush().unwrap();
//! assert_eq!(ctx.target().pixel(10, 10), 0xFF20_80FF);
//! ```
//!
//! # Features
//!
//! - `multithreading` (enabled by default): render batches on worker threads
//!   when [`ContextCreateInfo::thread_count`] is not 0.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![forbid(unsafe_code)]

extern crate alloc;

mod batch;
mod cells;
mod command;
mod config;
mod context;
mod dispatch;
mod fine;
mod job;
mod rasterizer;
mod region;
mod resolver;
mod worker;

pub use config::ContextCreateInfo;
pub use context::RasterContext;
pub use fine::comp_op::CompOp;
pub use rasterpipe_common as common;
pub use rasterpipe_common::{Error, ErrorFlags, Result};
pub use resolver::FillRule;
