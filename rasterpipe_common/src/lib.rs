// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry, edge and style representations shared by the rasterpipe renderers.
//!
//! # Contents
//!
//! - Fixed-point math and the coverage constants of the analytic rasterizer
//! - Paths, transforms and the [edge builder](edge_builder::EdgeBuilder) which turns
//!   them into clipped, monotonic, band-bucketed [edges](edge::EdgeStorage)
//! - Images and styles, and the resolved [fetch data](fetch::FetchData) the
//!   compositor reads source pixels from
//! - A reference-counted [pool](fetch_pool::FetchDataPool) of fetch data
//!
//! This crate should not be used on its own. Use `rasterpipe_cpu` instead.

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

pub mod edge;
pub mod edge_builder;
pub mod error;
pub mod fetch;
pub mod fetch_pool;
pub mod geometry;
pub mod image;
pub mod math;
pub mod paint;
pub mod path;

pub use error::{Error, ErrorFlags, Result};
