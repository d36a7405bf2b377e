// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fine rasterization: compositing sources into destination pixels.
//!
//! [`pipe`] selects a fill function per command. Fill functions walk rows
//! and hand spans to the loops in [`span`], which combine destination and
//! source [pixels](pixel::Pixel) with a [composition operator](comp_op).

pub(crate) mod comp_op;
pub(crate) mod fill;
pub(crate) mod format;
pub(crate) mod pipe;
pub(crate) mod pixel;
pub(crate) mod simplify;
pub(crate) mod span;
