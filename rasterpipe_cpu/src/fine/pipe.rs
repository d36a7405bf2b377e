// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selecting fill functions for commands.
//!
//! A command stores the functions that process it, chosen once when it is
//! recorded. The choice depends on the [`PipeSignature`] only, and resolved
//! signatures are remembered by a [`PipeLookupCache`].

use crate::cells::CellBuffer;
use crate::fine::comp_op::{kernels, CompOpExt, CompOpKernel};
use crate::fine::fill::{fill_analytic, fill_box_a, fill_mask};
use crate::fine::format::{PixelFormat, Prgb32, Xrgb32, A8};
use crate::fine::span::{MaskCommand, SourceCtx};
use crate::region::Region;
use rasterpipe_common::fetch::{FetchFunc, FetchKind};
use rasterpipe_common::geometry::BoxI;
use rasterpipe_common::image::Format;
use std::collections::HashMap;

/// The shape of the area a command fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FillType {
    /// Pixel-aligned box with a constant mask.
    BoxA,
    /// Rows of [`MaskCommand`]s.
    Mask,
    /// Coverage from the analytic rasterizer.
    Analytic,
}

/// Everything that decides which functions process a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipeSignature {
    pub(crate) dst_format: Format,
    /// `None` for solid colors, which are read directly from the command.
    pub(crate) fetch_kind: Option<FetchKind>,
    pub(crate) comp_op: CompOpExt,
    pub(crate) fill_type: FillType,
}

pub(crate) type FillBoxAFn = fn(&mut Region<'_>, BoxI, u8, &mut SourceCtx<'_>);
pub(crate) type FillMaskFn = fn(&mut Region<'_>, u32, &[MaskCommand<'_>], &mut SourceCtx<'_>);
pub(crate) type FillAnalyticFn =
    fn(&mut Region<'_>, &mut CellBuffer, &mut [u8], u32, u32, &mut SourceCtx<'_>);

/// A fill function, by fill type.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FillFunc {
    BoxA(FillBoxAFn),
    Mask(FillMaskFn),
    Analytic(FillAnalyticFn),
}

/// The functions that process a command.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatchData {
    pub(crate) fill_func: FillFunc,
    pub(crate) fetch_func: Option<FetchFunc>,
}

impl DispatchData {
    /// Resolves `signature` without consulting a cache.
    pub(crate) fn new(signature: PipeSignature) -> Self {
        let fill_func = match signature.dst_format {
            Format::A8 => fill_func_for_format::<A8>(signature.comp_op, signature.fill_type),
            Format::Prgb32 => fill_func_for_format::<Prgb32>(signature.comp_op, signature.fill_type),
            Format::Xrgb32 => fill_func_for_format::<Xrgb32>(signature.comp_op, signature.fill_type),
        };
        Self {
            fill_func,
            fetch_func: signature.fetch_kind.map(FetchKind::fetch_func),
        }
    }
}

fn fill_func_for_format<F: PixelFormat>(op: CompOpExt, fill_type: FillType) -> FillFunc {
    macro_rules! select {
        ($($name:ident)*) => {
            match op {
                $(CompOpExt::$name => fill_func_for::<F, kernels::$name>(fill_type),)*
            }
        };
    }
    select!(
        SrcOver SrcCopy SrcIn SrcOut SrcAtop DstOver DstCopy DstIn DstOut DstAtop Xor Clear
        Plus Minus Modulate Multiply Screen Overlay Darken Lighten ColorDodge ColorBurn
        LinearBurn LinearLight PinLight HardLight SoftLight Difference Exclusion AlphaInv
    )
}

fn fill_func_for<F: PixelFormat, O: CompOpKernel>(fill_type: FillType) -> FillFunc {
    match fill_type {
        FillType::BoxA => FillFunc::BoxA(fill_box_a::<F, O>),
        FillType::Mask => FillFunc::Mask(fill_mask::<F, O>),
        FillType::Analytic => FillFunc::Analytic(fill_analytic::<F, O>),
    }
}

/// Remembers resolved signatures.
#[derive(Debug, Default)]
pub(crate) struct PipeLookupCache {
    entries: HashMap<PipeSignature, DispatchData>,
}

impl PipeLookupCache {
    pub(crate) fn get(&mut self, signature: PipeSignature) -> DispatchData {
        *self.entries.entry(signature).or_insert_with(|| {
            log::trace!("resolving fill functions for {signature:?}");
            DispatchData::new(signature)
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
