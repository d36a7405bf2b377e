// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing horizontal spans of pixels.
//!
//! A span is composited by one of three loops, depending on its mask: the
//! opaque loop, the constant mask loop and the variable mask loop.

use crate::fine::comp_op::CompOpKernel;
use crate::fine::format::PixelFormat;
use crate::fine::pixel::{pack, Pixel};
use alloc::vec::Vec;
use rasterpipe_common::fetch::{FetchData, FetchFunc};
use rasterpipe_common::math::div_255;

/// Where the source pixels of a command come from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Source<'a> {
    /// A premultiplied color, read directly.
    Solid(u32),
    /// Pixels produced by a fetch function.
    Fetch(&'a FetchData, FetchFunc),
}

/// Source pixels of one span.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SrcSpan<'a> {
    Solid(u32),
    Pixels(&'a [u32]),
}

/// A [`Source`] together with the worker's scratch buffer for fetched pixels.
#[derive(Debug)]
pub(crate) struct SourceCtx<'a> {
    source: Source<'a>,
    scratch: &'a mut Vec<u32>,
}

impl<'a> SourceCtx<'a> {
    pub(crate) fn new(source: Source<'a>, scratch: &'a mut Vec<u32>) -> Self {
        Self { source, scratch }
    }

    /// Source pixels of the span of `len` pixels starting at `(x, y)`.
    #[inline]
    pub(crate) fn span(&mut self, x: u32, y: u32, len: usize) -> SrcSpan<'_> {
        match self.source {
            Source::Solid(color) => SrcSpan::Solid(color),
            Source::Fetch(data, fetch) => {
                if self.scratch.len() < len {
                    self.scratch.resize(len, 0);
                }
                let out = &mut self.scratch[..len];
                fetch(data, x as i32, y as i32, out);
                SrcSpan::Pixels(out)
            }
        }
    }
}

/// The mask of one span.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LoopMask<'a> {
    /// Every pixel is fully covered.
    Opaque,
    /// One mask value for all pixels.
    Const(u8),
    /// One mask value per pixel.
    Var(&'a [u8]),
    /// One mask value per pixel, still to be multiplied by a global alpha.
    VarWithAlpha(&'a [u8], u8),
}

/// A masked span of one row.
///
/// Used for fills whose masks aren't produced by the rasterizer.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MaskCommand<'a> {
    /// A constant mask over `x0..x1`.
    CMask { x0: u32, x1: u32, mask: u8 },
    /// Per-pixel masks that already include the global alpha.
    VMaskA8WithGA { x0: u32, masks: &'a [u8] },
    /// Per-pixel masks that are multiplied by `ga` while compositing.
    VMaskA8WithoutGA { x0: u32, masks: &'a [u8], ga: u8 },
}

impl<'a> MaskCommand<'a> {
    /// The first pixel, the number of pixels and the mask of the span.
    #[inline]
    pub(crate) fn resolve(&self) -> (u32, usize, LoopMask<'a>) {
        match *self {
            Self::CMask { x0, x1, mask } => (x0, (x1 - x0) as usize, LoopMask::Const(mask)),
            Self::VMaskA8WithGA { x0, masks } => (x0, masks.len(), LoopMask::Var(masks)),
            Self::VMaskA8WithoutGA { x0, masks, ga } => {
                (x0, masks.len(), LoopMask::VarWithAlpha(masks, ga))
            }
        }
    }
}

/// Source pixels as seen by the loops.
trait SpanSource {
    fn get(&mut self, i: usize) -> &mut Pixel;

    /// The pixel shared by the whole span, for solid sources.
    fn solid(&mut self) -> Option<&mut Pixel>;
}

struct SolidSource(Pixel);

impl SpanSource for SolidSource {
    #[inline(always)]
    fn get(&mut self, _: usize) -> &mut Pixel {
        &mut self.0
    }

    #[inline(always)]
    fn solid(&mut self) -> Option<&mut Pixel> {
        Some(&mut self.0)
    }
}

struct FetchedSource<'a> {
    pixels: &'a [u32],
    current: Pixel,
}

impl SpanSource for FetchedSource<'_> {
    #[inline(always)]
    fn get(&mut self, i: usize) -> &mut Pixel {
        self.current = Pixel::new(self.pixels[i]);
        &mut self.current
    }

    #[inline(always)]
    fn solid(&mut self) -> Option<&mut Pixel> {
        None
    }
}

/// Composites `len` pixels of `row` starting at `x0`.
#[inline]
pub(crate) fn composite_span<F: PixelFormat, O: CompOpKernel>(
    row: &mut [u8],
    x0: u32,
    len: usize,
    src: SrcSpan<'_>,
    mask: LoopMask<'_>,
) {
    let x0 = x0 as usize;
    match src {
        SrcSpan::Solid(color) => {
            composite_masked::<F, O, _>(row, x0, len, &mut SolidSource(Pixel::solid(color)), mask);
        }
        SrcSpan::Pixels(pixels) => {
            let mut src = FetchedSource {
                pixels,
                current: Pixel::new(0),
            };
            composite_masked::<F, O, _>(row, x0, len, &mut src, mask);
        }
    }
}

#[inline(always)]
fn composite_masked<F: PixelFormat, O: CompOpKernel, S: SpanSource>(
    row: &mut [u8],
    x0: usize,
    len: usize,
    src: &mut S,
    mask: LoopMask<'_>,
) {
    match mask {
        LoopMask::Opaque | LoopMask::Const(255) => opaque_loop::<F, O, S>(row, x0, len, src),
        LoopMask::Const(0) => {}
        LoopMask::Const(m) => cmask_loop::<F, O, S>(row, x0, len, src, u32::from(m)),
        LoopMask::Var(masks) => {
            vmask_loop::<F, O, S>(row, x0, &masks[..len], src, u32::from);
        }
        LoopMask::VarWithAlpha(masks, ga) => {
            let ga = u32::from(ga);
            vmask_loop::<F, O, S>(row, x0, &masks[..len], src, |m| div_255(u32::from(m) * ga));
        }
    }
}

#[inline(always)]
fn opaque_loop<F: PixelFormat, O: CompOpKernel, S: SpanSource>(
    row: &mut [u8],
    x0: usize,
    len: usize,
    src: &mut S,
) {
    for i in 0..len {
        let mut d = Pixel::new(F::load(row, x0 + i));
        let px = O::composite(&mut d, src.get(i));
        F::store(row, x0 + i, px);
    }
}

#[inline(always)]
fn cmask_loop<F: PixelFormat, O: CompOpKernel, S: SpanSource>(
    row: &mut [u8],
    x0: usize,
    len: usize,
    src: &mut S,
    m: u32,
) {
    if O::MASK_SRC {
        if let Some(solid) = src.solid() {
            // The masked color is the same for every pixel.
            let mut masked = SolidSource(solid.masked(m));
            debug_assert!(masked.0.is_immutable());
            opaque_loop::<F, O, _>(row, x0, len, &mut masked);
            return;
        }
    }

    for i in 0..len {
        composite_pixel::<F, O>(row, x0 + i, src.get(i), m);
    }
}

#[inline(always)]
fn vmask_loop<F: PixelFormat, O: CompOpKernel, S: SpanSource>(
    row: &mut [u8],
    x0: usize,
    masks: &[u8],
    src: &mut S,
    scale: impl Fn(u8) -> u32,
) {
    for (i, m) in masks.iter().enumerate() {
        let m = scale(*m);
        match m {
            0 => {}
            255 => {
                let mut d = Pixel::new(F::load(row, x0 + i));
                let px = O::composite(&mut d, src.get(i));
                F::store(row, x0 + i, px);
            }
            _ => composite_pixel::<F, O>(row, x0 + i, src.get(i), m),
        }
    }
}

/// Composites a single pixel with a mask in `1..255`.
#[inline(always)]
fn composite_pixel<F: PixelFormat, O: CompOpKernel>(row: &mut [u8], x: usize, s: &mut Pixel, m: u32) {
    let mut d = Pixel::new(F::load(row, x));
    let px = if O::MASK_SRC {
        O::composite(&mut d, &mut s.masked(m))
    } else {
        lerp(O::composite(&mut d, s), d.pc(), m)
    };
    F::store(row, x, px);
}

/// `r * m + d * (1 - m)`, per component.
#[inline(always)]
fn lerp(r: u32, d: u32, m: u32) -> u32 {
    let mi = 255 - m;
    let c = |px: u32, shift: u32| (px >> shift) & 0xFF;
    pack(core::array::from_fn(|i| {
        let shift = i as u32 * 8;
        div_255(c(r, shift) * m + c(d, shift) * mi)
    }))
}
