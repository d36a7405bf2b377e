// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill functions, one per fill type. Every function is instantiated for each
//! destination format and composition operator.

use crate::cells::CellBuffer;
use crate::fine::comp_op::CompOpKernel;
use crate::fine::format::PixelFormat;
use crate::fine::span::{composite_span, LoopMask, MaskCommand, SourceCtx};
use crate::region::Region;
use crate::resolver::{resolve_row, RowSpans, SpanMask};
use rasterpipe_common::geometry::BoxI;
use rasterpipe_common::math::{BIT_WORD_SIZE, PIXELS_PER_ONE_BIT};

/// Fills a pixel-aligned box with a constant mask.
///
/// `bx` is in destination coordinates and must lie within the rows of `region`.
pub(crate) fn fill_box_a<F: PixelFormat, O: CompOpKernel>(
    region: &mut Region<'_>,
    bx: BoxI,
    alpha: u8,
    src: &mut SourceCtx<'_>,
) {
    debug_assert!(bx.y0 as u32 >= region.y0 && bx.y1 as u32 <= region.y1());

    let len = bx.width() as usize;
    let mask = if alpha == 255 {
        LoopMask::Opaque
    } else {
        LoopMask::Const(alpha)
    };
    for y in bx.y0 as u32..bx.y1 as u32 {
        let row = region.row_mut(y - region.y0);
        let span = src.span(bx.x0 as u32, y, len);
        composite_span::<F, O>(row, bx.x0 as u32, len, span, mask);
    }
}

/// Composites the mask commands of destination row `y`.
pub(crate) fn fill_mask<F: PixelFormat, O: CompOpKernel>(
    region: &mut Region<'_>,
    y: u32,
    commands: &[MaskCommand<'_>],
    src: &mut SourceCtx<'_>,
) {
    let row = region.row_mut(y - region.y0);
    for command in commands {
        let (x0, len, mask) = command.resolve();
        if len == 0 {
            continue;
        }
        let span = src.span(x0, y, len);
        composite_span::<F, O>(row, x0, len, span, mask);
    }
}

/// Resolves the coverage accumulated in `cells` and composites it into `region`.
///
/// Row 0 of `cells` is the first row of `region`. Every cell is cleared, so
/// the buffer can be reused right away.
pub(crate) fn fill_analytic<F: PixelFormat, O: CompOpKernel>(
    region: &mut Region<'_>,
    cells: &mut CellBuffer,
    masks: &mut [u8],
    fill_rule_mask: u32,
    alpha: u32,
    src: &mut SourceCtx<'_>,
) {
    if !cells.has_bounds() {
        return;
    }

    let (min_x, max_x) = cells.bounds();
    let words = (min_x as usize / PIXELS_PER_ONE_BIT) / BIT_WORD_SIZE
        ..(max_x as usize / PIXELS_PER_ONE_BIT) / BIT_WORD_SIZE + 1;
    let width = cells.width().min(region.width);

    let mut spans = RowSpans::new();
    for y in 0..region.height {
        spans.clear();
        let (row_cells, row_bits) = cells.row_mut(y);
        resolve_row(
            row_cells,
            row_bits,
            words.clone(),
            width,
            fill_rule_mask,
            alpha,
            masks,
            &mut spans,
        );

        let dst_y = region.y0 + y;
        let row = region.row_mut(y);
        for span in &spans {
            let len = (span.x1 - span.x0) as usize;
            let mask = match span.mask {
                SpanMask::Const(m) => LoopMask::Const(m),
                SpanMask::Var => LoopMask::Var(&masks[span.x0 as usize..span.x1 as usize]),
            };
            let src_span = src.span(span.x0, dst_y, len);
            composite_span::<F, O>(row, span.x0, len, src_span, mask);
        }
    }
    cells.reset_bounds();
}

#[cfg(test)]
mod tests {
    use super::{fill_analytic, fill_box_a, fill_mask};
    use crate::cells::CellBuffer;
    use crate::fine::comp_op::kernels;
    use crate::fine::format::{Prgb32, A8};
    use crate::fine::span::{MaskCommand, Source, SourceCtx};
    use crate::region::Regions;
    use crate::resolver::FillRule;
    use rasterpipe_common::geometry::BoxI;

    #[test]
    fn box_is_clipped_to_the_band_rows() {
        let mut buffer = vec![0_u8; 8 * 8];
        let mut scratch = Vec::new();
        let mut regions = Regions::new(8, 8, 8, 4, &mut buffer);
        regions.update_regions(|region| {
            let bx = BoxI::new(2, 3, 5, 6).intersect(&BoxI::new(0, region.y0 as i32, 8, region.y1() as i32));
            if !bx.is_empty() {
                let mut src = SourceCtx::new(Source::Solid(0xFF00_0000), &mut scratch);
                fill_box_a::<A8, kernels::SrcCopy>(region, bx, 0x80, &mut src);
            }
        });
        for y in 0..8 {
            for x in 0..8 {
                let expected = if (2..5).contains(&x) && (3..6).contains(&y) { 0x80 } else { 0 };
                assert_eq!(buffer[y * 8 + x], expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn mask_commands() {
        let mut buffer = vec![0_u8; 8];
        let mut scratch = Vec::new();
        let masks = [255, 128];
        let mut regions = Regions::new(8, 1, 8, 1, &mut buffer);
        regions.update_regions(|region| {
            let mut src = SourceCtx::new(Source::Solid(0xFF00_0000), &mut scratch);
            let commands = [
                MaskCommand::CMask { x0: 0, x1: 2, mask: 64 },
                MaskCommand::VMaskA8WithGA { x0: 2, masks: &masks },
                MaskCommand::VMaskA8WithoutGA { x0: 4, masks: &masks, ga: 128 },
            ];
            fill_mask::<A8, kernels::SrcOver>(region, 0, &commands, &mut src);
        });
        assert_eq!(buffer, [64, 64, 255, 128, 128, 64, 0, 0]);
    }

    #[test]
    fn analytic_box_fill() {
        let mut buffer = vec![0_u8; 8 * 4 * 2];
        let mut scratch = Vec::new();
        let mut cells = CellBuffer::new(8, 2).unwrap();
        // Full coverage over x in [1, 3), half coverage in column 3.
        for row in 0..2 {
            cells.accumulate(row, 1, 256, 0);
            cells.accumulate(row, 3, -256, -256 * 256);
        }
        let mut masks = vec![0; 8];
        let mut regions = Regions::new(8, 2, 32, 2, &mut buffer);
        regions.update_regions(|region| {
            let mut src = SourceCtx::new(Source::Solid(0xFFFF_FFFF), &mut scratch);
            fill_analytic::<Prgb32, kernels::SrcCopy>(
                region,
                &mut cells,
                &mut masks,
                FillRule::NonZero.mask(),
                255,
                &mut src,
            );
        });
        assert!(cells.is_clear());

        let px = |x: usize| u32::from_le_bytes(buffer[x * 4..x * 4 + 4].try_into().unwrap());
        assert_eq!(px(0), 0);
        assert_eq!(px(1), 0xFFFF_FFFF);
        assert_eq!(px(2), 0xFFFF_FFFF);
        assert_eq!(px(3), 0x8080_8080);
        assert_eq!(px(4), 0);
    }
}
