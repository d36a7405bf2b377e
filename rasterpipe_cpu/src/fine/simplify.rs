// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rewriting composition operators into cheaper equivalents.
//!
//! What an operator does depends on whether the destination has alpha and on
//! whether the source is opaque. Many combinations collapse into a simpler
//! operator, or into nothing at all, which is decided once per command.

use crate::fine::comp_op::CompOpExt;
use rasterpipe_common::image::Format;

/// An operator after simplification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SimplifiedOp {
    pub(crate) op: CompOpExt,
    /// A solid color that replaces the source, regardless of the style.
    pub(crate) solid_override: Option<u32>,
}

/// The source of a command, as far as simplification is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceInfo {
    /// Every source pixel is opaque.
    pub(crate) opaque: bool,
    /// The color of a solid source.
    pub(crate) solid: Option<u32>,
}

impl SourceInfo {
    pub(crate) fn solid(color: u32) -> Self {
        Self {
            opaque: color >> 24 == 0xFF,
            solid: Some(color),
        }
    }
}

/// Simplifies `op` for a destination of format `dst` and the given source.
///
/// Returns `None` if compositing would leave the destination unchanged.
pub(crate) fn simplify(op: CompOpExt, dst: Format, src: SourceInfo) -> Option<SimplifiedOp> {
    use CompOpExt as Op;
    use Format::{Prgb32, Xrgb32, A8};

    let opaque = src.opaque;
    let mut op = op;
    loop {
        if src.solid == Some(0) && op.keeps_dst_with_transparent_src() {
            return None;
        }

        op = match (op, dst) {
            (Op::DstCopy, _) => return None,
            (Op::Clear, _) => {
                let solid = if dst == Xrgb32 { 0xFF00_0000 } else { 0 };
                return Some(SimplifiedOp {
                    op: Op::SrcCopy,
                    solid_override: Some(solid),
                });
            }

            (Op::SrcOver, _) if opaque => Op::SrcCopy,
            (Op::SrcIn, Xrgb32) => Op::SrcCopy,
            (Op::SrcOut, Xrgb32) => Op::Clear,
            (Op::SrcOut, A8) if opaque => Op::AlphaInv,
            (Op::SrcAtop, Xrgb32) => Op::SrcOver,
            (Op::SrcAtop, A8) => return None,
            (Op::SrcAtop, Prgb32) if opaque => Op::SrcIn,

            (Op::DstOver, Xrgb32) => return None,
            (Op::DstOver, A8) => Op::SrcOver,
            (Op::DstIn, _) if opaque => return None,
            (Op::DstOut, _) if opaque => Op::Clear,
            (Op::DstAtop, Xrgb32) if opaque => return None,
            (Op::DstAtop, Xrgb32) => Op::DstIn,
            (Op::DstAtop, _) if opaque => Op::DstOver,

            (Op::Xor, Xrgb32) if opaque => Op::Clear,
            (Op::Xor, Xrgb32) => Op::DstOut,
            (Op::Xor, _) if opaque => Op::SrcOut,

            (Op::Multiply, Xrgb32) if opaque => Op::Modulate,
            (op, A8) if op.is_blend() || op == Op::Minus => Op::SrcOver,

            (op, _) => {
                return Some(SimplifiedOp {
                    op,
                    solid_override: None,
                })
            }
        };
    }
}
