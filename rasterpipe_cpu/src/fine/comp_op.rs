// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition operators.
//!
//! All formulas work on premultiplied 8-bit components with integer
//! arithmetic and round through [`div_255`], so every code path produces
//! the same bytes.

use crate::fine::pixel::{pack, pack_i32, Pixel};
use rasterpipe_common::math::{div_255, div_255_signed, isqrt};

/// How a source is combined with the destination.
///
/// Porter-Duff operators followed by the separable blend modes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    /// Source over destination.
    #[default]
    SrcOver,
    /// Source replaces destination.
    SrcCopy,
    /// Source where the destination is.
    SrcIn,
    /// Source where the destination isn't.
    SrcOut,
    /// Source atop destination.
    SrcAtop,
    /// Destination over source.
    DstOver,
    /// Destination is kept.
    DstCopy,
    /// Destination where the source is.
    DstIn,
    /// Destination where the source isn't.
    DstOut,
    /// Destination atop source.
    DstAtop,
    /// Source and destination where they don't overlap.
    Xor,
    /// Everything is cleared.
    Clear,
    /// Saturated addition.
    Plus,
    /// Saturated subtraction of the source colors.
    Minus,
    /// Component-wise multiplication, alpha included.
    Modulate,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
    /// Overlay blend.
    Overlay,
    /// Darken blend.
    Darken,
    /// Lighten blend.
    Lighten,
    /// Color dodge blend.
    ColorDodge,
    /// Color burn blend.
    ColorBurn,
    /// Linear burn blend.
    LinearBurn,
    /// Linear light blend.
    LinearLight,
    /// Pin light blend.
    PinLight,
    /// Hard light blend.
    HardLight,
    /// Soft light blend.
    SoftLight,
    /// Difference blend.
    Difference,
    /// Exclusion blend.
    Exclusion,
}

impl CompOp {
    /// All operators, in declaration order.
    pub const ALL: [Self; 29] = [
        Self::SrcOver,
        Self::SrcCopy,
        Self::SrcIn,
        Self::SrcOut,
        Self::SrcAtop,
        Self::DstOver,
        Self::DstCopy,
        Self::DstIn,
        Self::DstOut,
        Self::DstAtop,
        Self::Xor,
        Self::Clear,
        Self::Plus,
        Self::Minus,
        Self::Modulate,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::LinearBurn,
        Self::LinearLight,
        Self::PinLight,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
    ];
}

/// Combines a destination and a source pixel into a new destination pixel.
pub(crate) trait CompOpKernel: Send + Sync + 'static {
    /// Masks are applied by scaling the source instead of interpolating
    /// between the result and the destination.
    ///
    /// Only valid for operators that keep the destination when the source
    /// is transparent.
    const MASK_SRC: bool;

    fn composite(d: &mut Pixel, s: &mut Pixel) -> u32;
}

#[inline(always)]
fn div255(x: i32) -> i32 {
    div_255_signed(x)
}

/// Applies `f(dc, sc, da, sa)` to all four components, alpha included.
#[inline(always)]
fn uniform(d: &mut Pixel, s: &mut Pixel, f: impl Fn(i32, i32, i32, i32) -> i32) -> u32 {
    let dc = d.uc();
    let sc = s.uc();
    let (da, sa) = (dc[3] as i32, sc[3] as i32);
    pack_i32(core::array::from_fn(|i| f(dc[i] as i32, sc[i] as i32, da, sa)))
}

/// Applies `color(dc, sc, da, sa)` to the color components and `alpha(da, sa)` to alpha.
#[inline(always)]
fn separate(
    d: &mut Pixel,
    s: &mut Pixel,
    color: impl Fn(i32, i32, i32, i32) -> i32,
    alpha: impl Fn(i32, i32) -> i32,
) -> u32 {
    let dc = d.uc();
    let sc = s.uc();
    let (da, sa) = (dc[3] as i32, sc[3] as i32);
    pack_i32(core::array::from_fn(|i| {
        if i == 3 {
            alpha(da, sa)
        } else {
            color(dc[i] as i32, sc[i] as i32, da, sa)
        }
    }))
}

/// `Sa + Da - Sa.Da`, the alpha of every separable blend mode.
#[inline(always)]
fn blend_alpha(da: i32, sa: i32) -> i32 {
    sa + da - div255(sa * da)
}

#[inline(always)]
fn overlay(dc: i32, sc: i32, da: i32, sa: i32, src_is_darker: bool) -> i32 {
    let x = div255(dc * sa + sc * da - 2 * sc * dc);
    if src_is_darker {
        dc + sc - x
    } else {
        dc + sc + x - div255(sa * da)
    }
}

/// Result of a blend whose `B(Cb, Cs) * Sa * Da` term is `term`, in 255² units.
#[inline(always)]
fn blend_with_term(dc: i32, sc: i32, da: i32, sa: i32, term: i32) -> i32 {
    div255(term + sc * (255 - da) + dc * (255 - sa))
}

fn color_dodge(dc: i32, sc: i32, da: i32, sa: i32) -> i32 {
    let sada = sa * da;
    let term = if dc == 0 {
        0
    } else if sc >= sa {
        sada
    } else {
        (dc * sa * sa / (sa - sc)).min(sada)
    };
    blend_with_term(dc, sc, da, sa, term)
}

fn color_burn(dc: i32, sc: i32, da: i32, sa: i32) -> i32 {
    let sada = sa * da;
    let term = if dc >= da {
        sada
    } else if sc == 0 {
        0
    } else {
        sada - sada.min((da - dc) * sa * sa / sc)
    };
    blend_with_term(dc, sc, da, sa, term)
}

fn linear_light(dc: i32, sc: i32, da: i32, sa: i32) -> i32 {
    let sada = sa * da;
    let term = (dc * sa + 2 * sc * da - sada).clamp(0, sada);
    blend_with_term(dc, sc, da, sa, term)
}

fn pin_light(dc: i32, sc: i32, da: i32, sa: i32) -> i32 {
    let a = dc + sc - div255(sc * da);
    let b = dc + sc + div255(sc * da) - div255(dc * sa);
    if 2 * sc <= sa {
        a.min(b)
    } else {
        a.max(b - div255(da * sa))
    }
}

fn soft_light(dc: i32, sc: i32, da: i32, sa: i32) -> i32 {
    const U: i64 = 1 << 16;

    let (dc, sc, da, sa) = (i64::from(dc), i64::from(sc), i64::from(da), i64::from(sa));
    // `m = Dc / Da` in 16-bit fixed point.
    let m = dc * U / da.max(1);
    let k = 2 * sc - sa;
    let g = if k <= 0 {
        m * (U - m) / U
    } else if 4 * m <= U {
        let t = 4 * m;
        t * (t * m / U + m - t + U) / U - m
    } else {
        isqrt((m * U) as u64) as i64 - m
    };

    let den = 255 * U;
    let num = dc * 255 * U + sc * (255 - da) * U + k * da * g;
    (num + den / 2).div_euclid(den) as i32
}

macro_rules! comp_op_kernels {
    ($($(#[$meta:meta])* $name:ident, mask_src: $mask_src:literal, |$d:ident, $s:ident| $body:expr;)*) => {
        /// Operators the compositor implements.
        ///
        /// Every [`CompOp`] plus internal operators that simplification may produce.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub(crate) enum CompOpExt {
            $($(#[$meta])* $name,)*
        }

        impl CompOpExt {
            /// See [`CompOpKernel::MASK_SRC`].
            #[cfg(test)]
            pub(crate) const fn masks_source(self) -> bool {
                match self {
                    $(Self::$name => $mask_src,)*
                }
            }
        }

        /// One kernel type per [`CompOpExt`] variant.
        pub(crate) mod kernels {
            use super::*;

            $(
                #[derive(Debug)]
                pub(crate) struct $name;

                impl CompOpKernel for $name {
                    const MASK_SRC: bool = $mask_src;

                    #[inline(always)]
                    fn composite($d: &mut Pixel, $s: &mut Pixel) -> u32 {
                        $body
                    }
                }
            )*
        }
    };
}

comp_op_kernels! {
    SrcOver, mask_src: true, |d, s| {
        let ui = s.ui();
        let dc = d.uc();
        let sc = s.uc();
        pack(core::array::from_fn(|i| sc[i] + div_255(dc[i] * ui)))
    };
    SrcCopy, mask_src: false, |_d, s| s.pc();
    SrcIn, mask_src: false, |d, s| uniform(d, s, |_, sc, da, _| div255(sc * da));
    SrcOut, mask_src: false, |d, s| uniform(d, s, |_, sc, da, _| div255(sc * (255 - da)));
    SrcAtop, mask_src: true, |d, s| {
        uniform(d, s, |dc, sc, da, sa| div255(sc * da + dc * (255 - sa)))
    };
    DstOver, mask_src: true, |d, s| uniform(d, s, |dc, sc, da, _| dc + div255(sc * (255 - da)));
    DstCopy, mask_src: false, |d, _s| d.pc();
    DstIn, mask_src: false, |d, s| uniform(d, s, |dc, _, _, sa| div255(dc * sa));
    DstOut, mask_src: true, |d, s| {
        let ui = s.ui();
        let dc = d.uc();
        pack(dc.map(|c| div_255(c * ui)))
    };
    DstAtop, mask_src: false, |d, s| {
        uniform(d, s, |dc, sc, da, sa| div255(dc * sa + sc * (255 - da)))
    };
    Xor, mask_src: true, |d, s| {
        uniform(d, s, |dc, sc, da, sa| div255(dc * (255 - sa) + sc * (255 - da)))
    };
    Clear, mask_src: false, |_d, _s| 0;
    Plus, mask_src: true, |d, s| uniform(d, s, |dc, sc, _, _| dc + sc);
    Minus, mask_src: false, |d, s| {
        separate(
            d,
            s,
            |dc, sc, da, _| (dc - sc).max(0) + div255(sc * (255 - da)),
            |da, sa| da + div255(sa * (255 - da)),
        )
    };
    Modulate, mask_src: false, |d, s| uniform(d, s, |dc, sc, _, _| div255(dc * sc));
    Multiply, mask_src: true, |d, s| {
        uniform(d, s, |dc, sc, da, sa| div255(dc * (sc + 255 - sa) + sc * (255 - da)))
    };
    Screen, mask_src: true, |d, s| uniform(d, s, |dc, sc, _, _| dc + sc - div255(sc * dc));
    Overlay, mask_src: true, |d, s| {
        separate(d, s, |dc, sc, da, sa| overlay(dc, sc, da, sa, 2 * dc < da), blend_alpha)
    };
    Darken, mask_src: true, |d, s| {
        uniform(d, s, |dc, sc, da, sa| {
            (dc + div255(sc * (255 - da))).min(sc + div255(dc * (255 - sa)))
        })
    };
    Lighten, mask_src: true, |d, s| {
        uniform(d, s, |dc, sc, da, sa| {
            (dc + div255(sc * (255 - da))).max(sc + div255(dc * (255 - sa)))
        })
    };
    ColorDodge, mask_src: true, |d, s| separate(d, s, color_dodge, blend_alpha);
    ColorBurn, mask_src: true, |d, s| separate(d, s, color_burn, blend_alpha);
    LinearBurn, mask_src: false, |d, s| {
        separate(d, s, |dc, sc, da, sa| dc + sc - div255(sa * da), blend_alpha)
    };
    LinearLight, mask_src: true, |d, s| separate(d, s, linear_light, blend_alpha);
    PinLight, mask_src: true, |d, s| separate(d, s, pin_light, blend_alpha);
    HardLight, mask_src: true, |d, s| {
        separate(d, s, |dc, sc, da, sa| overlay(dc, sc, da, sa, 2 * sc < sa), blend_alpha)
    };
    SoftLight, mask_src: true, |d, s| separate(d, s, soft_light, blend_alpha);
    Difference, mask_src: true, |d, s| {
        separate(
            d,
            s,
            |dc, sc, da, sa| sc + dc - 2 * div255((sc * da).min(dc * sa)),
            blend_alpha,
        )
    };
    Exclusion, mask_src: true, |d, s| {
        separate(d, s, |dc, sc, _, _| sc + dc - 2 * div255(sc * dc), blend_alpha)
    };
    /// `255 - Dc` on every component. Used for opaque `SrcOut` into alpha-only targets.
    AlphaInv, mask_src: false, |d, _s| !d.pc();
}

impl From<CompOp> for CompOpExt {
    fn from(op: CompOp) -> Self {
        match op {
            CompOp::SrcOver => Self::SrcOver,
            CompOp::SrcCopy => Self::SrcCopy,
            CompOp::SrcIn => Self::SrcIn,
            CompOp::SrcOut => Self::SrcOut,
            CompOp::SrcAtop => Self::SrcAtop,
            CompOp::DstOver => Self::DstOver,
            CompOp::DstCopy => Self::DstCopy,
            CompOp::DstIn => Self::DstIn,
            CompOp::DstOut => Self::DstOut,
            CompOp::DstAtop => Self::DstAtop,
            CompOp::Xor => Self::Xor,
            CompOp::Clear => Self::Clear,
            CompOp::Plus => Self::Plus,
            CompOp::Minus => Self::Minus,
            CompOp::Modulate => Self::Modulate,
            CompOp::Multiply => Self::Multiply,
            CompOp::Screen => Self::Screen,
            CompOp::Overlay => Self::Overlay,
            CompOp::Darken => Self::Darken,
            CompOp::Lighten => Self::Lighten,
            CompOp::ColorDodge => Self::ColorDodge,
            CompOp::ColorBurn => Self::ColorBurn,
            CompOp::LinearBurn => Self::LinearBurn,
            CompOp::LinearLight => Self::LinearLight,
            CompOp::PinLight => Self::PinLight,
            CompOp::HardLight => Self::HardLight,
            CompOp::SoftLight => Self::SoftLight,
            CompOp::Difference => Self::Difference,
            CompOp::Exclusion => Self::Exclusion,
        }
    }
}

impl CompOpExt {
    /// Returns `true` if a transparent source leaves the destination unchanged.
    pub(crate) const fn keeps_dst_with_transparent_src(self) -> bool {
        matches!(
            self,
            Self::SrcOver
                | Self::SrcAtop
                | Self::DstOver
                | Self::DstOut
                | Self::Xor
                | Self::Plus
                | Self::Minus
                | Self::Multiply
                | Self::Screen
                | Self::Overlay
                | Self::Darken
                | Self::Lighten
                | Self::ColorDodge
                | Self::ColorBurn
                | Self::LinearBurn
                | Self::LinearLight
                | Self::PinLight
                | Self::HardLight
                | Self::SoftLight
                | Self::Difference
                | Self::Exclusion
        )
    }

    /// Returns `true` for the separable blend modes.
    pub(crate) const fn is_blend(self) -> bool {
        matches!(
            self,
            Self::Multiply
                | Self::Screen
                | Self::Overlay
                | Self::Darken
                | Self::Lighten
                | Self::ColorDodge
                | Self::ColorBurn
                | Self::LinearBurn
                | Self::LinearLight
                | Self::PinLight
                | Self::HardLight
                | Self::SoftLight
                | Self::Difference
                | Self::Exclusion
        )
    }
}

/// Composites a single pixel pair through the kernel of `op`.
#[cfg(test)]
pub(crate) fn composite_one(op: CompOpExt, d: u32, s: u32) -> u32 {
    macro_rules! run {
        ($($name:ident)*) => {
            match op {
                $(CompOpExt::$name => {
                    <kernels::$name as CompOpKernel>::composite(&mut Pixel::new(d), &mut Pixel::new(s))
                })*
            }
        };
    }
    run!(
        SrcOver SrcCopy SrcIn SrcOut SrcAtop DstOver DstCopy DstIn DstOut DstAtop Xor Clear
        Plus Minus Modulate Multiply Screen Overlay Darken Lighten ColorDodge ColorBurn
        LinearBurn LinearLight PinLight HardLight SoftLight Difference Exclusion AlphaInv
    )
}
