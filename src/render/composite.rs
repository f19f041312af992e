use crate::foundation::error::{FlitterError, FlitterResult};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Canvas-style composition operators.
///
/// Every operator applies to the whole destination: pixels the source does not cover are treated
/// as transparent source pixels, so `Copy` and the `*In` operators clear them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    #[default]
    SourceOver,
    SourceAtop,
    SourceIn,
    SourceOut,
    DestinationOver,
    DestinationAtop,
    DestinationIn,
    DestinationOut,
    Lighter,
    Copy,
    Xor,
    /// Plus-darker: `max(0, S + D - 1)` for opaque pixels.
    Darker,
    /// Separable multiply blend.
    Multiply,
    /// Alpha masking; identical to [`CompositeOp::DestinationIn`].
    Mask,
}

impl CompositeOp {
    /// All operators, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::SourceOver,
        Self::SourceAtop,
        Self::SourceIn,
        Self::SourceOut,
        Self::DestinationOver,
        Self::DestinationAtop,
        Self::DestinationIn,
        Self::DestinationOut,
        Self::Lighter,
        Self::Copy,
        Self::Xor,
        Self::Darker,
        Self::Multiply,
        Self::Mask,
    ];

    /// Canvas name of the operator (`"source-over"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::SourceAtop => "source-atop",
            Self::SourceIn => "source-in",
            Self::SourceOut => "source-out",
            Self::DestinationOver => "destination-over",
            Self::DestinationAtop => "destination-atop",
            Self::DestinationIn => "destination-in",
            Self::DestinationOut => "destination-out",
            Self::Lighter => "lighter",
            Self::Copy => "copy",
            Self::Xor => "xor",
            Self::Darker => "darker",
            Self::Multiply => "multiply",
            Self::Mask => "mask",
        }
    }

    /// Parse a canvas operator name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// `true` when a transparent source pixel still changes the destination.
    pub fn affects_uncovered(self) -> bool {
        matches!(
            self,
            Self::SourceIn
                | Self::SourceOut
                | Self::DestinationAtop
                | Self::DestinationIn
                | Self::Copy
                | Self::Mask
        )
    }
}

fn m(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}

fn sat(x: u32) -> u8 {
    x.min(255) as u8
}

/// Scale a premultiplied pixel by a global alpha in `0..=255`.
pub fn scale_alpha(px: PremulRgba8, alpha: u8) -> PremulRgba8 {
    if alpha == 255 {
        return px;
    }
    let a = u32::from(alpha);
    px.map(|c| m(u32::from(c), a) as u8)
}

/// Blend one premultiplied source pixel onto one premultiplied destination pixel.
pub fn blend(dst: PremulRgba8, src: PremulRgba8, op: CompositeOp) -> PremulRgba8 {
    let sa = u32::from(src[3]);
    let da = u32::from(dst[3]);
    let isa = 255 - sa;
    let ida = 255 - da;

    let mut out = [0u8; 4];
    match op {
        CompositeOp::SourceOver => {
            if sa == 255 {
                return src;
            }
            if sa == 0 {
                return dst;
            }
            for i in 0..4 {
                out[i] = sat(u32::from(src[i]) + m(u32::from(dst[i]), isa));
            }
        }
        CompositeOp::SourceAtop => {
            for i in 0..3 {
                out[i] = sat(m(u32::from(src[i]), da) + m(u32::from(dst[i]), isa));
            }
            out[3] = dst[3];
        }
        CompositeOp::SourceIn => {
            for i in 0..4 {
                out[i] = sat(m(u32::from(src[i]), da));
            }
        }
        CompositeOp::SourceOut => {
            for i in 0..4 {
                out[i] = sat(m(u32::from(src[i]), ida));
            }
        }
        CompositeOp::DestinationOver => {
            for i in 0..4 {
                out[i] = sat(m(u32::from(src[i]), ida) + u32::from(dst[i]));
            }
        }
        CompositeOp::DestinationAtop => {
            for i in 0..3 {
                out[i] = sat(m(u32::from(src[i]), ida) + m(u32::from(dst[i]), sa));
            }
            out[3] = src[3];
        }
        CompositeOp::DestinationIn | CompositeOp::Mask => {
            for i in 0..4 {
                out[i] = sat(m(u32::from(dst[i]), sa));
            }
        }
        CompositeOp::DestinationOut => {
            for i in 0..4 {
                out[i] = sat(m(u32::from(dst[i]), isa));
            }
        }
        CompositeOp::Lighter => {
            for i in 0..4 {
                out[i] = src[i].saturating_add(dst[i]);
            }
        }
        CompositeOp::Copy => return src,
        CompositeOp::Xor => {
            for i in 0..4 {
                out[i] = sat(m(u32::from(src[i]), ida) + m(u32::from(dst[i]), isa));
            }
        }
        CompositeOp::Darker => {
            for i in 0..3 {
                let (s, d) = (u32::from(src[i]), u32::from(dst[i]));
                let both = (s * da + d * sa).saturating_sub(sa * da);
                out[i] = sat(m(s, ida) + m(d, isa) + (both + 127) / 255);
            }
            out[3] = sat(sa + da - m(sa, da));
        }
        CompositeOp::Multiply => {
            for i in 0..3 {
                let (s, d) = (u32::from(src[i]), u32::from(dst[i]));
                out[i] = sat(m(s, ida) + m(d, isa) + m(s, d));
            }
            out[3] = sat(sa + da - m(sa, da));
        }
    }
    out
}

fn opacity_u8(opacity: f32) -> u8 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u8
}

/// Composite a whole premultiplied buffer onto another of the same size.
pub fn composite_in_place(
    dst: &mut [u8],
    src: &[u8],
    op: CompositeOp,
    opacity: f32,
) -> FlitterResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(FlitterError::render(
            "composite_in_place expects equal-length rgba8 buffers",
        ));
    }
    let alpha = opacity_u8(opacity);
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let s = scale_alpha([s[0], s[1], s[2], s[3]], alpha);
        let out = blend([d[0], d[1], d[2], d[3]], s, op);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite a solid premultiplied color over every pixel of a buffer.
pub fn fill_in_place(dst: &mut [u8], color: PremulRgba8, op: CompositeOp, opacity: f32) {
    let src = scale_alpha(color, opacity_u8(opacity));
    for d in dst.chunks_exact_mut(4) {
        let out = blend([d[0], d[1], d[2], d[3]], src, op);
        d.copy_from_slice(&out);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
