//! Filtered image copies built only from composition operators.
//!
//! A color transform `diag(r, g, b, 1) + offset` is reduced to solid fills and image
//! composites, so any backend that can composite can also filter:
//!
//! - uniform scale (`r == g == b`, no offset): `copy`, then `source-atop` black at `1 - r`;
//! - otherwise an opaque working copy holding the straight colors is scaled per channel, either
//!   with a single `multiply` fill or, when the backend lacks multiply, by isolating each
//!   channel with a `darker` fill and dimming it with `source-over` black before merging the
//!   three channels with `lighter`;
//! - offsets are `lighter` (positive) or `darker` (negative) solid fills;
//! - `destination-in` with the source restores its alpha.
//!
//! Opaque and fully transparent pixels come out exact. Partially transparent pixels can be off
//! by a step or two per channel from rounding through the straight colors.

use std::sync::Arc;

use crate::foundation::error::FlitterResult;
use crate::render::composite::CompositeOp;
use crate::render::renderer::RenderCaps;
use crate::render::surface::{Color, ImageSurface};

/// Per-channel color transform: `out = in * multiplier + offset`.
///
/// Multipliers are clamped to `0.0..=1.0`; offsets are in 8-bit units (`-255.0..=255.0`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorTransform {
    pub multiplier: [f64; 3],
    pub offset: [f64; 3],
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorTransform {
    pub const IDENTITY: Self = Self {
        multiplier: [1.0; 3],
        offset: [0.0; 3],
    };

    pub fn new(multiplier: [f64; 3], offset: [f64; 3]) -> Self {
        Self { multiplier, offset }
    }

    /// Uniform brightness scale.
    pub fn scale(k: f64) -> Self {
        Self::new([k; 3], [0.0; 3])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn clamped_multiplier(&self) -> [f64; 3] {
        self.multiplier.map(|m| m.clamp(0.0, 1.0))
    }

    fn offset_u8(&self) -> [i32; 3] {
        self.offset.map(|o| o.clamp(-255.0, 255.0).round() as i32)
    }

    /// Apply to one straight-alpha channel triple. Reference for tests and the CLI.
    pub fn apply_rgb(&self, rgb: [u8; 3]) -> [u8; 3] {
        let m = self.clamped_multiplier();
        let o = self.offset_u8();
        let mut out = [0u8; 3];
        for i in 0..3 {
            let v = (f64::from(rgb[i]) * m[i]).round() as i32 + o[i];
            out[i] = v.clamp(0, 255) as u8;
        }
        out
    }
}

/// Image filters a bitmap can carry.
#[derive(Clone, Debug)]
pub enum Filter {
    Color(ColorTransform),
    /// Multiply source alpha by the mask's alpha (same size as the source).
    AlphaMask(Arc<ImageSurface>),
}

/// Builds filtered copies of images.
#[derive(Clone, Copy, Debug, Default)]
pub struct Composer {
    caps: RenderCaps,
}

impl Composer {
    pub fn new(caps: RenderCaps) -> Self {
        Self { caps }
    }

    pub fn caps(&self) -> RenderCaps {
        self.caps
    }

    /// Apply any filter; the result is a new surface with a fresh id.
    pub fn apply(&self, src: &ImageSurface, filter: &Filter) -> FlitterResult<ImageSurface> {
        match filter {
            Filter::Color(ct) => Ok(self.apply_color(src, ct)),
            Filter::AlphaMask(mask) => self.apply_alpha_mask(src, mask),
        }
    }

    /// `copy`, then `destination-in` with the mask.
    pub fn apply_alpha_mask(
        &self,
        src: &ImageSurface,
        mask: &ImageSurface,
    ) -> FlitterResult<ImageSurface> {
        let mut out = src.duplicate();
        out.composite(mask, CompositeOp::DestinationIn, 1.0)?;
        Ok(out)
    }

    /// Apply a color transform.
    pub fn apply_color(&self, src: &ImageSurface, ct: &ColorTransform) -> ImageSurface {
        let m = ct.clamped_multiplier();
        let offset = ct.offset_u8();
        let uniform = m[0] == m[1] && m[1] == m[2];
        let has_offset = offset.iter().any(|o| *o != 0);

        if uniform && !has_offset {
            let mut out = src.duplicate();
            if m[0] < 1.0 {
                out.fill(Color::BLACK, CompositeOp::SourceAtop, (1.0 - m[0]) as f32);
            }
            return out;
        }

        let mut work = src.to_opaque_straight();

        if uniform {
            if m[0] < 1.0 {
                work.fill(Color::BLACK, CompositeOp::SourceOver, (1.0 - m[0]) as f32);
            }
        } else if self.caps.supports_multiply {
            let tint = m.map(|c| (c * 255.0).round() as u8);
            work.fill(
                Color::rgb(tint[0], tint[1], tint[2]),
                CompositeOp::Multiply,
                1.0,
            );
        } else {
            work = self.scale_channels_without_multiply(&work, m);
        }

        let add = offset.map(|o| o.max(0) as u8);
        if add.iter().any(|c| *c > 0) {
            work.fill(
                Color::rgb(add[0], add[1], add[2]),
                CompositeOp::Lighter,
                1.0,
            );
        }
        let sub = offset.map(|o| (255 + o.min(0)) as u8);
        if sub.iter().any(|c| *c < 255) {
            work.fill(
                Color::rgb(sub[0], sub[1], sub[2]),
                CompositeOp::Darker,
                1.0,
            );
        }

        // `work` and `src` always share dimensions, so this cannot fail.
        let _ = work.composite(src, CompositeOp::DestinationIn, 1.0);
        work
    }

    /// Per-channel multiply from `copy`, `darker`, `source-over` and `lighter` only.
    fn scale_channels_without_multiply(&self, opaque: &ImageSurface, m: [f64; 3]) -> ImageSurface {
        const CHANNEL_MASKS: [Color; 3] = [
            Color::rgb(255, 0, 0),
            Color::rgb(0, 255, 0),
            Color::rgb(0, 0, 255),
        ];

        let mut merged = ImageSurface::new(opaque.width(), opaque.height());
        for (mask, factor) in CHANNEL_MASKS.into_iter().zip(m) {
            if factor <= 0.0 {
                continue;
            }
            let mut channel = opaque.duplicate();
            channel.fill(mask, CompositeOp::Darker, 1.0);
            if factor < 1.0 {
                channel.fill(Color::BLACK, CompositeOp::SourceOver, (1.0 - factor) as f32);
            }
            let _ = merged.composite(&channel, CompositeOp::Lighter, 1.0);
        }
        // Keep the working copy opaque even when every channel was dropped.
        merged.fill(Color::BLACK, CompositeOp::DestinationOver, 1.0);
        merged
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composer.rs"]
mod tests;
