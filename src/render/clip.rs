use std::sync::Arc;

use crate::geom::{BoundingBox, Transform};
use crate::render::composite::CompositeOp;
use crate::scene::graphics::Graphics;

/// How a renderer treats a clipped object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipMethod {
    /// Intersect `rect` into the clip region.
    Scissor,
    /// Render object and mask offscreen, combine with `op`, then composite back.
    Compose,
    /// The mask covers the object entirely: paint normally.
    Show,
    /// The mask excludes the object: paint nothing (but still begin the paint).
    Hide,
}

/// Shape used as the alpha source of a [`ClipMethod::Compose`] clip.
#[derive(Clone, Debug)]
pub struct MaskShape {
    pub graphics: Arc<Graphics>,
    /// Local-to-global transform of the mask node.
    pub transform: Transform,
}

/// Clip/mask descriptor attached to a render object.
#[derive(Clone, Debug)]
pub struct ClipDescriptor {
    pub method: ClipMethod,
    /// Global clip rectangle (the mask's render box).
    pub rect: BoundingBox,
    /// Mask shape; set for [`ClipMethod::Compose`].
    pub mask: Option<MaskShape>,
    /// Operator combining object and mask for [`ClipMethod::Compose`].
    pub op: CompositeOp,
}

impl ClipDescriptor {
    pub fn scissor(rect: BoundingBox) -> Self {
        Self {
            method: ClipMethod::Scissor,
            rect,
            mask: None,
            op: CompositeOp::SourceOver,
        }
    }

    pub fn show(rect: BoundingBox) -> Self {
        Self {
            method: ClipMethod::Show,
            rect,
            mask: None,
            op: CompositeOp::SourceOver,
        }
    }

    pub fn hide(rect: BoundingBox) -> Self {
        Self {
            method: ClipMethod::Hide,
            rect,
            mask: None,
            op: CompositeOp::SourceOver,
        }
    }

    pub fn compose(rect: BoundingBox, mask: MaskShape, op: CompositeOp) -> Self {
        Self {
            method: ClipMethod::Compose,
            rect,
            mask: Some(mask),
            op,
        }
    }
}
