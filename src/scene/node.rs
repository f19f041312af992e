use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use crate::animation::timeline::{MovieClip, TimelineDriven};
use crate::geom::{BoundingBox, Point, Rect, Transform, TransformParams};
use crate::render::clip::{ClipDescriptor, MaskShape};
use crate::render::composite::CompositeOp;
use crate::render::renderer::{RenderObject, Renderer};
use crate::render::surface::ImageSurface;
use crate::scene::bitmap::Bitmap;
use crate::scene::events::{EventMask, ListenerEntry};
use crate::scene::graphics::Graphics;
use crate::scene::object_list::LockedList;
use crate::scene::sprite::Sprite;
use crate::scene::text::Text;

/// Generational handle to a node in a [`crate::Scene`].
///
/// A handle outlives its node harmlessly: once the slot is reused the generation differs and
/// lookups return `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> usize {
        self.index as usize
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

bitflags::bitflags! {
    /// What a node must recompute on its next layout.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// Local params, alpha or an ancestor's transform changed.
        const TRANSFORM = 0b0000_0001;
        /// Leaf content changed (graphics, image, filter, text).
        const SHAPE     = 0b0000_0010;
        /// Mask assignment or mask geometry changed.
        const MASK      = 0b0000_0100;
        const ALL = Self::TRANSFORM.bits() | Self::SHAPE.bits() | Self::MASK.bits();
    }
}

/// What a node is.
#[derive(Debug)]
pub enum NodeKind {
    Container,
    MovieClip(Box<MovieClip>),
    Shape(Arc<Graphics>),
    Bitmap(Bitmap),
    Sprite(Sprite),
    Text(Text),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container | Self::MovieClip(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::MovieClip(_) => "movie-clip",
            Self::Shape(_) => "shape",
            Self::Bitmap(_) => "bitmap",
            Self::Sprite(_) => "sprite",
            Self::Text(_) => "text",
        }
    }

    /// Local bounds of leaf content; empty for containers.
    pub fn local_bounds(&self) -> BoundingBox {
        match self {
            Self::Container | Self::MovieClip(_) => BoundingBox::EMPTY,
            Self::Shape(g) => g.bounds(),
            Self::Bitmap(b) => b.local_bounds(),
            Self::Sprite(s) => s.local_bounds(),
            Self::Text(t) => t.local_bounds(),
        }
    }

    pub fn timeline(&self) -> Option<&dyn TimelineDriven> {
        match self {
            Self::MovieClip(clip) => Some(clip.as_ref()),
            Self::Sprite(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn timeline_mut(&mut self) -> Option<&mut dyn TimelineDriven> {
        match self {
            Self::MovieClip(clip) => Some(clip.as_mut()),
            Self::Sprite(sprite) => Some(sprite),
            _ => None,
        }
    }
}

/// Renderer-side resource owned by a node: a rasterized shape or a filtered bitmap.
#[derive(Debug)]
pub(crate) struct NodeCache {
    pub(crate) surface: Arc<ImageSurface>,
    /// Local position of the surface's top-left pixel.
    pub(crate) origin: Point,
    /// Surface pixels per local unit.
    pub(crate) scale: f64,
}

/// Global region of a mask, shared by the masked node's subtree for one frame.
#[derive(Clone, Debug)]
pub(crate) struct MaskRegion {
    pub(crate) graphics: Arc<Graphics>,
    pub(crate) transform: Transform,
    pub(crate) rect: BoundingBox,
    /// Axis-aligned rectangle mask: clip with a scissor.
    pub(crate) rectangular: bool,
}

impl MaskRegion {
    pub(crate) fn clip_for(&self, object: &BoundingBox) -> ClipDescriptor {
        if !self.rect.intersects(object) {
            ClipDescriptor::hide(self.rect)
        } else if self.rectangular {
            if self.rect.contains_box(object) {
                ClipDescriptor::show(self.rect)
            } else {
                ClipDescriptor::scissor(self.rect)
            }
        } else {
            ClipDescriptor::compose(
                self.rect,
                MaskShape {
                    graphics: Arc::clone(&self.graphics),
                    transform: self.transform,
                },
                CompositeOp::DestinationIn,
            )
        }
    }

    /// Whether a global point passes the mask.
    pub(crate) fn admits(&self, p: Point) -> bool {
        self.rect.contains(p)
            && (self.rectangular
                || self
                    .transform
                    .inverse_transform_point(p)
                    .is_some_and(|local| self.graphics.hit_test(local)))
    }
}

/// A display object.
///
/// Nodes live in a [`crate::Scene`] arena and refer to each other by [`NodeId`]. Setters record
/// what changed in the dirty flags; derived state (global transform, alpha, render box, clip)
/// is refreshed by the next layout.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: Option<String>,
    pub(crate) params: TransformParams,
    pub(crate) alpha: f64,
    pub(crate) visible: bool,
    pub(crate) off: bool,
    pub(crate) composite: CompositeOp,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<LockedList<NodeId>>,
    pub(crate) kind: NodeKind,

    pub(crate) transform: Transform,
    pub(crate) global_alpha: f64,
    pub(crate) render_box: BoundingBox,
    pub(crate) dirty: DirtyFlags,
    pub(crate) mask: Option<NodeId>,
    /// Effective mask (own or inherited) from the last layout.
    pub(crate) mask_region: Option<Rc<MaskRegion>>,
    pub(crate) clip: Option<ClipDescriptor>,

    pub(crate) listeners: LockedList<ListenerEntry>,
    pub(crate) user_events: EventMask,

    pub(crate) cache: Option<NodeCache>,
    pub(crate) bounds_cache: Cell<Option<BoundingBox>>,
    pub(crate) hit_visits: Cell<u32>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        let children = kind.is_container().then(LockedList::new);
        Self {
            name: None,
            params: TransformParams::default(),
            alpha: 1.0,
            visible: true,
            off: false,
            composite: CompositeOp::SourceOver,
            parent: None,
            children,
            kind,
            transform: Transform::IDENTITY,
            global_alpha: 1.0,
            render_box: BoundingBox::EMPTY,
            dirty: DirtyFlags::ALL,
            mask: None,
            mask_region: None,
            clip: None,
            listeners: LockedList::new(),
            user_events: EventMask::EMPTY,
            cache: None,
            bounds_cache: Cell::new(None),
            hit_visits: Cell::new(0),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    pub fn set_params(&mut self, params: TransformParams) {
        if params != self.params {
            self.params = params;
            self.dirty |= DirtyFlags::TRANSFORM;
        }
    }

    /// Mutate the local params in place; always marks the transform dirty.
    pub fn params_mut(&mut self) -> &mut TransformParams {
        self.dirty |= DirtyFlags::TRANSFORM;
        &mut self.params
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.set_params(TransformParams { x, y, ..self.params });
    }

    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        self.set_params(TransformParams {
            scale_x,
            scale_y,
            ..self.params
        });
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.set_params(TransformParams {
            rotation,
            ..self.params
        });
    }

    pub fn set_skew(&mut self, skew_x: f64, skew_y: f64) {
        self.set_params(TransformParams {
            skew_x,
            skew_y,
            ..self.params
        });
    }

    pub fn set_registration(&mut self, reg_x: f64, reg_y: f64) {
        self.set_params(TransformParams {
            reg_x,
            reg_y,
            ..self.params
        });
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        if alpha != self.alpha {
            self.alpha = alpha;
            self.dirty |= DirtyFlags::TRANSFORM;
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Hidden nodes skip layout; showing one again recomputes everything.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.dirty = DirtyFlags::ALL;
        }
        self.visible = visible;
    }

    /// Timeline-controlled presence: an "off" node is skipped like a hidden one and detached
    /// from movie clips that manage it.
    pub fn off(&self) -> bool {
        self.off
    }

    pub fn set_off(&mut self, off: bool) {
        if !off && self.off {
            self.dirty = DirtyFlags::ALL;
        }
        self.off = off;
    }

    pub fn composite(&self) -> CompositeOp {
        self.composite
    }

    pub fn set_composite(&mut self, op: CompositeOp) {
        self.composite = op;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in paint order; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_ref().map_or(&[][..], LockedList::as_slice)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable access to the node's content; marks the content dirty.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        self.dirty |= DirtyFlags::SHAPE;
        &mut self.kind
    }

    pub fn movie_clip(&self) -> Option<&MovieClip> {
        match &self.kind {
            NodeKind::MovieClip(clip) => Some(clip.as_ref()),
            _ => None,
        }
    }

    pub fn movie_clip_mut(&mut self) -> Option<&mut MovieClip> {
        match &mut self.kind {
            NodeKind::MovieClip(clip) => Some(clip.as_mut()),
            _ => None,
        }
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        match &self.kind {
            NodeKind::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        match &mut self.kind {
            NodeKind::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&Text> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut Text> {
        self.dirty |= DirtyFlags::SHAPE;
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn graphics(&self) -> Option<&Arc<Graphics>> {
        match &self.kind {
            NodeKind::Shape(g) => Some(g),
            _ => None,
        }
    }

    /// Replace a shape's graphics. Ignored for other kinds.
    pub fn set_graphics(&mut self, graphics: Arc<Graphics>) {
        if let NodeKind::Shape(g) = &mut self.kind
            && !Arc::ptr_eq(g, &graphics)
        {
            *g = graphics;
            self.dirty |= DirtyFlags::SHAPE;
        }
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        match &self.kind {
            NodeKind::Bitmap(b) => Some(b),
            _ => None,
        }
    }

    pub fn bitmap_mut(&mut self) -> Option<&mut Bitmap> {
        self.dirty |= DirtyFlags::SHAPE;
        match &mut self.kind {
            NodeKind::Bitmap(b) => Some(b),
            _ => None,
        }
    }

    /// Local-to-global transform from the last layout.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Product of ancestor alphas from the last layout.
    pub fn global_alpha(&self) -> f64 {
        self.global_alpha
    }

    /// Global bounding box of this subtree from the last layout.
    pub fn render_box(&self) -> BoundingBox {
        self.render_box
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    pub fn mask(&self) -> Option<NodeId> {
        self.mask
    }

    pub fn clip(&self) -> Option<&ClipDescriptor> {
        self.clip.as_ref()
    }

    /// Event types listened for in this subtree, as of the last layout.
    pub fn user_events(&self) -> EventMask {
        self.user_events
    }

    /// Event types this node itself listens for.
    pub fn listener_mask(&self) -> EventMask {
        self.listeners.iter().map(|e| e.kind).collect()
    }

    /// How often hit-testing visited this node since the last reset.
    pub fn hit_visits(&self) -> u32 {
        self.hit_visits.get()
    }

    pub fn reset_hit_visits(&self) {
        self.hit_visits.set(0);
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    fn paint_image(&self, renderer: &mut dyn Renderer, image: &ImageSurface, src: Rect, dst: Rect) {
        if src.width() > 0.0 && src.height() > 0.0 {
            renderer.draw_partial(image, src, dst);
        }
    }
}

impl RenderObject for Node {
    fn render_box(&self) -> BoundingBox {
        self.render_box
    }

    fn clip(&self) -> Option<&ClipDescriptor> {
        self.clip.as_ref()
    }

    fn begin_paint_object(&self, renderer: &mut dyn Renderer) {
        renderer.set_transformation(&self.transform);
        renderer.set_alpha(self.global_alpha);
        renderer.set_composition(self.composite);
    }

    fn paint_object(&self, renderer: &mut dyn Renderer) {
        match &self.kind {
            NodeKind::Container | NodeKind::MovieClip(_) => {}
            NodeKind::Shape(_) => {
                let Some(cache) = &self.cache else {
                    return;
                };
                let inv = 1.0 / cache.scale;
                let placed = self
                    .transform
                    .multiply(&Transform::translate(cache.origin.x, cache.origin.y))
                    .multiply(&Transform::scale(inv, inv));
                renderer.set_transformation(&placed);
                let (w, h) = (cache.surface.width(), cache.surface.height());
                renderer.draw_canvas(
                    &cache.surface,
                    Rect::new(0.0, 0.0, f64::from(w), f64::from(h)),
                );
            }
            NodeKind::Bitmap(bitmap) => {
                let image = self
                    .cache
                    .as_ref()
                    .map_or(bitmap.image().as_ref(), |c| c.surface.as_ref());
                let src = bitmap.source_rect();
                let dst = Rect::new(0.0, 0.0, src.width(), src.height());
                self.paint_image(renderer, image, src, dst);
            }
            NodeKind::Sprite(sprite) => {
                let Some(frame) = sprite.frame() else {
                    return;
                };
                let Some(image) = sprite.sheet().image(frame.image) else {
                    return;
                };
                let dst = Rect::new(
                    -frame.reg_x,
                    -frame.reg_y,
                    frame.rect.width() - frame.reg_x,
                    frame.rect.height() - frame.reg_y,
                );
                self.paint_image(renderer, image, frame.rect, dst);
            }
            NodeKind::Text(text) => renderer.draw_text(text),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
