//! Pointer hit-testing against the laid-out scene.
//!
//! The walk visits children top-most first and prunes every container whose subtree has no
//! listener for the requested types, unless an ancestor listens (the event would bubble there).
//! The same rule applies to leaves, so inert content never hides a listener below it. Leaves are
//! tested against their last global box, their effective mask and finally their content in local
//! space.

use crate::geom::Point;
use crate::scene::bitmap::Bitmap;
use crate::scene::events::EventMask;
use crate::scene::graph::Scene;
use crate::scene::graphics::Graphics;
use crate::scene::node::{Node, NodeId, NodeKind};
use crate::scene::sprite::Sprite;
use crate::scene::text::Text;

/// Leaf content that can answer "is this local point on me".
///
/// `stage` is the same point in stage pixels, for content that caches answers per pointer
/// position.
pub trait HitTestable {
    fn hit_local(&self, p: Point, stage: Point, proximity_sq: f64) -> bool;
}

impl HitTestable for Graphics {
    fn hit_local(&self, p: Point, _stage: Point, _proximity_sq: f64) -> bool {
        self.hit_test(p)
    }
}

impl HitTestable for Bitmap {
    fn hit_local(&self, p: Point, stage: Point, proximity_sq: f64) -> bool {
        self.hit_test(p, stage, proximity_sq)
    }
}

impl HitTestable for Sprite {
    fn hit_local(&self, p: Point, _stage: Point, _proximity_sq: f64) -> bool {
        self.hit_test(p)
    }
}

impl HitTestable for Text {
    fn hit_local(&self, p: Point, _stage: Point, _proximity_sq: f64) -> bool {
        self.hit_test(p)
    }
}

impl NodeKind {
    pub fn as_hit_testable(&self) -> Option<&dyn HitTestable> {
        match self {
            Self::Container | Self::MovieClip(_) => None,
            Self::Shape(g) => Some(g.as_ref()),
            Self::Bitmap(b) => Some(b),
            Self::Sprite(s) => Some(s),
            Self::Text(t) => Some(t),
        }
    }
}

impl Scene {
    /// Top-most leaf under the global `point` that could receive one of `types`.
    ///
    /// `bubble` holds the types listened for by ancestors of the root of the walk.
    pub fn hit_test_object(
        &self,
        point: Point,
        types: EventMask,
        bubble: EventMask,
    ) -> Option<NodeId> {
        let mut out = Vec::with_capacity(1);
        self.hit_node(self.root(), point, types, bubble, &mut out, true);
        tracing::trace!(x = point.x, y = point.y, hit = ?out.first(), "hit test");
        out.pop()
    }

    /// Every leaf under `point` that could receive one of `types`, top-most first.
    pub fn hit_test_objects(&self, point: Point, types: EventMask, bubble: EventMask) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.hit_node(self.root(), point, types, bubble, &mut out, false);
        out
    }

    fn hit_node(
        &self,
        id: NodeId,
        p: Point,
        types: EventMask,
        bubble: EventMask,
        out: &mut Vec<NodeId>,
        first_only: bool,
    ) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        node.hit_visits.set(node.hit_visits.get() + 1);
        if !node.visible() || node.off() {
            return false;
        }

        let Some(children) = &node.children else {
            // Leaves nobody listens through are transparent to the pointer.
            if !types.intersects(bubble | node.listener_mask()) {
                return false;
            }
            let hit = self.hit_leaf(node, p);
            if hit {
                out.push(id);
            }
            return hit;
        };

        if !types.intersects(bubble) && !types.intersects(node.user_events()) {
            tracing::trace!(?id, "prune subtree without listeners");
            return false;
        }
        let bubble = bubble | node.listener_mask();
        let mut any = false;
        for child in children.as_slice().iter().rev() {
            if self.hit_node(*child, p, types, bubble, out, first_only) {
                any = true;
                if first_only {
                    break;
                }
            }
        }
        any
    }

    fn hit_leaf(&self, node: &Node, p: Point) -> bool {
        if !node.render_box().contains(p) {
            return false;
        }
        if let Some(mask) = &node.mask_region
            && !mask.admits(p)
        {
            return false;
        }
        let Some(local) = node.transform().inverse_transform_point(p) else {
            return false;
        };
        let proximity_sq = self.config().hit_proximity_sq;
        match node.kind() {
            // Filtered bitmaps are tested against what is drawn.
            NodeKind::Bitmap(bitmap) => match &node.cache {
                Some(cache) => bitmap.hit_sample(local, p, proximity_sq, &cache.surface),
                None => bitmap.hit_test(local, p, proximity_sq),
            },
            kind => kind
                .as_hit_testable()
                .is_some_and(|h| h.hit_local(local, p, proximity_sq)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/hit.rs"]
mod tests;
