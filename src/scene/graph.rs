//! The node arena and its per-frame passes.
//!
//! Nodes occupy slots in a vector; destroyed slots go to a free list and bump their
//! generation, so stale [`NodeId`]s resolve to `None` instead of aliasing a new node.
//!
//! A frame is `layout` then `paint`. Layout walks the tree top-down, recomputing only what the
//! dirty flags ask for, and runs each movie clip's timeline before its children are visited.

use std::rc::Rc;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::animation::timeline::{FrameTarget, MovieClip};
use crate::animation::tween::{Tween, TweenId};
use crate::foundation::config::RuntimeConfig;
use crate::foundation::context::Runtime;
use crate::foundation::error::{FlitterError, FlitterResult};
use crate::geom::{BoundingBox, DirtyKind, Point, Rect, Transform};
use crate::render::composer::Composer;
use crate::render::renderer::Renderer;
use crate::scene::bitmap::Bitmap;
use crate::scene::events::{
    Event, EventMask, EventPhase, EventType, Listener, ListenerEntry, ListenerId,
};
use crate::scene::graphics::Graphics;
use crate::scene::node::{DirtyFlags, MaskRegion, Node, NodeCache, NodeId, NodeKind};
use crate::scene::sprite::Sprite;
use crate::scene::text::Text;

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Timeline command issued while the clip's own timeline is running; replayed right after.
#[derive(Debug)]
enum ClipCommand {
    Goto { target: FrameTarget, stop: bool },
    Pause(bool),
}

/// A display list: the node arena, the root container, registered tweens and the runtime
/// context shared by everything in it.
#[derive(Debug)]
pub struct Scene {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    root: NodeId,
    runtime: Runtime,
    tweens: Vec<(TweenId, Tween)>,
    retired_tweens: Vec<TweenId>,
    advancing_tweens: bool,
    next_tween: u64,
    next_listener: u64,
    active_clips: SmallVec<[NodeId; 4]>,
    deferred: Vec<(NodeId, ClipCommand)>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Scene {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_runtime(Runtime::new(config))
    }

    pub fn with_runtime(runtime: Runtime) -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            runtime,
            tweens: Vec::new(),
            retired_tweens: Vec::new(),
            advancing_tweens: false,
            next_tween: 0,
            next_listener: 0,
            active_clips: SmallVec::new(),
            deferred: Vec::new(),
        };
        scene.root = scene.create(NodeKind::Container);
        scene
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn config(&self) -> &RuntimeConfig {
        self.runtime.config()
    }

    /// The stage container every visible node descends from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    // -- Allocation --

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = Node::new(kind);
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    pub fn create_container(&mut self) -> NodeId {
        self.create(NodeKind::Container)
    }

    pub fn create_movie_clip(&mut self, clip: MovieClip) -> NodeId {
        self.create(NodeKind::MovieClip(Box::new(clip)))
    }

    pub fn create_shape(&mut self, graphics: impl Into<Arc<Graphics>>) -> NodeId {
        self.create(NodeKind::Shape(graphics.into()))
    }

    pub fn create_bitmap(&mut self, bitmap: Bitmap) -> NodeId {
        self.create(NodeKind::Bitmap(bitmap))
    }

    pub fn create_sprite(&mut self, sprite: Sprite) -> NodeId {
        self.create(NodeKind::Sprite(sprite))
    }

    pub fn create_text(&mut self, text: Text) -> NodeId {
        self.create(NodeKind::Text(text))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.get(id)
    }

    /// Mutable access to a node. Cached local bounds of the node and its ancestors are dropped.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.get(id)?;
        self.invalidate_bounds(id);
        self.get_mut(id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_mut())
    }

    fn require(&self, id: NodeId) -> FlitterResult<&Node> {
        self.get(id)
            .ok_or_else(|| FlitterError::scene(format!("node {id:?} does not exist")))
    }

    fn invalidate_bounds(&self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(node) = cur.and_then(|c| self.get(c)) {
            node.bounds_cache.set(None);
            cur = node.parent;
        }
    }

    // -- Topology --

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Children of `id` in paint order, including changes made during an ongoing traversal.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[][..], Node::children)
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Append `child` to `parent`, moving it from its current parent if it has one.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> FlitterResult<()> {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Insert `child` at `index` (clamped) under `parent`.
    ///
    /// Moving a node between parents is a plain relink: its cached renderer resources stay.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> FlitterResult<()> {
        if !self.require(parent)?.kind.is_container() {
            return Err(FlitterError::scene(format!(
                "node {parent:?} ({}) cannot have children",
                self.require(parent)?.kind.name()
            )));
        }
        let old_parent = self.require(child)?.parent;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(FlitterError::scene(format!(
                "adding {child:?} under {parent:?} would create a cycle"
            )));
        }
        if let Some(old) = old_parent {
            self.unlink(old, child);
        }
        if let Some(list) = self.get_mut(parent).and_then(|p| p.children.as_mut()) {
            list.insert(index, child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.dirty = DirtyFlags::ALL;
        }
        self.invalidate_bounds(parent);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns `false` if it was not a child of `parent`.
    ///
    /// With `release_on_detach` configured, renderer resources cached by the detached subtree
    /// are queued for release.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.unlink(parent, child);
        self.reset_child(child);
        if self.runtime.config().release_on_detach {
            self.release_subtree(child);
        }
        tracing::debug!(?parent, ?child, "remove child");
        true
    }

    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let child = *self.children(parent).get(index)?;
        self.remove_child(parent, child).then_some(child)
    }

    /// Detach (or destroy) every child of `parent`.
    pub fn remove_all_children(&mut self, parent: NodeId, destroy: bool) {
        for child in self.children(parent).to_vec() {
            if destroy {
                self.destroy(child);
            } else {
                self.remove_child(parent, child);
            }
        }
    }

    /// Destroy a node and its subtree, releasing every cached renderer resource.
    ///
    /// A mask node that is not itself in the tree is destroyed along with the node it masks.
    /// Returns `false` for stale handles and for the root.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(node) = self.get(id) else {
            return false;
        };
        let (parent, mask) = (node.parent, node.mask);
        if let Some(p) = parent {
            self.unlink(p, id);
        }
        for child in self.children(id).to_vec() {
            self.destroy(child);
        }
        self.release_subtree(id);
        if let Some(mask) = mask
            && mask != id
            && self.get(mask).is_some_and(|m| m.parent.is_none())
        {
            self.destroy(mask);
        }

        let slot = &mut self.slots[id.index()];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index() as u32);
        tracing::debug!(?id, "destroy node");
        true
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Some(list) = self.get_mut(parent).and_then(|p| p.children.as_mut()) {
            list.remove_item(&child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = None;
            if let Some(clip) = node.movie_clip_mut() {
                clip.restart_sync();
            }
        }
        self.invalidate_bounds(parent);
    }

    /// Clear state derived from the old parent. Listeners stay registered.
    fn reset_child(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
            node.clip = None;
            node.mask_region = None;
            node.render_box = BoundingBox::EMPTY;
            node.dirty = DirtyFlags::ALL;
        }
    }

    /// Queue every cache in the subtree for release. Already released caches are skipped.
    fn release_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get_mut(n) else {
                continue;
            };
            let cache = node.cache.take();
            stack.extend_from_slice(node.children());
            if let Some(cache) = cache {
                self.runtime.queue_release(cache.surface.id());
            }
        }
    }

    /// Mask `id` with the shape node `mask`, or remove its mask.
    ///
    /// The mask is placed in the parent space of the masked node. It may stay outside the tree.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<NodeId>) -> FlitterResult<()> {
        if let Some(m) = mask
            && self.require(m)?.graphics().is_none()
        {
            return Err(FlitterError::scene(format!("mask {m:?} is not a shape")));
        }
        let node = self
            .node_mut(id)
            .ok_or_else(|| FlitterError::scene(format!("node {id:?} does not exist")))?;
        node.mask = mask;
        node.dirty |= DirtyFlags::MASK;
        Ok(())
    }

    // -- Frame passes --

    /// Bring every visible node up to date for `time` and return the event types listened for
    /// anywhere in the visible tree.
    #[tracing::instrument(skip_all, fields(time))]
    pub fn layout(&mut self, renderer: &mut dyn Renderer, time: f64) -> EventMask {
        let root = self.root;
        let (events, _) = self.layout_node(
            renderer,
            time,
            root,
            &Transform::IDENTITY,
            1.0,
            DirtyFlags::empty(),
            None,
        );
        events
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_node(
        &mut self,
        renderer: &mut dyn Renderer,
        time: f64,
        id: NodeId,
        parent_transform: &Transform,
        parent_alpha: f64,
        inherited: DirtyFlags,
        inherited_mask: Option<Rc<MaskRegion>>,
    ) -> (EventMask, BoundingBox) {
        let Some(node) = self.get_mut(id) else {
            return (EventMask::EMPTY, BoundingBox::EMPTY);
        };
        if !node.visible || node.off {
            // Keep what changed for when the node is shown again.
            node.dirty |= inherited;
            node.render_box = BoundingBox::EMPTY;
            node.clip = None;
            return (EventMask::EMPTY, BoundingBox::EMPTY);
        }
        let dirty = node.dirty | inherited;
        if dirty.contains(DirtyFlags::TRANSFORM) {
            node.transform = Transform::append_transform(parent_transform, &node.params);
            node.global_alpha = parent_alpha * node.alpha;
        }
        let (transform, alpha) = (node.transform, node.global_alpha);
        let is_container = node.kind.is_container();
        let is_clip = matches!(node.kind, NodeKind::MovieClip(_));

        if !is_container && self.refresh_content(renderer, id, dirty, time) {
            self.invalidate_bounds(id);
        }
        let mask = self.mask_region(id, parent_transform).or(inherited_mask);

        let Some(node) = self.get_mut(id) else {
            return (EventMask::EMPTY, BoundingBox::EMPTY);
        };
        let mut bbox = transform.transform_box(&node.kind.local_bounds());
        node.clip = if is_container {
            None
        } else {
            mask.as_ref().map(|m| m.clip_for(&bbox))
        };
        node.mask_region = mask.clone();
        let mut events = node.listener_mask();

        if is_container {
            // Timeline first, so children are laid out against this frame's values.
            if is_clip {
                self.update_tweens(id, time);
            }
            let children: SmallVec<[NodeId; 16]> =
                match self.get_mut(id).and_then(|n| n.children.as_mut()) {
                    Some(list) => {
                        list.lock();
                        list.snapshot().iter().copied().collect()
                    }
                    None => SmallVec::new(),
                };
            let child_dirty = dirty & (DirtyFlags::TRANSFORM | DirtyFlags::MASK);
            for child in children {
                if self.parent(child) != Some(id) {
                    continue;
                }
                let (child_events, child_box) = self.layout_node(
                    renderer,
                    time,
                    child,
                    &transform,
                    alpha,
                    child_dirty,
                    mask.clone(),
                );
                events |= child_events;
                bbox.inflate_box(&child_box);
            }
            if let Some(list) = self.get_mut(id).and_then(|n| n.children.as_mut()) {
                list.unlock();
            }
        }

        if let Some(node) = self.get_mut(id) {
            node.render_box = bbox;
            node.user_events = events;
            node.dirty = DirtyFlags::empty();
        }
        (events, bbox)
    }

    /// Update leaf content that depends on the frame: raster caches, filtered bitmaps, sprite
    /// frames and text metrics. Returns whether the local bounds changed.
    fn refresh_content(
        &mut self,
        renderer: &mut dyn Renderer,
        id: NodeId,
        dirty: DirtyFlags,
        time: f64,
    ) -> bool {
        let Self { slots, runtime, .. } = self;
        let Some(node) = slots.get_mut(id.index()).and_then(|s| s.node.as_mut()) else {
            return false;
        };
        let reshaped = dirty.contains(DirtyFlags::SHAPE);
        match &mut node.kind {
            NodeKind::Shape(graphics) => {
                let (sx, sy) = node.transform.axis_scales();
                let scale = sx.max(sy);
                if reshaped || node.cache.as_ref().is_none_or(|c| c.scale != scale) {
                    if let Some(old) = node.cache.take() {
                        runtime.queue_release(old.surface.id());
                    }
                    node.cache = graphics.rasterize(scale).map(|r| NodeCache {
                        surface: Arc::new(r.surface),
                        origin: r.origin,
                        scale: r.scale,
                    });
                }
                false
            }
            NodeKind::Bitmap(bitmap) => {
                match bitmap.filter() {
                    Some(filter) if reshaped || node.cache.is_none() => {
                        if let Some(old) = node.cache.take() {
                            runtime.queue_release(old.surface.id());
                        }
                        match Composer::new(runtime.caps()).apply(bitmap.image(), filter) {
                            Ok(surface) => {
                                node.cache = Some(NodeCache {
                                    surface: Arc::new(surface),
                                    origin: Point::ZERO,
                                    scale: 1.0,
                                });
                            }
                            Err(err) => tracing::debug!(?id, %err, "bitmap filter failed"),
                        }
                    }
                    None => {
                        if let Some(old) = node.cache.take() {
                            runtime.queue_release(old.surface.id());
                        }
                    }
                    Some(_) => {}
                }
                false
            }
            NodeKind::Sprite(sprite) => {
                let before = sprite.current_frame();
                sprite.tick(time);
                sprite.current_frame() != before
            }
            NodeKind::Text(text) => {
                if !reshaped && text.metrics().is_some() {
                    return false;
                }
                let metrics = renderer.measure_text(text);
                let changed = metrics != text.metrics();
                text.set_metrics(metrics);
                changed
            }
            NodeKind::Container | NodeKind::MovieClip(_) => false,
        }
    }

    /// Global region of the node's own mask, placed in the node's parent space.
    fn mask_region(&mut self, id: NodeId, parent_transform: &Transform) -> Option<Rc<MaskRegion>> {
        let mask_id = self.get(id)?.mask?;
        let mask = self.get_mut(mask_id)?;
        let graphics = Arc::clone(mask.graphics()?);
        let transform = Transform::append_transform(parent_transform, &mask.params);
        let rect = transform.transform_box(&graphics.bounds());
        mask.transform = transform;
        mask.render_box = rect;
        mask.dirty = DirtyFlags::empty();
        let rectangular = graphics.as_rect().is_some() && transform.kind() != DirtyKind::Skew;
        Some(Rc::new(MaskRegion {
            graphics,
            transform,
            rect,
            rectangular,
        }))
    }

    /// Paint every visible leaf with a non-empty box, back to front.
    #[tracing::instrument(skip_all)]
    pub fn paint(&self, renderer: &mut dyn Renderer) {
        renderer.begin_frame();
        self.paint_node(renderer, self.root);
        renderer.end_frame();
    }

    fn paint_node(&self, renderer: &mut dyn Renderer, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        if !node.visible || node.off {
            return;
        }
        match &node.children {
            Some(children) => {
                for child in children.as_slice() {
                    self.paint_node(renderer, *child);
                }
            }
            None => {
                if !node.render_box.is_empty() || matches!(node.kind, NodeKind::Text(_)) {
                    renderer.add_object(node);
                }
            }
        }
    }

    /// Forward queued resource releases to `renderer`.
    pub fn flush_releases(&mut self, renderer: &mut dyn Renderer) -> usize {
        self.runtime.drain_releases(renderer)
    }

    /// Local bounds of a node's content and visible descendants, in its own coordinate space.
    ///
    /// Cached per node until the node or one of its descendants is modified.
    pub fn get_bounds(&self, id: NodeId) -> Option<Rect> {
        self.local_bounds(id).to_rect()
    }

    fn local_bounds(&self, id: NodeId) -> BoundingBox {
        let Some(node) = self.get(id) else {
            return BoundingBox::EMPTY;
        };
        if let Some(b) = node.bounds_cache.get() {
            return b;
        }
        let b = match &node.children {
            Some(children) => {
                let mut acc = BoundingBox::EMPTY;
                for child in children.as_slice() {
                    let Some(c) = self.get(*child) else {
                        continue;
                    };
                    if !c.visible || c.off {
                        continue;
                    }
                    let cb = self.local_bounds(*child);
                    acc.inflate_box(&Transform::from_params(&c.params).transform_box(&cb));
                }
                acc
            }
            None => node.kind.local_bounds(),
        };
        node.bounds_cache.set(Some(b));
        b
    }

    // -- Events --

    /// Register `listener` for `kind` events on `id`.
    pub fn add_listener(
        &mut self,
        id: NodeId,
        kind: EventType,
        listener: Listener,
    ) -> FlitterResult<ListenerId> {
        self.next_listener += 1;
        let listener_id = ListenerId(self.next_listener);
        let node = self
            .get_mut(id)
            .ok_or_else(|| FlitterError::scene(format!("node {id:?} does not exist")))?;
        node.listeners.push(ListenerEntry {
            id: listener_id,
            kind,
            listener,
        });
        // Make the subtree interest visible to hit-testing before the next layout.
        let mut cur = Some(id);
        while let Some(n) = cur.and_then(|c| self.get_mut(c)) {
            n.user_events.insert(kind);
            cur = n.parent;
        }
        Ok(listener_id)
    }

    /// Shorthand for [`Scene::add_listener`] with a closure.
    pub fn on(
        &mut self,
        id: NodeId,
        kind: EventType,
        f: impl Fn(&mut Scene, &Event) + 'static,
    ) -> FlitterResult<ListenerId> {
        self.add_listener(id, kind, Listener::callback(f))
    }

    pub fn remove_listener(&mut self, id: NodeId, listener: ListenerId) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        match node.listeners.iter().position(|e| e.id == listener) {
            Some(index) => node.listeners.remove(index).is_some(),
            None => false,
        }
    }

    pub fn has_listener(&self, id: NodeId, kind: EventType) -> bool {
        self.get(id).is_some_and(|n| n.listener_mask().contains(kind))
    }

    /// Deliver an event to `target`, then up its ancestors if the type bubbles.
    ///
    /// Each node's listener list is locked while its listeners run: listeners added or
    /// removed meanwhile take effect from the next dispatch. Returns the number of listeners
    /// invoked.
    pub fn dispatch_event(&mut self, target: NodeId, kind: EventType, point: Point) -> usize {
        let mut path: SmallVec<[NodeId; 16]> = SmallVec::new();
        path.push(target);
        if kind.bubbles() {
            let mut cur = self.parent(target);
            while let Some(p) = cur {
                path.push(p);
                cur = self.parent(p);
            }
        }

        let mut event = Event::new(kind, target, point);
        let mut invoked = 0;
        for (depth, node_id) in path.into_iter().enumerate() {
            event.current_target = node_id;
            event.phase = if depth == 0 {
                EventPhase::AtTarget
            } else {
                EventPhase::Bubbling
            };
            let entries: SmallVec<[ListenerEntry; 4]> = match self.get_mut(node_id) {
                Some(node) => {
                    node.listeners.lock();
                    node.listeners
                        .snapshot()
                        .iter()
                        .filter(|e| e.kind == kind)
                        .cloned()
                        .collect()
                }
                None => continue,
            };
            for entry in entries {
                entry.listener.invoke(self, &event);
                invoked += 1;
                if event.is_immediate_stopped() {
                    break;
                }
            }
            if let Some(node) = self.get_mut(node_id) {
                node.listeners.unlock();
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        tracing::trace!(kind = kind.as_str(), ?target, invoked, "dispatch");
        invoked
    }

    /// Hit-test `point` for `kind` and dispatch to the node found.
    pub fn dispatch_pointer(&mut self, kind: EventType, point: Point) -> Option<NodeId> {
        let target = self.hit_test_object(point, EventMask::of(kind), EventMask::EMPTY)?;
        self.dispatch_event(target, kind, point);
        Some(target)
    }

    // -- Tweens --

    /// Register a free-running tween, advanced by [`Scene::advance_tweens`].
    pub fn add_tween(&mut self, tween: Tween) -> TweenId {
        self.next_tween += 1;
        let id = TweenId(self.next_tween);
        self.tweens.push((id, tween));
        id
    }

    pub fn remove_tween(&mut self, id: TweenId) -> bool {
        if let Some(index) = self.tweens.iter().position(|(t, _)| *t == id) {
            self.tweens.remove(index);
            return true;
        }
        if self.advancing_tweens && id.0 <= self.next_tween {
            self.retired_tweens.push(id);
            return true;
        }
        false
    }

    pub fn tween(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.iter().find(|(t, _)| *t == id).map(|(_, t)| t)
    }

    pub fn tween_mut(&mut self, id: TweenId) -> Option<&mut Tween> {
        self.tweens.iter_mut().find(|(t, _)| *t == id).map(|(_, t)| t)
    }

    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }

    /// Advance every registered tween by `delta` frames.
    ///
    /// Tweens added by tween actions start on the next call; removals take effect right away.
    pub fn advance_tweens(&mut self, delta: f64) {
        let mut active = std::mem::take(&mut self.tweens);
        self.advancing_tweens = true;
        for (_, tween) in &mut active {
            tween.advance(self, delta);
        }
        self.advancing_tweens = false;
        active.append(&mut self.tweens);
        let retired = std::mem::take(&mut self.retired_tweens);
        active.retain(|(id, _)| !retired.contains(id));
        self.tweens = active;
    }

    // -- Timelines --

    pub fn movie_clip(&self, id: NodeId) -> Option<&MovieClip> {
        self.get(id)?.movie_clip()
    }

    /// Attach `tween` to the timeline of movie clip `clip`.
    pub fn add_timeline_tween(&mut self, clip: NodeId, tween: Tween) -> FlitterResult<()> {
        self.node_mut(clip)
            .and_then(Node::movie_clip_mut)
            .ok_or_else(|| FlitterError::scene(format!("node {clip:?} is not a movie clip")))?
            .add_tween(tween);
        Ok(())
    }

    /// Jump a movie clip or sprite to `target` and play from there.
    pub fn goto_and_play(&mut self, id: NodeId, target: impl Into<FrameTarget>) -> FlitterResult<()> {
        self.goto(id, target.into(), false)
    }

    /// Jump a movie clip or sprite to `target` and stop there.
    pub fn goto_and_stop(&mut self, id: NodeId, target: impl Into<FrameTarget>) -> FlitterResult<()> {
        self.goto(id, target.into(), true)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    fn goto(&mut self, id: NodeId, target: FrameTarget, stop: bool) -> FlitterResult<()> {
        if self.active_clips.contains(&id) {
            self.deferred.push((id, ClipCommand::Goto { target, stop }));
            return Ok(());
        }
        let node = self
            .get_mut(id)
            .ok_or_else(|| FlitterError::scene(format!("node {id:?} does not exist")))?;
        if let NodeKind::Sprite(sprite) = &mut node.kind {
            let result = if stop {
                sprite.goto_and_stop(target)
            } else {
                sprite.goto_and_play(target)
            };
            self.invalidate_bounds(id);
            return result;
        }
        self.with_clip(id, |clip, scene| clip.goto(scene, id, &target, stop))
            .unwrap_or_else(|| {
                Err(FlitterError::scene(format!(
                    "node {id:?} is neither a movie clip nor a sprite"
                )))
            })
    }

    /// Pause or resume a movie clip, sprite or other timeline-driven node.
    pub fn set_paused(&mut self, id: NodeId, paused: bool) -> bool {
        if self.active_clips.contains(&id) {
            self.deferred.push((id, ClipCommand::Pause(paused)));
            return true;
        }
        match self.get_mut(id).and_then(|n| n.kind.timeline_mut()) {
            Some(timeline) => {
                timeline.set_paused(paused);
                true
            }
            None => false,
        }
    }

    /// Run the timeline of movie clip `id` for this frame.
    pub(crate) fn update_tweens(&mut self, id: NodeId, time: f64) {
        let parent_position = self.parent_clip_position(id);
        self.with_clip(id, |clip, scene| clip.update(scene, id, time, parent_position));
    }

    fn parent_clip_position(&self, id: NodeId) -> Option<f64> {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if let Some(clip) = self.movie_clip(p) {
                return Some(clip.position());
            }
            cur = self.parent(p);
        }
        None
    }

    /// Run `f` with the clip taken out of its node, so it can mutate the scene freely.
    ///
    /// Timeline commands aimed at the clip meanwhile are deferred and replayed afterwards.
    fn with_clip<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut MovieClip, &mut Scene) -> R,
    ) -> Option<R> {
        let node = self.get_mut(id)?;
        let mut clip = match std::mem::replace(&mut node.kind, NodeKind::Container) {
            NodeKind::MovieClip(clip) => clip,
            other => {
                node.kind = other;
                return None;
            }
        };
        self.active_clips.push(id);
        let out = f(clip.as_mut(), self);
        if let Some(index) = self.active_clips.iter().rposition(|c| *c == id) {
            self.active_clips.remove(index);
        }
        if let Some(node) = self.get_mut(id) {
            node.kind = NodeKind::MovieClip(clip);
        }
        self.run_deferred(id);
        Some(out)
    }

    fn run_deferred(&mut self, id: NodeId) {
        while let Some(index) = self.deferred.iter().position(|(c, _)| *c == id) {
            let (_, command) = self.deferred.remove(index);
            match command {
                ClipCommand::Goto { target, stop } => {
                    if let Err(err) = self.goto(id, target, stop) {
                        tracing::debug!(?id, %err, "deferred goto failed");
                    }
                }
                ClipCommand::Pause(paused) => {
                    self.set_paused(id, paused);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
