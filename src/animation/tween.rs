//! Chained property tweens on a single node.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::animation::ease::Ease;
use crate::animation::guide::{ArcTable, GuidePath, GuideSamples};
use crate::animation::motion::TweenMotion;
use crate::animation::property::{PropertyMask, PropertyValues, Props};
use crate::animation::timeline::TimelineDriven;
use crate::foundation::config::RuntimeConfig;
use crate::foundation::error::{FlitterError, FlitterResult};
use crate::scene::graph::Scene;
use crate::scene::node::NodeId;

/// Callback fired when playback passes a point of a tween.
pub type TweenAction = Rc<dyn Fn(&mut Scene)>;

/// Handle to a tween registered with [`Scene::add_tween`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub(crate) u64);

#[derive(Clone)]
struct ActionEntry {
    time: f64,
    action: TweenAction,
}

/// A sequence of motions driving the properties of one target node.
///
/// Built step by step, each step starting where the previous one ended:
///
/// ```ignore
/// let tween = Tween::get(&scene, ball)?
///     .to(Props::new().x(200.0), 12.0, Ease::OutQuad)?
///     .wait(6.0)
///     .to(Props::new().alpha(0.0), 6.0, Ease::Linear)?;
/// ```
pub struct Tween {
    target: NodeId,
    motions: Vec<TweenMotion>,
    actions: Vec<ActionEntry>,
    initial: PropertyValues,
    tail: PropertyValues,
    mask: PropertyMask,
    values: PropertyValues,
    duration: f64,
    position: f64,
    current: Option<usize>,
    started: bool,
    looping: bool,
    paused: bool,
    guide_tolerance: f64,
    guide_max_subdivisions: u32,
}

impl Tween {
    /// A tween of `target` starting from `initial`.
    pub fn new(target: NodeId, initial: PropertyValues) -> Self {
        let config = RuntimeConfig::default();
        Self {
            target,
            motions: Vec::new(),
            actions: Vec::new(),
            tail: initial.clone(),
            values: initial.clone(),
            initial,
            mask: PropertyMask::EMPTY,
            duration: 0.0,
            position: 0.0,
            current: None,
            started: false,
            looping: false,
            paused: false,
            guide_tolerance: config.guide_tolerance,
            guide_max_subdivisions: config.guide_max_subdivisions,
        }
    }

    /// A tween of `target` starting from the node's current property values.
    pub fn get(scene: &Scene, target: NodeId) -> FlitterResult<Self> {
        let node = scene
            .node(target)
            .ok_or_else(|| FlitterError::animation(format!("tween target {target:?} is gone")))?;
        let mut tween = Self::new(target, PropertyValues::capture(node));
        tween.guide_tolerance = scene.config().guide_tolerance;
        tween.guide_max_subdivisions = scene.config().guide_max_subdivisions;
        Ok(tween)
    }

    /// Animate to `targets` over `duration` frames.
    pub fn to(self, targets: Props, duration: f64, ease: Ease) -> FlitterResult<Self> {
        self.push_motion(targets, duration, ease, None)
    }

    /// Move along `path` over `duration` frames, animating `targets` alongside.
    pub fn to_along(
        self,
        path: &GuidePath,
        targets: Props,
        duration: f64,
        ease: Ease,
    ) -> FlitterResult<Self> {
        let table = ArcTable::build(path, self.guide_tolerance, self.guide_max_subdivisions);
        let count = (duration.max(0.0).ceil() as usize + 1).max(2);
        let samples = Arc::new(GuideSamples::build(path, &table, count));
        self.push_motion(targets, duration, ease, Some(samples))
    }

    /// Hold the current values for `duration` frames.
    pub fn wait(mut self, duration: f64) -> Self {
        let motion = TweenMotion::hold(self.tail.clone(), self.mask, self.duration, duration);
        self.push(motion);
        self
    }

    /// Jump to `targets` immediately.
    pub fn set(self, targets: Props) -> FlitterResult<Self> {
        self.push_motion(targets, 0.0, Ease::Linear, None)
    }

    /// Fire `action` when forward playback reaches the current end of the tween.
    pub fn call(mut self, action: impl Fn(&mut Scene) + 'static) -> Self {
        self.actions.push(ActionEntry {
            time: self.duration,
            action: Rc::new(action),
        });
        self
    }

    fn push_motion(
        mut self,
        targets: Props,
        duration: f64,
        ease: Ease,
        guide: Option<Arc<GuideSamples>>,
    ) -> FlitterResult<Self> {
        let mut motion = TweenMotion::chain(
            self.tail.clone(),
            self.mask,
            self.duration,
            duration,
            &targets,
            ease,
        )?;
        if let Some(guide) = guide {
            motion = motion.with_guide(guide);
        }
        self.push(motion);
        Ok(self)
    }

    fn push(&mut self, motion: TweenMotion) {
        self.tail = motion.end_values();
        self.mask = motion.mask();
        self.duration += motion.duration();
        self.motions.push(motion);
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn motions(&self) -> &[TweenMotion] {
        &self.motions
    }

    pub fn initial_values(&self) -> &PropertyValues {
        &self.initial
    }

    /// Values after the last motion.
    pub fn end_values(&self) -> &PropertyValues {
        &self.tail
    }

    /// Values written by the last positioning.
    pub fn values(&self) -> &PropertyValues {
        &self.values
    }

    /// Every slot any motion animates.
    pub fn mask(&self) -> PropertyMask {
        self.mask
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Whether a non-looping tween has reached its end.
    pub fn is_complete(&self) -> bool {
        !self.looping && self.started && self.position >= self.duration
    }

    fn normalize(&self, position: f64) -> f64 {
        if self.looping && self.duration > 0.0 && position > self.duration {
            position.rem_euclid(self.duration)
        } else {
            position.clamp(0.0, self.duration)
        }
    }

    /// Move the playhead to `position` and write the resulting values onto the target.
    ///
    /// Actions fire on forward, non-seek playback only. Entering a different motion than last
    /// time is handled as a seek so slots skipped over are still restored.
    pub fn set_position(&mut self, scene: &mut Scene, position: f64, seek: bool) {
        let position = self.normalize(position);
        let prev = self.position;
        let started = self.started;
        self.started = true;
        self.position = position;

        if let Some(index) = self.motions.iter().rposition(|m| m.start() <= position) {
            let seek_all = seek || self.current != Some(index);
            let written = self.motions[index].interpolate(position, seek_all, &mut self.values);
            self.current = Some(index);
            if let Some(node) = scene.node_mut(self.target) {
                self.values.apply(node, written);
            }
        }

        if seek || self.actions.is_empty() {
            return;
        }
        let wrapped = self.looping && position < prev;
        let mut due: Vec<TweenAction> = Vec::new();
        let mut take = |keep: &dyn Fn(f64) -> bool| {
            due.extend(
                self.actions
                    .iter()
                    .filter(|a| keep(a.time))
                    .map(|a| Rc::clone(&a.action)),
            );
        };
        if wrapped {
            // Rest of the previous lap, then the start of this one.
            take(&|t| t > prev);
            take(&|t| t <= position);
        } else if started {
            take(&|t| t > prev && t <= position);
        } else {
            take(&|t| t >= prev && t <= position);
        }
        for action in due {
            (*action)(scene);
        }
    }

    /// Advance by `delta` frames unless paused.
    pub fn advance(&mut self, scene: &mut Scene, delta: f64) {
        if self.paused || delta == 0.0 {
            return;
        }
        self.set_position(scene, self.position + delta, false);
    }
}

impl TimelineDriven for Tween {
    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("target", &self.target)
            .field("motions", &self.motions.len())
            .field("actions", &self.actions.len())
            .field("duration", &self.duration)
            .field("position", &self.position)
            .field("looping", &self.looping)
            .field("paused", &self.paused)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;
