//! Movie-clip timelines: a container whose children are driven by a shared frame clock.
//!
//! A [`MovieClip`] owns the tweens of its descendants. Once per frame, before its children are
//! laid out, the clip computes its position from its [`PlayMode`], repositions every tween,
//! and attaches or detaches each tween target according to its `off` property.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::animation::tween::Tween;
use crate::foundation::error::{FlitterError, FlitterResult};
use crate::scene::graph::Scene;
use crate::scene::node::NodeId;
use crate::scene::sprite::Sprite;

/// How a clip's position relates to time and to its parent clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Advance one frame per tick (or by the clip's own framerate).
    #[default]
    Independent,
    /// Hold `start_position`.
    Single,
    /// Show `start_position` when first laid out under a parent clip, then follow the parent's
    /// position frame for frame.
    Synched,
}

/// A position to jump to: a label or an absolute frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameTarget {
    Label(String),
    Frame(f64),
}

impl From<&str> for FrameTarget {
    fn from(label: &str) -> Self {
        Self::Label(label.to_owned())
    }
}

impl From<String> for FrameTarget {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<f64> for FrameTarget {
    fn from(frame: f64) -> Self {
        Self::Frame(frame)
    }
}

impl From<u32> for FrameTarget {
    fn from(frame: u32) -> Self {
        Self::Frame(f64::from(frame))
    }
}

/// Anything with a playhead.
pub trait TimelineDriven {
    fn position(&self) -> f64;
    fn duration(&self) -> f64;
    fn is_paused(&self) -> bool;
    fn set_paused(&mut self, paused: bool);
}

/// Timeline state of a movie-clip node.
#[derive(Debug)]
pub struct MovieClip {
    tweens: Vec<Tween>,
    labels: BTreeMap<String, f64>,
    duration: f64,
    mode: PlayMode,
    start_position: f64,
    looping: bool,
    paused: bool,
    position: f64,
    framerate: Option<f64>,
    last_time: Option<f64>,
    /// Parent position at which a synched clip started following it.
    sync_origin: Option<f64>,
    needs_seek: bool,
}

impl Default for MovieClip {
    fn default() -> Self {
        Self::new(PlayMode::Independent, 0.0, true)
    }
}

impl MovieClip {
    pub fn new(mode: PlayMode, start_position: f64, looping: bool) -> Self {
        Self {
            tweens: Vec::new(),
            labels: BTreeMap::new(),
            duration: 0.0,
            mode,
            start_position,
            looping,
            paused: false,
            position: start_position,
            framerate: None,
            last_time: None,
            sync_origin: None,
            needs_seek: true,
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, frame: f64) -> Self {
        self.add_label(name, frame);
        self
    }

    pub fn with_tween(mut self, tween: Tween) -> Self {
        self.add_tween(tween);
        self
    }

    /// Own advance rate in frames per second; `None` steps one frame per tick.
    pub fn with_framerate(mut self, fps: Option<f64>) -> Self {
        self.framerate = fps.filter(|f| *f > 0.0);
        self
    }

    /// Attach a tween; the clip's duration grows to cover it.
    pub fn add_tween(&mut self, tween: Tween) {
        self.duration = self.duration.max(tween.duration());
        self.tweens.push(tween);
        self.needs_seek = true;
    }

    pub fn add_label(&mut self, name: impl Into<String>, frame: f64) {
        self.labels.insert(name.into(), frame);
    }

    pub fn labels(&self) -> &BTreeMap<String, f64> {
        &self.labels
    }

    /// The label at or most recently before the current position.
    pub fn current_label(&self) -> Option<&str> {
        self.labels
            .iter()
            .filter(|(_, frame)| **frame <= self.position)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, _)| name.as_str())
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Maximum end frame over all attached tweens.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Number of distinct frames, `floor(duration) + 1`.
    pub fn frame_count(&self) -> f64 {
        self.duration.floor() + 1.0
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        if mode != self.mode {
            self.mode = mode;
            self.sync_origin = None;
            self.needs_seek = true;
        }
    }

    pub fn start_position(&self) -> f64 {
        self.start_position
    }

    pub fn set_start_position(&mut self, start_position: f64) {
        if start_position != self.start_position {
            self.start_position = start_position;
            self.sync_origin = None;
            self.needs_seek = true;
        }
    }

    /// Forget the parent frame a synched clip is anchored to; the next update re-anchors it
    /// so that `start_position` shows first.
    pub(crate) fn restart_sync(&mut self) {
        self.sync_origin = None;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop(&mut self, looping: bool) {
        if looping != self.looping {
            self.looping = looping;
            self.needs_seek = true;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Resolve a label or frame to a position inside the timeline.
    pub fn resolve(&self, target: &FrameTarget) -> FlitterResult<f64> {
        let frame = match target {
            FrameTarget::Label(name) => *self
                .labels
                .get(name)
                .ok_or_else(|| FlitterError::animation(format!("unknown label '{name}'")))?,
            FrameTarget::Frame(frame) if frame.is_finite() => *frame,
            FrameTarget::Frame(frame) => {
                return Err(FlitterError::animation(format!("invalid frame {frame}")));
            }
        };
        Ok(self.wrap(frame))
    }

    fn wrap(&self, position: f64) -> f64 {
        let count = self.frame_count();
        if self.looping && position >= count {
            position.rem_euclid(count)
        } else {
            position.clamp(0.0, self.duration)
        }
    }

    fn next_position(&mut self, time: f64, parent_position: Option<f64>) -> f64 {
        let last = self.last_time.replace(time);
        match self.mode {
            PlayMode::Single => self.start_position,
            PlayMode::Synched => match parent_position {
                Some(p) => {
                    let origin = *self.sync_origin.get_or_insert(p);
                    let frame = self.start_position + (p - origin);
                    if self.looping && frame < 0.0 {
                        frame.rem_euclid(self.frame_count())
                    } else {
                        frame
                    }
                }
                None => {
                    self.sync_origin = None;
                    self.position
                }
            },
            PlayMode::Independent => match last {
                _ if self.paused => self.position,
                Some(last) if last != time => {
                    let frames = self
                        .framerate
                        .map_or(1.0, |fps| (time - last) * fps / 1000.0);
                    self.position + frames
                }
                _ => self.position,
            },
        }
    }

    /// Per-frame update: advance, reposition tweens, and sync tween targets into the child
    /// list. Runs before the clip's children are laid out.
    pub(crate) fn update(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        time: f64,
        parent_position: Option<f64>,
    ) {
        let raw = self.next_position(time, parent_position);
        let position = self.wrap(raw);
        let seek = self.needs_seek || position < self.position;
        if seek || position != self.position {
            self.apply(scene, id, position, seek);
        }
    }

    /// Jump to `target`, then keep playing or stop there.
    pub(crate) fn goto(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        target: &FrameTarget,
        stop: bool,
    ) -> FlitterResult<()> {
        let position = self.resolve(target)?;
        self.paused = stop;
        if position != self.position || stop || self.needs_seek {
            tracing::debug!(?id, position, stop, "movie clip goto");
            self.apply(scene, id, position, true);
        }
        Ok(())
    }

    fn apply(&mut self, scene: &mut Scene, id: NodeId, position: f64, seek: bool) {
        self.position = position;
        self.needs_seek = false;
        for tween in &mut self.tweens {
            tween.set_position(scene, position, seek);
        }
        self.sync_children(scene, id);
    }

    /// Attach every present tween target in tween order; detach targets switched off.
    fn sync_children(&self, scene: &mut Scene, id: NodeId) {
        let mut seen: SmallVec<[NodeId; 16]> = SmallVec::new();
        let mut slot = 0;
        for tween in &self.tweens {
            let target = tween.target();
            if seen.contains(&target) {
                continue;
            }
            seen.push(target);
            let Some(node) = scene.node(target) else {
                continue;
            };
            let attached = node.parent() == Some(id);
            if node.off() {
                if attached {
                    scene.remove_child(id, target);
                }
                continue;
            }
            if !attached || scene.child_index(id, target) != Some(slot) {
                if let Err(err) = scene.add_child_at(id, target, slot) {
                    tracing::debug!(?target, %err, "tween target not attached");
                    continue;
                }
            }
            slot += 1;
        }
    }
}

impl TimelineDriven for MovieClip {
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

impl TimelineDriven for Sprite {
    fn position(&self) -> f64 {
        self.current_frame() as f64
    }

    fn duration(&self) -> f64 {
        let frames = self
            .current_animation()
            .and_then(|name| self.sheet().animation(name))
            .map_or(self.sheet().frame_count(), |a| a.frames.len());
        frames.saturating_sub(1) as f64
    }

    fn is_paused(&self) -> bool {
        Sprite::is_paused(self)
    }

    fn set_paused(&mut self, paused: bool) {
        Sprite::set_paused(self, paused);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
