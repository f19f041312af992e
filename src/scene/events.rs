use std::cell::{Cell, RefCell};
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::rc::Rc;

use crate::geom::Point;
use crate::scene::graph::Scene;
use crate::scene::node::NodeId;

/// Event kinds a node can listen for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventType {
    Click,
    DoubleClick,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    RollOver,
    RollOut,
    PressMove,
    PressUp,
    Added,
    Removed,
    Tick,
    AnimationEnd,
    Complete,
}

impl EventType {
    pub const ALL: [Self; 16] = [
        Self::Click,
        Self::DoubleClick,
        Self::MouseDown,
        Self::MouseUp,
        Self::MouseMove,
        Self::MouseOver,
        Self::MouseOut,
        Self::RollOver,
        Self::RollOut,
        Self::PressMove,
        Self::PressUp,
        Self::Added,
        Self::Removed,
        Self::Tick,
        Self::AnimationEnd,
        Self::Complete,
    ];

    pub const fn bit(self) -> u32 {
        1 << self as u8
    }

    /// Pointer events bubble from the target up through its ancestors; roll-over/out and
    /// lifecycle events are delivered to the target only.
    pub const fn bubbles(self) -> bool {
        matches!(
            self,
            Self::Click
                | Self::DoubleClick
                | Self::MouseDown
                | Self::MouseUp
                | Self::MouseMove
                | Self::MouseOver
                | Self::MouseOut
                | Self::PressMove
                | Self::PressUp
        )
    }

    /// Whether the event is driven by the pointer (and so takes part in hit-testing).
    pub const fn is_pointer(self) -> bool {
        (self as u8) <= Self::PressUp as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::RollOver => "rollover",
            Self::RollOut => "rollout",
            Self::PressMove => "pressmove",
            Self::PressUp => "pressup",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Tick => "tick",
            Self::AnimationEnd => "animationend",
            Self::Complete => "complete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Set of [`EventType`]s, one bit per variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventMask(u32);

impl EventMask {
    pub const EMPTY: Self = Self(0);

    /// Every event type that bubbles.
    pub const BUBBLING: Self = {
        let mut bits = 0;
        let mut i = 0;
        while i < EventType::ALL.len() {
            if EventType::ALL[i].bubbles() {
                bits |= EventType::ALL[i].bit();
            }
            i += 1;
        }
        Self(bits)
    };

    /// Every pointer-driven event type.
    pub const POINTER: Self = {
        let mut bits = 0;
        let mut i = 0;
        while i < EventType::ALL.len() {
            if EventType::ALL[i].is_pointer() {
                bits |= EventType::ALL[i].bit();
            }
            i += 1;
        }
        Self(bits)
    };

    pub const fn of(kind: EventType) -> Self {
        Self(kind.bit())
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, kind: EventType) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, kind: EventType) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: EventType) {
        self.0 &= !kind.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = EventType> {
        EventType::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl From<EventType> for EventMask {
    fn from(kind: EventType) -> Self {
        Self::of(kind)
    }
}

impl BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromIterator<EventType> for EventMask {
    fn from_iter<I: IntoIterator<Item = EventType>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for kind in iter {
            mask.insert(kind);
        }
        mask
    }
}

/// Dispatch phase of an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    AtTarget,
    Bubbling,
}

/// An event as delivered to listeners.
#[derive(Debug)]
pub struct Event {
    pub kind: EventType,
    /// Node the event was dispatched to.
    pub target: NodeId,
    /// Node whose listener is running.
    pub current_target: NodeId,
    pub phase: EventPhase,
    /// Pointer position in stage coordinates.
    pub stage_point: Point,
    stopped: Cell<bool>,
    stopped_immediate: Cell<bool>,
}

impl Event {
    pub fn new(kind: EventType, target: NodeId, stage_point: Point) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            phase: EventPhase::AtTarget,
            stage_point,
            stopped: Cell::new(false),
            stopped_immediate: Cell::new(false),
        }
    }

    /// Stop delivery to ancestors after the current node's listeners have run.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    /// Stop delivery right after the running listener.
    pub fn stop_immediate_propagation(&self) {
        self.stopped.set(true);
        self.stopped_immediate.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }

    pub(crate) fn is_immediate_stopped(&self) -> bool {
        self.stopped_immediate.get()
    }
}

/// Object-style listener.
pub trait EventHandler {
    fn handle_event(&mut self, scene: &mut Scene, event: &Event);
}

/// Event callback signature.
pub type EventCallback = dyn Fn(&mut Scene, &Event);

/// A registered listener: a closure or a shared handler object.
#[derive(Clone)]
pub enum Listener {
    Callback(Rc<EventCallback>),
    Handler(Rc<RefCell<dyn EventHandler>>),
}

impl Listener {
    pub fn callback(f: impl Fn(&mut Scene, &Event) + 'static) -> Self {
        Self::Callback(Rc::new(f))
    }

    pub fn handler(h: Rc<RefCell<dyn EventHandler>>) -> Self {
        Self::Handler(h)
    }

    pub(crate) fn invoke(&self, scene: &mut Scene, event: &Event) {
        match self {
            Self::Callback(f) => f(scene, event),
            Self::Handler(h) => match h.try_borrow_mut() {
                Ok(mut h) => h.handle_event(scene, event),
                // The handler is already running further up the stack.
                Err(_) => tracing::trace!(kind = event.kind.as_str(), "skip reentrant handler"),
            },
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Listener::Callback"),
            Self::Handler(_) => f.write_str("Listener::Handler"),
        }
    }
}

/// Handle returned by listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

#[derive(Clone, Debug)]
pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) kind: EventType,
    pub(crate) listener: Listener,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/events.rs"]
mod tests;
