//! Tweenable property slots and the dense value vector shared by a tween's motions.

use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use crate::animation::timeline::PlayMode;
use crate::scene::graphics::Graphics;
use crate::scene::node::{Node, NodeKind};

/// A tweenable property.
///
/// `X..=Alpha` interpolate numerically; the rest step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PropertyId {
    X,
    Y,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
    Rotation,
    RegX,
    RegY,
    Alpha,
    Visible,
    Off,
    StartPosition,
    Loop,
    PlayMode,
    Text,
    Graphics,
}

impl PropertyId {
    pub const COUNT: usize = 17;

    pub const ALL: [Self; Self::COUNT] = [
        Self::X,
        Self::Y,
        Self::ScaleX,
        Self::ScaleY,
        Self::SkewX,
        Self::SkewY,
        Self::Rotation,
        Self::RegX,
        Self::RegY,
        Self::Alpha,
        Self::Visible,
        Self::Off,
        Self::StartPosition,
        Self::Loop,
        Self::PlayMode,
        Self::Text,
        Self::Graphics,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether values of this slot are linearly interpolated.
    pub const fn is_numeric(self) -> bool {
        (self as u8) <= Self::Alpha as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::SkewX => "skewX",
            Self::SkewY => "skewY",
            Self::Rotation => "rotation",
            Self::RegX => "regX",
            Self::RegY => "regY",
            Self::Alpha => "alpha",
            Self::Visible => "visible",
            Self::Off => "off",
            Self::StartPosition => "startPosition",
            Self::Loop => "loop",
            Self::PlayMode => "mode",
            Self::Text => "text",
            Self::Graphics => "graphics",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

/// Set of [`PropertyId`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertyMask(u32);

impl PropertyMask {
    pub const EMPTY: Self = Self(0);

    pub const fn of(id: PropertyId) -> Self {
        Self(1 << id as u8)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, id: PropertyId) -> bool {
        self.0 & (1 << id as u8) != 0
    }

    /// Every slot of `other` is also in `self`.
    pub const fn is_superset(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, id: PropertyId) {
        self.0 |= 1 << id as u8;
    }

    pub fn iter(self) -> impl Iterator<Item = PropertyId> {
        PropertyId::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl BitOr for PropertyMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PropertyMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<PropertyId> for PropertyMask {
    fn from_iter<I: IntoIterator<Item = PropertyId>>(iter: I) -> Self {
        let mut m = Self::EMPTY;
        for id in iter {
            m.insert(id);
        }
        m
    }
}

/// Value of one slot.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    Mode(PlayMode),
    Text(Arc<str>),
    Graphics(Arc<Graphics>),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this value has the variant slot `id` stores.
    pub fn fits(&self, id: PropertyId) -> bool {
        matches!(
            (id, self),
            (
                PropertyId::X
                    | PropertyId::Y
                    | PropertyId::ScaleX
                    | PropertyId::ScaleY
                    | PropertyId::SkewX
                    | PropertyId::SkewY
                    | PropertyId::Rotation
                    | PropertyId::RegX
                    | PropertyId::RegY
                    | PropertyId::Alpha
                    | PropertyId::StartPosition,
                Self::Number(_)
            ) | (
                PropertyId::Visible | PropertyId::Off | PropertyId::Loop,
                Self::Bool(_)
            ) | (PropertyId::PlayMode, Self::Mode(_))
                | (PropertyId::Text, Self::Text(_))
                | (PropertyId::Graphics, Self::Graphics(_))
        )
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<PlayMode> for PropertyValue {
    fn from(v: PlayMode) -> Self {
        Self::Mode(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<Arc<Graphics>> for PropertyValue {
    fn from(v: Arc<Graphics>) -> Self {
        Self::Graphics(v)
    }
}

/// Dense value vector, one entry per [`PropertyId`].
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyValues {
    values: Vec<PropertyValue>,
}

impl Default for PropertyValues {
    fn default() -> Self {
        let values = PropertyId::ALL
            .into_iter()
            .map(|id| match id {
                PropertyId::ScaleX | PropertyId::ScaleY | PropertyId::Alpha => {
                    PropertyValue::Number(1.0)
                }
                PropertyId::Visible | PropertyId::Loop => PropertyValue::Bool(true),
                PropertyId::Off => PropertyValue::Bool(false),
                PropertyId::PlayMode => PropertyValue::Mode(PlayMode::Independent),
                PropertyId::Text => PropertyValue::Text("".into()),
                PropertyId::Graphics => PropertyValue::Graphics(Arc::new(Graphics::new())),
                _ => PropertyValue::Number(0.0),
            })
            .collect();
        Self { values }
    }
}

impl PropertyValues {
    /// Read every slot from a node's current state.
    pub fn capture(node: &Node) -> Self {
        let mut v = Self::default();
        let p = node.params();
        for (id, n) in [
            (PropertyId::X, p.x),
            (PropertyId::Y, p.y),
            (PropertyId::ScaleX, p.scale_x),
            (PropertyId::ScaleY, p.scale_y),
            (PropertyId::SkewX, p.skew_x),
            (PropertyId::SkewY, p.skew_y),
            (PropertyId::Rotation, p.rotation),
            (PropertyId::RegX, p.reg_x),
            (PropertyId::RegY, p.reg_y),
            (PropertyId::Alpha, node.alpha()),
        ] {
            v.set(id, PropertyValue::Number(n));
        }
        v.set(PropertyId::Visible, node.visible().into());
        v.set(PropertyId::Off, node.off().into());
        match node.kind() {
            NodeKind::MovieClip(clip) => {
                v.set(PropertyId::StartPosition, clip.start_position().into());
                v.set(PropertyId::Loop, clip.looping().into());
                v.set(PropertyId::PlayMode, clip.mode().into());
            }
            NodeKind::Text(t) => v.set(PropertyId::Text, PropertyValue::Text(t.shared_content())),
            NodeKind::Shape(g) => v.set(PropertyId::Graphics, Arc::clone(g).into()),
            _ => {}
        }
        v
    }

    pub fn get(&self, id: PropertyId) -> &PropertyValue {
        &self.values[id.index()]
    }

    pub fn number(&self, id: PropertyId) -> f64 {
        self.get(id).as_number().unwrap_or(0.0)
    }

    pub fn flag(&self, id: PropertyId) -> bool {
        self.get(id).as_bool().unwrap_or(false)
    }

    pub fn set(&mut self, id: PropertyId, value: PropertyValue) {
        crate::contract!(value.fits(id), "value {value:?} does not fit slot {id:?}");
        self.values[id.index()] = value;
    }

    /// Copy the slots in `mask` from `other`.
    pub fn copy_from(&mut self, other: &Self, mask: PropertyMask) {
        for id in mask.iter() {
            self.values[id.index()] = other.values[id.index()].clone();
        }
    }

    /// Write the slots in `mask` onto a node through its setters.
    ///
    /// Slots that do not apply to the node's kind are ignored.
    pub fn apply(&self, node: &mut Node, mask: PropertyMask) {
        if mask.is_empty() {
            return;
        }
        let mut params = *node.params();
        for id in mask.iter() {
            let value = self.get(id);
            match (id, value) {
                (PropertyId::X, PropertyValue::Number(n)) => params.x = *n,
                (PropertyId::Y, PropertyValue::Number(n)) => params.y = *n,
                (PropertyId::ScaleX, PropertyValue::Number(n)) => params.scale_x = *n,
                (PropertyId::ScaleY, PropertyValue::Number(n)) => params.scale_y = *n,
                (PropertyId::SkewX, PropertyValue::Number(n)) => params.skew_x = *n,
                (PropertyId::SkewY, PropertyValue::Number(n)) => params.skew_y = *n,
                (PropertyId::Rotation, PropertyValue::Number(n)) => params.rotation = *n,
                (PropertyId::RegX, PropertyValue::Number(n)) => params.reg_x = *n,
                (PropertyId::RegY, PropertyValue::Number(n)) => params.reg_y = *n,
                (PropertyId::Alpha, PropertyValue::Number(n)) => node.set_alpha(*n),
                (PropertyId::Visible, PropertyValue::Bool(b)) => node.set_visible(*b),
                (PropertyId::Off, PropertyValue::Bool(b)) => node.set_off(*b),
                (PropertyId::StartPosition, PropertyValue::Number(n)) => {
                    if let Some(clip) = node.movie_clip_mut() {
                        clip.set_start_position(*n);
                    }
                }
                (PropertyId::Loop, PropertyValue::Bool(b)) => {
                    if let Some(clip) = node.movie_clip_mut() {
                        clip.set_loop(*b);
                    }
                }
                (PropertyId::PlayMode, PropertyValue::Mode(m)) => {
                    if let Some(clip) = node.movie_clip_mut() {
                        clip.set_mode(*m);
                    }
                }
                (PropertyId::Text, PropertyValue::Text(s)) => {
                    if node.text().is_some_and(|t| t.content() != s.as_ref())
                        && let Some(t) = node.text_mut()
                    {
                        t.set_content(Arc::clone(s));
                    }
                }
                (PropertyId::Graphics, PropertyValue::Graphics(g)) => {
                    node.set_graphics(Arc::clone(g));
                }
                _ => {}
            }
        }
        node.set_params(params);
    }
}

/// Builder for the target values of one tween step.
///
/// ```
/// use flitter::animation::property::{PropertyId, Props};
///
/// let props = Props::new().x(100.0).alpha(0.5);
/// assert_eq!(props.entries().len(), 2);
/// assert_eq!(props.entries()[0].0, PropertyId::X);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    entries: Vec<(PropertyId, PropertyValue)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any slot. A later value for the same slot replaces the earlier one.
    pub fn with(mut self, id: PropertyId, value: impl Into<PropertyValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((id, value)),
        }
        self
    }

    pub fn x(self, v: f64) -> Self {
        self.with(PropertyId::X, v)
    }

    pub fn y(self, v: f64) -> Self {
        self.with(PropertyId::Y, v)
    }

    pub fn scale(self, sx: f64, sy: f64) -> Self {
        self.with(PropertyId::ScaleX, sx)
            .with(PropertyId::ScaleY, sy)
    }

    pub fn rotation(self, v: f64) -> Self {
        self.with(PropertyId::Rotation, v)
    }

    pub fn alpha(self, v: f64) -> Self {
        self.with(PropertyId::Alpha, v)
    }

    pub fn visible(self, v: bool) -> Self {
        self.with(PropertyId::Visible, v)
    }

    pub fn off(self, v: bool) -> Self {
        self.with(PropertyId::Off, v)
    }

    pub fn entries(&self) -> &[(PropertyId, PropertyValue)] {
        &self.entries
    }

    pub fn mask(&self) -> PropertyMask {
        self.entries.iter().map(|(id, _)| *id).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/property.rs"]
mod tests;
