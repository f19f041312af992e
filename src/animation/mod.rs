//! Tweening: easing curves, property slots, motions, guide paths, tweens, movie-clip timelines
//! and the frame ticker.

/// Easing curves over `[0, 1]`.
pub mod ease;
/// Quadratic guide paths with arc-length sampling.
pub mod guide;
/// One interpolated step of a tween.
pub mod motion;
/// Tweenable property slots and value vectors.
pub mod property;
/// Fixed-interval frame clock.
pub mod ticker;
/// Movie-clip timelines and the shared playhead trait.
pub mod timeline;
/// Chained tweens on one node.
pub mod tween;

pub use ease::Ease;
pub use property::{PropertyId, PropertyMask, PropertyValue, PropertyValues, Props};
pub use timeline::{FrameTarget, MovieClip, PlayMode, TimelineDriven};
pub use tween::{Tween, TweenId};
