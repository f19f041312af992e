#![forbid(unsafe_code)]
//! Retained-mode 2D scene graph and tweening runtime for Flash-style vector and bitmap content.
//!
//! A [`Scene`] holds display objects in an arena; a [`Stage`] pairs it with a
//! [`render::renderer::Renderer`] and a ticker and runs one layout + paint pass per frame.
//! Animation comes from [`Tween`]s, either free-running or attached to movie-clip timelines.

pub mod animation;
pub mod foundation;
pub mod geom;
pub mod render;
pub mod scene;

pub use animation::{Ease, FrameTarget, MovieClip, PlayMode, Props, Tween, TweenId};
pub use foundation::config::RuntimeConfig;
pub use foundation::context::Runtime;
pub use foundation::error::{FlitterError, FlitterResult};
pub use geom::{BoundingBox, Point, Rect, Transform, TransformParams};
pub use render::surface::{Color, ImageSurface};
pub use scene::events::{Event, EventMask, EventType, Listener};
pub use scene::graphics::Graphics;
pub use scene::{Node, NodeId, NodeKind, Scene, Stage};
