//! The display list: an arena of nodes, their leaf content, events, hit-testing and the stage.

/// Bitmap leaves.
pub mod bitmap;
/// Event types, masks, listeners and dispatch state.
pub mod events;
/// The node arena and its per-frame layout and paint passes.
pub mod graph;
/// Vector shape descriptions.
pub mod graphics;
/// Pointer hit-testing.
pub mod hit;
/// Nodes, node kinds and dirty flags.
pub mod node;
/// Copy-on-write lists that tolerate mutation during iteration.
pub mod object_list;
/// Sprite sheets and sprite leaves.
pub mod sprite;
/// Ticker-driven scene with a renderer.
pub mod stage;
/// Text leaves.
pub mod text;

pub use graph::Scene;
pub use node::{DirtyFlags, Node, NodeId, NodeKind};
pub use stage::Stage;
