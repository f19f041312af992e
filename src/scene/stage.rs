//! A scene bound to a renderer and a ticker: the per-frame driver.

use crate::animation::ticker::{TickEvent, Ticker};
use crate::geom::Point;
use crate::render::renderer::Renderer;
use crate::scene::events::EventType;
use crate::scene::graph::Scene;
use crate::scene::node::NodeId;

/// Owns a [`Scene`], the [`Renderer`] that draws it and the [`Ticker`] that paces it.
///
/// Each tick advances free-running tweens (unless the ticker is paused), lays the scene out,
/// forwards pending resource releases to the renderer and paints.
#[derive(Debug)]
pub struct Stage<R: Renderer> {
    scene: Scene,
    renderer: R,
    ticker: Ticker,
}

impl<R: Renderer> Stage<R> {
    pub fn new(mut scene: Scene, renderer: R) -> Self {
        scene.runtime_mut().attach_renderer(&renderer);
        let ticker = Ticker::new(scene.config().fps);
        Self {
            scene,
            renderer,
            ticker,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn ticker_mut(&mut self) -> &mut Ticker {
        &mut self.ticker
    }

    pub fn into_parts(self) -> (Scene, R) {
        (self.scene, self.renderer)
    }

    /// Host callback: tick if an interval has passed since the last tick, then draw a frame.
    ///
    /// Layout runs on the ticker's run time, so paused time does not advance timelines.
    #[tracing::instrument(skip(self))]
    pub fn update(&mut self, now: f64) -> Option<TickEvent> {
        let event = self.ticker.advance(now)?;
        if !event.paused {
            self.scene
                .advance_tweens(event.delta / self.ticker.interval());
        }
        self.draw(event.run_time);
        Some(event)
    }

    /// Lay out and paint one frame at `time` without ticking.
    pub fn draw(&mut self, time: f64) {
        self.scene.layout(&mut self.renderer, time);
        let released = self.scene.flush_releases(&mut self.renderer);
        if released > 0 {
            tracing::debug!(released, "released renderer caches");
        }
        self.scene.paint(&mut self.renderer);
    }

    /// Hit-test a pointer event and dispatch it to the node found.
    pub fn pointer(&mut self, kind: EventType, point: Point) -> Option<NodeId> {
        let target = self.scene.dispatch_pointer(kind, point);
        if let Some(node) = target {
            tracing::trace!(kind = kind.as_str(), ?node, "pointer");
        }
        target
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/stage.rs"]
mod tests;
