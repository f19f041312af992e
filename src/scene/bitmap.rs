use std::cell::Cell;
use std::sync::Arc;

use crate::geom::{BoundingBox, Point, Rect};
use crate::render::composer::Filter;
use crate::render::surface::ImageSurface;

/// Image leaf: a source image, an optional source rectangle and an optional filter.
///
/// The filtered copy is built by the scene during layout and owned by the node, so it is
/// released with the node.
#[derive(Debug)]
pub struct Bitmap {
    image: Arc<ImageSurface>,
    source_rect: Option<Rect>,
    filter: Option<Filter>,
    hit_cache: Cell<Option<(Point, bool)>>,
}

impl Bitmap {
    pub fn new(image: Arc<ImageSurface>) -> Self {
        Self {
            image,
            source_rect: None,
            filter: None,
            hit_cache: Cell::new(None),
        }
    }

    pub fn with_source_rect(mut self, rect: Rect) -> Self {
        self.source_rect = Some(rect);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn image(&self) -> &Arc<ImageSurface> {
        &self.image
    }

    pub fn set_image(&mut self, image: Arc<ImageSurface>) {
        self.image = image;
        self.hit_cache.set(None);
    }

    /// Region of the image that is drawn, in image pixels. Defaults to the whole image.
    pub fn source_rect(&self) -> Rect {
        self.source_rect.unwrap_or_else(|| {
            Rect::new(
                0.0,
                0.0,
                f64::from(self.image.width()),
                f64::from(self.image.height()),
            )
        })
    }

    pub fn set_source_rect(&mut self, rect: Option<Rect>) {
        self.source_rect = rect;
        self.hit_cache.set(None);
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Option<Filter>) {
        self.filter = filter;
        self.hit_cache.set(None);
    }

    /// Local bounds: the source rectangle placed at the origin.
    pub fn local_bounds(&self) -> BoundingBox {
        let src = self.source_rect();
        BoundingBox::from_rect(Rect::new(0.0, 0.0, src.width(), src.height()))
    }

    /// Pixel-alpha hit test of a local point against `sample`.
    ///
    /// `stage` is the same point in stage pixels: a query within `sqrt(proximity_sq)` stage
    /// pixels of the previous one reuses its answer, however the bitmap is scaled.
    pub fn hit_sample(
        &self,
        local: Point,
        stage: Point,
        proximity_sq: f64,
        sample: &ImageSurface,
    ) -> bool {
        if let Some((q, hit)) = self.hit_cache.get()
            && (stage - q).hypot2() <= proximity_sq
        {
            return hit;
        }
        let src = self.source_rect();
        let hit = local.x >= 0.0
            && local.y >= 0.0
            && local.x < src.width()
            && local.y < src.height()
            && sample.alpha_at(
                (src.x0 + local.x).floor() as i64,
                (src.y0 + local.y).floor() as i64,
            ) > 0;
        self.hit_cache.set(Some((stage, hit)));
        hit
    }

    pub fn hit_test(&self, local: Point, stage: Point, proximity_sq: f64) -> bool {
        self.hit_sample(local, stage, proximity_sq, &self.image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/bitmap.rs"]
mod tests;
