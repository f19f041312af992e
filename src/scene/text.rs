use std::sync::Arc;

use crate::geom::{BoundingBox, Point, Rect};
use crate::render::renderer::TextMetrics;
use crate::render::surface::Color;

pub const DEFAULT_FONT: &str = "10px sans-serif";

/// Horizontal alignment relative to the local origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text payload of a text node.
///
/// Layout and glyph rendering belong to the renderer; the scene only keeps the content and
/// style and caches the metrics the renderer reports.
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    content: Arc<str>,
    font: String,
    color: Color,
    align: TextAlign,
    line_height: Option<f64>,
    line_width: Option<f64>,
    metrics: Option<TextMetrics>,
}

impl Text {
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self {
            content: content.into(),
            font: DEFAULT_FONT.to_owned(),
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: None,
            line_width: None,
            metrics: None,
        }
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self.metrics = None;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = Some(line_height);
        self.metrics = None;
        self
    }

    /// Wrap width hint passed through to the renderer.
    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = Some(line_width);
        self.metrics = None;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn shared_content(&self) -> Arc<str> {
        Arc::clone(&self.content)
    }

    pub fn set_content(&mut self, content: impl Into<Arc<str>>) {
        let content = content.into();
        if content != self.content {
            self.content = content;
            self.metrics = None;
        }
    }

    /// Hard lines of the content.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn align(&self) -> TextAlign {
        self.align
    }

    pub fn line_width(&self) -> Option<f64> {
        self.line_width
    }

    /// Explicit line height, or 1.2 × the pixel size parsed from the font string.
    pub fn line_height(&self) -> f64 {
        self.line_height
            .unwrap_or_else(|| font_pixel_size(&self.font) * 1.2)
    }

    pub fn metrics(&self) -> Option<TextMetrics> {
        self.metrics
    }

    pub(crate) fn set_metrics(&mut self, metrics: Option<TextMetrics>) {
        self.metrics = metrics;
    }

    /// Local bounds from the measured metrics, or from the wrap width when unmeasured.
    pub fn local_bounds(&self) -> BoundingBox {
        let (w, h) = match (self.metrics, self.line_width) {
            (Some(m), _) => (m.width, m.height),
            (None, Some(w)) => (w, self.lines().count() as f64 * self.line_height()),
            (None, None) => return BoundingBox::EMPTY,
        };
        let x0 = match self.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -w * 0.5,
            TextAlign::Right => -w,
        };
        BoundingBox::from_rect(Rect::new(x0, 0.0, x0 + w, h))
    }

    pub fn hit_test(&self, p: Point) -> bool {
        self.local_bounds().contains(p)
    }
}

fn font_pixel_size(font: &str) -> f64 {
    font.split_whitespace()
        .find_map(|tok| tok.strip_suffix("px")?.parse::<f64>().ok())
        .unwrap_or(10.0)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/text.rs"]
mod tests;
