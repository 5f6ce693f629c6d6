//! Editable text box.

use super::{SerializableColor, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A text box. Text is the only shape that can enter edit mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of text bounding box).
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Fixed box width; `None` sizes to content.
    #[serde(default)]
    pub width: Option<f64>,
    /// Bold title text.
    #[serde(default)]
    pub bold: bool,
    /// Style properties; the fill is the glyph color.
    pub style: ShapeStyle,
}

impl Text {
    /// Default font size in pixels.
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    /// Create a new text box.
    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            width: None,
            bold: false,
            style: ShapeStyle::filled(SerializableColor::black()),
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.style = ShapeStyle::filled(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn approximate_width(&self) -> f64 {
        let widest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let factor = if self.bold { 0.6 } else { 0.55 };
        widest as f64 * self.font_size * factor
    }

    fn approximate_height(&self) -> f64 {
        let mut lines = self.content.lines().count().max(1);
        // lines() drops a trailing empty line
        if self.content.ends_with('\n') {
            lines += 1;
        }
        lines as f64 * self.font_size * 1.2
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let width = self.width.unwrap_or_else(|| self.approximate_width().max(20.0));
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + self.approximate_height(),
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = Text::new(Point::new(100.0, 100.0), "Hello");
        assert_eq!(text.content(), "Hello");
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fixed_width_bounds() {
        let text = Text::new(Point::new(0.0, 0.0), "Hi").with_width(180.0);
        assert!((text.bounds().width() - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_multiline_height() {
        let one = Text::new(Point::ZERO, "a");
        let two = Text::new(Point::ZERO, "a\nb");
        assert!(two.bounds().height() > one.bounds().height());
    }

    #[test]
    fn test_hit_test() {
        let text = Text::new(Point::new(100.0, 100.0), "Hello World");
        let center = text.bounds().center();
        assert!(text.hit_test(center, 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
    }
}
