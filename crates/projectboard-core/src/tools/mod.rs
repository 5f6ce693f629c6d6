//! Tool modes and freehand stroke accumulation.

use crate::shapes::{Freehand, SerializableColor, Shape};
use crate::surface::{Brush, Surface};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Points closer than this to the simplified path are dropped on commit.
const STROKE_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// Persistent interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolMode {
    #[default]
    Select,
    /// Freehand drawing with a narrow foreground brush.
    Draw,
    /// Wide brush painted in the background color.
    Eraser,
}

impl ToolMode {
    /// Whether this mode paints strokes on the surface.
    pub fn is_drawing(self) -> bool {
        matches!(self, ToolMode::Draw | ToolMode::Eraser)
    }
}

/// One-shot insertions. Each performs a single insertion and then the
/// tool returns to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreateAction {
    Rectangle,
    Circle,
    StickyNote,
    Text,
    Line,
    Arrow,
    Section,
    TaskCard,
}

/// Anything the user can pick from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Mode(ToolMode),
    Create(CreateAction),
}

impl From<ToolMode> for Tool {
    fn from(mode: ToolMode) -> Self {
        Tool::Mode(mode)
    }
}

impl From<CreateAction> for Tool {
    fn from(action: CreateAction) -> Self {
        Tool::Create(action)
    }
}

/// State of a stroke interaction.
#[derive(Debug, Clone, Default)]
pub enum ToolState {
    #[default]
    Idle,
    /// A stroke is in progress.
    Active { start: Point, current: Point },
}

/// Tracks the active mode and accumulates brush strokes.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected mode.
    pub current_mode: ToolMode,
    /// Current state of the stroke interaction.
    pub state: ToolState,
    /// Accumulated points for the stroke in progress.
    stroke_points: Vec<Point>,
    pub draw_color: SerializableColor,
    pub draw_width: f64,
    pub eraser_width: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(SerializableColor::black(), 2.0, 20.0)
    }
}

impl ToolManager {
    pub fn new(draw_color: SerializableColor, draw_width: f64, eraser_width: f64) -> Self {
        Self {
            current_mode: ToolMode::default(),
            state: ToolState::default(),
            stroke_points: Vec::new(),
            draw_color,
            draw_width,
            eraser_width,
        }
    }

    /// Switch mode and configure the surface brush for it. Any stroke in
    /// progress is dropped.
    pub fn set_mode(&mut self, mode: ToolMode, surface: &mut Surface) {
        self.cancel();
        self.current_mode = mode;
        match mode {
            ToolMode::Select => surface.set_drawing_mode(false),
            ToolMode::Draw => {
                surface.set_brush(Brush {
                    color: self.draw_color,
                    width: self.draw_width,
                });
                surface.set_drawing_mode(true);
            }
            ToolMode::Eraser => {
                // Erasing paints over with the background; nothing is removed.
                surface.set_brush(Brush {
                    color: surface.background(),
                    width: self.eraser_width,
                });
                surface.set_drawing_mode(true);
            }
        }
    }

    /// Begin a stroke. Ignored unless the surface is in drawing mode.
    pub fn begin(&mut self, point: Point, surface: &Surface) -> bool {
        if !surface.drawing_mode() {
            return false;
        }
        self.stroke_points.clear();
        self.stroke_points.push(point);
        self.state = ToolState::Active {
            start: point,
            current: point,
        };
        true
    }

    /// Extend the stroke in progress.
    pub fn update(&mut self, point: Point) {
        if let ToolState::Active { current, .. } = &mut self.state {
            *current = point;
            if self.stroke_points.last() != Some(&point) {
                self.stroke_points.push(point);
            }
        }
    }

    /// Finish the stroke and return the path painted with `brush`.
    pub fn end(&mut self, point: Point, brush: Brush) -> Option<Shape> {
        if !self.is_active() {
            return None;
        }
        self.update(point);
        let mut path = Freehand::new(
            std::mem::take(&mut self.stroke_points),
            brush.color,
            brush.width,
        );
        path.simplify(STROKE_SIMPLIFY_TOLERANCE);
        self.state = ToolState::Idle;
        Some(Shape::Freehand(path))
    }

    /// Cancel the current interaction.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
        self.stroke_points.clear();
    }

    /// Check if a stroke is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Active { .. })
    }

    /// Points gathered so far.
    pub fn stroke_points(&self) -> &[Point] {
        &self.stroke_points
    }

    /// Preview of the stroke in progress.
    pub fn preview_shape(&self, brush: Brush) -> Option<Shape> {
        if !self.is_active() || self.stroke_points.len() < 2 {
            return None;
        }
        Some(Shape::Freehand(Freehand::new(
            self.stroke_points.clone(),
            brush.color,
            brush.width,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::NEUTRAL_BACKGROUND;

    #[test]
    fn test_mode_configures_brush() {
        let mut tm = ToolManager::default();
        let mut surface = Surface::new(800.0, 600.0);

        tm.set_mode(ToolMode::Draw, &mut surface);
        assert!(surface.drawing_mode());
        assert_eq!(surface.brush().color, SerializableColor::black());
        assert!((surface.brush().width - 2.0).abs() < f64::EPSILON);

        tm.set_mode(ToolMode::Eraser, &mut surface);
        assert!(surface.drawing_mode());
        assert_eq!(surface.brush().color, NEUTRAL_BACKGROUND);
        assert!((surface.brush().width - 20.0).abs() < f64::EPSILON);

        tm.set_mode(ToolMode::Select, &mut surface);
        assert!(!surface.drawing_mode());
    }

    #[test]
    fn test_stroke_requires_drawing_mode() {
        let mut tm = ToolManager::default();
        let mut surface = Surface::new(800.0, 600.0);
        assert!(!tm.begin(Point::new(0.0, 0.0), &surface));
        assert!(tm.end(Point::new(10.0, 0.0), surface.brush()).is_none());

        tm.set_mode(ToolMode::Draw, &mut surface);
        assert!(tm.begin(Point::new(0.0, 0.0), &surface));
        assert!(tm.is_active());
    }

    #[test]
    fn test_stroke_commit() {
        let mut tm = ToolManager::default();
        let mut surface = Surface::new(800.0, 600.0);
        tm.set_mode(ToolMode::Draw, &mut surface);

        tm.begin(Point::new(0.0, 0.0), &surface);
        tm.update(Point::new(10.0, 0.0));
        tm.update(Point::new(10.0, 0.0));
        tm.update(Point::new(20.0, 10.0));
        assert_eq!(tm.stroke_points().len(), 3);
        assert!(tm.preview_shape(surface.brush()).is_some());

        let shape = tm.end(Point::new(30.0, 30.0), surface.brush()).unwrap();
        let Shape::Freehand(path) = shape else {
            panic!("expected a freehand path");
        };
        assert_eq!(path.points.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(path.points.last(), Some(&Point::new(30.0, 30.0)));
        assert!((path.style.stroke_width - 2.0).abs() < f64::EPSILON);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_switching_mode_cancels_stroke() {
        let mut tm = ToolManager::default();
        let mut surface = Surface::new(800.0, 600.0);
        tm.set_mode(ToolMode::Draw, &mut surface);
        tm.begin(Point::new(0.0, 0.0), &surface);

        tm.set_mode(ToolMode::Select, &mut surface);
        assert!(!tm.is_active());
        assert!(tm.stroke_points().is_empty());
    }
}
