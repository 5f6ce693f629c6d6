//! The drawing surface: an ordered object sequence plus background.

use crate::shapes::{SerializableColor, Shape, ShapeId};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Neutral fill used for blank boards and the eraser brush.
pub const NEUTRAL_BACKGROUND: SerializableColor = SerializableColor::rgb(0xf5, 0xf5, 0xf5);

/// Failure to marshal a surface to or from its JSON form.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode surface: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode surface: {0}")]
    Decode(#[source] serde_json::Error),
}

/// The serializable content of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    /// Background fill.
    pub background: SerializableColor,
    /// Objects back to front.
    pub objects: Vec<Shape>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            background: NEUTRAL_BACKGROUND,
            objects: Vec::new(),
        }
    }
}

impl SurfaceState {
    /// Canonical JSON form stored as `canvas_json`.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(SnapshotError::Decode)
    }
}

/// Object mutation notifications, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Added(ShapeId),
    Modified(ShapeId),
    Removed(ShapeId),
    Cleared,
}

/// Brush used while drawing mode is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: SerializableColor,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 2.0,
        }
    }
}

/// The mutable drawing canvas owned by a whiteboard session.
#[derive(Debug, Clone)]
pub struct Surface {
    state: SurfaceState,
    size: Size,
    drawing_mode: bool,
    brush: Brush,
    events: Vec<SurfaceEvent>,
}

impl Surface {
    /// Create a blank surface of the given viewport size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            state: SurfaceState::default(),
            size: Size::new(width, height),
            drawing_mode: false,
            brush: Brush::default(),
            events: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    pub fn background(&self) -> SerializableColor {
        self.state.background
    }

    pub fn set_background(&mut self, color: SerializableColor) {
        self.state.background = color;
    }

    pub fn drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    pub fn set_drawing_mode(&mut self, on: bool) {
        self.drawing_mode = on;
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    /// Objects back to front.
    pub fn objects(&self) -> &[Shape] {
        &self.state.objects
    }

    pub fn len(&self) -> usize {
        self.state.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.objects.is_empty()
    }

    /// Append an object on top.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.state.objects.push(shape);
        self.events.push(SurfaceEvent::Added(id));
        id
    }

    /// Remove a top-level object.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.index_of(id)?;
        let shape = self.state.objects.remove(index);
        self.events.push(SurfaceEvent::Removed(id));
        Some(shape)
    }

    /// Mutate an object or a descendant of one. The event names the
    /// top-level object that owns the change.
    pub fn modify<F>(&mut self, id: ShapeId, f: F) -> bool
    where
        F: FnOnce(&mut Shape),
    {
        for object in &mut self.state.objects {
            let top = object.id();
            if let Some(target) = object.find_mut(id) {
                f(target);
                self.events.push(SurfaceEvent::Modified(top));
                return true;
            }
        }
        false
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.state.objects.clear();
        self.events.push(SurfaceEvent::Cleared);
    }

    /// Get a top-level object.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.state.objects.iter().find(|s| s.id() == id)
    }

    /// Find an object or any descendant.
    pub fn find(&self, id: ShapeId) -> Option<&Shape> {
        self.state.objects.iter().find_map(|s| s.find(id))
    }

    /// Top-level object containing `id` (itself if top-level).
    pub fn owner_of(&self, id: ShapeId) -> Option<ShapeId> {
        self.state
            .objects
            .iter()
            .find(|s| s.find(id).is_some())
            .map(Shape::id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.find(id).is_some()
    }

    fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.state.objects.iter().position(|s| s.id() == id)
    }

    /// Find top-level objects at a point, front to back.
    pub fn objects_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.state
            .objects
            .iter()
            .rev()
            .filter(|s| s.hit_test(point, tolerance))
            .map(Shape::id)
            .collect()
    }

    /// Bounding box of all objects.
    pub fn bounds(&self) -> Option<Rect> {
        self.state
            .objects
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, r| acc.union(r))
    }

    /// Capture the current content.
    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    /// Replace the whole content. Every restored object is announced as
    /// added, matching how a freshly deserialized surface behaves.
    pub fn restore(&mut self, state: SurfaceState) {
        self.state = state;
        self.events.push(SurfaceEvent::Cleared);
        let ids: Vec<ShapeId> = self.state.objects.iter().map(Shape::id).collect();
        self.events
            .extend(ids.into_iter().map(SurfaceEvent::Added));
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        self.state.to_json()
    }

    /// Deserialize `json` and replace the content with it.
    pub fn load_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let state = SurfaceState::from_json(json)?;
        self.restore(state);
        Ok(())
    }

    /// Take pending mutation events.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Group, Rectangle, ShapeStyle, ShapeTrait, Text};

    fn rect(x: f64) -> Shape {
        Shape::Rectangle(
            Rectangle::new(Point::new(x, 0.0), 100.0, 100.0)
                .with_style(ShapeStyle::filled(SerializableColor::white())),
        )
    }

    #[test]
    fn test_add_and_remove_emit_events() {
        let mut surface = Surface::new(800.0, 600.0);
        let id = surface.add(rect(0.0));
        assert_eq!(surface.len(), 1);
        assert!(surface.remove(id).is_some());
        assert!(surface.is_empty());
        assert_eq!(
            surface.drain_events(),
            vec![SurfaceEvent::Added(id), SurfaceEvent::Removed(id)]
        );
        assert!(!surface.has_pending_events());
    }

    #[test]
    fn test_remove_unknown_is_silent() {
        let mut surface = Surface::new(800.0, 600.0);
        assert!(surface.remove(uuid::Uuid::new_v4()).is_none());
        assert!(surface.drain_events().is_empty());
    }

    #[test]
    fn test_modify_nested_reports_owner() {
        let mut surface = Surface::new(800.0, 600.0);
        let label = Text::new(Point::new(0.0, 0.0), "old");
        let label_id = label.id();
        let group_id = surface.add(Shape::Group(Group::new(vec![Shape::Text(label)])));
        surface.drain_events();

        let changed = surface.modify(label_id, |s| {
            if let Some(t) = s.as_text_mut() {
                t.content = "new".into();
            }
        });

        assert!(changed);
        assert_eq!(surface.drain_events(), vec![SurfaceEvent::Modified(group_id)]);
        assert_eq!(surface.owner_of(label_id), Some(group_id));
        let text = surface.find(label_id).and_then(Shape::as_text).unwrap();
        assert_eq!(text.content(), "new");
    }

    #[test]
    fn test_objects_at_point_front_first() {
        let mut surface = Surface::new(800.0, 600.0);
        let back = surface.add(rect(0.0));
        let front = surface.add(rect(50.0));

        assert_eq!(surface.objects_at_point(Point::new(75.0, 50.0), 0.0), vec![front, back]);
        assert_eq!(surface.objects_at_point(Point::new(25.0, 50.0), 0.0), vec![back]);
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let mut surface = Surface::new(800.0, 600.0);
        let a = surface.add(rect(0.0));
        let b = surface.add(rect(200.0));
        surface.set_background(SerializableColor::white());
        let json = surface.to_json().unwrap();

        let mut other = Surface::new(800.0, 600.0);
        other.load_json(&json).unwrap();
        let ids: Vec<_> = other.objects().iter().map(Shape::id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(other.background(), SerializableColor::white());
        assert_eq!(other.to_json().unwrap(), json);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut surface = Surface::new(800.0, 600.0);
        surface.add(rect(0.0));
        assert!(matches!(surface.load_json("{nope"), Err(SnapshotError::Decode(_))));
        assert_eq!(surface.len(), 1);
    }

    #[test]
    fn test_bounds() {
        let mut surface = Surface::new(800.0, 600.0);
        assert!(surface.bounds().is_none());
        surface.add(rect(0.0));
        surface.add(rect(200.0));
        assert_eq!(surface.bounds(), Some(Rect::new(0.0, 0.0, 300.0, 100.0)));
    }
}
