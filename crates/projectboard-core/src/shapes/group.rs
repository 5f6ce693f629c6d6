//! Composite shapes.

use super::{Shape, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a group represents on the board.
///
/// Roles carry the identity fields that must survive a snapshot round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupRole {
    /// User-made grouping with no extra meaning.
    #[default]
    Plain,
    /// Rectangle or circle with an editable label.
    LabeledShape,
    /// Colored note with an editable label.
    StickyNote,
    /// Triangle tip appended to an arrow line.
    Arrowhead,
    /// Kanban column.
    Section { section_id: Uuid, title: String },
    /// Task card, optionally filed under a section title.
    TaskCard { section: Option<String> },
}

/// A group of shapes that can be manipulated as a single unit.
/// Groups can contain other groups, enabling nested hierarchies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: ShapeId,
    #[serde(default)]
    role: GroupRole,
    /// Child shapes, back to front.
    pub children: Vec<Shape>,
    #[serde(default)]
    style: ShapeStyle,
}

impl Group {
    /// Create a new plain group from a list of shapes.
    pub fn new(children: Vec<Shape>) -> Self {
        Self::with_role(GroupRole::Plain, children)
    }

    pub fn with_role(role: GroupRole, children: Vec<Shape>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            children,
            style: ShapeStyle::default(),
        }
    }

    pub fn role(&self) -> &GroupRole {
        &self.role
    }

    /// Section id and title, if this group is a section.
    pub fn section(&self) -> Option<(Uuid, &str)> {
        match &self.role {
            GroupRole::Section { section_id, title } => Some((*section_id, title.as_str())),
            _ => None,
        }
    }

    /// Get the children of this group.
    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// First text child, used as the group's editable label.
    pub fn label(&self) -> Option<&Shape> {
        self.children.iter().find(|c| c.as_text().is_some())
    }

    /// Find a shape by ID within this group (including nested groups).
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Find a mutable shape by ID within this group (including nested groups).
    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }
}

impl ShapeTrait for Group {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut children = self.children.iter();
        let Some(first) = children.next() else {
            return Rect::ZERO;
        };
        children.fold(first.bounds(), |acc, child| acc.union(child.bounds()))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.children
            .iter()
            .any(|child| child.hit_test(point, tolerance))
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        for child in &mut self.children {
            child.transform(affine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rectangle, SerializableColor, Text};

    fn filled_rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::Rectangle(
            Rectangle::new(Point::new(x, y), w, h)
                .with_style(ShapeStyle::filled(SerializableColor::white())),
        )
    }

    #[test]
    fn test_group_bounds() {
        let group = Group::new(vec![
            filled_rect(0.0, 0.0, 100.0, 50.0),
            filled_rect(200.0, 200.0, 50.0, 100.0),
        ]);
        let bounds = group.bounds();

        assert!((bounds.x0 - 0.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 0.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 250.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_hit_test() {
        let group = Group::new(vec![
            filled_rect(0.0, 0.0, 100.0, 50.0),
            filled_rect(200.0, 200.0, 50.0, 100.0),
        ]);

        assert!(group.hit_test(Point::new(50.0, 25.0), 0.0));
        assert!(group.hit_test(Point::new(225.0, 250.0), 0.0));
        assert!(!group.hit_test(Point::new(150.0, 100.0), 0.0));
    }

    #[test]
    fn test_nested_find() {
        let label = Text::new(Point::new(10.0, 10.0), "inner");
        let label_id = label.id();
        let inner = Group::new(vec![Shape::Text(label)]);
        let inner_id = inner.id;
        let outer = Group::new(vec![Shape::Group(inner), filled_rect(0.0, 0.0, 5.0, 5.0)]);

        assert!(outer.find_shape(label_id).is_some());
        assert!(outer.find_shape(inner_id).is_some());
    }

    #[test]
    fn test_section_role_roundtrip() {
        let section_id = Uuid::new_v4();
        let group = Group::with_role(
            GroupRole::Section {
                section_id,
                title: "Done".into(),
            },
            vec![filled_rect(0.0, 0.0, 250.0, 300.0)],
        );

        let json = serde_json::to_string(&group).unwrap();
        let back: Group = serde_json::from_str(&json).unwrap();
        assert_eq!(back.section(), Some((section_id, "Done")));
        assert_eq!(serde_json::to_string(&back).unwrap(), json);
    }

    #[test]
    fn test_label_lookup() {
        let group = Group::with_role(
            GroupRole::StickyNote,
            vec![
                filled_rect(0.0, 0.0, 150.0, 150.0),
                Shape::Text(Text::new(Point::new(10.0, 10.0), "note")),
            ],
        );
        assert_eq!(group.label().and_then(Shape::as_text).map(Text::content), Some("note"));
    }
}
