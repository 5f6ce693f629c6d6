//! Isosceles triangle, used for arrowheads.

use super::{point_to_polyline_dist, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isosceles triangle whose apex points along `rotation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub(crate) id: ShapeId,
    /// Centroid of the bounding box before rotation.
    pub center: Point,
    /// Length of the base edge.
    pub base: f64,
    /// Distance from base to apex.
    pub height: f64,
    /// Apex direction in radians (0 = pointing along +x).
    pub rotation: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Triangle {
    pub fn new(center: Point, base: f64, height: f64, rotation: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            base,
            height,
            rotation,
            style: ShapeStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Apex followed by the two base corners, in world coordinates.
    pub fn vertices(&self) -> [Point; 3] {
        let (sin, cos) = self.rotation.sin_cos();
        let rotate = |local: Vec2| {
            self.center + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
        };
        let half_h = self.height / 2.0;
        let half_b = self.base / 2.0;
        [
            rotate(Vec2::new(half_h, 0.0)),
            rotate(Vec2::new(-half_h, -half_b)),
            rotate(Vec2::new(-half_h, half_b)),
        ]
    }

    pub fn apex(&self) -> Point {
        self.vertices()[0]
    }

    fn contains(&self, point: Point) -> bool {
        let [a, b, c] = self.vertices();
        let sign = |p1: Point, p2: Point, p3: Point| {
            (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
        };
        let d1 = sign(point, a, b);
        let d2 = sign(point, b, c);
        let d3 = sign(point, c, a);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_neg && has_pos)
    }
}

impl ShapeTrait for Triangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let [a, b, c] = self.vertices();
        Rect::from_points(a, b).union_pt(c)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.contains(point) {
            return true;
        }
        let [a, b, c] = self.vertices();
        point_to_polyline_dist(point, &[a, b, c, a]) <= tolerance + self.style.stroke_width / 2.0
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
    }
}
