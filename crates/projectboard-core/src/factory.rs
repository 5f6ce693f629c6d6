//! Builders for the composite objects placed on a board.
//!
//! Everything here is pure: builders return shapes positioned relative to
//! an origin and leave insertion and selection to the session.

use crate::shapes::{
    Ellipse, Group, GroupRole, Line, Rectangle, SerializableColor, Shape, ShapeId, ShapeStyle,
    Text, Triangle,
};
use kurbo::{Point, Vec2};
use uuid::Uuid;

pub const SECTION_WIDTH: f64 = 250.0;
pub const SECTION_HEIGHT: f64 = 300.0;
pub const SECTION_GAP: f64 = 20.0;
pub const STICKY_NOTE_SIZE: f64 = 150.0;
pub const TASK_CARD_WIDTH: f64 = 200.0;
pub const TASK_CARD_HEIGHT: f64 = 180.0;

pub const ADD_TASK_LABEL: &str = "+ Add Task";
pub const NEW_SECTION_TITLE: &str = "New Section";
pub const SECTION_FILL: SerializableColor = SerializableColor::rgb(0xec, 0xef, 0xf1);
pub const SECTION_TEXT: SerializableColor = SerializableColor::rgb(0x37, 0x47, 0x4f);
pub const UNASSIGNED_SECTION_LABEL: &str = "No section assigned";

const SHAPE_WIDTH: f64 = 150.0;
const SHAPE_HEIGHT: f64 = 100.0;
const CIRCLE_RADIUS: f64 = 50.0;
const LINE_LENGTH: f64 = 150.0;
const ARROWHEAD_SIZE: f64 = 15.0;
const OUTLINE: SerializableColor = SerializableColor::rgb(0x33, 0x33, 0x33);
const MUTED_TEXT: SerializableColor = SerializableColor::rgb(0x66, 0x66, 0x66);
const CARD_BORDER: SerializableColor = SerializableColor::rgb(0xcc, 0xcc, 0xcc);
const CARD_HEADER: SerializableColor = SerializableColor::rgb(0x19, 0x76, 0xd2);

/// Sticky note background colors.
pub const STICKY_PALETTE: [SerializableColor; 5] = [
    SerializableColor::rgb(0xff, 0xf9, 0xc4),
    SerializableColor::rgb(0xff, 0xe0, 0xb2),
    SerializableColor::rgb(0xc8, 0xe6, 0xc9),
    SerializableColor::rgb(0xbb, 0xde, 0xfb),
    SerializableColor::rgb(0xf8, 0xbb, 0xd0),
];

/// Labeled shape kinds reachable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

impl ShapeKind {
    /// Parse a kind name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Some(Self::Rectangle),
            "circle" => Some(Self::Circle),
            _ => None,
        }
    }
}

/// Pick a sticky note color from the palette.
pub fn pick_sticky_color() -> SerializableColor {
    STICKY_PALETTE[(next_mix() as usize) % STICKY_PALETTE.len()]
}

/// Counter hash (splitmix32 finalizer); platform independent and needs no
/// time source.
fn next_mix() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// A background primitive with an editable label on top.
pub fn labeled_shape(kind: ShapeKind, origin: Point) -> Shape {
    let style = ShapeStyle {
        fill_color: Some(SerializableColor::white()),
        ..ShapeStyle::stroked(OUTLINE, 2.0)
    };
    let (background, label) = match kind {
        ShapeKind::Rectangle => (
            Shape::Rectangle(
                Rectangle::new(origin, SHAPE_WIDTH, SHAPE_HEIGHT).with_style(style),
            ),
            Text::new(origin + Vec2::new(10.0, 40.0), "Text").with_width(SHAPE_WIDTH - 20.0),
        ),
        ShapeKind::Circle => (
            Shape::Ellipse(
                Ellipse::circle(origin + Vec2::new(CIRCLE_RADIUS, CIRCLE_RADIUS), CIRCLE_RADIUS)
                    .with_style(style),
            ),
            Text::new(origin + Vec2::new(20.0, 40.0), "Text")
                .with_width(CIRCLE_RADIUS * 2.0 - 40.0),
        ),
    };
    Shape::Group(Group::with_role(
        GroupRole::LabeledShape,
        vec![background, Shape::Text(label)],
    ))
}

/// A colored note. Returns the group and the id of its label.
pub fn sticky_note(origin: Point, color: SerializableColor) -> (Shape, ShapeId) {
    let label = Text::new(origin + Vec2::new(10.0, 10.0), "")
        .with_font_size(14.0)
        .with_width(STICKY_NOTE_SIZE - 20.0)
        .with_color(color.contrasting_text());
    let label_id = label.id;
    let note = Group::with_role(
        GroupRole::StickyNote,
        vec![
            Shape::Rectangle(
                Rectangle::new(origin, STICKY_NOTE_SIZE, STICKY_NOTE_SIZE)
                    .with_style(ShapeStyle::filled(color)),
            ),
            Shape::Text(label),
        ],
    );
    (Shape::Group(note), label_id)
}

/// A bare editable text box.
pub fn text_box(origin: Point) -> Shape {
    Shape::Text(Text::new(origin, "Text").with_width(200.0))
}

/// A horizontal line, plus an arrowhead group at its end when `arrow`.
pub fn line(origin: Point, arrow: bool) -> Vec<Shape> {
    let line = Line::new(origin, origin + Vec2::new(LINE_LENGTH, 0.0))
        .with_style(ShapeStyle::stroked(OUTLINE, 2.0));
    let mut shapes = Vec::with_capacity(2);
    if arrow {
        shapes.push(Shape::Line(line.clone()));
        shapes.push(arrowhead(&line));
    } else {
        shapes.push(Shape::Line(line));
    }
    shapes
}

/// Triangle whose apex sits on the line's end, pointing along it.
pub fn arrowhead(line: &Line) -> Shape {
    let angle = line.angle();
    let back = Vec2::new(angle.cos(), angle.sin()) * (ARROWHEAD_SIZE / 2.0);
    let tip = Triangle::new(line.end - back, ARROWHEAD_SIZE, ARROWHEAD_SIZE, angle)
        .with_style(ShapeStyle::filled(line.style.stroke_color));
    Shape::Group(Group::with_role(
        GroupRole::Arrowhead,
        vec![Shape::Triangle(tip)],
    ))
}

/// A kanban column with a bold title and an add-task affordance.
pub fn section(
    title: &str,
    fill: SerializableColor,
    text_color: SerializableColor,
    origin: Point,
) -> Shape {
    let frame = Rectangle::new(origin, SECTION_WIDTH, SECTION_HEIGHT)
        .with_corner_radius(8.0)
        .with_style(ShapeStyle {
            fill_color: Some(fill),
            ..ShapeStyle::stroked(text_color, 1.0)
        });
    let heading = Text::new(origin + Vec2::new(12.0, 12.0), title)
        .with_font_size(18.0)
        .with_width(SECTION_WIDTH - 24.0)
        .with_color(text_color)
        .bold();
    let add_task = Text::new(
        origin + Vec2::new(12.0, SECTION_HEIGHT - 36.0),
        ADD_TASK_LABEL,
    )
    .with_font_size(14.0)
    .with_color(text_color);

    Shape::Group(Group::with_role(
        GroupRole::Section {
            section_id: Uuid::new_v4(),
            title: title.to_string(),
        },
        vec![
            Shape::Rectangle(frame),
            Shape::Text(heading),
            Shape::Text(add_task),
        ],
    ))
}

/// A task card, optionally filed under a section title.
pub fn task_card(section: Option<&str>, origin: Point) -> Shape {
    let card = Rectangle::new(origin, TASK_CARD_WIDTH, TASK_CARD_HEIGHT)
        .with_corner_radius(6.0)
        .with_style(ShapeStyle {
            fill_color: Some(SerializableColor::white()),
            ..ShapeStyle::stroked(CARD_BORDER, 1.0)
        });
    let header = Rectangle::new(origin, TASK_CARD_WIDTH, 32.0)
        .with_style(ShapeStyle::filled(CARD_HEADER));
    let body_width = TASK_CARD_WIDTH - 20.0;
    let footer = match section {
        Some(title) => format!("Section: {title}"),
        None => UNASSIGNED_SECTION_LABEL.to_string(),
    };

    let children = vec![
        Shape::Rectangle(card),
        Shape::Rectangle(header),
        Shape::Text(
            Text::new(origin + Vec2::new(10.0, 8.0), "New Task")
                .with_width(body_width)
                .with_color(CARD_HEADER.contrasting_text())
                .bold(),
        ),
        Shape::Text(
            Text::new(origin + Vec2::new(10.0, 42.0), "Add description...")
                .with_font_size(13.0)
                .with_width(body_width)
                .with_color(MUTED_TEXT),
        ),
        Shape::Text(
            Text::new(origin + Vec2::new(10.0, 72.0), "☐ Subtask 1")
                .with_font_size(13.0)
                .with_width(body_width),
        ),
        Shape::Text(
            Text::new(origin + Vec2::new(10.0, 96.0), "☐ Subtask 2")
                .with_font_size(13.0)
                .with_width(body_width),
        ),
        Shape::Text(
            Text::new(origin + Vec2::new(10.0, TASK_CARD_HEIGHT - 30.0), footer)
                .with_font_size(12.0)
                .with_width(body_width)
                .with_color(MUTED_TEXT),
        ),
    ];

    Shape::Group(Group::with_role(
        GroupRole::TaskCard {
            section: section.map(str::to_string),
        },
        children,
    ))
}

/// Placement of one default section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlacement {
    pub title: &'static str,
    pub fill: SerializableColor,
    pub text_color: SerializableColor,
    /// Left edge.
    pub x: f64,
}

/// The To Do / In Progress / Done row, centered for `surface_width`.
pub fn default_section_layout(surface_width: f64) -> Vec<SectionPlacement> {
    const SECTIONS: [(&str, SerializableColor, SerializableColor); 3] = [
        (
            "To Do",
            SerializableColor::rgb(0xe3, 0xf2, 0xfd),
            SerializableColor::rgb(0x15, 0x65, 0xc0),
        ),
        (
            "In Progress",
            SerializableColor::rgb(0xff, 0xf3, 0xe0),
            SerializableColor::rgb(0xe6, 0x51, 0x00),
        ),
        (
            "Done",
            SerializableColor::rgb(0xe8, 0xf5, 0xe9),
            SerializableColor::rgb(0x2e, 0x7d, 0x32),
        ),
    ];

    let count = SECTIONS.len() as f64;
    let total = SECTION_WIDTH * count + SECTION_GAP * (count - 1.0);
    let start_x = (surface_width - total) / 2.0;

    SECTIONS
        .iter()
        .enumerate()
        .map(|(i, &(title, fill, text_color))| SectionPlacement {
            title,
            fill,
            text_color,
            x: start_x + i as f64 * (SECTION_WIDTH + SECTION_GAP),
        })
        .collect()
}
