/// Rendered geometry of diagram elements and hit-testing
///
/// The shape of an element depends only on its type. The mapping is a
/// lookup table with a rounded rectangle as the fallback, so every type,
/// including unknown ones, has a shape.

use crate::process::layout::{ELEMENT_HEIGHT, ELEMENT_WIDTH};
use crate::process::{ConnectionId, Diagram, Element, ElementId, ElementType, Position};

/// Radius of start/end circles
pub const CIRCLE_RADIUS: f64 = 30.0;
/// Half of the diamond's diagonals
pub const DIAMOND_HALF: f64 = 30.0;
pub const CORNER_RADIUS: f64 = 8.0;
/// How far from a connection line a click still selects it
pub const CONNECTION_HIT_TOLERANCE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Diamond,
    RoundedRect,
}

const SHAPE_TABLE: &[(&str, ShapeKind)] = &[
    ("start", ShapeKind::Circle),
    ("end", ShapeKind::Circle),
    ("decision", ShapeKind::Diamond),
];

const FALLBACK_SHAPE: ShapeKind = ShapeKind::RoundedRect;

pub fn shape_kind(element_type: &ElementType) -> ShapeKind {
    SHAPE_TABLE
        .iter()
        .find(|(name, _)| *name == element_type.as_str())
        .map(|(_, kind)| *kind)
        .unwrap_or(FALLBACK_SHAPE)
}

/// Concrete geometry of one element on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { center: Position, radius: f64 },
    /// Vertices clockwise from the top
    Diamond { vertices: [Position; 4] },
    RoundedRect { origin: Position, width: f64, height: f64, corner_radius: f64 },
}

impl Shape {
    pub fn for_element(element: &Element) -> Self {
        let Position { x, y } = element.position;
        match shape_kind(&element.element_type) {
            ShapeKind::Circle => Shape::Circle {
                center: Position::new(x + CIRCLE_RADIUS, y + CIRCLE_RADIUS),
                radius: CIRCLE_RADIUS,
            },
            ShapeKind::Diamond => Shape::Diamond {
                vertices: [
                    Position::new(x + DIAMOND_HALF, y),
                    Position::new(x + 2.0 * DIAMOND_HALF, y + DIAMOND_HALF),
                    Position::new(x + DIAMOND_HALF, y + 2.0 * DIAMOND_HALF),
                    Position::new(x, y + DIAMOND_HALF),
                ],
            },
            ShapeKind::RoundedRect => Shape::RoundedRect {
                origin: element.position,
                width: ELEMENT_WIDTH,
                height: ELEMENT_HEIGHT,
                corner_radius: CORNER_RADIUS,
            },
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Diamond { .. } => ShapeKind::Diamond,
            Shape::RoundedRect { .. } => ShapeKind::RoundedRect,
        }
    }

    /// Point where connection lines attach
    pub fn center(&self) -> Position {
        match self {
            Shape::Circle { center, .. } => *center,
            Shape::Diamond { vertices } => Position::new(vertices[0].x, vertices[1].y),
            Shape::RoundedRect { origin, width, height, .. } => {
                Position::new(origin.x + width / 2.0, origin.y + height / 2.0)
            }
        }
    }

    // Rounded corners are ignored; the corner slivers are too small to matter.
    pub fn contains(&self, point: Position) -> bool {
        match self {
            Shape::Circle { center, radius } => {
                let dx = point.x - center.x;
                let dy = point.y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
            Shape::Diamond { vertices } => {
                let center = self.center();
                let half_width = (vertices[1].x - vertices[3].x) / 2.0;
                let half_height = (vertices[2].y - vertices[0].y) / 2.0;
                (point.x - center.x).abs() / half_width + (point.y - center.y).abs() / half_height <= 1.0
            }
            Shape::RoundedRect { origin, width, height, .. } => {
                point.x >= origin.x
                    && point.x <= origin.x + width
                    && point.y >= origin.y
                    && point.y <= origin.y + height
            }
        }
    }
}

/// What lies under a canvas point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Element(ElementId),
    Connection(ConnectionId),
    Canvas,
}

/// Resolve a canvas point, elements first (topmost = drawn last), then
/// connection lines
pub fn hit_test(diagram: &Diagram, point: Position) -> Hit {
    if let Some(element) = diagram
        .elements()
        .iter()
        .rev()
        .find(|e| Shape::for_element(e).contains(point))
    {
        return Hit::Element(element.id);
    }

    for connection in diagram.connections().iter().rev() {
        let (Some(source), Some(target)) = (
            diagram.element(&connection.source),
            diagram.element(&connection.target),
        ) else {
            continue;
        };
        let from = Shape::for_element(source).center();
        let to = Shape::for_element(target).center();
        if distance_to_segment(point, from, to) <= CONNECTION_HIT_TOLERANCE {
            return Hit::Connection(connection.id);
        }
    }

    Hit::Canvas
}

fn distance_to_segment(point: Position, from: Position, to: Position) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((point.x - from.x) * dx + (point.y - from.y) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let nearest_x = from.x + t * dx;
    let nearest_y = from.y + t * dy;
    ((point.x - nearest_x).powi(2) + (point.y - nearest_y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{NewElement, Properties};

    fn element(kind: ElementType, x: f64, y: f64) -> Element {
        Element {
            id: ElementId::local(),
            element_type: kind,
            label: "e".into(),
            position: Position::new(x, y),
            properties: Properties::new(),
        }
    }

    #[test]
    fn shape_mapping_is_total() {
        assert_eq!(shape_kind(&ElementType::Start), ShapeKind::Circle);
        assert_eq!(shape_kind(&ElementType::End), ShapeKind::Circle);
        assert_eq!(shape_kind(&ElementType::Decision), ShapeKind::Diamond);
        for kind in ElementType::BUILTIN {
            if !matches!(kind, ElementType::Start | ElementType::End | ElementType::Decision) {
                assert_eq!(shape_kind(&kind), ShapeKind::RoundedRect, "{}", kind);
            }
        }
        assert_eq!(shape_kind(&ElementType::from("swimlane")), ShapeKind::RoundedRect);
    }

    #[test]
    fn diamond_excludes_bounding_box_corners() {
        let shape = Shape::for_element(&element(ElementType::Decision, 100.0, 100.0));
        assert!(shape.contains(Position::new(130.0, 130.0)));
        assert!(shape.contains(Position::new(130.0, 101.0)));
        assert!(!shape.contains(Position::new(102.0, 102.0)));
    }

    #[test]
    fn circle_and_rect_bounds() {
        let circle = Shape::for_element(&element(ElementType::Start, 0.0, 0.0));
        assert_eq!(circle.center(), Position::new(30.0, 30.0));
        assert!(!circle.contains(Position::new(1.0, 1.0)));

        let rect = Shape::for_element(&element(ElementType::Database, 10.0, 10.0));
        assert_eq!(rect.center(), Position::new(70.0, 40.0));
        assert!(rect.contains(Position::new(129.0, 69.0)));
        assert!(!rect.contains(Position::new(131.0, 40.0)));
    }

    #[test]
    fn hit_test_prefers_topmost_element_then_connections() {
        let mut diagram = Diagram::new(1);
        let below = diagram
            .add_element(NewElement::new(ElementType::Step, "below").at(Position::new(0.0, 0.0)))
            .unwrap();
        let above = diagram
            .add_element(NewElement::new(ElementType::Step, "above").at(Position::new(50.0, 0.0)))
            .unwrap();
        let far = diagram
            .add_element(NewElement::new(ElementType::Step, "far").at(Position::new(0.0, 400.0)))
            .unwrap();
        diagram.connect(&below.id, &far.id, None).unwrap();
        let link = diagram.connections()[0].id;

        assert_eq!(hit_test(&diagram, Position::new(20.0, 20.0)), Hit::Element(below.id));
        assert_eq!(hit_test(&diagram, Position::new(60.0, 20.0)), Hit::Element(above.id));
        // Line runs from (60,30) to (60,430)
        assert_eq!(hit_test(&diagram, Position::new(63.0, 200.0)), Hit::Connection(link));
        assert_eq!(hit_test(&diagram, Position::new(300.0, 300.0)), Hit::Canvas);
    }
}
