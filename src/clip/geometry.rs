use serde::{Deserialize, Serialize};

/// Drags narrower or shorter than this count as clicks, not selections.
pub const MIN_SELECTION_EXTENT: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, scale: f32) -> Self {
        Self {
            x: (self.x as f32 * scale).round() as i32,
            y: (self.y as f32 * scale).round() as i32,
        }
    }
}

/// Scale a point that may be absent; absence propagates.
pub fn scale_point(point: Option<Point>, scale: f32) -> Option<Point> {
    point.map(|p| p.scaled(scale))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area2D {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Area2D {
    pub fn right_bottom(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopBounds {
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: u32,
    pub height: u32,
}

impl DesktopBounds {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin_x
            && p.x <= self.origin_x + self.width as i32
            && p.y >= self.origin_y
            && p.y <= self.origin_y + self.height as i32
    }
}

/// Axis-aligned rectangle between two corner points, or `None` when either
/// point is missing or the extent falls under [`MIN_SELECTION_EXTENT`].
pub fn detect_area(start: Option<Point>, end: Option<Point>) -> Option<Area2D> {
    let (start, end) = (start?, end?);

    let width = (start.x - end.x).abs();
    let height = (start.y - end.y).abs();
    if width < MIN_SELECTION_EXTENT || height < MIN_SELECTION_EXTENT {
        return None;
    }

    Some(Area2D {
        x: start.x.min(end.x),
        y: start.y.min(end.y),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::{detect_area, scale_point, Area2D, Point};

    #[test]
    fn sub_threshold_drags_are_not_selections() {
        let start = Some(Point::new(100, 100));
        assert_eq!(detect_area(start, Some(Point::new(101, 200))), None);
        assert_eq!(detect_area(start, Some(Point::new(200, 101))), None);
        assert_eq!(detect_area(start, Some(Point::new(100, 100))), None);
        assert_eq!(detect_area(start, None), None);
        assert_eq!(detect_area(None, Some(Point::new(0, 0))), None);
    }

    #[test]
    fn detected_area_is_corner_order_independent() {
        let a = Point::new(50, 80);
        let b = Point::new(10, 20);

        let expected = Area2D {
            x: 10,
            y: 20,
            width: 40,
            height: 60,
        };
        assert_eq!(detect_area(Some(a), Some(b)), Some(expected));
        assert_eq!(detect_area(Some(b), Some(a)), Some(expected));
        assert_eq!(expected.right_bottom(), Point::new(50, 80));
    }

    #[test]
    fn scaling_rounds_and_propagates_absence() {
        assert_eq!(
            scale_point(Some(Point::new(10, -3)), 1.5),
            Some(Point::new(15, -5))
        );
        assert_eq!(scale_point(None, 2.0), None);
        assert_eq!(Point::new(7, 7).scaled(1.0), Point::new(7, 7));
    }

    #[test]
    fn area_containment_is_inclusive_of_edges() {
        let area = Area2D {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(area.contains(Point::new(0, 0)));
        assert!(area.contains(Point::new(10, 10)));
        assert!(!area.contains(Point::new(11, 10)));
    }
}
