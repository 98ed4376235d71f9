use crate::clip::geometry::{DesktopBounds, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub id: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
}

impl Display {
    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring display, so an edge-adjacent point matches exactly one.
    pub fn contains_global(&self, p: Point) -> bool {
        p.x >= self.x
            && p.x < self.x + self.width as i32
            && p.y >= self.y
            && p.y < self.y + self.height as i32
    }
}

/// Minimal bounding rectangle of the display set, or `None` when empty.
pub fn desktop_bounds(displays: &[Display]) -> Option<DesktopBounds> {
    let first = displays.first()?;
    let mut origin_x = first.x;
    let mut origin_y = first.y;
    let mut right = first.x + first.width as i32;
    let mut bottom = first.y + first.height as i32;

    for d in &displays[1..] {
        origin_x = origin_x.min(d.x);
        origin_y = origin_y.min(d.y);
        right = right.max(d.x + d.width as i32);
        bottom = bottom.max(d.y + d.height as i32);
    }

    Some(DesktopBounds {
        origin_x,
        origin_y,
        width: (right - origin_x) as u32,
        height: (bottom - origin_y) as u32,
    })
}

/// Immutable snapshot of the enumerated displays for one clip session.
///
/// Transforms are pure over this snapshot. On overlapping displays the
/// hit-test tie-break is registry order: the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRegistry {
    displays: Vec<Display>,
    bounds: Option<DesktopBounds>,
}

impl DisplayRegistry {
    pub fn new(displays: Vec<Display>) -> Self {
        let bounds = desktop_bounds(&displays);
        Self { displays, bounds }
    }

    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    pub fn bounds(&self) -> Option<DesktopBounds> {
        self.bounds
    }

    pub fn get(&self, display_id: u32) -> Option<&Display> {
        self.displays.iter().find(|d| d.id == display_id)
    }

    pub fn contains_id(&self, display_id: u32) -> bool {
        self.get(display_id).is_some()
    }

    /// First display containing the global point, in registry order.
    pub fn hit_test(&self, p: Point) -> Option<&Display> {
        self.displays.iter().find(|d| d.contains_global(p))
    }

    /// No scale factor applied; client space is logical like global space.
    pub fn global_to_client(&self, p: Point, display_id: u32) -> Option<Point> {
        let d = self.get(display_id)?;
        Some(Point::new(p.x - d.x, p.y - d.y))
    }

    pub fn client_to_global(&self, p: Point, display_id: u32) -> Option<Point> {
        let d = self.get(display_id)?;
        Some(Point::new(p.x + d.x, p.y + d.y))
    }

    /// Map a global point into the composited desktop canvas, whose origin
    /// is the desktop bounds origin and whose unit is one global pixel.
    pub fn global_to_normalized(&self, p: Point) -> Option<Point> {
        let bounds = self.bounds?;
        Some(Point::new(p.x - bounds.origin_x, p.y - bounds.origin_y))
    }
}

#[cfg(test)]
pub(crate) fn test_display(id: u32, x: i32, y: i32, width: u32, height: u32) -> Display {
    Display {
        id,
        name: format!("display-{id}"),
        x,
        y,
        width,
        height,
        scale_factor: 1.0,
    }
}
