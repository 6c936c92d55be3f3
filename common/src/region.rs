use serde::{Deserialize, Serialize};

/// A screen point in monitor pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Normalized screen rectangle to monitor.
///
/// Always satisfies `left <= right` and `top <= bottom`. The right and bottom
/// edges are exclusive, so a region's size is `right - left` by `bottom - top`.
///
/// Deserializes from either `[left, top, right, bottom]` or a table with
/// those four keys; both forms are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegionRepr")]
pub struct Region {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegionRepr {
    Bounds([i32; 4]),
    Named {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
}

impl From<RegionRepr> for Region {
    fn from(repr: RegionRepr) -> Self {
        match repr {
            RegionRepr::Bounds([left, top, right, bottom]) => {
                Region::new(left, top, right, bottom)
            }
            RegionRepr::Named {
                left,
                top,
                right,
                bottom,
            } => Region::new(left, top, right, bottom),
        }
    }
}

impl Region {
    /// Build a region from raw edges, swapping them where needed.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Build a region from two arbitrary corner points (press and release).
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    pub fn width(&self) -> u32 {
        self.right.abs_diff(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.abs_diff(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Interactive drag-to-select tracking.
///
/// Points are only recorded while a selection is in progress. A region is
/// produced on release and the selection ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSelection {
    selecting: bool,
    start: Option<Point>,
    end: Option<Point>,
}

impl RegionSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter selection mode, discarding any half-finished drag.
    pub fn begin(&mut self) {
        self.selecting = true;
        self.start = None;
        self.end = None;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn press(&mut self, at: Point) {
        if self.selecting {
            self.start = Some(at);
            self.end = None;
        }
    }

    pub fn drag(&mut self, at: Point) {
        if self.selecting && self.start.is_some() {
            self.end = Some(at);
        }
    }

    /// The rectangle currently being dragged, for overlay drawing.
    pub fn preview(&self) -> Option<Region> {
        Some(Region::from_points(self.start?, self.end?))
    }

    /// Finish the drag. Returns `None` if no press was recorded.
    pub fn release(&mut self, at: Point) -> Option<Region> {
        if !self.selecting {
            return None;
        }
        let start = self.start?;
        let region = Region::from_points(start, at);
        self.cancel();
        Some(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_takes_componentwise_min_max() {
        let r = Region::from_points(Point::new(400, 50), Point::new(100, 300));
        assert_eq!(
            (r.left(), r.top(), r.right(), r.bottom()),
            (100, 50, 400, 300)
        );
        assert_eq!(r.width(), 300);
        assert_eq!(r.height(), 250);
    }

    #[test]
    fn zero_area_region_is_empty() {
        let r = Region::from_points(Point::new(10, 10), Point::new(10, 80));
        assert!(r.is_empty());
    }

    #[test]
    fn deserialize_bounds_array_normalizes() {
        let r: Region = serde_json::from_str("[300, 200, 100, 50]").unwrap();
        assert_eq!(r, Region::new(100, 50, 300, 200));
    }

    #[test]
    fn deserialize_named_table() {
        let r: Region =
            serde_json::from_str(r#"{"left":5,"top":6,"right":1,"bottom":2}"#).unwrap();
        assert_eq!(r, Region::new(1, 2, 5, 6));
    }

    #[test]
    fn selection_produces_region_only_on_release() {
        let mut sel = RegionSelection::new();
        sel.begin();
        sel.press(Point::new(50, 60));
        sel.drag(Point::new(10, 20));
        assert_eq!(sel.preview(), Some(Region::new(10, 20, 50, 60)));

        let region = sel.release(Point::new(5, 90));
        assert_eq!(region, Some(Region::new(5, 60, 50, 90)));
        assert!(!sel.is_selecting());
    }

    #[test]
    fn release_without_press_yields_nothing() {
        let mut sel = RegionSelection::new();
        sel.begin();
        assert_eq!(sel.release(Point::new(1, 1)), None);
    }

    #[test]
    fn points_ignored_outside_selection_mode() {
        let mut sel = RegionSelection::new();
        sel.press(Point::new(1, 1));
        assert_eq!(sel.release(Point::new(9, 9)), None);
    }
}
