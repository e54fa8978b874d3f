use glam::Vec2;

use super::Point;

/// Axis-aligned rectangle defined by its top-left corner & size
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners given as vectors
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        let size = max - min;
        Self::new(min.x, min.y, size.x, size.y)
    }

    /// Smallest rectangle enclosing all points; [`Rect::ZERO`] when there are none
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points = points.into_iter().map(Point::to_vec2);
        let Some(first) = points.next() else {
            return Self::ZERO;
        };
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Self::from_min_max(min, max)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Returns the top-left corner (min coords)
    pub fn min(&self) -> Point {
        self.position().into()
    }

    /// Returns the bottom-right corner (max coords)
    pub fn max(&self) -> Point {
        (self.position() + self.size()).into()
    }

    pub fn center(&self) -> Point {
        (self.position() + self.size() * 0.5).into()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// True if the point lies inside or on the edge
    pub fn contains(&self, p: Point) -> bool {
        let p = p.to_vec2();
        let min = self.position();
        p.cmpge(min).all() && p.cmple(min + self.size()).all()
    }

    /// Returns the four corners in this order: top-left, top-right, bottom-left, bottom-right
    ///
    /// That is the vertex order quads use.
    pub fn corners(&self) -> [Point; 4] {
        let min = self.min();
        let max = self.max();
        [
            min,
            Point::new(max.x, min.y),
            Point::new(min.x, max.y),
            max,
        ]
    }

    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let min = self.position().min(other.position());
        let max = (self.position() + self.size()).max(other.position() + other.size());
        Self::from_min_max(min, max)
    }
}

/// True if `p` lies inside (or on an edge of) triangle `abc`, in either winding
pub fn is_point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom == 0.0 {
        // degenerate triangle
        return false;
    }
    let inv_denom = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_points() {
        let r = Rect::from_points([
            Point::new(3.0, -1.0),
            Point::new(-2.0, 4.0),
            Point::new(1.0, 1.0),
        ]);
        assert_eq!(r, Rect::new(-2.0, -1.0, 5.0, 5.0));
        assert_eq!(Rect::from_points([]), Rect::ZERO);
    }

    #[test]
    fn contains_and_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains(Point::new(10.0, 5.0)));
        assert!(!a.contains(Point::new(10.1, 5.0)));

        let b = Rect::new(5.0, -5.0, 10.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 15.0, 15.0));
        assert_eq!(a.union(&Rect::ZERO), a);
        assert_eq!(a.center(), Point::new(5.0, 5.0));
    }

    #[test]
    fn edges_and_vector_views() {
        let mut r = Rect::new(-2.0, 1.0, 4.0, 2.0);
        assert!(r.contains(Point::new(-2.0, 3.0)));
        assert!(!r.contains(Point::new(-2.0, 3.5)));
        assert_eq!(r.max(), Point::new(2.0, 3.0));
        assert_eq!(Rect::from_min_max(r.position(), r.position() + r.size()), r);

        r.translate(2.0, -1.0);
        assert_eq!(r.corners()[3], Point::new(4.0, 2.0));
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn triangle_containment() {
        let (a, b, c) = (Point::ZERO, Point::new(10.0, 0.0), Point::new(0.0, 10.0));
        assert!(is_point_in_triangle(Point::new(2.0, 2.0), a, b, c));
        assert!(is_point_in_triangle(Point::new(2.0, 2.0), a, c, b));
        assert!(!is_point_in_triangle(Point::new(6.0, 6.0), a, b, c));
        assert!(!is_point_in_triangle(Point::new(1.0, 1.0), a, a, b));
    }
}
