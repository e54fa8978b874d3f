use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use glam::Vec2;

use crate::pool::{self, Pooled};

/// Tolerance used by [`Point::approx_eq_default`] to absorb float drift
pub const EPSILON: f32 = 5e-6;

/// A 2D point or vector
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Checks a point out of the process-wide pool; it goes back when the guard drops
    pub fn create(x: f32, y: f32) -> Pooled<'static, Point> {
        pool::points().acquire_with(|p| p.set_to(x, y))
    }

    /// Creates a vector from a length & an angle (radians)
    pub fn polar(length: f32, angle: f32) -> Self {
        Self::new(angle.cos() * length, angle.sin() * length)
    }

    /// Linear interpolation, `ratio = 0` yields `a`, `ratio = 1` yields `b`
    pub fn interpolate(a: Point, b: Point, ratio: f32) -> Self {
        a.to_vec2().lerp(b.to_vec2(), ratio).into()
    }

    pub fn set_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn length(&self) -> f32 {
        self.to_vec2().length()
    }

    pub fn length_squared(&self) -> f32 {
        self.to_vec2().length_squared()
    }

    /// Angle to the positive x-axis in radians, in `(-PI, PI]`
    pub fn angle(&self) -> f32 {
        self.to_vec2().to_angle()
    }

    pub fn is_origin(&self) -> bool {
        self.to_vec2() == Vec2::ZERO
    }

    /// Scales the vector to unit length; the origin stays where it is
    pub fn normalize(&mut self) {
        *self = self.to_vec2().normalize_or_zero().into();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn dot(&self, other: Point) -> f32 {
        self.to_vec2().dot(other.to_vec2())
    }

    pub fn distance(&self, other: Point) -> f32 {
        self.to_vec2().distance(other.to_vec2())
    }

    pub fn scale(&mut self, factor: f32) {
        *self = *self * factor;
    }

    pub fn invert(&mut self) {
        *self = -*self;
    }

    /// Rotates around the origin by `angle` radians
    pub fn rotate_by(&mut self, angle: f32) {
        *self = Vec2::from_angle(angle).rotate(self.to_vec2()).into();
    }

    /// True if both components lie within `epsilon` of `other`'s
    pub fn approx_eq(&self, other: Point, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }

    pub fn approx_eq_default(&self, other: Point) -> bool {
        self.approx_eq(other, EPSILON)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        (self.to_vec2() + rhs.to_vec2()).into()
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        (self.to_vec2() - rhs.to_vec2()).into()
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        (self.to_vec2() * rhs).into()
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        (-self.to_vec2()).into()
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Point::new(v.x, v.y)
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        p.to_vec2()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}
