use glam::Mat4;

use super::{
    Point,
    trig::{fast_cos, fast_sin},
};
use crate::{
    error::{Error, Result},
    pool::{self, Pooled},
};

/// A 2D affine transform
///
/// Maps `(x, y)` to `(a·x + c·y + tx, b·x + d·y + ty)`. The mutating helpers
/// ([`rotate`](Self::rotate), [`scale`](Self::scale), [`skew`](Self::skew),
/// [`translate`](Self::translate)) all apply *after* the current transform, so call order matters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix2D {
    pub const IDENTITY: Matrix2D = Matrix2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Checks a matrix out of the process-wide pool; it goes back when the guard drops
    pub fn create(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Pooled<'static, Matrix2D> {
        pool::matrices().acquire_with(|m| m.set_to(a, b, c, d, tx, ty))
    }

    pub fn from_translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn from_rotation(angle: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.rotate(angle);
        m
    }

    pub fn from_scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn set_to(&mut self, a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) {
        *self = Self::new(a, b, c, d, tx, ty);
    }

    pub fn copy_from(&mut self, other: &Matrix2D) {
        *self = *other;
    }

    /// Resets to the identity transform
    pub fn identity(&mut self) {
        *self = Self::IDENTITY;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// `self = self ∘ m`: `m` is applied first, then the previous `self`
    ///
    /// Composes a child's local transform into its parent's: `parent.append_matrix(&local)`.
    pub fn append_matrix(&mut self, m: &Matrix2D) {
        *self = Self::new(
            self.a * m.a + self.c * m.b,
            self.b * m.a + self.d * m.b,
            self.a * m.c + self.c * m.d,
            self.b * m.c + self.d * m.d,
            self.a * m.tx + self.c * m.ty + self.tx,
            self.b * m.tx + self.d * m.ty + self.ty,
        );
    }

    /// `self = m ∘ self`: the previous `self` is applied first, then `m`
    pub fn prepend_matrix(&mut self, m: &Matrix2D) {
        let mut result = *m;
        result.append_matrix(self);
        *self = result;
    }

    /// Rotates by `angle` radians; a zero angle leaves the matrix untouched
    pub fn rotate(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let (sin, cos) = angle.sin_cos();
        self.rotate_sin_cos(sin, cos);
    }

    /// Like [`rotate`](Self::rotate), but with the table-driven [`fast_sin`]/[`fast_cos`]
    pub fn rotate_fast(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        self.rotate_sin_cos(fast_sin(angle), fast_cos(angle));
    }

    fn rotate_sin_cos(&mut self, sin: f32, cos: f32) {
        let Self { a, b, c, d, tx, ty } = *self;
        self.a = a * cos - b * sin;
        self.b = a * sin + b * cos;
        self.c = c * cos - d * sin;
        self.d = c * sin + d * cos;
        self.tx = tx * cos - ty * sin;
        self.ty = tx * sin + ty * cos;
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        if sx != 1.0 {
            self.a *= sx;
            self.c *= sx;
            self.tx *= sx;
        }
        if sy != 1.0 {
            self.b *= sy;
            self.d *= sy;
            self.ty *= sy;
        }
    }

    /// Skews by the given angles (radians) along the x & y axes
    pub fn skew(&mut self, skew_x: f32, skew_y: f32) {
        let (sin_x, cos_x) = skew_x.sin_cos();
        let (sin_y, cos_y) = skew_y.sin_cos();
        self.prepend_matrix(&Self::new(cos_y, sin_y, -sin_x, cos_x, 0.0, 0.0));
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.tx += dx;
        self.ty += dy;
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.c * self.b
    }

    /// Inverts in place
    ///
    /// Fails with [`Error::SingularMatrix`] when the determinant is zero or not finite; the matrix
    /// is left unchanged in that case.
    pub fn invert(&mut self) -> Result<&mut Self> {
        let determinant = self.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(Error::SingularMatrix { determinant });
        }
        let inv = 1.0 / determinant;
        let Self { a, b, c, d, tx, ty } = *self;
        *self = Self::new(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * ty - d * tx) * inv,
            (b * tx - a * ty) * inv,
        );
        Ok(self)
    }

    pub fn inverted(&self) -> Result<Self> {
        let mut m = *self;
        m.invert()?;
        Ok(m)
    }

    pub fn transform_coords(&self, x: f32, y: f32) -> Point {
        Point::new(
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    pub fn transform_point(&self, p: Point) -> Point {
        self.transform_coords(p.x, p.y)
    }

    /// Transforms a direction, ignoring translation
    pub fn delta_transform_point(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y, self.b * p.x + self.d * p.y)
    }

    pub fn scale_x(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    pub fn scale_y(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Rotation of the x-axis in radians
    pub fn rotation(&self) -> f32 {
        self.b.atan2(self.a)
    }

    pub fn approx_eq(&self, other: &Matrix2D, epsilon: f32) -> bool {
        (self.a - other.a).abs() <= epsilon
            && (self.b - other.b).abs() <= epsilon
            && (self.c - other.c).abs() <= epsilon
            && (self.d - other.d).abs() <= epsilon
            && (self.tx - other.tx).abs() <= epsilon
            && (self.ty - other.ty).abs() <= epsilon
    }

    /// Expands into a column-major 4×4 matrix for shader uniforms
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&[
            self.a, self.b, 0.0, 0.0, //
            self.c, self.d, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            self.tx, self.ty, 0.0, 1.0,
        ])
    }
}
