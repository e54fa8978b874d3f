//! 2D geometry kernel: points, affine matrices, rectangles & fast trig

mod matrix;
mod point;
mod rect;
pub mod trig;

pub use glam::{Mat4, Vec2, vec2};
pub use matrix::Matrix2D;
pub use point::{EPSILON, Point};
pub use rect::{Rect, is_point_in_triangle};
