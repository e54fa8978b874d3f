use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::{
    color::Color,
    error::{Error, Result},
    math::{Matrix2D, Point, Rect},
};

/// Premultiplied vertices never store an alpha below this, otherwise the color would be lost
const MIN_PREMULTIPLIED_ALPHA: f32 = 0.001;

/// A single vertex as laid out in GPU vertex buffers
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
}

impl Default for Vertex {
    /// Origin, opaque white, UV `(0, 0)`
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            color: [1.0, 1.0, 1.0, 1.0],
            tex_coords: [0.0, 0.0],
        }
    }
}

impl Vertex {
    /// Returns the vertex buffer layout
    ///
    /// This must match the vertex shader input layout:
    /// - location 0: `vec2<f32>` (position)
    /// - location 1: `vec4<f32>` (color)
    /// - location 2: `vec2<f32>` (texture coordinates)
    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x2,
                },
                VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: VertexFormat::Float32x4,
                },
                VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }

    fn premultiply(&mut self) {
        let alpha = self.color[3].max(MIN_PREMULTIPLIED_ALPHA);
        self.color = [
            self.color[0] * alpha,
            self.color[1] * alpha,
            self.color[2] * alpha,
            alpha,
        ];
    }

    fn unpremultiply(&mut self) {
        let alpha = self.color[3];
        if alpha > 0.0 {
            for c in &mut self.color[..3] {
                *c /= alpha;
            }
        }
    }
}

/// A growable list of vertices (position, color, alpha & texture coordinates)
///
/// Writes past the end grow the buffer, filling the gap with [`Vertex::default`]. Reads past the
/// end return [`Error::OutOfBounds`].
///
/// When `premultiplied_alpha` is set, colors are stored multiplied by their alpha (the form
/// premultiplied textures are blended in). The accessors always speak straight RGB.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexData {
    vertices: Vec<Vertex>,
    premultiplied_alpha: bool,
}

impl VertexData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            premultiplied_alpha: false,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Grows (with default vertices) or truncates to exactly `n` vertices
    pub fn set_num_vertices(&mut self, n: usize) {
        // opaque white reads the same whether or not colors are premultiplied
        self.vertices.resize(n, Vertex::default());
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Releases spare capacity
    pub fn trim(&mut self) {
        self.vertices.shrink_to_fit();
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw bytes, ready for a vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    /// Switches the color representation
    ///
    /// With `update_data`, stored colors are converted so they keep their appearance; without it
    /// only the flag changes (use when the data was written in the new form already).
    pub fn set_premultiplied_alpha(&mut self, value: bool, update_data: bool) {
        if value == self.premultiplied_alpha {
            return;
        }
        if update_data {
            for v in &mut self.vertices {
                if value {
                    v.premultiply();
                } else {
                    v.unpremultiply();
                }
            }
        }
        self.premultiplied_alpha = value;
    }

    pub fn set_point(&mut self, index: usize, x: f32, y: f32) {
        self.vertex_mut(index).position = [x, y];
    }

    pub fn point(&self, index: usize) -> Result<Point> {
        let [x, y] = self.vertex(index)?.position;
        Ok(Point::new(x, y))
    }

    /// Sets the RGB color, keeping the vertex's alpha
    pub fn set_color(&mut self, index: usize, color: impl Into<Color>) {
        let premultiplied = self.premultiplied_alpha;
        let v = self.vertex_mut(index);
        let alpha = v.color[3];
        let factor = if premultiplied { alpha } else { 1.0 };
        let [r, g, b] = color.into().components();
        v.color = [r * factor, g * factor, b * factor, alpha];
    }

    pub fn color(&self, index: usize) -> Result<Color> {
        let mut v = *self.vertex(index)?;
        if self.premultiplied_alpha {
            v.unpremultiply();
        }
        Ok(Color::from_components([v.color[0], v.color[1], v.color[2]]))
    }

    pub fn set_alpha(&mut self, index: usize, alpha: f32) {
        let premultiplied = self.premultiplied_alpha;
        let v = self.vertex_mut(index);
        if premultiplied {
            let alpha = alpha.max(MIN_PREMULTIPLIED_ALPHA);
            let factor = alpha / v.color[3].max(MIN_PREMULTIPLIED_ALPHA);
            v.color = [
                v.color[0] * factor,
                v.color[1] * factor,
                v.color[2] * factor,
                alpha,
            ];
        } else {
            v.color[3] = alpha;
        }
    }

    pub fn alpha(&self, index: usize) -> Result<f32> {
        Ok(self.vertex(index)?.color[3])
    }

    pub fn set_tex_coords(&mut self, index: usize, u: f32, v: f32) {
        self.vertex_mut(index).tex_coords = [u, v];
    }

    pub fn tex_coords(&self, index: usize) -> Result<Point> {
        let [u, v] = self.vertex(index)?.tex_coords;
        Ok(Point::new(u, v))
    }

    pub fn set_uniform_color(&mut self, color: impl Into<Color>) {
        let color = color.into();
        for i in 0..self.vertices.len() {
            self.set_color(i, color);
        }
    }

    pub fn set_uniform_alpha(&mut self, alpha: f32) {
        for i in 0..self.vertices.len() {
            self.set_alpha(i, alpha);
        }
    }

    /// Multiplies the alpha of `count` vertices (all remaining if `None`) from `start` by `factor`
    pub fn scale_alphas(&mut self, factor: f32, start: usize, count: Option<usize>) -> Result<()> {
        let range = self.range(start, count)?;
        if factor == 1.0 {
            return Ok(());
        }
        for i in range {
            let alpha = self.vertices[i].color[3];
            self.set_alpha(i, alpha * factor);
        }
        Ok(())
    }

    /// Copies `count` vertices (all remaining if `None`) starting at `source_start` into `target`
    /// at `target_start`, growing `target` as needed
    ///
    /// With a matrix, positions are transformed on the way. Colors are copied as they are unless
    /// the two buffers disagree on premultiplied alpha, in which case they are converted.
    pub fn copy_to(
        &self,
        target: &mut VertexData,
        source_start: usize,
        target_start: usize,
        matrix: Option<&Matrix2D>,
        count: Option<usize>,
    ) -> Result<()> {
        let range = self.range(source_start, count)?;
        let end = target_start
            .checked_add(range.len())
            .ok_or_else(|| Error::out_of_bounds("vertex", target_start, target.vertices.len()))?;
        if target.vertices.len() < end {
            target.set_num_vertices(end);
        }

        let convert = self.premultiplied_alpha != target.premultiplied_alpha;
        for (src, dst) in self.vertices[range]
            .iter()
            .zip(&mut target.vertices[target_start..end])
        {
            *dst = *src;
            if let Some(m) = matrix {
                let p = m.transform_coords(src.position[0], src.position[1]);
                dst.position = [p.x, p.y];
            }
            if convert {
                if target.premultiplied_alpha {
                    dst.premultiply();
                } else {
                    dst.unpremultiply();
                }
            }
        }
        Ok(())
    }

    /// Transforms the positions of `count` vertices (all remaining if `None`) from `start`
    pub fn transform_points(
        &mut self,
        matrix: &Matrix2D,
        start: usize,
        count: Option<usize>,
    ) -> Result<()> {
        let range = self.range(start, count)?;
        for v in &mut self.vertices[range] {
            let p = matrix.transform_coords(v.position[0], v.position[1]);
            v.position = [p.x, p.y];
        }
        Ok(())
    }

    /// Axis-aligned bounds of a vertex range, optionally after transforming it
    pub fn bounds(
        &self,
        matrix: Option<&Matrix2D>,
        start: usize,
        count: Option<usize>,
    ) -> Result<Rect> {
        let range = self.range(start, count)?;
        Ok(Rect::from_points(self.vertices[range].iter().map(|v| {
            let [x, y] = v.position;
            match matrix {
                Some(m) => m.transform_coords(x, y),
                None => Point::new(x, y),
            }
        })))
    }

    fn vertex(&self, index: usize) -> Result<&Vertex> {
        self.vertices
            .get(index)
            .ok_or_else(|| Error::out_of_bounds("vertex", index, self.vertices.len()))
    }

    fn vertex_mut(&mut self, index: usize) -> &mut Vertex {
        if index >= self.vertices.len() {
            self.set_num_vertices(index + 1);
        }
        &mut self.vertices[index]
    }

    fn range(&self, start: usize, count: Option<usize>) -> Result<Range<usize>> {
        let len = self.vertices.len();
        if start > len {
            return Err(Error::out_of_bounds("vertex", start, len));
        }
        let end = match count {
            Some(count) => start
                .checked_add(count)
                .filter(|&end| end <= len)
                .ok_or_else(|| Error::out_of_bounds("vertex", start.saturating_add(count) - 1, len))?,
            None => len,
        };
        Ok(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn quad(width: f32, height: f32) -> VertexData {
        let mut data = VertexData::new();
        data.set_point(0, 0.0, 0.0);
        data.set_point(1, width, 0.0);
        data.set_point(2, 0.0, height);
        data.set_point(3, width, height);
        data
    }

    #[test]
    fn vertex_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::desc().array_stride, 32);
    }

    #[test]
    fn writes_grow_with_defaults() {
        let mut data = VertexData::new();
        data.set_point(3, 5.0, 6.0);

        assert_eq!(data.num_vertices(), 4);
        assert_eq!(data.point(0).unwrap(), Point::ZERO);
        assert_eq!(data.color(1).unwrap(), Color::WHITE);
        assert_eq!(data.alpha(2).unwrap(), 1.0);
        assert_eq!(data.point(3).unwrap(), Point::new(5.0, 6.0));
    }

    #[test]
    fn reads_out_of_range_fail() {
        let data = quad(10.0, 10.0);
        assert_eq!(
            data.point(4),
            Err(Error::OutOfBounds {
                buffer: "vertex",
                index: 4,
                len: 4
            })
        );
        assert!(data.color(9).is_err());
        assert!(data.tex_coords(4).is_err());
    }

    #[test]
    fn color_and_alpha_are_independent() {
        let mut data = quad(1.0, 1.0);
        data.set_color(0, Color::RED);
        data.set_alpha(0, 0.5);
        data.set_color(0, Color::GREEN);

        assert_eq!(data.color(0).unwrap(), Color::GREEN);
        assert_eq!(data.alpha(0).unwrap(), 0.5);
    }

    #[test]
    fn premultiplied_colors_stay_recoverable() {
        let mut data = quad(1.0, 1.0);
        data.set_premultiplied_alpha(true, true);
        data.set_color(1, Color(0x336699));
        data.set_alpha(1, 0.0);
        data.set_alpha(1, 1.0);

        assert_eq!(data.color(1).unwrap(), Color(0x336699));
        assert_eq!(data.alpha(1).unwrap(), 1.0);

        data.set_alpha(2, 0.5);
        assert_eq!(data.as_slice()[2].color, [0.5, 0.5, 0.5, 0.5]);
        data.set_premultiplied_alpha(false, true);
        assert_eq!(data.as_slice()[2].color, [1.0, 1.0, 1.0, 0.5]);
    }

    #[test]
    fn copy_with_rotation() {
        let mut source = VertexData::new();
        source.set_point(0, 10.0, 0.0);
        source.set_color(0, Color::BLUE);
        source.set_alpha(0, 0.25);

        let mut target = VertexData::new();
        let rotation = Matrix2D::from_rotation(FRAC_PI_2);
        source
            .copy_to(&mut target, 0, 2, Some(&rotation), None)
            .unwrap();

        assert_eq!(target.num_vertices(), 3);
        assert!(target.point(2).unwrap().approx_eq(Point::new(0.0, 10.0), 1e-5));
        assert_eq!(target.color(2).unwrap(), Color::BLUE);
        assert_eq!(target.alpha(2).unwrap(), 0.25);
    }

    #[test]
    fn copy_range_is_checked() {
        let source = quad(1.0, 1.0);
        let mut target = VertexData::new();
        assert!(source.copy_to(&mut target, 2, 0, None, Some(3)).is_err());
        assert!(source.copy_to(&mut target, 5, 0, None, None).is_err());

        source.copy_to(&mut target, 2, 0, None, Some(2)).unwrap();
        assert_eq!(target.num_vertices(), 2);
        assert_eq!(target.point(1).unwrap(), Point::new(1.0, 1.0));
    }

    #[test]
    fn copy_converts_premultiplication() {
        let mut source = quad(1.0, 1.0);
        source.set_alpha(0, 0.5);
        let mut target = VertexData::new();
        target.set_premultiplied_alpha(true, false);

        source.copy_to(&mut target, 0, 0, None, Some(1)).unwrap();
        assert_eq!(target.as_slice()[0].color, [0.5, 0.5, 0.5, 0.5]);
        assert_eq!(target.color(0).unwrap(), Color::WHITE);
    }

    #[test]
    fn scale_alphas_in_range() {
        let mut data = quad(1.0, 1.0);
        data.scale_alphas(0.5, 1, Some(2)).unwrap();
        let alphas: Vec<f32> = (0..4).map(|i| data.alpha(i).unwrap()).collect();
        assert_eq!(alphas, [1.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn huge_counts_are_rejected() {
        let mut data = quad(1.0, 1.0);
        assert_eq!(
            data.scale_alphas(0.5, 1, Some(usize::MAX)),
            Err(Error::out_of_bounds("vertex", usize::MAX - 1, 4))
        );
        assert!(data.bounds(None, 2, Some(usize::MAX)).is_err());

        let mut target = VertexData::new();
        assert!(data.copy_to(&mut target, 0, usize::MAX, None, None).is_err());
        assert_eq!(target.num_vertices(), 0);
    }

    #[test]
    fn bounds_follow_matrix() {
        let data = quad(10.0, 20.0);
        assert_eq!(
            data.bounds(None, 0, None).unwrap(),
            Rect::new(0.0, 0.0, 10.0, 20.0)
        );

        let mut m = Matrix2D::from_scale(2.0, 1.0);
        m.translate(-5.0, 5.0);
        assert_eq!(
            data.bounds(Some(&m), 0, None).unwrap(),
            Rect::new(-5.0, 5.0, 20.0, 20.0)
        );
    }

    #[test]
    fn clone_is_independent() {
        let original = quad(1.0, 1.0);
        let mut copy = original.clone();
        copy.set_point(0, 9.0, 9.0);
        assert_eq!(original.point(0).unwrap(), Point::ZERO);
        assert_eq!(copy.as_bytes().len(), 4 * 32);
    }
}
