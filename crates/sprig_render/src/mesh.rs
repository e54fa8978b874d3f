use std::{
    cell::Cell,
    mem,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    color::Color,
    error::Result,
    index::IndexData,
    math::{Matrix2D, Point, Rect, is_point_in_triangle},
    style::{EnterFrameEvent, MeshStyle, StyleView},
    texture::{Texture, TextureSmoothing},
    vertex::VertexData,
};

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a mesh, what a style records as its target
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared "something changed, render again" flag
///
/// Clones observe the same flag. A frame loop hands its flag to meshes with
/// [`Mesh::share_redraw_flag`] and checks it in [`Painter::begin_frame`](crate::Painter::begin_frame).
#[derive(Clone, Debug, Default)]
pub struct RedrawFlag(Rc<Cell<bool>>);

impl RedrawFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.set(true);
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }

    /// Returns whether the flag was set & clears it
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub fn shares_with(&self, other: &RedrawFlag) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Triangles with a style: the unit the painter batches
///
/// The mesh owns its geometry; its style only reaches it through a [`StyleView`] borrowed for
/// the duration of a call.
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    vertex_data: VertexData,
    index_data: IndexData,
    style: MeshStyle,
    redraw: RedrawFlag,
}

impl Mesh {
    /// Wraps existing geometry; the style is attached to the new mesh
    pub fn new(mut vertex_data: VertexData, index_data: IndexData, mut style: MeshStyle) -> Self {
        let id = MeshId::next();
        style.set_target(Some(id));
        if let Some(texture) = style.texture() {
            vertex_data.set_premultiplied_alpha(texture.premultiplied_alpha(), true);
        }
        let redraw = RedrawFlag::new();
        redraw.set();
        Self {
            id,
            vertex_data,
            index_data,
            style,
            redraw,
        }
    }

    /// A solid colored rectangle with its top-left corner at the origin
    pub fn quad(width: f32, height: f32, color: impl Into<Color>) -> Self {
        let (vertex_data, index_data) = quad_geometry(width, height);
        let mut mesh = Self::new(vertex_data, index_data, MeshStyle::new());
        mesh.vertex_data.set_uniform_color(color);
        mesh
    }

    /// A rectangle the size of `texture`, showing all of it
    pub fn image(texture: Texture) -> Self {
        let (mut vertex_data, index_data) = quad_geometry(texture.width(), texture.height());
        for (i, (u, v)) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .into_iter()
            .enumerate()
        {
            let p = texture.map_tex_coords(u, v);
            vertex_data.set_tex_coords(i, p.x, p.y);
        }
        Self::new(vertex_data, index_data, MeshStyle::textured(texture))
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn style(&self) -> &MeshStyle {
        &self.style
    }

    /// Replaces the style & returns the previous one, detached
    pub fn set_style(&mut self, mut style: MeshStyle) -> MeshStyle {
        style.set_target(Some(self.id));
        if let Some(texture) = style.texture() {
            self.vertex_data
                .set_premultiplied_alpha(texture.premultiplied_alpha(), true);
        }
        let mut previous = mem::replace(&mut self.style, style);
        previous.set_target(None);
        self.redraw.set();
        previous
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.style.texture()
    }

    /// Changes the texture, converting vertex colors if its alpha representation differs
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        if let Some(texture) = &texture {
            self.vertex_data
                .set_premultiplied_alpha(texture.premultiplied_alpha(), true);
        }
        self.style.set_texture(texture);
        self.redraw.set();
    }

    pub fn smoothing(&self) -> TextureSmoothing {
        self.style.smoothing()
    }

    pub fn set_smoothing(&mut self, smoothing: TextureSmoothing) {
        if self.style.smoothing() != smoothing {
            self.style.set_smoothing(smoothing);
            self.redraw.set();
        }
    }

    pub fn repeat(&self) -> bool {
        self.style.repeat()
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        if self.style.repeat() != repeat {
            self.style.set_repeat(repeat);
            self.redraw.set();
        }
    }

    pub fn add_enter_frame_listener(
        &mut self,
        listener: impl FnMut(&EnterFrameEvent, &mut StyleView<'_>) + 'static,
    ) {
        self.style.add_enter_frame_listener(listener);
    }

    /// The style's view of this mesh's geometry
    pub fn style_view(&mut self) -> StyleView<'_> {
        StyleView {
            style: &self.style,
            vertex_data: &mut self.vertex_data,
            index_data: &mut self.index_data,
            redraw: &self.redraw,
        }
    }

    pub fn vertex_data(&self) -> &VertexData {
        &self.vertex_data
    }

    pub fn index_data(&self) -> &IndexData {
        &self.index_data
    }

    /// Direct access to both buffers; raises the redraw flag
    pub fn geometry_mut(&mut self) -> (&mut VertexData, &mut IndexData) {
        self.redraw.set();
        (&mut self.vertex_data, &mut self.index_data)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_data.num_vertices()
    }

    pub fn num_indices(&self) -> usize {
        self.index_data.num_indices()
    }

    pub fn set_vertex_position(&mut self, index: usize, x: f32, y: f32) {
        self.style_view().set_vertex_position(index, x, y);
    }

    pub fn vertex_position(&self, index: usize) -> Result<Point> {
        self.vertex_data.point(index)
    }

    pub fn set_vertex_color(&mut self, index: usize, color: impl Into<Color>) {
        self.style_view().set_vertex_color(index, color);
    }

    pub fn vertex_color(&self, index: usize) -> Result<Color> {
        self.vertex_data.color(index)
    }

    pub fn set_vertex_alpha(&mut self, index: usize, alpha: f32) {
        self.style_view().set_vertex_alpha(index, alpha);
    }

    pub fn vertex_alpha(&self, index: usize) -> Result<f32> {
        self.vertex_data.alpha(index)
    }

    pub fn set_tex_coords(&mut self, index: usize, u: f32, v: f32) {
        self.style_view().set_tex_coords(index, u, v);
    }

    pub fn tex_coords(&self, index: usize) -> Result<Point> {
        self.vertex_data.tex_coords(index)
    }

    /// Tints every vertex
    pub fn set_color(&mut self, color: impl Into<Color>) {
        self.vertex_data.set_uniform_color(color);
        self.redraw.set();
    }

    /// Bounds of all vertices, transformed by `matrix` if given
    pub fn bounds(&self, matrix: Option<&Matrix2D>) -> Rect {
        self.vertex_data
            .bounds(matrix, 0, None)
            .unwrap_or(Rect::ZERO)
    }

    /// True if `point` (in local coordinates) lies inside any of the mesh's triangles
    pub fn contains_point(&self, point: Point) -> bool {
        let indices = self.index_data.to_vec();
        indices.chunks_exact(3).any(|tri| {
            let corner = |i: u32| self.vertex_data.point(i as usize);
            match (corner(tri[0]), corner(tri[1]), corner(tri[2])) {
                (Ok(a), Ok(b), Ok(c)) => is_point_in_triangle(point, a, b, c),
                _ => false,
            }
        })
    }

    /// Delivers an enter-frame event to the style's listeners
    ///
    /// Nothing happens unless the style is attached & has listeners.
    pub fn advance_time(&mut self, passed_time: f32) {
        if !self.style.is_subscribed() {
            return;
        }
        let event = EnterFrameEvent { passed_time };
        let mut listeners = self.style.take_enter_frame_listeners();
        {
            let mut view = self.style_view();
            for listener in &mut listeners {
                listener(&event, &mut view);
            }
        }
        self.style.restore_enter_frame_listeners(listeners);
    }

    pub fn requires_redraw(&self) -> bool {
        self.redraw.is_set()
    }

    pub fn redraw_flag(&self) -> &RedrawFlag {
        &self.redraw
    }

    /// Routes this mesh's redraw requests to `flag`
    pub fn share_redraw_flag(&mut self, flag: &RedrawFlag) {
        if self.redraw.is_set() {
            flag.set();
        }
        self.redraw = flag.clone();
    }
}

/// Four vertices (top-left, top-right, bottom-left, bottom-right) & two quad-layout triangles
fn quad_geometry(width: f32, height: f32) -> (VertexData, IndexData) {
    let mut vertex_data = VertexData::with_capacity(4);
    for (i, corner) in Rect::new(0.0, 0.0, width, height)
        .corners()
        .into_iter()
        .enumerate()
    {
        vertex_data.set_point(i, corner.x, corner.y);
    }
    let mut index_data = IndexData::new();
    index_data.add_quad(0, 1, 2, 3);
    (vertex_data, index_data)
}
