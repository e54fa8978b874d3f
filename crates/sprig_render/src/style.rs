use std::fmt;

use crate::{
    color::Color,
    error::Result,
    index::IndexData,
    math::{Matrix2D, Point},
    mesh::{MeshId, RedrawFlag},
    texture::{Texture, TextureSmoothing},
    vertex::VertexData,
};

/// Identifies the concrete kind of a style; only styles of the same kind can share a draw call
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StyleKind(pub &'static str);

impl StyleKind {
    pub const STANDARD: StyleKind = StyleKind("standard");
}

/// Whether a style currently renders a mesh, and which one
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Attachment {
    #[default]
    Unattached,
    Attached(MeshId),
}

/// Per-frame tick delivered to styles attached to a mesh
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnterFrameEvent {
    /// Seconds since the previous frame
    pub passed_time: f32,
}

pub type EnterFrameListener = Box<dyn FnMut(&EnterFrameEvent, &mut StyleView<'_>)>;

/// Render state of a mesh: texture, sampling & the kind of shading
///
/// A style renders at most one mesh at a time. Meshes own their style, so handing a style to a
/// new mesh ([`Mesh::set_style`](crate::mesh::Mesh::set_style)) moves it there and the previous
/// owner gets a fresh one back.
pub struct MeshStyle {
    kind: StyleKind,
    texture: Option<Texture>,
    smoothing: TextureSmoothing,
    repeat: bool,
    attachment: Attachment,
    enter_frame: Vec<EnterFrameListener>,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self::with_kind(StyleKind::STANDARD)
    }
}

impl fmt::Debug for MeshStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshStyle")
            .field("kind", &self.kind)
            .field("texture", &self.texture.as_ref().map(Texture::id))
            .field("smoothing", &self.smoothing)
            .field("repeat", &self.repeat)
            .field("attachment", &self.attachment)
            .field("enter_frame_listeners", &self.enter_frame.len())
            .finish()
    }
}

impl MeshStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(kind: StyleKind) -> Self {
        Self {
            kind,
            texture: None,
            smoothing: TextureSmoothing::default(),
            repeat: false,
            attachment: Attachment::Unattached,
            enter_frame: Vec::new(),
        }
    }

    pub fn textured(texture: Texture) -> Self {
        let mut style = Self::new();
        style.texture = Some(texture);
        style
    }

    /// Same render state, but unattached & without listeners; what a batch renders with
    pub fn copy_for_batch(&self) -> Self {
        Self {
            kind: self.kind,
            texture: self.texture.clone(),
            smoothing: self.smoothing,
            repeat: self.repeat,
            attachment: Attachment::Unattached,
            enter_frame: Vec::new(),
        }
    }

    pub fn kind(&self) -> StyleKind {
        self.kind
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Prefer [`Mesh::set_texture`](crate::mesh::Mesh::set_texture) for attached styles, which also
    /// keeps the mesh's color representation in line with the texture
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }

    pub fn smoothing(&self) -> TextureSmoothing {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: TextureSmoothing) {
        self.smoothing = smoothing;
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// True if meshes rendered with `self` & `other` can share one draw call
    pub fn can_batch_with(&self, other: &MeshStyle) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (&self.texture, &other.texture) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.same_base(b) && self.smoothing == other.smoothing && self.repeat == other.repeat
            }
            _ => false,
        }
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn target(&self) -> Option<MeshId> {
        match self.attachment {
            Attachment::Attached(id) => Some(id),
            Attachment::Unattached => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.target().is_some()
    }

    /// Moves the style to `target`; returns false if it already rendered that target
    ///
    /// Detaching ends the previous target's enter-frame dispatch; attaching resumes it for the new
    /// target if there are listeners.
    pub fn set_target(&mut self, target: Option<MeshId>) -> bool {
        if self.target() == target {
            return false;
        }
        if let Attachment::Attached(previous) = self.attachment {
            log::trace!("{:?} style detached from {previous:?}", self.kind);
        }
        self.attachment = match target {
            Some(id) => Attachment::Attached(id),
            None => Attachment::Unattached,
        };
        true
    }

    pub fn add_enter_frame_listener(
        &mut self,
        listener: impl FnMut(&EnterFrameEvent, &mut StyleView<'_>) + 'static,
    ) {
        self.enter_frame.push(Box::new(listener));
    }

    pub fn has_enter_frame_listeners(&self) -> bool {
        !self.enter_frame.is_empty()
    }

    pub fn remove_enter_frame_listeners(&mut self) {
        self.enter_frame.clear();
    }

    /// True when enter-frame events should reach this style
    pub fn is_subscribed(&self) -> bool {
        self.is_attached() && self.has_enter_frame_listeners()
    }

    /// Appends (part of) `source`, the vertices of the mesh this style renders, to a batch
    ///
    /// Positions are transformed by `matrix`; premultiplication is converted to the target's.
    pub fn batch_vertex_data(
        &self,
        source: &VertexData,
        target: &mut VertexData,
        target_vertex_id: usize,
        matrix: Option<&Matrix2D>,
        vertex_id: usize,
        count: Option<usize>,
    ) -> Result<()> {
        source.copy_to(target, vertex_id, target_vertex_id, matrix, count)
    }

    /// Appends (part of) `source`, the indices of the mesh this style renders, to a batch,
    /// shifted by `offset` vertices
    pub fn batch_index_data(
        &self,
        source: &IndexData,
        target: &mut IndexData,
        target_index_id: usize,
        offset: u32,
        index_id: usize,
        count: Option<usize>,
    ) -> Result<()> {
        source.copy_to(target, target_index_id, offset, index_id, count)
    }

    pub(crate) fn take_enter_frame_listeners(&mut self) -> Vec<EnterFrameListener> {
        std::mem::take(&mut self.enter_frame)
    }

    pub(crate) fn restore_enter_frame_listeners(&mut self, listeners: Vec<EnterFrameListener>) {
        self.enter_frame = listeners;
    }
}

/// Mutable access to the geometry of the mesh a style is attached to
///
/// Borrowed from [`Mesh::style_view`](crate::mesh::Mesh::style_view); it cannot outlive the mesh
/// or the borrow. Every setter raises the mesh's redraw flag.
pub struct StyleView<'a> {
    pub(crate) style: &'a MeshStyle,
    pub(crate) vertex_data: &'a mut VertexData,
    pub(crate) index_data: &'a mut IndexData,
    pub(crate) redraw: &'a RedrawFlag,
}

impl StyleView<'_> {
    pub fn style(&self) -> &MeshStyle {
        self.style
    }

    pub fn vertex_data(&self) -> &VertexData {
        self.vertex_data
    }

    pub fn index_data(&self) -> &IndexData {
        self.index_data
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_data.num_vertices()
    }

    pub fn set_vertex_position(&mut self, index: usize, x: f32, y: f32) {
        self.vertex_data.set_point(index, x, y);
        self.redraw.set();
    }

    pub fn vertex_position(&self, index: usize) -> Result<Point> {
        self.vertex_data.point(index)
    }

    pub fn set_vertex_color(&mut self, index: usize, color: impl Into<Color>) {
        self.vertex_data.set_color(index, color);
        self.redraw.set();
    }

    pub fn vertex_color(&self, index: usize) -> Result<Color> {
        self.vertex_data.color(index)
    }

    pub fn set_vertex_alpha(&mut self, index: usize, alpha: f32) {
        self.vertex_data.set_alpha(index, alpha);
        self.redraw.set();
    }

    pub fn vertex_alpha(&self, index: usize) -> Result<f32> {
        self.vertex_data.alpha(index)
    }

    /// Sets texture coordinates local to the style's texture; sub-textures map them into their
    /// base
    pub fn set_tex_coords(&mut self, index: usize, u: f32, v: f32) {
        let p = match &self.style.texture {
            Some(texture) => texture.map_tex_coords(u, v),
            None => Point::new(u, v),
        };
        self.vertex_data.set_tex_coords(index, p.x, p.y);
        self.redraw.set();
    }

    /// Texture coordinates as stored, i.e. in base texture space
    pub fn tex_coords(&self, index: usize) -> Result<Point> {
        self.vertex_data.tex_coords(index)
    }

    /// Appends (part of) this mesh's vertices to a batch, transforming positions by `matrix`
    pub fn batch_vertex_data(
        &self,
        target: &mut VertexData,
        target_vertex_id: usize,
        matrix: Option<&Matrix2D>,
        vertex_id: usize,
        count: Option<usize>,
    ) -> Result<()> {
        self.style.batch_vertex_data(
            self.vertex_data(),
            target,
            target_vertex_id,
            matrix,
            vertex_id,
            count,
        )
    }

    /// Appends (part of) this mesh's indices to a batch, shifted by `offset` vertices
    pub fn batch_index_data(
        &self,
        target: &mut IndexData,
        target_index_id: usize,
        offset: u32,
        index_id: usize,
        count: Option<usize>,
    ) -> Result<()> {
        self.style.batch_index_data(
            self.index_data(),
            target,
            target_index_id,
            offset,
            index_id,
            count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    #[test]
    fn untextured_styles_batch() {
        assert!(MeshStyle::new().can_batch_with(&MeshStyle::new()));
    }

    #[test]
    fn textured_and_untextured_do_not_batch() {
        let textured = MeshStyle::textured(Texture::new(4, 4, true));
        assert!(!textured.can_batch_with(&MeshStyle::new()));
        assert!(!MeshStyle::new().can_batch_with(&textured));
    }

    #[test]
    fn same_texture_state_batches() {
        let atlas = Texture::new(64, 64, true);
        let a = MeshStyle::textured(atlas.clone());
        let b = MeshStyle::textured(atlas.sub_texture(crate::math::Rect::new(0.0, 0.0, 8.0, 8.0)));
        assert!(a.can_batch_with(&b));

        let mut c = MeshStyle::textured(atlas.clone());
        c.set_smoothing(TextureSmoothing::None);
        assert!(!a.can_batch_with(&c));

        let mut d = MeshStyle::textured(atlas);
        d.set_repeat(true);
        assert!(!a.can_batch_with(&d));

        let other = MeshStyle::textured(Texture::new(64, 64, true));
        assert!(!a.can_batch_with(&other));
    }

    #[test]
    fn different_kinds_never_batch() {
        let custom = MeshStyle::with_kind(StyleKind("distance-field"));
        assert!(!custom.can_batch_with(&MeshStyle::new()));
        assert!(custom.can_batch_with(&MeshStyle::with_kind(StyleKind("distance-field"))));
    }

    #[test]
    fn target_transitions() {
        let a = Mesh::quad(1.0, 1.0, Color::WHITE);
        let b = Mesh::quad(1.0, 1.0, Color::WHITE);
        let mut style = MeshStyle::new();
        assert_eq!(style.attachment(), Attachment::Unattached);

        assert!(style.set_target(Some(a.id())));
        assert!(!style.set_target(Some(a.id())));
        assert_eq!(style.target(), Some(a.id()));

        assert!(style.set_target(Some(b.id())));
        assert_eq!(style.attachment(), Attachment::Attached(b.id()));

        assert!(style.set_target(None));
        assert!(!style.is_attached());
    }

    #[test]
    fn view_batches_into_shared_buffers() {
        let mut mesh = Mesh::quad(10.0, 0.0, Color::WHITE);
        let view = mesh.style_view();
        let mut vertices = VertexData::new();
        let mut indices = IndexData::new();
        indices.add_quad(0, 1, 2, 3);

        let quarter_turn = Matrix2D::from_rotation(std::f32::consts::FRAC_PI_2);
        view.batch_vertex_data(&mut vertices, 4, Some(&quarter_turn), 0, None)
            .unwrap();
        view.batch_index_data(&mut indices, 6, 4, 0, None).unwrap();

        assert_eq!(vertices.num_vertices(), 8);
        assert!(vertices.point(5).unwrap().approx_eq(Point::new(0.0, 10.0), 1e-4));
        assert_eq!(indices.num_quads(), Some(2));
        assert_eq!(indices.index(10).unwrap(), 7);
    }

    #[test]
    fn view_setters_raise_redraw() {
        let mut mesh = Mesh::quad(1.0, 1.0, Color::WHITE);
        mesh.redraw_flag().take();
        {
            let mut view = mesh.style_view();
            view.set_tex_coords(0, 0.5, 0.5);
        }
        assert!(mesh.redraw_flag().take());
        assert_eq!(mesh.tex_coords(0).unwrap(), Point::new(0.5, 0.5));
    }

    #[test]
    fn subscription_needs_target_and_listeners() {
        let mesh = Mesh::quad(1.0, 1.0, Color::WHITE);
        let mut style = MeshStyle::new();
        style.add_enter_frame_listener(|_, _| {});
        assert!(!style.is_subscribed());

        style.set_target(Some(mesh.id()));
        assert!(style.is_subscribed());

        let copy = style.copy_for_batch();
        assert!(!copy.is_attached());
        assert!(!copy.has_enter_frame_listeners());
    }
}
