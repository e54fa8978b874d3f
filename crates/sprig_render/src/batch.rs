use crate::{
    blend::BlendMode,
    error::{Error, Result},
    index::IndexData,
    math::Matrix2D,
    mesh::Mesh,
    style::MeshStyle,
    vertex::VertexData,
};

/// Meshes merged into one vertex & index buffer, drawn with a single call
///
/// The first mesh added decides the batch's render state; later meshes are only accepted while
/// [`can_add_mesh`](Self::can_add_mesh) holds.
#[derive(Debug)]
pub struct MeshBatch {
    vertex_data: VertexData,
    index_data: IndexData,
    style: Option<MeshStyle>,
    blend_mode: BlendMode,
    max_vertices: usize,
    num_meshes: usize,
}

impl Default for MeshBatch {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_VERTICES)
    }
}

impl MeshBatch {
    /// Keeps every batch addressable with 16-bit indices
    pub const DEFAULT_MAX_VERTICES: usize = u16::MAX as usize;

    pub fn new(max_vertices: usize) -> Self {
        Self {
            vertex_data: VertexData::new(),
            index_data: IndexData::new(),
            style: None,
            blend_mode: BlendMode::default(),
            max_vertices,
            num_meshes: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_meshes == 0
    }

    /// True if adding `mesh` would go past the vertex capacity
    pub fn would_overflow(&self, mesh: &Mesh) -> bool {
        self.vertex_data.num_vertices() + mesh.num_vertices() > self.max_vertices
    }

    /// True if `mesh`, drawn with `blend_mode`, can join this batch
    ///
    /// An empty batch takes any mesh.
    pub fn can_add_mesh(&self, mesh: &Mesh, blend_mode: BlendMode) -> bool {
        let Some(style) = &self.style else {
            return true;
        };
        self.blend_mode == blend_mode
            && style.can_batch_with(mesh.style())
            && !self.would_overflow(mesh)
    }

    /// Appends `mesh`, moving its vertices by `matrix` & scaling their alpha by `alpha`
    pub fn add_mesh(&mut self, mesh: &Mesh, matrix: Option<&Matrix2D>, alpha: f32) -> Result<()> {
        let vertex_id = self.vertex_data.num_vertices();
        let index_id = self.index_data.num_indices();
        self.adopt_style(mesh);
        self.copy_mesh(mesh, index_id, vertex_id, matrix)?;
        if alpha != 1.0 {
            self.vertex_data
                .scale_alphas(alpha, vertex_id, Some(mesh.num_vertices()))?;
        }
        self.num_meshes += 1;
        Ok(())
    }

    /// Writes `mesh` untransformed at fixed positions, overwriting what is there
    ///
    /// Used to update one mesh inside a batch that is kept across frames.
    pub fn add_mesh_at(&mut self, mesh: &Mesh, index_id: usize, vertex_id: usize) -> Result<()> {
        self.adopt_style(mesh);
        self.copy_mesh(mesh, index_id, vertex_id, None)?;
        self.num_meshes += 1;
        Ok(())
    }

    /// Copies through the mesh's style, which decides how its geometry lands in a batch
    fn copy_mesh(
        &mut self,
        mesh: &Mesh,
        index_id: usize,
        vertex_id: usize,
        matrix: Option<&Matrix2D>,
    ) -> Result<()> {
        let offset = u32::try_from(vertex_id)
            .map_err(|_| Error::out_of_bounds("vertex", vertex_id, self.vertex_data.num_vertices()))?;
        let style = mesh.style();
        style.batch_vertex_data(
            mesh.vertex_data(),
            &mut self.vertex_data,
            vertex_id,
            matrix,
            0,
            None,
        )?;
        style.batch_index_data(mesh.index_data(), &mut self.index_data, index_id, offset, 0, None)
    }

    fn adopt_style(&mut self, mesh: &Mesh) {
        if self.style.is_none() {
            self.style = Some(mesh.style().copy_for_batch());
            self.vertex_data
                .set_premultiplied_alpha(mesh.vertex_data().premultiplied_alpha(), false);
        }
    }

    /// Empties the batch for reuse, keeping allocations
    pub fn clear(&mut self) {
        self.vertex_data.clear();
        self.index_data.clear();
        self.style = None;
        self.blend_mode = BlendMode::default();
        self.num_meshes = 0;
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    /// Render state shared by every mesh in the batch, `None` while empty
    pub fn style(&self) -> Option<&MeshStyle> {
        self.style.as_ref()
    }

    pub fn vertex_data(&self) -> &VertexData {
        &self.vertex_data
    }

    pub fn index_data(&self) -> &IndexData {
        &self.index_data
    }

    pub fn num_meshes(&self) -> usize {
        self.num_meshes
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_data.num_vertices()
    }

    pub fn num_indices(&self) -> usize {
        self.index_data.num_indices()
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }
}
