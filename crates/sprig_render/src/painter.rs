use std::mem;

use glam::Mat4;

use crate::{
    batch::MeshBatch,
    blend::BlendMode,
    color::Color,
    error::{Error, Result},
    math::{Matrix2D, Rect},
    mesh::{Mesh, RedrawFlag},
    pool::ObjectPool,
};

/// Painter settings
#[derive(Clone, Debug)]
pub struct PainterConfig {
    /// Vertex capacity of each batch; 65 535 keeps indices 16-bit
    pub max_vertices_per_batch: usize,
    /// How many spare batches are kept between frames
    pub batch_pool_capacity: usize,
    /// Skip frames in which nothing raised the redraw flag
    pub skip_unchanged_frames: bool,
    pub clear_color: Color,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            max_vertices_per_batch: MeshBatch::DEFAULT_MAX_VERTICES,
            batch_pool_capacity: 32,
            skip_unchanged_frames: false,
            clear_color: Color::BLACK,
        }
    }
}

/// Transform, alpha & blend mode applied to meshes as they are batched
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderState {
    pub model_view: Matrix2D,
    pub alpha: f32,
    pub blend_mode: BlendMode,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            model_view: Matrix2D::IDENTITY,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }
}

impl RenderState {
    /// Nests a child's local transform inside the current one
    pub fn transform_model_view(&mut self, local: &Matrix2D) {
        self.model_view.append_matrix(local);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Turns a stream of meshes into as few draw calls as possible
///
/// Meshes are folded into the current batch while their style & blend mode allow it; anything
/// else finishes the batch and starts the next one. Finished batches are the frame's draw
/// commands, handed to the GPU backend once [`finish_frame`](Self::finish_frame) is called.
pub struct Painter {
    config: PainterConfig,
    viewport: Rect,
    state: RenderState,
    state_stack: Vec<RenderState>,
    current: MeshBatch,
    finished: Vec<MeshBatch>,
    batch_pool: ObjectPool<MeshBatch>,
    frame_id: u64,
}

impl Default for Painter {
    fn default() -> Self {
        Self::new(PainterConfig::default())
    }
}

impl Painter {
    pub fn new(config: PainterConfig) -> Self {
        let max_vertices = config.max_vertices_per_batch;
        let batch_pool = ObjectPool::new(
            move || MeshBatch::new(max_vertices),
            config.batch_pool_capacity,
        );
        Self {
            current: batch_pool.get_object(),
            batch_pool,
            config,
            viewport: Rect::ZERO,
            state: RenderState::default(),
            state_stack: Vec::new(),
            finished: Vec::new(),
            frame_id: 0,
        }
    }

    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    /// Sets the area of the stage that maps onto the render target
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Orthographic projection of the viewport, y pointing down
    pub fn projection(&self) -> Mat4 {
        let Rect {
            x,
            y,
            width,
            height,
        } = self.viewport;
        Mat4::orthographic_lh(x, x + width, y + height, y, -1.0, 1.0)
    }

    /// Starts a frame unless it can be skipped
    ///
    /// With [`PainterConfig::skip_unchanged_frames`], returns false (keeping the previous frame's
    /// draw commands) when `redraw` was not raised since the last frame. Otherwise clears
    /// `redraw` and prepares a new frame.
    pub fn begin_frame(&mut self, redraw: &RedrawFlag) -> bool {
        let changed = redraw.take();
        if self.config.skip_unchanged_frames && !changed && self.frame_id > 0 {
            log::trace!("frame {} unchanged, skipping", self.frame_id);
            return false;
        }
        self.next_frame();
        true
    }

    /// Recycles the previous frame's batches & resets the render state
    pub fn next_frame(&mut self) {
        for mut batch in self.finished.drain(..) {
            batch.clear();
            self.batch_pool.put_object(batch);
        }
        self.current.clear();
        self.state.reset();
        self.state_stack.clear();
        self.frame_id += 1;
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    pub fn push_state(&mut self) {
        self.state_stack.push(self.state);
    }

    pub fn pop_state(&mut self) -> Result<()> {
        match self.state_stack.pop() {
            Some(state) => {
                self.state = state;
                Ok(())
            }
            None => {
                log::warn!("pop_state without a matching push_state");
                Err(Error::StateStackUnderflow)
            }
        }
    }

    /// Adds `mesh` with the current render state, finishing the batch first if it can't join
    pub fn batch_mesh(&mut self, mesh: &Mesh) -> Result<()> {
        let blend_mode = self.state.blend_mode;
        if !self.current.can_add_mesh(mesh, blend_mode) {
            if self.current.would_overflow(mesh) {
                log::debug!(
                    "batch full at {} vertices, splitting",
                    self.current.num_vertices()
                );
            }
            self.finish_mesh_batch();
        }
        if self.current.is_empty() {
            self.current.set_blend_mode(blend_mode);
        }

        let matrix = (!self.state.model_view.is_identity()).then_some(&self.state.model_view);
        self.current.add_mesh(mesh, matrix, self.state.alpha)
    }

    /// Closes the current batch, turning it into a draw command
    pub fn finish_mesh_batch(&mut self) {
        if self.current.is_empty() {
            return;
        }
        log::trace!(
            "batch finished: {} meshes, {} vertices, {} indices",
            self.current.num_meshes(),
            self.current.num_vertices(),
            self.current.num_indices()
        );
        let mut next = self.batch_pool.get_object();
        next.clear();
        self.finished.push(mem::replace(&mut self.current, next));
    }

    pub fn finish_frame(&mut self) {
        self.finish_mesh_batch();
    }

    /// Batches finished so far this frame, in drawing order
    pub fn draw_commands(&self) -> &[MeshBatch] {
        &self.finished
    }

    /// Number of draw calls the frame needs
    pub fn draw_count(&self) -> usize {
        self.finished.len()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn clear_color(&self) -> Color {
        self.config.clear_color
    }
}
