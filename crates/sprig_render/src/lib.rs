pub mod batch;
pub mod blend;
pub mod color;
pub mod error;
pub mod gpu;
pub mod index;
pub mod math;
pub mod mesh;
pub mod painter;
pub mod pool;
pub mod style;
pub mod texture;
pub mod vertex;

pub use wgpu::{Device, Queue, RenderPass, TextureFormat};

pub use crate::{
    batch::MeshBatch,
    blend::BlendMode,
    color::Color,
    error::{Error, Result},
    gpu::GpuRenderer,
    index::{IndexData, IndexFormat},
    math::{Matrix2D, Point, Rect},
    mesh::{Mesh, MeshId, RedrawFlag},
    painter::{Painter, PainterConfig, RenderState},
    pool::{ObjectPool, Pooled},
    style::{Attachment, EnterFrameEvent, MeshStyle, StyleKind, StyleView},
    texture::{Texture, TextureId, TextureSmoothing},
    vertex::{Vertex, VertexData},
};
