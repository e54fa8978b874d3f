#[cfg(feature = "render")]
pub mod render {
    pub use sprig_render::{
        BlendMode, Color, GpuRenderer, Mesh, MeshBatch, MeshStyle, Painter, PainterConfig,
        RedrawFlag, RenderState, Texture, TextureSmoothing,
    };
}

#[cfg(feature = "render")]
pub mod math {
    pub use sprig_render::math::{Matrix2D, Point, Rect, Vec2, trig, vec2};
}

#[cfg(feature = "render")]
pub mod buffers {
    pub use sprig_render::{IndexData, IndexFormat, Vertex, VertexData};
}

#[cfg(feature = "render")]
pub use sprig_render::{Error, Result};

/// Routes `log` output to stderr, filtered by `RUST_LOG` (default `error`)
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "log")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
        .try_init();
}
