use thiserror::Error;

use crate::texture::TextureId;

/// Errors surfaced by the geometry kernel, buffers, pool & painter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Inverting a matrix whose determinant is zero (or not finite)
    #[error("matrix is not invertible (determinant {determinant})")]
    SingularMatrix { determinant: f32 },

    /// Reading past the end of a vertex or index buffer
    #[error("{buffer} index {index} is out of bounds (len {len})")]
    OutOfBounds {
        buffer: &'static str,
        index: usize,
        len: usize,
    },

    /// Adding a vertex offset would push an index past `u32::MAX`
    #[error("index {index} plus offset {offset} overflows u32")]
    IndexOverflow { index: u32, offset: u32 },

    /// An object pool was built without a factory
    #[error("object pool requires a factory")]
    MissingFactory,

    /// `pop_state` was called with no pushed render state
    #[error("render state stack underflow")]
    StateStackUnderflow,

    /// A draw command references a texture that was never uploaded
    #[error("texture {id:?} has not been uploaded to the GPU")]
    TextureNotUploaded { id: TextureId },

    /// Pixel data does not match the texture dimensions
    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn out_of_bounds(buffer: &'static str, index: usize, len: usize) -> Self {
        Self::OutOfBounds { buffer, index, len }
    }
}
