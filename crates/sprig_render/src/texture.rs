use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::math::{Point, Rect};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a base texture, used to key GPU resources
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

/// How a texture is sampled when it is scaled
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureSmoothing {
    /// Nearest neighbor, for pixel art
    None,
    #[default]
    Bilinear,
    /// Bilinear plus linear blending between mip levels
    Trilinear,
}

#[derive(Debug)]
struct TextureBase {
    id: TextureId,
    width: u32,
    height: u32,
    premultiplied_alpha: bool,
}

/// A handle to GPU pixel data, or to a region of it
///
/// Cloning is cheap; clones and sub-textures share the same base. Two textures can share a draw
/// call exactly when they share a base (see [`same_base`](Self::same_base)).
#[derive(Clone, Debug)]
pub struct Texture {
    base: Arc<TextureBase>,
    /// Region of the base in pixels; `None` covers the whole base
    region: Option<Rect>,
}

impl Texture {
    /// Registers a new base texture of the given pixel size
    ///
    /// Pixel data is provided separately to the GPU backend, keyed by [`id`](Self::id).
    pub fn new(width: u32, height: u32, premultiplied_alpha: bool) -> Self {
        let id = TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            base: Arc::new(TextureBase {
                id,
                width,
                height,
                premultiplied_alpha,
            }),
            region: None,
        }
    }

    /// A texture showing `region` (in pixels, relative to this texture) of the same base
    pub fn sub_texture(&self, region: Rect) -> Self {
        let mut absolute = region;
        if let Some(own) = self.region {
            absolute.translate(own.x, own.y);
        }
        Self {
            base: Arc::clone(&self.base),
            region: Some(absolute),
        }
    }

    pub fn id(&self) -> TextureId {
        self.base.id
    }

    /// True if both handles point at the same GPU texture
    pub fn same_base(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.base, &other.base)
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.base.premultiplied_alpha
    }

    pub fn base_width(&self) -> u32 {
        self.base.width
    }

    pub fn base_height(&self) -> u32 {
        self.base.height
    }

    /// Width of the visible region in pixels
    pub fn width(&self) -> f32 {
        self.region.map_or(self.base.width as f32, |r| r.width)
    }

    /// Height of the visible region in pixels
    pub fn height(&self) -> f32 {
        self.region.map_or(self.base.height as f32, |r| r.height)
    }

    pub fn region(&self) -> Option<Rect> {
        self.region
    }

    /// Maps texture coordinates local to this texture (`0..1` across the region) into the
    /// coordinates of the base texture
    pub fn map_tex_coords(&self, u: f32, v: f32) -> Point {
        let Some(region) = self.region else {
            return Point::new(u, v);
        };
        let (w, h) = (self.base.width as f32, self.base.height as f32);
        Point::new(
            (region.x + u * region.width) / w,
            (region.y + v * region.height) / h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_textures_share_base() {
        let atlas = Texture::new(256, 128, true);
        let frame = atlas.sub_texture(Rect::new(64.0, 32.0, 32.0, 32.0));
        let other = Texture::new(256, 128, true);

        assert!(frame.same_base(&atlas));
        assert_eq!(frame.id(), atlas.id());
        assert!(!other.same_base(&atlas));
        assert_ne!(other.id(), atlas.id());
        assert_eq!((frame.width(), frame.height()), (32.0, 32.0));
    }

    #[test]
    fn tex_coords_map_into_region() {
        let atlas = Texture::new(200, 100, false);
        assert_eq!(atlas.map_tex_coords(0.5, 0.5), Point::new(0.5, 0.5));

        let frame = atlas.sub_texture(Rect::new(100.0, 50.0, 100.0, 50.0));
        assert_eq!(frame.map_tex_coords(0.0, 0.0), Point::new(0.5, 0.5));
        assert_eq!(frame.map_tex_coords(1.0, 1.0), Point::new(1.0, 1.0));

        let nested = frame.sub_texture(Rect::new(0.0, 0.0, 50.0, 25.0));
        assert_eq!(nested.map_tex_coords(1.0, 1.0), Point::new(0.75, 0.75));
    }
}
