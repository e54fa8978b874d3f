use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindingResource, Device, Extent3d, FilterMode, Origin3d, Queue, Sampler, SamplerDescriptor,
    TexelCopyBufferLayout, TexelCopyTextureInfo, TextureAspect, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView,
};

use std::borrow::Cow;

use crate::texture::TextureSmoothing;

/// Pixel data of one base texture on the GPU
///
/// Samplers live with the bind groups, since meshes may sample the same pixels differently.
pub(crate) struct GpuTexture {
    view: TextureView,
}

impl GpuTexture {
    /// Uploads tightly packed 8-bit RGBA pixels along with a box-filtered mip chain
    pub fn from_rgba(device: &Device, queue: &Queue, data: &[u8], width: u32, height: u32) -> Self {
        let levels = mip_chain(data, width, height);
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("sprig texture"),
            size: extent(width, height),
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            queue.write_texture(
                TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: Origin3d::ZERO,
                    aspect: TextureAspect::All,
                },
                &level.pixels,
                TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                extent(level.width, level.height),
            );
        }

        Self {
            view: texture.create_view(&Default::default()),
        }
    }

    /// 1×1 opaque white, bound for untextured batches so one shader serves both
    pub fn white(device: &Device, queue: &Queue) -> Self {
        Self::from_rgba(device, queue, &[255u8, 255, 255, 255], 1, 1)
    }

    pub fn bind_group(
        &self,
        device: &Device,
        layout: &BindGroupLayout,
        smoothing: TextureSmoothing,
        repeat: bool,
    ) -> BindGroup {
        let sampler = create_sampler(device, smoothing, repeat);
        device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&self.view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&sampler),
                },
            ],
        })
    }
}

fn extent(width: u32, height: u32) -> Extent3d {
    Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

/// One level of a mip chain, RGBA8
#[derive(Debug, PartialEq)]
pub(crate) struct MipLevel<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: Cow<'a, [u8]>,
}

/// Full mip chain down to 1×1, level 0 borrowing `data`
pub(crate) fn mip_chain(data: &[u8], width: u32, height: u32) -> Vec<MipLevel<'_>> {
    let mut levels = vec![MipLevel {
        width,
        height,
        pixels: Cow::Borrowed(data),
    }];
    while let Some(last) = levels.last() {
        if (last.width <= 1 && last.height <= 1) || last.pixels.is_empty() {
            break;
        }
        let next = downsample(last);
        levels.push(next);
    }
    levels
}

/// Averages 2×2 blocks; on odd sizes the last row or column is reused
fn downsample(level: &MipLevel<'_>) -> MipLevel<'static> {
    let (width, height) = ((level.width / 2).max(1), (level.height / 2).max(1));
    let texel = |x: u32, y: u32, channel: usize| {
        let (x, y) = (x.min(level.width - 1), y.min(level.height - 1));
        level.pixels[(y * level.width + x) as usize * 4 + channel] as u32
    };

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            for channel in 0..4 {
                let sum = texel(2 * x, 2 * y, channel)
                    + texel(2 * x + 1, 2 * y, channel)
                    + texel(2 * x, 2 * y + 1, channel)
                    + texel(2 * x + 1, 2 * y + 1, channel);
                pixels.push(((sum + 2) / 4) as u8);
            }
        }
    }
    MipLevel {
        width,
        height,
        pixels: Cow::Owned(pixels),
    }
}

/// Magnification/minification filter & mipmap filter for a smoothing mode
///
/// Only trilinear blends between mip levels; the others snap to the nearest level.
pub(crate) fn filter_modes(smoothing: TextureSmoothing) -> (FilterMode, FilterMode) {
    match smoothing {
        TextureSmoothing::None => (FilterMode::Nearest, FilterMode::Nearest),
        TextureSmoothing::Bilinear => (FilterMode::Linear, FilterMode::Nearest),
        TextureSmoothing::Trilinear => (FilterMode::Linear, FilterMode::Linear),
    }
}

pub(crate) fn address_mode(repeat: bool) -> AddressMode {
    if repeat {
        AddressMode::Repeat
    } else {
        AddressMode::ClampToEdge
    }
}

fn create_sampler(device: &Device, smoothing: TextureSmoothing, repeat: bool) -> Sampler {
    let (filter, mipmap_filter) = filter_modes(smoothing);
    let address = address_mode(repeat);
    device.create_sampler(&SamplerDescriptor {
        label: None,
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_selects_filters() {
        assert_eq!(
            filter_modes(TextureSmoothing::None),
            (FilterMode::Nearest, FilterMode::Nearest)
        );
        assert_eq!(filter_modes(TextureSmoothing::default()).0, FilterMode::Linear);
        assert_eq!(filter_modes(TextureSmoothing::Trilinear).1, FilterMode::Linear);
        assert_ne!(
            filter_modes(TextureSmoothing::Bilinear),
            filter_modes(TextureSmoothing::Trilinear)
        );
    }

    #[test]
    fn mip_chain_reaches_one_texel() {
        let data: Vec<u8> = [[255, 0, 0, 255], [0, 0, 255, 255]]
            .into_iter()
            .cycle()
            .take(8 * 4)
            .flatten()
            .collect();
        let levels = mip_chain(&data, 8, 4);

        let sizes: Vec<_> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, [(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert!(matches!(levels[0].pixels, Cow::Borrowed(_)));
        for level in &levels {
            assert_eq!(level.pixels.len(), (level.width * level.height * 4) as usize);
        }
        // alternating red & blue columns average out to purple
        assert_eq!(&levels[1].pixels[..4], &[128, 0, 128, 255]);
        assert_eq!(&levels[3].pixels[..], &[128, 0, 128, 255]);
    }

    #[test]
    fn odd_sizes_reuse_the_edge() {
        let data = [0, 0, 0, 0, 100, 100, 100, 100, 200, 200, 200, 200];
        let levels = mip_chain(&data, 3, 1);
        assert_eq!(levels.len(), 2);
        assert_eq!((levels[1].width, levels[1].height), (1, 1));
        assert_eq!(&levels[1].pixels[..], &[50, 50, 50, 50]);

        assert_eq!(mip_chain(&[1, 2, 3, 4], 1, 1).len(), 1);
        assert_eq!(mip_chain(&[], 0, 4).len(), 1);
    }

    #[test]
    fn repeat_selects_address_mode() {
        assert_eq!(address_mode(true), AddressMode::Repeat);
        assert_eq!(address_mode(false), AddressMode::ClampToEdge);
    }
}
