//! `wgpu` backend: uploads a painter's finished batches & draws them
//!
//! The renderer owns no window or surface; callers bring a device, a queue & a render pass,
//! so it works the same for a swapchain frame or an offscreen target.

mod pipeline;
mod texture;

use std::{borrow::Cow, collections::HashMap};

use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, Buffer, BufferDescriptor, BufferUsages,
    Device, Queue, RenderPass, TextureFormat,
    util::{BufferInitDescriptor, DeviceExt},
};

use crate::{
    batch::MeshBatch,
    error::{Error, Result},
    index::IndexFormat,
    painter::Painter,
    texture::{Texture, TextureId, TextureSmoothing},
};

use self::{pipeline::Pipelines, texture::GpuTexture};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

type BindKey = (TextureId, TextureSmoothing, bool);

/// GPU buffers of one draw command, reused across frames & grown when too small
struct GpuBatch {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    index_format: wgpu::IndexFormat,
}

impl GpuBatch {
    const MIN_BYTES: u64 = 1024;

    fn new(device: &Device) -> Self {
        Self {
            vertex_buffer: create_buffer(device, "Mesh Vertex Buffer", BufferUsages::VERTEX, 0),
            index_buffer: create_buffer(device, "Mesh Index Buffer", BufferUsages::INDEX, 0),
            index_count: 0,
            index_format: wgpu::IndexFormat::Uint16,
        }
    }

    fn upload(&mut self, device: &Device, queue: &Queue, batch: &MeshBatch) {
        let vertices = batch.vertex_data().as_bytes();
        if vertices.len() as u64 > self.vertex_buffer.size() {
            log::debug!("growing vertex buffer to hold {} bytes", vertices.len());
            self.vertex_buffer =
                create_buffer(device, "Mesh Vertex Buffer", BufferUsages::VERTEX, vertices.len());
        }
        queue.write_buffer(&self.vertex_buffer, 0, &padded(vertices));

        let format = batch.index_data().required_format();
        let indices: Vec<u8> = match format {
            IndexFormat::U16 => bytemuck::cast_slice(&batch.index_data().to_u16_vec()).to_vec(),
            IndexFormat::U32 => bytemuck::cast_slice(&batch.index_data().to_vec()).to_vec(),
        };
        if indices.len() as u64 > self.index_buffer.size() {
            log::debug!("growing index buffer to hold {} bytes", indices.len());
            self.index_buffer =
                create_buffer(device, "Mesh Index Buffer", BufferUsages::INDEX, indices.len());
        }
        queue.write_buffer(&self.index_buffer, 0, &padded(&indices));

        self.index_count = batch.num_indices() as u32;
        self.index_format = format.into();
    }
}

/// Draws [`Painter`] output with `wgpu`
///
/// Per frame: [`prepare`](Self::prepare) outside the render pass, then [`draw`](Self::draw)
/// inside it.
pub struct GpuRenderer {
    pipelines: Pipelines,
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,
    textures: HashMap<TextureId, GpuTexture>,
    bind_groups: HashMap<BindKey, BindGroup>,
    default_bind_group: BindGroup,
    batches: Vec<GpuBatch>,
    prepared: usize,
}

impl GpuRenderer {
    /// Creates pipelines for `surface_format`, the camera uniform & a white fallback texture
    pub fn new(device: &Device, queue: &Queue, surface_format: TextureFormat) -> Self {
        let camera_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let pipelines = Pipelines::new(device, surface_format);
        let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: &pipelines.camera_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let default_bind_group = GpuTexture::white(device, queue).bind_group(
            device,
            &pipelines.texture_layout,
            TextureSmoothing::None,
            false,
        );

        Self {
            pipelines,
            camera_buffer,
            camera_bind_group,
            textures: HashMap::new(),
            bind_groups: HashMap::new(),
            default_bind_group,
            batches: Vec::new(),
            prepared: 0,
        }
    }

    /// Uploads (or replaces) the pixels of `texture`'s base, as tightly packed RGBA8
    pub fn upload_texture(
        &mut self,
        device: &Device,
        queue: &Queue,
        texture: &Texture,
        rgba: &[u8],
    ) -> Result<()> {
        let (width, height) = (texture.base_width(), texture.base_height());
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::TextureSize {
                expected,
                actual: rgba.len(),
            });
        }

        let id = texture.id();
        log::debug!("uploading {id:?} ({width}x{height})");
        self.textures
            .insert(id, GpuTexture::from_rgba(device, queue, rgba, width, height));
        self.bind_groups.retain(|(texture_id, ..), _| *texture_id != id);
        Ok(())
    }

    pub fn is_uploaded(&self, texture: &Texture) -> bool {
        self.textures.contains_key(&texture.id())
    }

    /// Uploads the projection & every draw command's geometry
    ///
    /// Fails if a batch samples a texture that was never uploaded; nothing will be drawn then.
    pub fn prepare(&mut self, device: &Device, queue: &Queue, painter: &Painter) -> Result<()> {
        self.prepared = 0;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: painter.projection().to_cols_array_2d(),
            }),
        );

        let commands = painter.draw_commands();
        for batch in commands {
            if let Some(key) = bind_key(batch) {
                self.ensure_bind_group(device, key)?;
            }
        }

        while self.batches.len() < commands.len() {
            self.batches.push(GpuBatch::new(device));
        }
        for (gpu_batch, batch) in self.batches.iter_mut().zip(commands) {
            gpu_batch.upload(device, queue, batch);
        }
        self.prepared = commands.len();
        Ok(())
    }

    /// Records the prepared draw commands into `pass`
    pub fn draw(&self, pass: &mut RenderPass<'_>, painter: &Painter) {
        pass.set_bind_group(1, &self.camera_bind_group, &[]);

        for (gpu_batch, batch) in self.batches[..self.prepared]
            .iter()
            .zip(painter.draw_commands())
        {
            let premultiplied = batch.vertex_data().premultiplied_alpha();
            let Some(pipeline) = self.pipelines.get(batch.blend_mode(), premultiplied) else {
                continue;
            };
            let bind_group = match bind_key(batch) {
                Some(key) => match self.bind_groups.get(&key) {
                    Some(bind_group) => bind_group,
                    None => continue,
                },
                None => &self.default_bind_group,
            };

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.set_vertex_buffer(0, gpu_batch.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu_batch.index_buffer.slice(..), gpu_batch.index_format);
            pass.draw_indexed(0..gpu_batch.index_count, 0, 0..1);
        }
    }

    fn ensure_bind_group(&mut self, device: &Device, key: BindKey) -> Result<()> {
        if self.bind_groups.contains_key(&key) {
            return Ok(());
        }
        let (id, smoothing, repeat) = key;
        let texture = self
            .textures
            .get(&id)
            .ok_or(Error::TextureNotUploaded { id })?;
        let bind_group =
            texture.bind_group(device, &self.pipelines.texture_layout, smoothing, repeat);
        self.bind_groups.insert(key, bind_group);
        Ok(())
    }
}

fn bind_key(batch: &MeshBatch) -> Option<BindKey> {
    let style = batch.style()?;
    let texture = style.texture()?;
    Some((texture.id(), style.smoothing(), style.repeat()))
}

fn create_buffer(device: &Device, label: &str, usage: BufferUsages, bytes: usize) -> Buffer {
    let size = (bytes as u64)
        .max(GpuBatch::MIN_BYTES)
        .next_power_of_two();
    device.create_buffer(&BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Pads to a multiple of `COPY_BUFFER_ALIGNMENT`, as `write_buffer` requires
fn padded(bytes: &[u8]) -> Cow<'_, [u8]> {
    let remainder = bytes.len() % wgpu::COPY_BUFFER_ALIGNMENT as usize;
    if remainder == 0 {
        return Cow::Borrowed(bytes);
    }
    let mut owned = bytes.to_vec();
    owned.resize(bytes.len() + wgpu::COPY_BUFFER_ALIGNMENT as usize - remainder, 0);
    Cow::Owned(owned)
}
