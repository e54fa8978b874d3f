use std::collections::HashMap;

use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    ColorTargetState, ColorWrites, Device, FragmentState, PipelineLayout,
    PipelineLayoutDescriptor, RenderPipeline, RenderPipelineDescriptor, SamplerBindingType,
    ShaderModule, ShaderStages, TextureFormat, TextureSampleType, TextureViewDimension,
    VertexState, include_wgsl,
};

use crate::{blend::BlendMode, vertex::Vertex};

/// Render pipelines for every blend mode, in straight & premultiplied alpha, plus the shared
/// bind group layouts
///
/// - group 0: texture & sampler (fragment)
/// - group 1: camera uniform (vertex)
pub(crate) struct Pipelines {
    pub texture_layout: BindGroupLayout,
    pub camera_layout: BindGroupLayout,
    by_blend: HashMap<(BlendMode, bool), RenderPipeline>,
}

impl Pipelines {
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        let texture_layout = create_texture_bind_group_layout(device);
        let camera_layout = create_camera_bind_group_layout(device);

        let shader = device.create_shader_module(include_wgsl!("../../shader.wgsl"));
        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&texture_layout, &camera_layout],
            push_constant_ranges: &[],
        });

        let mut by_blend = HashMap::new();
        for blend_mode in BlendMode::ALL {
            for premultiplied in [false, true] {
                let pipeline = create_mesh_pipeline(
                    device,
                    surface_format,
                    &layout,
                    &shader,
                    blend_mode,
                    premultiplied,
                );
                by_blend.insert((blend_mode, premultiplied), pipeline);
            }
        }

        Self {
            texture_layout,
            camera_layout,
            by_blend,
        }
    }

    pub fn get(&self, blend_mode: BlendMode, premultiplied_alpha: bool) -> Option<&RenderPipeline> {
        self.by_blend.get(&(blend_mode, premultiplied_alpha))
    }
}

/// Creates the bind group layout for texture sampling
///
/// Defines two bindings:
/// - Binding 0: 2D texture (fragment shader)
/// - Binding 1: Filtering sampler (fragment shader)
fn create_texture_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Texture Bind Group Layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Creates the bind group layout for camera uniforms
///
/// Defines a single binding:
/// - Binding 0: Uniform buffer containing the view-projection matrix (vertex shader)
fn create_camera_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Camera Bind Group Layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX,
            ty: BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Creates the mesh pipeline for one blend mode
///
/// Vertices use the [`Vertex`] layout; the color target blends per `blend_mode`, with factors
/// chosen for straight or premultiplied alpha.
fn create_mesh_pipeline(
    device: &Device,
    surface_format: TextureFormat,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    blend_mode: BlendMode,
    premultiplied_alpha: bool,
) -> RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("Mesh Pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        primitive: Default::default(),
        depth_stencil: None,
        multisample: Default::default(),
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format: surface_format,
                blend: Some(blend_mode.blend_state(premultiplied_alpha)),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
        cache: None,
    })
}
