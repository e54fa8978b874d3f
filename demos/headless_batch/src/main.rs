use std::error::Error;

use sprig::{
    math::{Matrix2D, Rect},
    render::{
        BlendMode, Color, GpuRenderer, Mesh, Painter, PainterConfig, RedrawFlag, Texture,
        TextureSmoothing,
    },
};
use wgpu::{
    CommandEncoderDescriptor, DeviceDescriptor, Extent3d, Instance, LoadOp, Operations,
    RenderPassColorAttachment, RenderPassDescriptor, RequestAdapterOptions, StoreOp,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const FRAMES: usize = 4;
const FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// Offscreen target & renderer, when an adapter is available
struct Gpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::TextureView,
    renderer: GpuRenderer,
}

fn main() -> Result<(), Box<dyn Error>> {
    sprig::init_logging();

    let atlas = Texture::new(64, 64, true);
    let mut scene = build_scene(&atlas);

    let redraw = RedrawFlag::new();
    for (mesh, _, _) in &mut scene {
        mesh.share_redraw_flag(&redraw);
    }

    let mut painter = Painter::new(PainterConfig {
        skip_unchanged_frames: true,
        clear_color: Color(0x202830),
        ..Default::default()
    });
    painter.set_viewport(Rect::new(0.0, 0.0, WIDTH as f32, HEIGHT as f32));

    let mut gpu = pollster::block_on(init_gpu());
    if let Some(gpu) = &mut gpu {
        gpu.renderer
            .upload_texture(&gpu.device, &gpu.queue, &atlas, &checkerboard(64, 64))?;
    } else {
        log::warn!("no GPU adapter found, batching without drawing");
    }

    for frame in 0..FRAMES {
        // animation stops before the last frame, so that one is skipped
        if frame + 1 < FRAMES {
            for (mesh, _, _) in &mut scene {
                mesh.advance_time(1.0 / 60.0);
            }
        }
        if !painter.begin_frame(&redraw) {
            log::info!(
                "frame {frame}: unchanged, reusing {} draw calls",
                painter.draw_count()
            );
            continue;
        }

        for (mesh, matrix, blend_mode) in &scene {
            painter.push_state();
            painter.state_mut().transform_model_view(matrix);
            painter.state_mut().blend_mode = *blend_mode;
            painter.batch_mesh(mesh)?;
            painter.pop_state()?;
        }
        painter.finish_frame();

        let vertices: usize = painter
            .draw_commands()
            .iter()
            .map(|batch| batch.num_vertices())
            .sum();
        log::info!(
            "frame {}: {} meshes in {} draw calls ({vertices} vertices)",
            painter.frame_id(),
            scene.len(),
            painter.draw_count()
        );

        if let Some(gpu) = &mut gpu {
            render(gpu, &painter)?;
        }
    }

    Ok(())
}

/// Sprites from one atlas, a few untextured quads & an additive glow
fn build_scene(atlas: &Texture) -> Vec<(Mesh, Matrix2D, BlendMode)> {
    let mut scene = Vec::new();

    for i in 0..24 {
        let frame = atlas.sub_texture(Rect::new((i % 4) as f32 * 16.0, 0.0, 16.0, 16.0));
        let mut sprite = Mesh::image(frame);
        sprite.set_smoothing(TextureSmoothing::None);

        let (x, y) = ((i % 8) as f32 * 36.0 + 12.0, (i / 8) as f32 * 36.0 + 12.0);
        let mut matrix = Matrix2D::from_translation(x, y);
        matrix.rotate(i as f32 * 0.1);
        scene.push((sprite, matrix, BlendMode::Normal));
    }

    for i in 0..3 {
        let bar = Mesh::quad(80.0, 10.0, Color::rgb(60 * i as u8, 200, 120));
        let matrix = Matrix2D::from_translation(12.0, 140.0 + i as f32 * 16.0);
        scene.push((bar, matrix, BlendMode::Normal));
    }

    let mut glow = Mesh::quad(64.0, 64.0, Color(0xffcc66));
    glow.set_vertex_alpha(0, 0.0);
    let mut time = 0.0_f32;
    glow.add_enter_frame_listener(move |event, view| {
        time += event.passed_time;
        for i in 1..view.num_vertices() {
            view.set_vertex_alpha(i, 0.5 + 0.5 * (time * 8.0).sin());
        }
    });
    scene.push((glow, Matrix2D::from_translation(220.0, 140.0), BlendMode::Add));

    scene
}

async fn init_gpu() -> Option<Gpu> {
    let instance = Instance::default();
    let adapter = instance
        .request_adapter(&RequestAdapterOptions::default())
        .await
        .ok()?;
    let (device, queue) = adapter
        .request_device(&DeviceDescriptor::default())
        .await
        .ok()?;

    let target = device
        .create_texture(&TextureDescriptor {
            label: Some("Offscreen Target"),
            size: Extent3d {
                width: WIDTH,
                height: HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&Default::default());
    let renderer = GpuRenderer::new(&device, &queue, FORMAT);

    Some(Gpu {
        device,
        queue,
        target,
        renderer,
    })
}

fn render(gpu: &mut Gpu, painter: &Painter) -> Result<(), Box<dyn Error>> {
    gpu.renderer.prepare(&gpu.device, &gpu.queue, painter)?;

    let mut encoder = gpu
        .device
        .create_command_encoder(&CommandEncoderDescriptor::default());
    {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &gpu.target,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(painter.clear_color().into()),
                    store: StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        gpu.renderer.draw(&mut pass, painter);
    }
    gpu.queue.submit(Some(encoder.finish()));
    Ok(())
}

/// Premultiplied RGBA checkerboard in 8px cells
fn checkerboard(width: u32, height: u32) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| {
            let (x, y) = (i % width, i / width);
            if (x / 8 + y / 8) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect()
}
