//! Frame loop and the GPU side of the scene.
//!
//! [`RenderLoop`] is a two-state machine (`NotStarted -> Running`) that is
//! driven by the window's redraw events. Each tick advances the [`Stage`]
//! (controls, uniforms) and then draws it. [`GpuScene`] owns every GPU
//! resource derived from a [`Scene`] and draws it in one pass.

use std::iter;

use instant::{Duration, Instant};
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        geometry::BoxGeometry,
        instance::{Instance, InstanceRaw},
        material::Side,
        scene::Scene,
        texture::Texture,
    },
    pipelines::glass::{self, MaterialBinding},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    NotStarted,
    Running,
}

/// Something the render loop can drive once per frame.
pub trait Stage {
    /// Per-frame update before drawing; `dt` is the time since the last tick.
    fn advance(&mut self, dt: Duration);
    fn draw(&mut self) -> Result<(), wgpu::SurfaceError>;
}

/// Runs at most once per process: there is no stop, pause or restart.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
    last_frame: Instant,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::NotStarted,
            frames: 0,
            last_frame: Instant::now(),
        }
    }

    /// Returns `false` if the loop was already running.
    pub fn start(&mut self) -> bool {
        match self.state {
            LoopState::Running => {
                log::warn!("Render loop already running, ignoring start");
                false
            }
            LoopState::NotStarted => {
                self.state = LoopState::Running;
                self.last_frame = Instant::now();
                log::info!("Render loop started");
                true
            }
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance and draw `stage` once. Returns `Ok(false)` when the loop has
    /// not been started, in which case nothing is touched.
    pub fn tick<S: Stage>(&mut self, stage: &mut S) -> Result<bool, wgpu::SurfaceError> {
        if !self.is_running() {
            return Ok(false);
        }
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        stage.advance(dt);
        stage.draw()?;
        self.frames += 1;
        Ok(true)
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Every GPU resource for one [`Scene`].
///
/// All panels share the box buffers and the environment texture. Each panel
/// owns its normal map and material uniform and is drawn with its own
/// instance index.
#[derive(Debug)]
pub struct GpuScene {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
    materials: Vec<MaterialBinding>,
    pipeline: wgpu::RenderPipeline,
    clear_colour: wgpu::Color,
}

impl GpuScene {
    pub fn upload(ctx: &Context, scene: &Scene) -> anyhow::Result<Self> {
        use anyhow::Context as _;

        let environment_map = scene
            .environment()
            .context("cannot upload a scene without environment")?;
        let environment = Texture::from_environment(&ctx.device, &ctx.queue, environment_map)?;

        let geometry = match scene.objects().first() {
            Some(object) => object.geometry().clone(),
            None => std::sync::Arc::new(BoxGeometry::new(Default::default())),
        };
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Vertex Buffer"),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Index Buffer"),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });

        let mut instance_data: Vec<InstanceRaw> = scene
            .objects()
            .iter()
            .map(|object| Instance::from(object.position()).to_raw())
            .collect();
        // Zero-sized buffers are not allowed.
        if instance_data.is_empty() {
            instance_data.push(Instance::new().to_raw());
        }
        let instance_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Instance Buffer"),
                contents: bytemuck::cast_slice(&instance_data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let material_layout = glass::material_layout(&ctx.device);
        let materials = scene
            .objects()
            .iter()
            .map(|object| {
                MaterialBinding::new(
                    &ctx.device,
                    &ctx.queue,
                    &material_layout,
                    object.material(),
                    &environment,
                    environment_map.mip_count(),
                )
                .with_context(|| format!("uploading panel {}", object.name()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let side = scene
            .objects()
            .first()
            .map(|object| object.material().side())
            .unwrap_or(Side::Double);
        let pipeline = glass::mk_glass_pipeline(
            &ctx.device,
            &ctx.config,
            &material_layout,
            &ctx.camera.bind_group_layout,
            &ctx.light.bind_group_layout,
            side,
        );

        log::info!("Uploaded {} panels to the GPU", materials.len());
        Ok(Self {
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices().len() as u32,
            instance_buffer,
            materials,
            pipeline,
            clear_colour: clear_colour(scene.background()),
        })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn draw(&self, ctx: &Context) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &ctx.light.bind_group, &[]);
            for (i, material) in self.materials.iter().enumerate() {
                let instance = i as u32;
                render_pass.set_bind_group(0, &material.bind_group, &[]);
                render_pass.draw_indexed(0..self.num_indices, 0, instance..instance + 1);
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Opaque wgpu clear value for a linear RGB background.
pub fn clear_colour([r, g, b]: [f32; 3]) -> wgpu::Color {
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

/// Present one frame holding only the background, for when there is no
/// [`GpuScene`] to draw.
pub fn present_background(
    ctx: &Context,
    background: [f32; 3],
) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Background Encoder"),
        });
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Background Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_colour(background)),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}
