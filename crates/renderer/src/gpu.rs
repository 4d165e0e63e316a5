//! wgpu backend: uploads mesh buffers and draws them into an offscreen
//! colour + depth target.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use corelib::{MeshError, MeshResult};
use glam::{Mat4, Vec3};
use wgpu::{
    util::DeviceExt,
    BindGroup, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, StoreOp, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, VertexState,
};

use crate::{RenderSettings, Vertex, backend::MeshBackend};

const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Shading UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ShadeUniform {
    proj: [[f32; 4]; 4],
    model_view: [[f32; 4]; 4],
    color: [f32; 4],
    light_dir: [f32; 4],
}

impl ShadeUniform {
    fn from_settings(settings: &RenderSettings) -> Self {
        let aspect = settings.width as f32 / settings.height.max(1) as f32;
        let proj = Mat4::perspective_rh(1.0, aspect, 0.1, 1000.0);
        let view = Mat4::from_translation(Vec3::new(0.0, -5.0, -20.0));
        let [r, g, b] = settings.color;
        let light = Vec3::from_array(settings.light_direction).normalize_or_zero();
        Self {
            proj: proj.to_cols_array_2d(),
            model_view: view.to_cols_array_2d(),
            color: [r, g, b, 1.0],
            light_dir: light.extend(0.0).to_array(),
        }
    }
}

/// Vertex + index buffers of one uploaded mesh.
pub struct GpuMesh {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    pipeline: RenderPipeline,
    shade_bg: BindGroup,
    shade_buf: Buffer,
    color_view: TextureView,
    depth_view: TextureView,
    settings: RenderSettings,
    frames: u64,
}

impl WgpuBackend {
    /// Blocking constructor for callers without an async runtime.
    pub fn new_blocking(backends: wgpu::Backends, settings: RenderSettings) -> MeshResult<Self> {
        pollster::block_on(Self::new(backends, settings))
    }

    pub async fn new(backends: wgpu::Backends, settings: RenderSettings) -> MeshResult<Self> {
        let width = settings.width.max(1);
        let height = settings.height.max(1);

        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| MeshError::Backend("no suitable GPU adapter".into()))?;
        log::info!("Using GPU adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("objview Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| MeshError::Backend(format!("request_device failed: {e}")))?;

        let color_view = create_target_view(&device, width, height, COLOR_FORMAT, "ColorTex");
        let depth_view = create_target_view(&device, width, height, DEPTH_FORMAT, "DepthTex");

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Mesh WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let shade_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shade BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<ShadeUniform>() as u64),
                },
                count: None,
            }],
        });
        let shade_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shade UBO"),
            contents: bytemuck::bytes_of(&ShadeUniform::from_settings(&settings)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let shade_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shade BG"),
            layout: &shade_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shade_buf.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&shade_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            shade_bg,
            shade_buf,
            color_view,
            depth_view,
            settings,
            frames: 0,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Change colour/light; takes effect on the next draw.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        if (settings.width, settings.height) != (self.settings.width, self.settings.height) {
            let (w, h) = (settings.width.max(1), settings.height.max(1));
            self.color_view = create_target_view(&self.device, w, h, COLOR_FORMAT, "ColorTex");
            self.depth_view = create_target_view(&self.device, w, h, DEPTH_FORMAT, "DepthTex");
        }
        self.settings = settings;
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }
}

impl MeshBackend for WgpuBackend {
    type Handle = GpuMesh;

    fn upload(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshResult<GpuMesh> {
        let index_count = u32::try_from(indices.len()).map_err(|_| MeshError::TooManyVertices)?;
        let vertex_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh VB"),
                contents: bytemuck::cast_slice(vertices),
                usage: BufferUsages::VERTEX,
            });
        let index_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh IB"),
                contents: bytemuck::cast_slice(indices),
                usage: BufferUsages::INDEX,
            });
        log::info!(
            "Uploaded mesh: {} vertices, {} indices",
            vertices.len(),
            index_count
        );
        Ok(GpuMesh {
            vertex_buf,
            index_buf,
            index_count,
        })
    }

    fn draw(&mut self, mesh: &GpuMesh, index_count: u32) -> MeshResult<()> {
        let count = index_count.min(mesh.index_count);
        let shade = ShadeUniform::from_settings(&self.settings);
        self.queue
            .write_buffer(&self.shade_buf, 0, bytemuck::bytes_of(&shade));

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: 0.3,
                            g: 0.3,
                            b: 0.4,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.shade_bg, &[]);
            rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
            rpass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..count, 0, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        self.frames += 1;
        Ok(())
    }

    fn release(&mut self, mesh: GpuMesh) {
        mesh.vertex_buf.destroy();
        mesh.index_buf.destroy();
        log::debug!("Released mesh buffers ({} indices)", mesh.index_count);
    }
}

/// Create a 2D render-target view.
fn create_target_view(
    device: &Device,
    width: u32,
    height: u32,
    format: TextureFormat,
    label: &str,
) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
