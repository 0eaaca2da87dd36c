//! wgpu implementation of [`RenderBackend`].
//!
//! Draws are queued during `on_render` and recorded into a single pass by
//! [`WgpuRenderer::flush`]. Per-draw uniforms share one buffer addressed with dynamic
//! offsets.

use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use super::context::{DepthTexture, GpuContext};
use crate::error::SetupError;
use crate::render::{
    MeshData, MeshHandle, RenderBackend, Renderable, ShaderHandle, ShaderSource, Vertex,
};

/// Per-draw uniform block; must match `DrawUniform` in the WGSL sources.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    view_projection: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl DrawUniform {
    fn new(view_projection: Mat4, model: Mat4, color: Vec4) -> Self {
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color: color.to_array(),
        }
    }
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;
const INITIAL_DRAW_CAPACITY: usize = 64;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct QueuedDraw {
    shader: ShaderHandle,
    mesh: MeshHandle,
    uniform: DrawUniform,
}

/// Forward renderer for flat-colored meshes.
pub struct WgpuRenderer {
    ctx: GpuContext,
    color_format: wgpu::TextureFormat,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: Vec<wgpu::RenderPipeline>,
    meshes: Vec<GpuMesh>,
    queued: Vec<QueuedDraw>,
    uniform_stride: u64,
    uniform_capacity: usize,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl WgpuRenderer {
    pub fn new(ctx: GpuContext, color_format: wgpu::TextureFormat) -> Self {
        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("draw uniform layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                        },
                        count: None,
                    }],
                });

        let alignment = u64::from(ctx.device.limits().min_uniform_buffer_offset_alignment);
        let uniform_stride = UNIFORM_SIZE.div_ceil(alignment) * alignment;
        let (uniform_buffer, bind_group) = create_uniforms(
            &ctx,
            &bind_group_layout,
            uniform_stride,
            INITIAL_DRAW_CAPACITY,
        );

        Self {
            ctx,
            color_format,
            bind_group_layout,
            pipelines: Vec::new(),
            meshes: Vec::new(),
            queued: Vec::new(),
            uniform_stride,
            uniform_capacity: INITIAL_DRAW_CAPACITY,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Number of draws waiting for the next [`flush`](Self::flush).
    pub fn queued_draws(&self) -> usize {
        self.queued.len()
    }

    /// Clear the targets and record every queued draw into one render pass.
    pub fn flush(
        &mut self,
        color_view: &wgpu::TextureView,
        depth: &DepthTexture,
        clear_color: wgpu::Color,
    ) {
        self.reserve_uniforms(self.queued.len());

        if !self.queued.is_empty() {
            let stride = self.uniform_stride as usize;
            let mut data = vec![0u8; stride * self.queued.len()];
            for (i, draw) in self.queued.iter().enumerate() {
                let start = i * stride;
                data[start..start + UNIFORM_SIZE as usize]
                    .copy_from_slice(bytemuck::bytes_of(&draw.uniform));
            }
            self.ctx.queue.write_buffer(&self.uniform_buffer, 0, &data);
        }

        let mut encoder = self.ctx.create_encoder(Some("frame encoder"));
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (i, draw) in self.queued.iter().enumerate() {
                let (Some(pipeline), Some(mesh)) = (
                    self.pipelines.get(draw.shader.0 as usize),
                    self.meshes.get(draw.mesh.0 as usize),
                ) else {
                    tracing::warn!(
                        "skipping draw with unknown shader {:?} or mesh {:?}",
                        draw.shader,
                        draw.mesh
                    );
                    continue;
                };
                let offset = (i as u64 * self.uniform_stride) as u32;
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.bind_group, &[offset]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.ctx.queue.submit([encoder.finish()]);
        self.queued.clear();
    }

    fn reserve_uniforms(&mut self, draws: usize) {
        if draws <= self.uniform_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buffer, bind_group) =
            create_uniforms(&self.ctx, &self.bind_group_layout, self.uniform_stride, capacity);
        self.uniform_buffer = buffer;
        self.bind_group = bind_group;
        self.uniform_capacity = capacity;
        tracing::debug!("grew draw uniform buffer to {} slots", capacity);
    }

    fn create_pipeline(
        &self,
        source: &ShaderSource,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        let layout = self
            .ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(source.label),
                bind_group_layouts: &[&self.bind_group_layout],
                immediate_size: 0,
            });

        self.ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(source.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(ShaderSource::VERTEX_ENTRY),
                    buffers: &[Vertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(ShaderSource::FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthTexture::FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview_mask: None,
                cache: None,
            })
    }
}

fn create_uniforms(
    ctx: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw uniforms"),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw uniforms"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

impl RenderBackend for WgpuRenderer {
    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, SetupError> {
        let device = &self.ctx.device;
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.vertex.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.fragment.into()),
        });
        let pipeline = self.create_pipeline(source, &vertex, &fragment);

        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(SetupError::ShaderCompilation {
                label: source.label.to_string(),
                message: error.to_string(),
            });
        }

        tracing::debug!("compiled shader `{}`", source.label);
        self.pipelines.push(pipeline);
        Ok(ShaderHandle(self.pipelines.len() as u32 - 1))
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshHandle {
        let vertex_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh vertices"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        });
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn draw(&mut self, renderable: &Renderable, projection: Mat4, view: Mat4) {
        self.queued.push(QueuedDraw {
            shader: renderable.visual.shader,
            mesh: renderable.visual.mesh,
            uniform: DrawUniform::new(
                projection * view,
                renderable.model_matrix(),
                renderable.visual.color,
            ),
        });
    }
}
