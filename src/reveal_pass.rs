//! Render pass for reveal planes.
//!
//! Every plane program uses the same two bind groups:
//! - **Group 0**: the plane's [`PlaneUniformBlock`] (camera, model, uniforms)
//! - **Group 1**: the plane's image texture and sampler
//!
//! Pipelines are cached by program fingerprint, so planes whose graphs
//! compile to the same WGSL share one pipeline. Planes are transparent:
//! no depth buffer, alpha blending, drawn in the order the scene gives.

use std::collections::HashMap;

use crate::camera::Camera;
use crate::error::RevealResult;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::scene::{Gallery, PlaneInstance};
use crate::shader_graph::{CompiledProgram, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::texture::Texture;
use crate::uniforms::PlaneUniformBlock;

/// GPU resources owned by one plane.
struct PlaneResources {
    mesh: Mesh,
    size: (f32, f32),
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    image: String,
    texture_bind_group: wgpu::BindGroup,
    fingerprint: u64,
}

/// Draws the planes of a [`Gallery`].
pub struct RevealPass {
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    pipelines: HashMap<u64, wgpu::RenderPipeline>,
    planes: Vec<PlaneResources>,
}

impl RevealPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Plane Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Plane Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Reveal Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        Self {
            uniform_layout,
            texture_layout,
            pipeline_layout,
            format: gpu.config.format,
            pipelines: HashMap::new(),
            planes: Vec::new(),
        }
    }

    /// Number of distinct pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn ensure_pipeline(&mut self, gpu: &GpuContext, program: &CompiledProgram) {
        if self.pipelines.contains_key(&program.fingerprint) {
            tracing::trace!(fingerprint = program.fingerprint, "pipeline cache hit");
            return;
        }
        tracing::debug!(fingerprint = program.fingerprint, "pipeline cache miss");

        let label = format!("Reveal Program {:016x}", program.fingerprint);
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&label),
                source: wgpu::ShaderSource::Wgsl(program.source.as_str().into()),
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                // Transparent planes: no depth test, painter's order instead.
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        self.pipelines.insert(program.fingerprint, pipeline);
    }

    fn create_plane(&self, gpu: &GpuContext, plane: &PlaneInstance) -> PlaneResources {
        let config = plane.config();
        let mesh = Mesh::plane(gpu, config.width, config.height);

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Plane Uniforms"),
            size: std::mem::size_of::<PlaneUniformBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Plane Uniform Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        PlaneResources {
            mesh,
            size: (config.width, config.height),
            uniform_buffer,
            uniform_bind_group,
            image: plane.image().info().source.clone(),
            texture_bind_group: self.texture_bind_group(gpu, &Texture::from_image(gpu, plane.image())),
            fingerprint: plane.program().fingerprint,
        }
    }

    fn texture_bind_group(&self, gpu: &GpuContext, texture: &Texture) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Plane Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Bring GPU resources in line with the gallery and upload this frame's
    /// uniforms. Must run after the gallery's frame update.
    pub fn prepare(&mut self, gpu: &GpuContext, gallery: &Gallery, camera: &Camera) {
        let view_proj = camera.view_projection(gpu.aspect());
        self.planes.truncate(gallery.planes().len());

        for (i, plane) in gallery.planes().iter().enumerate() {
            self.ensure_pipeline(gpu, plane.program());

            let config = plane.config();
            let stale = self.planes.get(i).is_none_or(|res| {
                res.size != (config.width, config.height)
                    || res.image != plane.image().info().source
            });
            if stale {
                let resources = self.create_plane(gpu, plane);
                if i < self.planes.len() {
                    self.planes[i] = resources;
                } else {
                    self.planes.push(resources);
                }
            }

            let res = &mut self.planes[i];
            res.fingerprint = plane.program().fingerprint;
            let block = plane.uniforms().read().block(view_proj, plane.model_matrix());
            gpu.queue
                .write_buffer(&res.uniform_buffer, 0, bytemuck::cast_slice(&[block]));
        }
    }

    /// Draw the prepared planes in `order`.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass, order: &[usize]) {
        for &i in order {
            let Some(res) = self.planes.get(i) else {
                continue;
            };
            let Some(pipeline) = self.pipelines.get(&res.fingerprint) else {
                continue;
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &res.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &res.texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, res.mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(res.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..res.mesh.index_count, 0, 0..1);
        }
    }

    /// Render one frame of `gallery` to the surface over `clear`.
    ///
    /// A surface that cannot hand out a frame drops the frame; a lost or
    /// outdated surface is reconfigured for the next one.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        gallery: &Gallery,
        clear: wgpu::Color,
    ) -> RevealResult<()> {
        let camera = gallery.camera();
        let order = gallery.draw_order()?;
        self.prepare(gpu, gallery, &camera);

        let Some(output) = acquire_frame(gpu) else {
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Reveal Encoder"),
            });
        {
            let mut render_pass = begin_clear_pass(&mut encoder, &view, clear);
            self.draw(&mut render_pass, &order);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn acquire_frame(gpu: &GpuContext) -> Option<wgpu::SurfaceTexture> {
    match gpu.surface.get_current_texture() {
        Ok(output) => Some(output),
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            tracing::debug!("surface lost, reconfiguring");
            gpu.surface.configure(&gpu.device, &gpu.config);
            None
        }
        Err(err) => {
            tracing::warn!(%err, "dropped frame");
            None
        }
    }
}

fn begin_clear_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    clear: wgpu::Color,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Reveal Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
