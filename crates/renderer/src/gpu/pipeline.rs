use wgpu::naga::ShaderStage;

use crate::compile::{create_module, validate_fragment, validate_vertex};
use crate::error::{CompileError, StageKind};

use super::quad::{QuadVertex, ScreenQuad};
use super::uniforms::FlowUniforms;

/// Compiled vertex and fragment stages plus the render pipeline that binds
/// them to the `FlowParams` block. Immutable once built.
pub(crate) struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
}

impl ShaderProgram {
    /// Validates both stages offline, then builds modules and the pipeline
    /// inside a validation error scope so driver-side failures surface as
    /// [`StageKind::Link`] errors.
    pub fn compile(
        device: &wgpu::Device,
        vertex_source: &str,
        fragment_source: &str,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self, CompileError> {
        validate_vertex(vertex_source)?;
        validate_fragment(fragment_source)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = create_module(device, ShaderStage::Vertex, "flow vertex", vertex_source);
        let fragment_module =
            create_module(device, ShaderStage::Fragment, "flow fragment", fragment_source);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flow uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(FlowUniforms::SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flow pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("flow pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[QuadVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(CompileError {
                stage: StageKind::Link,
                diagnostic: err.to_string(),
            });
        }

        Ok(Self {
            pipeline,
            uniform_layout,
        })
    }

    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    /// Records one full-screen pass over `quad` with the given uniform bind group.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        quad: &ScreenQuad,
        uniforms: &wgpu::BindGroup,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, uniforms, &[]);
        quad.draw(pass);
    }
}
