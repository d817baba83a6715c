use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::compile::{FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};
use crate::error::RendererError;
use crate::runtime::DrawTarget;
use crate::types::RendererConfig;
use crate::uniforms::UniformStore;

use super::context::{ContextOptions, GpuContext};
use super::pipeline::ShaderProgram;
use super::quad::{OrthoCamera, ScreenQuad};
use super::uniforms::{write_uniforms, FlowUniforms};

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// All GPU resources for the flow field: device, swapchain, program, quad,
/// and the uniform buffer the store is copied into each frame.
pub(crate) struct GpuState {
    context: GpuContext,
    program: ShaderProgram,
    quad: ScreenQuad,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    multisample_target: Option<MultisampleTarget>,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self, RendererError>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let context = GpuContext::new(
            target,
            initial_size,
            ContextOptions {
                antialiasing: config.antialiasing,
                color_space: config.color_space,
                power: config.power_preference,
                vsync: config.vsync,
                frame_latency: config.frame_latency,
            },
        )?;

        let program = ShaderProgram::compile(
            &context.device,
            VERTEX_SHADER_GLSL,
            FRAGMENT_SHADER_GLSL,
            context.surface_format,
            context.sample_count,
        )?;
        let quad = ScreenQuad::new(&context.device, &OrthoCamera::default());

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: FlowUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: program.uniform_layout(),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let multisample_target = Self::multisample_target_for(&context);

        tracing::info!(
            adapter = %context.adapter_profile.name,
            width = context.size.width,
            height = context.size.height,
            sample_count = context.sample_count,
            "renderer ready"
        );

        Ok(Self {
            context,
            program,
            quad,
            uniform_buffer,
            uniform_bind_group,
            multisample_target,
        })
    }

    fn multisample_target_for(context: &GpuContext) -> Option<MultisampleTarget> {
        (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn max_texture_dimension(&self) -> u32 {
        self.context.max_dimension
    }

    /// Resizes the swapchain and MSAA target; returns the applied size.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) -> PhysicalSize<u32> {
        if new_size.width == 0 || new_size.height == 0 {
            return self.context.size;
        }
        let applied = self.context.resize(new_size);
        self.multisample_target = Self::multisample_target_for(&self.context);
        applied
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    fn render(&mut self, uniforms: &UniformStore) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        write_uniforms(
            &self.context.queue,
            &self.uniform_buffer,
            &uniforms.snapshot(),
        );

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("flow pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.program
                .draw(&mut render_pass, &self.quad, &self.uniform_bind_group);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl DrawTarget for GpuState {
    type Error = wgpu::SurfaceError;

    fn draw(&mut self, uniforms: &UniformStore) -> Result<(), Self::Error> {
        self.render(uniforms)
    }
}
