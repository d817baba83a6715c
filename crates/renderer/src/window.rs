use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use sequencer::EntranceSequencer;

use crate::error::{DeviceError, RendererError};
use crate::gpu::GpuState;
use crate::runtime::{RenderLoop, StopHandle, SystemTimeSource};
use crate::types::RendererConfig;
use crate::uniforms::UniformStore;
use crate::viewport::ViewportController;

/// What the host should do after a redraw.
enum FrameOutcome {
    Continue,
    Exit,
    Fatal(RendererError),
}

/// Everything the winit host owns between events.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    uniforms: UniformStore,
    viewport: ViewportController,
    render_loop: RenderLoop,
    entrance: EntranceSequencer,
    entrance_reported: bool,
}

impl WindowState {
    fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        stop: StopHandle,
    ) -> Result<Self, RendererError> {
        let mut viewport = ViewportController::new(window.scale_factor(), config.max_pixel_ratio);
        let drawable = viewport.drawable_size(window.inner_size());
        let gpu = GpuState::new(window.clone(), drawable, config)?;
        viewport.set_max_dimension(gpu.max_texture_dimension());
        let size = gpu.size();
        debug!(
            scale_factor = window.scale_factor(),
            pixel_ratio = viewport.pixel_ratio(),
            width = size.width,
            height = size.height,
            "drawable sized"
        );
        let uniforms = UniformStore::new(config.palette, size.width, size.height);
        let render_loop = RenderLoop::with_stop_handle(Box::new(SystemTimeSource::new()), stop);

        Ok(Self {
            window,
            gpu,
            uniforms,
            viewport,
            render_loop,
            entrance: config.entrance.clone(),
            entrance_reported: false,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(drawable) = self.viewport.handle_resize(&mut self.uniforms, new_size) else {
            return;
        };
        let applied = self.gpu.resize(drawable);
        if applied != drawable {
            self.uniforms
                .set_resolution(applied.width as f32, applied.height as f32);
        }
        debug!(width = applied.width, height = applied.height, "viewport resized");
    }

    fn rescale(&mut self, scale_factor: f64) {
        self.viewport.set_scale_factor(scale_factor);
        debug!(scale_factor, pixel_ratio = self.viewport.pixel_ratio(), "scale factor changed");
        self.resize(self.window.inner_size());
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        self.viewport
            .handle_pointer_moved(&mut self.uniforms, position);
    }

    fn render_frame(&mut self) -> FrameOutcome {
        let now = Instant::now();
        self.uniforms.set_reveal(self.entrance.container_opacity(now));

        match self.render_loop.tick(&mut self.uniforms, &mut self.gpu) {
            Ok(Some(_)) => self.advance_entrance(now),
            Ok(None) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.render_loop.stop();
                return FrameOutcome::Fatal(RendererError::Surface(
                    wgpu::SurfaceError::OutOfMemory,
                ));
            }
            Err(other) => {
                warn!(error = ?other, "surface error; retrying next frame");
            }
        }

        if self.render_loop.is_running() {
            self.window.request_redraw();
            FrameOutcome::Continue
        } else {
            FrameOutcome::Exit
        }
    }

    /// The entrance starts once the first frame has been presented.
    fn advance_entrance(&mut self, now: Instant) {
        if self.entrance.begin(now) {
            info!(
                duration_ms = self.entrance.total_duration().as_millis() as u64,
                "first frame presented; starting entrance"
            );
            return;
        }
        if !self.entrance_reported && self.entrance.is_finished(now) {
            self.entrance_reported = true;
            for frame in self.entrance.sample(now) {
                debug!(
                    element = %frame.target,
                    opacity = frame.state.opacity,
                    offset_y = frame.state.offset_y,
                    "revealed"
                );
            }
            info!("entrance finished");
        }
    }
}

/// Opens the window and blocks until it is closed or `stop` is requested.
pub(crate) fn run_window(config: RendererConfig, stop: StopHandle) -> Result<(), RendererError> {
    let event_loop = EventLoop::new().map_err(DeviceError::from)?;
    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.window_title.clone())
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        .build(&event_loop)
        .map_err(DeviceError::from)?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, stop)?;
    state.render_loop.start()?;
    state.window.request_redraw();
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut failure: Option<RendererError> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                state.render_loop.stop();
                elwt.exit();
            }
            WindowEvent::Resized(new_size) => state.resize(new_size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => state.rescale(scale_factor),
            WindowEvent::CursorMoved { position, .. } => state.pointer_moved(position),
            WindowEvent::RedrawRequested => match state.render_frame() {
                FrameOutcome::Continue => {}
                FrameOutcome::Exit => elwt.exit(),
                FrameOutcome::Fatal(err) => {
                    failure = Some(err);
                    elwt.exit();
                }
            },
            _ => {}
        },
        Event::AboutToWait => {
            if !state.render_loop.is_running() {
                elwt.exit();
            }
        }
        _ => {}
    });

    if let Some(err) = failure {
        return Err(err);
    }
    run_result.map_err(DeviceError::from)?;
    info!(frames = state.render_loop.frames(), "render loop stopped");
    Ok(())
}
