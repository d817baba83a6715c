//! Renderer crate for flowpaper, a full-window animated flow-field background.
//!
//! A domain-warped fbm noise field is evaluated per pixel by a GLSL fragment
//! program, blended across a four-colour palette, then finished with grain and
//! a vignette. The overall flow is:
//!
//! ```text
//!   CLI / flowpaper
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ RenderLoop::tick()
//!                        │                                     │
//!          ViewportController ──▶ UniformStore ◀── elapsed ────┘
//!                                      │
//!                                      └─▶ GpuState::draw() ─▶ FlowParams UBO
//! ```
//!
//! `WindowState` owns the GPU resources and the uniform store, `RenderLoop`
//! owns the frame cadence, and the entrance sequencer fades the field in
//! after the first presented frame. [`field`] is a CPU mirror of the shader
//! math, used by tests and by [`export::write_still_png`].

mod compile;
mod error;
pub mod export;
pub mod field;
mod gpu;
mod runtime;
mod types;
mod uniforms;
mod viewport;
mod window;

pub use compile::{
    validate_fragment, validate_vertex, FRAGMENT_SHADER_GLSL, SHADER_VERSION, VERTEX_SHADER_GLSL,
};
pub use error::{CompileError, DeviceError, RendererError, StageKind};
pub use gpu::{quad_vertices, OrthoCamera, QuadVertex};
pub use runtime::{
    BoxedTimeSource, DrawTarget, FixedStepTimeSource, FramePacer, LoopPhase, PresentPacer,
    RenderLoop, StopHandle, SystemTimeSource, TimeSample, TimeSource,
};
pub use types::{
    AdapterProfile, Antialiasing, ColorSpaceMode, GpuPowerPreference, Palette, RendererConfig, Rgb,
};
pub use uniforms::{UniformStore, DEFAULT_POINTER};
pub use viewport::{ViewportController, DEFAULT_MAX_PIXEL_RATIO};

/// Thin entry point: owns the configuration and the stop hook, and hands
/// both to the window host.
pub struct Renderer {
    config: RendererConfig,
    stop: StopHandle,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            stop: StopHandle::new(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// A handle that ends [`Renderer::run`] from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Opens the window and renders until it is closed or stopped.
    pub fn run(self) -> Result<(), RendererError> {
        tracing::info!(
            shader_version = SHADER_VERSION,
            width = self.config.surface_size.0,
            height = self.config.surface_size.1,
            "starting flow field renderer"
        );
        window::run_window(self.config, self.stop)
    }
}
