use std::fmt;

/// Where in program construction a diagnostic was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
    /// Module or pipeline creation on the device, after both stages validated.
    Link,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
            StageKind::Link => f.write_str("link"),
        }
    }
}

/// A shader stage failed to parse, validate, or build a pipeline.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} stage failed to compile:\n{diagnostic}")]
pub struct CompileError {
    pub stage: StageKind,
    /// Compiler output with source spans rendered inline.
    pub diagnostic: String,
}

/// Startup failures acquiring a window, surface, adapter, or device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("GPU max texture dimension is {max}, requested surface is {width}x{height}")]
    SurfaceTooLarge { max: u32, width: u32, height: u32 },
    #[error("surface reports no supported texture formats for this adapter")]
    NoSurfaceFormat,
}

/// Everything the renderer can fail with, at startup or while running.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("surface error while rendering: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("render loop is already {0}")]
    LoopState(&'static str),
}
