//! GPU side of the renderer.
//!
//! - `context` owns the wgpu instance, adapter, device, and swapchain, and
//!   reconfigures the swapchain on resize or loss.
//! - `quad` is the screen-filling canvas: four vertices projected once through
//!   an orthographic camera.
//! - `pipeline` turns the GLSL stages into a `ShaderProgram`.
//! - `uniforms` is the std140 byte image of the `UniformStore`.
//! - `state` glues everything together behind the `DrawTarget` seam used by
//!   the render loop.

mod context;
mod pipeline;
mod quad;
mod state;
mod uniforms;

pub use quad::{quad_vertices, OrthoCamera, QuadVertex};

pub(crate) use state::GpuState;
pub(crate) use uniforms::FlowUniforms;
