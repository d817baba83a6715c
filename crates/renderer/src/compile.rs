use std::borrow::Cow;

use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{Module, ShaderStage};

use crate::error::{CompileError, StageKind};

/// Bumped whenever the uniform block or the field math changes.
pub const SHADER_VERSION: u32 = 1;

/// Parses and validates the vertex stage without a device.
pub fn validate_vertex(source: &str) -> Result<Module, CompileError> {
    validate(StageKind::Vertex, ShaderStage::Vertex, source)
}

/// Parses and validates the fragment stage without a device.
pub fn validate_fragment(source: &str) -> Result<Module, CompileError> {
    validate(StageKind::Fragment, ShaderStage::Fragment, source)
}

fn validate(kind: StageKind, stage: ShaderStage, source: &str) -> Result<Module, CompileError> {
    let module = Frontend::default()
        .parse(&Options::from(stage), source)
        .map_err(|err| CompileError {
            stage: kind,
            diagnostic: err.emit_to_string(source),
        })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| CompileError {
            stage: kind,
            diagnostic: err.emit_to_string(source),
        })?;

    Ok(module)
}

/// Hands an already validated GLSL stage to the device.
pub(crate) fn create_module(
    device: &wgpu::Device,
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage,
            defines: &[],
        },
    })
}

/// Pass-through vertex stage for the screen quad.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Domain-warped fbm flow field with grain and vignette.
///
/// The `FlowParams` layout must match [`crate::gpu::FlowUniforms`].
/// `u_pointer` is uploaded every frame but not read by the blend.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FlowParams {
    vec3 u_color1;
    float u_time;
    vec3 u_color2;
    float u_reveal;
    vec3 u_color3;
    float _pad0;
    vec3 u_color4;
    float _pad1;
    vec2 u_resolution;
    vec2 u_pointer;
} params;

float hash(vec2 p) {
    return fract(sin(dot(p, vec2(12.9898, 78.233))) * 43758.5453123);
}

float noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);

    float a = hash(i);
    float b = hash(i + vec2(1.0, 0.0));
    float c = hash(i + vec2(0.0, 1.0));
    float d = hash(i + vec2(1.0, 1.0));

    vec2 u = f * f * (vec2(3.0) - 2.0 * f);

    return mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

float fbm(vec2 p) {
    vec2 st = p;
    float value = 0.0;
    float amplitude = 0.5;
    for (int octave = 0; octave < 3; octave++) {
        value += amplitude * noise(st);
        st = st * 2.0;
        amplitude *= 0.5;
    }
    return value;
}

void main() {
    // Bottom-left origin, like the field's reference coordinates.
    vec2 fragCoord = vec2(gl_FragCoord.x, params.u_resolution.y - gl_FragCoord.y);

    vec2 uv = fragCoord / params.u_resolution;
    vec2 st = vec2(uv.x * (params.u_resolution.x / params.u_resolution.y), uv.y);
    float t = params.u_time;

    vec2 q = vec2(fbm(st + vec2(0.1 * t)), fbm(st + vec2(1.0, 0.0)));
    vec2 r = vec2(
        fbm(st + q + vec2(1.7, 9.2) + vec2(0.15 * t)),
        fbm(st + q + vec2(8.3, 2.8) + vec2(0.126 * t))
    );
    float f = fbm(st + r);

    vec3 color = mix(params.u_color1, params.u_color2, clamp(f * f * 4.0, 0.0, 1.0));
    color = mix(color, params.u_color3, clamp(length(q), 0.0, 1.0));
    color = mix(color, params.u_color4, clamp(abs(r.x), 0.0, 1.0));

    color = color + vec3(hash(st * t) * 0.15);
    color = color * (1.0 - smoothstep(0.5, 1.5, length(uv - vec2(0.5))));

    outColor = vec4(color * params.u_reveal, 1.0);
}
";
