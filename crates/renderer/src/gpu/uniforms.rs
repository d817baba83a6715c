use bytemuck::{Pod, Zeroable};

/// Byte image of the `FlowParams` std140 block. Each `vec3` colour shares its
/// 16-byte slot with the scalar that follows it.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FlowUniforms {
    pub u_color1: [f32; 3],
    pub u_time: f32,
    pub u_color2: [f32; 3],
    pub u_reveal: f32,
    pub u_color3: [f32; 3],
    pub _pad0: f32,
    pub u_color4: [f32; 3],
    pub _pad1: f32,
    pub u_resolution: [f32; 2],
    pub u_pointer: [f32; 2],
}

unsafe impl Zeroable for FlowUniforms {}
unsafe impl Pod for FlowUniforms {}

impl FlowUniforms {
    pub const SIZE: u64 = std::mem::size_of::<FlowUniforms>() as u64;
}

pub(crate) fn write_uniforms(queue: &wgpu::Queue, buffer: &wgpu::Buffer, uniforms: &FlowUniforms) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_eighty_bytes_with_no_tail_padding() {
        assert_eq!(FlowUniforms::SIZE, 80);
        assert_eq!(std::mem::align_of::<FlowUniforms>(), 16);
    }
}
