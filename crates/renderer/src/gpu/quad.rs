use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Orthographic projection onto wgpu clip space (depth in `0..=1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoCamera {
    /// Maps the 2-unit square onto the whole viewport.
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            top: 1.0,
            bottom: -1.0,
            near: 0.0,
            far: 1.0,
        }
    }
}

impl OrthoCamera {
    pub fn project(&self, point: [f32; 3]) -> [f32; 3] {
        [
            2.0 * (point[0] - self.left) / (self.right - self.left) - 1.0,
            2.0 * (point[1] - self.bottom) / (self.top - self.bottom) - 1.0,
            (point[2] - self.near) / (self.far - self.near),
        ]
    }
}

/// Corners of the 2-unit square as a triangle strip: top-left, top-right,
/// bottom-left, bottom-right.
const CORNERS: [([f32; 2], [f32; 2]); 4] = [
    ([-1.0, 1.0], [0.0, 1.0]),
    ([1.0, 1.0], [1.0, 1.0]),
    ([-1.0, -1.0], [0.0, 0.0]),
    ([1.0, -1.0], [1.0, 0.0]),
];

/// Projects the square through `camera`, keeping the per-corner UVs.
pub fn quad_vertices(camera: &OrthoCamera) -> [QuadVertex; 4] {
    CORNERS.map(|(position, uv)| {
        let [x, y, _] = camera.project([position[0], position[1], 0.0]);
        QuadVertex {
            position: [x, y],
            uv,
        }
    })
}

/// The screen-filling canvas: four vertices in an immutable vertex buffer.
pub(crate) struct ScreenQuad {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl ScreenQuad {
    pub(crate) fn new(device: &wgpu::Device, camera: &OrthoCamera) -> Self {
        let vertices = quad_vertices(camera);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen quad"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_is_identity_on_the_square() {
        let camera = OrthoCamera::default();
        for (position, _) in CORNERS {
            let [x, y, z] = camera.project([position[0], position[1], 0.0]);
            assert_eq!([x, y], position);
            assert_eq!(z, 0.0);
        }
    }

    #[test]
    fn quad_covers_clip_space_with_unit_uvs() {
        let vertices = quad_vertices(&OrthoCamera::default());
        assert_eq!(vertices.len(), 4);
        for vertex in vertices {
            assert!(vertex.position.iter().all(|c| c.abs() == 1.0));
            assert!(vertex.uv.iter().all(|c| *c == 0.0 || *c == 1.0));
            // uv is the position remapped from [-1,1] to [0,1].
            assert_eq!(vertex.uv[0], vertex.position[0] * 0.5 + 0.5);
            assert_eq!(vertex.uv[1], vertex.position[1] * 0.5 + 0.5);
        }
    }

    #[test]
    fn wider_camera_shrinks_the_quad() {
        let camera = OrthoCamera {
            left: -2.0,
            right: 2.0,
            top: 2.0,
            bottom: -2.0,
            ..OrthoCamera::default()
        };
        let vertices = quad_vertices(&camera);
        assert_eq!(vertices[0].position, [-0.5, 0.5]);
        assert_eq!(vertices[3].position, [0.5, -0.5]);
    }

    #[test]
    fn vertex_stride_matches_attributes() {
        let layout = QuadVertex::layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes[1].offset, 8);
    }
}
