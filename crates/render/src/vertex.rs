use bytemuck::{Pod, Zeroable};
use viewport_assets::MeshData;

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    /// Interleave a mesh. Missing uvs and normals are zero-filled.
    pub fn interleave(mesh: &MeshData) -> Vec<Vertex> {
        mesh.vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                uv: mesh.uv(i),
                normal: mesh.normal(i),
            })
            .collect()
    }
}

/// Per-instance `[x, y, z, scale]`.
pub type Instance = [f32; 4];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_eight_floats() {
        assert_eq!(Vertex::STRIDE, 32);
    }

    #[test]
    fn interleave_keeps_attribute_order() {
        let mesh = MeshData {
            vertices: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            uvs: vec![[0.5, 0.25]],
            normals: vec![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            indices: Vec::new(),
        };
        let vertices = Vertex::interleave(&mesh);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].uv, [0.5, 0.25]);
        assert_eq!(vertices[1].uv, [0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
        let floats: &[f32] = bytemuck::cast_slice(&vertices);
        assert_eq!(&floats[..8], &[1.0, 2.0, 3.0, 0.5, 0.25, 0.0, 1.0, 0.0]);
    }
}
