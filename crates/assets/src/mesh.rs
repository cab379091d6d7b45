use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Vertex data for one mesh: parallel position/uv/normal arrays plus an
/// optional u16 index list.
///
/// `uvs` and `normals` may be empty, in which case zeros are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn uv(&self, i: usize) -> [f32; 2] {
        self.uvs.get(i).copied().unwrap_or([0.0, 0.0])
    }

    pub fn normal(&self, i: usize) -> [f32; 3] {
        self.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0])
    }

    /// Check array lengths and index bounds.
    pub fn validate(&self) -> Result<(), AssetError> {
        let n = self.vertices.len();
        if !self.uvs.is_empty() && self.uvs.len() != n {
            return Err(AssetError::InvalidMesh(format!(
                "has {} uvs for {n} vertices",
                self.uvs.len()
            )));
        }
        if !self.normals.is_empty() && self.normals.len() != n {
            return Err(AssetError::InvalidMesh(format!(
                "has {} normals for {n} vertices",
                self.normals.len()
            )));
        }
        if n > u16::MAX as usize + 1 {
            return Err(AssetError::InvalidMesh(format!("has {n} vertices, too many for u16 indices")));
        }
        if let Some(&i) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(AssetError::InvalidMesh(format!("index {i} out of range for {n} vertices")));
        }
        Ok(())
    }

    /// Append another mesh, offsetting its indices.
    ///
    /// Missing uv/normal arrays on either side are filled with zeros so the
    /// result stays parallel.
    pub fn append(&mut self, other: &MeshData) -> Result<(), AssetError> {
        let offset = self.vertices.len();
        if offset + other.vertices.len() > u16::MAX as usize + 1 {
            return Err(AssetError::InvalidMesh("merged mesh exceeds u16 index range".into()));
        }
        let has_uvs = !self.uvs.is_empty() || !other.uvs.is_empty();
        let has_normals = !self.normals.is_empty() || !other.normals.is_empty();
        if has_uvs {
            self.uvs.resize(offset, [0.0, 0.0]);
            self.uvs.extend((0..other.vertex_count()).map(|i| other.uv(i)));
        }
        if has_normals {
            self.normals.resize(offset, [0.0, 0.0, 0.0]);
            self.normals.extend((0..other.vertex_count()).map(|i| other.normal(i)));
        }
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset as u16));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            normals: vec![],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn validate_catches_bad_index() {
        let mut mesh = triangle();
        assert!(mesh.validate().is_ok());
        mesh.indices.push(3);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn validate_catches_mismatched_uvs() {
        let mut mesh = triangle();
        mesh.uvs.pop();
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn append_offsets_indices() {
        let mut mesh = triangle();
        mesh.append(&triangle()).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.uvs.len(), 6);
        assert!(mesh.normals.is_empty());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn missing_attributes_read_as_zero() {
        let mesh = triangle();
        assert_eq!(mesh.normal(1), [0.0, 0.0, 0.0]);
        assert_eq!(mesh.uv(1), [1.0, 0.0]);
    }
}
