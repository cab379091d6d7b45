//! Procedural mesh builders for the built-in geometry types.

use glam::{Mat4, Vec3};
use viewport_assets::{AssetError, MeshData};

use crate::collision::Hitbox;

pub const HITBOX_COLOR: [f32; 3] = [1.0, 0.0, 0.0];
const GRID_COLOR: [f32; 3] = [0.4, 0.4, 0.4];
const GRID_X_AXIS_COLOR: [f32; 3] = [0.4, 0.4, 1.0];
const GRID_Z_AXIS_COLOR: [f32; 3] = [1.0, 0.4, 0.4];

/// Wireframe box spanning a hitbox, drawn as lines. Vertex color is
/// carried in the normals.
pub fn box_mesh(hitbox: &Hitbox, color: [f32; 3]) -> MeshData {
    let Hitbox { top, right, bottom, left, depth } = *hitbox;
    MeshData {
        vertices: vec![
            [left, top, depth],
            [right, top, depth],
            [left, bottom, depth],
            [right, bottom, depth],
            [left, top, -depth],
            [right, top, -depth],
            [left, bottom, -depth],
            [right, bottom, -depth],
        ],
        uvs: vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ],
        normals: vec![color; 8],
        indices: vec![
            0, 1, 1, 3, 3, 2, 2, 0, // front
            4, 5, 5, 7, 7, 6, 6, 4, // back
            0, 4, 1, 5, 2, 6, 3, 7, // sides
        ],
    }
}

/// Which faces of a cube are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeFaces {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
    pub front: bool,
    pub back: bool,
}

impl Default for CubeFaces {
    fn default() -> Self {
        Self::all()
    }
}

impl CubeFaces {
    pub fn all() -> Self {
        Self {
            top: true,
            bottom: true,
            left: true,
            right: true,
            front: true,
            back: true,
        }
    }

    pub fn none() -> Self {
        Self {
            top: false,
            bottom: false,
            left: false,
            right: false,
            front: false,
            back: false,
        }
    }

    pub fn is_invisible(&self) -> bool {
        *self == Self::none()
    }

    fn visible(&self) -> impl Iterator<Item = Vec3> + '_ {
        [
            (self.top, Vec3::Y),
            (self.bottom, Vec3::NEG_Y),
            (self.front, Vec3::Z),
            (self.back, Vec3::NEG_Z),
            (self.left, Vec3::NEG_X),
            (self.right, Vec3::X),
        ]
        .into_iter()
        .filter_map(|(visible, normal)| visible.then_some(normal))
    }
}

/// Unit cube centered on the origin, 6 non-indexed vertices per visible face.
///
/// `uv_offset` shifts every texture coordinate, for atlas lookups.
pub fn cube_mesh(faces: CubeFaces, uv_offset: [f32; 2]) -> MeshData {
    let mut mesh = MeshData::default();
    let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
    for normal in faces.visible() {
        // u/v span the face so that u x v points along the normal
        let u = if normal.y != 0.0 { Vec3::X } else { Vec3::Y.cross(normal) };
        let v = normal.cross(u);
        for [s, t] in corners {
            let p = normal * 0.5 + u * (s - 0.5) + v * (t - 0.5);
            mesh.vertices.push(p.to_array());
            mesh.uvs.push([s + uv_offset[0], t + uv_offset[1]]);
            mesh.normals.push(normal.to_array());
        }
    }
    mesh
}

/// Quad in the XY plane spanning `±width` by `±height`.
pub fn plane_mesh(width: f32, height: f32) -> MeshData {
    let (w, h) = (width, height);
    MeshData {
        vertices: vec![
            [-w, -h, 0.0],
            [w, -h, 0.0],
            [w, h, 0.0],
            [w, h, 0.0],
            [-w, h, 0.0],
            [-w, -h, 0.0],
        ],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 6],
        indices: Vec::new(),
    }
}

/// Line grid on the XZ plane, `count` cells of `size` across. The center
/// lines are tinted by axis.
pub fn grid_mesh(size: f32, count: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = count as i32 / 2;
    let extent = size * half as f32;
    for x in -half..=half {
        let color = if x == 0 { GRID_X_AXIS_COLOR } else { GRID_COLOR };
        let x = size * x as f32;
        mesh.vertices.extend([[x, 0.0, extent], [x, 0.0, -extent]]);
        mesh.uvs.extend([[0.0, 0.0]; 2]);
        mesh.normals.extend([color; 2]);
    }
    for z in -half..=half {
        let color = if z == 0 { GRID_Z_AXIS_COLOR } else { GRID_COLOR };
        let z = size * z as f32;
        mesh.vertices.extend([[extent, 0.0, z], [-extent, 0.0, z]]);
        mesh.uvs.extend([[0.0, 0.0]; 2]);
        mesh.normals.extend([color; 2]);
    }
    mesh
}

/// Axis cross of three lines through `center`, `10 * scale` long each way.
pub fn guide_mesh(center: Vec3, scale: f32) -> MeshData {
    let s = if scale > 0.0 { scale * 10.0 } else { 10.0 };
    let Vec3 { x, y, z } = center;
    MeshData {
        vertices: vec![
            [x, y, z + s],
            [x, y, z - s],
            [x, y + s, z],
            [x, y - s, z],
            [x + s, y, z],
            [x - s, y, z],
        ],
        uvs: vec![[0.0, 1.0]; 6],
        normals: vec![
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ],
        indices: Vec::new(),
    }
}

/// Polyline through `points`, drawn as a line strip.
pub fn vector_mesh(points: &[Vec3], color: [f32; 3]) -> MeshData {
    MeshData {
        vertices: points.iter().map(|p| p.to_array()).collect(),
        uvs: vec![[0.0, 0.0]; points.len()],
        normals: vec![color; points.len()],
        indices: Vec::new(),
    }
}

/// Merge meshes into one, baking each part's model matrix into its
/// positions.
pub fn group_mesh(parts: &[(MeshData, Mat4)]) -> Result<MeshData, AssetError> {
    let mut merged = MeshData::default();
    for (mesh, model) in parts {
        let mut baked = mesh.clone();
        for v in baked.vertices.iter_mut() {
            *v = model.transform_point3(Vec3::from_array(*v)).to_array();
        }
        merged.append(&baked)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_spans_hitbox() {
        let mesh = box_mesh(&Hitbox::from_array([2.0, 1.0, -2.0, -1.0, 0.5]), HITBOX_COLOR);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.indices.len(), 24);
        assert!(mesh.validate().is_ok());
        assert!(mesh.vertices.contains(&[-1.0, 2.0, 0.5]));
        assert!(mesh.vertices.contains(&[1.0, -2.0, -0.5]));
    }

    #[test]
    fn cube_face_visibility() {
        assert_eq!(cube_mesh(CubeFaces::all(), [0.0, 0.0]).vertex_count(), 36);

        let mut faces = CubeFaces::none();
        assert!(faces.is_invisible());
        faces.top = true;
        let mesh = cube_mesh(faces, [0.0, 0.0]);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.vertices.iter().all(|v| v[1] == 0.5));
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let mesh = cube_mesh(CubeFaces::all(), [0.0, 0.0]);
        for tri in mesh.vertices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(Vec3::from_array);
            let n = (b - a).cross(c - a).normalize();
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "{tri:?}");
        }
    }

    #[test]
    fn grid_line_count() {
        let mesh = grid_mesh(1.0, 20);
        // 21 lines per axis, 2 vertices each
        assert_eq!(mesh.vertex_count(), 84);
        assert!(mesh.normals.contains(&GRID_X_AXIS_COLOR));
        assert!(mesh.normals.contains(&GRID_Z_AXIS_COLOR));
    }

    #[test]
    fn group_bakes_transforms() {
        let a = plane_mesh(1.0, 1.0);
        let b = box_mesh(&Hitbox::from_array([1.0, 1.0, -1.0, -1.0, 1.0]), HITBOX_COLOR);
        let merged = group_mesh(&[
            (a, Mat4::IDENTITY),
            (b, Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        ])
        .map_err(|e| e.to_string());
        let merged = merged.as_ref().map(|m| (m.vertex_count(), m.indices[0], m.vertices[6][0]));
        // box indices are offset past the plane's 6 vertices
        assert_eq!(merged, Ok((14, 6, 9.0)));
    }
}
