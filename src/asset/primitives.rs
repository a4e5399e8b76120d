use super::MeshData;
use glam::{Vec2, Vec3};

/// Single triangle in the XY plane.
pub fn triangle_mesh() -> MeshData {
    MeshData::new(
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
        ],
        vec![0, 1, 2],
    )
    .with_normals(vec![Vec3::Z; 3])
    .with_tex_coords(vec![
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.5, 0.0),
    ])
}

/// Unit quad in the XY plane, two triangles.
pub fn quad_mesh() -> MeshData {
    MeshData::new(
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
    .with_normals(vec![Vec3::Z; 4])
    .with_tex_coords(vec![
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ])
}

pub fn cube_mesh() -> MeshData {
    // (normal, u axis, v axis) per face
    let faces = [
        (Vec3::X, Vec3::Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::Y),
    ];
    let corners = [
        (-0.5, -0.5, Vec2::new(0.0, 1.0)),
        (-0.5, 0.5, Vec2::new(0.0, 0.0)),
        (0.5, 0.5, Vec2::new(1.0, 0.0)),
        (0.5, -0.5, Vec2::new(1.0, 1.0)),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut tex_coords = Vec::with_capacity(24);

    for (normal, u, v) in faces {
        for (du, dv, uv) in corners {
            vertices.push(normal * 0.5 + u * du + v * dv);
            normals.push(normal);
            tex_coords.push(uv);
        }
    }

    let indices = (0..6u16)
        .flat_map(|f| {
            let o = f * 4;
            [o, o + 1, o + 2, o, o + 2, o + 3]
        })
        .collect();

    MeshData::new(vertices, indices)
        .with_normals(normals)
        .with_tex_coords(tex_coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts_look_right() {
        let cube = cube_mesh();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.normals.len(), 24);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertex_count()));
    }

    #[test]
    fn cube_vertices_lie_on_their_face() {
        let cube = cube_mesh();
        for (pos, normal) in cube.vertices.iter().zip(&cube.normals) {
            assert!((pos.dot(*normal) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn quad_and_triangle_have_per_vertex_attributes() {
        for mesh in [quad_mesh(), triangle_mesh()] {
            assert_eq!(mesh.tex_coords.len(), mesh.vertex_count());
            assert_eq!(mesh.normals.len(), mesh.vertex_count());
        }
    }
}
