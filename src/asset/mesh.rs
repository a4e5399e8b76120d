use glam::{Vec2, Vec3};
use std::collections::BTreeMap;

/// Attribute name the combined texture coordinates are published under.
pub const TEXCOORD_ATTRIBUTE: &str = "a_texcoord";
/// Attribute name of the per-vertex transform slot index.
pub const MATRIX_INDEX_ATTRIBUTE: &str = "a_matrix_index";

/// Source geometry of a single drawable, in its local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u16>) -> Self {
        Self {
            vertices,
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<Vec2>) -> Self {
        self.tex_coords = tex_coords;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// True when every index addresses one of this mesh's vertices.
    pub fn indices_in_range(&self) -> bool {
        let vertex_count = self.vertex_count();
        self.indices
            .iter()
            .all(|&index| usize::from(index) < vertex_count)
    }
}

/// Mesh assembled from a batch's combined buffers.
///
/// Positions, normals and indices are fixed channels; everything else is
/// stored as a named attribute so the submission path can bind it by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u16>,
    vec2_attributes: BTreeMap<String, Vec<Vec2>>,
    float_attributes: BTreeMap<String, Vec<f32>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_vertices(&mut self, vertices: &[Vec3]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
    }

    pub fn set_normals(&mut self, normals: &[Vec3]) {
        self.normals.clear();
        self.normals.extend_from_slice(normals);
    }

    pub fn set_indices(&mut self, indices: &[u16]) {
        self.indices.clear();
        self.indices.extend_from_slice(indices);
    }

    pub fn set_vec2_vector(&mut self, name: &str, values: &[Vec2]) {
        let slot = self.vec2_attributes.entry(name.to_owned()).or_default();
        slot.clear();
        slot.extend_from_slice(values);
    }

    pub fn set_float_vector(&mut self, name: &str, values: impl IntoIterator<Item = f32>) {
        let slot = self.float_attributes.entry(name.to_owned()).or_default();
        slot.clear();
        slot.extend(values);
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vec2_vector(&self, name: &str) -> Option<&[Vec2]> {
        self.vec2_attributes.get(name).map(Vec::as_slice)
    }

    pub fn float_vector(&self, name: &str) -> Option<&[f32]> {
        self.float_attributes.get(name).map(Vec::as_slice)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Raw position data, ready to be copied into a vertex buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn vec2_bytes(&self, name: &str) -> Option<&[u8]> {
        self.vec2_vector(name).map(bytemuck::cast_slice)
    }

    pub fn float_bytes(&self, name: &str) -> Option<&[u8]> {
        self.float_vector(name).map(bytemuck::cast_slice)
    }

    /// Empties every channel while keeping allocations around for reuse.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
        for values in self.vec2_attributes.values_mut() {
            values.clear();
        }
        for values in self.float_attributes.values_mut() {
            values.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_in_range_checks_against_own_vertices() {
        let mesh = MeshData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        assert!(mesh.indices_in_range());

        let broken = MeshData::new(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 2]);
        assert!(!broken.indices_in_range());
        assert!(MeshData::default().indices_in_range());
    }

    #[test]
    fn named_attributes_are_replaced_not_appended() {
        let mut mesh = Mesh::new();
        mesh.set_vec2_vector(TEXCOORD_ATTRIBUTE, &[Vec2::ZERO, Vec2::ONE]);
        mesh.set_vec2_vector(TEXCOORD_ATTRIBUTE, &[Vec2::X]);
        assert_eq!(mesh.vec2_vector(TEXCOORD_ATTRIBUTE), Some(&[Vec2::X][..]));

        mesh.set_float_vector(MATRIX_INDEX_ATTRIBUTE, [0.0, 1.0, 1.0]);
        assert_eq!(mesh.float_vector(MATRIX_INDEX_ATTRIBUTE).map(<[f32]>::len), Some(3));
        assert!(mesh.float_vector("a_missing").is_none());
    }

    #[test]
    fn byte_views_match_element_sizes() {
        let mut mesh = Mesh::new();
        mesh.set_vertices(&[Vec3::ZERO, Vec3::ONE]);
        mesh.set_indices(&[0, 1, 0]);
        assert_eq!(mesh.vertex_bytes().len(), 2 * 12);
        assert_eq!(mesh.index_bytes().len(), 3 * 2);
    }

    #[test]
    fn clear_keeps_attribute_names() {
        let mut mesh = Mesh::new();
        mesh.set_vertices(&[Vec3::ZERO]);
        mesh.set_float_vector(MATRIX_INDEX_ATTRIBUTE, [0.0]);
        mesh.clear();
        assert!(mesh.is_empty());
        assert_eq!(mesh.float_vector(MATRIX_INDEX_ATTRIBUTE), Some(&[][..]));
    }
}
