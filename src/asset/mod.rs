pub mod cache;
pub mod handle;
pub mod mesh;
pub mod primitives;

pub use cache::AssetCache;
pub use handle::Handle;
pub use mesh::{Mesh, MeshData, MATRIX_INDEX_ATTRIBUTE, TEXCOORD_ATTRIBUTE};

pub struct Assets {
    pub meshes: AssetCache<MeshData>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            meshes: AssetCache::new(),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
