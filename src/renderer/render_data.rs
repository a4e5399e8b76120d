use super::material::{DrawFlags, Material};
use super::pool::BatchId;
use crate::asset::{Handle, MeshData};

/// Per-entity render record.
///
/// Lives as a hecs component on the owning entity. `batch` is only written by
/// [`Batch`](super::Batch) when the entity is admitted or evicted, so it never
/// outlives the membership it describes.
#[derive(Debug, Clone)]
pub struct RenderData {
    pub mesh: Handle<MeshData>,
    pub draw_flags: DrawFlags,
    pub enabled: bool,
    pub batching: bool,
    passes: Vec<Material>,
    batch: Option<BatchId>,
}

impl RenderData {
    pub fn new(mesh: Handle<MeshData>, material: Material) -> Self {
        Self {
            mesh,
            draw_flags: DrawFlags::default(),
            enabled: true,
            batching: true,
            passes: vec![material],
            batch: None,
        }
    }

    pub fn with_pass(mut self, material: Material) -> Self {
        self.passes.push(material);
        self
    }

    pub fn with_draw_flags(mut self, flags: DrawFlags) -> Self {
        self.draw_flags = flags;
        self
    }

    /// Opts the entity out of geometry merging.
    pub fn without_batching(mut self) -> Self {
        self.batching = false;
        self
    }

    /// Material of the first pass; every record has at least one.
    pub fn material(&self) -> Material {
        self.passes[0]
    }

    pub fn passes(&self) -> &[Material] {
        &self.passes
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn uses_merge_compatible_shaders(&self) -> bool {
        self.passes
            .iter()
            .all(|pass| pass.shader_type().supports_merged_buffers())
    }

    /// Batch currently holding this entity, if any.
    pub fn batch(&self) -> Option<BatchId> {
        self.batch
    }

    pub(crate) fn set_batch(&mut self, batch: BatchId) {
        self.batch = Some(batch);
    }

    /// Clears the assignment, but only if it still points at `batch`.
    pub(crate) fn clear_batch(&mut self, batch: BatchId) {
        if self.batch == Some(batch) {
            self.batch = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::material::ShaderType;

    #[test]
    fn any_incompatible_pass_blocks_merging() {
        let data = RenderData::new(Handle::new(0), Material::white());
        assert!(data.uses_merge_compatible_shaders());

        let data = data.with_pass(Material::white().with_shader(ShaderType::Lit));
        assert_eq!(data.pass_count(), 2);
        assert!(!data.uses_merge_compatible_shaders());
    }

    #[test]
    fn clear_batch_ignores_other_assignments() {
        let mut data = RenderData::new(Handle::new(0), Material::white());
        let first = BatchId::new(0, 0);
        let reused = BatchId::new(0, 1);

        data.set_batch(reused);
        data.clear_batch(first);
        assert_eq!(data.batch(), Some(reused));

        data.clear_batch(reused);
        assert_eq!(data.batch(), None);
    }
}
