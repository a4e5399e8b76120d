// scene/scene.rs
use super::builder::EntityBuilder;
use super::components::*;
use crate::asset::{Assets, Handle, MeshData};
use crate::renderer::{BatchId, Material, RenderData};
use crate::scene::Transform;
use glam::Mat4;
use hecs::{Entity, World};

/// Object model the batcher reads members from.
pub struct Scene {
    pub world: World,
    pub assets: Assets,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            assets: Assets::default(),
        }
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> Handle<MeshData> {
        self.assets.meshes.insert(mesh)
    }

    pub fn builder(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(&mut self.world)
    }

    /// Spawns an enabled drawable with one pass.
    pub fn spawn_drawable(
        &mut self,
        mesh: Handle<MeshData>,
        material: Material,
        transform: Transform,
    ) -> Entity {
        self.builder()
            .with_transform(transform)
            .with_mesh(mesh, material)
            .enabled(true)
            .spawn()
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }

    /// Toggles the owning object.
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) -> bool {
        if let Ok(mut flag) = self.world.get::<&mut Enabled>(entity) {
            flag.0 = enabled;
            return true;
        }
        self.world.insert_one(entity, Enabled(enabled)).is_ok()
    }

    /// Toggles only the render record, leaving the owner untouched.
    pub fn set_render_enabled(&mut self, entity: Entity, enabled: bool) -> bool {
        match self.world.get::<&mut RenderData>(entity) {
            Ok(mut render_data) => {
                render_data.enabled = enabled;
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> bool {
        if let Ok(mut local) = self.world.get::<&mut TransformComponent>(entity) {
            local.0 = transform;
            if let Ok(mut world) = self.world.get::<&mut WorldTransform>(entity) {
                world.0 = transform;
            }
            return true;
        }
        self.world
            .insert_one(entity, TransformComponent(transform))
            .is_ok()
    }

    pub fn render_data(&self, entity: Entity) -> Option<hecs::Ref<'_, RenderData>> {
        self.world.get::<&RenderData>(entity).ok()
    }

    pub fn render_data_mut(&self, entity: Entity) -> Option<hecs::RefMut<'_, RenderData>> {
        self.world.get::<&mut RenderData>(entity).ok()
    }

    /// Geometry of the entity's render record, if both exist.
    pub fn mesh_of(&self, entity: Entity) -> Option<&MeshData> {
        let handle = self.render_data(entity)?.mesh;
        self.assets.meshes.get(handle)
    }

    pub fn batch_of(&self, entity: Entity) -> Option<BatchId> {
        self.render_data(entity)?.batch()
    }

    /// World matrix of the entity, identity when it has no transform at all.
    pub fn model_matrix(&self, entity: Entity) -> Mat4 {
        if let Ok(world) = self.world.get::<&WorldTransform>(entity) {
            return world.0.matrix();
        }
        match self.world.get::<&TransformComponent>(entity) {
            Ok(local) => local.0.matrix(),
            Err(_) => Mat4::IDENTITY,
        }
    }

    pub fn owner_enabled(&self, entity: Entity) -> bool {
        self.world
            .get::<&Enabled>(entity)
            .map(|flag| flag.0)
            .unwrap_or(true)
    }

    /// True when the entity still exists and both it and its render record are enabled.
    pub fn is_renderable(&self, entity: Entity) -> bool {
        let render_enabled = match self.render_data(entity) {
            Some(render_data) => render_data.enabled,
            None => return false,
        };
        render_enabled && self.owner_enabled(entity)
    }

    pub fn name_of(&self, entity: Entity) -> Option<String> {
        self.world
            .get::<&Name>(entity)
            .ok()
            .map(|name| name.0.clone())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
