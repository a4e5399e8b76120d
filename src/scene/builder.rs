// scene/builder.rs
// Fluent helper over hecs::EntityBuilder

use hecs::World;

use super::components::*;
use crate::asset::{Handle, MeshData};
use crate::renderer::{Material, RenderData};
use crate::scene::Transform;

pub struct EntityBuilder<'w> {
    world: &'w mut World,
    builder: hecs::EntityBuilder,
}

impl<'w> EntityBuilder<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self {
            world,
            builder: hecs::EntityBuilder::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_world_transform(mut self, transform: Transform) -> Self {
        self.builder.add(WorldTransform(transform));
        self
    }

    /// Render record with a single pass using `material`
    pub fn with_mesh(self, mesh: Handle<MeshData>, material: Material) -> Self {
        self.with_render_data(RenderData::new(mesh, material))
    }

    pub fn with_render_data(mut self, render_data: RenderData) -> Self {
        self.builder.add(render_data);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.builder.add(Enabled(enabled));
        self
    }

    pub fn spawn(&mut self) -> hecs::Entity {
        self.world.spawn(self.builder.build())
    }
}
