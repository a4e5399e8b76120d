// scene/mod.rs

pub mod builder;
pub mod components;
pub mod scene;
pub mod transform;

pub use builder::EntityBuilder;
pub use components::{Enabled, Name, TransformComponent, WorldTransform};
pub use scene::Scene;
pub use transform::Transform;
