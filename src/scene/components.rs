// scene/components.rs
// Plain hecs components; render records live in renderer::RenderData

use crate::scene::Transform;

/// Local transform
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// World-space transform, preferred over the local one when present
#[derive(Debug, Clone, Copy)]
pub struct WorldTransform(pub Transform);

/// Enable flag of the owning object. Entities without it count as enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enabled(pub bool);

impl Default for Enabled {
    fn default() -> Self {
        Self(true)
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
