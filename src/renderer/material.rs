// renderer/material.rs
use bitflags::bitflags;

/// Shader family a material is rendered with.
///
/// Only [`ShaderType::Texture`] understands the per-vertex matrix index that
/// merged geometry relies on; everything else has to be drawn on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderType {
    #[default]
    Texture,
    Lit,
    Cubemap,
    Custom(u32),
}

impl ShaderType {
    pub fn supports_merged_buffers(self) -> bool {
        matches!(self, Self::Texture)
    }
}

bitflags! {
    /// Fixed-function state carried along with a draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawFlags: u32 {
        const DEPTH_TEST = 1 << 0;
        const DEPTH_WRITE = 1 << 1;
        const CAST_SHADOWS = 1 << 2;
        const RECEIVE_SHADOWS = 1 << 3;
        const ALPHA_BLEND = 1 << 4;
        const DOUBLE_SIDED = 1 << 5;
    }
}

impl Default for DrawFlags {
    fn default() -> Self {
        Self::DEPTH_TEST | Self::DEPTH_WRITE | Self::CAST_SHADOWS | Self::RECEIVE_SHADOWS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    pub base_color: [u8; 4],
    pub shader_type: ShaderType,
}

impl Material {
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            base_color: color,
            shader_type: ShaderType::Texture,
        }
    }

    pub fn with_shader(mut self, shader_type: ShaderType) -> Self {
        self.shader_type = shader_type;
        self
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new([r, g, b, 255])
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn red() -> Self {
        Self::rgb(255, 0, 0)
    }

    pub fn green() -> Self {
        Self::rgb(0, 255, 0)
    }

    pub fn blue() -> Self {
        Self::rgb(0, 0, 255)
    }

    pub fn shader_type(&self) -> ShaderType {
        self.shader_type
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}
