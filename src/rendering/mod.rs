use crate::game::{
    entity::EntityId,
    math::Rect2I,
};

pub mod camera;
pub mod renderer;

/// Opaque host-side reference to a loaded texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// One texture blit for the host, in the camera's screen space.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub camera: EntityId,
    pub texture: TextureHandle,
    pub depth: i32,
    pub dest: Rect2I,
}
