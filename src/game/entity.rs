use super::{
    audio::AudioPlayer,
    collision::{BoxCollider, Collision},
    math::Vector2F,
    physics::Rigidbody,
    world::World,
};
use crate::rendering::{
    camera::Camera,
    renderer::Drawable,
};

/// Generational index, a destroyed entity's id never resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Tag for the closed set of component payloads, used by typed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Plain,
    Collider,
    Rigidbody,
    Drawable,
    Camera,
    AudioPlayer,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Plain => "plain",
            ComponentKind::Collider => "collider",
            ComponentKind::Rigidbody => "rigidbody",
            ComponentKind::Drawable => "drawable",
            ComponentKind::Camera => "camera",
            ComponentKind::AudioPlayer => "audio player",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum Component {
    Plain,
    Collider(BoxCollider),
    Rigidbody(Rigidbody),
    Drawable(Drawable),
    Camera(Camera),
    AudioPlayer(AudioPlayer),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Plain => ComponentKind::Plain,
            Component::Collider(_) => ComponentKind::Collider,
            Component::Rigidbody(_) => ComponentKind::Rigidbody,
            Component::Drawable(_) => ComponentKind::Drawable,
            Component::Camera(_) => ComponentKind::Camera,
            Component::AudioPlayer(_) => ComponentKind::AudioPlayer,
        }
    }
}

/// Per-entity logic plugged into the frame loop.
///
/// Hooks get the whole world and may create or destroy entities, including
/// `me`. While a hook runs, the behavior is detached from its entity, so hooks
/// fired on `me` from inside that hook are skipped.
pub trait Behavior {
    fn update(&mut self, _world: &mut World, _me: EntityId) {}

    fn on_collision_enter(&mut self, _world: &mut World, _me: EntityId, _collision: Collision) {}

    fn on_collision_stay(&mut self, _world: &mut World, _me: EntityId, _collision: Collision) {}

    /// `other` may already be destroyed.
    fn on_collision_exit(&mut self, _world: &mut World, _me: EntityId, _other: EntityId) {}
}

pub struct Entity {
    pub(crate) position: Vector2F,
    pub(crate) scale: Vector2F,
    pub(crate) enabled: bool,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) tag: Option<String>,
    pub(crate) component: Component,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl Entity {
    pub(crate) fn new(desc: EntityDesc, parent: Option<EntityId>, component: Component) -> Self {
        Self {
            position: desc.position,
            scale: desc.scale,
            enabled: desc.enabled,
            parent,
            children: vec![],
            tag: desc.tag,
            component,
            behavior: desc.behavior,
        }
    }

    pub fn position(&self) -> Vector2F {
        self.position
    }

    pub fn scale(&self) -> Vector2F {
        self.scale
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn kind(&self) -> ComponentKind {
        self.component.kind()
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("position", &self.position)
            .field("scale", &self.scale)
            .field("enabled", &self.enabled)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("tag", &self.tag)
            .field("component", &self.component)
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}

/// Everything needed to create a plain entity.
pub struct EntityDesc {
    pub position: Vector2F,
    pub scale: Vector2F,
    pub enabled: bool,
    pub tag: Option<String>,
    pub behavior: Option<Box<dyn Behavior>>,
}

impl EntityDesc {
    pub fn new(position: Vector2F, scale: Vector2F) -> Self {
        Self {
            position,
            scale,
            enabled: true,
            tag: None,
            behavior: None,
        }
    }

    pub fn with_tag<S: AsRef<str>>(mut self, tag: S) -> Self {
        self.tag = Some(tag.as_ref().to_string());
        self
    }

    pub fn with_behavior<B: Behavior + 'static>(mut self, behavior: B) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self::new(Vector2F::ZERO, Vector2F::ONE)
    }
}
