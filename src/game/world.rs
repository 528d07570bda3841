use super::{
    audio::AudioCommand,
    collision::ColliderRegistry,
    entity::{
        Behavior,
        Component,
        ComponentKind,
        Entity,
        EntityDesc,
        EntityId
    },
    math::Vector2F,
    physics::PhysicsSettings,
};

use crate::rendering::{
    renderer::RenderRegistry,
    DrawCall
};

pub const DEFAULT_WINDOW_SIZE: Vector2F = Vector2F {
    x: 1920.0,
    y: 1080.0
};

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("Entity does not exist")]
    EntityNotExist,

    #[error("Scene root cannot be removed")]
    CannotRemoveRoot,

    #[error("Entity is not a {0} component")]
    NotAComponent(ComponentKind),

    #[error("Collider is used by rigidbody {0}")]
    ColliderInUse(EntityId),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldSettings {
    pub window_size: Vector2F,
    pub physics: PhysicsSettings,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            physics: PhysicsSettings::default(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Arena owning one entity tree together with its collider and drawable registries.
#[derive(Debug)]
pub struct World {
    slots: Vec<Slot>,
    free_indices: Vec<u32>,
    root: EntityId,
    frame: u64,
    pub(crate) colliders: ColliderRegistry,
    pub(crate) renderers: RenderRegistry,
    pub(crate) physics: PhysicsSettings,
    pub(crate) window_size: Vector2F,
    pub(crate) delta_time: f32,
    pub(crate) draw_calls: Vec<DrawCall>,
    pub(crate) audio_commands: Vec<AudioCommand>,
}

impl World {
    pub fn new(settings: WorldSettings) -> Self {
        let mut world = Self {
            slots: vec![],
            free_indices: vec![],
            root: EntityId::new(0, 0),
            frame: 0,
            colliders: ColliderRegistry::default(),
            renderers: RenderRegistry::default(),
            physics: settings.physics,
            window_size: settings.window_size,
            delta_time: 0.0,
            draw_calls: vec![],
            audio_commands: vec![],
        };
        world.root = world.alloc(Entity::new(EntityDesc::default(), None, Component::Plain));
        log::debug!("World created, root {}", world.root);
        world
    }

    fn alloc(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free_indices.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.entity = Some(entity);
                return EntityId::new(index, slot.generation);
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, entity: Some(entity) });
        EntityId::new(index, 0)
    }

    fn free(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index());
        Some(entity)
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn get_entity_by_id(&self, entity_id: EntityId) -> Option<&Entity> {
        self.slots
            .get(entity_id.index() as usize)
            .filter(|slot| slot.generation == entity_id.generation())
            .and_then(|slot| slot.entity.as_ref())
    }

    pub(crate) fn get_entity_by_id_mut(&mut self, entity_id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(entity_id.index() as usize)
            .filter(|slot| slot.generation == entity_id.generation())
            .and_then(|slot| slot.entity.as_mut())
    }

    pub fn is_alive(&self, entity_id: EntityId) -> bool {
        self.get_entity_by_id(entity_id).is_some()
    }

    /// Live entities, the root included.
    pub fn entity_count(&self) -> usize {
        self.slots.len() - self.free_indices.len()
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity
                .as_ref()
                .map(|entity| (EntityId::new(index as u32, slot.generation), entity))
        })
    }

    /// Creates a plain entity under `parent`.
    pub fn create_entity(&mut self, parent: EntityId, desc: EntityDesc) -> Result<EntityId, WorldError> {
        self.spawn(parent, desc, Component::Plain)
    }

    pub(crate) fn spawn(&mut self, parent: EntityId, desc: EntityDesc, component: Component) -> Result<EntityId, WorldError> {
        if !self.is_alive(parent) {
            return Err(WorldError::EntityNotExist);
        }
        let kind = component.kind();
        let entity_id = self.alloc(Entity::new(desc, Some(parent), component));
        if let Some(parent_entity) = self.get_entity_by_id_mut(parent) {
            parent_entity.children.push(entity_id);
        }
        log::debug!("Created {kind} entity {entity_id} under {parent}");
        Ok(entity_id)
    }

    /// Creates a component node that shares its owner's transform.
    pub(crate) fn attach(&mut self, owner: EntityId, component: Component) -> Result<EntityId, WorldError> {
        let owner_entity = self.get_entity_by_id(owner).ok_or(WorldError::EntityNotExist)?;
        let desc = EntityDesc::new(owner_entity.position, owner_entity.scale);
        self.spawn(owner, desc, component)
    }

    /// Destroys the entity and its whole subtree, deregistering colliders and
    /// drawables before returning.
    pub fn remove_entity(&mut self, entity_id: EntityId) -> Result<(), WorldError> {
        if entity_id == self.root {
            return Err(WorldError::CannotRemoveRoot);
        }
        if let Some(rigidbody) = self.rigidbody_using(entity_id) {
            return Err(WorldError::ColliderInUse(rigidbody));
        }
        let parent = self.get_entity_by_id(entity_id)
            .ok_or(WorldError::EntityNotExist)?
            .parent;
        if let Some(parent_entity) = parent.and_then(|p| self.get_entity_by_id_mut(p)) {
            parent_entity.children.retain(|child| *child != entity_id);
        }

        let doomed = self.subtree(entity_id);
        let released: Vec<_> = doomed
            .into_iter()
            .filter_map(|id| self.free(id).map(|entity| (id, entity)))
            .collect();
        log::debug!("Removed entity {entity_id} with {} nodes", released.len());

        for (id, entity) in released {
            match entity.component {
                Component::Collider(collider) => self.release_collider(id, entity.parent, collider),
                Component::Drawable(_) => self.renderers.remove(id),
                _ => {}
            }
        }
        Ok(())
    }

    /// Destroys `child` if it is an immediate child of `parent`.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), WorldError> {
        if !self.is_alive(parent) {
            return Err(WorldError::EntityNotExist);
        }
        if self.parent_of(child) == Some(parent) {
            self.remove_entity(child)?;
        }
        Ok(())
    }

    /// Destroys the first immediate child of the given kind, if any.
    pub fn remove_component(&mut self, owner: EntityId, kind: ComponentKind) -> Result<(), WorldError> {
        if !self.is_alive(owner) {
            return Err(WorldError::EntityNotExist);
        }
        if let Some(component) = self.get_component(owner, kind) {
            self.remove_entity(component)?;
        }
        Ok(())
    }

    /// Pre-order ids of the subtree rooted at `entity_id`.
    pub fn subtree(&self, entity_id: EntityId) -> Vec<EntityId> {
        let mut nodes = vec![];
        let mut stack = vec![entity_id];
        while let Some(id) = stack.pop() {
            if let Some(entity) = self.get_entity_by_id(id) {
                nodes.push(id);
                stack.extend(entity.children.iter().rev());
            }
        }
        nodes
    }

    pub fn set_enabled(&mut self, entity_id: EntityId, enabled: bool) -> Result<(), WorldError> {
        if !self.is_alive(entity_id) {
            return Err(WorldError::EntityNotExist);
        }
        for id in self.subtree(entity_id) {
            if let Some(entity) = self.get_entity_by_id_mut(id) {
                entity.enabled = enabled;
            }
        }
        Ok(())
    }

    /// Moves the entity and displaces every descendant by the same amount.
    pub fn set_position(&mut self, entity_id: EntityId, position: Vector2F) -> Result<(), WorldError> {
        let current = self.position(entity_id).ok_or(WorldError::EntityNotExist)?;
        let displacement = position - current;
        for id in self.subtree(entity_id) {
            if let Some(entity) = self.get_entity_by_id_mut(id) {
                if id == entity_id {
                    entity.position = position;
                } else {
                    entity.position += displacement;
                }
            }
        }
        Ok(())
    }

    /// Rescales the entity and multiplies every descendant's scale by the per-axis ratio.
    pub fn set_scale(&mut self, entity_id: EntityId, scale: Vector2F) -> Result<(), WorldError> {
        let current = self.scale(entity_id).ok_or(WorldError::EntityNotExist)?;
        let ratio = scale.hadamard_div(current);
        for id in self.subtree(entity_id) {
            if let Some(entity) = self.get_entity_by_id_mut(id) {
                if id == entity_id {
                    entity.scale = scale;
                } else {
                    entity.scale = entity.scale.hadamard(ratio);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn move_entity(&mut self, entity_id: EntityId, position: Vector2F) {
        if let Err(e) = self.set_position(entity_id, position) {
            log::warn!("Could not move {entity_id}: {e}");
        }
    }

    pub fn position(&self, entity_id: EntityId) -> Option<Vector2F> {
        self.get_entity_by_id(entity_id).map(Entity::position)
    }

    pub fn scale(&self, entity_id: EntityId) -> Option<Vector2F> {
        self.get_entity_by_id(entity_id).map(Entity::scale)
    }

    /// `false` for destroyed entities.
    pub fn is_enabled(&self, entity_id: EntityId) -> bool {
        self.get_entity_by_id(entity_id).is_some_and(Entity::is_enabled)
    }

    pub fn parent_of(&self, entity_id: EntityId) -> Option<EntityId> {
        self.get_entity_by_id(entity_id).and_then(Entity::parent)
    }

    pub fn children_of(&self, entity_id: EntityId) -> &[EntityId] {
        self.get_entity_by_id(entity_id)
            .map(Entity::children)
            .unwrap_or(&[])
    }

    pub fn tag_of(&self, entity_id: EntityId) -> Option<&str> {
        self.get_entity_by_id(entity_id).and_then(Entity::tag)
    }

    pub fn kind_of(&self, entity_id: EntityId) -> Option<ComponentKind> {
        self.get_entity_by_id(entity_id).map(Entity::kind)
    }

    /// First immediate child of `owner` with the given kind.
    pub fn get_component(&self, owner: EntityId, kind: ComponentKind) -> Option<EntityId> {
        self.children_of(owner)
            .iter()
            .copied()
            .find(|child| self.kind_of(*child) == Some(kind))
    }

    pub fn get_components(&self, owner: EntityId, kind: ComponentKind) -> Vec<EntityId> {
        self.children_of(owner)
            .iter()
            .copied()
            .filter(|child| self.kind_of(*child) == Some(kind))
            .collect()
    }

    pub fn children_with_tag<S: AsRef<str>>(&self, parent: EntityId, tag: S) -> Vec<EntityId> {
        self.children_of(parent)
            .iter()
            .copied()
            .filter(|child| self.tag_of(*child) == Some(tag.as_ref()))
            .collect()
    }

    pub fn set_behavior<B: Behavior + 'static>(&mut self, entity_id: EntityId, behavior: B) -> Result<(), WorldError> {
        let entity = self.get_entity_by_id_mut(entity_id).ok_or(WorldError::EntityNotExist)?;
        entity.behavior = Some(Box::new(behavior));
        Ok(())
    }

    /// Runs `f` with the entity's behavior detached, then reattaches it if the
    /// entity survived.
    pub(crate) fn with_behavior<F>(&mut self, entity_id: EntityId, f: F)
    where
        F: FnOnce(&mut dyn Behavior, &mut World)
    {
        let Some(mut behavior) = self.get_entity_by_id_mut(entity_id).and_then(|e| e.behavior.take()) else {
            return;
        };
        f(behavior.as_mut(), self);
        if let Some(entity) = self.get_entity_by_id_mut(entity_id) {
            if entity.behavior.is_none() {
                entity.behavior = Some(behavior);
            }
        }
    }

    /// Enabled nodes reachable from the root through enabled parents, pre-order.
    pub(crate) fn active_nodes(&self) -> Vec<EntityId> {
        let mut active = vec![];
        if !self.is_enabled(self.root) {
            return active;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            active.push(id);
            stack.extend(
                self.children_of(id)
                    .iter()
                    .rev()
                    .filter(|child| self.is_enabled(**child))
            );
        }
        active
    }

    /// Advances the world by one frame: collisions, then logic and physics, then rendering.
    pub fn tick(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
        self.frame += 1;
        log::trace!("World tick {}, dt={}", self.frame, delta_time);

        if !self.is_enabled(self.root) {
            self.draw_calls.clear();
            return;
        }

        let active = self.active_nodes();
        self.detect_collisions(&active);

        let root = self.root;
        self.update_node(root);
        self.update_children(root);

        let active = self.active_nodes();
        self.dispatch_render(&active);
    }

    fn update_node(&mut self, entity_id: EntityId) {
        match self.kind_of(entity_id) {
            Some(ComponentKind::Rigidbody) => self.step_rigidbody(entity_id),
            Some(ComponentKind::Drawable) => self.step_animation(entity_id),
            Some(ComponentKind::AudioPlayer) => self.step_audio_player(entity_id),
            Some(_) => {},
            None => return,
        }
        if self.is_enabled(entity_id) {
            self.with_behavior(entity_id, |behavior, world| behavior.update(world, entity_id));
        }
    }

    fn update_children(&mut self, entity_id: EntityId) {
        let mut index = 0;
        while let Some(child) = self.children_of(entity_id).get(index).copied() {
            if self.is_enabled(child) {
                self.update_node(child);
            }
            if self.is_enabled(child) {
                self.update_children(child);
            }
            // If the child or an earlier sibling left, the next child already sits at `index`
            if self.children_of(entity_id).get(index) == Some(&child) {
                index += 1;
            }
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn window_size(&self) -> Vector2F {
        self.window_size
    }

    pub fn set_window_size(&mut self, window_size: Vector2F) {
        self.window_size = window_size;
        for camera in self.cameras() {
            self.refresh_viewport(camera);
        }
    }

    pub fn physics(&self) -> &PhysicsSettings {
        &self.physics
    }

    pub fn set_gravity(&mut self, gravity: Vector2F) {
        self.physics.gravity = gravity;
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draw_calls)
    }

    pub fn take_audio_commands(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.audio_commands)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldSettings::default())
    }
}
