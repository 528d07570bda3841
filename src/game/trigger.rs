use std::collections::BTreeSet;

use super::{
    collision::Collision,
    entity::{Behavior, EntityDesc, EntityId},
    math::Vector2F,
    world::{World, WorldError},
};

/// Reacts to tagged entities entering or leaving a trigger region.
///
/// `occupants` is the number of matching entities inside the region after the
/// event.
pub trait TriggerHandler {
    fn on_enter(&mut self, _world: &mut World, _trigger: EntityId, _other: EntityId, _occupants: usize) {}

    fn on_exit(&mut self, _world: &mut World, _trigger: EntityId, _other: EntityId, _occupants: usize) {}
}

/// Region behavior watching entities with a given tag.
pub struct Trigger<H> {
    tag: String,
    handler: H,
    occupants: BTreeSet<EntityId>,
}

impl<H: TriggerHandler> Trigger<H> {
    pub fn new<S: AsRef<str>>(tag: S, handler: H) -> Self {
        Self {
            tag: tag.as_ref().to_string(),
            handler,
            occupants: BTreeSet::new(),
        }
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }
}

impl<H: TriggerHandler> Behavior for Trigger<H> {
    fn on_collision_enter(&mut self, world: &mut World, me: EntityId, collision: Collision) {
        if world.tag_of(collision.other) != Some(self.tag.as_str()) {
            return;
        }
        if self.occupants.insert(collision.other) {
            log::debug!("{} entered trigger {me}", collision.other);
            self.handler.on_enter(world, me, collision.other, self.occupants.len());
        }
    }

    // Tracked by id, the leaving entity may already be gone
    fn on_collision_exit(&mut self, world: &mut World, me: EntityId, other: EntityId) {
        if self.occupants.remove(&other) {
            log::debug!("{other} left trigger {me}");
            self.handler.on_exit(world, me, other, self.occupants.len());
        }
    }
}

impl World {
    /// Creates an invisible region of `size` centered on `position` that
    /// reports entities tagged `tag` to `handler`.
    pub fn spawn_trigger<S, H>(&mut self, parent: EntityId, position: Vector2F, size: Vector2F, tag: S, handler: H) -> Result<EntityId, WorldError>
    where
        S: AsRef<str>,
        H: TriggerHandler + 'static
    {
        let desc = EntityDesc::new(position, size).with_behavior(Trigger::new(tag, handler));
        let trigger = self.create_entity(parent, desc)?;
        self.add_collider(trigger)?;
        Ok(trigger)
    }
}
