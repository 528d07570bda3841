use std::collections::{BTreeMap, HashSet};

use super::{
    entity::{Component, ComponentKind, EntityId},
    math::{Rect2F, Vector2F},
    world::{World, WorldError},
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Collision {
    /// Owner of the touching collider.
    pub other: EntityId,
    pub other_collider: EntityId,
    pub point: Vector2F,
}

#[derive(Debug, Default)]
pub struct BoxCollider {
    bounding_box: Rect2F,
    collisions: BTreeMap<EntityId, Collision>,
}

impl BoxCollider {
    /// Box centered on the owner's position, sized by its scale.
    pub fn bounding_box(&self) -> Rect2F {
        self.bounding_box
    }

    pub fn get_collisions(&self) -> Vec<Collision> {
        self.collisions.values().copied().collect()
    }

    pub fn collision_with(&self, other_owner: EntityId) -> Option<&Collision> {
        self.collisions.get(&other_owner)
    }

    pub fn is_touching(&self, other_owner: EntityId) -> bool {
        self.collisions.contains_key(&other_owner)
    }

    pub fn collision_count(&self) -> usize {
        self.collisions.len()
    }

    pub fn check_collision(&self, other: &BoxCollider) -> Option<Vector2F> {
        corner_contact(&self.bounding_box, &other.bounding_box)
    }
}

/// Returns the first corner of `a` inside `b`, or else the first corner of `b`
/// inside `a`. Corners are visited top-left, top-right, bottom-right, bottom-left
/// and edges count as inside.
///
/// Two boxes crossing each other without any corner inside the other are not
/// reported.
pub fn corner_contact(a: &Rect2F, b: &Rect2F) -> Option<Vector2F> {
    a.corners()
        .into_iter()
        .find(|corner| b.contains_inclusive(corner))
        .or_else(|| b.corners().into_iter().find(|corner| a.contains_inclusive(corner)))
}

/// Flat list of every live collider in a world, in registration order.
#[derive(Debug, Default)]
pub struct ColliderRegistry {
    colliders: Vec<EntityId>,
}

impl ColliderRegistry {
    pub fn add(&mut self, collider: EntityId) {
        self.colliders.push(collider);
    }

    pub fn remove(&mut self, collider: EntityId) {
        if let Some(position) = self.colliders.iter().position(|c| *c == collider) {
            self.colliders.remove(position);
        }
    }

    pub fn contains(&self, collider: EntityId) -> bool {
        self.colliders.contains(&collider)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.colliders.iter().copied()
    }
}

impl World {
    /// Adds a box collider component to `owner` and registers it.
    pub fn add_collider(&mut self, owner: EntityId) -> Result<EntityId, WorldError> {
        let collider = self.attach(owner, Component::Collider(BoxCollider::default()))?;
        self.colliders.add(collider);
        self.refresh_bounding_box(collider);
        Ok(collider)
    }

    pub fn collider(&self, collider: EntityId) -> Option<&BoxCollider> {
        match self.get_entity_by_id(collider)?.component() {
            Component::Collider(box_collider) => Some(box_collider),
            _ => None,
        }
    }

    fn collider_mut(&mut self, collider: EntityId) -> Option<&mut BoxCollider> {
        match &mut self.get_entity_by_id_mut(collider)?.component {
            Component::Collider(box_collider) => Some(box_collider),
            _ => None,
        }
    }

    /// Collisions of the first collider on `owner`.
    pub fn collisions_of(&self, owner: EntityId) -> Vec<Collision> {
        self.get_component(owner, ComponentKind::Collider)
            .and_then(|collider| self.collider(collider))
            .map(BoxCollider::get_collisions)
            .unwrap_or_default()
    }

    pub fn registered_colliders(&self) -> &ColliderRegistry {
        &self.colliders
    }

    fn refresh_bounding_box(&mut self, collider: EntityId) {
        let Some(owner) = self.parent_of(collider) else {
            return;
        };
        let (Some(center), Some(size)) = (self.position(owner), self.scale(owner)) else {
            return;
        };
        if let Some(box_collider) = self.collider_mut(collider) {
            box_collider.bounding_box = Rect2F::from_center(center, size);
        }
    }

    /// Every active collider tests every other one, so each pair is visited
    /// in both orders per frame.
    pub(crate) fn detect_collisions(&mut self, active: &[EntityId]) {
        let active: Vec<EntityId> = active
            .iter()
            .copied()
            .filter(|id| self.kind_of(*id) == Some(ComponentKind::Collider))
            .collect();
        for collider in active.iter() {
            self.refresh_bounding_box(*collider);
        }
        let active_set: HashSet<EntityId> = active.iter().copied().collect();

        for &a in active.iter() {
            for &b in active.iter() {
                if b == a {
                    continue;
                }
                if !self.is_enabled(a) {
                    break;
                }
                if !self.is_enabled(b) {
                    self.remove_contact(a, b);
                    continue;
                }
                self.evaluate_pair(a, b);
            }

            if !self.is_alive(a) {
                continue;
            }
            let inactive: Vec<EntityId> = self.colliders
                .iter()
                .filter(|c| !active_set.contains(c))
                .collect();
            for b in inactive {
                self.remove_contact(a, b);
            }
        }
    }

    fn evaluate_pair(&mut self, a: EntityId, b: EntityId) {
        let (Some(a_owner), Some(b_owner)) = (self.parent_of(a), self.parent_of(b)) else {
            return;
        };
        if a_owner == b_owner {
            return;
        }
        let contact = match (self.collider(a), self.collider(b)) {
            (Some(a_collider), Some(b_collider)) => a_collider.check_collision(b_collider),
            _ => return,
        };
        match contact {
            Some(point) => self.register_contact(a, a_owner, b, b_owner, point),
            None => self.remove_contact(a, b),
        }
    }

    // Stored contacts keep the point seen on enter.
    fn register_contact(&mut self, a: EntityId, a_owner: EntityId, b: EntityId, b_owner: EntityId, point: Vector2F) {
        let a_sees = Collision { other: b_owner, other_collider: b, point };
        let b_sees = Collision { other: a_owner, other_collider: a, point };

        let already_touching = self.collider(a).is_some_and(|c| c.is_touching(b_owner));
        if !already_touching {
            if let Some(a_collider) = self.collider_mut(a) {
                a_collider.collisions.insert(b_owner, a_sees);
            }
            if let Some(b_collider) = self.collider_mut(b) {
                b_collider.collisions.insert(a_owner, b_sees);
            }
        }

        if already_touching {
            self.with_behavior(a_owner, |behavior, world| behavior.on_collision_stay(world, a_owner, a_sees));
            self.with_behavior(b_owner, |behavior, world| behavior.on_collision_stay(world, b_owner, b_sees));
        } else {
            log::debug!("Collision enter {a_owner} <-> {b_owner} at {point}");
            self.with_behavior(a_owner, |behavior, world| behavior.on_collision_enter(world, a_owner, a_sees));
            self.with_behavior(b_owner, |behavior, world| behavior.on_collision_enter(world, b_owner, b_sees));
        }
    }

    /// Drops the contact between two colliders on both sides, firing exit on
    /// each owner that had it recorded.
    pub(crate) fn remove_contact(&mut self, a: EntityId, b: EntityId) {
        let (Some(a_owner), Some(b_owner)) = (self.parent_of(a), self.parent_of(b)) else {
            return;
        };
        let a_removed = self.collider_mut(a).is_some_and(|c| c.collisions.remove(&b_owner).is_some());
        let b_removed = self.collider_mut(b).is_some_and(|c| c.collisions.remove(&a_owner).is_some());

        if a_removed || b_removed {
            log::debug!("Collision exit {a_owner} <-> {b_owner}");
        }
        if a_removed {
            self.with_behavior(a_owner, |behavior, world| behavior.on_collision_exit(world, a_owner, b_owner));
        }
        if b_removed {
            self.with_behavior(b_owner, |behavior, world| behavior.on_collision_exit(world, b_owner, a_owner));
        }
    }

    /// Deregisters a destroyed collider and ends all of its contacts.
    pub(crate) fn release_collider(&mut self, collider: EntityId, owner: Option<EntityId>, released: BoxCollider) {
        self.colliders.remove(collider);
        let Some(owner) = owner else {
            return;
        };
        for contact in released.collisions.into_values() {
            let peer_removed = self.collider_mut(contact.other_collider)
                .is_some_and(|c| c.collisions.remove(&owner).is_some());
            if peer_removed {
                self.with_behavior(contact.other, |behavior, world| behavior.on_collision_exit(world, contact.other, owner));
            }
            if self.is_alive(owner) {
                self.with_behavior(owner, |behavior, world| behavior.on_collision_exit(world, owner, contact.other));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::game::entity::{Behavior, EntityDesc};

    #[derive(Debug, PartialEq)]
    enum Event {
        Enter(EntityId, Vector2F),
        Stay(EntityId),
        Exit(EntityId),
    }

    struct Recorder(Rc<RefCell<Vec<Event>>>);

    impl Behavior for Recorder {
        fn on_collision_enter(&mut self, _world: &mut World, _me: EntityId, collision: Collision) {
            self.0.borrow_mut().push(Event::Enter(collision.other, collision.point));
        }

        fn on_collision_stay(&mut self, _world: &mut World, _me: EntityId, collision: Collision) {
            self.0.borrow_mut().push(Event::Stay(collision.other));
        }

        fn on_collision_exit(&mut self, _world: &mut World, _me: EntityId, other: EntityId) {
            self.0.borrow_mut().push(Event::Exit(other));
        }
    }

    fn boxed(world: &mut World, center: Vector2F, size: Vector2F) -> (EntityId, Rc<RefCell<Vec<Event>>>) {
        let events = Rc::new(RefCell::new(vec![]));
        let root = world.root();
        let entity = world
            .create_entity(root, EntityDesc::new(center, size).with_behavior(Recorder(events.clone())))
            .unwrap();
        world.add_collider(entity).unwrap();
        (entity, events)
    }

    #[test]
    fn test_corner_contact_reports_first_corner() {
        let a = Rect2F::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect2F::new(8.0, 8.0, 10.0, 10.0);
        assert_eq!(corner_contact(&a, &b), Some(Vector2F::new(10.0, 10.0)));
        assert_eq!(corner_contact(&b, &a), Some(Vector2F::new(8.0, 8.0)));
    }

    #[test]
    fn test_corner_contact_detects_full_containment() {
        let outer = Rect2F::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect2F::new(40.0, 40.0, 10.0, 10.0);
        assert_eq!(corner_contact(&outer, &inner), Some(Vector2F::new(40.0, 40.0)));
        assert_eq!(corner_contact(&inner, &outer), Some(Vector2F::new(40.0, 40.0)));
    }

    #[test]
    fn test_corner_contact_touching_edges_counts() {
        let a = Rect2F::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect2F::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(corner_contact(&a, &b), Some(Vector2F::new(10.0, 0.0)));
    }

    #[test]
    fn test_corner_contact_misses_cross_overlap() {
        let wide = Rect2F::new(0.0, 10.0, 100.0, 10.0);
        let tall = Rect2F::new(45.0, 0.0, 10.0, 100.0);
        assert_eq!(corner_contact(&wide, &tall), None);
    }

    #[test]
    fn test_separate_boxes_do_not_collide() {
        let mut world = World::default();
        let (a, a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        let (b, b_events) = boxed(&mut world, Vector2F::new(50.0, 0.0), Vector2F::new(10.0, 10.0));

        world.tick(0.0);

        assert!(a_events.borrow().is_empty());
        assert!(b_events.borrow().is_empty());
        assert!(world.collisions_of(a).is_empty());
        assert!(world.collisions_of(b).is_empty());
    }

    #[test]
    fn test_enter_stay_exit_sequence_is_symmetric() {
        let mut world = World::default();
        let (a, a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        let (b, b_events) = boxed(&mut world, Vector2F::new(8.0, 0.0), Vector2F::new(10.0, 10.0));

        world.tick(0.0);
        assert_eq!(*a_events.borrow(), vec![Event::Enter(b, Vector2F::new(5.0, -5.0)), Event::Stay(b)]);
        assert_eq!(*b_events.borrow(), vec![Event::Enter(a, Vector2F::new(5.0, -5.0)), Event::Stay(a)]);
        assert!(world.collisions_of(a).iter().any(|c| c.other == b));
        assert!(world.collisions_of(b).iter().any(|c| c.other == a));

        world.tick(0.0);
        assert_eq!(a_events.borrow()[2..], [Event::Stay(b), Event::Stay(b)]);
        assert_eq!(b_events.borrow()[2..], [Event::Stay(a), Event::Stay(a)]);

        world.set_position(b, Vector2F::new(100.0, 0.0)).unwrap();
        world.tick(0.0);
        assert_eq!(a_events.borrow().last(), Some(&Event::Exit(b)));
        assert_eq!(b_events.borrow().last(), Some(&Event::Exit(a)));
        assert!(world.collisions_of(a).is_empty());
        assert!(world.collisions_of(b).is_empty());
        assert_eq!(a_events.borrow().len(), 5);
        assert_eq!(b_events.borrow().len(), 5);
    }

    #[test]
    fn test_contact_keeps_point_from_enter() {
        let mut world = World::default();
        let (a, _a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        let (b, _b_events) = boxed(&mut world, Vector2F::new(8.0, 0.0), Vector2F::new(10.0, 10.0));

        world.tick(0.0);
        world.set_position(b, Vector2F::new(6.0, 2.0)).unwrap();
        world.tick(0.0);

        assert_eq!(world.collisions_of(a)[0].point, Vector2F::new(5.0, -5.0));
        assert_eq!(world.collisions_of(b)[0].point, Vector2F::new(5.0, -5.0));
    }

    #[test]
    fn test_disabled_peer_forces_exit() {
        let mut world = World::default();
        let (_a, a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        let (b, _b_events) = boxed(&mut world, Vector2F::new(5.0, 5.0), Vector2F::new(10.0, 10.0));

        world.tick(0.0);
        world.set_enabled(b, false).unwrap();
        world.tick(0.0);

        assert_eq!(a_events.borrow().last(), Some(&Event::Exit(b)));
        world.tick(0.0);
        assert_eq!(a_events.borrow().len(), 3);
    }

    #[test]
    fn test_destroying_owner_deregisters_and_fires_exit() {
        let mut world = World::default();
        let (a, a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        let (b, _b_events) = boxed(&mut world, Vector2F::new(5.0, 5.0), Vector2F::new(10.0, 10.0));
        world.tick(0.0);
        assert_eq!(world.registered_colliders().len(), 2);

        let b_collider = world.get_component(b, ComponentKind::Collider).unwrap();
        world.remove_entity(b).unwrap();

        assert_eq!(world.registered_colliders().len(), 1);
        assert!(!world.registered_colliders().contains(b_collider));
        assert_eq!(a_events.borrow().last(), Some(&Event::Exit(b)));
        assert!(world.collisions_of(a).is_empty());

        world.tick(0.0);
        assert_eq!(a_events.borrow().len(), 3);
    }

    #[test]
    fn test_removing_collider_fires_exit_on_both_owners() {
        let mut world = World::default();
        let (a, a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        let (b, b_events) = boxed(&mut world, Vector2F::new(5.0, 5.0), Vector2F::new(10.0, 10.0));
        world.tick(0.0);

        world.remove_component(a, ComponentKind::Collider).unwrap();

        assert_eq!(a_events.borrow().last(), Some(&Event::Exit(b)));
        assert_eq!(b_events.borrow().last(), Some(&Event::Exit(a)));
        assert!(world.collisions_of(b).is_empty());
    }

    #[test]
    fn test_colliders_of_same_owner_ignore_each_other() {
        let mut world = World::default();
        let (a, a_events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 10.0));
        world.add_collider(a).unwrap();

        world.tick(0.0);

        assert!(a_events.borrow().is_empty());
    }

    #[test]
    fn test_bounding_box_follows_owner() {
        let mut world = World::default();
        let (a, _events) = boxed(&mut world, Vector2F::new(0.0, 0.0), Vector2F::new(4.0, 2.0));
        let collider = world.get_component(a, ComponentKind::Collider).unwrap();

        world.set_position(a, Vector2F::new(10.0, 10.0)).unwrap();
        world.tick(0.0);

        assert_eq!(world.collider(collider).unwrap().bounding_box(), Rect2F::new(8.0, 9.0, 4.0, 2.0));
    }
}
