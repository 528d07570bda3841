use serde::{
    Deserialize,
    Serialize
};

use super::{
    collision::{BoxCollider, Collision},
    entity::{Component, ComponentKind, EntityId},
    math::{lerp, sign, Axis, Vector2F},
    world::{World, WorldError},
};

pub const DEFAULT_GRAVITY: Vector2F = Vector2F { x: 0.0, y: 1200.0 };
pub const DEFAULT_RIGIDBODY_SEPARATION: f32 = 0.0625;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: Vector2F,
    /// Extra distance put between two bodies when a contact is resolved.
    pub rigidbody_separation: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            rigidbody_separation: DEFAULT_RIGIDBODY_SEPARATION,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rigidbody {
    pub mass: f32,
    pub friction: f32,
    pub movable: bool,
    pub gravity_enabled: bool,
    pub velocity: Vector2F,
    pub acceleration: Vector2F,
    collider: EntityId,
}

impl Rigidbody {
    /// Collider used for contact queries, for the whole life of the body.
    pub fn collider(&self) -> EntityId {
        self.collider
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RigidbodyDesc {
    pub mass: f32,
    pub friction: f32,
    pub velocity: Vector2F,
    pub movable: bool,
    pub gravity_enabled: bool,
}

impl RigidbodyDesc {
    pub fn new(mass: f32, friction: f32) -> Self {
        Self {
            mass,
            friction,
            velocity: Vector2F::ZERO,
            movable: true,
            gravity_enabled: true,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector2F) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn immovable(mut self) -> Self {
        self.movable = false;
        self
    }

    pub fn without_gravity(mut self) -> Self {
        self.gravity_enabled = false;
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Separation {
    pub axis: Axis,
    /// Direction and distance to push the other body, the first body moves the opposite way.
    pub push: Vector2F,
}

/// 1-D perfectly elastic collision, returns the new velocities.
pub fn elastic_collision(v1: f32, m1: f32, v2: f32, m2: f32) -> (f32, f32) {
    let relative = v1 - v2;
    let v1_final = (v1 * m1 + v2 * m2 - relative * m2) / (m1 + m2);
    let v2_final = v1_final + relative;
    (v1_final, v2_final)
}

/// Picks the resolution axis for a contact at `point` against a box centered on
/// `other_center` with half extents `other_half`.
pub fn separation(other_center: Vector2F, other_half: Vector2F, point: Vector2F, margin: f32) -> Option<Separation> {
    let displacement = other_center - point;
    let depth = other_half - displacement.abs();

    if depth == Vector2F::ZERO || depth.x < 0.0 || depth.y < 0.0 {
        return None;
    }

    let separation = if depth.x < depth.y {
        Separation {
            axis: Axis::Horizontal,
            push: Vector2F::new((depth.x + margin) * sign(displacement.x), 0.0),
        }
    } else {
        Separation {
            axis: Axis::Vertical,
            push: Vector2F::new(0.0, (depth.y + margin) * sign(displacement.y)),
        }
    };
    Some(separation)
}

/// Velocities of two bodies after a contact resolved along `axis`.
///
/// Only movable bodies get new velocities; an immovable body's velocity is
/// returned untouched.
pub fn collide_velocities(a: &Rigidbody, b: &Rigidbody, axis: Axis) -> (Vector2F, Vector2F) {
    let mut a_velocity = a.velocity;
    let mut b_velocity = b.velocity;

    if a.movable && b.movable {
        let (a_axis, b_axis) = elastic_collision(
            a_velocity.along(axis), a.mass,
            b_velocity.along(axis), b.mass
        );
        a_velocity.set_along(axis, a_axis);
        b_velocity.set_along(axis, b_axis);
    } else if a.movable {
        a_velocity.set_along(axis, 0.0);
    } else if b.movable {
        b_velocity.set_along(axis, 0.0);
    }

    let orthogonal = axis.orthogonal();
    let a_sliding = a_velocity.along(orthogonal);
    let b_sliding = b_velocity.along(orthogonal);
    if a.movable {
        a_velocity.set_along(orthogonal, lerp(a_sliding, b_sliding, b.friction));
    }
    if b.movable {
        b_velocity.set_along(orthogonal, lerp(b_sliding, a_sliding, a.friction));
    }

    (a_velocity, b_velocity)
}

impl World {
    /// Adds a rigidbody to `owner`, reusing its first collider or creating one.
    pub fn add_rigidbody(&mut self, owner: EntityId, desc: RigidbodyDesc) -> Result<EntityId, WorldError> {
        if !self.is_alive(owner) {
            return Err(WorldError::EntityNotExist);
        }
        let collider = match self.get_component(owner, ComponentKind::Collider) {
            Some(collider) => collider,
            None => self.add_collider(owner)?,
        };
        let rigidbody = Rigidbody {
            mass: desc.mass,
            friction: desc.friction,
            movable: desc.movable,
            gravity_enabled: desc.gravity_enabled,
            velocity: desc.velocity,
            acceleration: Vector2F::ZERO,
            collider,
        };
        self.attach(owner, Component::Rigidbody(rigidbody))
    }

    pub fn rigidbody(&self, rigidbody: EntityId) -> Option<&Rigidbody> {
        match self.get_entity_by_id(rigidbody)?.component() {
            Component::Rigidbody(body) => Some(body),
            _ => None,
        }
    }

    pub fn rigidbody_mut(&mut self, rigidbody: EntityId) -> Option<&mut Rigidbody> {
        match &mut self.get_entity_by_id_mut(rigidbody)?.component {
            Component::Rigidbody(body) => Some(body),
            _ => None,
        }
    }

    /// First rigidbody on `owner`.
    pub fn rigidbody_of(&self, owner: EntityId) -> Option<&Rigidbody> {
        self.get_component(owner, ComponentKind::Rigidbody)
            .and_then(|rigidbody| self.rigidbody(rigidbody))
    }

    /// Live rigidbody resolving its contacts through `collider`.
    pub(crate) fn rigidbody_using(&self, collider: EntityId) -> Option<EntityId> {
        if self.kind_of(collider) != Some(ComponentKind::Collider) {
            return None;
        }
        let owner = self.parent_of(collider)?;
        self.get_components(owner, ComponentKind::Rigidbody)
            .into_iter()
            .find(|rigidbody| self.rigidbody(*rigidbody).is_some_and(|body| body.collider == collider))
    }

    pub fn set_velocity(&mut self, rigidbody: EntityId, velocity: Vector2F) -> Result<(), WorldError> {
        let body = self.rigidbody_mut(rigidbody).ok_or(WorldError::NotAComponent(ComponentKind::Rigidbody))?;
        body.velocity = velocity;
        Ok(())
    }

    pub fn set_acceleration(&mut self, rigidbody: EntityId, acceleration: Vector2F) -> Result<(), WorldError> {
        let body = self.rigidbody_mut(rigidbody).ok_or(WorldError::NotAComponent(ComponentKind::Rigidbody))?;
        body.acceleration = acceleration;
        Ok(())
    }

    pub(crate) fn step_rigidbody(&mut self, rigidbody: EntityId) {
        let Some(body) = self.rigidbody(rigidbody).copied() else {
            return;
        };
        match self.collider(body.collider).map(BoxCollider::get_collisions) {
            Some(collisions) => {
                for collision in collisions {
                    self.resolve_contact(rigidbody, collision);
                }
            },
            None => log::warn!("Rigidbody {rigidbody} lost its collider {}", body.collider),
        }

        let (Some(owner), Some(body)) = (self.parent_of(rigidbody), self.rigidbody(rigidbody).copied()) else {
            return;
        };
        let delta_time = self.delta_time;
        if let Some(position) = self.position(owner) {
            self.move_entity(owner, position + body.velocity * delta_time);
        }
        // Immovable bodies keep whatever velocity they were given
        if !body.movable {
            return;
        }
        let acceleration = if body.gravity_enabled {
            body.acceleration + self.physics.gravity
        } else {
            body.acceleration
        };
        if let Some(body) = self.rigidbody_mut(rigidbody) {
            body.velocity += acceleration * delta_time;
        }
    }

    fn resolve_contact(&mut self, rigidbody: EntityId, collision: Collision) {
        let other_owner = collision.other;
        let Some(other_rigidbody) = self.get_component(other_owner, ComponentKind::Rigidbody) else {
            return;
        };
        if !self.is_enabled(other_rigidbody) {
            return;
        }
        let (Some(body), Some(other)) = (self.rigidbody(rigidbody).copied(), self.rigidbody(other_rigidbody).copied()) else {
            return;
        };
        if !body.movable && !other.movable {
            return;
        }
        // Already resolved from the other side this frame
        if !self.collider(body.collider).is_some_and(|c| c.is_touching(other_owner)) {
            return;
        }
        // Measured against the box from detection time, like the contact point
        let Some(other_box) = self.collider(other.collider).map(|c| c.bounding_box()) else {
            return;
        };
        let Some(separation) = separation(other_box.center(), other_box.size / 2.0, collision.point, self.physics.rigidbody_separation) else {
            return;
        };
        let (Some(owner), Some(mut other_position)) = (self.parent_of(rigidbody), self.position(other_owner)) else {
            return;
        };
        let Some(mut position) = self.position(owner) else {
            return;
        };

        if !body.movable {
            other_position += separation.push;
        } else if !other.movable {
            position -= separation.push;
        } else {
            let half = separation.push / 2.0;
            other_position += half;
            position -= half;
        }
        self.move_entity(owner, position);
        self.move_entity(other_owner, other_position);
        log::trace!("Resolved {owner} against {other_owner} along {:?}", separation.axis);

        self.remove_contact(body.collider, other.collider);

        let (velocity, other_velocity) = collide_velocities(&body, &other, separation.axis);
        if body.movable {
            if let Some(body) = self.rigidbody_mut(rigidbody) {
                body.velocity = velocity;
            }
        }
        if other.movable {
            if let Some(other) = self.rigidbody_mut(other_rigidbody) {
                other.velocity = other_velocity;
            }
        }
    }
}
