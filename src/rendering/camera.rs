use crate::game::{
    entity::{Component, ComponentKind, EntityDesc, EntityId},
    math::{Rect2F, Rect2I, Vector2F, Vector2I},
    world::{World, WorldError},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    zoom: f32,
    viewport: Rect2F,
}

impl Camera {
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom,
            viewport: Rect2F::default(),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// World region seen by the camera, as of the last refresh.
    pub fn viewport(&self) -> Rect2F {
        self.viewport
    }

    /// Recenters the viewport on `position`, sized `scale ⊙ window_size`.
    pub fn refresh(&mut self, position: Vector2F, scale: Vector2F, window_size: Vector2F) {
        self.viewport = Rect2F::from_center(position, scale.hadamard(window_size));
    }

    /// Maps a world rect into this camera's screen space. Rects that are not
    /// `relative` are already in screen space and pass through unchanged.
    pub fn project(&self, camera_position: Vector2F, rect: Rect2F, relative: bool) -> Rect2I {
        let mut origin = rect.pos;
        let mut dimensions = rect.size;
        if relative {
            origin = camera_position + (origin - camera_position) * self.zoom;
            dimensions = dimensions * self.zoom;
            origin -= self.viewport.pos;
        }
        Rect2I {
            pos: Vector2I::from(origin),
            size: Vector2I::from(dimensions),
        }
    }

    /// A projected rect is drawn unless it lies fully left or above the
    /// viewport or starts past its right or bottom edge.
    pub fn is_visible(&self, dest: &Rect2I) -> bool {
        let view = Vector2I::from(self.viewport.size);
        !(dest.pos.x < -dest.size.x
            || dest.pos.x > view.x
            || dest.pos.y < -dest.size.y
            || dest.pos.y > view.y)
    }
}

impl World {
    /// Creates a camera entity under `parent`. Its scale is the fraction of
    /// the window the viewport spans.
    pub fn add_camera(&mut self, parent: EntityId, position: Vector2F, scale: Vector2F, zoom: f32) -> Result<EntityId, WorldError> {
        let camera = self.spawn(parent, EntityDesc::new(position, scale), Component::Camera(Camera::new(zoom)))?;
        self.refresh_viewport(camera);
        Ok(camera)
    }

    pub fn camera(&self, camera: EntityId) -> Option<&Camera> {
        match self.get_entity_by_id(camera)?.component() {
            Component::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    fn camera_mut(&mut self, camera: EntityId) -> Option<&mut Camera> {
        match &mut self.get_entity_by_id_mut(camera)?.component {
            Component::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn set_zoom(&mut self, camera: EntityId, zoom: f32) -> Result<(), WorldError> {
        let camera = self.camera_mut(camera).ok_or(WorldError::NotAComponent(ComponentKind::Camera))?;
        camera.zoom = zoom;
        Ok(())
    }

    /// Every camera entity, enabled or not, in creation order.
    pub fn cameras(&self) -> Vec<EntityId> {
        self.iter_entities()
            .filter(|(_, entity)| entity.kind() == ComponentKind::Camera)
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn refresh_viewport(&mut self, camera: EntityId) {
        let (Some(position), Some(scale)) = (self.position(camera), self.scale(camera)) else {
            return;
        };
        let window_size = self.window_size;
        if let Some(camera) = self.camera_mut(camera) {
            camera.refresh(position, scale, window_size);
        }
    }
}
