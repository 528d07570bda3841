use std::collections::HashSet;

use crate::game::{
    entity::{Component, ComponentKind, EntityId},
    math::Rect2F,
    world::{World, WorldError},
};

use super::{DrawCall, TextureHandle};

/// Cycles through texture frames, spending the same time on each.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<TextureHandle>,
    duration: f32,
    delay: f32,
    timer: f32,
    index: usize,
    playing: bool,
}

impl Animation {
    /// Playing animation whose full cycle lasts `duration` seconds.
    pub fn new(frames: Vec<TextureHandle>, duration: f32) -> Self {
        let mut animation = Self {
            frames,
            duration,
            delay: 0.0,
            timer: 0.0,
            index: 0,
            playing: true,
        };
        animation.set_duration(duration);
        animation
    }

    pub fn paused(mut self) -> Self {
        self.playing = false;
        self
    }

    pub fn frames(&self) -> &[TextureHandle] {
        &self.frames
    }

    pub fn frame_index(&self) -> usize {
        self.index
    }

    pub fn current_frame(&self) -> Option<TextureHandle> {
        self.frames.get(self.index).copied()
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Time spent on each frame.
    pub fn frame_delay(&self) -> f32 {
        self.delay
    }

    /// Time left before the next frame.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Back to the first frame.
    pub fn reset(&mut self) {
        self.index = 0;
        self.timer = self.delay;
    }

    /// Changes the cycle length and restarts from the first frame.
    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
        self.delay = if self.frames.is_empty() {
            0.0
        } else {
            duration / self.frames.len() as f32
        };
        self.reset();
    }

    /// Jumps to the frame showing at `time` into the cycle. Times past the
    /// duration wrap around, negative times are ignored.
    pub fn go_to_time(&mut self, time: f32) {
        if time < 0.0 || self.duration <= 0.0 || self.frames.is_empty() {
            return;
        }
        let time = time % self.duration;
        let index = ((time / self.duration) * self.frames.len() as f32) as usize;
        self.index = index.min(self.frames.len() - 1);
        self.timer = self.delay - (time - self.delay * self.index as f32);
    }

    fn advance(&mut self, delta_time: f32) {
        if !self.playing || self.frames.is_empty() {
            return;
        }
        self.timer -= delta_time;
        if self.timer <= 0.0 {
            self.index = (self.index + 1) % self.frames.len();
            self.timer = self.delay;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    texture: Option<TextureHandle>,
    depth: i32,
    relative: bool,
    rect: Rect2F,
    animation: Option<Animation>,
}

impl Drawable {
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Drawn through cameras instead of straight onto the window.
    pub fn is_relative(&self) -> bool {
        self.relative
    }

    /// World rect centered on the owner, sized by its scale.
    pub fn rect(&self) -> Rect2F {
        self.rect
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawableDesc {
    pub texture: Option<TextureHandle>,
    pub depth: i32,
    pub relative: bool,
    pub animation: Option<Animation>,
}

impl DrawableDesc {
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture: Some(texture),
            depth: 0,
            relative: true,
            animation: None,
        }
    }

    pub fn animated(animation: Animation) -> Self {
        Self {
            texture: animation.current_frame(),
            depth: 0,
            relative: true,
            animation: Some(animation),
        }
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    /// Draw in window coordinates, ignoring camera position and zoom.
    pub fn absolute(mut self) -> Self {
        self.relative = false;
        self
    }
}

/// Drawables of one world sorted ascending by depth. Equal depths keep
/// insertion order.
#[derive(Debug, Default)]
pub struct RenderRegistry {
    drawables: Vec<(i32, EntityId)>,
}

impl RenderRegistry {
    pub fn insert(&mut self, depth: i32, drawable: EntityId) {
        let at = self.drawables.partition_point(|(d, _)| *d <= depth);
        self.drawables.insert(at, (depth, drawable));
    }

    pub fn remove(&mut self, drawable: EntityId) {
        if let Some(position) = self.drawables.iter().position(|(_, d)| *d == drawable) {
            self.drawables.remove(position);
        }
    }

    pub fn set_depth(&mut self, drawable: EntityId, depth: i32) {
        self.remove(drawable);
        self.insert(depth, drawable);
    }

    pub fn contains(&self, drawable: EntityId) -> bool {
        self.drawables.iter().any(|(_, d)| *d == drawable)
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Drawables in draw order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.drawables.iter().map(|(_, drawable)| *drawable)
    }
}

impl World {
    /// Adds a drawable component to `owner` and registers it for rendering.
    pub fn add_drawable(&mut self, owner: EntityId, desc: DrawableDesc) -> Result<EntityId, WorldError> {
        let depth = desc.depth;
        let drawable = Drawable {
            texture: desc.texture,
            depth,
            relative: desc.relative,
            rect: Rect2F::default(),
            animation: desc.animation,
        };
        let drawable_id = self.attach(owner, Component::Drawable(drawable))?;
        self.renderers.insert(depth, drawable_id);
        self.refresh_drawable_rect(drawable_id);
        Ok(drawable_id)
    }

    pub fn drawable(&self, drawable: EntityId) -> Option<&Drawable> {
        match self.get_entity_by_id(drawable)?.component() {
            Component::Drawable(drawable) => Some(drawable),
            _ => None,
        }
    }

    fn drawable_mut(&mut self, drawable: EntityId) -> Result<&mut Drawable, WorldError> {
        let entity = self.get_entity_by_id_mut(drawable).ok_or(WorldError::EntityNotExist)?;
        match &mut entity.component {
            Component::Drawable(drawable) => Ok(drawable),
            _ => Err(WorldError::NotAComponent(ComponentKind::Drawable)),
        }
    }

    pub fn animation_mut(&mut self, drawable: EntityId) -> Option<&mut Animation> {
        self.drawable_mut(drawable).ok()?.animation.as_mut()
    }

    pub fn render_registry(&self) -> &RenderRegistry {
        &self.renderers
    }

    /// Changes the draw order of a drawable.
    pub fn set_depth(&mut self, drawable: EntityId, depth: i32) -> Result<(), WorldError> {
        self.drawable_mut(drawable)?.depth = depth;
        self.renderers.set_depth(drawable, depth);
        Ok(())
    }

    pub fn set_texture(&mut self, drawable: EntityId, texture: Option<TextureHandle>) -> Result<(), WorldError> {
        self.drawable_mut(drawable)?.texture = texture;
        Ok(())
    }

    pub(crate) fn step_animation(&mut self, drawable: EntityId) {
        let delta_time = self.delta_time;
        let Ok(drawable) = self.drawable_mut(drawable) else {
            return;
        };
        if let Some(animation) = drawable.animation.as_mut() {
            animation.advance(delta_time);
            drawable.texture = animation.current_frame();
        }
    }

    fn refresh_drawable_rect(&mut self, drawable: EntityId) {
        let Some(owner) = self.parent_of(drawable) else {
            return;
        };
        let (Some(center), Some(size)) = (self.position(owner), self.scale(owner)) else {
            return;
        };
        if let Ok(drawable) = self.drawable_mut(drawable) {
            drawable.rect = Rect2F::from_center(center, size);
        }
    }

    /// Replaces the draw queue with this frame's calls: every active camera in
    /// tree order, each walking all active drawables in depth order.
    pub(crate) fn dispatch_render(&mut self, active: &[EntityId]) {
        self.draw_calls.clear();
        let active_set: HashSet<EntityId> = active.iter().copied().collect();

        let drawables: Vec<EntityId> = self.renderers
            .iter()
            .filter(|drawable| active_set.contains(drawable))
            .collect();
        for drawable in drawables.iter() {
            self.refresh_drawable_rect(*drawable);
        }

        let cameras: Vec<EntityId> = active
            .iter()
            .copied()
            .filter(|id| self.kind_of(*id) == Some(ComponentKind::Camera))
            .collect();

        let mut draw_calls = vec![];
        for camera_id in cameras {
            self.refresh_viewport(camera_id);
            let (Some(camera), Some(camera_position)) = (self.camera(camera_id), self.position(camera_id)) else {
                continue;
            };
            for drawable in drawables.iter().filter_map(|id| self.drawable(*id)) {
                let Some(texture) = drawable.texture else {
                    continue;
                };
                let dest = camera.project(camera_position, drawable.rect, drawable.relative);
                if camera.is_visible(&dest) {
                    draw_calls.push(DrawCall {
                        camera: camera_id,
                        texture,
                        depth: drawable.depth,
                        dest,
                    });
                }
            }
        }
        log::trace!("Dispatched {} draw calls", draw_calls.len());
        self.draw_calls = draw_calls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entity::EntityDesc,
        math::{Rect2I, Vector2F},
    };

    fn frames(count: u32) -> Vec<TextureHandle> {
        (0..count).map(TextureHandle).collect()
    }

    fn world_with_camera() -> (World, EntityId) {
        let mut world = World::default();
        let root = world.root();
        let camera = world.add_camera(root, Vector2F::ZERO, Vector2F::ONE, 1.0).unwrap();
        (world, camera)
    }

    fn sprite(world: &mut World, center: Vector2F, desc: DrawableDesc) -> (EntityId, EntityId) {
        let root = world.root();
        let owner = world.create_entity(root, EntityDesc::new(center, Vector2F::new(10.0, 10.0))).unwrap();
        let drawable = world.add_drawable(owner, desc).unwrap();
        (owner, drawable)
    }

    #[test]
    fn test_registry_orders_by_depth() {
        let mut registry = RenderRegistry::default();
        let (a, b, c) = (EntityId::new(1, 0), EntityId::new(2, 0), EntityId::new(3, 0));
        registry.insert(5, a);
        registry.insert(1, b);
        registry.insert(3, c);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![b, c, a]);

        registry.set_depth(b, 10);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![c, a, b]);

        registry.remove(a);
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(a));
    }

    #[test]
    fn test_registry_keeps_insertion_order_on_ties() {
        let mut registry = RenderRegistry::default();
        let (a, b) = (EntityId::new(1, 0), EntityId::new(2, 0));
        registry.insert(0, a);
        registry.insert(0, b);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_draw_calls_follow_depth() {
        let (mut world, camera) = world_with_camera();
        for depth in [5, 1, 3] {
            sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(depth as u32)).with_depth(depth));
        }

        world.tick(0.016);

        let depths: Vec<i32> = world.draw_calls().iter().map(|call| call.depth).collect();
        assert_eq!(depths, vec![1, 3, 5]);
        assert!(world.draw_calls().iter().all(|call| call.camera == camera));
        assert_eq!(world.draw_calls()[0].dest, Rect2I::new(955, 535, 10, 10));
    }

    #[test]
    fn test_offscreen_and_textureless_are_skipped() {
        let (mut world, _camera) = world_with_camera();
        sprite(&mut world, Vector2F::new(2000.0, 0.0), DrawableDesc::new(TextureHandle(1)));
        let (_, blank) = sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(2)));
        world.set_texture(blank, None).unwrap();

        world.tick(0.016);
        assert!(world.draw_calls().is_empty());
    }

    #[test]
    fn test_disabled_and_destroyed_drawables_are_skipped() {
        let (mut world, _camera) = world_with_camera();
        let (hidden, _) = sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(1)));
        let (doomed, doomed_drawable) = sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(2)));
        sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(3)));

        world.set_enabled(hidden, false).unwrap();
        world.remove_entity(doomed).unwrap();
        assert!(!world.render_registry().contains(doomed_drawable));
        assert_eq!(world.render_registry().len(), 2);

        world.tick(0.016);
        let textures: Vec<TextureHandle> = world.take_draw_calls().into_iter().map(|call| call.texture).collect();
        assert_eq!(textures, vec![TextureHandle(3)]);
        assert!(world.draw_calls().is_empty());
    }

    #[test]
    fn test_disabled_root_leaves_no_stale_draw_calls() {
        let (mut world, _camera) = world_with_camera();
        sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(1)));
        world.tick(0.016);
        assert_eq!(world.draw_calls().len(), 1);

        let root = world.root();
        world.set_enabled(root, false).unwrap();
        world.tick(0.016);
        assert!(world.draw_calls().is_empty());
    }

    #[test]
    fn test_absolute_drawable_ignores_camera() {
        let mut world = World::default();
        let root = world.root();
        world.add_camera(root, Vector2F::new(5000.0, 5000.0), Vector2F::ONE, 3.0).unwrap();
        sprite(&mut world, Vector2F::new(20.0, 20.0), DrawableDesc::new(TextureHandle(1)).absolute());

        world.tick(0.016);
        assert_eq!(world.draw_calls()[0].dest, Rect2I::new(15, 15, 10, 10));
    }

    #[test]
    fn test_each_camera_draws_everything() {
        let (mut world, first) = world_with_camera();
        let root = world.root();
        let second = world.add_camera(root, Vector2F::new(100.0, 0.0), Vector2F::ONE, 1.0).unwrap();
        sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(1)).with_depth(2));
        sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(2)).with_depth(1));

        world.tick(0.016);

        let calls: Vec<(EntityId, i32)> = world.draw_calls().iter().map(|call| (call.camera, call.depth)).collect();
        assert_eq!(calls, vec![(first, 1), (first, 2), (second, 1), (second, 2)]);
        assert_eq!(world.draw_calls()[2].dest, Rect2I::new(855, 535, 10, 10));
    }

    #[test]
    fn test_drawable_rect_follows_owner() {
        let (mut world, _camera) = world_with_camera();
        let (owner, drawable) = sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(1)));
        world.set_position(owner, Vector2F::new(100.0, 0.0)).unwrap();
        world.set_scale(owner, Vector2F::new(20.0, 20.0)).unwrap();

        world.tick(0.016);
        assert_eq!(world.drawable(drawable).unwrap().rect(), Rect2F::new(90.0, -10.0, 20.0, 20.0));
    }

    #[test]
    fn test_set_depth_reorders() {
        let (mut world, _camera) = world_with_camera();
        let (_, low) = sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(1)).with_depth(0));
        sprite(&mut world, Vector2F::ZERO, DrawableDesc::new(TextureHandle(2)).with_depth(5));
        world.set_depth(low, 9).unwrap();

        world.tick(0.016);
        let textures: Vec<TextureHandle> = world.draw_calls().iter().map(|call| call.texture).collect();
        assert_eq!(textures, vec![TextureHandle(2), TextureHandle(1)]);
        assert_eq!(world.drawable(low).unwrap().depth(), 9);
    }

    #[test]
    fn test_animation_cycles_frames() {
        let mut animation = Animation::new(frames(4), 1.0);
        assert_eq!(animation.frame_delay(), 0.25);
        assert_eq!(animation.current_frame(), Some(TextureHandle(0)));

        animation.advance(0.25);
        assert_eq!(animation.frame_index(), 1);
        for _ in 0..3 {
            animation.advance(0.25);
        }
        assert_eq!(animation.frame_index(), 0);
    }

    #[test]
    fn test_paused_animation_holds_frame() {
        let mut animation = Animation::new(frames(4), 1.0).paused();
        animation.advance(10.0);
        assert_eq!(animation.frame_index(), 0);
        animation.play();
        animation.advance(0.25);
        assert_eq!(animation.frame_index(), 1);
        animation.reset();
        assert_eq!(animation.frame_index(), 0);
        assert_eq!(animation.timer(), 0.25);
    }

    #[test]
    fn test_animation_go_to_time() {
        let mut animation = Animation::new(frames(4), 1.0);
        animation.go_to_time(0.5);
        assert_eq!(animation.frame_index(), 2);
        assert_eq!(animation.timer(), 0.25);

        animation.go_to_time(2.75);
        assert_eq!(animation.frame_index(), 3);
        assert_eq!(animation.timer(), 0.25);

        animation.go_to_time(-1.0);
        assert_eq!(animation.frame_index(), 3);

        animation.set_duration(2.0);
        assert_eq!(animation.frame_index(), 0);
        assert_eq!(animation.frame_delay(), 0.5);
    }

    #[test]
    fn test_animated_drawable_swaps_texture() {
        let (mut world, _camera) = world_with_camera();
        let (_, drawable) = sprite(&mut world, Vector2F::ZERO, DrawableDesc::animated(Animation::new(frames(2), 0.2)));

        world.tick(0.1);
        assert_eq!(world.drawable(drawable).unwrap().texture(), Some(TextureHandle(1)));
        assert_eq!(world.draw_calls()[0].texture, TextureHandle(1));

        world.animation_mut(drawable).unwrap().pause();
        world.tick(0.1);
        assert_eq!(world.drawable(drawable).unwrap().texture(), Some(TextureHandle(1)));
    }
}
