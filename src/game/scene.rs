use std::collections::BTreeMap;

use super::{
    entity::{ComponentKind, EntityDesc, EntityId},
    math::Vector2F,
    world::{World, WorldSettings},
};

pub const DEFAULT_SCENE_NAME: &str = "Default Scene";

/// Scene lifecycle callbacks.
pub trait SceneHooks {
    fn on_enter(&mut self, _world: &mut World) {}

    fn on_exit(&mut self, _world: &mut World) {}

    /// Runs before the scene's world is ticked.
    fn update(&mut self, _world: &mut World, _delta_time: f32) {}
}

/// Hooks that do nothing.
pub struct NoHooks;

impl SceneHooks for NoHooks {}

pub struct Scene {
    name: String,
    world: World,
    main_camera: Option<EntityId>,
    hooks: Box<dyn SceneHooks>,
}

impl Scene {
    /// Creates a scene with one camera at the origin spanning the whole window.
    pub fn new<S, H>(name: S, settings: WorldSettings, hooks: H) -> Self
    where
        S: AsRef<str>,
        H: SceneHooks + 'static
    {
        let mut world = World::new(settings);
        let root = world.root();
        let main_camera = match world.add_camera(root, Vector2F::ZERO, Vector2F::ONE, 1.0) {
            Ok(camera) => Some(camera),
            Err(e) => {
                log::warn!("Scene '{}' has no camera: {e}", name.as_ref());
                None
            }
        };
        Self {
            name: name.as_ref().to_string(),
            world,
            main_camera,
            hooks: Box::new(hooks),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Camera created with the scene, if it was not destroyed since.
    pub fn main_camera(&self) -> Option<EntityId> {
        self.main_camera.filter(|camera| self.world.is_alive(*camera))
    }

    fn enter(&mut self) {
        log::info!("Entering scene '{}'", self.name);
        self.hooks.on_enter(&mut self.world);
    }

    fn exit(&mut self) {
        log::info!("Exiting scene '{}'", self.name);
        self.hooks.on_exit(&mut self.world);
    }

    pub fn update(&mut self, delta_time: f32) {
        self.hooks.update(&mut self.world, delta_time);
        self.world.tick(delta_time);
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("entities", &self.world.entity_count())
            .field("main_camera", &self.main_camera)
            .finish()
    }
}

/// Every scene of the running game, keyed by name, at most one of them current.
#[derive(Debug)]
pub struct Game {
    scenes: BTreeMap<String, Scene>,
    current: Option<String>,
    settings: WorldSettings,
}

impl Game {
    /// Starts with an empty current scene named [`DEFAULT_SCENE_NAME`].
    pub fn new(settings: WorldSettings) -> Self {
        Self::with_default_scene(settings, DEFAULT_SCENE_NAME)
    }

    /// Starts with an empty current scene named `name`.
    pub fn with_default_scene<S: AsRef<str>>(settings: WorldSettings, name: S) -> Self {
        let name = name.as_ref().to_string();
        let mut scenes = BTreeMap::new();
        scenes.insert(name.clone(), Scene::new(&name, settings, NoHooks));
        Self {
            scenes,
            current: Some(name),
            settings,
        }
    }

    /// Creates a scene unless the name is taken; either way returns the scene
    /// under `name`. A new scene becomes current when `enter` is set or no
    /// scene is current.
    pub fn add_scene<H: SceneHooks + 'static>(&mut self, name: &str, hooks: H, enter: bool) -> &mut Scene {
        let exists = self.scenes.contains_key(name);
        if exists {
            log::warn!("Scene '{name}' already exists, new hooks dropped");
        }
        let switch = !exists && (enter || self.current.is_none());
        if switch {
            if let Some(outgoing) = self.current_scene_mut() {
                outgoing.exit();
            }
            self.current = Some(name.to_string());
        }

        let settings = self.settings;
        let scene = self.scenes.entry(name.to_string()).or_insert_with(|| {
            log::info!("Added scene '{name}'");
            Scene::new(name, settings, hooks)
        });
        if switch {
            scene.enter();
        }
        scene
    }

    /// Switches to the named scene. Returns `false` for an unknown name or the
    /// scene that is already current.
    pub fn enter_scene(&mut self, name: &str) -> bool {
        if !self.scenes.contains_key(name) || self.current.as_deref() == Some(name) {
            return false;
        }
        if let Some(outgoing) = self.current_scene_mut() {
            outgoing.exit();
        }
        self.current = Some(name.to_string());
        if let Some(incoming) = self.scenes.get_mut(name) {
            incoming.enter();
        }
        true
    }

    /// Removes the named scene. When it was current, the first remaining scene
    /// by name takes over.
    pub fn remove_scene(&mut self, name: &str) -> bool {
        let Some(mut removed) = self.scenes.remove(name) else {
            return false;
        };
        log::info!("Removed scene '{name}'");
        if self.current.as_deref() != Some(name) {
            return true;
        }

        removed.exit();
        self.current = self.scenes.keys().next().cloned();
        match self.current_scene_mut() {
            Some(incoming) => incoming.enter(),
            None => log::warn!("No scenes left"),
        }
        true
    }

    /// Advances the current scene by one frame.
    pub fn update(&mut self, delta_time: f32) {
        match self.current_scene_mut() {
            Some(scene) => scene.update(delta_time),
            None => log::trace!("No current scene to update"),
        }
    }

    pub fn current_scene_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.current.as_deref()?)
    }

    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        let name = self.current.as_deref()?;
        self.scenes.get_mut(name)
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.keys().map(String::as_str).collect()
    }

    /// Resizes the window for every scene, current or not.
    pub fn set_window_size(&mut self, window_size: Vector2F) {
        self.settings.window_size = window_size;
        for scene in self.scenes.values_mut() {
            scene.world.set_window_size(window_size);
        }
    }

    fn scoped_world(&mut self) -> Option<&mut World> {
        match self.current_scene_mut() {
            Some(scene) => Some(scene.world_mut()),
            None => {
                log::warn!("Not in a scene");
                None
            }
        }
    }

    fn scoped_world_ref(&self) -> Option<&World> {
        match self.current_scene() {
            Some(scene) => Some(scene.world()),
            None => {
                log::warn!("Not in a scene");
                None
            }
        }
    }

    /// Creates an entity at the top of the current scene.
    pub fn instantiate(&mut self, desc: EntityDesc) -> Option<EntityId> {
        let world = self.scoped_world()?;
        let root = world.root();
        match world.create_entity(root, desc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                log::warn!("Could not instantiate: {e}");
                None
            }
        }
    }

    /// Destroys an entity of the current scene with its subtree.
    pub fn destroy_object(&mut self, entity: EntityId) -> bool {
        self.scoped_world()
            .is_some_and(|world| world.remove_entity(entity).is_ok())
    }

    /// First top-level entity of the current scene with the given kind.
    pub fn get_object(&self, kind: ComponentKind) -> Option<EntityId> {
        let world = self.scoped_world_ref()?;
        world.get_component(world.root(), kind)
    }

    pub fn get_objects(&self, kind: ComponentKind) -> Vec<EntityId> {
        self.scoped_world_ref()
            .map(|world| world.get_components(world.root(), kind))
            .unwrap_or_default()
    }

    pub fn find_objects_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.scoped_world_ref()
            .map(|world| world.children_with_tag(world.root(), tag))
            .unwrap_or_default()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(WorldSettings::default())
    }
}
