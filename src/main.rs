use clap::{Parser, Subcommand, Args};
use rust_scene_engine::DEFAULT_CONFIG_PATH;

/// # Global Arguments
#[derive(Debug, Parser)]
#[command(version, about = "2D scene engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run headless demo scene
    Run(RunArgs),

    /// Print default configuration
    Config,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Engine config file
    #[arg(short = 'c', long = "config", value_name = "CONFIG_PATH", default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Number of falling crates
    #[arg(short = 'b', long = "boxes", value_name = "BOXES", default_value_t = 12)]
    boxes: u32,

    /// Frames to simulate, 0 runs until Ctrl-C
    #[arg(short = 'f', long = "frames", value_name = "FRAMES", default_value_t = 600)]
    frames: u64,

    /// Fixed frame time in seconds instead of wall clock
    #[arg(long = "dt", value_name = "SECONDS")]
    dt: Option<f32>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .format_file(false)
        .format_line_number(true)
        .init();

    let cli_args = Cli::parse();
    log::info!("Got args: '{:?}'.", cli_args);

    match cli_args.mode {
        Mode::Run(run_args) => {
            cli_run::run(&run_args);
        },
        Mode::Config => {
            cli_config::run();
        },
    }
}

mod cli_config {
    use rust_scene_engine::config::EngineConfig;

    pub fn run() {
        match EngineConfig::default().to_json_pretty() {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Could not serialize config: {e}"),
        }
    }
}

mod cli_run {
    use std::{
        path::Path,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc
        }
    };

    use rand::seq::IndexedRandom;
    use rust_scene_engine::{
        config::EngineConfig,
        game::{
            audio::{AudioPlayerDesc, Sound, SoundHandle},
            collision::Collision,
            entity::{Behavior, EntityDesc, EntityId},
            math::Vector2F,
            physics::RigidbodyDesc,
            scene::{Game, SceneHooks},
            time::TimeTracker,
            trigger::TriggerHandler,
            world::World,
        },
        rendering::{
            renderer::{Animation, DrawableDesc},
            TextureHandle
        },
    };

    use super::RunArgs;

    const FLOOR_TEXTURE: TextureHandle = TextureHandle(0);
    const WALL_TEXTURE: TextureHandle = TextureHandle(1);
    const CRATE_TEXTURES: [TextureHandle; 3] = [TextureHandle(2), TextureHandle(3), TextureHandle(4)];
    const ZONE_FRAMES: [TextureHandle; 4] = [TextureHandle(10), TextureHandle(11), TextureHandle(12), TextureHandle(13)];
    const THUD: Sound = Sound { handle: SoundHandle(0), duration: 0.4 };

    pub const DEMO_SCENE_NAME: &str = "Demo";

    const ARENA_HALF_WIDTH: f32 = 600.0;
    const FLOOR_Y: f32 = 400.0;
    pub const CRATE_TAG: &str = "crate";

    /// Plays a short sound whenever the crate lands on something.
    struct Thud;

    impl Behavior for Thud {
        fn on_collision_enter(&mut self, world: &mut World, me: EntityId, collision: Collision) {
            log::debug!("Crate {me} hit {}", collision.other);
            let root = world.root();
            if let Err(e) = world.add_audio_player(root, AudioPlayerDesc::new(THUD).play_on_start().destroy_on_end()) {
                log::warn!("No thud for {me}: {e}");
            }
        }
    }

    struct ZoneLogger;

    impl TriggerHandler for ZoneLogger {
        fn on_enter(&mut self, _world: &mut World, trigger: EntityId, other: EntityId, occupants: usize) {
            log::info!("{other} entered zone {trigger}, {occupants} inside");
        }

        fn on_exit(&mut self, _world: &mut World, trigger: EntityId, other: EntityId, occupants: usize) {
            log::info!("{other} left zone {trigger}, {occupants} inside");
        }
    }

    struct DemoScene {
        boxes: u32,
    }

    impl DemoScene {
        fn build(&self, world: &mut World) -> Result<(), rust_scene_engine::game::world::WorldError> {
            let root = world.root();

            let floor = world.create_entity(root, EntityDesc::new(Vector2F::new(0.0, FLOOR_Y), Vector2F::new(ARENA_HALF_WIDTH * 2.0, 40.0)))?;
            world.add_rigidbody(floor, RigidbodyDesc::new(1000.0, 0.4).immovable())?;
            world.add_drawable(floor, DrawableDesc::new(FLOOR_TEXTURE))?;

            for x in [-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH] {
                let wall = world.create_entity(root, EntityDesc::new(Vector2F::new(x, 0.0), Vector2F::new(40.0, FLOOR_Y * 2.0)))?;
                world.add_rigidbody(wall, RigidbodyDesc::new(1000.0, 0.0).immovable())?;
                world.add_drawable(wall, DrawableDesc::new(WALL_TEXTURE))?;
            }

            let zone = world.spawn_trigger(root, Vector2F::new(0.0, FLOOR_Y - 80.0), Vector2F::new(300.0, 100.0), CRATE_TAG, ZoneLogger)?;
            world.add_drawable(zone, DrawableDesc::animated(Animation::new(ZONE_FRAMES.to_vec(), 1.0)).with_depth(-1))?;

            for _ in 0..self.boxes {
                let position = Vector2F::new(
                    rand::random_range(-ARENA_HALF_WIDTH + 60.0..ARENA_HALF_WIDTH - 60.0),
                    rand::random_range(-FLOOR_Y..FLOOR_Y - 100.0)
                );
                let size = rand::random_range(20.0..60.0);
                let velocity = Vector2F::new(rand::random_range(-200.0..200.0), 0.0);
                let texture = *CRATE_TEXTURES.choose(&mut rand::rng()).unwrap_or(&CRATE_TEXTURES[0]);

                let crate_id = world.create_entity(root, EntityDesc::new(position, Vector2F::new(size, size))
                    .with_tag(CRATE_TAG)
                    .with_behavior(Thud))?;
                world.add_rigidbody(crate_id, RigidbodyDesc::new(size / 20.0, 0.2).with_velocity(velocity))?;
                world.add_drawable(crate_id, DrawableDesc::new(texture).with_depth(1))?;
            }
            Ok(())
        }
    }

    impl SceneHooks for DemoScene {
        fn on_enter(&mut self, world: &mut World) {
            if let Err(e) = self.build(world) {
                log::error!("Demo scene setup failed: {e}");
            }
            log::info!("Demo scene ready with {} entities", world.entity_count());
        }
    }

    fn load_config(path: &str) -> EngineConfig {
        if !Path::new(path).exists() {
            log::info!("No config at '{path}', using defaults");
            return EngineConfig::default();
        }
        match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Could not load '{path}': {e}, using defaults");
                EngineConfig::default()
            }
        }
    }

    /// Game starting in the configured scene, switched to the demo scene.
    pub fn build_game(config: &EngineConfig, boxes: u32) -> Game {
        let mut game = Game::with_default_scene(config.world_settings(), &config.default_scene);
        game.add_scene(DEMO_SCENE_NAME, DemoScene { boxes }, true);
        game
    }

    pub fn run(args: &RunArgs) {
        let config = load_config(&args.config);
        log::info!("Config: {config:?}");

        let mut game = build_game(&config, args.boxes);

        let running = Arc::new(AtomicBool::new(true));
        let running_flag = running.clone();
        ctrlc::set_handler(move || {
            log::info!("Captured ctrl-C, stopping the simulation...");
            running_flag.store(false, Ordering::SeqCst);
        }).expect("Error setting Ctrl-C handler");

        let mut time = TimeTracker::new(config.max_framerate);
        let mut frame: u64 = 0;
        while running.load(Ordering::SeqCst) && (args.frames == 0 || frame < args.frames) {
            let real_dt = time.tick();
            let dt = args.dt.unwrap_or(real_dt);
            game.update(dt);
            frame += 1;

            let Some(world) = game.current_scene_mut().map(|scene| scene.world_mut()) else {
                log::warn!("No scene left, stopping");
                break;
            };
            let draw_calls = world.take_draw_calls();
            let audio_commands = world.take_audio_commands();
            for command in audio_commands.iter() {
                log::debug!("Audio: {command:?}");
            }
            log::trace!("Frame {frame}: {} draw calls", draw_calls.len());
            if frame % 60 == 0 {
                log::info!("Frame {frame}: {} entities, {} draw calls, {:.1} fps",
                    world.entity_count(), draw_calls.len(), time.framerate());
            }
        }
        log::info!("Simulated {frame} frames");
    }
}

#[cfg(test)]
mod tests {
    use rust_scene_engine::{
        config::EngineConfig,
        game::entity::ComponentKind,
    };

    use super::cli_run::{build_game, CRATE_TAG, DEMO_SCENE_NAME};

    #[test]
    fn test_demo_scene_is_built_and_current() {
        let mut game = build_game(&EngineConfig::default(), 5);

        assert_eq!(game.current_scene_name(), Some(DEMO_SCENE_NAME));
        assert_eq!(game.find_objects_by_tag(CRATE_TAG).len(), 5);
        assert!(game.current_scene().unwrap().world().entity_count() > 2);
        assert_eq!(game.get_objects(ComponentKind::Camera).len(), 1);

        game.update(1.0 / 60.0);
        let world = game.current_scene_mut().unwrap().world_mut();
        assert!(!world.take_draw_calls().is_empty());
    }
}
