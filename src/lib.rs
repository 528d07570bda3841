pub mod config;
pub mod game;
pub mod rendering;

pub const DEFAULT_CONFIG_PATH: &str = "engine.json";
