pub mod audio;
pub mod collision;
pub mod entity;
pub mod math;
pub mod physics;
pub mod scene;
pub mod time;
pub mod trigger;
pub mod world;
