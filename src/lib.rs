pub mod app;
pub mod body;
pub mod cli;
pub mod color;
pub mod config;
pub mod events;
pub mod logging;
pub mod mesh;
pub mod physics;
pub mod roller;
pub mod scene;
pub mod texture;
pub mod uv;

pub use app::DiceApp;
