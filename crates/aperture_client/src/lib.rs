pub mod app;
pub mod camera;
pub mod demo;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod settings;
