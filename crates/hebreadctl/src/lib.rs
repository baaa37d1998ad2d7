//! Hebreadctl library - exposes modules for integration tests

pub mod app;
pub mod celebrate;
pub mod commands;
pub mod display;
pub mod logging;

pub use app::App;
