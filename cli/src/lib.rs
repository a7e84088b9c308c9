//! `gobotany` command-line client

pub mod app;
pub mod commands;
pub mod core;
pub mod utils;

pub use app::App;
