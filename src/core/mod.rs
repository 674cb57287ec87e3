// src/core/mod.rs

pub mod attributes;
pub mod error;
pub mod events;
pub mod graph_display;
pub mod loader;
pub mod paths;
pub mod project;
pub mod properties;
pub mod property_file;
pub mod references;
pub mod registry;
pub mod resolver;
pub mod target;
