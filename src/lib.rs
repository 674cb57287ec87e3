//! # anvil
//!
//! A target-based build engine. A project declares targets with dependencies
//! and task calls; the engine orders the targets, runs their tasks with late
//! property expansion, and reports progress through build listeners.
//!
//! - **`core`**: the engine (project, resolver, properties, registry, events).
//! - **`tasks`** and **`types`**: the built-in tasks and data types.
//! - **`models`**: the `anvil.toml` build-file schema.
//! - **`cli`**: the command line front-end.
//! - **`system`**: process execution.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
pub mod tasks;
pub mod types;
