//! # System Interaction Layer
//!
//! The boundary between the build engine and the operating system.
//!
//! - **`executor`**: spawns external processes for the `exec` task, with the
//!   `cmd /C` fallback for shell built-ins on Windows and optional capture of
//!   standard output.

pub mod executor;
