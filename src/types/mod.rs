//! Built-in data types that can be declared as references.

pub mod path;
