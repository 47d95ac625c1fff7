//! buffers/mod.rs
//! Pooled, zero-on-release working buffers.

pub mod manager;
pub mod pool;

pub use manager::*;
pub use pool::*;
