// ## 📂 File: `src/buffers/manager.rs`

//! buffers/manager.rs
//! Working buffers for one file operation.
//!
//! All buffers are rented from the shared pool up front and released together
//! when the manager drops, zero-cleared, on every exit path.

use std::sync::Arc;

use crate::buffers::pool::{BufferPool, PooledBuffer};

/// Sizes of the working set for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSpec {
    /// Raw read buffer (one payload block).
    pub io_len: usize,
    /// Largest processing size the policy can produce for one block.
    pub output_len: usize,
    /// On-disk tag region per block.
    pub tag_region_len: usize,
    /// On-disk header size (policy metadata size).
    pub header_len: usize,
    pub nonce_len: usize,
    pub salt_len: usize,
}

#[derive(Debug)]
pub struct BufferManager {
    pub io: PooledBuffer,
    pub output: PooledBuffer,
    pub tag_region: PooledBuffer,
    pub header: PooledBuffer,
    pub nonce: PooledBuffer,
    pub salt: PooledBuffer,
}

impl BufferManager {
    pub fn rent(pool: &Arc<BufferPool>, spec: BufferSpec) -> Self {
        Self {
            io: pool.rent(spec.io_len),
            output: pool.rent(spec.output_len),
            tag_region: pool.rent(spec.tag_region_len),
            header: pool.rent(spec.header_len),
            nonce: pool.rent(spec.nonce_len),
            salt: pool.rent(spec.salt_len),
        }
    }

    pub fn output_capacity(&self) -> usize {
        self.output.len()
    }
}
