// ## 📂 File: `src/buffers/pool.rs`

//! buffers/pool.rs
//! Process-wide pool of zero-cleared byte buffers.
//!
//! Design notes:
//! - One lock-free `ArrayQueue` per power-of-two size class (512 B .. 32 MiB);
//!   concurrent operations rent and return without a mutex.
//! - `PooledBuffer` is an RAII guard: on drop it wipes the whole allocation and
//!   hands it back. A full class queue simply frees the buffer.
//! - Requests above the largest class are served by a plain allocation that is
//!   still wiped on drop but never pooled.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::queue::ArrayQueue;
use serde::Serialize;
use zeroize::Zeroize;

const MIN_CLASS_SHIFT: u32 = 9; // 512 B
const MAX_CLASS_SHIFT: u32 = 25; // 32 MiB
const CLASS_COUNT: usize = (MAX_CLASS_SHIFT - MIN_CLASS_SHIFT + 1) as usize;

/// Buffers kept per size class.
pub const DEFAULT_SLOTS_PER_CLASS: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferPoolStats {
    pub rented: u64,
    pub reused: u64,
    pub returned: u64,
    pub discarded: u64,
}

pub struct BufferPool {
    classes: Vec<ArrayQueue<Vec<u8>>>,
    rented: AtomicU64,
    reused: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool").field("stats", &self.stats()).finish()
    }
}

impl BufferPool {
    pub fn new(slots_per_class: usize) -> Self {
        let slots = slots_per_class.max(1);
        Self {
            classes: (0..CLASS_COUNT).map(|_| ArrayQueue::new(slots)).collect(),
            rented: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            returned: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Shared pool used by every file operation in the process.
    pub fn global() -> Arc<BufferPool> {
        static GLOBAL: OnceLock<Arc<BufferPool>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(BufferPool::new(DEFAULT_SLOTS_PER_CLASS)))
            .clone()
    }

    /// Size class index and class capacity for a request of `len` bytes.
    fn class_for(len: usize) -> Option<(usize, usize)> {
        let cap = len.max(1 << MIN_CLASS_SHIFT).checked_next_power_of_two()?;
        let shift = cap.trailing_zeros();
        if shift > MAX_CLASS_SHIFT {
            return None;
        }
        Some(((shift - MIN_CLASS_SHIFT) as usize, cap))
    }

    /// Rent a zero-filled buffer of exactly `len` bytes.
    pub fn rent(self: &Arc<Self>, len: usize) -> PooledBuffer {
        self.rented.fetch_add(1, Ordering::Relaxed);

        let buf = match Self::class_for(len) {
            Some((idx, cap)) => {
                let mut v = match self.classes[idx].pop() {
                    Some(v) => {
                        self.reused.fetch_add(1, Ordering::Relaxed);
                        v
                    }
                    None => Vec::with_capacity(cap),
                };
                v.resize(len, 0);
                v
            }
            None => vec![0u8; len],
        };

        PooledBuffer { buf, pool: Arc::clone(self) }
    }

    fn give_back(&self, mut buf: Vec<u8>) {
        // Zeroize wipes the full capacity and leaves len == 0.
        buf.zeroize();

        match Self::class_for(buf.capacity()) {
            Some((idx, cap)) if cap == buf.capacity() => {
                if self.classes[idx].push(buf).is_ok() {
                    self.returned.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.discarded.fetch_add(1, Ordering::Relaxed);
                }
            }
            _ => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Buffers currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.classes.iter().map(|q| q.len()).sum()
    }

    pub fn stats(&self) -> BufferPoolStats {
        BufferPoolStats {
            rented: self.rented.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Rented buffer. Derefs to exactly the requested length.
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Bytes usable without reallocating.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Zero the visible bytes without returning the buffer.
    pub fn clear(&mut self) {
        self.buf.fill(0);
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.give_back(buf);
    }
}
