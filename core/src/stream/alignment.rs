// ## 📂 File: `src/stream/alignment.rs`

//! stream/alignment.rs
//! Alignment policies: block padding, header size, and stream open mode.
//!
//! Design notes:
//! - `Unaligned` is the default and writes the minimal container.
//! - `Aligned` rounds every block and the header up to the 512-byte sector so
//!   the container can be used with sector-aligned, uncached I/O. It also pads
//!   each tag region to one full sector.
//! - Policies never fail; size validation happens in `EngineConfig::validate`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::SECTOR_SIZE;
use crate::headers::HeaderLayout;

bitflags::bitflags! {
    /// ## 🚩 Stream open flags requested by a policy
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenMode: u32 {
        /// Access pattern is strictly sequential
        const SEQUENTIAL     = 0b0000_0001;
        /// Stream is driven by async I/O
        const ASYNC          = 0b0000_0010;
        /// Wrap the file in a userspace buffer
        const BUFFERED       = 0b0000_0100;
        /// Every read/write is a multiple of the sector size
        const SECTOR_ALIGNED = 0b0000_1000;
        /// Data must reach the device before completion
        const WRITE_THROUGH  = 0b0001_0000;
        /// Bypass the OS page cache where the platform allows it
        const NO_BUFFERING   = 0b0010_0000;
    }
}

/// Round `n` up to the next multiple of the sector size.
#[inline]
pub const fn round_up_to_sector(n: usize) -> usize {
    n.div_ceil(SECTOR_SIZE) * SECTOR_SIZE
}

pub trait AlignmentPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Bytes handed to the cipher for a block that read `bytes_read` bytes.
    fn calculate_processing_size(&self, bytes_read: usize, is_last_block: bool) -> usize;

    /// On-disk header size for `layout`.
    fn metadata_buffer_size(&self, layout: &HeaderLayout) -> usize;

    /// On-disk size of the tag region preceding each block's ciphertext.
    fn block_metadata_size(&self, tag_len: usize) -> usize;

    fn stream_open_mode(&self) -> OpenMode;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnalignedPolicy;

impl AlignmentPolicy for UnalignedPolicy {
    fn name(&self) -> &'static str {
        "unaligned"
    }

    fn calculate_processing_size(&self, bytes_read: usize, _is_last_block: bool) -> usize {
        bytes_read
    }

    fn metadata_buffer_size(&self, layout: &HeaderLayout) -> usize {
        layout.unaligned_len()
    }

    fn block_metadata_size(&self, tag_len: usize) -> usize {
        tag_len
    }

    fn stream_open_mode(&self) -> OpenMode {
        OpenMode::BUFFERED | OpenMode::SEQUENTIAL | OpenMode::ASYNC
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlignedPolicy;

impl AlignmentPolicy for AlignedPolicy {
    fn name(&self) -> &'static str {
        "aligned"
    }

    fn calculate_processing_size(&self, bytes_read: usize, _is_last_block: bool) -> usize {
        round_up_to_sector(bytes_read)
    }

    fn metadata_buffer_size(&self, layout: &HeaderLayout) -> usize {
        round_up_to_sector(layout.unaligned_len())
    }

    fn block_metadata_size(&self, tag_len: usize) -> usize {
        round_up_to_sector(tag_len)
    }

    fn stream_open_mode(&self) -> OpenMode {
        OpenMode::SEQUENTIAL
            | OpenMode::ASYNC
            | OpenMode::SECTOR_ALIGNED
            | OpenMode::WRITE_THROUGH
            | OpenMode::NO_BUFFERING
    }
}

/// Configuration-level selector for the built-in policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    #[default]
    Unaligned,
    Aligned,
}

impl AlignmentMode {
    pub fn policy(&self) -> Arc<dyn AlignmentPolicy> {
        match self {
            AlignmentMode::Unaligned => Arc::new(UnalignedPolicy),
            AlignmentMode::Aligned => Arc::new(AlignedPolicy),
        }
    }
}
