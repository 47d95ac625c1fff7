// ## 📂 File: `src/stream/validator.rs`

//! stream/validator.rs
//! Block accounting and consistency checks.
//!
//! Invariants:
//! - `0 <= processed_bytes <= original_size` at every step.
//! - Bytes written per block are `min(bytes_read, original_size - processed_bytes)`
//!   and never negative.
//! - A block never needs more than the output buffer holds.
//! - An encryption reads exactly the declared source length.

use thiserror::Error;

use crate::types::ErrorKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("processed bytes {processed} exceed original size {original}")]
    ProcessedExceedsOriginal { processed: i64, original: i64 },

    #[error("negative write size {bytes_to_write} (processed {processed}, original {original})")]
    NegativeWrite { bytes_to_write: i64, processed: i64, original: i64 },

    #[error("block of {size} bytes exceeds output buffer capacity {capacity}")]
    BufferOverflow { size: usize, capacity: usize },

    #[error("read {read} bytes but source declared {declared}")]
    ReadMismatch { read: u64, declared: u64 },

    #[error("container holds {from_container} blocks but header size implies {from_header}")]
    BlockCountMismatch { from_container: i64, from_header: i64 },

    #[error("container length {container_len} is shorter than its {header_len}-byte header")]
    TruncatedContainer { container_len: u64, header_len: u64 },

    #[error("unexpected data after the final block")]
    TrailingData,

    #[error("recovered {processed} bytes but header declared {original}")]
    SizeMismatch { processed: i64, original: i64 },
}

impl ConsistencyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsistencyError::BufferOverflow { .. } => ErrorKind::BufferOverflow,
            ConsistencyError::ReadMismatch { .. } => ErrorKind::ReadConsistency,
            _ => ErrorKind::DataIntegrity,
        }
    }
}

/// Per-operation block accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAccounting {
    pub block_index: i64,
    pub processed_bytes: i64,
    pub original_size: i64,
    pub total_blocks: i64,
    bytes_read: u64,
}

impl BlockAccounting {
    pub fn new(original_size: i64, total_blocks: i64) -> Self {
        Self {
            block_index: 0,
            processed_bytes: 0,
            original_size,
            total_blocks,
            bytes_read: 0,
        }
    }

    pub fn is_last(&self) -> bool {
        self.block_index + 1 == self.total_blocks
    }

    pub fn remaining(&self) -> i64 {
        self.original_size - self.processed_bytes
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn record_read(&mut self, n: usize) {
        self.bytes_read += n as u64;
    }

    /// Bytes of a block that carry plaintext: `min(bytes_read, remaining)`.
    pub fn bytes_to_write(&self, bytes_read: usize) -> Result<usize, ConsistencyError> {
        let remaining = self.remaining();
        let n = (bytes_read as i64).min(remaining);
        if n < 0 {
            return Err(ConsistencyError::NegativeWrite {
                bytes_to_write: n,
                processed: self.processed_bytes,
                original: self.original_size,
            });
        }
        Ok(n as usize)
    }

    /// Advance past a block that produced `n` plaintext bytes.
    pub fn advance(&mut self, n: usize) -> Result<(), ConsistencyError> {
        let processed = self.processed_bytes + n as i64;
        check_processed(processed, self.original_size)?;
        self.processed_bytes = processed;
        self.block_index += 1;
        Ok(())
    }
}

#[inline]
pub fn check_processed(processed: i64, original: i64) -> Result<(), ConsistencyError> {
    if processed < 0 || processed > original {
        return Err(ConsistencyError::ProcessedExceedsOriginal { processed, original });
    }
    Ok(())
}

#[inline]
pub fn check_block_capacity(size: usize, capacity: usize) -> Result<(), ConsistencyError> {
    if size > capacity {
        return Err(ConsistencyError::BufferOverflow { size, capacity });
    }
    Ok(())
}

#[inline]
pub fn check_read_total(read: u64, declared: u64) -> Result<(), ConsistencyError> {
    if read != declared {
        return Err(ConsistencyError::ReadMismatch { read, declared });
    }
    Ok(())
}

#[inline]
pub fn check_final_size(processed: i64, original: i64) -> Result<(), ConsistencyError> {
    if processed != original {
        return Err(ConsistencyError::SizeMismatch { processed, original });
    }
    Ok(())
}

/// `ceil(len / block)`, with `0` for an empty input.
#[inline]
pub fn block_count(len: u64, block: u64) -> i64 {
    if block == 0 {
        return 0;
    }
    len.div_ceil(block) as i64
}
