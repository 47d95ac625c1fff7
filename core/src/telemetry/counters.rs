// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters for one file operation.
//!
//! Summary: Collects block and byte counts during encrypt/decrypt.
//! Converted into an immutable `TelemetrySnapshot` when the operation ends.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub blocks: u64,
    pub bytes_plaintext: u64,
    pub bytes_ciphertext: u64,
    /// Header, tag regions and alignment padding.
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record the container header (including its padding) as overhead.
    pub fn add_header(&mut self, header_len: usize) {
        self.bytes_overhead += header_len as u64;
    }

    /// Record one block.
    ///
    /// - `pt_len`: plaintext bytes this block carries (after clamping on decrypt)
    /// - `ct_len`: ciphertext bytes on disk (processing size)
    /// - `tag_region_len`: bytes of the tag region
    pub fn add_block(&mut self, pt_len: usize, ct_len: usize, tag_region_len: usize) {
        self.blocks += 1;
        self.bytes_plaintext += pt_len as u64;
        self.bytes_ciphertext += ct_len as u64;
        self.bytes_overhead += tag_region_len as u64 + ct_len.saturating_sub(pt_len) as u64;
    }

    /// Total container bytes implied by the counters.
    pub fn container_bytes(&self) -> u64 {
        self.bytes_ciphertext + self.bytes_overhead - self.padding_bytes()
    }

    fn padding_bytes(&self) -> u64 {
        self.bytes_ciphertext.saturating_sub(self.bytes_plaintext)
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.blocks           += rhs.blocks;
        self.bytes_plaintext  += rhs.bytes_plaintext;
        self.bytes_ciphertext += rhs.bytes_ciphertext;
        self.bytes_overhead   += rhs.bytes_overhead;
    }
}
