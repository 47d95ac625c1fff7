// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! Container header struct, its fixed byte layout, and header errors.
//!
//! Layout (all offsets fixed for a given nonce width N and salt width S):
//!
//! ```text
//! 0        1        2            2+N              2+N+8             2+N+8+S       2+N+8+S+16
//! | major  | minor  | nonce[N]   | originalSize   | integritySalt[S] | kdfSalt[16] | zero pad (aligned) |
//! ```
//!
//! - `originalSize` is a little-endian i64.
//! - `integritySalt` is derived from the nonce (see `headers::binding`), never random.
//! - Padding bytes up to the policy's metadata size are always zero.

use std::fmt;

use crate::constants::{KDF_SALT_LEN, ORIGINAL_SIZE_LEN, VERSION_PREFIX_LEN};
use crate::headers::version::FormatVersion;

/// Byte layout of a header for one (nonce width, integrity salt width) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub nonce_len: usize,
    pub integrity_salt_len: usize,
}

impl HeaderLayout {
    pub const fn new(nonce_len: usize, integrity_salt_len: usize) -> Self {
        Self { nonce_len, integrity_salt_len }
    }

    pub const fn nonce_offset(&self) -> usize {
        VERSION_PREFIX_LEN
    }

    pub const fn original_size_offset(&self) -> usize {
        self.nonce_offset() + self.nonce_len
    }

    pub const fn integrity_salt_offset(&self) -> usize {
        self.original_size_offset() + ORIGINAL_SIZE_LEN
    }

    pub const fn kdf_salt_offset(&self) -> usize {
        self.integrity_salt_offset() + self.integrity_salt_len
    }

    /// Header size without alignment padding: 2 + N + 8 + S + 16.
    pub const fn unaligned_len(&self) -> usize {
        self.kdf_salt_offset() + KDF_SALT_LEN
    }
}

/// Parsed (or about-to-be-written) container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: FormatVersion,
    pub nonce: Vec<u8>,
    pub original_size: i64,
    pub integrity_salt: Vec<u8>,
    pub kdf_salt: [u8; KDF_SALT_LEN],
}

impl ContainerHeader {
    /// Build a header for a fresh encryption at the current format version.
    /// The integrity salt is bound to `nonce` here so the two can never drift.
    pub fn new(
        nonce: Vec<u8>,
        original_size: i64,
        kdf_salt: [u8; KDF_SALT_LEN],
        integrity_salt_len: usize,
    ) -> Self {
        let integrity_salt = crate::headers::binding::bind_salt(&nonce, integrity_salt_len);
        Self {
            version: FormatVersion::CURRENT,
            nonce,
            original_size,
            integrity_salt,
            kdf_salt,
        }
    }

    pub fn layout(&self) -> HeaderLayout {
        HeaderLayout::new(self.nonce.len(), self.integrity_salt.len())
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    format!("0x{}", hex::encode(b))
}

#[derive(Debug)]
pub enum HeaderError {
    /// Buffer too short to contain the header for this layout.
    BufferTooShort { have: usize, need: usize },

    /// Version prefix rejected by the version table.
    VersionValidation {
        found: FormatVersion,
        supported: FormatVersion,
        reason: String,
    },

    /// Stored integrity salt does not match the value recomputed from the nonce.
    IntegrityMismatch { stored: Vec<u8>, computed: Vec<u8> },

    /// `originalSize` decoded as a negative number.
    NegativeOriginalSize { value: i64 },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "header buffer too short: {} < {}", have, need),
            VersionValidation { found, supported, reason } =>
                write!(f, "unsupported container version {} (supported up to {}): {}", found, supported, reason),
            IntegrityMismatch { stored, computed } =>
                write!(f, "header integrity salt mismatch: stored {}, expected {}",
                    fmt_bytes(stored), fmt_bytes(computed)),
            NegativeOriginalSize { value } =>
                write!(f, "invalid original size: {}", value),
        }
    }
}

impl std::error::Error for HeaderError {}
