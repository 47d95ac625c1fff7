// ## 📂 File: `src/config.rs`

//! Engine configuration.
//!
//! Values come from `Default`, the `with_*` builders, or environment variables
//! prefixed `FILESEAL_` (nested fields use `__`, e.g. `FILESEAL_KDF__MEMORY_KIB`).
//! Every path ends in `validate()`.
//!
//! The integrity salt width and the Argon2id parameters are not stored in the
//! container. Writer and reader must agree on them.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CI_INTEGRITY_SALT_LEN, DEFAULT_INTEGRITY_SALT_LEN, DEFAULT_IO_BUFFER_CAPACITY,
    DEFAULT_PAYLOAD_BLOCK_SIZE, MAX_INTEGRITY_SALT_LEN, MAX_PAYLOAD_BLOCK_SIZE,
    MIN_INTEGRITY_SALT_LEN, MIN_PAYLOAD_BLOCK_SIZE, SECTOR_SIZE,
};
use crate::crypto::KdfParams;
use crate::stream::alignment::AlignmentMode;

pub const ENV_PREFIX: &str = "FILESEAL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("payload block size {0} outside [{min}, {max}]", min = MIN_PAYLOAD_BLOCK_SIZE, max = MAX_PAYLOAD_BLOCK_SIZE)]
    BlockSizeOutOfRange(usize),

    #[error("payload block size {0} is not a multiple of the {sector}-byte sector (aligned policy)", sector = SECTOR_SIZE)]
    BlockSizeUnaligned(usize),

    #[error("integrity salt length {0} outside [{min}, {max}]", min = MIN_INTEGRITY_SALT_LEN, max = MAX_INTEGRITY_SALT_LEN)]
    SaltLenOutOfRange(usize),

    #[error("io buffer capacity must be non-zero")]
    ZeroIoBuffer,

    #[error("invalid KDF parameters: {0}")]
    Kdf(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plaintext bytes per block.
    pub payload_block_size: usize,
    /// Width S of the header integrity salt.
    pub integrity_salt_len: usize,
    pub alignment: AlignmentMode,
    pub kdf: KdfParams,
    /// Capacity of the buffered reader/writer around file streams.
    pub io_buffer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            payload_block_size: DEFAULT_PAYLOAD_BLOCK_SIZE,
            integrity_salt_len: integrity_salt_len_for(std::env::var("CI").ok().as_deref()),
            alignment: AlignmentMode::default(),
            kdf: KdfParams::default(),
            io_buffer_capacity: DEFAULT_IO_BUFFER_CAPACITY,
        }
    }
}

/// Default integrity salt width given the value of `CI`.
pub fn integrity_salt_len_for(ci: Option<&str>) -> usize {
    match ci.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if !v.is_empty() && v != "0" && v != "false" => CI_INTEGRITY_SALT_LEN,
        _ => DEFAULT_INTEGRITY_SALT_LEN,
    }
}

impl EngineConfig {
    pub fn with_payload_block_size(mut self, size: usize) -> Self {
        self.payload_block_size = size;
        self
    }

    pub fn with_integrity_salt_len(mut self, len: usize) -> Self {
        self.integrity_salt_len = len;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentMode) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_io_buffer_capacity(mut self, capacity: usize) -> Self {
        self.io_buffer_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bs = self.payload_block_size;
        if !(MIN_PAYLOAD_BLOCK_SIZE..=MAX_PAYLOAD_BLOCK_SIZE).contains(&bs) {
            return Err(ConfigError::BlockSizeOutOfRange(bs));
        }
        if self.alignment == AlignmentMode::Aligned && bs % SECTOR_SIZE != 0 {
            return Err(ConfigError::BlockSizeUnaligned(bs));
        }
        if !(MIN_INTEGRITY_SALT_LEN..=MAX_INTEGRITY_SALT_LEN).contains(&self.integrity_salt_len) {
            return Err(ConfigError::SaltLenOutOfRange(self.integrity_salt_len));
        }
        if self.io_buffer_capacity == 0 {
            return Err(ConfigError::ZeroIoBuffer);
        }
        self.kdf.validate().map_err(|e| ConfigError::Kdf(e.to_string()))
    }

    /// Load from `FILESEAL_*` environment variables on top of the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to build engine configuration from environment")?;

        let c: EngineConfig = cfg
            .try_deserialize()
            .context("failed to deserialise engine configuration")?;

        c.validate().context("invalid engine configuration")?;
        Ok(c)
    }
}
