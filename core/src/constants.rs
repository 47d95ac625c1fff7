// ## 📂 File: `src/constants.rs`

//! Format constants shared by the header codec, the block engine and the
//! alignment policies. Changing any value here changes the on-disk format.

/// Current container format version written by this crate.
pub const CURRENT_MAJOR_VERSION: u8 = 1;
pub const CURRENT_MINOR_VERSION: u8 = 0;

/// Highest minor version accepted for the pre-release major `0` layout.
pub const LEGACY_MAJOR_ZERO_MAX_MINOR: u8 = 1;

/// Length of the version prefix at the start of every container.
pub const VERSION_PREFIX_LEN: usize = 2;

/// Width of the little-endian `originalSize` field.
pub const ORIGINAL_SIZE_LEN: usize = 8;

/// Width of the per-file Argon2id salt stored in the header.
pub const KDF_SALT_LEN: usize = 16;

/// Storage sector size used by the aligned policy.
pub const SECTOR_SIZE: usize = 512;

/// AEAD tag length (all three algorithms).
pub const TAG_LEN: usize = 16;

/// Integrity salt widths.
/// - Production width matches the salt slot of the block AAD.
/// - CI width keeps test containers small.
pub const DEFAULT_INTEGRITY_SALT_LEN: usize = 64;
pub const CI_INTEGRITY_SALT_LEN: usize = 16;
pub const MIN_INTEGRITY_SALT_LEN: usize = 8;
pub const MAX_INTEGRITY_SALT_LEN: usize = 256;

/// Block associated data layout: salt slot ‖ block index ‖ processing size.
pub const AAD_SALT_LEN: usize = 64;
pub const AAD_INDEX_LEN: usize = 8;
pub const AAD_SIZE_LEN: usize = 4;
pub const BLOCK_AAD_LEN: usize = AAD_SALT_LEN + AAD_INDEX_LEN + AAD_SIZE_LEN; // 76

/// Payload (plaintext) bytes per block.
pub const DEFAULT_PAYLOAD_BLOCK_SIZE: usize = 64 * 1024; // 64 KiB
pub const MIN_PAYLOAD_BLOCK_SIZE: usize = SECTOR_SIZE;
pub const MAX_PAYLOAD_BLOCK_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

/// Default capacity of the buffered reader/writer wrapped around file streams.
pub const DEFAULT_IO_BUFFER_CAPACITY: usize = 128 * 1024;

/// Domain-separation strings. Part of the format; never change in place.
pub mod contexts {
    /// BLAKE3 derive-key context for the header integrity salt.
    pub const INTEGRITY_SALT: &str = "fileseal 2026-01 container header integrity salt v1";
    /// HKDF salt for the per-block nonce base.
    pub const BLOCK_NONCE_SALT: &[u8] = b"fileseal/block-nonce/v1";
    /// HKDF info for the per-block nonce base.
    pub const BLOCK_NONCE_INFO: &[u8] = b"fileseal block nonce base";
}

/// Argon2id defaults for the password-derived algorithms.
pub mod kdf_defaults {
    pub const MEMORY_KIB: u32 = 64 * 1024; // 64 MiB
    pub const PASSES: u32 = 6;
    pub const MIN_PASSES: u32 = 6;
    pub const MAX_PARALLELISM: u32 = 4;
    pub const OUTPUT_LEN: usize = 32;
}
