// ## 📂 File: `src/crypto/kdf.rs`

//! crypto/kdf.rs
//! Argon2id password derivation for the two password algorithms.
//!
//! Design:
//! - Argon2id, version 0x13, output 32 bytes, over (password, kdfSalt).
//! - kdfSalt is 16 random bytes per file, stored in the header.
//! - Parameters are deployment constants, not stored in the header: a reader
//!   configured differently derives a different key and fails authentication.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::constants::{kdf_defaults, KDF_SALT_LEN};
use crate::crypto::types::CryptoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: kdf_defaults::MEMORY_KIB,
            iterations: kdf_defaults::PASSES,
            parallelism: default_parallelism(),
            output_len: kdf_defaults::OUTPUT_LEN,
        }
    }
}

/// Summary: logical CPUs capped at the Argon2 lane limit used here.
pub fn default_parallelism() -> u32 {
    (num_cpus::get() as u32).clamp(1, kdf_defaults::MAX_PARALLELISM)
}

impl KdfParams {
    /// Reject parameter sets weaker than the format allows or that Argon2 refuses.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.iterations < kdf_defaults::MIN_PASSES {
            return Err(CryptoError::Kdf(format!(
                "iterations {} below minimum {}",
                self.iterations,
                kdf_defaults::MIN_PASSES
            )));
        }
        if self.parallelism == 0 {
            return Err(CryptoError::Kdf("parallelism must be at least 1".into()));
        }
        if self.memory_kib < 8 * self.parallelism {
            return Err(CryptoError::Kdf(format!(
                "memory {} KiB below 8 KiB x parallelism {}",
                self.memory_kib, self.parallelism
            )));
        }
        if self.output_len != kdf_defaults::OUTPUT_LEN {
            return Err(CryptoError::Kdf(format!(
                "output length must be {} bytes, got {}",
                kdf_defaults::OUTPUT_LEN,
                self.output_len
            )));
        }
        self.argon2_params().map(|_| ())
    }

    fn argon2_params(&self) -> Result<Params, CryptoError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, Some(self.output_len))
            .map_err(|e| CryptoError::Kdf(e.to_string()))
    }
}

/// Derive key bytes from `password` and `salt`. Blocking and memory-hard:
/// call from a blocking thread.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.argon2_params()?);

    let mut output = Zeroizing::new(vec![0u8; params.output_len]);
    argon2
        .hash_password_into(password, salt, output.as_mut_slice())
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;

    Ok(output)
}

/// Fresh random per-file KDF salt.
pub fn generate_kdf_salt() -> [u8; KDF_SALT_LEN] {
    let mut salt = [0u8; KDF_SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Fresh random header nonce of `len` bytes.
pub fn generate_nonce(len: usize) -> Vec<u8> {
    let mut nonce = vec![0u8; len];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
