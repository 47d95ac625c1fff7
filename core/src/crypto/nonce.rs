// ## 📂 File: `src/crypto/nonce.rs`

//! crypto/nonce.rs
//! Deterministic per-block nonce schedule.
//!
//! Design:
//! - Base IV: HKDF-SHA256(salt = BLOCK_NONCE_SALT, ikm = header nonce), expanded
//!   to the algorithm's nonce width with info = BLOCK_NONCE_INFO ‖ originalSize
//!   (i64 LE). Every block is therefore bound to the declared plaintext length,
//!   including changes that stay inside one padded sector.
//! - Counter: XOR the last 8 bytes of the base with the little-endian block index
//!   (TLS-style), so the mapping index -> nonce is injective within a file.
//!
//! Security notes:
//! - The header nonce is random per file, so nonces never repeat across files
//!   under the same key.
//! - The HKDF step keeps the block schedule separate from every other use of the
//!   header nonce (integrity salt, header bytes).

use hkdf::Hkdf;
use sha2::Sha256;

use crate::constants::contexts;
use crate::crypto::types::{CryptoError, NONCE_LEN_12, NONCE_LEN_24};

const COUNTER_LEN: usize = 8;

/// Per-file nonce schedule. Computes the base once and derives block nonces
/// without allocating.
#[derive(Debug, Clone)]
pub struct NonceSchedule {
    base: Vec<u8>,
}

impl NonceSchedule {
    pub fn new(header_nonce: &[u8], original_size: i64) -> Result<Self, CryptoError> {
        let len = header_nonce.len();
        if len != NONCE_LEN_12 && len != NONCE_LEN_24 {
            return Err(CryptoError::InvalidNonceLen { expected: NONCE_LEN_12, actual: len });
        }

        let hk = Hkdf::<Sha256>::new(Some(contexts::BLOCK_NONCE_SALT), header_nonce);
        let mut base = vec![0u8; len];
        let size = original_size.to_le_bytes();
        hk.expand_multi_info(&[contexts::BLOCK_NONCE_INFO, &size], &mut base)
            .map_err(|_| CryptoError::Failure("HKDF expand failed (block nonce base)".into()))?;
        Ok(Self { base })
    }

    pub fn nonce_len(&self) -> usize {
        self.base.len()
    }

    /// Write the nonce for `block_index` into `out` (must be `nonce_len()` wide).
    #[inline]
    pub fn nonce_into(&self, block_index: u64, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() != self.base.len() {
            return Err(CryptoError::InvalidNonceLen { expected: self.base.len(), actual: out.len() });
        }
        out.copy_from_slice(&self.base);

        let ctr = block_index.to_le_bytes();
        let off = out.len() - COUNTER_LEN;
        for (b, c) in out[off..].iter_mut().zip(ctr.iter()) {
            *b ^= c;
        }
        Ok(())
    }

    pub fn nonce(&self, block_index: u64) -> Vec<u8> {
        let mut out = self.base.clone();
        let off = out.len() - COUNTER_LEN;
        for (b, c) in out[off..].iter_mut().zip(block_index.to_le_bytes()) {
            *b ^= c;
        }
        out
    }
}

/// One-shot helper: nonce for `block_index` of a file declaring `original_size` bytes.
#[inline]
pub fn derive_block_nonce(
    header_nonce: &[u8],
    original_size: i64,
    block_index: u64,
) -> Result<Vec<u8>, CryptoError> {
    Ok(NonceSchedule::new(header_nonce, original_size)?.nonce(block_index))
}
